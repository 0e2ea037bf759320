//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `millbase_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("millbase_core ping={}", millbase_core::ping());
    println!("millbase_core version={}", millbase_core::core_version());
}
