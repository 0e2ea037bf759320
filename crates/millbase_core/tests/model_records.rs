use millbase_core::{
    AreaDraft, AreaSeed, CatalogDraft, CatalogKind, CoilDraft, EntityDraft, LocalityDraft,
    ValidationError,
};
use uuid::Uuid;

#[test]
fn locality_draft_validates_its_own_name() {
    assert!(LocalityDraft::new("CDMX").validate().is_ok());
    assert!(matches!(
        LocalityDraft::new("  ").validate(),
        Err(ValidationError::BlankField { field: "name" })
    ));
}

#[test]
fn locality_draft_validates_seed_names_too() {
    let mut draft = LocalityDraft::new("CDMX");
    draft.areas.push(AreaSeed::new("x"));

    let err = draft.validate().unwrap_err();
    assert!(matches!(
        err,
        ValidationError::LengthOutOfRange {
            field: "areas.name",
            len: 1,
            ..
        }
    ));
}

#[test]
fn area_draft_validates_name_only() {
    let draft = AreaDraft::new(Uuid::new_v4(), "Almacen");
    assert!(draft.validate().is_ok());

    let oversized = AreaDraft::new(Uuid::new_v4(), "a".repeat(501));
    assert!(matches!(
        oversized.validate(),
        Err(ValidationError::LengthOutOfRange { len: 501, .. })
    ));
}

#[test]
fn catalog_draft_rejects_oversized_names() {
    let draft = CatalogDraft::new("g".repeat(501));
    assert!(matches!(
        draft.validate(),
        Err(ValidationError::LengthOutOfRange { len: 501, .. })
    ));
}

fn sample_coil_draft() -> CoilDraft {
    CoilDraft {
        supplier_code: "SCN-2100-125".to_string(),
        width_mm: 2100.0,
        grammage_gsm: 125.0,
        caliper: Some("16pt".to_string()),
        weight_kg: 18_500.0,
        product_type_uuid: Uuid::new_v4(),
        product_class_uuid: Uuid::new_v4(),
        mill_uuid: Uuid::new_v4(),
        grade_uuid: Uuid::new_v4(),
        supplier_uuid: Uuid::new_v4(),
        active: None,
    }
}

#[test]
fn coil_draft_rejects_oversized_caliper() {
    let mut draft = sample_coil_draft();
    draft.caliper = Some("c".repeat(51));
    assert!(matches!(
        draft.validate(),
        Err(ValidationError::LengthOutOfRange {
            field: "caliper",
            ..
        })
    ));
}

#[test]
fn coil_draft_rejects_nan_measurements() {
    let mut draft = sample_coil_draft();
    draft.weight_kg = f64::NAN;
    assert!(matches!(
        draft.validate(),
        Err(ValidationError::NonPositiveMeasure {
            field: "weight_kg"
        })
    ));
}

#[test]
fn catalog_kind_serializes_snake_case() {
    let kind = serde_json::to_value(CatalogKind::ProductType).unwrap();
    assert_eq!(kind, "product_type");
    assert_eq!(CatalogKind::ProductClass.table(), "product_classes");
    assert_eq!(CatalogKind::Mill.label(), "mill");
}

#[test]
fn drafts_roundtrip_through_json() {
    let draft = AreaDraft::new(Uuid::new_v4(), "Almacen");
    let json = serde_json::to_string(&draft).unwrap();
    let back: AreaDraft = serde_json::from_str(&json).unwrap();
    assert_eq!(back, draft);
}
