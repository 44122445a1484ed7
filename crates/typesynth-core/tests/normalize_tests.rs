use typesynth_core::diagnostics::{DiagnosticCode, Severity};
use typesynth_core::ir::{DeclShape, RecordShape, SynthesisOutput, TypeKind};
use typesynth_core::model::{Bound, PrimitiveBase};
use typesynth_core::parse;
use typesynth_core::transform::name_normalizer::{normalize_name, sanitize_type_name};
use typesynth_core::{SynthConfig, synthesize};

const MIXED: &str = include_str!("fixtures/mixed-types.yaml");
const COLLISIONS: &str = include_str!("fixtures/collisions.yaml");

fn run(yaml: &str) -> SynthesisOutput {
    let spec = parse::from_yaml(yaml).unwrap();
    synthesize(&spec, &SynthConfig::default())
}

fn record<'o>(out: &'o SynthesisOutput, name: &str) -> &'o RecordShape {
    match &out.declaration(name).unwrap().shape {
        DeclShape::Record(record) => record,
        other => panic!("`{name}` should be a record, got {other:?}"),
    }
}

#[test]
fn test_operation_id_casing() {
    let n = normalize_name("createChatCompletion");
    assert_eq!(n.pascal_case, "CreateChatCompletion");
    assert_eq!(n.camel_case, "createChatCompletion");
    assert_eq!(n.snake_case, "create_chat_completion");
    assert_eq!(n.screaming_snake, "CREATE_CHAT_COMPLETION");
}

#[test]
fn test_type_name_sanitizing() {
    assert_eq!(sanitize_type_name("chat_message", &[]), "ChatMessage");
    assert_eq!(sanitize_type_name("pet-store-api", &[]), "PetStoreApi");
    assert_eq!(sanitize_type_name("v1.Pet", &[]), "V1Pet");
    assert_eq!(sanitize_type_name("404", &[]), "_404");
}

#[test]
fn test_multi_type_splits_constraints() {
    let out = run(MIXED);
    match &out.declaration("Identifier").unwrap().shape {
        DeclShape::Union(union) => {
            assert_eq!(union.members, ["IdentifierString", "IdentifierInteger"]);
        }
        other => panic!("expected union, got {other:?}"),
    }

    let DeclShape::Alias(string_member) = &out.declaration("IdentifierString").unwrap().shape else {
        panic!("string member should be an alias");
    };
    assert_eq!(string_member.constraints.min_length, Some(3));
    assert!(string_member.constraints.minimum.is_none());

    let DeclShape::Alias(int_member) = &out.declaration("IdentifierInteger").unwrap().shape else {
        panic!("integer member should be an alias");
    };
    assert_eq!(int_member.constraints.minimum, Some(Bound::inclusive(0.0)));
    assert!(int_member.constraints.min_length.is_none());
}

#[test]
fn test_mismatched_constraint_is_dropped_with_warning() {
    let out = run(MIXED);
    let reading = record(&out, "Measurement").field("reading").unwrap();
    assert!(reading.ty.constraints.pattern.is_none());
    assert_eq!(
        reading.ty.kind,
        TypeKind::Primitive {
            base: PrimitiveBase::Integer,
            format: None
        }
    );

    let mismatch = out
        .diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::ConstraintTypeMismatch)
        .expect("pattern on integer should be reported");
    assert_eq!(mismatch.severity, Severity::Warning);
    assert_eq!(
        mismatch.path,
        "#/components/schemas/Measurement/properties/reading"
    );
}

#[test]
fn test_inverted_range_is_kept_and_reported() {
    let out = run(MIXED);
    let range = record(&out, "Measurement").field("range").unwrap();
    assert_eq!(range.ty.constraints.minimum, Some(Bound::inclusive(10.0)));
    assert_eq!(range.ty.constraints.maximum, Some(Bound::inclusive(1.0)));
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::InvertedRange)
    );
}

#[test]
fn test_tighter_exclusive_bound_wins() {
    let out = run(MIXED);
    let ratio = record(&out, "Measurement").field("ratio").unwrap();
    assert_eq!(ratio.ty.constraints.minimum, Some(Bound::exclusive(0.0)));
}

#[test]
fn test_maps_and_untyped_schemas() {
    let out = run(MIXED);
    let DeclShape::Alias(settings) = &out.declaration("Settings").unwrap().shape else {
        panic!("Settings should be an alias");
    };
    assert!(matches!(settings.kind, TypeKind::Map { .. }));

    let DeclShape::Alias(anything) = &out.declaration("Anything").unwrap().shape else {
        panic!("Anything should be an alias");
    };
    assert_eq!(anything.kind, TypeKind::Any);
    assert!(!out.has_errors());
}

#[test]
fn test_title_collisions_are_deterministic() {
    let out = run(COLLISIONS);
    let order = record(&out, "Order");
    assert_eq!(order.field("failure").unwrap().ty.named_target(), Some("Error"));
    assert_eq!(order.field("warning").unwrap().ty.named_target(), Some("Error2"));
    // Same shape under the same name is registered once.
    assert_eq!(order.field("retry").unwrap().ty.named_target(), Some("Error"));
    assert!(out.declaration("Error3").is_none());

    let again = run(COLLISIONS);
    assert_eq!(out.declaration_names(), again.declaration_names());
}

#[test]
fn test_component_names_are_sanitized_and_unique() {
    let out = run(COLLISIONS);
    assert_eq!(out.emitted_name("pet-record"), Some("PetRecord"));
    assert_eq!(out.emitted_name("PetRecord"), Some("PetRecord2"));
    assert_eq!(out.emitted_name("3dModel"), Some("_3dModel"));
    assert_eq!(out.emitted_name("Self"), Some("Self_"));

    let mut names = out.declaration_names();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);
}

#[test]
fn test_reserved_words_from_config() {
    let spec = parse::from_yaml(COLLISIONS).unwrap();
    let config = SynthConfig {
        reserved_words: vec!["Order".to_string()],
        ..SynthConfig::default()
    };
    let out = synthesize(&spec, &config);
    assert_eq!(out.emitted_name("Order"), Some("Order_"));
}
