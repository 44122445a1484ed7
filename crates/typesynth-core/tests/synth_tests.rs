use typesynth_core::diagnostics::{DiagnosticCode, Severity};
use typesynth_core::ir::{DeclOrigin, DeclShape, HttpMethod, RecordShape, SynthesisOutput, TypeExpr, TypeKind};
use typesynth_core::model::{Bound, CompositionKind};
use typesynth_core::parse;
use typesynth_core::{SynthConfig, synthesize, synthesize_batch};

const PETSTORE_30: &str = include_str!("fixtures/petstore-3.0.yaml");
const PETSTORE_31: &str = include_str!("fixtures/petstore-3.1.yaml");
const COMPOSITION: &str = include_str!("fixtures/composition.yaml");
const CYCLES: &str = include_str!("fixtures/cycles.yaml");
const LIMITS: &str = include_str!("fixtures/limits.yaml");
const NARROWING: &str = include_str!("fixtures/all-of-narrowing.yaml");
const NULLABLE_CYCLES: &str = include_str!("fixtures/nullable-cycles.yaml");

fn run(yaml: &str) -> SynthesisOutput {
    run_with(yaml, &SynthConfig::default())
}

fn run_with(yaml: &str, config: &SynthConfig) -> SynthesisOutput {
    let spec = parse::from_yaml(yaml).unwrap();
    synthesize(&spec, config)
}

fn record<'o>(out: &'o SynthesisOutput, name: &str) -> &'o RecordShape {
    match &out.declaration(name).unwrap().shape {
        DeclShape::Record(record) => record,
        other => panic!("`{name}` should be a record, got {other:?}"),
    }
}

fn field_names(record: &RecordShape) -> Vec<&str> {
    record.fields.iter().map(|f| f.name.original.as_str()).collect()
}

#[test]
fn synthesize_petstore() {
    let out = run(PETSTORE_30);
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
    insta::assert_snapshot!(out.declaration_names().join(","), @"NewPetStatus,NewPet,Pet,Error");

    let pet = record(&out, "Pet");
    assert_eq!(field_names(pet), ["name", "tag", "weight", "status", "id"]);
    assert!(pet.field("name").unwrap().required);
    assert!(pet.field("id").unwrap().required);
    assert!(!pet.field("tag").unwrap().required);

    let tag = &pet.field("tag").unwrap().ty;
    assert!(tag.nullable);
    let weight = &pet.field("weight").unwrap().ty;
    assert_eq!(weight.constraints.minimum, Some(Bound::exclusive(0.0)));
    assert_eq!(
        pet.field("status").unwrap().ty,
        TypeExpr::named("NewPetStatus")
    );

    assert_eq!(
        out.declaration("NewPetStatus").unwrap().origin,
        DeclOrigin::Inline("#/components/schemas/NewPet/properties/status".to_string())
    );
    assert_eq!(
        out.declaration("Pet").unwrap().origin,
        DeclOrigin::Component("Pet".to_string())
    );
}

#[test]
fn nullable_forms_are_equivalent_across_versions() {
    let v30 = run(PETSTORE_30);
    let v31 = run(PETSTORE_31);
    assert!(v31.diagnostics.is_empty(), "{:?}", v31.diagnostics);
    assert_eq!(v30.declarations, v31.declarations);
    assert_eq!(v30.operations, v31.operations);
}

#[test]
fn synthesis_is_idempotent() {
    let first = serde_json::to_value(run(COMPOSITION)).unwrap();
    let second = serde_json::to_value(run(COMPOSITION)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn petstore_operations() {
    let out = run(PETSTORE_30);
    let names: Vec<_> = out
        .operations
        .iter()
        .map(|op| op.name.camel_case.as_str())
        .collect();
    assert_eq!(names, ["listPets", "createPet", "getPet", "deletePet"]);

    let list = &out.operations[0];
    assert_eq!(list.method, HttpMethod::Get);
    let limit = &list.parameters[0].ty;
    assert_eq!(limit.constraints.minimum, Some(Bound::inclusive(1.0)));
    match &list.response("200").unwrap().ty.as_ref().unwrap().kind {
        TypeKind::Array { items } => assert_eq!(**items, TypeExpr::named("Pet")),
        other => panic!("expected array, got {other:?}"),
    }

    let create = &out.operations[1];
    assert_eq!(create.request_body.as_ref().unwrap().ty, TypeExpr::named("NewPet"));
    assert_eq!(
        create.response("default").unwrap().ty,
        Some(TypeExpr::named("Error"))
    );

    let get = &out.operations[2];
    assert_eq!(get.parameters[0].name.original, "petId");
    assert!(get.parameters[0].required);

    let delete = &out.operations[3];
    assert!(delete.response("204").unwrap().ty.is_none());
}

#[test]
fn all_of_merges_members_in_order() {
    let out = run(COMPOSITION);
    let circle = record(&out, "Circle");
    assert_eq!(field_names(circle), ["name", "createdAt", "kind", "radius"]);
    assert!(circle.field("name").unwrap().required);
    assert!(!circle.field("createdAt").unwrap().required);

    let labeled = record(&out, "Labeled");
    assert_eq!(field_names(labeled), ["createdAt", "label"]);

    let DeclShape::Alias(alias) = &out.declaration("AliasOfNamed").unwrap().shape else {
        panic!("single-member allOf should be an alias");
    };
    assert_eq!(*alias, TypeExpr::named("Named"));
}

#[test]
fn one_of_keeps_declaration_order_without_duplicates() {
    let out = run(COMPOSITION);
    let DeclShape::Union(shape) = &out.declaration("Shape").unwrap().shape else {
        panic!("Shape should be a union");
    };
    assert_eq!(shape.kind, CompositionKind::OneOf);
    assert_eq!(shape.members, ["Circle", "Square"]);
    assert!(!shape.nullable);
    let discriminator = shape.discriminator.as_ref().unwrap();
    assert_eq!(discriminator.property_name, "kind");
    assert_eq!(discriminator.mapping["circle"], "Circle");
    assert_eq!(discriminator.mapping["square"], "Square");

    let DeclShape::Alias(maybe) = &out.declaration("MaybeShape").unwrap().shape else {
        panic!("single-member anyOf should be an alias");
    };
    assert_eq!(*maybe, TypeExpr::named("Shape").with_nullable(true));
}

#[test]
fn composition_failures_are_isolated() {
    let out = run(COMPOSITION);
    assert!(out.declaration("Conflicting").is_none());
    assert!(out.declaration("TaggedShape").is_none());
    assert!(out.emitted_name("Conflicting").is_none());

    let codes: Vec<_> = out.errors().map(|d| (d.code, d.path.as_str())).collect();
    assert_eq!(
        codes,
        [
            (
                DiagnosticCode::CompositionError,
                "#/components/schemas/Conflicting"
            ),
            (
                DiagnosticCode::NestedUnionInIntersection,
                "#/components/schemas/TaggedShape"
            ),
        ]
    );
    // Everything else still comes out.
    assert_eq!(out.declarations.len(), 8);
}

#[test]
fn recursive_schemas_terminate() {
    let out = run(CYCLES);

    let list = record(&out, "ListNode");
    assert_eq!(list.field("next").unwrap().ty, TypeExpr::named("ListNode"));

    let tree = record(&out, "TreeNode");
    match &tree.field("children").unwrap().ty.kind {
        TypeKind::Array { items } => assert_eq!(**items, TypeExpr::named("TreeNode")),
        other => panic!("expected array, got {other:?}"),
    }
    assert_eq!(
        tree.field("parent").unwrap().ty,
        TypeExpr::named("TreeNode").with_nullable(true)
    );
}

#[test]
fn mutual_recursion_through_all_of() {
    let out = run(CYCLES);
    let manager = record(&out, "Manager");
    assert_eq!(field_names(manager), ["manager", "reports"]);
    assert_eq!(
        manager.field("manager").unwrap().ty,
        TypeExpr::named("Manager")
    );

    let employee = record(&out, "Employee");
    assert_eq!(
        employee.field("manager").unwrap().ty,
        TypeExpr::named("Manager")
    );
}

#[test]
fn circular_alias_fails_both_sides() {
    let out = run(CYCLES);
    assert!(out.declaration("Ping").is_none());
    assert!(out.declaration("Pong").is_none());

    let errors: Vec<_> = out.errors().map(|d| (d.code, d.path.as_str())).collect();
    assert_eq!(
        errors,
        [
            (DiagnosticCode::CircularAlias, "#/components/schemas/Pong"),
            (DiagnosticCode::DependencyFailed, "#/components/schemas/Ping"),
        ]
    );
    assert_eq!(
        out.declaration_names(),
        ["ListNode", "TreeNode", "Manager", "Employee"]
    );
}

#[test]
fn nullable_alias_cycle_fails() {
    let out = run(NULLABLE_CYCLES);
    assert!(out.declaration("Left").is_none());
    assert!(out.declaration("Right").is_none());

    let errors: Vec<_> = out.errors().map(|d| (d.code, d.path.as_str())).collect();
    assert_eq!(
        errors,
        [
            (DiagnosticCode::CircularAlias, "#/components/schemas/Right"),
            (
                DiagnosticCode::DependencyFailed,
                "#/components/schemas/Left/anyOf/0"
            ),
        ]
    );

    // An optional reference back to a record under construction is not an alias cycle.
    assert_eq!(out.declaration_names(), ["MaybeNode", "Node"]);
    match &out.declaration("MaybeNode").unwrap().shape {
        DeclShape::Alias(target) => assert_eq!(*target, TypeExpr::named("Node").with_nullable(true)),
        other => panic!("expected alias, got {other:?}"),
    }
    assert_eq!(
        record(&out, "Node").field("next").unwrap().ty,
        TypeExpr::named("MaybeNode")
    );
}

#[test]
fn all_of_required_only_members_mark_inherited_fields() {
    let out = run(NARROWING);
    for name in ["Strict", "Sibling"] {
        let strict = record(&out, name);
        assert_eq!(field_names(strict), ["name", "tag", "links"]);
        assert!(strict.field("name").unwrap().required, "{name}");
        assert!(!strict.field("tag").unwrap().required, "{name}");
    }
    assert!(!record(&out, "Base").field("name").unwrap().required);

    let ghostly = record(&out, "Ghostly");
    assert!(ghostly.fields.iter().all(|f| !f.required));
    let warnings: Vec<_> = out.diagnostics.iter().map(|d| (d.severity, d.code, d.path.as_str())).collect();
    assert_eq!(
        warnings,
        [(
            Severity::Warning,
            DiagnosticCode::IgnoredKeyword,
            "#/components/schemas/Ghostly"
        )]
    );
}

#[test]
fn all_of_narrows_shared_field_constraints() {
    let out = run(NARROWING);
    assert!(!out.has_errors(), "{:?}", out.diagnostics);

    let name = &record(&out, "Short").field("name").unwrap().ty;
    assert_eq!(name.constraints.max_length, Some(50));
    assert_eq!(name.constraints.min_length, Some(1));
    assert_eq!(
        record(&out, "Base").field("name").unwrap().ty.constraints.max_length,
        Some(100)
    );
}

#[test]
fn all_of_accepts_identically_shaped_inline_fields() {
    let out = run(NARROWING);
    let combined = record(&out, "Combined");
    assert_eq!(field_names(combined), ["name", "tag", "links"]);
    assert_eq!(combined.field("links").unwrap().ty, TypeExpr::named("BaseLinks"));
    insta::assert_snapshot!(
        out.declaration_names().join(","),
        @"BaseLinks,Base,Strict,Sibling,Short,AuditedLinks,Audited,Combined,Ghostly"
    );
}

#[test]
fn max_items_guard_fails_only_offending_schemas() {
    let config = SynthConfig {
        max_items: Some(100),
        ..SynthConfig::default()
    };
    let out = run_with(LIMITS, &config);
    assert_eq!(out.declaration_names(), ["SmallBatch", "Unbounded"]);

    let errors: Vec<_> = out.errors().collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].code, DiagnosticCode::MaxItemsExceeded);
    assert_eq!(errors[0].path, "#/components/schemas/HugeBatch");
    assert_eq!(errors[1].code, DiagnosticCode::DependencyFailed);
    assert_eq!(errors[1].path, "#/components/schemas/Envelope/properties/batch");
    assert!(errors.iter().all(|d| d.severity == Severity::Error));

    let unlimited = run(LIMITS);
    assert!(unlimited.diagnostics.is_empty());
    assert_eq!(unlimited.declarations.len(), 4);
}

#[test]
fn batch_keeps_input_order() {
    let specs = vec![
        parse::from_yaml(CYCLES).unwrap(),
        parse::from_yaml(PETSTORE_31).unwrap(),
        parse::from_yaml(LIMITS).unwrap(),
    ];
    let outputs = synthesize_batch(&specs, &SynthConfig::default());
    assert_eq!(outputs.len(), 3);
    for (spec, output) in specs.iter().zip(&outputs) {
        let single = synthesize(spec, &SynthConfig::default());
        assert_eq!(single.declarations, output.declarations);
    }
    assert!(outputs[1].declaration("Pet").is_some());
}
