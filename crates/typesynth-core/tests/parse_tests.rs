use typesynth_core::error::ParseError;
use typesynth_core::parse;
use typesynth_core::parse::schema::{ExclusiveBound, SchemaOrRef, SchemaType};
use typesynth_core::parse::spec::OasVersion;

const PETSTORE_30: &str = include_str!("fixtures/petstore-3.0.yaml");
const PETSTORE_31: &str = include_str!("fixtures/petstore-3.1.yaml");
const COMPOSITION: &str = include_str!("fixtures/composition.yaml");

#[test]
fn parse_petstore_30() {
    let spec = parse::from_yaml(PETSTORE_30).expect("should parse petstore 3.0");
    assert_eq!(spec.openapi, "3.0.3");
    assert_eq!(spec.version(), OasVersion::V3_0);
    assert_eq!(spec.info.title, "Petstore");
    assert_eq!(spec.paths.len(), 2);

    let schemas = &spec.components.as_ref().unwrap().schemas;
    let names: Vec<_> = schemas.keys().map(String::as_str).collect();
    assert_eq!(names, ["Pet", "NewPet", "Error"]);

    let SchemaOrRef::Schema(new_pet) = &schemas["NewPet"] else {
        panic!("NewPet should be inline");
    };
    let SchemaOrRef::Schema(weight) = &new_pet.properties["weight"] else {
        panic!("weight should be inline");
    };
    assert_eq!(weight.minimum, Some(0.0));
    assert_eq!(weight.exclusive_minimum, Some(ExclusiveBound::Flag(true)));
}

#[test]
fn parse_petstore_31_type_arrays() {
    let spec = parse::from_yaml(PETSTORE_31).expect("should parse petstore 3.1");
    assert_eq!(spec.version(), OasVersion::V3_1);

    let schemas = &spec.components.as_ref().unwrap().schemas;
    let SchemaOrRef::Schema(new_pet) = &schemas["NewPet"] else {
        panic!("NewPet should be inline");
    };
    let SchemaOrRef::Schema(tag) = &new_pet.properties["tag"] else {
        panic!("tag should be inline");
    };
    let types = tag.schema_type.as_ref().unwrap();
    assert!(types.contains_null());
    assert_eq!(types.non_null(), [SchemaType::String]);

    let SchemaOrRef::Schema(weight) = &new_pet.properties["weight"] else {
        panic!("weight should be inline");
    };
    assert_eq!(weight.exclusive_minimum, Some(ExclusiveBound::Value(0.0)));
}

#[test]
fn parse_composition_refs() {
    let spec = parse::from_yaml(COMPOSITION).expect("should parse composition");
    assert!(spec.paths.is_empty());
    let schemas = &spec.components.as_ref().unwrap().schemas;
    let SchemaOrRef::Schema(shape) = &schemas["Shape"] else {
        panic!("Shape should be inline");
    };
    assert_eq!(shape.one_of.len(), 3);
    let discriminator = shape.discriminator.as_ref().unwrap();
    assert_eq!(discriminator.property_name, "kind");
    assert_eq!(discriminator.mapping.len(), 2);
}

#[test]
fn parse_json_document() {
    let json = r#"{
        "openapi": "3.1.0",
        "info": { "title": "Tiny", "version": "0.1.0" },
        "components": { "schemas": { "Id": { "type": "string" } } }
    }"#;
    let spec = parse::from_json(json).expect("should parse JSON");
    assert_eq!(spec.info.title, "Tiny");
    assert!(spec.components.unwrap().schemas.contains_key("Id"));
}

#[test]
fn reject_swagger_2() {
    let yaml = "openapi: \"2.0\"\ninfo: { title: Old, version: \"1\" }\n";
    assert!(matches!(
        parse::from_yaml(yaml),
        Err(ParseError::UnsupportedVersion(v)) if v == "2.0"
    ));
}

#[test]
fn reject_malformed_yaml() {
    assert!(matches!(
        parse::from_yaml("openapi: [unterminated"),
        Err(ParseError::Yaml(_))
    ));
}
