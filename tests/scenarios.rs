use jsight_schema::compiler::{self, CompileOptions, Compiler};
use jsight_schema::constraint::RuleSource;
use jsight_schema::{ConstraintKind, ErrorKind, JsonType, Key, RuleRegistry, Schema, TypeRegistry, resolve, validate_value};
use serde_json::json;

fn unchecked(src: &str, types: &TypeRegistry) -> Schema {
    Compiler::new(types, &RuleRegistry::new())
        .options(CompileOptions { check_type_references: false, ..CompileOptions::default() })
        .compile(src.as_bytes())
        .unwrap()
}

fn registry(sources: &[(&str, &str)]) -> TypeRegistry {
    let mut types = TypeRegistry::new();
    for (name, src) in sources {
        let schema = unchecked(src, &types);
        types.insert(*name, schema).unwrap();
    }
    types
}

#[test]
fn min_length_scenario() {
    let types = TypeRegistry::new();
    let src = b"{\"a\": 1, \"b\": \"x\" //{type:\"string\", minLength:1}\n}";
    let schema = compiler::compile(src, &types, &RuleRegistry::new()).unwrap();
    assert_eq!(schema.root.json_type(), JsonType::Object);
    let b = &schema.root.properties().unwrap()[&Key::plain("b")];
    assert_eq!(b.json_type(), JsonType::String);
    assert!(b.constraints.has(ConstraintKind::MinLength));
    assert_eq!(schema.root.constraints.required_keys(), ["a".to_string(), "b".to_string()]);

    validate_value(&schema, &types, &json!({"a": 1, "b": "x"})).unwrap();
    let err = validate_value(&schema, &types, &json!({"a": 1, "b": ""})).unwrap_err();
    match err.kind() {
        ErrorKind::Violation(v) => {
            assert_eq!(v.rule, "minLength");
            assert_eq!(v.pointer, "/b");
        }
        other => panic!("unexpected error {other}"),
    }

    let err = compiler::compile(b"{\n  \"b\": \"\" // {minLength: 1}\n}", &types, &RuleRegistry::new()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Violation(v) if v.rule == "minLength"));
    assert_eq!(err.location().unwrap().line, 2);
}

#[test]
fn shortcut_union_scenario() {
    let types = registry(&[("@Foo", "{\n  \"foo\": 1\n}"), ("@Bar", "{\n  \"bar\": 1\n}")]);
    let schema = compiler::compile(b"@Foo | @Bar", &types, &RuleRegistry::new()).unwrap();

    assert_eq!(schema.root.json_type(), JsonType::Mixed);
    assert!(schema.root.constraints.has(ConstraintKind::Or));
    let list = schema.root.constraints.types_list().unwrap();
    assert_eq!(list.source, RuleSource::Generated);
    assert_eq!(list.items.len(), 2);
    for (item, expected) in list.items.iter().zip(["@Foo", "@Bar"]) {
        assert!(item.anonymous);
        let wrapped = schema.anonymous_type(&item.name).unwrap();
        assert_eq!(wrapped.user_type(), Some(expected));
    }
}

#[test]
fn required_keys_accumulate() {
    let schema = unchecked("{\n  \"a\": 1,\n  \"b\": 2 // {optional: true}\n}", &TypeRegistry::new());
    assert_eq!(schema.root.constraints.required_keys(), ["a".to_string()]);
}

#[test]
fn basic_compilation_is_idempotent() {
    let src = "{\n  \"price\": 9.99, // {type: \"decimal\", precision: 2, min: 0, exclusiveMinimum: true}\n  \"tags\": [ // {maxItems: 5}\n    \"a\"\n  ],\n  \"mail\": \"a@b.io\", // {type: \"email\", optional: true}\n  \"any\": null // {type: \"any\", nullable: false}\n}";
    let mut schema = unchecked(src, &TypeRegistry::new());
    let first = schema.clone();
    compiler::compile_basic(&mut schema, &CompileOptions::default()).unwrap();
    assert_eq!(schema, first);
}

#[test]
fn all_of_first_listed_wins_and_rejects_overrides() {
    let mut types = registry(&[("@A", "{\n  \"id\": 1\n}"), ("@B", "{\n  \"id\": \"s\",\n  \"b\": true\n}")]);
    let mut schema = unchecked("{ // {allOf: [\"@A\", \"@B\"]}\n  \"own\": null\n}", &types);
    resolve(&mut schema, &mut types).unwrap();

    let props = schema.root.properties().unwrap();
    let keys: Vec<&str> = props.keys().map(|k| k.name.as_str()).collect();
    assert_eq!(keys, ["id", "b", "own"]);
    assert_eq!(props[&Key::plain("id")].json_type(), JsonType::Integer);
    assert_eq!(props[&Key::plain("id")].inherited_from.as_deref(), Some("@A"));

    let mut overriding = unchecked("{ // {allOf: \"@A\"}\n  \"id\": 2\n}", &types);
    let err = resolve(&mut overriding, &mut types).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CannotOverride { key, .. } if key == "id"));
}

#[test]
fn all_of_cycles_are_errors() {
    let mut types = registry(&[
        ("@A", "{} // {allOf: \"@B\"}"),
        ("@B", "{} // {allOf: \"@C\"}"),
        ("@C", "{} // {allOf: \"@A\"}"),
    ]);
    let mut schema = unchecked("{} // {allOf: \"@A\"}", &types);
    let err = resolve(&mut schema, &mut types).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::AllOfRecursion(_)));
}

#[test]
fn all_of_self_reference_is_a_cycle() {
    let mut types = registry(&[("@A", "{} // {allOf: \"@A\"}")]);
    let mut schema = unchecked("{} // {allOf: \"@A\"}", &types);
    let err = resolve(&mut schema, &mut types).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::AllOfRecursion("@A".into()));
}

#[test]
fn example_round_trips() {
    let types = registry(&[("@Tag", "\"red\" // {enum: [\"red\", \"blue\"]}")]);
    let src = "{\n  \"id\": 12, // {min: 1}\n  \"price\": 2.50, // {type: \"decimal\", precision: 2}\n  \"tags\": [@Tag],\n  \"meta\": {\n    \"ok\": true\n  }\n}";
    let schema = compiler::compile(src.as_bytes(), &types, &RuleRegistry::new()).unwrap();
    let example = schema.example(&types).unwrap();
    assert_eq!(example["tags"], json!(["red"]));
    assert_eq!(schema.example_json(&types).unwrap(), r#"{"id":12,"price":2.50,"tags":["red"],"meta":{"ok":true}}"#);
    validate_value(&schema, &types, &example).unwrap();
}

#[test]
fn documents_are_validated_with_pointers() {
    let types = registry(&[("@Pet", "{\n  \"name\": \"Rex\" // {minLength: 1}\n}")]);
    let schema = compiler::compile(b"{\n  \"pets\": [@Pet]\n}", &types, &RuleRegistry::new()).unwrap();
    validate_value(&schema, &types, &json!({"pets": [{"name": "a"}, {"name": "b"}]})).unwrap();
    let err = validate_value(&schema, &types, &json!({"pets": [{"name": "a"}, {"name": ""}]})).unwrap_err();
    match err.kind() {
        ErrorKind::Violation(v) => {
            assert_eq!(v.rule, "minLength");
            assert_eq!(v.pointer, "/pets/1/name");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn named_enum_rules() {
    let mut rules = RuleRegistry::new();
    let colors = jsight_schema::constraint::EnumRule::from_values([
        jsight_schema::Literal::String("red".into()),
        jsight_schema::Literal::String("green".into()),
    ]);
    rules.insert("@colors", colors).unwrap();
    let types = TypeRegistry::new();
    let schema = Compiler::new(&types, &rules).compile(b"\"red\" // {enum: @colors}").unwrap();
    validate_value(&schema, &types, &json!("green")).unwrap();
    assert!(validate_value(&schema, &types, &json!("blue")).is_err());

    let doc = serde_json::to_value(schema.doc()).unwrap();
    assert_eq!(doc["rules"][0], json!({"key": "enum", "tokenType": "shortcut", "scalarValue": "@colors"}));
}
