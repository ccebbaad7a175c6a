#![cfg(test)]

use crate::plugin_system::declaration::ServiceDeclaration;

#[test]
fn test_deserialize_preserves_declaration_order() {
    // Keys deliberately not in alphabetical order
    let json = r#"{ "zeta": "z.js", "alpha": { "m": "m.js", "b": "b.js" }, "mid": "mid.js" }"#;
    let declaration: ServiceDeclaration = serde_json::from_str(json).unwrap();

    let keys: Vec<&str> = declaration.entries().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

    let nested = declaration.get("alpha").unwrap();
    let nested_keys: Vec<&str> = nested.entries().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(nested_keys, vec!["m", "b"]);
}

#[test]
fn test_deserialize_leaf_and_invalid_values() {
    let leaf: ServiceDeclaration = serde_json::from_str(r#""svc.js""#).unwrap();
    assert_eq!(leaf, ServiceDeclaration::leaf("svc.js"));

    let number = serde_json::from_str::<ServiceDeclaration>(r#"{ "a": 42 }"#);
    assert!(number.is_err(), "numbers are neither locations nor mappings");
}

#[test]
fn test_deserialize_rejects_duplicate_keys() {
    let result = serde_json::from_str::<ServiceDeclaration>(r#"{ "a": "a.js", "a": "b.js" }"#);
    let err = result.unwrap_err().to_string();
    assert!(err.contains("duplicate service key 'a'"), "unexpected error: {}", err);
}

#[test]
fn test_serialize_keeps_order() {
    let declaration = ServiceDeclaration::namespace([
        ("b", ServiceDeclaration::leaf("b.js")),
        ("a", ServiceDeclaration::namespace([("c", ServiceDeclaration::leaf("c.js"))])),
    ]);
    let json = serde_json::to_string(&declaration).unwrap();
    assert_eq!(json, r#"{"b":"b.js","a":{"c":"c.js"}}"#);
}

#[test]
fn test_namespace_constructor_replaces_repeated_key_in_place() {
    let declaration = ServiceDeclaration::namespace([
        ("a", ServiceDeclaration::leaf("first.js")),
        ("b", ServiceDeclaration::leaf("b.js")),
        ("a", ServiceDeclaration::leaf("second.js")),
    ]);
    assert_eq!(declaration.entries().len(), 2);
    assert_eq!(declaration.entries()[0].0, "a");
    assert_eq!(declaration.get("a").and_then(|d| d.as_leaf()), Some("second.js"));
}

#[test]
fn test_descendant_count() {
    let declaration = ServiceDeclaration::namespace([
        ("a", ServiceDeclaration::leaf("a.js")),
        (
            "b",
            ServiceDeclaration::namespace([
                ("c", ServiceDeclaration::leaf("c.js")),
                ("d", ServiceDeclaration::namespace([("e", ServiceDeclaration::leaf("e.js"))])),
            ]),
        ),
    ]);
    // a, b, b.c, b.d, b.d.e
    assert_eq!(declaration.descendant_count(), 5);
    assert_eq!(ServiceDeclaration::empty().descendant_count(), 0);
    assert_eq!(ServiceDeclaration::leaf("x").descendant_count(), 0);
}
