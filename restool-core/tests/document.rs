use restool_core::document::{validate_document, ApiDocument, DocumentLoadError, SpecVersion};
use serde_json::json;

#[test]
fn accepts_minimal_openapi_and_swagger_documents() {
    let oas = json!({"openapi": "3.1.0", "info": {"title": "t", "version": "1"}, "paths": {}});
    assert!(validate_document(&oas).is_empty());

    let swagger = json!({"swagger": "2.0", "info": {"title": "t", "version": "1"}, "paths": {}});
    assert!(validate_document(&swagger).is_empty());
}

#[test]
fn reports_every_structural_problem() {
    let raw = json!({
        "openapi": "2.5",
        "info": {"title": "t"},
        "paths": {"pets": {"get": {}}, "/ok": "nope"}
    });
    let violations = validate_document(&raw);
    let paths: Vec<&str> = violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(violations.len(), 4, "{violations:?}");
    assert!(paths.contains(&"openapi"));
    assert!(paths.contains(&"info.version"));
    assert!(paths.contains(&"paths.pets"));
    assert!(paths.contains(&"paths./ok"));
}

#[test]
fn rejects_documents_without_version_or_paths() {
    let violations = validate_document(&json!({"info": {"title": "t", "version": "1"}}));
    assert_eq!(violations.len(), 2);
    assert!(!validate_document(&json!(["not", "an", "object"])).is_empty());
}

#[test]
fn parse_surfaces_parse_and_validation_errors() {
    let err = ApiDocument::parse("x", "{ not json").unwrap_err();
    assert!(matches!(err, DocumentLoadError::Parse(_)));

    let err = ApiDocument::parse("x", "openapi: 3.0.0\n").unwrap_err();
    let DocumentLoadError::Invalid(invalid) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(invalid.violations.len(), 2);
}

#[test]
fn endpoints_and_schemas_views() {
    let doc = ApiDocument::parse(
        "petstore.yaml",
        r#"
openapi: 3.0.0
info: {title: Pets, version: "1"}
components:
  schemas:
    Pet: {type: object}
paths:
  /pets:
    get: {summary: List pets}
    post: {description: Create a pet}
    options: {summary: ignored}
  /pets/{id}:
    delete: {}
"#,
    )
    .unwrap();

    assert_eq!(doc.version(), SpecVersion::OpenApi3);
    assert_eq!(doc.title(), Some("Pets"));

    let endpoints = doc.endpoints();
    let rendered: Vec<String> = endpoints
        .iter()
        .map(|e| format!("{} {} {}", e.method, e.path, e.description))
        .collect();
    assert_eq!(
        rendered,
        vec![
            "GET /pets List pets",
            "POST /pets Create a pet",
            "DELETE /pets/{id} DELETE /pets/{id}",
        ]
    );

    assert_eq!(doc.schemas(), json!({"Pet": {"type": "object"}}));
}

#[test]
fn swagger_schemas_come_from_definitions() {
    let doc = ApiDocument::parse(
        "s.json",
        r#"{"swagger": "2.0", "info": {"title": "t", "version": "1"}, "paths": {},
            "definitions": {"Order": {"type": "object"}}}"#,
    )
    .unwrap();
    assert_eq!(doc.version(), SpecVersion::Swagger2);
    assert_eq!(doc.schemas(), json!({"Order": {"type": "object"}}));
}

#[test]
fn endpoints_follow_referenced_path_items() {
    let doc = ApiDocument::parse(
        "refs.yaml",
        r#"
openapi: 3.0.0
info: {title: t, version: "1"}
x-shared:
  petItem:
    get: {summary: Shared pet lookup}
paths:
  /pets:
    $ref: '#/x-shared/petItem'
  /broken:
    $ref: '#/x-shared/missing'
"#,
    )
    .unwrap();

    let endpoints = doc.endpoints();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].method, "GET");
    assert_eq!(endpoints[0].path, "/pets");
    assert_eq!(endpoints[0].description, "Shared pet lookup");
}
