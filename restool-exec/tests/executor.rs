use std::time::Duration;

use mockito::Matcher;
use restool_core::ArgumentError;
use restool_exec::{RuntimeConfig, ToolError, ToolRuntime};
use serde_json::{json, Map, Value};

const SPEC: &str = r#"
openapi: 3.0.3
info: {title: Pet Store, version: 1.0.0}
paths:
  /pet/{id}:
    get:
      operationId: getPet
      summary: Find pet by ID
      parameters:
        - {name: id, in: path, required: true, schema: {type: integer, minimum: 1}}
        - {name: Authorization, in: header, schema: {type: string}}
        - {name: X-Trace, in: header, schema: {type: string}}
  /pet/findByTags:
    get:
      operationId: findPetsByTags
      parameters:
        - name: tags
          in: query
          schema: {type: array, items: {type: string}}
  /pet:
    post:
      operationId: addPet
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name: {type: string}
  /widgets/{id}:
    get:
      operationId: getWidget
      parameters:
        - {name: id, in: path, required: true, schema: {type: string}}
"#;

async fn runtime(server: &mut mockito::ServerGuard) -> ToolRuntime {
    server
        .mock("GET", "/openapi.yaml")
        .with_status(200)
        .with_body(SPEC)
        .create_async()
        .await;
    let config = RuntimeConfig {
        base_url: server.url(),
        api_prefix: "/api/v3".to_string(),
        spec_location: format!("{}/openapi.yaml", server.url()),
        max_retries: 1,
        retry_base_delay: Duration::from_millis(1),
        ..RuntimeConfig::default()
    };
    ToolRuntime::start(config).unwrap()
}

fn args(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn missing_required_arguments_fail_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", Matcher::Regex("^/api/v3/widgets".to_string()))
        .expect(0)
        .create_async()
        .await;

    let err = rt.execute("getWidget", &args(json!({}))).await.unwrap_err();
    match err {
        ToolError::Validation(ArgumentError::Missing(names)) => assert_eq!(names, vec!["id"]),
        other => panic!("unexpected error: {other}"),
    }
    mock.assert_async().await;
    rt.shutdown().await;
}

#[tokio::test]
async fn path_parameters_are_substituted() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", "/api/v3/pet/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":7,"name":"Rex"}"#)
        .expect(1)
        .create_async()
        .await;

    let resp = rt.execute("getPet", &args(json!({"id": 7}))).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({"id": 7, "name": "Rex"}));
    mock.assert_async().await;
}

#[tokio::test]
async fn identical_gets_hit_the_network_once() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", "/api/v3/pet/7")
        .with_status(200)
        .with_body(r#"{"id":7}"#)
        .expect(1)
        .create_async()
        .await;

    let first = rt.execute("getPet", &args(json!({"id": 7}))).await.unwrap();
    let second = rt
        .execute("getPet", &args(json!({"id": 7, "X-Trace": "other"})))
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(rt.executor().responses().len().await, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn authorization_partitions_the_cache() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", "/api/v3/pet/7")
        .with_status(200)
        .with_body(r#"{"id":7}"#)
        .expect(2)
        .create_async()
        .await;

    for token in ["Bearer a", "Bearer b", "Bearer a"] {
        rt.execute("getPet", &args(json!({"id": 7, "Authorization": token})))
            .await
            .unwrap();
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn error_statuses_are_returned_but_not_cached() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", "/api/v3/pet/9")
        .with_status(404)
        .with_body("Pet not found")
        .expect(2)
        .create_async()
        .await;

    for _ in 0..2 {
        let resp = rt.execute("getPet", &args(json!({"id": 9}))).await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, json!("Pet not found"));
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn persistent_server_errors_come_back_as_responses() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", "/api/v3/pet/3")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let resp = rt.execute("getPet", &args(json!({"id": 3}))).await.unwrap();
    assert_eq!(resp.status, 503);
    mock.assert_async().await;
}

#[tokio::test]
async fn body_is_sent_as_json() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("POST", "/api/v3/pet")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"name": "Rex"})))
        .with_status(200)
        .with_body(r#"{"id":1,"name":"Rex"}"#)
        .expect(2)
        .create_async()
        .await;

    // Writes are never cached.
    for _ in 0..2 {
        let resp = rt
            .execute("addPet", &args(json!({"body": {"name": "Rex"}})))
            .await
            .unwrap();
        assert_eq!(resp.body["id"], 1);
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn array_query_arguments_repeat_the_key() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let mock = server
        .mock("GET", "/api/v3/pet/findByTags")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("tags".into(), "cute".into()),
            Matcher::UrlEncoded("tags".into(), "small".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let resp = rt
        .execute("findPetsByTags", &args(json!({"tags": ["cute", "small"]})))
        .await
        .unwrap();
    assert_eq!(resp.body, json!([]));
    mock.assert_async().await;
}

#[tokio::test]
async fn schema_violations_are_rejected() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;

    let err = rt.execute("getPet", &args(json!({"id": 0}))).await.unwrap_err();
    assert_eq!(err.to_string(), "Parameter 'id' must be >= 1");

    let err = rt
        .execute("addPet", &args(json!({"body": {"tag": "x"}})))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Parameter 'body.name' is required");
}

#[tokio::test]
async fn unknown_tools_are_reported() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    let err = rt.execute("nope", &Map::new()).await.unwrap_err();
    assert!(matches!(err, ToolError::NotFound(ref name) if name == "nope"));
}

#[tokio::test]
async fn call_turns_failures_into_outcomes() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;
    server
        .mock("GET", "/api/v3/widgets/w1")
        .with_status(200)
        .with_body(r#"{"id":"w1"}"#)
        .create_async()
        .await;

    let outcome = rt.call("getWidget", &Map::new()).await;
    assert!(outcome.is_error);
    assert_eq!(outcome.content["error"], "validation");
    assert_eq!(outcome.content["missing"], json!(["id"]));

    let outcome = rt.call("getWidget", &args(json!({"id": "w1"}))).await;
    assert!(!outcome.is_error);
    assert_eq!(outcome.content["status"], 200);
    assert_eq!(outcome.content["body"]["id"], "w1");
}

#[tokio::test]
async fn listing_describes_every_operation() {
    let mut server = mockito::Server::new_async().await;
    let rt = runtime(&mut server).await;

    let tools = rt.list_operations().await.unwrap();
    let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["addPet", "findPetsByTags", "getPet", "getWidget"]);

    let get_pet = tools.iter().find(|t| t.name == "getPet").unwrap();
    assert_eq!(get_pet.description, "Find pet by ID");
    assert_eq!(get_pet.input_schema["required"], json!(["id"]));
}
