use std::sync::Arc;
use std::time::Duration;

use restool_exec::http::{HttpRequestParts, ReqwestHttpClient, RequestError, ResilientClient};
use restool_exec::retry::RetryConfig;
use tokio_util::sync::CancellationToken;

fn client(max_retries: u32, base_delay: Duration) -> ResilientClient {
    ResilientClient::new(
        Arc::new(ReqwestHttpClient::default()),
        RetryConfig {
            max_retries,
            base_delay,
            jitter: false,
            timeout: Duration::from_secs(5),
        },
    )
}

fn get(url: &str) -> HttpRequestParts {
    HttpRequestParts::get(url::Url::parse(url).unwrap())
}

#[tokio::test]
async fn persistent_503_uses_every_attempt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/flaky")
        .with_status(503)
        .expect(4)
        .create_async()
        .await;

    let err = client(3, Duration::from_millis(1))
        .request(&get(&format!("{}/flaky", server.url())), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RequestError::ServerStatus { attempts, response } => {
            assert_eq!(attempts, 4);
            assert_eq!(response.status, 503);
        }
        other => panic!("unexpected error: {other}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("nope")
        .expect(1)
        .create_async()
        .await;

    let resp = client(3, Duration::from_millis(1))
        .request(&get(&format!("{}/missing", server.url())), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, b"nope");
    mock.assert_async().await;
}

#[tokio::test]
async fn success_returns_first_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/ok")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .expect(1)
        .create_async()
        .await;

    let resp = client(3, Duration::from_millis(1))
        .request(&get(&format!("{}/ok", server.url())), &CancellationToken::new())
        .await
        .unwrap();

    assert!(resp.is_success());
    assert_eq!(
        resp.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn transport_failures_are_retried_then_surfaced() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = client(2, Duration::from_millis(1))
        .request(
            &get(&format!("http://127.0.0.1:{port}/")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        RequestError::Transport { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn cancellation_interrupts_the_backoff_wait() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/slow")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client(3, Duration::from_secs(30))
        .request(&get(&format!("{}/slow", server.url())), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Cancelled { attempts: 1 }));
    assert!(started.elapsed() < Duration::from_secs(10));
    mock.assert_async().await;
}
