//! Integration tests for HTTP room metadata discovery.
//!
//! A one-shot HTTP server on `127.0.0.1` answers a single request with a
//! canned body and reports the request line it received, so the tests can
//! check both what [`HttpRoomInfoSource`] asks for and how it reads the reply.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use danmaku_client::infrastructure::{DiscoveryError, HttpRoomInfoSource, RoomInfoSource};

/// Serves one request with `status` and `body`; yields the request line.
async fn one_shot_http(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let base_url = format!("http://{}/room/info", listener.local_addr().expect("addr"));
    let (request_tx, request_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else { return };
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        let head = String::from_utf8_lossy(&head).into_owned();
        let request_line = head.lines().next().unwrap_or_default().to_string();
        let _ = request_tx.send(request_line);

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    });

    (base_url, request_rx)
}

#[tokio::test]
async fn test_fetch_sends_room_query_and_parses_hosts() {
    // Arrange
    let body = r#"{"code":0,"message":"0","data":{"token":"abc","host_list":[{"host":"one.example","port":2243,"wss_port":443,"ws_port":2244},{"host":"two.example","port":2243,"wss_port":443,"ws_port":2244}]}}"#;
    let (base_url, request) = one_shot_http("200 OK", body).await;
    let source = HttpRoomInfoSource::new(base_url);

    // Act
    let info = source.fetch("5440").await.expect("fetch succeeds");

    // Assert
    let request_line = request.await.expect("request seen");
    assert!(
        request_line.starts_with("GET /room/info?id=5440&type=0 "),
        "unexpected request line: {request_line}"
    );
    assert_eq!(info.token(), Some("abc"));
    assert_eq!(info.endpoint().as_deref(), Some("wss://one.example/sub"));
}

#[tokio::test]
async fn test_fetch_reports_api_error_code() {
    let (base_url, _request) =
        one_shot_http("200 OK", r#"{"code":19002000,"message":"room not found"}"#).await;
    let source = HttpRoomInfoSource::new(base_url);

    let err = source.fetch("1").await.unwrap_err();

    assert!(matches!(err, DiscoveryError::Api { code: 19002000, .. }), "got {err:?}");
}

#[tokio::test]
async fn test_fetch_reports_http_error_status() {
    let (base_url, _request) = one_shot_http("503 Service Unavailable", "{}").await;
    let source = HttpRoomInfoSource::new(base_url);

    let err = source.fetch("1").await.unwrap_err();

    assert!(matches!(err, DiscoveryError::Http(_)), "got {err:?}");
}

#[tokio::test]
async fn test_fetch_reports_malformed_body() {
    let (base_url, _request) = one_shot_http("200 OK", "<html>oops</html>").await;
    let source = HttpRoomInfoSource::new(base_url);

    let err = source.fetch("1").await.unwrap_err();

    assert!(matches!(err, DiscoveryError::Decode(_)), "got {err:?}");
}
