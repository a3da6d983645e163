//! Wire-level tests for URL construction, body encoding and error
//! surfacing, against hand-rolled local HTTP servers.

use requin::{Auth, Error, Request, Session};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

type Handler = Arc<dyn Fn(&str) -> String + Send + Sync>;

async fn read_request(socket: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..pos]).to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if data.len() >= pos + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

/// Spawn a server that feeds every raw request through `handler` and
/// records it. Returns the base URL and the capture log.
async fn spawn_server(handler: Handler) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let captured_srv = captured.clone();

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let handler = handler.clone();
                let captured = captured_srv.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    let response = handler(&request);
                    captured.lock().unwrap().push(request);
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        }
    });

    (format!("http://{}", addr), captured)
}

fn ok_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

#[tokio::test]
async fn test_query_params_on_wire() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response("hi"))).await;

    let mut session = Session::new();
    let resp = session
        .send(
            Request::get(format!("{}/get", base))
                .param("name", "John Doe")
                .param("age", "30"),
        )
        .await
        .unwrap();
    assert_eq!(resp.status_code(), 200);

    let wire = captured.lock().unwrap()[0].clone();
    assert!(wire.starts_with("GET /get?name=John+Doe&age=30 HTTP/1.1"));
}

#[tokio::test]
async fn test_query_params_join_existing_query_with_ampersand() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    let mut session = Session::new();
    session
        .send(Request::get(format!("{}/get?x=0", base)).param("a", "1"))
        .await
        .unwrap();

    let wire = captured.lock().unwrap()[0].clone();
    assert!(wire.starts_with("GET /get?x=0&a=1 "));
}

#[tokio::test]
async fn test_form_body_encoding_and_content_type() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    let mut session = Session::new();
    session
        .send(Request::post(format!("{}/post", base)).form([("a", "1 b"), ("c", "d")]))
        .await
        .unwrap();

    let wire = captured.lock().unwrap()[0].to_lowercase();
    assert!(wire.contains("content-type: application/x-www-form-urlencoded"));
    assert!(wire.ends_with("a=1+b&c=d"));
}

#[tokio::test]
async fn test_json_takes_precedence_over_form() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    let mut session = Session::new();
    session
        .send(
            Request::post(format!("{}/post", base))
                .form([("a", "1")])
                .json(&serde_json::json!({"user": "john"})),
        )
        .await
        .unwrap();

    let wire = captured.lock().unwrap()[0].clone();
    assert!(wire.to_lowercase().contains("content-type: application/json"));
    assert!(wire.contains("{\"user\":\"john\"}"));
    assert!(!wire.contains("a=1"));
}

#[tokio::test]
async fn test_unserializable_json_payload_fails_before_the_wire() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    // Non-string map keys cannot become a JSON object.
    let payload = std::collections::HashMap::from([(vec![1u8, 2], "v")]);

    let mut session = Session::new();
    let err = session
        .send(Request::post(format!("{}/post", base)).json(&payload))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::JsonEncode(_)));
    assert!(err.to_string().contains("serialize request body"));
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_raw_body_has_no_forced_content_type() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    let mut session = Session::new();
    session
        .send(Request::post(format!("{}/post", base)).body("plain payload"))
        .await
        .unwrap();

    let wire = captured.lock().unwrap()[0].clone();
    assert!(!wire.to_lowercase().contains("content-type:"));
    assert!(wire.ends_with("plain payload"));
}

#[tokio::test]
async fn test_no_body_request_transmits_nothing() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    let mut session = Session::new();
    session.get(&format!("{}/get", base)).await.unwrap();

    let wire = captured.lock().unwrap()[0].clone();
    assert!(!wire.to_lowercase().contains("content-type:"));
    assert!(wire.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_basic_auth_header_on_wire() {
    let (base, captured) =
        spawn_server(Arc::new(|_req: &str| ok_response(""))).await;

    let mut session = Session::new();
    session
        .send(Request::get(format!("{}/auth", base)).auth(Auth::basic("user", "passwd")))
        .await
        .unwrap();

    let wire = captured.lock().unwrap()[0].to_lowercase();
    assert!(wire.contains("authorization: basic dxnlcjpwyxnzd2q="));
}

#[tokio::test]
async fn test_error_status_body_is_buffered() {
    let (base, _captured) = spawn_server(Arc::new(|_req: &str| {
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 5\r\nConnection: close\r\n\r\noops!"
            .to_string()
    }))
    .await;

    let mut session = Session::new();
    let resp = session.get(&format!("{}/fail", base)).await.unwrap();

    assert_eq!(resp.status_code(), 500);
    assert!(!resp.is_ok());
    assert_eq!(resp.text(), "oops!");

    let err = resp.error_for_status().unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_charset_detection_from_response() {
    // The body byte 0xE9 is latin-1, so the response is assembled as raw
    // bytes rather than going through the string-based helper.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let _ = read_request(&mut socket).await;
            let mut response = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=ISO-8859-1\r\nContent-Length: 4\r\nConnection: close\r\n\r\n".to_vec();
            response.extend_from_slice(&[0x63, 0x61, 0x66, 0xE9]);
            let _ = socket.write_all(&response).await;
        }
    });

    let mut session = Session::new();
    let resp = session.get(&format!("http://{}/", addr)).await.unwrap();
    assert_eq!(resp.encoding(), "ISO-8859-1");
    assert_eq!(resp.text(), "café");
}

#[tokio::test]
async fn test_read_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and read the request but never answer.
    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let _ = read_request(&mut socket).await;
                    tokio::time::sleep(std::time::Duration::from_secs(60)).await;
                });
            }
        }
    });

    let mut session = Session::new();
    session.set_timeout(std::time::Duration::from_millis(300));
    let err = session
        .get(&format!("http://{}/slow", addr))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ReadTimeout { .. }));
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_connection_refused_maps_to_connection_error() {
    // Bind then drop to find a port with no listener.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut session = Session::new();
    let err = session
        .get(&format!("http://{}/nobody", addr))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connection { .. }));
    assert!(!err.is_timeout());
    assert!(err.url().is_some());
}

#[tokio::test]
async fn test_invalid_url() {
    let mut session = Session::new();
    let err = session.get("not a url at all").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}
