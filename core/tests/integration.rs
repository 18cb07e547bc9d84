//! End-to-end exchanges against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every service
//! operation through a `Transport` backed by ureq. The fixture speaks plain
//! HTTP, so the test transport connects with `http://` to the host and port
//! the service resolved; everything above the socket is the production path.

use std::net::SocketAddr;

use async_trait::async_trait;
use https_core::{
    BoxError, Headers, HttpMethod, HttpRequest, HttpResponse, HttpsError, HttpsService, Query, ResponseBody, Transport,
    FORM_MEDIA_TYPE, JSON_MEDIA_TYPE,
};
use mock_server::Echo;
use serde_json::json;

/// Executes requests with ureq on the blocking pool.
struct UreqTransport;

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        tokio::task::spawn_blocking(move || execute(request)).await?
    }
}

/// Disables ureq's status-as-error behavior so 4xx/5xx responses come back
/// as data for the service to classify.
fn execute(req: HttpRequest) -> Result<HttpResponse, BoxError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let url = format!("http://{}:{}{}", req.host, req.port, req.path);
    let body = req.body.unwrap_or_default();

    let result = match req.method {
        HttpMethod::Get => with_headers(agent.get(&url), &req.headers).call(),
        HttpMethod::Head => with_headers(agent.head(&url), &req.headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&url), &req.headers).call(),
        HttpMethod::Post => with_headers(agent.post(&url), &req.headers).send(&body[..]),
        HttpMethod::Put => with_headers(agent.put(&url), &req.headers).send(&body[..]),
        HttpMethod::Patch => with_headers(agent.patch(&url), &req.headers).send(&body[..]),
        HttpMethod::Other(name) => return Err(format!("unsupported method {name}").into()),
    };
    let mut response = result?;

    let status = response.status().as_u16();
    let headers: Headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.body_mut().read_to_vec()?;

    Ok(HttpResponse { status, headers, body })
}

/// ureq derives `content-length` from the body itself, so that header is not
/// forwarded.
fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &Headers) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        if !name.eq_ignore_ascii_case("content-length") {
            builder = builder.header(name, value);
        }
    }
    builder
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn service(addr: SocketAddr) -> HttpsService<UreqTransport> {
    HttpsService::with_transport(&format!("https://{addr}"), UreqTransport).unwrap()
}

fn echo_of(reply: &https_core::Reply) -> Echo {
    reply.json().expect("expected a JSON body").unwrap()
}

#[tokio::test]
async fn get_sends_query_and_decodes_json() {
    let addr = start_server();
    let svc = service(addr);

    let query = Query::pairs([("x", "1"), ("y", "two words")]);
    let reply = svc.get("/echo", Some(&query)).await.unwrap();

    assert_eq!(reply.content_type.as_deref(), Some(JSON_MEDIA_TYPE));
    let echo = echo_of(&reply);
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("x=1&y=two+words"));
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn post_structured_value_is_json_encoded() {
    let addr = start_server();
    let svc = service(addr);

    let reply = svc.post("/created", json!({"name": "widget", "qty": 3})).await.unwrap();
    let echo = echo_of(&reply);

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.headers["content-type"], JSON_MEDIA_TYPE);
    assert_eq!(echo.headers["content-length"], echo.body.len().to_string());
    let sent: serde_json::Value = serde_json::from_str(&echo.body).unwrap();
    assert_eq!(sent, json!({"name": "widget", "qty": 3}));
}

#[tokio::test]
async fn put_with_form_header_is_form_encoded() {
    let addr = start_server();
    let svc = service(addr);

    let headers: Headers = [("Content-Type", FORM_MEDIA_TYPE)].into_iter().collect();
    let reply = svc
        .request("put", "/echo", Some(headers), Some(json!({"a": 1, "b": "two words"}).into()))
        .await
        .unwrap();
    let echo = echo_of(&reply);

    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.headers["content-type"], FORM_MEDIA_TYPE);
    assert_eq!(echo.body, "a=1&b=two+words");
}

#[tokio::test]
async fn patch_text_counts_bytes() {
    let addr = start_server();
    let svc = service(addr);

    let built = svc.build_request("PATCH", "/echo", None, Some("naïve ☕".into())).unwrap();
    assert_eq!(built.headers.get("content-length"), Some("10"));

    let reply = svc.patch("/echo", "naïve ☕").await.unwrap();
    let echo = echo_of(&reply);
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.headers["content-length"], "10");
    assert_eq!(echo.body, "naïve ☕");
}

#[tokio::test]
async fn delete_no_content_forwards_headers() {
    let addr = start_server();
    let svc = service(addr);

    let reply = svc.delete("/no-content").await.unwrap();
    assert_eq!(reply.body, None);
    assert_eq!(reply.content_type, None);
    assert_eq!(reply.headers.get("ETag"), Some("\"v1\""));
}

#[tokio::test]
async fn head_discards_body() {
    let addr = start_server();
    let svc = service(addr);

    let reply = svc.head("/echo", None).await.unwrap();
    assert_eq!(reply.body, None);
    assert_eq!(reply.content_type.as_deref(), Some(JSON_MEDIA_TYPE));
}

#[tokio::test]
async fn text_xml_and_binary_bodies() {
    let addr = start_server();
    let svc = service(addr);

    let reply = svc.get("/text", None).await.unwrap();
    assert_eq!(reply.text(), Some("plain text"));
    assert_eq!(reply.content_type.as_deref(), Some("text/plain"));

    let reply = svc.get("/feed", None).await.unwrap();
    assert_eq!(reply.body, Some(ResponseBody::Text("<feed xmlns=\"http://www.w3.org/2005/Atom\"/>".to_string())));

    let reply = svc.get("/binary", None).await.unwrap();
    assert_eq!(reply.bytes(), Some(&[0u8, 1, 2, 255][..]));
}

#[tokio::test]
async fn upstream_error_shapes() {
    let addr = start_server();
    let svc = service(addr);

    let err = svc.post("/error-description", json!({"client_id": "abc"})).await.unwrap_err();
    assert_eq!(err.status(), 400);
    assert_eq!(
        err.to_string(),
        format!("[POST https://{addr}/error-description] AADSTS7000215: Invalid client secret provided.")
    );

    let err = svc.get("/error-object", None).await.unwrap_err();
    assert_eq!(err.status(), 403);
    assert!(err.to_string().ends_with("] Insufficient privileges to complete the operation."));

    let err = svc.get("/odata-error", None).await.unwrap_err();
    assert_eq!(err.status(), 404);
    assert!(err.to_string().ends_with("] Resource 'alice' does not exist."));
}

#[tokio::test]
async fn failure_statuses_use_generic_message() {
    let addr = start_server();
    let svc = service(addr);

    let err = svc.get("/server-error", None).await.unwrap_err();
    assert!(matches!(err, HttpsError::Upstream { status: 500, .. }));
    assert!(err.to_string().ends_with("] The request was not successfully completed."));

    let err = svc.get("/nowhere", None).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("[GET https://{addr}/nowhere] The request was not successfully completed.")
    );
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn empty_and_malformed_json_are_bad_gateway() {
    let addr = start_server();
    let svc = service(addr);

    let err = svc.get("/empty-json", None).await.unwrap_err();
    assert!(matches!(err, HttpsError::BadGateway { .. }));
    assert_eq!(err.to_string(), format!("[GET https://{addr}/empty-json] Empty Response"));

    let err = svc.get("/malformed-json", None).await.unwrap_err();
    assert_eq!(err.status(), 502);
    assert!(err.to_string().starts_with(&format!("[GET https://{addr}/malformed-json] ")));
}

#[tokio::test]
async fn connection_failures_surface_as_transport_errors() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let svc = service(addr);
    let err = svc.get("/echo", None).await.unwrap_err();
    assert!(matches!(err, HttpsError::Transport(_)));
    assert_eq!(err.status(), 0);
    assert!(!err.to_string().starts_with('['));
}
