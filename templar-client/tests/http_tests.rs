//! HTTP transport tests against a throwaway localhost server.
//!
//! Each test binds its own listener on an ephemeral port. No shared state.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::{json, Value};
use templar_client::{HttpReconciliationClient, ReconciliationClient};
use templar_core::{
    ClientConfig, Definition, DefinitionSet, Failure, Identifier, Namespace, PrunePolicy,
    StatusClass,
};

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

struct Stub {
    url: String,
    handle: JoinHandle<String>,
}

impl Stub {
    /// Serve exactly one request with the given status line and body, and
    /// hand back the raw request text.
    fn once(status: &str, body: &str) -> Self {
        Self::raw(format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
    }

    /// Serve one request with `response` written verbatim, then close.
    fn raw(response: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).expect("respond");
            stream.flush().expect("flush");
            request
        });
        Self { url, handle }
    }

    fn request(self) -> String {
        self.handle.join().expect("stub thread")
    }
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut head = String::new();
    let mut content_length = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header");
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse::<usize>().ok();
        }
        if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
            chunked = true;
        }
        head.push_str(&line);
        if line == "\r\n" || line.is_empty() {
            break;
        }
    }

    let mut body = String::new();
    if let Some(len) = content_length {
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).expect("read body");
        body = String::from_utf8_lossy(&buf).into_owned();
    } else if chunked {
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).expect("chunk size");
            let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
            let mut chunk = vec![0u8; size + 2];
            reader.read_exact(&mut chunk).expect("chunk");
            if size == 0 {
                break;
            }
            body.push_str(&String::from_utf8_lossy(&chunk[..size]));
        }
    }
    head + &body
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(url: &str) -> ClientConfig {
    ClientConfig {
        server: url.to_string(),
        ..ClientConfig::default()
    }
}

fn def(id: &str) -> Definition {
    let Value::Object(body) = json!({ "tasks": [{ "id": "t", "type": "io.echo" }] }) else {
        unreachable!()
    };
    Definition::new(id, "prod", body)
}

fn prod() -> Namespace {
    Namespace::from("prod")
}

// ---------------------------------------------------------------------------
// 1. Request shape
// ---------------------------------------------------------------------------

#[test]
fn posts_whole_set_to_namespace_endpoint() {
    let stub = Stub::once(
        "200 OK",
        r#"[{"id":"a","namespace":"prod"},{"id":"b","namespace":"prod"}]"#,
    );
    let mut cfg = config(&stub.url);
    cfg.token = Some("tok".to_string());
    cfg.headers.insert("X-Tenant".to_string(), "acme".to_string());
    let client = HttpReconciliationClient::new(&cfg);

    let set = DefinitionSet::new(vec![def("a"), def("b")]);
    let result = client
        .reconcile(&prod(), &set, PrunePolicy::Prune)
        .expect("reconcile");

    let request = stub.request();
    assert!(
        request.starts_with("POST /api/v1/templates/prod?delete=true HTTP/1.1"),
        "got: {request}"
    );
    let lower = request.to_ascii_lowercase();
    assert!(lower.contains("authorization: bearer tok"));
    assert!(lower.contains("x-tenant: acme"));
    assert!(lower.contains("content-type: application/json"));

    let body_start = request.find("\r\n\r\n").expect("body separator") + 4;
    let sent: Vec<Value> = serde_json::from_str(&request[body_start..]).expect("json body");
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["id"], "a");
    assert_eq!(sent[1]["namespace"], "prod");

    let ids: Vec<_> = result.definitions.iter().map(|d| d.identifier().clone()).collect();
    assert_eq!(ids, vec![Identifier::from("a"), Identifier::from("b")]);
    assert_eq!(result.deleted, None);
}

#[test]
fn retain_policy_sends_delete_false() {
    let stub = Stub::once("200 OK", "[]");
    let client = HttpReconciliationClient::new(&config(&stub.url));
    client
        .reconcile(&prod(), &DefinitionSet::default(), PrunePolicy::Retain)
        .expect("reconcile");
    let request = stub.request();
    assert!(request.starts_with("POST /api/v1/templates/prod?delete=false "), "got: {request}");
    assert!(request.ends_with("[]"), "empty set is still sent: {request}");
}

#[test]
fn detailed_response_exposes_deletions() {
    let stub = Stub::once(
        "200 OK",
        r#"{"definitions":[{"id":"a","namespace":"prod"}],"deleted":["c"]}"#,
    );
    let client = HttpReconciliationClient::new(&config(&stub.url));
    let result = client
        .reconcile(&prod(), &DefinitionSet::new(vec![def("a")]), PrunePolicy::Prune)
        .expect("reconcile");
    assert_eq!(result.deleted, Some(vec![Identifier::from("c")]));
    stub.request();
}

// ---------------------------------------------------------------------------
// 2. Failure classes
// ---------------------------------------------------------------------------

#[test]
fn unprocessable_entity_is_client_error_with_violations() {
    let body = r#"{"message":"Invalid entity","violations":[{"path":"tasks[0].type","message":"must not be null"},{"path":"id","message":"must match \"[a-z]+\""}]}"#;
    let stub = Stub::once("422 Unprocessable Entity", body);
    let client = HttpReconciliationClient::new(&config(&stub.url));
    let err = client
        .reconcile(&prod(), &DefinitionSet::new(vec![def("a")]), PrunePolicy::Prune)
        .unwrap_err();
    stub.request();

    match err {
        Failure::Transport {
            class: StatusClass::ClientError,
            code: Some(422),
            detail,
            violations,
        } => {
            assert_eq!(detail, body);
            assert_eq!(violations.len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn truncated_rejection_body_keeps_read_error_as_detail() {
    let stub = Stub::raw(
        "HTTP/1.1 422 Unprocessable Entity\r\nContent-Type: application/json\r\nContent-Length: 200\r\nConnection: close\r\n\r\n{\"message\":".to_string(),
    );
    let client = HttpReconciliationClient::new(&config(&stub.url));
    let err = client
        .reconcile(&prod(), &DefinitionSet::new(vec![def("a")]), PrunePolicy::Prune)
        .unwrap_err();
    stub.request();

    match err {
        Failure::Transport {
            class: StatusClass::ClientError,
            code: Some(422),
            detail,
            violations,
        } => {
            assert!(detail.contains("unreadable response body"), "got: {detail}");
            assert!(violations.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn server_error_is_other() {
    let stub = Stub::once("500 Internal Server Error", r#"{"message":"boom"}"#);
    let client = HttpReconciliationClient::new(&config(&stub.url));
    let err = client
        .reconcile(&prod(), &DefinitionSet::default(), PrunePolicy::Prune)
        .unwrap_err();
    stub.request();
    assert!(err.is_retryable(), "got: {err:?}");
}

#[test]
fn connection_refused_is_other() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let client = HttpReconciliationClient::new(&config(&format!("http://127.0.0.1:{port}")));
    let err = client
        .reconcile(&prod(), &DefinitionSet::default(), PrunePolicy::Prune)
        .unwrap_err();
    assert!(matches!(
        err,
        Failure::Transport { class: StatusClass::Other, code: None, .. }
    ));
}

#[test]
fn timeout_is_other() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("addr"));
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = read_request(&mut stream);
            thread::sleep(Duration::from_secs(5));
        }
    });

    let mut cfg = config(&url);
    cfg.timeout_secs = 1;
    let client = HttpReconciliationClient::new(&cfg);
    let err = client
        .reconcile(&prod(), &DefinitionSet::default(), PrunePolicy::Prune)
        .unwrap_err();
    assert!(err.is_retryable(), "got: {err:?}");
}

#[test]
fn undecodable_success_is_other() {
    let stub = Stub::once("200 OK", "not json");
    let client = HttpReconciliationClient::new(&config(&stub.url));
    let err = client
        .reconcile(&prod(), &DefinitionSet::default(), PrunePolicy::Prune)
        .unwrap_err();
    stub.request();
    assert!(err.is_retryable());
}
