//! Wire-level tests for `OllamaClient` against a throwaway HTTP server.
//!
//! The server accepts one connection per canned reply, records the raw
//! request, answers and closes the connection.

use edgequake_pdf_ocr::pipeline::encode::encode_page;
use edgequake_pdf_ocr::{
    extract_rendered, InferenceError, OcrConfig, OcrEngine, OllamaClient, RenderedDocument,
    DEFAULT_OCR_PROMPT,
};
use image::{DynamicImage, GrayImage, Luma};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Mock server ──────────────────────────────────────────────────────────────

struct RecordedRequest {
    head: String,
    body: Vec<u8>,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<String> {
        let wanted = name.to_ascii_lowercase();
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            (k.trim().to_ascii_lowercase() == wanted).then(|| v.trim().to_string())
        })
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn spawn_server(replies: Vec<(u16, &'static str)>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    tokio::spawn(async move {
        for (status, body) in replies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            recorded.lock().unwrap().push(request);

            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                if status < 400 { "OK" } else { "Error" },
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    MockServer {
        url: format!("http://{addr}/api/generate"),
        requests,
    }
}

async fn read_request(socket: &mut TcpStream) -> RecordedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case("content-length")
                .then(|| v.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    RecordedRequest {
        head,
        body: buf[head_end..].to_vec(),
    }
}

/// Direct connections only, whatever proxy the environment configures.
fn ollama_client(url: impl Into<String>, model: &str) -> OllamaClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    OllamaClient::with_client(http, url, model)
}

fn page_image() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 5, Luma([200])))
}

// ── Client tests ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn sends_generate_request_and_reads_response() {
    let server = spawn_server(vec![(200, r#"{"model":"gemma3:27b","response":"Hello","done":true}"#)]).await;
    let client = ollama_client(&server.url, "gemma3:27b");
    let image = encode_page(&page_image()).unwrap();

    let text = client.extract_text(&image, DEFAULT_OCR_PROMPT).await.unwrap();
    assert_eq!(text, "Hello");

    let requests = server.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert!(req.head.starts_with("POST /api/generate HTTP/1.1"), "got: {}", req.head);
    assert_eq!(req.header("content-type").as_deref(), Some("application/json"));

    let body = req.json();
    assert_eq!(
        body,
        serde_json::json!({
            "model": "gemma3:27b",
            "prompt": DEFAULT_OCR_PROMPT,
            "stream": false,
            "images": [image.as_str()],
        })
    );
}

#[tokio::test]
async fn missing_response_field_is_empty_text() {
    let server = spawn_server(vec![(200, r#"{"done":true}"#)]).await;
    let client = ollama_client(&server.url, "m");
    let image = encode_page(&page_image()).unwrap();

    let text = client.extract_text(&image, "p").await.unwrap();
    assert_eq!(text, "");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = spawn_server(vec![(500, r#"{"error":"model not found"}"#)]).await;
    let client = ollama_client(&server.url, "m");
    let image = encode_page(&page_image()).unwrap();

    let err = client.extract_text(&image, "p").await.unwrap_err();
    match err {
        InferenceError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("model not found"), "got: {body}");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = spawn_server(vec![(200, "not json")]).await;
    let client = ollama_client(&server.url, "m");
    let image = encode_page(&page_image()).unwrap();

    let err = client.extract_text(&image, "p").await.unwrap_err();
    assert!(matches!(err, InferenceError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ollama_client(format!("http://{addr}/api/generate"), "m");
    let image = encode_page(&page_image()).unwrap();

    let err = client.extract_text(&image, "p").await.unwrap_err();
    assert!(matches!(err, InferenceError::Transport { .. }), "got {err:?}");
}

#[tokio::test]
async fn url_without_scheme_is_a_transport_error() {
    let client = OllamaClient::new("10.147.17.205:11434/api/generate", "gemma3:27b").unwrap();
    let image = encode_page(&page_image()).unwrap();

    let err = client.extract_text(&image, "p").await.unwrap_err();
    assert!(matches!(err, InferenceError::Transport { .. }), "got {err:?}");
}

// ── Driver over HTTP ─────────────────────────────────────────────────────────

#[tokio::test]
async fn driver_skips_failed_page_over_http() {
    let server = spawn_server(vec![
        (503, r#"{"error":"busy"}"#),
        (200, r#"{"response":"Second page text"}"#),
    ])
    .await;
    let config = OcrConfig::builder()
        .engine(Arc::new(ollama_client(&server.url, "llava")) as Arc<dyn OcrEngine>)
        .build()
        .unwrap();
    let doc = RenderedDocument {
        total_pages: 2,
        pages: vec![(0, page_image()), (1, page_image())],
    };

    let output = extract_rendered(doc, &config).await.unwrap();

    assert_eq!(output.text, "--- Page 2 ---\nSecond page text\n");
    assert_eq!(output.stats.failed_pages, 1);
    let requests = server.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.json()["model"] == "llava"));
}

#[tokio::test]
async fn url_without_scheme_skips_every_page() {
    let config = OcrConfig::builder()
        .server_url("10.147.17.205:11434/api/generate")
        .build()
        .expect("server URL is only checked per request");
    let doc = RenderedDocument {
        total_pages: 2,
        pages: vec![(0, page_image()), (1, page_image())],
    };

    let output = extract_rendered(doc, &config).await.unwrap();

    assert_eq!(output.text, "");
    assert_eq!(output.stats.failed_pages, 2);
    assert_eq!(output.stats.extracted_pages, 0);
    assert!(output.pages.iter().all(|p| p.error.is_some()));
}
