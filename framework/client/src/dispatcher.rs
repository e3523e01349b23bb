use crate::{FilePart, Payload};
use anyhow::Context;
use chrono::Utc;
use gust_instruments::RequestOutcome;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Url};
use std::time::{Duration, Instant};

/// Issues one HTTP request per call and converts whatever happens into a [RequestOutcome].
///
/// TLS and connection pooling are reqwest's concern. The dispatcher's job is timing and
/// the failure-is-data contract: timeouts and connection errors come back as outcomes with
/// the sentinel status `0`, never as errors, so a VU loop is never aborted by the network.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    base_url: Url,
}

impl Dispatcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid target base URL [{base_url}]"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Send one request and wait for the full response body.
    ///
    /// Latency covers send to full receipt, including connection setup.
    pub async fn dispatch(&self, method: Method, path: &str, payload: Payload) -> RequestOutcome {
        let timestamp = Utc::now();
        let started = Instant::now();

        let url = match self.base_url.join(path) {
            Ok(url) => url,
            Err(e) => {
                return RequestOutcome::dispatch_failure(
                    started.elapsed(),
                    timestamp,
                    format!("Invalid request path [{path}]: {e}"),
                )
            }
        };

        let mut request = self.client.request(method, url);
        request = match payload {
            Payload::Empty => request,
            Payload::Json(value) => request.json(&value),
            Payload::Multipart(parts) => request.multipart(build_form(parts)),
        };

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(body) => RequestOutcome::new(status, started.elapsed(), body, timestamp),
                    // Losing the body mid-read counts as a dispatch failure, not a response.
                    Err(e) => RequestOutcome::dispatch_failure(
                        started.elapsed(),
                        timestamp,
                        e.to_string(),
                    ),
                }
            }
            Err(e) => {
                log::debug!("Dispatch failed: {e}");
                RequestOutcome::dispatch_failure(started.elapsed(), timestamp, e.to_string())
            }
        }
    }
}

fn build_form(parts: Vec<FilePart>) -> Form {
    let mut form = Form::new();
    for part in parts {
        let piece = Part::bytes(part.bytes.to_vec()).file_name(part.file_name.clone());
        let piece = match piece.mime_str(&part.mime) {
            Ok(piece) => piece,
            Err(e) => {
                log::warn!(
                    "Invalid mime type [{}] for part [{}], sending without one: {e}",
                    part.mime,
                    part.field
                );
                Part::bytes(part.bytes.to_vec()).file_name(part.file_name)
            }
        };
        form = form.part(part.field, piece);
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Accepts connections and answers each with a fixed 200 response.
    fn start_stub_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                std::thread::spawn(move || {
                    let mut buf = [0u8; 8192];
                    let _ = stream.read(&mut buf);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                });
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn successful_get_produces_timed_outcome() {
        let base_url = start_stub_server("hello");
        let dispatcher = Dispatcher::new(&base_url, Dispatcher::DEFAULT_TIMEOUT).unwrap();

        let outcome = dispatcher.dispatch(Method::GET, "/api", Payload::Empty).await;

        assert_eq!(200, outcome.status);
        assert_eq!(b"hello".as_slice(), &outcome.body[..]);
        assert!(outcome.error.is_none());
        assert!(!outcome.is_dispatch_failure());
        assert!(outcome.latency > Duration::ZERO);
    }

    #[tokio::test]
    async fn multipart_post_is_accepted() {
        let base_url = start_stub_server("converted");
        let dispatcher = Dispatcher::new(&base_url, Dispatcher::DEFAULT_TIMEOUT).unwrap();

        let payload = Payload::multipart(vec![
            FilePart::jpeg("file", "braille.jpg", b"\xff\xd8\xff\xe0fake"),
            FilePart::new("files1", "other.jpg", "image/jpeg", vec![1, 2, 3]),
        ]);
        let outcome = dispatcher
            .dispatch(Method::POST, "/api/braille-to-text", payload)
            .await;

        assert_eq!(200, outcome.status);
        assert_eq!(b"converted".as_slice(), &outcome.body[..]);
    }

    #[tokio::test]
    async fn timeout_is_a_sentinel_outcome_not_an_error() {
        // Accept the connection but never answer.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });

        let dispatcher =
            Dispatcher::new(&format!("http://{addr}"), Duration::from_millis(100)).unwrap();
        let outcome = dispatcher.dispatch(Method::GET, "/api", Payload::Empty).await;

        assert_eq!(0, outcome.status);
        assert!(outcome.is_dispatch_failure());
        assert!(outcome.error.is_some());
        assert!(outcome.latency >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn connection_refused_is_a_sentinel_outcome() {
        // Bind then drop to find a port nobody is listening on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let dispatcher =
            Dispatcher::new(&format!("http://{addr}"), Duration::from_secs(1)).unwrap();
        let outcome = dispatcher.dispatch(Method::GET, "/api", Payload::Empty).await;

        assert_eq!(0, outcome.status);
        assert!(outcome.error.is_some());
        assert_eq!(0, outcome.body_len());
    }

    #[test]
    fn invalid_base_url_is_a_configuration_error() {
        assert!(Dispatcher::new("not a url", Dispatcher::DEFAULT_TIMEOUT).is_err());
    }
}
