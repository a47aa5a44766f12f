//! Client for a local Ollama server.

pub mod prompt;

use crate::config::OllamaConfig;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

pub use prompt::schema_prompt;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to reach the model server at {url} (is `ollama serve` running?): {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model server at {url} did not answer in time")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("model server returned an unexpected reply: {0}")]
    InvalidResponse(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Text generation backend
pub trait ModelClient: Send {
    /// Send a prompt and return the model's free-text answer
    fn generate(&self, prompt: &str) -> Result<String, ModelError>;

    /// Check the server is up; returns its version string
    fn probe(&self) -> Result<String, ModelError>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig) -> Result<Self, ModelError> {
        // The blocking client defaults to 30s, so `None` has to be passed explicitly
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ModelError::Client)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_error(url: &str, source: reqwest::Error) -> ModelError {
        let url = url.to_string();
        if source.is_timeout() {
            ModelError::Timeout { url, source }
        } else {
            ModelError::Unreachable { url, source }
        }
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ModelError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ModelError::Http {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            })
        }
    }
}

impl ModelClient for OllamaClient {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let url = self.url("/api/generate");
        info!(model = %self.model, "requesting schema from model");

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .map_err(|source| Self::send_error(&url, source))?;

        let body: GenerateResponse = Self::check_status(response)?.json().map_err(|e| {
            if e.is_timeout() {
                Self::send_error(&url, e)
            } else {
                ModelError::InvalidResponse(e.to_string())
            }
        })?;
        debug!(chars = body.response.len(), "model answered");
        Ok(body.response)
    }

    fn probe(&self) -> Result<String, ModelError> {
        let url = self.url("/api/version");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|source| Self::send_error(&url, source))?;

        let body: Value = Self::check_status(response)?
            .json()
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;
        match body.get("version") {
            Some(Value::String(version)) if !version.trim().is_empty() => Ok(version.clone()),
            Some(Value::Number(version)) => Ok(version.to_string()),
            _ => Err(ModelError::InvalidResponse(
                "version reply has no usable `version` field".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Response, Server};

    /// Serve a single canned reply and hand back the request seen
    fn serve_once(status: u16, body: &'static str) -> (String, thread::JoinHandle<(String, String)>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = thread::spawn(move || {
            let mut request = server.recv().unwrap();
            let mut received = String::new();
            request.as_reader().read_to_string(&mut received).unwrap();
            let path = request.url().to_string();
            request
                .respond(Response::from_string(body).with_status_code(status))
                .unwrap();
            (path, received)
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    fn serve_late(delay: Duration) -> (String, thread::JoinHandle<()>) {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let handle = thread::spawn(move || {
            let request = server.recv().unwrap();
            thread::sleep(delay);
            let _ = request.respond(Response::from_string(r#"{"response":"late"}"#));
        });
        (format!("http://127.0.0.1:{}", port), handle)
    }

    fn client(base_url: String) -> OllamaClient {
        OllamaClient::new(&OllamaConfig {
            base_url,
            model: "llama3.2".to_string(),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    #[test]
    fn generate_posts_non_streaming_request() {
        let (url, handle) = serve_once(200, r#"{"model":"llama3.2","response":"{\"nodes\":[]}","done":true}"#);
        let answer = client(url).generate("describe a shop").unwrap();
        assert_eq!(answer, r#"{"nodes":[]}"#);

        let (path, body) = handle.join().unwrap();
        assert_eq!(path, "/api/generate");
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["prompt"], "describe a shop");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn generate_reports_http_errors() {
        let (url, handle) = serve_once(404, r#"{"error":"model not found"}"#);
        let err = client(url).generate("x").unwrap_err();
        handle.join().unwrap();
        match err {
            ModelError::Http { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("model not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn probe_reads_version() {
        let (url, handle) = serve_once(200, r#"{"version":"0.5.7"}"#);
        assert_eq!(client(url).probe().unwrap(), "0.5.7");
        assert_eq!(handle.join().unwrap().0, "/api/version");
    }

    #[test]
    fn probe_without_version_fails() {
        let (url, handle) = serve_once(200, r#"{"status":"ok"}"#);
        assert!(matches!(client(url).probe(), Err(ModelError::InvalidResponse(_))));
        handle.join().unwrap();
    }

    #[test]
    fn probe_rejects_empty_version() {
        for reply in [r#"{"version":null}"#, r#"{"version":""}"#, r#"{"version":false}"#] {
            let (url, handle) = serve_once(200, reply);
            assert!(
                matches!(client(url).probe(), Err(ModelError::InvalidResponse(_))),
                "{reply} counted as online"
            );
            handle.join().unwrap();
        }
    }

    #[test]
    fn probe_accepts_numeric_version() {
        let (url, handle) = serve_once(200, r#"{"version":5}"#);
        assert_eq!(client(url).probe().unwrap(), "5");
        handle.join().unwrap();
    }

    #[test]
    fn slow_generation_reports_timeout() {
        let (url, handle) = serve_late(Duration::from_secs(3));
        let slow = OllamaClient::new(&OllamaConfig::new(url, "llama3.2".to_string(), 1)).unwrap();
        let err = slow.generate("x").unwrap_err();
        assert!(matches!(err, ModelError::Timeout { .. }), "got {err}");
        handle.join().unwrap();
    }

    #[test]
    fn zero_timeout_outlasts_a_slow_reply() {
        let (url, handle) = serve_late(Duration::from_secs(2));
        let patient = OllamaClient::new(&OllamaConfig::new(url, "llama3.2".to_string(), 0)).unwrap();
        assert_eq!(patient.generate("x").unwrap(), "late");
        handle.join().unwrap();
    }

    #[test]
    fn bare_host_reaches_server() {
        let (url, handle) = serve_once(200, r#"{"version":"0.5.7"}"#);
        let bare = url.trim_start_matches("http://").to_string();
        let probe = OllamaClient::new(&OllamaConfig::new(bare, "llama3.2".to_string(), 5))
            .unwrap()
            .probe();
        assert_eq!(probe.unwrap(), "0.5.7");
        handle.join().unwrap();
    }

    #[test]
    fn probe_unreachable_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client(format!("http://127.0.0.1:{}/", port)).probe().unwrap_err();
        assert!(matches!(err, ModelError::Unreachable { .. }));
    }
}
