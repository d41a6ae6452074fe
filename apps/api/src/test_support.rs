//! In-test fakes for the external collaborators plus a throwaway local HTTP server.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::Value;
use tower::ServiceExt;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::url_validator::UrlValidator;
use crate::config::Config;
use crate::extraction::{ensure_text, ExtractionError, TextExtractor};
use crate::llm_client::{CompletionClient, CompletionRequest, LlmError};
use crate::routes::build_router;
use crate::state::AppState;

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Treats document bytes as UTF-8 text. Documents starting with `%CORRUPT` fail.
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, document: Bytes) -> Result<String, ExtractionError> {
        if document.starts_with(b"%CORRUPT") {
            return Err(ExtractionError::Unreadable("corrupt test document".to_string()));
        }
        let text = String::from_utf8(document.to_vec())
            .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;
        ensure_text(text)
    }
}

/// Replies chosen by the first rule whose needle appears in the prompt.
/// Records every prompt it receives, and every prompt again once answered.
pub struct ScriptedCompletion {
    rules: Vec<(String, Result<String, u16>)>,
    delays: Vec<(String, Duration)>,
    fallback: String,
    pub prompts: Mutex<Vec<String>>,
    pub completed: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn always(reply: &str) -> Self {
        Self {
            rules: vec![],
            delays: vec![],
            fallback: reply.to_string(),
            prompts: Mutex::new(vec![]),
            completed: Mutex::new(vec![]),
        }
    }

    /// Adds a rule: prompts containing `needle` are answered after `delay`.
    pub fn delay_when(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.push((needle.to_string(), delay));
        self
    }

    /// Adds a rule: prompts containing `needle` get `reply`.
    pub fn when(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    /// Adds a rule: prompts containing `needle` fail with an upstream API error.
    pub fn fail_when(mut self, needle: &str, status: u16) -> Self {
        self.rules.push((needle.to_string(), Err(status)));
        self
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        if let Some((_, delay)) = self
            .delays
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
        {
            tokio::time::sleep(*delay).await;
        }
        self.completed
            .lock()
            .unwrap()
            .push(request.prompt.to_string());

        for (needle, outcome) in &self.rules {
            if request.prompt.contains(needle.as_str()) {
                return match outcome {
                    Ok(reply) => Ok(reply.clone()),
                    Err(status) => Err(LlmError::Api {
                        status: *status,
                        message: "scripted failure".to_string(),
                    }),
                };
            }
        }
        Ok(self.fallback.clone())
    }
}

/// Only the listed URLs are reachable. Counts checks per URL.
#[derive(Default)]
pub struct StaticUrlValidator {
    live: HashSet<String>,
    pub checks: Mutex<HashMap<String, usize>>,
}

impl StaticUrlValidator {
    pub fn with_live(urls: &[&str]) -> Self {
        Self {
            live: urls.iter().map(|u| u.to_string()).collect(),
            checks: Mutex::new(HashMap::new()),
        }
    }

    pub fn total_checks(&self) -> usize {
        self.checks.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl UrlValidator for StaticUrlValidator {
    async fn is_reachable(&self, url: &str) -> bool {
        *self
            .checks
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;
        self.live.contains(url)
    }
}

/// A well-formed analysis reply wrapped in prose, with one live and one dead course URL.
pub const PROSE_WRAPPED_REPLY: &str = r#"Sure! Here is the analysis you asked for:

{
  "match_percentage": 62,
  "similarities": ["Python", "REST APIs"],
  "missing": ["Cloud experience (AWS/GCP)", "2 more years of Python"],
  "course_recommendations": [
    {"name": "AWS Cloud Practitioner", "url": "https://courses.example.com/aws"},
    {"name": "Dead Link Course", "url": "https://dead.example.com/gone"},
    {"name": "Kubernetes Basics", "topics_to_cover": ["Pods", "Deployments"]}
  ]
}

Let me know if you need anything else."#;

pub const LIVE_COURSE_URL: &str = "https://courses.example.com/aws";

// ────────────────────────────────────────────────────────────────────────────
// Router-level helpers
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        openai_api_key: "sk-test".to_string(),
        openai_base_url: "http://127.0.0.1:9".to_string(),
        completion_model: "test-model".to_string(),
        completion_timeout_secs: 5,
        url_check_timeout_secs: 5,
        batch_concurrency: 2,
        max_upload_bytes: 1024 * 1024,
        cors_origin: "http://localhost:3575".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Full router over the fake collaborators. Only `LIVE_COURSE_URL` is reachable.
pub fn test_app(llm: ScriptedCompletion) -> Router {
    let config = test_config();
    let extractor: Arc<dyn TextExtractor> = Arc::new(PlainTextExtractor);
    let llm: Arc<dyn CompletionClient> = Arc::new(llm);
    let analyzer = Analyzer::new(
        extractor.clone(),
        llm.clone(),
        Arc::new(StaticUrlValidator::with_live(&[LIVE_COURSE_URL])),
        config.completion_model.clone(),
    );
    build_router(AppState {
        config,
        analyzer: Arc::new(analyzer),
        extractor,
        llm,
    })
}

/// One multipart part: a file (has a filename) or a plain text field.
pub struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    body: &'a str,
}

impl<'a> Part<'a> {
    pub fn file(name: &'a str, filename: &'a str, body: &'a str) -> Self {
        Self {
            name,
            filename: Some(filename),
            body,
        }
    }

    pub fn text(name: &'a str, body: &'a str) -> Self {
        Self {
            name,
            filename: None,
            body,
        }
    }
}

const BOUNDARY: &str = "jobmatch-test-boundary";

fn multipart_body(parts: &[Part<'_>]) -> String {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match part.filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n",
                part.name
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                part.name
            )),
        }
        body.push_str(part.body);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// POSTs a multipart form and returns the status plus the JSON body
/// (or the raw body as a JSON string when it is not JSON).
pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}
