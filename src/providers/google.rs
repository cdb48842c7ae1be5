use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use super::retry::send_with_backoff;
use super::{ERROR_MARKER, ProviderKind, TextsFuture, TranslationProvider};

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Keyless Google Translate client (the public `gtx` endpoint).
///
/// Texts are sent one request each; a failure only marks that text.
#[derive(Debug, Clone)]
pub struct Google {
    client: reqwest::Client,
    base_url: String,
}

impl Default for Google {
    fn default() -> Self {
        Self::new()
    }
}

impl Google {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn translate_one(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let url = format!("{}/translate_a/single", self.base_url);
        let response = send_with_backoff("Google Translate", || {
            self.client.get(&url).query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
        })
        .await?;
        if !response.status.is_success() {
            return Err(anyhow!(
                "Google Translate error ({}): {}",
                response.status,
                response.body.trim()
            ));
        }
        extract_translation(&response.body)
    }
}

impl TranslationProvider for Google {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn translate_texts(&self, texts: Vec<String>, source: &str, target: &str) -> TextsFuture {
        let provider = self.clone();
        let source = normalize_code(source);
        let target = normalize_code(target);
        Box::pin(async move {
            let mut results = Vec::with_capacity(texts.len());
            for text in &texts {
                match provider.translate_one(text, &source, &target).await {
                    Ok(translated) => results.push(translated),
                    Err(err) => {
                        warn!("error translating with Google '{}': {:#}", text, err);
                        results.push(ERROR_MARKER.to_string());
                    }
                }
            }
            debug!("Google translated {} texts", results.len());
            Ok(results)
        })
    }
}

fn base_url() -> String {
    std::env::var("GOOGLE_TRANSLATE_BASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

fn normalize_code(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        "auto".to_string()
    } else {
        code.to_lowercase()
    }
}

/// The endpoint answers with nested arrays; the first element lists
/// `[translated, original, ...]` segments whose translations concatenate.
pub(crate) fn extract_translation(body: &str) -> Result<String> {
    let payload: Value =
        serde_json::from_str(body).with_context(|| "failed to parse Google response JSON")?;
    let segments = payload
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("no translation segments in Google response"))?;
    let mut out = String::new();
    for segment in segments {
        if let Some(text) = segment.get(0).and_then(Value::as_str) {
            out.push_str(text);
        }
    }
    if out.trim().is_empty() {
        return Err(anyhow!("empty translation in Google response"));
    }
    Ok(out)
}
