use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tracing::{debug, info};

use crate::credentials::CredentialStore;

mod deepl;
mod google;
mod retry;
#[cfg(test)]
mod stub;

pub use deepl::DeepL;
pub use google::Google;

/// Text stored in `TranslationItem::translated` when a provider fails.
pub const ERROR_MARKER: &str = "TRANSLATION ERROR";

pub fn is_error_marker(text: &str) -> bool {
    text.starts_with(ERROR_MARKER)
}

pub(crate) fn error_marker_with(detail: impl std::fmt::Display) -> String {
    format!("{}: {}", ERROR_MARKER, detail)
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{service} requires a non-empty API key")]
    Configuration { service: &'static str },
    #[error("failed to connect to {service}: {message}")]
    Connection {
        service: &'static str,
        message: String,
    },
    #[error("{service} rejected the batch: {message}")]
    Batch {
        service: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    DeepL,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::DeepL => "deepl",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Google => "Google Translate",
            ProviderKind::DeepL => "DeepL",
        }
    }

    pub fn requires_key(&self) -> bool {
        matches!(self, ProviderKind::DeepL)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "google" | "gtx" => Some(ProviderKind::Google),
            "deepl" => Some(ProviderKind::DeepL),
            _ => None,
        }
    }
}

/// One request/response unit of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub text: String,
    #[serde(default)]
    pub translated: String,
}

impl TranslationItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            translated: String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn failed(&self) -> bool {
        is_error_marker(&self.translated)
    }
}

/// Resolves to one translated string per input text, in order. Per-text
/// failures are error markers; `Err` means nothing could be attributed.
pub type TextsFuture = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send>>;
pub type BatchFuture = Pin<Box<dyn Future<Output = Result<Vec<TranslationItem>>> + Send>>;

pub trait TranslationProvider: Clone + Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Backend call for non-blank texts only.
    fn translate_texts(&self, texts: Vec<String>, source: &str, target: &str) -> TextsFuture;

    /// Translates a batch, keeping its length and order. Blank items are
    /// answered with `""` and never reach the backend.
    fn translate_batch(
        &self,
        mut items: Vec<TranslationItem>,
        source: &str,
        target: &str,
    ) -> BatchFuture {
        let pending: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_blank())
            .map(|(idx, _)| idx)
            .collect();
        for item in items.iter_mut().filter(|item| item.is_blank()) {
            item.translated = String::new();
        }
        if pending.is_empty() {
            debug!("batch has no text to translate");
            return Box::pin(async move { Ok(items) });
        }

        let texts = pending.iter().map(|&idx| items[idx].text.clone()).collect();
        let service = self.kind().display_name();
        let request = self.translate_texts(texts, source, target);
        Box::pin(async move {
            let translated = request.await?;
            if translated.len() != pending.len() {
                return Err(anyhow!(ProviderError::Batch {
                    service,
                    message: format!(
                        "expected {} translations, got {}",
                        pending.len(),
                        translated.len()
                    ),
                }));
            }
            for (idx, text) in pending.into_iter().zip(translated) {
                items[idx].translated = text;
            }
            Ok(items)
        })
    }
}

#[derive(Debug, Clone)]
pub enum ProviderImpl {
    Google(Google),
    DeepL(DeepL),
}

impl TranslationProvider for ProviderImpl {
    fn kind(&self) -> ProviderKind {
        match self {
            ProviderImpl::Google(provider) => provider.kind(),
            ProviderImpl::DeepL(provider) => provider.kind(),
        }
    }

    fn translate_texts(&self, texts: Vec<String>, source: &str, target: &str) -> TextsFuture {
        match self {
            ProviderImpl::Google(provider) => provider.translate_texts(texts, source, target),
            ProviderImpl::DeepL(provider) => provider.translate_texts(texts, source, target),
        }
    }
}

/// Builds the provider for `kind`, pulling a key from `credentials` when the
/// service needs one. Key-authenticated services are checked for liveness here.
pub async fn build_provider(
    kind: ProviderKind,
    override_key: Option<&str>,
    credentials: &dyn CredentialStore,
) -> Result<ProviderImpl> {
    match kind {
        ProviderKind::Google => Ok(ProviderImpl::Google(Google::new())),
        ProviderKind::DeepL => {
            let key = resolve_key(kind, override_key, credentials).ok_or_else(|| {
                anyhow!(ProviderError::Configuration {
                    service: kind.display_name(),
                })
            })?;
            let provider = DeepL::connect(key).await?;
            info!("connected to {}", kind.display_name());
            Ok(ProviderImpl::DeepL(provider))
        }
    }
}

pub fn resolve_key(
    kind: ProviderKind,
    override_key: Option<&str>,
    credentials: &dyn CredentialStore,
) -> Option<String> {
    override_key
        .map(str::to_string)
        .or_else(|| credentials.get_active_key(kind.as_str()))
        .filter(|key| !key.trim().is_empty())
}
