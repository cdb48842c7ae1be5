use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::info;

use crate::credentials::{CredentialStore, mask_key};
use crate::languages::{self, AUTO};
use crate::providers::{
    self, ProviderKind, TranslationItem, TranslationProvider, is_error_marker,
};

pub const DEFAULT_CHECK_TEXT: &str = "Привіт, світ!";

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub service: ProviderKind,
    pub key: String,
    pub input: String,
    pub output: String,
    pub ok: bool,
}

impl CheckReport {
    pub fn summary(&self) -> String {
        let status = if self.ok {
            "ok: service is working"
        } else {
            "failed: service returned an error"
        };
        format!(
            "service: {}\nkey: {}\ninput: {}\noutput: {}\n{}",
            self.service.display_name(),
            self.key,
            self.input,
            self.output,
            status
        )
    }
}

/// Translates `text` into English with the chosen service.
pub async fn check_service(
    kind: ProviderKind,
    text: &str,
    override_key: Option<&str>,
    credentials: &dyn CredentialStore,
) -> Result<CheckReport> {
    let key = if kind.requires_key() {
        mask_key(providers::resolve_key(kind, override_key, credentials).as_deref())
    } else {
        "not required".to_string()
    };
    ensure_text(text)?;
    let provider = providers::build_provider(kind, override_key, credentials).await?;
    let mut report = check_with_provider(&provider, text).await?;
    report.key = key;
    Ok(report)
}

pub async fn check_with_provider<P: TranslationProvider>(
    provider: &P,
    text: &str,
) -> Result<CheckReport> {
    let text = ensure_text(text)?;
    let kind = provider.kind();
    let result = provider
        .translate_batch(
            vec![TranslationItem::new(text)],
            AUTO,
            languages::english_target(kind),
        )
        .await?;
    let output = result
        .into_iter()
        .next()
        .map(|item| item.translated)
        .unwrap_or_default();
    let ok = !output.trim().is_empty() && !is_error_marker(&output);
    info!("{} check finished (ok: {})", kind.display_name(), ok);
    Ok(CheckReport {
        service: kind,
        key: String::new(),
        input: text.to_string(),
        output,
        ok,
    })
}

fn ensure_text(text: &str) -> Result<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("enter some text to check the service with"));
    }
    Ok(text)
}
