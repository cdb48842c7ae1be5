use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::retry::send_with_backoff;
use super::{
    ERROR_MARKER, ProviderError, ProviderKind, TextsFuture, TranslationProvider, error_marker_with,
};
use crate::languages::{deepl_source_lang, deepl_target_lang};

const PRO_BASE_URL: &str = "https://api.deepl.com";
const FREE_BASE_URL: &str = "https://api-free.deepl.com";
const SERVICE: &str = "DeepL";

pub const UNSUPPORTED_LANGUAGE_MARKER: &str =
    "TRANSLATION ERROR: language not supported by this API";

/// API-key authenticated DeepL client. Only obtainable through
/// [`DeepL::connect`], which verifies the key against the usage endpoint.
#[derive(Debug, Clone)]
pub struct DeepL {
    client: reqwest::Client,
    key: String,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeepLUsage {
    pub character_count: Option<u64>,
    pub character_limit: Option<u64>,
}

impl DeepL {
    pub async fn connect(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let base_url = base_url_for_key(&key);
        Self::connect_with_base_url(key, base_url).await
    }

    pub async fn connect_with_base_url(
        key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(anyhow!(ProviderError::Configuration { service: SERVICE }));
        }
        let provider = Self {
            client: reqwest::Client::new(),
            key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        };
        let usage = provider.usage().await.map_err(|err| {
            anyhow!(ProviderError::Connection {
                service: SERVICE,
                message: format!("{:#}", err),
            })
        })?;
        debug!(
            "DeepL usage: {}/{} characters",
            usage.character_count.unwrap_or(0),
            usage.character_limit.unwrap_or(0)
        );
        Ok(provider)
    }

    pub async fn usage(&self) -> Result<DeepLUsage> {
        let url = format!("{}/v2/usage", self.base_url);
        let response = send_with_backoff(SERVICE, || {
            self.client.get(&url).header("Authorization", self.auth_header())
        })
        .await?;
        if !response.status.is_success() {
            return Err(anyhow!(
                "DeepL API error ({}): {}",
                response.status,
                extract_deepl_error(&response.body).unwrap_or(response.body)
            ));
        }
        serde_json::from_str(&response.body).with_context(|| "failed to parse DeepL usage JSON")
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.key)
    }

    async fn translate_all(
        &self,
        texts: Vec<String>,
        source: Option<String>,
        target: String,
    ) -> Result<Vec<String>> {
        let url = format!("{}/v2/translate", self.base_url);
        let mut body = json!({
            "text": texts,
            "target_lang": target,
        });
        if let Some(source) = source {
            body["source_lang"] = json!(source);
        }

        let response = match send_with_backoff(SERVICE, || {
            self.client
                .post(&url)
                .header("Authorization", self.auth_header())
                .json(&body)
        })
        .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("general error while translating with DeepL: {:#}", err);
                return Ok(vec![ERROR_MARKER.to_string(); texts.len()]);
            }
        };

        if response.status.is_success() {
            return extract_translations(&response.body, texts.len());
        }

        let message = extract_deepl_error(&response.body).unwrap_or(response.body);
        if matches!(
            response.status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(anyhow!(ProviderError::Connection {
                service: SERVICE,
                message: format!("credential rejected ({}): {}", response.status, message),
            }));
        }
        warn!("DeepL API error ({}): {}", response.status, message);
        Ok(vec![batch_error_marker(&message); texts.len()])
    }
}

impl TranslationProvider for DeepL {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepL
    }

    fn translate_texts(&self, texts: Vec<String>, source: &str, target: &str) -> TextsFuture {
        let provider = self.clone();
        let source = deepl_source_lang(source);
        let target = deepl_target_lang(target);
        Box::pin(async move {
            debug!("DeepL batch of {} texts", texts.len());
            provider.translate_all(texts, source, target).await
        })
    }
}

fn base_url_for_key(key: &str) -> String {
    if let Some(url) = std::env::var("DEEPL_BASE_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
    {
        return url;
    }
    if key.trim().ends_with(":fx") {
        FREE_BASE_URL.to_string()
    } else {
        PRO_BASE_URL.to_string()
    }
}

fn batch_error_marker(message: &str) -> String {
    if message.contains("source_lang") || message.contains("target_lang") {
        UNSUPPORTED_LANGUAGE_MARKER.to_string()
    } else {
        error_marker_with(format!("DeepL: {}", message))
    }
}

pub(crate) fn extract_translations(body: &str, expected: usize) -> Result<Vec<String>> {
    let payload: DeepLResponse =
        serde_json::from_str(body).with_context(|| "failed to parse DeepL response JSON")?;
    if payload.translations.len() != expected {
        return Err(anyhow!(ProviderError::Batch {
            service: SERVICE,
            message: format!(
                "expected {} translations, got {}",
                expected,
                payload.translations.len()
            ),
        }));
    }
    Ok(payload
        .translations
        .into_iter()
        .map(|translation| translation.text)
        .collect())
}

fn extract_deepl_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        detail: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match (parsed.message, parsed.detail) {
        (Some(message), Some(detail)) if !detail.trim().is_empty() => {
            Some(format!("{}, {}", message, detail))
        }
        (Some(message), _) => Some(message),
        (None, detail) => detail,
    }
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    #[serde(default)]
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}
