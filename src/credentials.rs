use std::collections::HashMap;

/// Source of API keys. Keys are looked up by service name (`"deepl"`).
pub trait CredentialStore: Send + Sync {
    fn get_active_key(&self, service: &str) -> Option<String>;
}

/// Reads keys from `<SERVICE>_API_KEY` (and `DEEPL_AUTH_KEY` for DeepL).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn get_active_key(&self, service: &str) -> Option<String> {
        let service = service.trim().to_uppercase();
        if service.is_empty() {
            return None;
        }
        get_env(&format!("{}_API_KEY", service)).or_else(|| match service.as_str() {
            "DEEPL" => get_env("DEEPL_AUTH_KEY"),
            _ => None,
        })
    }
}

/// Fixed in-memory keys, for callers that manage keys themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    active: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn with_key(mut self, service: &str, key: impl Into<String>) -> Self {
        self.active.insert(service.trim().to_lowercase(), key.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn get_active_key(&self, service: &str) -> Option<String> {
        self.active
            .get(&service.trim().to_lowercase())
            .filter(|key| !key.trim().is_empty())
            .cloned()
    }
}

/// Masks a key for display: `abcd...wxyz`.
pub fn mask_key(key: Option<&str>) -> String {
    match key.map(str::trim) {
        None | Some("") => "not set".to_string(),
        Some(key) if key.chars().count() < 8 => "****".to_string(),
        Some(key) => {
            let chars: Vec<char> = key.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
