use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::blocks::{DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE};
use crate::grouping::DEFAULT_MAX_DISTANCE;
use crate::paths;
use crate::providers::ProviderKind;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub max_distance: u32,
    pub service: ProviderKind,
    pub source_lang: String,
    pub target_lang: String,
    pub font_name: String,
    pub font_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            service: ProviderKind::Google,
            source_lang: "auto".to_string(),
            target_lang: "uk".to_string(),
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    grouping: Option<GroupingSettings>,
    translate: Option<TranslateSettings>,
    render: Option<RenderSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct GroupingSettings {
    max_distance: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateSettings {
    service: Option<String>,
    source_lang: Option<String>,
    target_lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    font_name: Option<String>,
    font_size: Option<i64>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let embedded: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML)
        .with_context(|| "failed to parse built-in settings")?;
    settings.merge(embedded);
    ensure_home_settings_file()?;

    // User-wide files first so project files in the working directory win.
    let mut ordered_paths = Vec::new();
    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(grouping) = incoming.grouping
            && let Some(distance) = grouping.max_distance
            && distance > 0
        {
            self.max_distance = u32::try_from(distance).unwrap_or(u32::MAX);
        }
        if let Some(translate) = incoming.translate {
            if let Some(kind) = translate.service.as_deref().and_then(ProviderKind::from_name) {
                self.service = kind;
            }
            if let Some(lang) = non_blank(translate.source_lang) {
                self.source_lang = lang;
            }
            if let Some(lang) = non_blank(translate.target_lang) {
                self.target_lang = lang;
            }
        }
        if let Some(render) = incoming.render {
            if let Some(font) = non_blank(render.font_name) {
                self.font_name = font;
            }
            if let Some(size) = render.font_size
                && size > 0
            {
                self.font_size = u32::try_from(size).unwrap_or(DEFAULT_FONT_SIZE);
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
