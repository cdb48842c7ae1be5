use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod blocks;
pub mod check;
pub mod credentials;
pub mod grouping;
pub mod languages;
pub mod logging;
pub mod ocr;
mod paths;
pub mod pipeline;
pub mod providers;
pub mod redistribute;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use blocks::{BlockDefaults, TextBlock};
pub use grouping::{BubbleGrouper, Group};
pub use ocr::{BBoxPx, OcrDetection};
pub use pipeline::{Page, PageError, PipelineOptions, TranslationPipeline};
pub use providers::{
    DeepL, ERROR_MARKER, Google, ProviderError, ProviderImpl, ProviderKind, TranslationItem,
    TranslationProvider,
};

use credentials::EnvCredentials;
use languages::Direction;
use settings::Settings;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub detections: Option<PathBuf>,
    pub image: Option<PathBuf>,
    pub service: Option<String>,
    pub source_lang: Option<String>,
    pub lang: Option<String>,
    pub key: Option<String>,
    pub max_distance: Option<u32>,
    pub font_name: Option<String>,
    pub font_size: Option<u32>,
    pub settings_path: Option<String>,
    pub group_only: bool,
    pub check: Option<String>,
    pub show_languages: bool,
}

#[derive(Debug, Serialize)]
struct PageReport<'a> {
    service: Option<&'static str>,
    source_lang: Option<&'a str>,
    target_lang: Option<&'a str>,
    blocks: &'a [TextBlock],
    groups: &'a [Group],
    sentences: Vec<String>,
    failed_groups: Vec<usize>,
    error: Option<String>,
}

/// Runs one CLI invocation. `input` holds detections JSON read from stdin
/// when no detections file was given.
///
/// A page-level translation failure still yields the page report, with the
/// failure in its `error` field.
pub async fn run(config: Config, input: Option<String>) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let kind = resolve_service(config.service.as_deref(), &settings)?;

    if config.show_languages {
        return Ok(languages::format_table(kind));
    }
    if let Some(text) = config.check.as_deref() {
        let report =
            check::check_service(kind, text, config.key.as_deref(), &EnvCredentials).await?;
        return Ok(report.summary());
    }

    let detections = read_detections(&config, input)?;
    let defaults = BlockDefaults {
        font_name: config
            .font_name
            .clone()
            .unwrap_or_else(|| settings.font_name.clone()),
        font_size: config.font_size.unwrap_or(settings.font_size),
        page_size: page_size(config.image.as_deref())?,
    };
    let grouper = BubbleGrouper::new(config.max_distance.unwrap_or(settings.max_distance));

    if config.group_only {
        let page = Page::from_detections(&detections, &grouper, &defaults);
        return render_report(&page, None, None, None, None);
    }

    let source_lang = config
        .source_lang
        .clone()
        .unwrap_or_else(|| settings.source_lang.clone());
    let target_lang = config
        .lang
        .clone()
        .unwrap_or_else(|| settings.target_lang.clone());
    validate_lang_codes(kind, &source_lang, &target_lang)?;

    let provider =
        providers::build_provider(kind, config.key.as_deref(), &EnvCredentials).await?;
    let pipeline = TranslationPipeline::new(
        provider,
        grouper,
        PipelineOptions {
            source_lang: source_lang.clone(),
            target_lang: target_lang.clone(),
            blocks: defaults,
        },
    );

    let (page, error) = match pipeline.run(&detections).await {
        Ok(page) => (page, None),
        Err(err) => {
            warn!("{}", err);
            let message = err.to_string();
            (err.page, Some(message))
        }
    };
    render_report(
        &page,
        Some(kind),
        Some(&source_lang),
        Some(&target_lang),
        error,
    )
}

fn resolve_service(requested: Option<&str>, settings: &Settings) -> Result<ProviderKind> {
    match requested {
        Some(name) => ProviderKind::from_name(name)
            .ok_or_else(|| anyhow!("unknown translation service '{}' (use google or deepl)", name)),
        None => Ok(settings.service),
    }
}

fn read_detections(config: &Config, input: Option<String>) -> Result<Vec<OcrDetection>> {
    if let Some(path) = config.detections.as_deref() {
        return ocr::load_detections(path);
    }
    let input = input.unwrap_or_default();
    if input.trim().is_empty() {
        return Err(anyhow!(
            "no detections given (pass a detections file or pipe JSON to stdin)"
        ));
    }
    ocr::parse_detections(&input).with_context(|| "failed to parse detections from stdin")
}

fn page_size(image: Option<&Path>) -> Result<Option<(u32, u32)>> {
    let Some(path) = image else {
        return Ok(None);
    };
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("failed to read image: {}", path.display()))?;
    info!("page size {}x{} from {}", width, height, path.display());
    Ok(Some((width, height)))
}

fn validate_lang_codes(kind: ProviderKind, source_lang: &str, target_lang: &str) -> Result<()> {
    if !languages::is_valid_code(kind, Direction::Source, source_lang) {
        return Err(anyhow!(
            "source language '{}' is not supported by {} (see --show-languages)",
            source_lang,
            kind.display_name()
        ));
    }
    if !languages::is_valid_code(kind, Direction::Target, target_lang) {
        return Err(anyhow!(
            "target language '{}' is not supported by {} (see --show-languages)",
            target_lang,
            kind.display_name()
        ));
    }
    Ok(())
}

fn render_report(
    page: &Page,
    service: Option<ProviderKind>,
    source_lang: Option<&str>,
    target_lang: Option<&str>,
    error: Option<String>,
) -> Result<String> {
    let report = PageReport {
        service: service.map(|kind| kind.as_str()),
        source_lang,
        target_lang,
        blocks: page.blocks(),
        groups: page.groups(),
        sentences: page.sentences(),
        failed_groups: page.failed_groups(),
        error,
    };
    serde_json::to_string_pretty(&report).with_context(|| "failed to serialize page report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    const DETECTIONS: &str = r#"[
        [[[10, 0], [110, 0], [110, 20], [10, 20]], "Hello there", 0.98],
        [[[10, 40], [110, 40], [110, 60], [10, 60]], "friend", 0.91],
        [[[10, 400], [110, 400], [110, 420], [10, 420]], "Bye", 0.88]
    ]"#;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime")
    }

    #[test]
    fn group_only_reports_blocks_and_groups() {
        with_temp_home(|_| {
            let config = Config {
                group_only: true,
                ..Config::default()
            };
            let output = runtime()
                .block_on(run(config, Some(DETECTIONS.to_string())))
                .expect("run");
            let value: serde_json::Value = serde_json::from_str(&output).expect("json");
            assert_eq!(value["groups"], serde_json::json!([[0, 1], [2]]));
            assert_eq!(value["blocks"][1]["original_text"], "friend");
            assert_eq!(value["blocks"][0]["font_size"], 14);
            assert_eq!(
                value["sentences"],
                serde_json::json!(["Hello there friend", "Bye"])
            );
            assert!(value["error"].is_null());
        });
    }

    #[test]
    fn custom_distance_and_font_override_settings() {
        with_temp_home(|_| {
            let config = Config {
                group_only: true,
                max_distance: Some(10),
                font_name: Some("Comic Neue".to_string()),
                ..Config::default()
            };
            let output = runtime()
                .block_on(run(config, Some(DETECTIONS.to_string())))
                .expect("run");
            let value: serde_json::Value = serde_json::from_str(&output).expect("json");
            assert_eq!(value["groups"], serde_json::json!([[0], [1], [2]]));
            assert_eq!(value["blocks"][2]["font_name"], "Comic Neue");
        });
    }

    #[test]
    fn missing_detections_is_an_error() {
        with_temp_home(|_| {
            let err = runtime()
                .block_on(run(Config::default(), None))
                .unwrap_err();
            assert!(err.to_string().contains("no detections given"));
        });
    }

    #[test]
    fn unknown_service_is_rejected() {
        with_temp_home(|_| {
            let config = Config {
                service: Some("babelfish".to_string()),
                show_languages: true,
                ..Config::default()
            };
            let err = runtime().block_on(run(config, None)).unwrap_err();
            assert!(err.to_string().contains("unknown translation service"));
        });
    }

    #[test]
    fn show_languages_lists_service_table() {
        with_temp_home(|_| {
            let config = Config {
                service: Some("google".to_string()),
                show_languages: true,
                ..Config::default()
            };
            let output = runtime().block_on(run(config, None)).expect("run");
            assert!(output.contains("uk"));
        });
    }

    #[test]
    fn unsupported_target_is_rejected_before_translation() {
        with_temp_home(|_| {
            let config = Config {
                service: Some("google".to_string()),
                lang: Some("klingon".to_string()),
                ..Config::default()
            };
            let err = runtime()
                .block_on(run(config, Some(DETECTIONS.to_string())))
                .unwrap_err();
            assert!(err.to_string().contains("target language 'klingon'"));
        });
    }
}
