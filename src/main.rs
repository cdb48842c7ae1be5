use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use manhwa_translator::check::DEFAULT_CHECK_TEXT;

#[derive(Parser, Debug)]
#[command(
    name = "manhwa-translator",
    version,
    about = "Group OCR text boxes into speech bubbles and translate them"
)]
struct Cli {
    /// Detections JSON file (reads stdin when omitted)
    detections: Option<PathBuf>,

    /// Page image; only its dimensions are used to clamp boxes
    #[arg(short = 'i', long = "image")]
    image: Option<PathBuf>,

    /// Translation service: google or deepl (default from settings)
    #[arg(short = 's', long = "service")]
    service: Option<String>,

    /// Source language code. Use "auto" to detect.
    #[arg(short = 'L', long = "source-lang")]
    source_lang: Option<String>,

    /// Target language code in the service's vocabulary
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// API key (overrides environment variables)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Largest vertical gap in pixels that still joins two boxes
    #[arg(long = "max-distance")]
    max_distance: Option<u32>,

    /// Font name stored on every block
    #[arg(long = "font-name")]
    font_name: Option<String>,

    /// Font size stored on every block
    #[arg(long = "font-size")]
    font_size: Option<u32>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Group the detections without translating
    #[arg(long = "group-only")]
    group_only: bool,

    /// Translate a sample text into English to check the service, then exit
    #[arg(
        long = "check",
        value_name = "TEXT",
        num_args = 0..=1,
        default_missing_value = DEFAULT_CHECK_TEXT
    )]
    check: Option<String>,

    /// Show the service's supported languages and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    manhwa_translator::logging::init(cli.verbose)?;

    let needs_stdin = cli.detections.is_none() && !cli.show_languages && cli.check.is_none();
    let input = if needs_stdin && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    } else {
        None
    };

    let output = manhwa_translator::run(
        manhwa_translator::Config {
            detections: cli.detections,
            image: cli.image,
            service: cli.service,
            source_lang: cli.source_lang,
            lang: cli.lang,
            key: cli.key,
            max_distance: cli.max_distance,
            font_name: cli.font_name,
            font_size: cli.font_size,
            settings_path: cli.read_settings,
            group_only: cli.group_only,
            check: cli.check,
            show_languages: cli.show_languages,
        },
        input,
    )
    .await?;

    println!("{}", output);
    Ok(())
}
