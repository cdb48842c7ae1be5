use crate::providers::ProviderKind;

pub const AUTO: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Source,
    Target,
}

const GOOGLE_LANGS: &[(&str, &str)] = &[
    ("Arabic", "ar"),
    ("Bulgarian", "bg"),
    ("Chinese (Simplified)", "zh-cn"),
    ("Chinese (Traditional)", "zh-tw"),
    ("Czech", "cs"),
    ("Danish", "da"),
    ("Dutch", "nl"),
    ("English", "en"),
    ("Estonian", "et"),
    ("Finnish", "fi"),
    ("French", "fr"),
    ("German", "de"),
    ("Greek", "el"),
    ("Hebrew", "iw"),
    ("Hindi", "hi"),
    ("Hungarian", "hu"),
    ("Indonesian", "id"),
    ("Italian", "it"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Latvian", "lv"),
    ("Lithuanian", "lt"),
    ("Norwegian", "no"),
    ("Polish", "pl"),
    ("Portuguese", "pt"),
    ("Romanian", "ro"),
    ("Russian", "ru"),
    ("Slovak", "sk"),
    ("Slovenian", "sl"),
    ("Spanish", "es"),
    ("Swedish", "sv"),
    ("Thai", "th"),
    ("Turkish", "tr"),
    ("Ukrainian", "uk"),
    ("Vietnamese", "vi"),
];

const DEEPL_SOURCE_LANGS: &[(&str, &str)] = &[
    ("Arabic", "AR"),
    ("Bulgarian", "BG"),
    ("Czech", "CS"),
    ("Danish", "DA"),
    ("German", "DE"),
    ("Greek", "EL"),
    ("English", "EN"),
    ("Spanish", "ES"),
    ("Estonian", "ET"),
    ("Finnish", "FI"),
    ("French", "FR"),
    ("Hebrew", "HE"),
    ("Hungarian", "HU"),
    ("Indonesian", "ID"),
    ("Italian", "IT"),
    ("Japanese", "JA"),
    ("Korean", "KO"),
    ("Lithuanian", "LT"),
    ("Latvian", "LV"),
    ("Norwegian (Bokmål)", "NB"),
    ("Dutch", "NL"),
    ("Polish", "PL"),
    ("Portuguese", "PT"),
    ("Romanian", "RO"),
    ("Russian", "RU"),
    ("Slovak", "SK"),
    ("Slovenian", "SL"),
    ("Swedish", "SV"),
    ("Thai", "TH"),
    ("Turkish", "TR"),
    ("Ukrainian", "UK"),
    ("Vietnamese", "VI"),
    ("Chinese", "ZH"),
];

const DEEPL_TARGET_LANGS: &[(&str, &str)] = &[
    ("Arabic", "AR"),
    ("Bulgarian", "BG"),
    ("Czech", "CS"),
    ("Danish", "DA"),
    ("German", "DE"),
    ("Greek", "EL"),
    ("English (British)", "EN-GB"),
    ("English (American)", "EN-US"),
    ("Spanish", "ES"),
    ("Spanish (Latin American)", "ES-419"),
    ("Estonian", "ET"),
    ("Finnish", "FI"),
    ("French", "FR"),
    ("Hebrew", "HE"),
    ("Hungarian", "HU"),
    ("Indonesian", "ID"),
    ("Italian", "IT"),
    ("Japanese", "JA"),
    ("Korean", "KO"),
    ("Lithuanian", "LT"),
    ("Latvian", "LV"),
    ("Norwegian (Bokmål)", "NB"),
    ("Dutch", "NL"),
    ("Polish", "PL"),
    ("Portuguese (Brazilian)", "PT-BR"),
    ("Portuguese (European)", "PT-PT"),
    ("Romanian", "RO"),
    ("Russian", "RU"),
    ("Slovak", "SK"),
    ("Slovenian", "SL"),
    ("Swedish", "SV"),
    ("Thai", "TH"),
    ("Turkish", "TR"),
    ("Ukrainian", "UK"),
    ("Vietnamese", "VI"),
    ("Chinese (Simplified)", "ZH-HANS"),
    ("Chinese (Traditional)", "ZH-HANT"),
];

/// Name/code pairs a provider accepts. Source tables do not list `auto`,
/// which every provider accepts as a source.
pub fn table(kind: ProviderKind, direction: Direction) -> &'static [(&'static str, &'static str)] {
    match (kind, direction) {
        (ProviderKind::Google, _) => GOOGLE_LANGS,
        (ProviderKind::DeepL, Direction::Source) => DEEPL_SOURCE_LANGS,
        (ProviderKind::DeepL, Direction::Target) => DEEPL_TARGET_LANGS,
    }
}

pub fn is_valid_code(kind: ProviderKind, direction: Direction, code: &str) -> bool {
    let code = code.trim();
    if direction == Direction::Source && code.eq_ignore_ascii_case(AUTO) {
        return true;
    }
    language_name(kind, direction, code).is_some()
}

pub fn language_name(kind: ProviderKind, direction: Direction, code: &str) -> Option<&'static str> {
    let code = code.trim();
    table(kind, direction)
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(code))
        .map(|(name, _)| *name)
}

/// DeepL leaves the source unset for auto-detection.
pub fn deepl_source_lang(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() || code.eq_ignore_ascii_case(AUTO) {
        None
    } else {
        Some(code.to_uppercase())
    }
}

pub fn deepl_target_lang(code: &str) -> String {
    code.trim().to_uppercase()
}

/// English in each provider's vocabulary, used by the service check.
pub fn english_target(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Google => "en",
        ProviderKind::DeepL => "EN-US",
    }
}

pub fn format_table(kind: ProviderKind) -> String {
    let mut lines = vec![format!("{} source languages:", kind.display_name())];
    lines.push(format!("  {:<8} Auto-detect", AUTO));
    for (name, code) in table(kind, Direction::Source) {
        lines.push(format!("  {:<8} {}", code, name));
    }
    lines.push(format!("{} target languages:", kind.display_name()));
    for (name, code) in table(kind, Direction::Target) {
        lines.push(format!("  {:<8} {}", code, name));
    }
    lines.join("\n")
}
