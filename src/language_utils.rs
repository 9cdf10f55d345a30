use anyhow::{Result, anyhow};
use isolang::Language;
use serde::{Deserialize, Serialize};

/// Language utilities for the languages the translator supports
///
/// Bedrock loads localization files named by locale code (`vi_VN.lang`), so
/// every target language maps to exactly one code from a fixed table.
/// Parsing accepts display names, locale codes and ISO 639-1 / 639-2 codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SupportLanguage {
    #[serde(rename = "Auto Detect")]
    #[default]
    Auto,
    Vietnamese,
    English,
    Spanish,
    French,
    German,
    Chinese,
    Japanese,
    Korean,
    Russian,
    Portuguese,
}

impl SupportLanguage {
    /// Every supported language, in menu order
    pub const ALL: [SupportLanguage; 11] = [
        Self::Auto,
        Self::Vietnamese,
        Self::English,
        Self::Spanish,
        Self::French,
        Self::German,
        Self::Chinese,
        Self::Japanese,
        Self::Korean,
        Self::Russian,
        Self::Portuguese,
    ];

    /// Human readable name, also used in output archive names
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Auto => "Auto Detect",
            Self::Vietnamese => "Vietnamese",
            Self::English => "English",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::German => "German",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Russian => "Russian",
            Self::Portuguese => "Portuguese",
        }
    }

    /// Locale code used for `.lang` file names, `None` for auto detection
    pub fn locale_code(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Vietnamese => Some("vi_VN"),
            Self::English => Some("en_US"),
            Self::Spanish => Some("es_ES"),
            Self::French => Some("fr_FR"),
            Self::German => Some("de_DE"),
            Self::Chinese => Some("zh_CN"),
            Self::Japanese => Some("ja_JP"),
            Self::Korean => Some("ko_KR"),
            Self::Russian => Some("ru_RU"),
            Self::Portuguese => Some("pt_BR"),
        }
    }

    /// Name to use inside prompts
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Self::Auto => "the detected source language",
            other => other.display_name(),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    /// ISO 639-3 code of the language, used to resolve ISO input
    fn iso_639_3(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            Self::Vietnamese => Some("vie"),
            Self::English => Some("eng"),
            Self::Spanish => Some("spa"),
            Self::French => Some("fra"),
            Self::German => Some("deu"),
            Self::Chinese => Some("zho"),
            Self::Japanese => Some("jpn"),
            Self::Korean => Some("kor"),
            Self::Russian => Some("rus"),
            Self::Portuguese => Some("por"),
        }
    }
}

impl std::fmt::Display for SupportLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for SupportLanguage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_language(s)
    }
}

/// Parse a language from a display name, locale code or ISO code
pub fn parse_language(input: &str) -> Result<SupportLanguage> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Language cannot be empty"));
    }

    let lowered = trimmed.to_lowercase();
    if lowered == "auto" || lowered == "auto detect" {
        return Ok(SupportLanguage::Auto);
    }

    for lang in SupportLanguage::ALL {
        if lang.display_name().eq_ignore_ascii_case(trimmed) {
            return Ok(lang);
        }
        if let Some(code) = lang.locale_code() {
            if code.eq_ignore_ascii_case(&trimmed.replace('-', "_")) {
                return Ok(lang);
            }
        }
    }

    let iso = resolve_iso_code(&lowered)
        .ok_or_else(|| anyhow!("Unsupported language: {}", input))?;

    SupportLanguage::ALL
        .into_iter()
        .find(|lang| lang.iso_639_3() == Some(iso.to_639_3()))
        .ok_or_else(|| anyhow!("Unsupported language: {} ({})", input, iso.to_name()))
}

/// Resolve an ISO 639-1 or 639-2 (T or B) code
fn resolve_iso_code(code: &str) -> Option<Language> {
    match code.len() {
        2 => Language::from_639_1(code),
        3 => Language::from_639_3(code).or_else(|| {
            // Bibliographic variants that differ from the terminology code
            let part2t = match code {
                "fre" => "fra",
                "ger" => "deu",
                "chi" => "zho",
                _ => return None,
            };
            Language::from_639_3(part2t)
        }),
        _ => None,
    }
}

/// Resolve a target language, rejecting auto detection
pub fn parse_target_language(input: &str) -> Result<SupportLanguage> {
    let lang = parse_language(input)?;
    if lang.is_auto() {
        return Err(anyhow!("Auto Detect can only be used as the source language"));
    }
    Ok(lang)
}
