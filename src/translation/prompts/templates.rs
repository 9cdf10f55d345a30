/*!
 * Prompt templates for addon file translation.
 *
 * Each file type gets its own system instruction. The file content itself is
 * sent as the user message, unchanged.
 */

use crate::job::models::ContentKind;
use crate::language_utils::SupportLanguage;

/// Output shape requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free text, returned as-is
    Text,
    /// A JSON document
    Json,
}

/// System prompt template for one file type.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: &'static str,
}

impl PromptTemplate {
    pub const LOCALIZATION: &'static str = r#"You are an expert Minecraft Bedrock Edition translator.
Translate the following .lang file content from {source_language} into {target_language}.
RULES:
1. Keep the format "key=value".
2. ONLY translate the "value" part.
3. Maintain all special symbols like "%%", "§", and technical placeholders like "%s", "%1", etc.
4. If the value looks like a technical ID, do not translate it.
5. Make the translation sound natural for a Minecraft player.
6. Return ONLY the translated content in the same .lang format."#;

    pub const STRUCTURED_DATA: &'static str = r#"You are an expert Minecraft Bedrock Edition translator.
Translate the user-facing strings inside this JSON from {source_language} into {target_language}.
RULES:
1. ONLY translate values for keys like "name", "description", "display_name", "text", "label", "title", "subtitle", "value".
2. DO NOT translate keys, identifiers, paths, or technical values like "minecraft:player".
3. Maintain the exact JSON structure and types (booleans, numbers, arrays).
4. Return ONLY the valid JSON string."#;

    pub const SCRIPT: &'static str = r#"You are an expert Minecraft Script API translator.
Your task is to translate user-facing strings (messages, titles, lore) inside a JavaScript/TypeScript code block from {source_language} into {target_language}.
RULES:
1. ONLY translate string literals (text inside "", '', or ``) that are meant to be seen by players.
2. DO NOT translate code keywords, variable names, function names, properties, or event names.
3. Example: player.sendMessage("Hello world") keeps its call and only the message text changes.
4. DO NOT translate technical identifiers like "minecraft:zombie".
5. DO NOT break the code syntax. If you are unsure if a string is technical or player-facing, do not translate it.
6. Return ONLY the updated code block. No explanation."#;

    pub const COMMAND_SCRIPT: &'static str = r#"You are an expert Minecraft Bedrock command translator.
Translate player-facing text inside this .mcfunction file from {source_language} into {target_language}.
RULES:
1. Translate text in /say, /tell, /msg, /w.
2. Translate the "text" values inside /tellraw or /titleraw JSON structures.
3. DO NOT translate command names, selectors (@a, @s), coordinates, or item/entity identifiers.
4. Maintain the structure: one command per line.
5. Return ONLY the updated commands."#;

    pub const PLAIN_TEXT: &'static str = r#"Translate this plain text file from {source_language} into {target_language}.
Keep all formatting and technical terms intact."#;

    /// Template for a file type.
    pub fn for_kind(kind: ContentKind) -> Self {
        let template = match kind {
            ContentKind::Localization => Self::LOCALIZATION,
            ContentKind::StructuredData => Self::STRUCTURED_DATA,
            ContentKind::Script => Self::SCRIPT,
            ContentKind::CommandScript => Self::COMMAND_SCRIPT,
            ContentKind::PlainText => Self::PLAIN_TEXT,
        };
        Self { template }
    }

    /// Render the template with the given languages.
    pub fn render(&self, source_language: SupportLanguage, target_language: SupportLanguage) -> String {
        self.template
            .replace("{source_language}", source_language.prompt_name())
            .replace("{target_language}", target_language.prompt_name())
    }
}

/// Everything a backend needs to know about how to translate one file type
#[derive(Debug, Clone, PartialEq)]
pub struct KindInstructions {
    pub kind: ContentKind,
    pub system_prompt: String,
    pub temperature: f32,
    pub response_format: ResponseFormat,
    /// Remove a markdown fence wrapped around the whole answer
    pub strip_code_fences: bool,
}

impl KindInstructions {
    pub fn for_kind(kind: ContentKind, source: SupportLanguage, target: SupportLanguage) -> Self {
        let temperature = match kind {
            ContentKind::PlainText => 0.2,
            _ => 0.1,
        };
        let response_format = match kind {
            ContentKind::StructuredData => ResponseFormat::Json,
            _ => ResponseFormat::Text,
        };

        Self {
            kind,
            system_prompt: PromptTemplate::for_kind(kind).render(source, target),
            temperature,
            response_format,
            strip_code_fences: matches!(kind, ContentKind::Script | ContentKind::StructuredData),
        }
    }

    /// Replace the per-type temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn wants_json(&self) -> bool {
        self.response_format == ResponseFormat::Json
    }
}
