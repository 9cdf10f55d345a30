/*!
 * The seam between the job runner and whatever produces translations.
 */

use async_trait::async_trait;

use crate::errors::TranslationError;
use crate::language_utils::SupportLanguage;

use super::prompts::KindInstructions;

/// Translates the full content of one file
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `content` following the file type's instructions.
    ///
    /// An empty answer is an error, never a successful empty translation.
    async fn translate(
        &self,
        content: &str,
        instructions: &KindInstructions,
        source: SupportLanguage,
        target: SupportLanguage,
    ) -> Result<String, TranslationError>;
}
