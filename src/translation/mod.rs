/*!
 * Translation of addon files using AI providers.
 *
 * - `backend`: The trait the job runner talks to
 * - `core`: Provider-backed service with retries and answer clean-up
 * - `prompts`: Per file type instructions
 * - `runner`: Sequential runs over a shared job
 */

// Re-export main types for easier usage
pub use self::backend::TranslationBackend;
pub use self::core::{strip_code_fences, TranslationService};
pub use self::prompts::{KindInstructions, PromptTemplate, ResponseFormat};
pub use self::runner::{RunSummary, TranslationRunner};

// Submodules
pub mod backend;
pub mod core;
pub mod prompts;
pub mod runner;
