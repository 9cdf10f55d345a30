/*!
 * Prompt engineering for addon translation.
 *
 * One system instruction per file type, plus the request settings that go
 * with it (temperature, output format, post-processing).
 */

pub mod templates;

pub use templates::{KindInstructions, PromptTemplate, ResponseFormat};
