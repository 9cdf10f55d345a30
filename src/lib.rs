/*!
 * # mcat - Minecraft Bedrock Addon Translator
 *
 * A Rust library for translating the player-visible text of Minecraft
 * Bedrock addons (`.mcaddon`, `.mcpack`, `.zip`) with AI.
 *
 * ## Features
 *
 * - Read addon archives and find the files that hold player-visible text
 * - Translate them one at a time using various AI providers:
 *   - Google Gemini
 *   - Ollama (local LLM)
 *   - OpenAI API and LM Studio
 *   - Anthropic API
 * - Resume interrupted work from saved progress
 * - Write a new archive with the translations overlaid on the original
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `archive`: Zip container reading, writing and translation overlay
 * - `classifier`: Translatable file detection
 * - `job`: Translation job state and its persistence hook
 * - `database`: SQLite storage for saved progress
 * - `translation`: AI-powered translation services:
 *   - `translation::core`: Provider-backed translation service
 *   - `translation::prompts`: Per file type instructions
 *   - `translation::runner`: Sequential runs over a job
 * - `providers`: Client implementations for various LLM providers
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `language_utils`: Supported languages and locale codes
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod archive;
pub mod classifier;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod job;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use archive::{ArchiveHandle, ArchiveWriter, build_output_archive};
pub use errors::{ArchiveError, JobError, ProviderError, TranslationError};
pub use job::{ContentKind, EntryStatus, JobManager, ScanOutcome, SharedJob, TranslatableEntry, TranslationJob};
pub use language_utils::SupportLanguage;
pub use translation::{RunSummary, TranslationBackend, TranslationRunner, TranslationService};
