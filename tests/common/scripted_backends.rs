/*!
 * Scripted translation backends for testing
 *
 * These implement `TranslationBackend` directly so runs can be driven without
 * any provider or network access.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;

use mcat::errors::{ProviderError, TranslationError};
use mcat::language_utils::SupportLanguage;
use mcat::translation::{KindInstructions, TranslationBackend};

/// Prefixes the target language, fails for content containing a marker
#[derive(Default)]
pub struct ScriptedBackend {
    fail_markers: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail every request whose content contains `marker`
    pub fn fail_on(&self, marker: &str) {
        self.fail_markers.lock().insert(marker.to_string());
    }

    pub fn clear_failures(&self) {
        self.fail_markers.lock().clear();
    }

    /// Contents received so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    async fn translate(
        &self,
        content: &str,
        _instructions: &KindInstructions,
        _source: SupportLanguage,
        target: SupportLanguage,
    ) -> Result<String, TranslationError> {
        self.calls.lock().push(content.to_string());
        let fails = self
            .fail_markers
            .lock()
            .iter()
            .any(|marker| content.contains(marker.as_str()));
        if fails {
            return Err(TranslationError::Provider(ProviderError::ApiError {
                status_code: 400,
                message: "scripted failure".to_string(),
            }));
        }
        Ok(format!("[{}] {}", target.display_name(), content))
    }
}

/// Suspends every request until the test releases it
#[derive(Default)]
pub struct GatedBackend {
    /// Signalled when a request reaches the backend
    pub started: Notify,
    /// Lets one suspended request finish
    pub release: Notify,
}

impl GatedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl TranslationBackend for GatedBackend {
    async fn translate(
        &self,
        content: &str,
        _instructions: &KindInstructions,
        _source: SupportLanguage,
        _target: SupportLanguage,
    ) -> Result<String, TranslationError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(content.to_uppercase())
    }
}
