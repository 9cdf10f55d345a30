/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use mcat::app_config::{Config, TranslationProvider};
use mcat::language_utils::SupportLanguage;

use crate::common;

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let (config, created) = Config::load_or_create(&path)?;
    assert!(created);
    assert!(path.exists());
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);

    let (reloaded, created_again) = Config::load_or_create(&path)?;
    assert!(!created_again);
    assert_eq!(reloaded.target_language, config.target_language);
    Ok(())
}

#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{ "target_language": "ja", "translation": { "provider": "ollama" } }"#,
    )?;

    let (config, created) = Config::load_or_create(&path)?;
    assert!(!created);
    assert_eq!(config.target()?, SupportLanguage::Japanese);
    assert_eq!(config.source()?, SupportLanguage::Auto);
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.get_model(), "llama3.1");
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_loadOrCreate_withBrokenJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");
    std::fs::write(&path, "{ nope")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_validate_withAutoTarget_shouldFail() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.target_language = "auto".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withKeyInConfig_shouldPass() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_requestSpacing_shouldHonourRateLimit() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.common.rate_limit_delay_ms = 100;
    config.translation.active_provider_config_mut().rate_limit = Some(30);
    assert_eq!(config.translation.request_spacing_ms(), 2000);
}
