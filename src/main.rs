// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use mcat::app_config::{self, Config, TranslationProvider};
use mcat::app_controller::{CommandOutcome, Controller};
use mcat::file_utils::FileManager;
use mcat::job::ScanOutcome;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    Ollama,
    OpenAI,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan an addon and list its translatable files
    Scan {
        /// Addon archive (.mcaddon, .mcpack, .zip)
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },

    /// Translate all selected files and write the translated addon
    Translate {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Translate a single file again, even if it is deselected or completed
    Retry {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Path of the file inside the archive
        #[arg(value_name = "FILE_PATH")]
        path: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write the translated addon from what is translated so far
    Package {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Replace the translation of one file by hand
    Edit {
        /// Path of the file inside the archive
        #[arg(value_name = "FILE_PATH")]
        path: String,

        /// Read the new translation from this file
        #[arg(long, value_name = "FILE", conflicts_with = "text", required_unless_present = "text")]
        from_file: Option<PathBuf>,

        /// New translation given inline
        #[arg(long)]
        text: Option<String>,

        /// Archive to package once every selected file is translated
        #[arg(long, value_name = "ARCHIVE")]
        archive: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Toggle whether files are translated
    Select {
        /// Exact file path, or a filter with --matching
        #[arg(value_name = "PATTERN")]
        pattern: String,

        /// Toggle every file whose path contains PATTERN
        #[arg(long)]
        matching: bool,
    },

    /// Show saved progress
    Status {
        /// List every file with its status
        #[arg(long)]
        files: bool,
    },

    /// Discard all saved progress
    Reset,

    /// Generate shell completions for mcat
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Directory for the translated addon (defaults to the input's directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

/// mcat - Minecraft Bedrock addon translator
///
/// Finds the player-visible text in an addon and translates it with AI
/// providers (Gemini, Ollama, OpenAI, Anthropic, LM Studio).
#[derive(Parser, Debug)]
#[command(name = "mcat")]
#[command(version)]
#[command(about = "AI-powered Minecraft Bedrock addon translator")]
#[command(long_about = "mcat finds the player-visible text in a Minecraft Bedrock addon and translates it using AI providers.

EXAMPLES:
    mcat scan pack.mcaddon                         # List translatable files
    mcat translate pack.mcaddon                    # Translate using default config
    mcat -t ja translate pack.mcaddon              # Translate into Japanese
    mcat -p openai -m gpt-4o translate pack.mcpack # Use specific provider and model
    mcat retry pack.mcaddon RP/texts/en_US.lang    # Translate one file again
    mcat edit RP/readme.txt --from-file fixed.txt  # Replace a translation by hand
    mcat select --matching scripts/                # Toggle every script file
    mcat status --files                            # Show saved progress
    mcat completions bash > mcat.bash              # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. API keys can also come from GEMINI_API_KEY,
    OPENAI_API_KEY and ANTHROPIC_API_KEY.

PROGRESS:
    Progress is saved after every change. Running translate again on an archive
    with the same name resumes where it stopped.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Source language ('auto', 'English', 'en', 'en_US')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language ('Vietnamese', 'vi', 'vi_VN')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything, the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "mcat", &mut std::io::stdout());
        return Ok(());
    }

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let config = load_config(&cli)?;
    if cli.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let needs_provider = matches!(cli.command, Commands::Translate { .. } | Commands::Retry { .. });
    if needs_provider {
        config.validate().context("Configuration validation failed")?;
    }

    let output_dir = match &cli.command {
        Commands::Translate { output, .. }
        | Commands::Retry { output, .. }
        | Commands::Package { output, .. }
        | Commands::Edit { output, .. } => output.output_dir.clone(),
        _ => None,
    };
    let controller = Controller::with_config(config)?
        .with_output_dir(output_dir)
        .with_progress(true);
    if cli.source_language.is_some() || cli.target_language.is_some() {
        controller.apply_config_languages()?;
    }

    run_command(&controller, cli.command).await
}

/// Load or create the configuration and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let (mut config, created) = Config::load_or_create(&cli.config_path)?;
    if created {
        warn!("Config file not found at '{}', created a default config.", cli.config_path);
    }

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &cli.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(source_lang) = &cli.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &cli.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    // Languages are needed by every command
    config.source()?;
    config.target()?;

    Ok(config)
}

async fn run_command(controller: &Controller, command: Commands) -> Result<()> {
    match command {
        Commands::Scan { archive } => {
            if controller.scan(&archive)? != ScanOutcome::NoCandidatesFound {
                print!("{}", controller.status_report(true));
            }
        }
        Commands::Translate { archive, .. } => {
            let outcome = controller.translate(&archive).await?;
            report(&outcome);
        }
        Commands::Retry {
            archive,
            path,
            ..
        } => {
            let outcome = controller.retry(&archive, &path).await?;
            report(&outcome);
        }
        Commands::Package { archive, .. } => {
            let path = controller.package(&archive)?;
            println!("{}", path.display());
        }
        Commands::Edit {
            path,
            from_file,
            text,
            archive,
            ..
        } => {
            let content = match (from_file, text) {
                (Some(file), _) => FileManager::read_to_string(file)?,
                (None, Some(text)) => text,
                (None, None) => anyhow::bail!("Either --from-file or --text is required"),
            };
            let outcome = controller.edit(&path, content, archive.as_deref())?;
            report(&outcome);
        }
        Commands::Select { pattern, matching } => {
            if matching {
                let (selected, count) = controller.toggle_matching(&pattern);
                let state = if selected { "Selected" } else { "Deselected" };
                println!("{} {} files matching '{}'", state, count, pattern);
            } else {
                let selected = controller.toggle(&pattern)?;
                let state = if selected { "Selected" } else { "Deselected" };
                println!("{} {}", state, pattern);
            }
        }
        Commands::Status { files } => {
            if let Some(notice) = controller.restore_notice() {
                warn!("{}", notice);
            }
            print!("{}", controller.status_report(files));
        }
        Commands::Reset => {
            controller.reset()?;
            info!("All saved progress was discarded");
        }
        Commands::Completions { .. } => {}
    }
    Ok(())
}

fn report(outcome: &CommandOutcome) {
    if let Some(summary) = &outcome.summary {
        println!("Translation {}", summary);
    }
    if let Some(path) = &outcome.output {
        println!("{}", path.display());
    }
}
