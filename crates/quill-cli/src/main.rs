use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use quill_common::telemetry::{self, TelemetryConfig};
use quill_common::{CheckClient, ConfigFile, QuillConfig};
use quill_editor_core::{
    CheckMode, CheckRequest, EditorController, EditorStats, LanguageBadge, render,
};

mod display;
mod live;

use display::{Style, highlight, span_list, status_line, suggestion_map};

#[derive(Parser)]
#[command(version, about = "quill - live spell checking against a checking service", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file (.toml or .json)
    #[arg(long, global = true, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,

    /// Checking service endpoint
    #[arg(long, global = true, env = "QUILL_ENDPOINT")]
    endpoint: Option<String>,

    /// Check mode: fast, balanced or accurate
    #[arg(long, global = true, env = "QUILL_MODE")]
    mode: Option<CheckMode>,

    /// Language hint; `und` lets the service detect it
    #[arg(long, global = true, env = "QUILL_LANG")]
    lang: Option<String>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check text once and print the result
    Check {
        /// Text to check; read from stdin when omitted
        text: Option<String>,

        /// Read the text from a file
        #[arg(long, short, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Edit interactively, checking as you type
    Live,
    /// Print the effective configuration
    Config {
        /// Write it to the config file, creating the file if needed
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    telemetry::init(TelemetryConfig::from_env("quill-cli").with_level(level));

    let config_file = ConfigFile::new(match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    });
    let config = effective_config(&cli, config_file.load_or_default()?);

    match cli.command {
        Commands::Check { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(&file).into_diagnostic()?,
                (None, None) => {
                    let mut text = String::new();
                    std::io::stdin().read_to_string(&mut text).into_diagnostic()?;
                    text
                }
            };
            check_once(&config, text).await?;
        }
        Commands::Live => {
            let client = CheckClient::from_config(&config)?;
            live::run(EditorController::new(config.editor_config()), client).await?;
        }
        Commands::Config { init } => {
            if init {
                config_file.save(&config)?;
                println!("✓ Wrote {}", config_file.path().display());
            }
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Config file values with flags and environment layered on top.
fn effective_config(cli: &Cli, mut config: QuillConfig) -> QuillConfig {
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(lang) = &cli.lang {
        config.lang = lang.as_str().into();
    }
    config
}

/// The deliberate one-shot check: unlike the live session, failures here
/// are reported to the user.
async fn check_once(config: &QuillConfig, text: String) -> Result<()> {
    let Some(request) = CheckRequest::new(text, config.mode, &config.lang) else {
        return Err(miette::miette!(
            help = "pass the text as an argument, with --file, or on stdin",
            "nothing to check: the text is blank"
        ));
    };
    let client = CheckClient::from_config(config)?;
    let result = client.check(&request).await?;

    let doc = render(&result.tokens);
    let stats = EditorStats::measure(&request.text, doc.misspelled_count());
    let badge = LanguageBadge::from_result(&result);

    println!("{}", highlight(&doc, Style::for_stdout(false)));
    println!();
    println!("{}", status_line(stats, &badge));
    let spans = span_list(&doc);
    if !spans.is_empty() {
        println!("misspelled:");
        for line in spans {
            println!("  {}", line);
        }
    }
    if !result.suggestions.is_empty() {
        println!("suggestions:");
        for line in suggestion_map(&result.suggestions) {
            println!("  {}", line);
        }
    }
    if let Some(corrected) = &result.corrected_text {
        println!("corrected: {}", corrected);
    }
    Ok(())
}

fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| miette::miette!("could not determine config directory; pass --config"))?;
    Ok(dir.join("quill").join("config.toml"))
}

fn init_miette() {
    let hook = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    if hook.is_ok() {
        miette::set_panic_hook();
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "quill",
            "--endpoint",
            "http://checker.local/check",
            "--mode",
            "fast",
            "--lang",
            "de",
            "check",
            "Hallo",
        ]);
        let config = effective_config(&cli, QuillConfig::default());
        assert_eq!(config.endpoint, "http://checker.local/check");
        assert_eq!(config.mode, CheckMode::Fast);
        assert_eq!(config.lang, "de");
        assert_eq!(config.typing_quiet_ms, 50);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["quill", "--mode", "thorough", "live"]).is_err());
    }
}
