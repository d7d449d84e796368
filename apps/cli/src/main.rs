use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use clipper_core::{
    ApiKey, ClipperConfig, DEFAULT_PROMPT, FormInputs, PairingStrategy, Provider,
};
use console::style;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::SuggestOptions;

mod commands;
mod interactive;
mod progress;

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum CliPairing {
    /// i-th "Start time" with i-th "End time"
    #[default]
    Positional,
    /// One pair per "Clip N" block
    Blocks,
}

impl From<CliPairing> for PairingStrategy {
    fn from(cli: CliPairing) -> Self {
        match cli {
            CliPairing::Positional => PairingStrategy::Positional,
            CliPairing::Blocks => PairingStrategy::ClipBlocks,
        }
    }
}

#[derive(Parser)]
#[command(name = "clipper")]
#[command(about = "Suggest highlight clips from a YouTube transcript with an LLM and cut them")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the transcript, ask for clips, download the video and cut them
    Suggest(SuggestArgs),
    /// Delete every file in the download path
    Reset {
        /// Download path to clear
        #[arg(short, long, env = "CLIPPER_DEST")]
        dest: String,
    },
    /// Fill in the inputs interactively, then suggest or reset
    Interactive(InteractiveArgs),
}

#[derive(Args)]
struct ModelArgs {
    /// AI provider for clip suggestions
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,

    /// Model name (defaults to the provider's model)
    #[arg(short, long)]
    model: Option<String>,

    /// API key (defaults to the provider's environment variable)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// How start and end times in the reply are paired
    #[arg(long, default_value = "positional")]
    pairing: CliPairing,

    /// Cut every parsed range, even inverted ones
    #[arg(long)]
    no_validate: bool,

    /// Open each clip in the default player when done
    #[arg(long)]
    play: bool,
}

#[derive(Args)]
struct SuggestArgs {
    /// Video URL
    url: String,

    /// Directory for the downloaded video and clips (cleared first)
    #[arg(short, long, env = "CLIPPER_DEST")]
    dest: String,

    /// What to look for in the video
    #[arg(short = 'P', long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Print the run outcome as JSON instead of progress
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct InteractiveArgs {
    /// Initial video URL
    url: Option<String>,

    /// Initial download path
    #[arg(short, long, env = "CLIPPER_DEST")]
    dest: Option<String>,

    #[command(flatten)]
    model: ModelArgs,
}

impl ModelArgs {
    fn config(&self) -> ClipperConfig {
        let mut config = ClipperConfig::from_env();
        config.provider = self.provider.into();
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        config.pairing = self.pairing.into();
        config.validate = !self.no_validate;
        config
    }

    /// Explicit key, else the provider's env var.
    fn api_key(&self, provider: &Provider) -> clipper_core::Result<ApiKey> {
        match &self.api_key {
            Some(key) => Ok(ApiKey::new(key.trim())),
            None => provider.api_key_from_env(),
        }
    }
}

fn init_tracing(verbose: u8) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clipper={level},clipper_core={level}")));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Suggest(args) => {
            let config = args.model.config();
            let prompt = match (&args.prompt, &args.prompt_file) {
                (Some(prompt), _) => prompt.clone(),
                (None, Some(path)) => tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading prompt from {}", path.display()))?,
                (None, None) => DEFAULT_PROMPT.to_string(),
            };
            let form = FormInputs {
                url: args.url,
                api_key: args.model.api_key(&config.provider)?,
                destination: args.dest,
                prompt,
            };
            debug!(?form, "suggest");

            if !args.json {
                println!(
                    "\n{}  {}\n",
                    style("clipper").cyan().bold(),
                    style("YouTube Video Clip Suggester").dim()
                );
            }

            let options = SuggestOptions {
                json: args.json,
                play: args.model.play,
            };
            commands::suggest(&form, &config, &options).await?;
        }
        Command::Reset { dest } => commands::reset(&dest).await?,
        Command::Interactive(args) => {
            let config = args.model.config();
            let api_key = args.model.api_key(&config.provider);

            println!(
                "\n{}  {}\n",
                style("clipper").cyan().bold(),
                style("YouTube Video Clip Suggester").dim()
            );
            if let Err(e) = &api_key {
                println!("{} {}", style("!").yellow().bold(), style(e).dim());
            }

            let form = FormInputs {
                url: args.url.unwrap_or_default(),
                api_key: api_key.unwrap_or_default(),
                destination: args.dest.unwrap_or_default(),
                prompt: DEFAULT_PROMPT.to_string(),
            };
            interactive::run(config, form, args.model.play).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn suggest_args_map_onto_config() {
        let cli = Cli::try_parse_from([
            "clipper",
            "suggest",
            "https://youtu.be/EorJ8cEzsZo",
            "--dest",
            "/tmp/clips",
            "--provider",
            "grok",
            "--pairing",
            "blocks",
            "--no-validate",
            "-k",
            "xai-key",
        ])
        .unwrap();

        let Command::Suggest(args) = cli.command else {
            panic!("expected suggest");
        };
        let config = args.model.config();
        assert_eq!(config.provider, Provider::Grok);
        assert_eq!(config.pairing, PairingStrategy::ClipBlocks);
        assert!(!config.validate);
        assert_eq!(
            args.model.api_key(&config.provider).unwrap(),
            ApiKey::new("xai-key")
        );
        assert_eq!(args.dest, "/tmp/clips");
    }

    #[test]
    fn suggest_requires_a_destination() {
        if std::env::var_os("CLIPPER_DEST").is_some() {
            return;
        }
        let result = Cli::try_parse_from(["clipper", "suggest", "https://youtu.be/EorJ8cEzsZo"]);
        assert!(result.is_err());
    }

    #[test]
    fn interactive_starts_without_a_destination() {
        if std::env::var_os("CLIPPER_DEST").is_some() {
            return;
        }
        let cli = Cli::try_parse_from(["clipper", "interactive"]).unwrap();
        let Command::Interactive(args) = cli.command else {
            panic!("expected interactive");
        };
        assert!(args.dest.is_none());
    }

    #[test]
    fn prompt_and_prompt_file_conflict() {
        let result = Cli::try_parse_from([
            "clipper",
            "suggest",
            "https://youtu.be/EorJ8cEzsZo",
            "--prompt",
            "x",
            "--prompt-file",
            "p.txt",
        ]);
        assert!(result.is_err());
    }
}
