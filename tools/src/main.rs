use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bitser_tools::{decode_with_plan, format_bits, format_decode_pretty, ReadPlan};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use codec::SessionConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "bitser-tools",
    version,
    about = "bitser inspection and decoding tools"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the bits of a file.
    Bits {
        /// Path to the stream bytes.
        file: PathBuf,
        /// Bytes per output line.
        #[arg(long, default_value_t = 8)]
        width: usize,
    },
    /// Replay a read plan against a stream and print the decoded values.
    Decode {
        /// Path to the stream bytes.
        file: PathBuf,
        /// Read plan JSON.
        #[arg(long)]
        plan: PathBuf,
        /// Session config JSON; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = DecodeFormat::Json)]
        format: DecodeFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecodeFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Bits { file, width } => {
            let bytes = read_stream(&file)?;
            print!("{}", format_bits(&bytes, width));
        }
        Command::Decode {
            file,
            plan,
            config,
            format,
        } => {
            let bytes = read_stream(&file)?;
            let plan: ReadPlan = load_json(&plan).context("load plan")?;
            let config: SessionConfig = config
                .as_deref()
                .map(load_json)
                .transpose()
                .context("load config")?
                .unwrap_or_default();
            let report = decode_with_plan(&bytes, &plan, &config)
                .with_context(|| format!("decode {}", file.display()))?;
            match format {
                DecodeFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                DecodeFormat::Pretty => print!("{}", format_decode_pretty(&report)),
            }
        }
    }

    Ok(())
}

fn read_stream(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read stream {}", path.display()))
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}
