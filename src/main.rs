//! epgview - Summarize XML program guides

use std::fs::File;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use epgview::Summary;

/// Default input limit, matching a 32 MiB multipart upload buffer.
const DEFAULT_MAX_BYTES: u64 = 32 << 20;

#[derive(Parser)]
#[command(name = "epgview")]
#[command(version, about = "Summarize XML television program guides", long_about = None)]
#[command(after_help = "EXAMPLES:
    epgview guide.xml           Print a summary of the guide
    epgview --json guide.xml    Print the decoded guide as JSON
    cat guide.xml | epgview -   Read the guide from stdin")]
struct Cli {
    /// Guide document, or `-` for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Print the decoded guide as JSON
    #[arg(long)]
    json: bool,

    /// Reject input larger than this many bytes
    #[arg(long, value_name = "N", env = "EPGVIEW_MAX_BYTES", default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: u64,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let default = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let (name, data) = if cli.input == "-" {
        ("stdin", read_limited(io::stdin().lock(), cli.max_bytes)?)
    } else {
        let file = File::open(&cli.input).with_context(|| format!("opening {}", cli.input))?;
        (cli.input.as_str(), read_limited(file, cli.max_bytes)?)
    };
    info!(name, size = data.len(), "read guide document");

    let guide = match epgview::decode(data.as_slice()) {
        Ok(guide) => guide,
        Err(e) => {
            error!(error = ?e, name, "decoding guide");
            return Err(anyhow::Error::new(e).context("could not parse upload"));
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&guide).context("serializing guide")?;
        println!("{json}");
    } else {
        print!("{}", Summary::new(name, data.len() as u64, &guide));
    }

    Ok(())
}

/// Read all of `input`, failing once more than `max` bytes arrive.
fn read_limited(input: impl Read, max: u64) -> anyhow::Result<Vec<u8>> {
    let mut data = Vec::new();
    input
        .take(max.saturating_add(1))
        .read_to_end(&mut data)
        .context("reading input")?;

    if data.len() as u64 > max {
        bail!("input exceeds the {max} byte limit");
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_limited_accepts_exact_size() {
        let data = read_limited(&b"<tv/>"[..], 5).unwrap();
        assert_eq!(data, b"<tv/>");
    }

    #[test]
    fn test_read_limited_rejects_oversized_input() {
        let err = read_limited(&b"<tv></tv>"[..], 5).unwrap_err();
        assert!(err.to_string().contains("5 byte limit"), "{err}");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["epgview", "--json", "--max-bytes", "10", "-vv", "g.xml"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.max_bytes, 10);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.input, "g.xml");
    }
}
