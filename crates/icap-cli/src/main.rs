/// ICAP command-line tool. Inspect, validate, build and adapt captured
/// ICAP/1.0 messages without opening a socket.
///
/// # Command overview
///
/// ```text
/// icap <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print the start line, headers and section table of a message
///   validate   Check a captured message for structural correctness
///   encode     Build a message from a JSON manifest
///   adapt      Run a captured request through the adaptation engine
///   options    Print the OPTIONS response for a configuration
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log engine events to stderr (repeat for more detail)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                      |
/// |------|----------------------------------------------|
/// | 0    | Success                                      |
/// | 1    | Error (I/O failure, malformed message, etc.) |
///
/// Responses are written to stdout as raw bytes; diagnostics and logs go
/// to stderr so stdout can be piped into another tool.
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod cmd_adapt;
mod cmd_encode;
mod cmd_inspect;
mod cmd_options;
mod cmd_validate;
mod config_file;

// ── CLI root ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "icap", version, about = "ICAP/1.0 adaptation toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine events to stderr. `-v` for debug, `-vv` for trace.
    /// `RUST_LOG` takes precedence when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print the start line, headers and section table of a captured message.
    Inspect(InspectArgs),
    /// Check a captured message for structural correctness.
    Validate(ValidateArgs),
    /// Build an ICAP message from a JSON manifest.
    Encode(EncodeArgs),
    /// Run a captured request through the adaptation engine.
    Adapt(AdaptArgs),
    /// Print the OPTIONS response the engine would send.
    Options(OptionsArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `icap inspect`.
///
/// ```text
/// ┌─────────────┬──────────────────────────────────────────────────────┐
/// │ Flag        │ Effect                                               │
/// ├─────────────┼──────────────────────────────────────────────────────┤
/// │ --show-body │ Include first 80 chars of each section (UTF-8 lossy) │
/// │ --show-hex  │ Include 16-byte-per-line hex dump of each section    │
/// └─────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Captured request or response.
    pub file: PathBuf,

    /// Show section content (first 80 characters, UTF-8 lossy).
    #[arg(long)]
    pub show_body: bool,

    /// Show a hex dump of each section's decoded payload.
    #[arg(long)]
    pub show_hex: bool,
}

/// Arguments for `icap validate`.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Captured request or response.
    pub file: PathBuf,
}

/// Arguments for `icap encode`.
///
/// The manifest describes one message; see `cmd_encode` for its format.
#[derive(clap::Args)]
pub struct EncodeArgs {
    /// JSON manifest describing the message.
    pub input: PathBuf,

    /// Where to write the encoded message.
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Arguments for `icap adapt`.
///
/// ```text
/// ┌────────────────────┬───────────────────────────────────────────────┐
/// │ Flag               │ Effect                                        │
/// ├────────────────────┼───────────────────────────────────────────────┤
/// │ (none)             │ preview(file): honours a Preview header       │
/// │ --continuation F   │ resume(file, F): F is the post-100 remainder  │
/// │ --config C         │ JSON configuration file                       │
/// │ --adapter K        │ decline | echo | preview-echo                 │
/// │ -o / --output      │ write the response to a file, not stdout      │
/// └────────────────────┴───────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct AdaptArgs {
    /// Captured REQMOD, RESPMOD or OPTIONS request.
    pub file: PathBuf,

    /// Chunked remainder sent by the client after `100 Continue`.
    #[arg(long)]
    pub continuation: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Adapter implementation, overriding the configuration file.
    #[arg(long)]
    pub adapter: Option<String>,

    /// Write the response here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `icap options`.
#[derive(clap::Args)]
pub struct OptionsArgs {
    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Adapter implementation, overriding the configuration file.
    #[arg(long)]
    pub adapter: Option<String>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Encode(args) => cmd_encode::run(&args),
        Commands::Adapt(args) => cmd_adapt::run(&args),
        Commands::Options(args) => cmd_options::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            EnvFilter::builder()
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .init();
}
