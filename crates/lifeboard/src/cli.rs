//! Clap derive structures for the `lifeboard` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this file must
//! depend on nothing but clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lifeboard -- talk to a Lifeboard backend from the command line
#[derive(Debug, Parser)]
#[command(
    name = "lifeboard",
    version,
    about = "Session-aware command-line client for the Lifeboard API",
    long_about = "Issue authenticated requests against a Lifeboard backend.\n\n\
        Logs in with the active profile's credentials, refreshes the session\n\
        on 401 responses, and prints responses as JSON, YAML, or plain text.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "LIFEBOARD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 'u', env = "LIFEBOARD_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Login email (overrides profile)
    #[arg(long, short = 'e', env = "LIFEBOARD_EMAIL", global = true, hide_env = true)]
    pub email: Option<String>,

    /// Output format [default: from config, else json]
    #[arg(long, short = 'o', env = "LIFEBOARD_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "LIFEBOARD_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LIFEBOARD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// GET a path relative to the base URL
    Get(PathArgs),

    /// DELETE a path relative to the base URL
    #[command(alias = "rm")]
    Delete(PathArgs),

    /// POST a JSON body
    Post(BodyArgs),

    /// PUT a JSON body
    Put(BodyArgs),

    /// PATCH a JSON body
    Patch(BodyArgs),

    /// Log in with the profile's credentials and print the user
    Login,

    /// Print the user the backend sees for this session
    #[command(alias = "me")]
    Whoami,

    /// End the server session
    Logout(LogoutArgs),

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct PathArgs {
    /// Endpoint path, e.g. `habits` or `habits/42`
    pub path: String,

    /// Send without logging in; a 401 is then a plain failure
    #[arg(long)]
    pub public: bool,
}

#[derive(Debug, Args)]
pub struct BodyArgs {
    /// Endpoint path, e.g. `habits` or `habits/42`
    pub path: String,

    /// Inline JSON body
    #[arg(long, short = 'd', conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Read the JSON body from a file (`-` for stdin)
    #[arg(long, short = 'f')]
    pub data_file: Option<PathBuf>,

    /// Send without logging in; a 401 is then a plain failure
    #[arg(long)]
    pub public: bool,
}

#[derive(Debug, Args)]
pub struct LogoutArgs {
    /// Also remove the profile's password from the system keyring
    #[arg(long)]
    pub forget: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Print the effective configuration (secrets masked)
    Show,

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
