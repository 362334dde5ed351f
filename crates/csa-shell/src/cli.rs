//! Command-line arguments for the interactive shell.

use clap::Parser;

/// An interactive CSA shogi client shell.
#[derive(Parser, Debug)]
#[command(name = "mog-cli", about = "Interactive CSA shogi server client")]
pub struct CliArgs {
    /// Default host to connect to when LOGIN omits one.
    #[arg(short = 'H', long, default_value = "localhost")]
    pub host: String,
    /// Default port to connect to when LOGIN omits one.
    #[arg(short = 'P', long, default_value_t = 4081)]
    pub port: u16,
    /// Default username when LOGIN omits one.
    #[arg(short = 'u', long)]
    pub user: Option<String>,
    /// Default password when LOGIN omits one.
    #[arg(short = 'p', long)]
    pub password: Option<String>,
    /// Raise log verbosity to debug, logging every line sent/received.
    #[arg(long)]
    pub debug: bool,
}
