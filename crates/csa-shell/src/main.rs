//! Entry point for the interactive CSA shogi client shell.

mod cli;
mod commands;
mod error;
mod shell;

use clap::Parser;

use cli::CliArgs;
use shell::Shell;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let level = if args.debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).init();

    let mut shell = Shell::new(args.host, args.port, args.user, args.password);
    shell.run()?;
    Ok(())
}
