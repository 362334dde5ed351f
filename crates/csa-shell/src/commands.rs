//! The closed set of shell commands and their dispatch.

use crate::error::ShellError;
use crate::shell::Shell;

/// One shell command. A closed enum rather than an open trait hierarchy
/// (spec.md §9's "Dynamic class hierarchy" redesign note): every variant
/// is known up front, so `Shell::command_table` can build a `Vec` of them
/// per mode with no boxing or registration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Exit,
    Login,
    Move,
    Resign,
    Win,
    History,
    Info,
}

impl ShellCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ShellCommand::Help => "HELP",
            ShellCommand::Exit => "EXIT",
            ShellCommand::Login => "LOGIN",
            ShellCommand::Move => "MOVE",
            ShellCommand::Resign => "RESIGN",
            ShellCommand::Win => "WIN",
            ShellCommand::History => "HISTORY",
            ShellCommand::Info => "INFO",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ShellCommand::Help => &["HELP", "?", "H"],
            ShellCommand::Exit => &["EXIT", "QUIT", "Q"],
            ShellCommand::Login => &["LOGIN"],
            ShellCommand::Move => &["MOVE", "M"],
            ShellCommand::Resign => &["RESIGN"],
            ShellCommand::Win => &["WIN"],
            ShellCommand::History => &["HISTORY"],
            ShellCommand::Info => &["INFO", "I"],
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            ShellCommand::Help => "show this help message",
            ShellCommand::Exit => "exit the shell",
            ShellCommand::Login => "LOGIN [host[:port] [user [password]]] - connect and log in",
            ShellCommand::Move => "MOVE <move> - make a move, e.g. MOVE 7776FU",
            ShellCommand::Resign => "resign the current game",
            ShellCommand::Win => "declare a win by jishogi (nyugyoku)",
            ShellCommand::History => "show the move history",
            ShellCommand::Info => "show the current position",
        }
    }

    pub fn run(&self, shell: &mut Shell, args: &[&str]) -> Result<(), ShellError> {
        match self {
            ShellCommand::Help => run_help(shell, args),
            ShellCommand::Exit => Ok(()),
            ShellCommand::Login => run_login(shell, args),
            ShellCommand::Move => run_move(shell, args),
            ShellCommand::Resign => shell.do_resign(),
            ShellCommand::Win => shell.do_declare_win(),
            ShellCommand::History => run_history(shell),
            ShellCommand::Info => run_info(shell),
        }
    }
}

fn run_help(shell: &mut Shell, args: &[&str]) -> Result<(), ShellError> {
    match args.first() {
        None => {
            println!("{}", shell.help_text());
            Ok(())
        }
        Some(name) => {
            let upper = name.to_uppercase();
            let table = [
                ShellCommand::Help,
                ShellCommand::Exit,
                ShellCommand::Login,
                ShellCommand::Move,
                ShellCommand::Resign,
                ShellCommand::Win,
                ShellCommand::History,
                ShellCommand::Info,
            ];
            match table.iter().find(|c| c.aliases().contains(&upper.as_str())) {
                Some(cmd) => {
                    println!("{}", cmd.help());
                    Ok(())
                }
                None => {
                    println!("unknown command: {name}");
                    Ok(())
                }
            }
        }
    }
}

fn run_login(shell: &mut Shell, args: &[&str]) -> Result<(), ShellError> {
    let host_spec = args.first().copied();
    let user = args.get(1).copied();
    let password = args.get(2).copied();
    shell.do_login(host_spec, user, password)
}

fn run_move(shell: &mut Shell, args: &[&str]) -> Result<(), ShellError> {
    let candidate = args.first().ok_or_else(|| ShellError::Usage("MOVE <move>".to_string()))?;
    shell.do_move(candidate)
}

fn run_history(shell: &mut Shell) -> Result<(), ShellError> {
    match shell.game() {
        None => println!("no game"),
        Some(game) if game.history.is_empty() => println!("no history"),
        Some(game) => println!("{}", game.history_str()),
    }
    Ok(())
}

fn run_info(shell: &mut Shell) -> Result<(), ShellError> {
    match shell.game() {
        None => println!("no game"),
        Some(game) => println!("{}", game.to_display_string()),
    }
    Ok(())
}
