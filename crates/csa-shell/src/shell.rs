//! The interactive REPL: modes, prompts, and the command dispatch loop.

use std::io::{self, BufRead, Write};

use csa_core::{ClientState, Game, GameSummary, Move, MoveOutcome, ProtocolClient, ProtocolClientError, TcpTransport};

use crate::commands::ShellCommand;
use crate::error::{is_disconnect, ShellError};

/// Which command table and prompt the shell currently uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    Init,
    Network,
    /// Reserved for reviewing a locally loaded record without a network
    /// connection; left unimplemented, same as the shell this one is
    /// modeled after.
    #[allow(dead_code)]
    Standalone,
}

pub struct Shell {
    mode: ShellMode,
    client: Option<ProtocolClient<TcpTransport>>,
    game: Option<Game>,
    default_host: String,
    default_port: u16,
    default_user: Option<String>,
    default_password: Option<String>,
    conn_host: Option<String>,
    conn_port: Option<u16>,
}

impl Shell {
    pub fn new(default_host: String, default_port: u16, default_user: Option<String>, default_password: Option<String>) -> Self {
        Self {
            mode: ShellMode::Init,
            client: None,
            game: None,
            default_host,
            default_port,
            default_user,
            default_password,
            conn_host: None,
            conn_port: None,
        }
    }

    pub fn mode(&self) -> ShellMode {
        self.mode
    }

    fn prompt(&self) -> String {
        match self.mode {
            ShellMode::Init => match &self.game {
                Some(game) => format!("[not connected]{}{:03}(end)> ", game.state.to_move, game.history.len()),
                None => "[not connected]> ".to_string(),
            },
            ShellMode::Network => {
                let game = self.game.as_ref().expect("Network mode always has a game");
                format!(
                    "[{}:{}]{}{:03}> ",
                    self.conn_host.as_deref().unwrap_or("?"),
                    self.conn_port.unwrap_or(0),
                    game.state.to_move,
                    game.history.len()
                )
            }
            ShellMode::Standalone => "[standalone]> ".to_string(),
        }
    }

    fn game_end_banner(result: &str) -> String {
        let label = match result {
            "#WIN" => "YOU WIN!",
            "#LOSE" => "YOU LOSE!",
            "#DRAW" => "DRAW!",
            other => other,
        };
        let width = 80;
        let bar = "*".repeat(width);
        let middle = format!("*{:^width$}*", label, width = width - 2);
        format!("{bar}\n{middle}\n{bar}\n")
    }

    fn command_table(&self) -> Vec<ShellCommand> {
        use ShellCommand::*;
        match self.mode {
            ShellMode::Init => vec![Help, Exit, Login, History],
            ShellMode::Network => vec![Help, Exit, History, Move, Resign, Win, Info],
            ShellMode::Standalone => vec![],
        }
    }

    /// Runs the REPL until `EXIT`/EOF. Never returns an error: command
    /// failures are trapped and printed per spec §7.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        loop {
            print!("{}", self.prompt());
            io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut parts = line.split_whitespace();
            let name = parts.next().unwrap_or("").to_uppercase();
            let args: Vec<&str> = parts.collect();

            if name == "EXIT" || name == "QUIT" || name == "Q" {
                break;
            }

            let table = self.command_table();
            let command = table.into_iter().find(|c| c.aliases().contains(&name.as_str()));
            match command {
                None => println!("unknown command: {name}"),
                Some(command) => {
                    if let Err(err) = command.run(self, &args) {
                        println!("Exception: {err}");
                        if is_disconnect(&err) {
                            self.reset_to_init();
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn reset_to_init(&mut self) {
        self.client = None;
        self.game = None;
        self.mode = ShellMode::Init;
    }

    pub(crate) fn help_text(&self) -> String {
        self.command_table()
            .into_iter()
            .map(|c| format!("{:<10} {}  -  {}", c.name(), c.aliases().join("/"), c.help()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn do_login(&mut self, host_spec: Option<&str>, user: Option<&str>, password: Option<&str>) -> Result<(), ShellError> {
        let (host, port) = match host_spec {
            Some(spec) => match spec.split_once(':') {
                Some((h, p)) => {
                    let port = p.parse().map_err(|_| ShellError::Usage(format!("invalid port: {p}")))?;
                    (h.to_string(), port)
                }
                None => (spec.to_string(), self.default_port),
            },
            None => (self.default_host.clone(), self.default_port),
        };
        let user = user
            .map(str::to_string)
            .or_else(|| self.default_user.clone())
            .ok_or_else(|| ShellError::Usage("no username given and none configured".to_string()))?;
        let password = password
            .map(str::to_string)
            .or_else(|| self.default_password.clone())
            .ok_or_else(|| ShellError::Usage("no password given and none configured".to_string()))?;

        let transport = TcpTransport::connect((host.as_str(), port)).map_err(ShellError::from)?;
        let mut client = ProtocolClient::new(transport);

        let (ok, msg) = client.login(&user, &password)?;
        println!("{msg}");
        if !ok {
            return Ok(());
        }

        let condition = client.get_game_condition()?;
        self.print_summary(&condition);

        if self.prompt_yes_no("agree to this game?", true) {
            client.agree(&condition)?;
        } else {
            let msg = client.reject(&condition)?;
            println!("{msg}");
            let _ = client.logout();
            return Ok(());
        }

        let (ok, msg) = client.get_agreement(&condition)?;
        println!("{msg}");
        if !ok {
            let _ = client.logout();
            return Ok(());
        }

        self.client = Some(client);
        self.conn_host = Some(host);
        self.conn_port = Some(port);

        let game = Game::new(condition).map_err(ShellError::from)?;
        let my_turn = game.is_my_turn();
        self.game = Some(game);
        self.mode = ShellMode::Network;

        if !my_turn {
            self.wait_move()?;
        }
        Ok(())
    }

    fn cleanup_client(&mut self) {
        if let Some(client) = self.client.as_mut() {
            if client.state() == ClientState::GameWaiting {
                let _ = client.logout();
            }
        }
        self.client = None;
    }

    fn print_summary(&self, condition: &GameSummary) {
        println!("game id: {}", condition.game_id);
        println!("{} vs {}", condition.name_black, condition.name_white);
        println!("your turn: {}", condition.your_turn);
    }

    fn prompt_yes_no(&self, question: &str, default_yes: bool) -> bool {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        print!("{question} {hint}: ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return default_yes;
        }
        let line = line.trim().to_lowercase();
        match line.as_str() {
            "" => default_yes,
            "y" | "yes" => true,
            _ => false,
        }
    }

    pub(crate) fn do_move(&mut self, candidate: &str) -> Result<(), ShellError> {
        let game = self.game.as_ref().ok_or_else(|| ShellError::Failed("no game".to_string()))?;
        let candidate = normalize_move(candidate, game.state.to_move);
        log::info!("move: {candidate}");
        let outcome = self.client.as_mut().ok_or_else(|| ShellError::Failed("no game".to_string()))?.mv(&candidate)?;
        self.apply_move_result(outcome)?;
        if self.mode == ShellMode::Network {
            self.wait_move()?;
        }
        Ok(())
    }

    fn wait_move(&mut self) -> Result<(), ShellError> {
        log::info!("waiting for peer's move...");
        let outcome = self.client.as_mut().ok_or_else(|| ShellError::Failed("no game".to_string()))?.get_move()?;
        self.apply_move_result(outcome)
    }

    pub(crate) fn do_resign(&mut self) -> Result<(), ShellError> {
        let outcome = self.client.as_mut().ok_or_else(|| ShellError::Failed("no game".to_string()))?.resign()?;
        self.apply_move_result(outcome)
    }

    pub(crate) fn do_declare_win(&mut self) -> Result<(), ShellError> {
        let outcome = self.client.as_mut().ok_or_else(|| ShellError::Failed("no game".to_string()))?.declare_win()?;
        self.apply_move_result(outcome)
    }

    fn apply_move_result(&mut self, outcome: MoveOutcome) -> Result<(), ShellError> {
        if let Some(cmd) = &outcome.cmd {
            let mv = Move::parse(cmd, outcome.elapsed).map_err(|e| ShellError::Failed(e.to_string()))?;
            if let Some(game) = self.game.as_mut() {
                game.apply(mv).map_err(ShellError::from)?;
            }
            println!("{cmd}");
        }

        if let Some(result) = &outcome.end_result {
            println!("{}", Shell::game_end_banner(result));
            self.cleanup_client();
            self.mode = ShellMode::Init;
        }
        Ok(())
    }

    pub(crate) fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }
}

/// Prepends the player's turn character to `candidate` if the operator
/// omitted it.
fn normalize_move(candidate: &str, to_move: csa_core::Turn) -> String {
    if candidate.starts_with('+') || candidate.starts_with('-') {
        candidate.to_string()
    } else {
        format!("{to_move}{candidate}")
    }
}
