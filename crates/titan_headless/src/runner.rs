//! Headless game runner implementation.
//!
//! Reads JSON commands line by line, drives a recorded simulation and
//! writes JSON responses. The loop is synchronous: a controller waits for
//! the responses to one command before sending the next.

use std::io::{self, BufRead, Write};

use titan_core::command::{CommandOutcome, PlayerCommand};
use titan_core::config::GameConfig;
use titan_core::error::Result as GameResult;
use titan_core::replay::{Recorder, Replay};
use titan_core::simulation::Simulation;

use crate::protocol::{CatalogEntry, Command, Response};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output state after every tick (vs once per `tick` command).
    pub auto_state_output: bool,
    /// Seed of the game.
    pub seed: u64,
    /// Game rules.
    pub game_config: GameConfig,
}

/// Headless runner for externally controlled play.
#[derive(Debug)]
pub struct HeadlessRunner {
    config: HeadlessConfig,
    recorder: Recorder,
    game_over_sent: bool,
    quit: bool,
}

impl HeadlessRunner {
    /// Create a runner with a fresh game.
    pub fn new(config: HeadlessConfig) -> GameResult<Self> {
        let recorder = Recorder::new(config.game_config.clone(), config.seed)?;
        Ok(Self {
            config,
            recorder,
            game_over_sent: false,
            quit: false,
        })
    }

    /// The game being played.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        self.recorder.simulation()
    }

    /// Whether a `quit` command has been handled.
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    /// Greeting sent before any command is read.
    #[must_use]
    pub fn ready(&self) -> Response {
        Response::ready(self.simulation().get_tick(), self.config.seed)
    }

    /// Parse and handle one input line.
    ///
    /// Blank lines produce no output.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable command line");
                vec![Response::error(format!("Parse error: {e}"), None)]
            }
        }
    }

    /// Handle one command.
    pub fn handle(&mut self, cmd: Command) -> Vec<Response> {
        let name = cmd.name();
        tracing::debug!(cmd = name, tick = self.simulation().get_tick(), "Handling command");

        let result = match cmd {
            Command::Tick { count } => Ok(self.run_ticks(count)),
            Command::Query => Ok(vec![self.state_response()]),
            Command::Deploy { archetype } => archetype
                .resolve(self.simulation().catalog())
                .and_then(|id| self.apply(PlayerCommand::Deploy(id)))
                .map(|outcome| self.describe(outcome, name)),
            Command::Upgrade { kind } => self
                .apply(PlayerCommand::PurchaseUpgrade(kind))
                .map(|_| {
                    let sim = self.simulation();
                    vec![Response::Upgraded {
                        kind,
                        counts: *sim.upgrades(),
                        gold: sim.gold(),
                        player_hp: sim.player_hp(),
                        player_max_hp: sim.player_max_hp(),
                    }]
                }),
            Command::Difficulty { level } => self
                .apply(PlayerCommand::SetDifficulty(level))
                .map(|outcome| self.describe(outcome, name)),
            Command::Pause => self
                .apply(PlayerCommand::TogglePause)
                .map(|outcome| self.describe(outcome, name)),
            Command::Reset => self.apply(PlayerCommand::Reset).map(|outcome| {
                self.game_over_sent = false;
                self.describe(outcome, name)
            }),
            Command::Hash => {
                let sim = self.simulation();
                Ok(vec![Response::StateHash {
                    tick: sim.get_tick(),
                    hash: sim.state_hash(),
                }])
            }
            Command::Catalog => Ok(vec![Response::Catalog {
                archetypes: CatalogEntry::list(self.simulation().catalog()),
            }]),
            Command::Quit => {
                self.quit = true;
                Ok(vec![Response::Bye])
            }
        };

        result.unwrap_or_else(|err| {
            tracing::warn!(cmd = name, error = %err, "Command rejected");
            vec![Response::error(err.to_string(), Some(name))]
        })
    }

    fn apply(&mut self, command: PlayerCommand) -> GameResult<CommandOutcome> {
        self.recorder.apply(command)
    }

    fn describe(&self, outcome: CommandOutcome, name: &str) -> Vec<Response> {
        let sim = self.simulation();
        let response = match outcome {
            CommandOutcome::Deployed(unit_id) => {
                let archetype = sim
                    .player_units()
                    .iter()
                    .find(|unit| unit.id == unit_id)
                    .and_then(|unit| sim.catalog().get(unit.archetype).ok())
                    .map(|archetype| archetype.data.name.clone())
                    .unwrap_or_default();
                Response::Deployed {
                    unit_id,
                    archetype,
                    gold: sim.gold(),
                }
            }
            CommandOutcome::Upgraded(_)
            | CommandOutcome::DifficultySet(_)
            | CommandOutcome::PauseToggled(_)
            | CommandOutcome::Reset => Response::ack(name),
        };
        vec![response]
    }

    fn run_ticks(&mut self, count: u32) -> Vec<Response> {
        let mut responses = Vec::new();
        for _ in 0..count {
            if self.simulation().status().is_finished() {
                break;
            }
            let events = self.recorder.tick();
            if let Some(wave) = events.wave_started {
                tracing::info!(wave, tick = self.simulation().get_tick(), "Wave started");
            }
            if self.config.auto_state_output {
                responses.push(self.state_response());
            }
        }
        if !self.config.auto_state_output {
            responses.push(self.state_response());
        }
        if let Some(game_over) = self.game_over_response() {
            responses.push(game_over);
        }
        responses
    }

    fn state_response(&self) -> Response {
        let sim = self.simulation();
        Response::State {
            state: sim.snapshot(),
            hash: sim.state_hash(),
        }
    }

    fn game_over_response(&mut self) -> Option<Response> {
        let status = self.simulation().status();
        if !status.is_finished() || self.game_over_sent {
            return None;
        }
        self.game_over_sent = true;
        Some(Response::GameOver {
            result: status,
            summary: self.simulation().summary(),
        })
    }

    /// Run the protocol loop until `quit` or end of input.
    ///
    /// Returns the replay of the session.
    pub fn run<R: BufRead, W: Write>(mut self, input: R, mut output: W) -> io::Result<Replay> {
        write!(output, "{}", self.ready().to_json_line())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            for response in self.handle_line(&line) {
                write!(output, "{}", response.to_json_line())?;
            }
            output.flush()?;
            if self.quit {
                break;
            }
        }

        tracing::info!(
            frames = self.recorder.frame(),
            tick = self.simulation().get_tick(),
            "Session ended"
        );
        Ok(self.recorder.finish())
    }

    /// Run the protocol loop on stdin and stdout.
    pub fn run_stdio(self) -> io::Result<Replay> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }
}
