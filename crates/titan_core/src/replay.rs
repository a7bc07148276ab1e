//! Replay recording and playback.
//!
//! A replay stores the seed, the configuration and the stream of player
//! commands. Because the simulation is deterministic that is enough to
//! recreate any game exactly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::{CommandOutcome, PlayerCommand};
use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::simulation::{Simulation, TickEvents};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// A command and the frame it was issued on.
///
/// Frames count calls to [`Simulation::tick`], processed or not, so they
/// keep advancing while the game is paused and across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// Frames elapsed when the command was applied.
    pub frame: u64,
    /// The command.
    pub command: PlayerCommand,
}

/// Complete replay data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Format version.
    pub version: u32,
    /// Seed of the random stream.
    pub seed: u64,
    /// Configuration the game ran with.
    pub config: GameConfig,
    /// Commands in the order they were applied.
    pub commands: Vec<ReplayCommand>,
    /// Frames recorded.
    pub final_frame: u64,
    /// State hash after `final_frame` frames.
    pub final_hash: u64,
}

impl Replay {
    /// Start an empty replay.
    #[must_use]
    pub fn new(seed: u64, config: GameConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            seed,
            config,
            commands: Vec::new(),
            final_frame: 0,
            final_hash: 0,
        }
    }

    /// Record a command applied at `frame`.
    pub fn record(&mut self, frame: u64, command: PlayerCommand) {
        self.commands.push(ReplayCommand { frame, command });
    }

    /// Stamp the end state.
    pub fn finalize(&mut self, final_frame: u64, final_hash: u64) {
        self.final_frame = final_frame;
        self.final_hash = final_hash;
    }

    /// Fresh simulation in the recorded starting state.
    pub fn initial_simulation(&self) -> Result<Simulation> {
        Simulation::with_config(self.config.clone(), self.seed)
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::ReplayEncode(e.to_string()))
    }

    /// Decode with bincode, rejecting other format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes).map_err(|e| GameError::DataParseError {
            what: "replay".to_string(),
            message: e.to_string(),
        })?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }
        Ok(replay)
    }

    /// Save to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| io_error(path, &e))
    }

    /// Load from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| io_error(path, &e))?;
        Self::from_bytes(&bytes)
    }
}

fn io_error(path: &Path, err: &std::io::Error) -> GameError {
    GameError::ReplayIo {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// A simulation that records every command applied to it.
#[derive(Debug)]
pub struct Recorder {
    simulation: Simulation,
    replay: Replay,
    frame: u64,
}

impl Recorder {
    /// Start a recorded game.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        let simulation = Simulation::with_config(config.clone(), seed)?;
        Ok(Self {
            simulation,
            replay: Replay::new(seed, config),
            frame: 0,
        })
    }

    /// Apply and record a command. Rejected commands are recorded too.
    pub fn apply(&mut self, command: PlayerCommand) -> Result<CommandOutcome> {
        self.replay.record(self.frame, command);
        self.simulation.apply(command)
    }

    /// Advance one frame.
    pub fn tick(&mut self) -> TickEvents {
        self.frame += 1;
        self.simulation.tick()
    }

    /// Frames elapsed.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulation being recorded.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Stop recording and stamp the final state.
    #[must_use]
    pub fn finish(mut self) -> Replay {
        self.replay
            .finalize(self.frame, self.simulation.state_hash());
        self.replay
    }
}

/// Replays a recording against a fresh simulation.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    current_frame: u64,
    command_index: usize,
}

impl ReplayPlayer {
    /// Prepare playback from the replay's starting state.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.initial_simulation()?;
        Ok(Self {
            replay,
            simulation,
            current_frame: 0,
            command_index: 0,
        })
    }

    /// Apply the commands due at the current frame, then tick once.
    ///
    /// Returns true if there are more frames to play.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.apply_due_commands();
        self.simulation.tick();
        self.current_frame += 1;
        !self.is_finished()
    }

    /// Play every remaining frame, then any commands issued after the last tick.
    pub fn run_to_end(&mut self) {
        while self.advance() {}
        self.apply_due_commands();
    }

    /// Run to the end and compare the final state hash.
    ///
    /// Returns the final simulation when the hashes agree.
    pub fn verify(mut self) -> Result<Simulation> {
        self.run_to_end();
        let actual = self.simulation.state_hash();
        if actual != self.replay.final_hash {
            return Err(GameError::DesyncDetected {
                frame: self.current_frame,
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(self.simulation)
    }

    /// Whether the recorded final frame has been reached.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.current_frame >= self.replay.final_frame
    }

    /// Frames played.
    #[must_use]
    pub const fn current_frame(&self) -> u64 {
        self.current_frame
    }

    /// Simulation being driven.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    fn apply_due_commands(&mut self) {
        while let Some(entry) = self.replay.commands.get(self.command_index) {
            if entry.frame > self.current_frame {
                break;
            }
            if let Err(err) = self.simulation.apply(entry.command) {
                tracing::trace!(frame = entry.frame, error = %err, "Replayed command rejected");
            }
            self.command_index += 1;
        }
    }
}
