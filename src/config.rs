//! Knobs for the interpreter. Nothing here is read from disk or the environment;
//! frontends deserialize a `Config` from whatever source they like.
use crate::error::ConfigError;
use crate::logging;
use serde::{Deserialize, Serialize};
use slog::Logger;
use sloggers::types::Severity;

/// Behaviors that differ between CHIP-8 implementations. Some ROMs depend on
/// the older COSMAC VIP or the later CHIP-48/SUPER-CHIP variants. Everything
/// defaults to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quirks {
    /// 8XY6/8XYE shift VY into VX instead of shifting VX in place (COSMAC VIP)
    pub shift_uses_vy: bool,
    /// FX55/FX65 leave I pointing one past the last register copied (COSMAC VIP)
    pub load_store_increments_i: bool,
    /// BXNN jumps to XNN + VX instead of NNN + V0 (CHIP-48, SUPER-CHIP)
    pub jump_uses_vx: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quirks: Quirks,
    /// Seed for the CXNN random source. Seeded from entropy when absent.
    pub rng_seed: Option<u64>,
    /// Level for `logging::terminal_logger`
    pub log_level: Severity,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quirks: Quirks::default(),
            rng_seed: None,
            log_level: Severity::Info,
        }
    }
}

impl Config {
    /// A stderr terminal logger at `log_level`, ready to hand to `Emulator::with_config`
    pub fn build_logger(&self) -> Result<Logger, ConfigError> {
        logging::terminal_logger(self.log_level)
    }
}
