use crate::memory::MemoryError;
use thiserror::Error;

/// Everything `Emulator::step` can report besides a normal cycle
#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum ExecError {
    /// The word at `address` is not a CHIP-8 instruction we can run. `pc` has
    /// already moved past it, so the caller may keep stepping.
    #[error("unsupported instruction {opcode:#06X} at {address:#05X}")]
    UnsupportedInstruction { opcode: u16, address: u16 },

    /// An op handed straight to `Emulator::execute` named a register past VF.
    /// Nothing was changed.
    #[error("op at {address:#05X} names register {register:#X}, past VF")]
    InvalidRegister { register: u8, address: u16 },

    #[error("call at {address:#05X} overflowed the call stack")]
    StackOverflow { address: u16 },

    #[error("return at {address:#05X} with an empty call stack")]
    StackUnderflow { address: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    AddressOutOfRange { address: usize },

    /// jumps, calls and returns must land on an even address inside memory
    #[error("jump target {target:#06X} is odd or outside memory")]
    InvalidJumpTarget { target: usize },

    /// A fatal error was already reported; nothing runs until `reset`
    #[error("interpreter halted after a fatal error")]
    Halted,
}

impl ExecError {
    /// Fatal errors leave registers and `pc` untrustworthy, so the interpreter
    /// refuses to run further instructions after one
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ExecError::UnsupportedInstruction { .. } | ExecError::InvalidRegister { .. }
        )
    }
}

impl From<MemoryError> for ExecError {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::OutOfBounds { address } => ExecError::AddressOutOfRange { address },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build logger: {0}")]
    Logger(String),
}
