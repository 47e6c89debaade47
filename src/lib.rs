//! An implementation of the CHIP 8 interpreter core in Rust. It owns memory,
//! registers, stack, timers and the framebuffer, and leaves windowing, sound,
//! input mapping and pacing to whoever drives it.
//!
//! ```no_run
//! use chipotle8::{Cycle, Emulator};
//!
//! let mut emulator = Emulator::new(None);
//! emulator.load_rom(&[0x00, 0xE0, 0x12, 0x00]).unwrap();
//!
//! loop {
//!     emulator.set_keys(&[false; 16]);
//!     match emulator.step() {
//!         Ok(Cycle::Executed(op)) if op.is_display_op() => { /* redraw */ }
//!         Ok(_) => {}
//!         Err(e) if e.is_fatal() => break,
//!         Err(_) => {}
//!     }
//!     // and call emulator.tick_timers() sixty times a second
//! }
//! ```

// # Interpreter
// * 4096 (0x1000) bytes of memory
// * the interpreter owns the first 512 (0x200) bytes, the font lives at the very start
// * 16 8-bit registers: V0 - VF
// * VF is the carry flag in addition, the "no borrow" flag in subtraction, the shifted out
// bit in shifts and the collision flag when drawing
// * the address register I is 16 bits wide
// * the stack is only used to store return addresses when subroutines are called

// # Timers
// * two timers, ticked by the caller at 60 hertz
//  - delay timer is used for events, it can be set and read
//  - sound timer beeps when its value is nonzero

// # Input
// there is a 16 symbol hex keyboard with values 0 - F. There are 3 opcode that deal with handling input
//  - one skips an instruction if a specific key is pressed
//  - one skips an instruction if a specific key is NOT pressed
//  - waits for a key press and stores it in a register once it detects it

// # Graphics
// 64x32 monochrome pixels

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use slog::{debug, error, info, o, trace, warn, Logger};
use std::convert::TryFrom;
use std::io;

mod config;
mod error;
pub mod graphics;
mod keyboard;
pub mod logging;
mod memory;
mod op;
mod stack;


pub use crate::config::{Config, Quirks};
pub use crate::error::{ConfigError, ExecError};
pub use crate::graphics::{Graphics, HEIGHT, WIDTH};
pub use crate::keyboard::{AsKeyboard, Key, Keyboard, NUM_KEYS};
pub use crate::memory::{
    LoadError, Memory, MemoryError, FONT_BASE, FONT_SET, MAX_ROM_SIZE, MEMORY_SIZE,
    NUM_BYTES_IN_FONT_CHAR, STARTING_MEMORY_BYTE,
};
pub use crate::op::{DecodeError, Instruction, Op};
pub use crate::stack::{Stack, StackError, STACK_DEPTH};

pub const NUM_REGISTERS: usize = 16;

/// VF doubles as the carry, borrow and collision flag
const FLAG_REGISTER: usize = 0xF;

/// every instruction is two bytes
const INSTRUCTION_SIZE: u16 = 2;

const ADDRESS_MASK: u16 = 0xFFF;

/// What a successful `step` did
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Cycle {
    Executed(Op),
    /// Sitting on an FX0A until a key goes down. `pc` still points at the FX0A.
    AwaitingKey,
}

/// A copy of everything a frontend or debugger may want to look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub v: [u8; NUM_REGISTERS],
    pub addr: u16,
    pub pc: u16,
    pub stack: Vec<u16>,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub pixels: Vec<bool>,
    pub display_changed: bool,
    pub screen_cleared: bool,
    pub awaiting_key: bool,
    pub halted: bool,
}

pub struct Emulator {
    memory: Memory, // 4k of RAM, font included

    stack: Stack, // return addresses, 16 deep

    addr: u16, // address register I
    pc: u16,   // program counter

    // 16 8-bit registers. VF is used as a flag by several of the opcodes (see @Op)
    v: [u8; NUM_REGISTERS],

    graphics: Graphics, // 64x32 pixel monochrome screen

    delay_timer: u8, // 60 Hz timer that can be set and read
    sound_timer: u8, // 60 Hz timer that beeps whenever it is nonzero

    keyboard: Keyboard,

    display_changed: bool, // set by DispDraw, cleared by the caller
    screen_cleared: bool,  // set by DispClear, cleared by the caller

    fault: Option<ExecError>, // the fatal error that stopped us, if any

    quirks: Quirks,
    rng: StdRng,
    logger: Logger,
}

impl Emulator {
    /// Create an interpreter with the default `Config`. Without a logger nothing
    /// gets logged.
    pub fn new(logger: Option<Logger>) -> Self {
        Emulator::with_config(Config::default(), logger)
    }

    pub fn with_config(config: Config, logger: Option<Logger>) -> Self {
        let logger = logger
            .unwrap_or_else(logging::discard_logger)
            .new(o!("component" => "interpreter"));
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Emulator {
            memory: Memory::new(),
            stack: Stack::new(),
            addr: 0,
            pc: STARTING_MEMORY_BYTE as u16,
            v: [0; NUM_REGISTERS],
            graphics: Graphics::new(),
            delay_timer: 0,
            sound_timer: 0,
            keyboard: Keyboard::new(),
            display_changed: false,
            screen_cleared: false,
            fault: None,
            quirks: config.quirks,
            rng,
            logger,
        }
    }

    /// Copy a program image into memory at 0x200. On error memory is untouched.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        match self.memory.load(rom) {
            Ok(()) => {
                info!(self.logger, "loaded rom"; "bytes" => rom.len());
                Ok(())
            }
            Err(e) => {
                warn!(self.logger, "rejected rom"; "error" => %e);
                Err(e)
            }
        }
    }

    /// Read a whole program image from `reader` and load it
    pub fn load_from_reader<R: io::Read>(&mut self, reader: R) -> Result<(), LoadError> {
        match self.memory.load_from_reader(reader) {
            Ok(len) => {
                info!(self.logger, "loaded rom"; "bytes" => len);
                Ok(())
            }
            Err(e) => {
                warn!(self.logger, "rejected rom"; "error" => %e);
                Err(e)
            }
        }
    }

    /// Put everything except memory back into its power-on state. The loaded
    /// program stays, so this restarts it.
    pub fn reset(&mut self) {
        self.stack = Stack::new();
        self.addr = 0;
        self.pc = STARTING_MEMORY_BYTE as u16;
        self.v = [0; NUM_REGISTERS];
        self.graphics.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.keyboard.reset();
        self.display_changed = false;
        self.screen_cleared = false;
        self.fault = None;
        info!(self.logger, "reset");
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// An unsupported instruction is reported but `pc` has already moved past
    /// it. Any other error is fatal: it is returned once and every later call
    /// returns `ExecError::Halted` until `reset`.
    pub fn step(&mut self) -> Result<Cycle, ExecError> {
        if self.fault.is_some() {
            return Err(ExecError::Halted);
        }

        let result = self.fetch_and_execute();
        self.keyboard.latch();

        if let Err(e) = result {
            if e.is_fatal() {
                error!(self.logger, "halting"; "error" => %e, "pc" => self.pc);
                self.fault = Some(e);
            } else {
                warn!(self.logger, "skipping instruction"; "error" => %e);
            }
        }
        result
    }

    fn fetch_and_execute(&mut self) -> Result<Cycle, ExecError> {
        let address = self.pc;
        let opcode = self.fetch()?;
        let op = Op::try_from(opcode).map_err(|e| ExecError::UnsupportedInstruction {
            opcode: e.opcode,
            address,
        })?;
        trace!(self.logger, "execute"; "pc" => address, "op" => %op);

        self.execute(op)
    }

    /// Read the big-endian word at `pc` and move `pc` to the next instruction
    fn fetch(&mut self) -> Result<u16, ExecError> {
        let opcode = self.memory.read_word(self.pc as usize)?;
        self.pc += INSTRUCTION_SIZE;
        Ok(opcode)
    }

    /// Execute an already decoded op. It behaves as if `op` had just been
    /// fetched, so `pc` is expected to point past it.
    ///
    /// Ops naming a register past VF are refused with
    /// `ExecError::InvalidRegister` before anything changes.
    pub fn execute(&mut self, op: Op) -> Result<Cycle, ExecError> {
        let address = self.pc.wrapping_sub(INSTRUCTION_SIZE);

        if let Some(register) = op.max_register() {
            if register as usize >= NUM_REGISTERS {
                return Err(ExecError::InvalidRegister { register, address });
            }
        }

        match op {
            Op::CallMachineRoutine(nnn) => {
                return Err(ExecError::UnsupportedInstruction {
                    opcode: nnn,
                    address,
                });
            }
            Op::DispClear => {
                self.graphics.clear();
                self.screen_cleared = true;
            }
            Op::Return => {
                let target = self
                    .stack
                    .pop()
                    .map_err(|_| ExecError::StackUnderflow { address })?;
                self.jump(target as usize)?;
                debug!(self.logger, "return"; "to" => target, "depth" => self.stack.len());
            }
            Op::Goto(nnn) => self.jump(nnn as usize)?,
            Op::GotoSubRtn(nnn) => {
                Self::check_jump_target(nnn as usize)?;
                self.stack
                    .push(self.pc)
                    .map_err(|_| ExecError::StackOverflow { address })?;
                self.pc = nnn;
                debug!(self.logger, "call"; "to" => nnn, "depth" => self.stack.len());
            }
            Op::CondVxEq(x, nn) => self.skip_if(self.v[x as usize] == nn),
            Op::CondVxNe(x, nn) => self.skip_if(self.v[x as usize] != nn),
            Op::CondVxVyEq(x, y) => self.skip_if(self.v[x as usize] == self.v[y as usize]),
            Op::ConstSetVx(x, nn) => self.v[x as usize] = nn,
            Op::ConstAddVx(x, nn) => {
                self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
            }
            Op::AssignVyToVx(x, y) => self.v[x as usize] = self.v[y as usize],
            Op::BitOpOr(x, y) => self.v[x as usize] |= self.v[y as usize],
            Op::BitOpAnd(x, y) => self.v[x as usize] &= self.v[y as usize],
            Op::BitOpXor(x, y) => self.v[x as usize] ^= self.v[y as usize],
            Op::MathVxAddVy(x, y) => {
                let (sum, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
                self.set_with_flag(x, sum, carry);
            }
            Op::MathVxMinusVy(x, y) => {
                let (diff, borrow) = self.v[x as usize].overflowing_sub(self.v[y as usize]);
                self.set_with_flag(x, diff, !borrow);
            }
            Op::MathVyMinusVx(x, y) => {
                let (diff, borrow) = self.v[y as usize].overflowing_sub(self.v[x as usize]);
                self.set_with_flag(x, diff, !borrow);
            }
            Op::BitOpRtShift(x, y) => {
                let src = self.shift_source(x, y);
                self.set_with_flag(x, src >> 1, src & 0x1 == 1);
            }
            Op::BitOpLftShift(x, y) => {
                let src = self.shift_source(x, y);
                self.set_with_flag(x, src << 1, src >> 7 == 1);
            }
            Op::CondVxVyNe(x, y) => self.skip_if(self.v[x as usize] != self.v[y as usize]),
            Op::MemSetI(nnn) => self.addr = nnn,
            Op::GotoPlusV0(nnn) => {
                let offset_reg = if self.quirks.jump_uses_vx {
                    ((nnn >> 8) & 0xF) as usize
                } else {
                    0
                };
                self.jump(nnn as usize + self.v[offset_reg] as usize)?;
            }
            Op::Rand(x, nn) => {
                let byte: u8 = self.rng.gen();
                self.v[x as usize] = byte & nn;
            }
            Op::DispDraw(x, y, n) => {
                let x_coord = self.v[x as usize] as usize % WIDTH;
                let y_coord = self.v[y as usize] as usize % HEIGHT;
                let sprite = self.memory.read_slice(self.addr as usize, n as usize)?;
                let collision = self.graphics.draw_sprite(x_coord, y_coord, sprite);

                self.v[FLAG_REGISTER] = collision as u8;
                self.display_changed = true;
            }
            Op::KeyOpEqVx(x) => {
                let pressed = self.keyboard.get_key_state(self.v[x as usize] as usize);
                self.skip_if(pressed);
            }
            Op::KeyOpNeVx(x) => {
                let pressed = self.keyboard.get_key_state(self.v[x as usize] as usize);
                self.skip_if(!pressed);
            }
            Op::DelayGet(x) => self.v[x as usize] = self.delay_timer,
            Op::KeyOpGet(x) => match self.keyboard.newly_pressed() {
                Some(key) => {
                    self.v[x as usize] = key;
                    if self.keyboard.unblock().is_some() {
                        debug!(self.logger, "key wait finished"; "key" => key, "register" => x);
                    }
                }
                None => {
                    if !self.keyboard.is_blocking() {
                        debug!(self.logger, "waiting for key"; "register" => x);
                    }
                    self.keyboard.block(x);
                    // stay on this instruction until a key goes down
                    self.pc = address;
                    return Ok(Cycle::AwaitingKey);
                }
            },
            Op::DelaySet(x) => self.delay_timer = self.v[x as usize],
            Op::SoundSet(x) => self.sound_timer = self.v[x as usize],
            Op::MemIPlusEqVx(x) => {
                let sum = self.addr as u32 + self.v[x as usize] as u32;
                self.addr = (sum & ADDRESS_MASK as u32) as u16;
                self.v[FLAG_REGISTER] = (sum > ADDRESS_MASK as u32) as u8;
            }
            Op::MemISetSprite(x) => {
                let digit = (self.v[x as usize] & 0xF) as u16;
                self.addr = FONT_BASE + digit * NUM_BYTES_IN_FONT_CHAR as u16;
            }
            Op::Bcd(x) => {
                let value = self.v[x as usize];
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.memory.write_slice(self.addr as usize, &digits)?;
            }
            Op::RegDump(x) => {
                let count = x as usize + 1;
                self.memory
                    .write_slice(self.addr as usize, &self.v[..count])?;
                if self.quirks.load_store_increments_i {
                    self.addr = self.addr.wrapping_add(count as u16);
                }
            }
            Op::RegLoad(x) => {
                let count = x as usize + 1;
                let bytes = self.memory.read_slice(self.addr as usize, count)?;
                self.v[..count].copy_from_slice(bytes);
                if self.quirks.load_store_increments_i {
                    self.addr = self.addr.wrapping_add(count as u16);
                }
            }
        }

        Ok(Cycle::Executed(op))
    }

    fn check_jump_target(target: usize) -> Result<(), ExecError> {
        if target % 2 != 0 || target + INSTRUCTION_SIZE as usize > MEMORY_SIZE {
            return Err(ExecError::InvalidJumpTarget { target });
        }
        Ok(())
    }

    fn jump(&mut self, target: usize) -> Result<(), ExecError> {
        Self::check_jump_target(target)?;
        self.pc = target as u16;
        Ok(())
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc += INSTRUCTION_SIZE;
        }
    }

    // the flag is written last so it wins when x is VF
    fn set_with_flag(&mut self, x: u8, value: u8, flag: bool) {
        self.v[x as usize] = value;
        self.v[FLAG_REGISTER] = flag as u8;
    }

    fn shift_source(&self, x: u8, y: u8) -> u8 {
        if self.quirks.shift_uses_vy {
            self.v[y as usize]
        } else {
            self.v[x as usize]
        }
    }

    /// Count both timers down by one. Call at 60 Hz.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// The frontend should beep while this is true
    pub fn is_sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    /// Replace the keypad snapshot. Call before each `step`.
    pub fn set_keys(&mut self, keys: &[bool; NUM_KEYS]) {
        self.keyboard.set_keys(keys);
    }

    /// check for key press changes and update the Emulator with which keys are up or down
    pub fn handle_key_input(&mut self, keyboard: &impl AsKeyboard) {
        self.keyboard.update_keyboard_with_vec(&keyboard.keys_down());
    }

    pub fn key_down(&mut self, key: Key) {
        self.keyboard.handle_key_down(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.keyboard.handle_key_up(key);
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.keyboard.is_blocking()
    }

    pub fn graphics(&self) -> &Graphics {
        &self.graphics
    }

    /// The screen as one u32 per pixel, see `graphics::PIXEL_ON`
    pub fn get_pixels(&self) -> Vec<u32> {
        self.graphics.get_pixels()
    }

    pub fn display_changed(&self) -> bool {
        self.display_changed
    }

    /// Report whether a draw happened since the last call, and clear the flag
    pub fn take_display_changed(&mut self) -> bool {
        std::mem::replace(&mut self.display_changed, false)
    }

    pub fn screen_cleared(&self) -> bool {
        self.screen_cleared
    }

    /// Report whether the screen was cleared since the last call, and clear the flag
    pub fn take_screen_cleared(&mut self) -> bool {
        std::mem::replace(&mut self.screen_cleared, false)
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    /// The address register I
    pub fn index(&self) -> u16 {
        self.addr
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// The fatal error that halted the interpreter, if there was one
    pub fn fault(&self) -> Option<ExecError> {
        self.fault
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            v: self.v,
            addr: self.addr,
            pc: self.pc,
            stack: self.stack.as_slice().to_vec(),
            delay_timer: self.delay_timer,
            sound_timer: self.sound_timer,
            pixels: self.graphics.to_bools(),
            display_changed: self.display_changed,
            screen_cleared: self.screen_cleared,
            awaiting_key: self.keyboard.is_blocking(),
            halted: self.fault.is_some(),
        }
    }
}
