use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;

const NIBBLE_MASK: u16 = 0xF;

/// The fields every opcode is carved into. Which of them mean anything depends on
/// the instruction, so this is only ever a transient view used while decoding.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Instruction {
    pub opcode: u16,
    /// top nibble, selects the instruction family
    pub kind: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl From<u16> for Instruction {
    fn from(opcode: u16) -> Self {
        Instruction {
            opcode,
            kind: ((opcode >> 12) & NIBBLE_MASK) as u8,
            x: ((opcode >> 8) & NIBBLE_MASK) as u8,
            y: ((opcode >> 4) & NIBBLE_MASK) as u8,
            n: (opcode & NIBBLE_MASK) as u8,
            nn: (opcode & 0xFF) as u8,
            nnn: opcode & 0xFFF,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
#[error("unsupported instruction {opcode:#06X}")]
pub struct DecodeError {
    pub opcode: u16,
}

/// 35 CHIP 8 op codes. Ops decoded with `Op::try_from` always have register
/// operands between 0x0 and 0xF and addresses that fit in 12 bits. Ops built
/// by hand or deserialized may not; `Emulator::execute` rejects out of range
/// registers.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Op {
    // 0NNN 	Call 		Calls RCA 1802 program at address NNN.
    CallMachineRoutine(u16),
    // 00E0 	Display 	disp_clear()
    DispClear,
    // 00EE 	Flow 	return;
    Return,

    // 1NNN 	Flow 	goto NNN;
    Goto(u16),
    // 2NNN 	Flow 	*(0xNNN)()
    GotoSubRtn(u16),

    // 3XNN 	Cond 	if(Vx==NN)
    CondVxEq(u8, u8),
    // 4XNN 	Cond 	if(Vx!=NN)
    CondVxNe(u8, u8),
    // 5XY0 	Cond 	if(Vx==Vy)
    CondVxVyEq(u8, u8),

    // 6XNN 	Const 	Vx = NN
    ConstSetVx(u8, u8),
    // 7XNN 	Const 	Vx += NN, carry flag untouched
    ConstAddVx(u8, u8),

    // 8XY_ arithmetic and logic on two registers
    AssignVyToVx(u8, u8),
    BitOpOr(u8, u8),
    BitOpAnd(u8, u8),
    BitOpXor(u8, u8),
    MathVxAddVy(u8, u8),
    MathVxMinusVy(u8, u8),
    BitOpRtShift(u8, u8),
    MathVyMinusVx(u8, u8),
    BitOpLftShift(u8, u8),

    // 9XY0 	Cond 	if(Vx!=Vy)
    CondVxVyNe(u8, u8),

    // ANNN 	MEM 	I = NNN
    MemSetI(u16),
    // BNNN 	Flow 	PC=V0+NNN
    GotoPlusV0(u16),
    // CXNN 	Rand 	Vx=rand()&NN
    Rand(u8, u8),
    // DXYN 	Disp 	draw(Vx,Vy,N)
    DispDraw(u8, u8, u8),

    // EX9E / EXA1 	KeyOp 	if(key()==Vx) / if(key()!=Vx)
    KeyOpEqVx(u8),
    KeyOpNeVx(u8),

    // FX__ timers, keyboard and memory
    DelayGet(u8),
    KeyOpGet(u8),
    DelaySet(u8),
    SoundSet(u8),
    MemIPlusEqVx(u8),
    MemISetSprite(u8),
    Bcd(u8),
    RegDump(u8),
    RegLoad(u8),
}

impl Op {
    /// True for the ops that change what's on screen
    pub fn is_display_op(&self) -> bool {
        matches!(self, Op::DispClear | Op::DispDraw(..))
    }

    /// The highest register index this op names, if it names any
    pub fn max_register(&self) -> Option<u8> {
        match *self {
            Op::CondVxEq(x, _)
            | Op::CondVxNe(x, _)
            | Op::ConstSetVx(x, _)
            | Op::ConstAddVx(x, _)
            | Op::Rand(x, _)
            | Op::KeyOpEqVx(x)
            | Op::KeyOpNeVx(x)
            | Op::DelayGet(x)
            | Op::KeyOpGet(x)
            | Op::DelaySet(x)
            | Op::SoundSet(x)
            | Op::MemIPlusEqVx(x)
            | Op::MemISetSprite(x)
            | Op::Bcd(x)
            | Op::RegDump(x)
            | Op::RegLoad(x) => Some(x),
            Op::CondVxVyEq(x, y)
            | Op::AssignVyToVx(x, y)
            | Op::BitOpOr(x, y)
            | Op::BitOpAnd(x, y)
            | Op::BitOpXor(x, y)
            | Op::MathVxAddVy(x, y)
            | Op::MathVxMinusVy(x, y)
            | Op::BitOpRtShift(x, y)
            | Op::MathVyMinusVx(x, y)
            | Op::BitOpLftShift(x, y)
            | Op::CondVxVyNe(x, y)
            | Op::DispDraw(x, y, _) => Some(x.max(y)),
            Op::CallMachineRoutine(_)
            | Op::DispClear
            | Op::Return
            | Op::Goto(_)
            | Op::GotoSubRtn(_)
            | Op::MemSetI(_)
            | Op::GotoPlusV0(_) => None,
        }
    }
}

impl TryFrom<u16> for Op {
    type Error = DecodeError;

    fn try_from(opcode: u16) -> Result<Self, Self::Error> {
        let Instruction {
            kind,
            x,
            y,
            n,
            nn,
            nnn,
            ..
        } = Instruction::from(opcode);

        let op = match kind {
            0x0 => match nnn {
                0x0E0 => Op::DispClear,
                0x0EE => Op::Return,
                _ => Op::CallMachineRoutine(nnn),
            },
            0x1 => Op::Goto(nnn),
            0x2 => Op::GotoSubRtn(nnn),
            0x3 => Op::CondVxEq(x, nn),
            0x4 => Op::CondVxNe(x, nn),
            0x5 if n == 0 => Op::CondVxVyEq(x, y),
            0x6 => Op::ConstSetVx(x, nn),
            0x7 => Op::ConstAddVx(x, nn),
            0x8 => match n {
                0x0 => Op::AssignVyToVx(x, y),
                0x1 => Op::BitOpOr(x, y),
                0x2 => Op::BitOpAnd(x, y),
                0x3 => Op::BitOpXor(x, y),
                0x4 => Op::MathVxAddVy(x, y),
                0x5 => Op::MathVxMinusVy(x, y),
                0x6 => Op::BitOpRtShift(x, y),
                0x7 => Op::MathVyMinusVx(x, y),
                0xE => Op::BitOpLftShift(x, y),
                _ => return Err(DecodeError { opcode }),
            },
            0x9 if n == 0 => Op::CondVxVyNe(x, y),
            0xA => Op::MemSetI(nnn),
            0xB => Op::GotoPlusV0(nnn),
            0xC => Op::Rand(x, nn),
            0xD => Op::DispDraw(x, y, n),
            0xE => match nn {
                0x9E => Op::KeyOpEqVx(x),
                0xA1 => Op::KeyOpNeVx(x),
                _ => return Err(DecodeError { opcode }),
            },
            0xF => match nn {
                0x07 => Op::DelayGet(x),
                0x0A => Op::KeyOpGet(x),
                0x15 => Op::DelaySet(x),
                0x18 => Op::SoundSet(x),
                0x1E => Op::MemIPlusEqVx(x),
                0x29 => Op::MemISetSprite(x),
                0x33 => Op::Bcd(x),
                0x55 => Op::RegDump(x),
                0x65 => Op::RegLoad(x),
                _ => return Err(DecodeError { opcode }),
            },
            _ => return Err(DecodeError { opcode }),
        };

        Ok(op)
    }
}

/// Cowgod style mnemonics, handy in logs and debuggers
impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::CallMachineRoutine(addr) => write!(f, "SYS {:#05X}", addr),
            Op::DispClear => write!(f, "CLS"),
            Op::Return => write!(f, "RET"),
            Op::Goto(addr) => write!(f, "JP {:#05X}", addr),
            Op::GotoSubRtn(addr) => write!(f, "CALL {:#05X}", addr),
            Op::CondVxEq(x, nn) => write!(f, "SE V{:X}, {:#04X}", x, nn),
            Op::CondVxNe(x, nn) => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            Op::CondVxVyEq(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            Op::ConstSetVx(x, nn) => write!(f, "LD V{:X}, {:#04X}", x, nn),
            Op::ConstAddVx(x, nn) => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Op::AssignVyToVx(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Op::BitOpOr(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            Op::BitOpAnd(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Op::BitOpXor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            Op::MathVxAddVy(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Op::MathVxMinusVy(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Op::BitOpRtShift(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Op::MathVyMinusVx(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Op::BitOpLftShift(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            Op::CondVxVyNe(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            Op::MemSetI(addr) => write!(f, "LD I, {:#05X}", addr),
            Op::GotoPlusV0(addr) => write!(f, "JP V0, {:#05X}", addr),
            Op::Rand(x, nn) => write!(f, "RND V{:X}, {:#04X}", x, nn),
            Op::DispDraw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Op::KeyOpEqVx(x) => write!(f, "SKP V{:X}", x),
            Op::KeyOpNeVx(x) => write!(f, "SKNP V{:X}", x),
            Op::DelayGet(x) => write!(f, "LD V{:X}, DT", x),
            Op::KeyOpGet(x) => write!(f, "LD V{:X}, K", x),
            Op::DelaySet(x) => write!(f, "LD DT, V{:X}", x),
            Op::SoundSet(x) => write!(f, "LD ST, V{:X}", x),
            Op::MemIPlusEqVx(x) => write!(f, "ADD I, V{:X}", x),
            Op::MemISetSprite(x) => write!(f, "LD F, V{:X}", x),
            Op::Bcd(x) => write!(f, "LD B, V{:X}", x),
            Op::RegDump(x) => write!(f, "LD [I], V{:X}", x),
            Op::RegLoad(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
