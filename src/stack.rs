use thiserror::Error;

/// CHIP 8 can hold up to 16 return addresses
pub const STACK_DEPTH: usize = 16;

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum StackError {
    #[error("call stack is full ({} return addresses)", STACK_DEPTH)]
    Overflow,
    #[error("return with an empty call stack")]
    Underflow,
}

/// Return addresses for subroutine calls. Fixed capacity, never grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    slots: [u16; STACK_DEPTH],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: u16) -> Result<(), StackError> {
        let slot = self.slots.get_mut(self.sp).ok_or(StackError::Overflow)?;
        *slot = addr;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, StackError> {
        if self.sp == 0 {
            return Err(StackError::Underflow);
        }
        self.sp -= 1;
        let addr = self.slots[self.sp];
        self.slots[self.sp] = 0;
        Ok(addr)
    }

    pub fn len(&self) -> usize {
        self.sp
    }

    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// The live return addresses, oldest first
    pub fn as_slice(&self) -> &[u16] {
        &self.slots[..self.sp]
    }
}
