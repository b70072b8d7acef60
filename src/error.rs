/// Errors raised by the interpreter core.
///
/// `UnknownInstruction` is the only error a well-formed program can never
/// recover from by design; the rest guard state that the reference machine
/// leaves undefined (stack and memory bounds, key indices).
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("unknown instruction {opcode:#06X}")]
    UnknownInstruction { opcode: u16 },

    #[error("memory access out of range at {addr:#05X}")]
    OutOfRange { addr: usize },

    #[error("call stack overflow: depth limit of {limit} reached")]
    StackOverflow { limit: usize },

    #[error("call stack underflow: return with no saved address")]
    StackUnderflow,

    #[error("key index {index:#04X} outside the hex keypad")]
    InvalidKey { index: u8 },
}
