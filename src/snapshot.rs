use crate::display::DISPLAY_WIDTH;
use crate::machine::{Machine, NUM_REGISTERS};
use crate::memory::MEM_SIZE;
use crate::timer::Timers;

/// An immutable copy of the observable machine state.
///
/// Tooling, not core behavior: the front end captures a snapshot on either
/// side of a cycle and logs the diff when tracing is requested. The core
/// never depends on this module.
pub struct Snapshot {
    v: [u8; NUM_REGISTERS],
    index: usize,
    pc: usize,
    opcode: u16,
    stack_depth: usize,
    timers: Timers,
    pixels: Vec<bool>,
    memory: [u8; MEM_SIZE],
}

impl Snapshot {
    pub fn capture(machine: &Machine) -> Self {
        Snapshot {
            v: machine.v,
            index: machine.index,
            pc: machine.pc,
            opcode: machine.opcode,
            stack_depth: machine.stack_depth(),
            timers: machine.timers,
            pixels: machine.framebuffer.to_bits(),
            memory: *machine.memory.as_bytes(),
        }
    }

    /// One line per state element that changed between this snapshot and a
    /// later one.
    pub fn diff(&self, after: &Snapshot) -> Vec<String> {
        let mut changes = Vec::new();

        for i in 0..NUM_REGISTERS {
            if self.v[i] != after.v[i] {
                changes.push(format!("V{i:X}: {:#04X} -> {:#04X}", self.v[i], after.v[i]));
            }
        }
        if self.index != after.index {
            changes.push(format!("I: {:#05X} -> {:#05X}", self.index, after.index));
        }
        if self.pc != after.pc {
            changes.push(format!("PC: {:#05X} -> {:#05X}", self.pc, after.pc));
        }
        if self.opcode != after.opcode {
            changes.push(format!(
                "opcode: {:#06X} -> {:#06X}",
                self.opcode, after.opcode
            ));
        }
        if self.stack_depth != after.stack_depth {
            changes.push(format!(
                "stack depth: {} -> {}",
                self.stack_depth, after.stack_depth
            ));
        }
        if self.timers.delay != after.timers.delay {
            changes.push(format!(
                "delay: {} -> {}",
                self.timers.delay, after.timers.delay
            ));
        }
        if self.timers.sound != after.timers.sound {
            changes.push(format!(
                "sound: {} -> {}",
                self.timers.sound, after.timers.sound
            ));
        }
        for (i, (&before, &now)) in self.pixels.iter().zip(after.pixels.iter()).enumerate() {
            if before != now {
                let (x, y) = (i % DISPLAY_WIDTH, i / DISPLAY_WIDTH);
                changes.push(format!(
                    "({x},{y}): {} -> {}",
                    u8::from(before),
                    u8::from(now)
                ));
            }
        }
        for addr in 0..MEM_SIZE {
            if self.memory[addr] != after.memory[addr] {
                changes.push(format!(
                    "mem[{addr:#05X}]: {:#04X} -> {:#04X}",
                    self.memory[addr], after.memory[addr]
                ));
            }
        }

        changes
    }
}
