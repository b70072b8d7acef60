use crate::error::VmError;
use crate::machine::{Machine, VF};
use crate::memory::Memory;
use crate::opcode::Opcode;

/// A decoded operation, ready to run against the machine state.
///
/// The fetch step has already advanced the program counter past the
/// instruction word; skip handlers add a further 2, jump/call/return assign
/// the counter directly.
pub trait Instruction {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError>;
}

/// Select the handler for an instruction word. The top nibble picks the
/// family; families 0x0, 0x5, 0x8, 0x9, 0xE, and 0xF consult the low
/// nibble or byte. Anything outside the documented set is an
/// [`VmError::UnknownInstruction`], never a silent no-op.
pub fn decode(opcode: Opcode) -> Result<Box<dyn Instruction>, VmError> {
    let unknown = || VmError::UnknownInstruction {
        opcode: opcode.raw(),
    };

    match opcode.family() {
        0x0 => match opcode.nnn() {
            0x0E0 => Ok(Box::new(Cls)),
            0x0EE => Ok(Box::new(Ret)),
            _ => Err(unknown()),
        },
        0x1 => Ok(Box::new(Jp(opcode))),
        0x2 => Ok(Box::new(Call(opcode))),
        0x3 => Ok(Box::new(SeImm(opcode))),
        0x4 => Ok(Box::new(SneImm(opcode))),
        0x5 => match opcode.n() {
            0x0 => Ok(Box::new(SeReg(opcode))),
            _ => Err(unknown()),
        },
        0x6 => Ok(Box::new(LdImm(opcode))),
        0x7 => Ok(Box::new(AddImm(opcode))),
        0x8 => match opcode.n() {
            0x0 => Ok(Box::new(Mov(opcode))),
            0x1 => Ok(Box::new(Or(opcode))),
            0x2 => Ok(Box::new(And(opcode))),
            0x3 => Ok(Box::new(Xor(opcode))),
            0x4 => Ok(Box::new(AddReg(opcode))),
            0x5 => Ok(Box::new(SubReg(opcode))),
            0x6 => Ok(Box::new(Shr(opcode))),
            0x7 => Ok(Box::new(SubFrom(opcode))),
            0xE => Ok(Box::new(Shl(opcode))),
            _ => Err(unknown()),
        },
        0x9 => match opcode.n() {
            0x0 => Ok(Box::new(SneReg(opcode))),
            _ => Err(unknown()),
        },
        0xA => Ok(Box::new(LdIndex(opcode))),
        0xB => Ok(Box::new(JpOffset(opcode))),
        0xC => Ok(Box::new(Rnd(opcode))),
        0xD => Ok(Box::new(Drw(opcode))),
        0xE => match opcode.kk() {
            0x9E => Ok(Box::new(SkipKey(opcode))),
            0xA1 => Ok(Box::new(SkipNoKey(opcode))),
            _ => Err(unknown()),
        },
        0xF => match opcode.kk() {
            0x07 => Ok(Box::new(ReadDelay(opcode))),
            0x0A => Ok(Box::new(WaitKey(opcode))),
            0x15 => Ok(Box::new(SetDelay(opcode))),
            0x18 => Ok(Box::new(SetSound(opcode))),
            0x1E => Ok(Box::new(AddIndex(opcode))),
            0x29 => Ok(Box::new(LdGlyph(opcode))),
            0x33 => Ok(Box::new(StoreBcd(opcode))),
            0x55 => Ok(Box::new(StoreRegs(opcode))),
            0x65 => Ok(Box::new(LoadRegs(opcode))),
            _ => Err(unknown()),
        },
        _ => Err(unknown()),
    }
}

/// 00E0: clear the display.
struct Cls;
impl Instruction for Cls {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.framebuffer.clear();
        Ok(())
    }
}

/// 00EE: return from a subroutine.
struct Ret;
impl Instruction for Ret {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let addr = machine.pop()?;
        machine.set_pc(addr);
        Ok(())
    }
}

/// 1nnn: jump.
struct Jp(Opcode);
impl Instruction for Jp {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.set_pc(self.0.nnn());
        Ok(())
    }
}

/// 2nnn: call a subroutine.
struct Call(Opcode);
impl Instruction for Call {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.push(machine.pc)?;
        machine.set_pc(self.0.nnn());
        Ok(())
    }
}

/// 3xkk: skip the next instruction if Vx == kk.
struct SeImm(Opcode);
impl Instruction for SeImm {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        if machine.v[self.0.x()] == self.0.kk() {
            machine.pc += 2;
        }
        Ok(())
    }
}

/// 4xkk: skip the next instruction if Vx != kk.
struct SneImm(Opcode);
impl Instruction for SneImm {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        if machine.v[self.0.x()] != self.0.kk() {
            machine.pc += 2;
        }
        Ok(())
    }
}

/// 5xy0: skip the next instruction if Vx == Vy.
struct SeReg(Opcode);
impl Instruction for SeReg {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        if machine.v[self.0.x()] == machine.v[self.0.y()] {
            machine.pc += 2;
        }
        Ok(())
    }
}

/// 9xy0: skip the next instruction if Vx != Vy.
struct SneReg(Opcode);
impl Instruction for SneReg {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        if machine.v[self.0.x()] != machine.v[self.0.y()] {
            machine.pc += 2;
        }
        Ok(())
    }
}

/// 6xkk: Vx := kk.
struct LdImm(Opcode);
impl Instruction for LdImm {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] = self.0.kk();
        Ok(())
    }
}

/// 7xkk: Vx := Vx + kk, wrapping, no flag.
struct AddImm(Opcode);
impl Instruction for AddImm {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let x = self.0.x();
        machine.v[x] = machine.v[x].wrapping_add(self.0.kk());
        Ok(())
    }
}

/// 8xy0: Vx := Vy.
struct Mov(Opcode);
impl Instruction for Mov {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] = machine.v[self.0.y()];
        Ok(())
    }
}

/// 8xy1: Vx := Vx | Vy.
struct Or(Opcode);
impl Instruction for Or {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] |= machine.v[self.0.y()];
        Ok(())
    }
}

/// 8xy2: Vx := Vx & Vy.
struct And(Opcode);
impl Instruction for And {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] &= machine.v[self.0.y()];
        Ok(())
    }
}

/// 8xy3: Vx := Vx ^ Vy.
struct Xor(Opcode);
impl Instruction for Xor {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] ^= machine.v[self.0.y()];
        Ok(())
    }
}

/// 8xy4: Vx := Vx + Vy, VF := carry.
struct AddReg(Opcode);
impl Instruction for AddReg {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let (sum, carried) = machine.v[self.0.x()].overflowing_add(machine.v[self.0.y()]);
        machine.v[self.0.x()] = sum;
        machine.v[VF] = u8::from(carried);
        Ok(())
    }
}

/// 8xy5: Vx := Vx - Vy, wrapping; VF := 1 on no borrow.
struct SubReg(Opcode);
impl Instruction for SubReg {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let (diff, borrowed) = machine.v[self.0.x()].overflowing_sub(machine.v[self.0.y()]);
        machine.v[self.0.x()] = diff;
        machine.v[VF] = u8::from(!borrowed);
        Ok(())
    }
}

/// 8xy7: Vx := Vy - Vx, wrapping; VF := 1 on no borrow.
struct SubFrom(Opcode);
impl Instruction for SubFrom {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let (diff, borrowed) = machine.v[self.0.y()].overflowing_sub(machine.v[self.0.x()]);
        machine.v[self.0.x()] = diff;
        machine.v[VF] = u8::from(!borrowed);
        Ok(())
    }
}

/// 8xy6: VF := low bit of Vx, Vx := Vx >> 1.
struct Shr(Opcode);
impl Instruction for Shr {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let vx = machine.v[self.0.x()];
        machine.v[self.0.x()] = vx >> 1;
        machine.v[VF] = vx & 0x01;
        Ok(())
    }
}

/// 8xyE: VF := high bit of Vx (un-normalized), Vx := Vx << 1.
struct Shl(Opcode);
impl Instruction for Shl {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let vx = machine.v[self.0.x()];
        machine.v[self.0.x()] = vx << 1;
        machine.v[VF] = vx & 0x80;
        Ok(())
    }
}

/// Annn: I := nnn.
struct LdIndex(Opcode);
impl Instruction for LdIndex {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.set_index(self.0.nnn());
        Ok(())
    }
}

/// Bnnn: PC := V0 + nnn. V0 is added to the masked address field only.
struct JpOffset(Opcode);
impl Instruction for JpOffset {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.set_pc(usize::from(machine.v[0x0]) + self.0.nnn());
        Ok(())
    }
}

/// Cxkk: Vx := random byte & kk.
struct Rnd(Opcode);
impl Instruction for Rnd {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] = rand::random::<u8>() & self.0.kk();
        Ok(())
    }
}

/// Dxyn: draw the n-row sprite at memory[I..] at (Vx, Vy); VF := collision.
struct Drw(Opcode);
impl Instruction for Drw {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let x = usize::from(machine.v[self.0.x()]);
        let y = usize::from(machine.v[self.0.y()]);
        let sprite = machine.memory.sprite(machine.index, self.0.n())?;
        let collision = machine.framebuffer.draw_sprite(x, y, sprite);
        machine.v[VF] = u8::from(collision);
        Ok(())
    }
}

/// Ex9E: skip the next instruction if key Vx is down.
struct SkipKey(Opcode);
impl Instruction for SkipKey {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        if machine.keypad.is_pressed(key_index(machine, self.0.x())?) {
            machine.pc += 2;
        }
        Ok(())
    }
}

/// ExA1: skip the next instruction if key Vx is up.
struct SkipNoKey(Opcode);
impl Instruction for SkipNoKey {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        if !machine.keypad.is_pressed(key_index(machine, self.0.x())?) {
            machine.pc += 2;
        }
        Ok(())
    }
}

fn key_index(machine: &Machine, x: usize) -> Result<u8, VmError> {
    let key = machine.v[x];
    if key > 0xF {
        return Err(VmError::InvalidKey { index: key });
    }
    Ok(key)
}

/// Fx07: Vx := delay timer.
struct ReadDelay(Opcode);
impl Instruction for ReadDelay {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.v[self.0.x()] = machine.timers.delay;
        Ok(())
    }
}

/// Fx0A: suspend until a key press lands in Vx.
struct WaitKey(Opcode);
impl Instruction for WaitKey {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.await_key(self.0.x());
        Ok(())
    }
}

/// Fx15: delay timer := Vx.
struct SetDelay(Opcode);
impl Instruction for SetDelay {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.timers.delay = machine.v[self.0.x()];
        Ok(())
    }
}

/// Fx18: sound timer := Vx.
struct SetSound(Opcode);
impl Instruction for SetSound {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.timers.sound = machine.v[self.0.x()];
        Ok(())
    }
}

/// Fx1E: I := (I + Vx) & 0xFFF; VF := 1 iff the unmasked sum overflows the
/// address space.
struct AddIndex(Opcode);
impl Instruction for AddIndex {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let sum = machine.index + usize::from(machine.v[self.0.x()]);
        machine.v[VF] = u8::from(sum > 0xFFF);
        machine.set_index(sum);
        Ok(())
    }
}

/// Fx29: I := font glyph address for the digit in Vx.
struct LdGlyph(Opcode);
impl Instruction for LdGlyph {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        machine.set_index(Memory::glyph_addr(machine.v[self.0.x()]));
        Ok(())
    }
}

/// Fx33: the three decimal digits of Vx, most significant first, at I..I+2.
struct StoreBcd(Opcode);
impl Instruction for StoreBcd {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        let vx = machine.v[self.0.x()];
        let digits = [vx / 100, (vx / 10) % 10, vx % 10];
        for (offset, digit) in digits.into_iter().enumerate() {
            machine.memory.write(machine.index + offset, digit)?;
        }
        Ok(())
    }
}

/// Fx55: store V0..=Vx at I. The index register is left unchanged.
struct StoreRegs(Opcode);
impl Instruction for StoreRegs {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        for i in 0..=self.0.x() {
            machine.memory.write(machine.index + i, machine.v[i])?;
        }
        Ok(())
    }
}

/// Fx65: load V0..=Vx from I. The index register is left unchanged.
struct LoadRegs(Opcode);
impl Instruction for LoadRegs {
    fn execute(&self, machine: &mut Machine) -> Result<(), VmError> {
        for i in 0..=self.0.x() {
            machine.v[i] = machine.memory.read(machine.index + i)?;
        }
        Ok(())
    }
}
