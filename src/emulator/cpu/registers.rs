use crate::emulator::Word;

#[derive(Debug)]
pub enum Register {
    A,
    D,
    PC,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Address register, also used as a general purpose register
    pub a: Word,
    /// Data register
    pub d: Word,
    /// Program counter, indexes the ROM
    pub pc: Word,
}

impl Registers {
    pub fn get(&self, register: Register) -> Word {
        match register {
            Register::A => self.a,
            Register::D => self.d,
            Register::PC => self.pc,
        }
    }
}
