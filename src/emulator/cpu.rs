use crate::{
    emulator::{
        alu::alu,
        instruction::{Dest, Instruction, Jump},
        memory::Memory,
        Word,
    },
    rom::Rom,
};

pub mod registers;

pub use registers::{Register, Registers};

/// Outcome of executing a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The program has entered one of the idiomatic end-of-program loops.
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOption {
    /// Run until the program halts.
    UntilHalt,
    /// Run until the program halts, but at most the given number of instructions.
    MaxSteps(usize),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cpu {
    registers: Registers,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registers(&self) -> Registers {
        self.registers
    }

    pub fn register(&self, register: Register) -> Word {
        self.registers.get(register)
    }

    pub fn program_counter(&self) -> Word {
        self.registers.pc
    }

    /// Fetches the instruction at the program counter and executes it.
    pub fn step(&mut self, rom: &Rom, memory: &mut Memory) -> Step {
        let instruction = rom.fetch(self.registers.pc);
        self.execute(instruction, rom, memory)
    }

    /// Executes one instruction word and ticks the devices. On halt the program counter stays on
    /// the halting jump and no tick happens.
    pub fn execute(&mut self, instruction: Word, rom: &Rom, memory: &mut Memory) -> Step {
        match Instruction::decode(instruction) {
            Instruction::Address(value) => self.registers.a = value,
            Instruction::Compute {
                memory: use_memory,
                comp,
                dest,
                jump,
            } => {
                // Jumps and M writes use A as it was before this instruction
                let target = self.registers.a;

                let y = if use_memory {
                    memory.read(target)
                } else {
                    target
                };
                let result = alu(self.registers.d, y, comp);

                if dest.m() {
                    memory.write(target, result);
                }
                if dest.d() {
                    self.registers.d = result;
                }
                if dest.a() {
                    self.registers.a = result;
                }

                if self.is_halt_loop(dest, jump, target, rom) {
                    tracing::debug!(pc = self.registers.pc, "halt");
                    return Step::Halt;
                }

                if jump.is_taken(result) {
                    self.registers.pc = target.wrapping_sub(1);
                }
            }
        }

        self.registers.pc = self.registers.pc.wrapping_add(1);
        memory.tick();

        Step::Continue
    }

    /// Recognizes the two ways of ending a program, an unconditional jump without assignment
    /// which leads (a) directly to itself or (b) to the preceding instruction which loads its
    /// own address:
    ///
    /// ```text
    ///   (a)  @END      (b)  (END)
    ///        (END)          @END
    ///        0;JMP          0;JMP
    /// ```
    fn is_halt_loop(&self, dest: Dest, jump: Jump, target: Word, rom: &Rom) -> bool {
        let pc = self.registers.pc;
        dest.is_empty()
            && jump.is_unconditional()
            && (target == pc || (target == pc.wrapping_sub(1) && rom.fetch(target) == target))
    }

    /// Runs the program without any pacing. Returns the number of instructions executed,
    /// including the halting one.
    pub fn run(&mut self, rom: &Rom, memory: &mut Memory, option: RunOption) -> usize {
        let mut steps = 0;
        loop {
            if let RunOption::MaxSteps(max) = option {
                if steps >= max {
                    return steps;
                }
            }

            steps += 1;
            if self.step(rom, memory) == Step::Halt {
                return steps;
            }
        }
    }
}
