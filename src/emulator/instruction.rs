use std::fmt;

use crate::emulator::Word;

/// Destination bits of a C-instruction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Dest(u8);

impl Dest {
    pub const M: u8 = 0b001;
    pub const D: u8 = 0b010;
    pub const A: u8 = 0b100;

    pub fn new(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn m(self) -> bool {
        self.0 & Self::M != 0
    }

    pub fn d(self) -> bool {
        self.0 & Self::D != 0
    }

    pub fn a(self) -> bool {
        self.0 & Self::A != 0
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a() {
            write!(f, "A")?;
        }
        if self.m() {
            write!(f, "M")?;
        }
        if self.d() {
            write!(f, "D")?;
        }
        Ok(())
    }
}

/// Jump condition bits of a C-instruction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Jump(u8);

impl Jump {
    pub const GT: u8 = 0b001;
    pub const EQ: u8 = 0b010;
    pub const LT: u8 = 0b100;

    pub fn new(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    pub fn is_unconditional(self) -> bool {
        self.0 == 0b111
    }

    /// Whether the jump is taken for the given ALU result, interpreted as signed.
    pub fn is_taken(self, result: Word) -> bool {
        let result = result as i16;
        (self.0 & Self::GT != 0 && result > 0)
            || (self.0 & Self::EQ != 0 && result == 0)
            || (self.0 & Self::LT != 0 && result < 0)
    }

    fn mnemonic(self) -> Option<&'static str> {
        match self.0 {
            0b000 => None,
            0b001 => Some("JGT"),
            0b010 => Some("JEQ"),
            0b011 => Some("JGE"),
            0b100 => Some("JLT"),
            0b101 => Some("JNE"),
            0b110 => Some("JLE"),
            _ => Some("JMP"),
        }
    }
}

/// A decoded Hack instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `@value`: load a 15-bit constant into A.
    Address(Word),
    /// `dest=comp;jump`
    Compute {
        /// Use `M`, i.e. `RAM[A]`, instead of `A` as the second ALU operand.
        memory: bool,
        /// ALU control bits `zx nx zy ny f no`.
        comp: u8,
        dest: Dest,
        jump: Jump,
    },
}

impl Instruction {
    const COMPUTE: Word = 0x8000;

    pub fn decode(word: Word) -> Self {
        if word & Self::COMPUTE == 0 {
            return Instruction::Address(word);
        }

        Instruction::Compute {
            memory: word & 0x1000 != 0,
            comp: ((word >> 6) & 0b11_1111) as u8,
            dest: Dest::new(((word >> 3) & 0b111) as u8),
            jump: Jump::new((word & 0b111) as u8),
        }
    }

    /// Mnemonic of the computation, with `y` standing for the second ALU operand.
    fn comp_mnemonic(comp: u8) -> Option<&'static str> {
        let mnemonic = match comp {
            0b101010 => "0",
            0b111111 => "1",
            0b111010 => "-1",
            0b001100 => "D",
            0b110000 => "y",
            0b001101 => "!D",
            0b110001 => "!y",
            0b001111 => "-D",
            0b110011 => "-y",
            0b011111 => "D+1",
            0b110111 => "y+1",
            0b001110 => "D-1",
            0b110010 => "y-1",
            0b000010 => "D+y",
            0b010011 => "D-y",
            0b000111 => "y-D",
            0b000000 => "D&y",
            0b010101 => "D|y",
            _ => return None,
        };
        Some(mnemonic)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Address(value) => write!(f, "@{}", value),
            Instruction::Compute {
                memory,
                comp,
                dest,
                jump,
            } => {
                if !dest.is_empty() {
                    write!(f, "{}=", dest)?;
                }

                match Instruction::comp_mnemonic(comp) {
                    Some(mnemonic) => {
                        let y = if memory { "M" } else { "A" };
                        write!(f, "{}", mnemonic.replace('y', y))?
                    }
                    None => write!(f, "{}{:06b}", if memory { "M:" } else { "A:" }, comp)?,
                }

                match jump.mnemonic() {
                    Some(mnemonic) => write!(f, ";{}", mnemonic),
                    None => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode() {
        let tests = vec![
            (0b0000_0000_0000_0101, Instruction::Address(5)),
            (0b0111_1111_1111_1111, Instruction::Address(0x7fff)),
            (
                0b111_1_110111_101_000,
                Instruction::Compute {
                    memory: true,
                    comp: 0b110111,
                    dest: Dest::new(Dest::A | Dest::M),
                    jump: Jump::default(),
                },
            ),
            (
                0b111_0_101010_000_111,
                Instruction::Compute {
                    memory: false,
                    comp: 0b101010,
                    dest: Dest::default(),
                    jump: Jump::new(0b111),
                },
            ),
        ];

        for (word, expected) in tests {
            assert_eq!(Instruction::decode(word), expected, "{:016b}", word);
        }
    }

    #[test]
    fn test_display() {
        let tests = vec![
            (0b0000_0000_0000_0101, "@5"),
            (0b111_1_110111_101_000, "AM=M+1"),
            (0b111_0_101010_000_111, "0;JMP"),
            (0b111_0_001100_000_001, "D;JGT"),
            (0b111_0_110000_010_000, "D=A"),
            (0b111_1_000010_011_000, "MD=D+M"),
            (0b111_0_010011_111_110, "AMD=D-A;JLE"),
            (0b111_0_100000_010_000, "D=A:100000"),
        ];

        for (word, expected) in tests {
            assert_eq!(Instruction::decode(word).to_string(), expected);
        }
    }

    #[test]
    fn test_jump_conditions() {
        let tests = vec![
            ("JGT", 0b001, [false, false, true]),
            ("JEQ", 0b010, [false, true, false]),
            ("JGE", 0b011, [false, true, true]),
            ("JLT", 0b100, [true, false, false]),
            ("JNE", 0b101, [true, false, true]),
            ("JLE", 0b110, [true, true, false]),
            ("JMP", 0b111, [true, true, true]),
            ("none", 0b000, [false, false, false]),
        ];

        for (name, bits, expected) in tests {
            let jump = Jump::new(bits);
            // negative, zero, positive
            let actual = [0x8000, 0, 0x7fff].map(|result| jump.is_taken(result));
            assert_eq!(actual, expected, "{}", name);
        }
    }
}
