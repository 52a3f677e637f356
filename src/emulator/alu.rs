use crate::emulator::Word;

/// Force x to zero.
pub const ZX: u8 = 0b10_0000;
/// Complement x.
pub const NX: u8 = 0b01_0000;
/// Force y to zero.
pub const ZY: u8 = 0b00_1000;
/// Complement y.
pub const NY: u8 = 0b00_0100;
/// Select addition (set) or bitwise and (clear).
pub const F: u8 = 0b00_0010;
/// Complement the output.
pub const NO: u8 = 0b00_0001;

/// The combinational arithmetic/logic unit.
///
/// `control` holds the six control bits `zx nx zy ny f no`, high to low. Every one of the 64
/// codes is defined; only the low six bits of `control` are looked at.
pub fn alu(x: Word, y: Word, control: u8) -> Word {
    let mut x = x;
    let mut y = y;

    if control & ZX != 0 {
        x = 0;
    }
    if control & NX != 0 {
        x = !x;
    }
    if control & ZY != 0 {
        y = 0;
    }
    if control & NY != 0 {
        y = !y;
    }

    let out = if control & F != 0 {
        x.wrapping_add(y)
    } else {
        x & y
    };

    if control & NO != 0 {
        !out
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    const OPERANDS: [Word; 5] = [0, 1, 0xffff, 0x7fff, 0x8000];

    /// Straightforward restatement of the truth table, one bit at a time.
    fn reference(x: Word, y: Word, control: u8) -> Word {
        let bit = |n: u8| (control >> n) & 1 == 1;
        let x = if bit(5) { 0 } else { x };
        let x = if bit(4) { x ^ 0xffff } else { x };
        let y = if bit(3) { 0 } else { y };
        let y = if bit(2) { y ^ 0xffff } else { y };
        let out = if bit(1) {
            ((x as u32 + y as u32) & 0xffff) as Word
        } else {
            x & y
        };
        if bit(0) {
            out ^ 0xffff
        } else {
            out
        }
    }

    #[test]
    fn test_all_control_codes() {
        for control in 0..64u8 {
            for x in OPERANDS {
                for y in OPERANDS {
                    assert_eq!(
                        alu(x, y, control),
                        reference(x, y, control),
                        "control={:06b} x={:#06x} y={:#06x}",
                        control,
                        x,
                        y
                    );
                }
            }
        }
    }

    #[test]
    fn test_standard_computations() {
        struct TestCase {
            name: &'static str,
            control: u8,
            x: Word,
            y: Word,
            expected: Word,
        }

        let tests = vec![
            TestCase { name: "0", control: 0b101010, x: 7, y: 9, expected: 0 },
            TestCase { name: "1", control: 0b111111, x: 7, y: 9, expected: 1 },
            TestCase { name: "-1", control: 0b111010, x: 7, y: 9, expected: 0xffff },
            TestCase { name: "x", control: 0b001100, x: 7, y: 9, expected: 7 },
            TestCase { name: "y", control: 0b110000, x: 7, y: 9, expected: 9 },
            TestCase { name: "!x", control: 0b001101, x: 7, y: 9, expected: !7 },
            TestCase { name: "-x", control: 0b001111, x: 7, y: 9, expected: (-7i16) as Word },
            TestCase { name: "x+1", control: 0b011111, x: 7, y: 9, expected: 8 },
            TestCase { name: "y-1", control: 0b110010, x: 7, y: 9, expected: 8 },
            TestCase { name: "x+y", control: 0b000010, x: 7, y: 9, expected: 16 },
            TestCase { name: "x-y", control: 0b010011, x: 7, y: 9, expected: (-2i16) as Word },
            TestCase { name: "y-x", control: 0b000111, x: 7, y: 9, expected: 2 },
            TestCase { name: "x&y", control: 0b000000, x: 0b1100, y: 0b1010, expected: 0b1000 },
            TestCase { name: "x|y", control: 0b010101, x: 0b1100, y: 0b1010, expected: 0b1110 },
        ];

        for tc in tests {
            assert_eq!(alu(tc.x, tc.y, tc.control), tc.expected, "{}", tc.name);
        }
    }

    #[test]
    fn test_addition_wraps() {
        assert_eq!(alu(0x7fff, 1, 0b000010), 0x8000);
        assert_eq!(alu(0xffff, 1, 0b000010), 0);
        assert_eq!(alu(0x8000, 0x8000, 0b000010), 0);
    }
}
