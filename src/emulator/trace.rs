use std::io::{self, Write};

use crate::emulator::{cpu::Registers, memory::Memory, Word};

/// Number of low RAM words shown in every trace row. By convention these are the VM's stack
/// and segment pointers.
pub const TRACED_WORDS: usize = 5;

const HEADER: &str = "T\tPC\tinstr.\tA\tD\tR0/SP\tR1/LCL\tR2/ARG\tR3/THIS\tR4/THAT";

/// Writes one tab-separated row per executed instruction, showing the machine state right
/// before the instruction executes.
#[derive(Debug)]
pub struct Tracer<W: Write> {
    out: W,
}

impl<W: Write> Tracer<W> {
    /// Creates the tracer and writes the column header.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{}", HEADER)?;
        Ok(Self { out })
    }

    /// Records the state at tick `tick`. Register and memory values are shown as signed decimals,
    /// the instruction in octal.
    pub fn record(
        &mut self,
        tick: u64,
        registers: &Registers,
        instruction: Word,
        memory: &Memory,
    ) -> io::Result<()> {
        write!(
            self.out,
            "{}\t{}\t{:06o}\t{}\t{}",
            tick, registers.pc, instruction, registers.a as i16, registers.d as i16
        )?;
        for address in 0..TRACED_WORDS as Word {
            write!(self.out, "\t{}", memory.peek(address) as i16)?;
        }
        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_header() {
        let tracer = Tracer::new(Vec::new()).unwrap();
        assert_eq!(
            String::from_utf8(tracer.into_inner()).unwrap(),
            "T\tPC\tinstr.\tA\tD\tR0/SP\tR1/LCL\tR2/ARG\tR3/THIS\tR4/THAT\n"
        );
    }

    #[test]
    fn test_record() {
        let mut memory = Memory::default();
        memory.write(0, 256);
        memory.write(1, 0xffff);
        memory.write(4, 3000);
        memory.write(5, 99);

        let registers = Registers {
            a: 0x8000,
            d: 42,
            pc: 17,
        };

        let mut tracer = Tracer::new(Vec::new()).unwrap();
        tracer
            .record(3, &registers, 0b111_0_110000_010_000, &memory)
            .unwrap();

        let output = String::from_utf8(tracer.into_inner()).unwrap();
        let rows: Vec<&str> = output.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "3\t17\t166020\t-32768\t42\t256\t-1\t0\t0\t3000");
    }
}
