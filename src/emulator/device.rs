use std::io::{self, Read, Write};

use crate::emulator::Word;

/// Paper tape reader and punch.
pub mod tape;

pub use tape::{TapeReader, TapeWriter};

/// Milliseconds a tape drive stays busy after a transfer has been started.
pub const TAPE_LATENCY_MS: u64 = 150;

/// A memory-mapped device.
///
/// A device never owns memory. Each hook is handed the cells of the region the device is mapped
/// to, i.e. `cells[0]` is the word at the region's base address, and may inspect or modify them.
/// All hooks default to doing nothing.
pub trait Device {
    /// Called before the word at `offset` is read, so the device can update what is about to be
    /// read.
    fn on_read(&mut self, _cells: &mut [Word], _offset: usize) {}

    /// Called after `cells[offset]` has been overwritten.
    fn on_write(&mut self, _cells: &mut [Word], _offset: usize) {}

    /// Called once per clock tick.
    fn on_tick(&mut self, _cells: &mut [Word]) {}

    /// Pushes out any buffered output.
    fn flush(&mut self) {}
}

/// A device which ignores writes, so its cells always read as zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dummy;

impl Device for Dummy {
    fn on_write(&mut self, cells: &mut [Word], offset: usize) {
        cells[offset] = 0;
    }
}

/// Number of clock ticks a tape transfer takes at the given clock frequency.
pub fn busy_ticks(frequency: u32) -> u64 {
    (frequency as u64 * TAPE_LATENCY_MS).div_ceil(1000)
}

/// The byte streams backing the tape reader, the tape punch and the printer.
pub struct Peripherals {
    pub tape_in: Box<dyn Read>,
    pub tape_out: Box<dyn Write>,
    pub printer: Box<dyn Write>,
}

impl Peripherals {
    pub fn new(tape_in: Box<dyn Read>, tape_out: Box<dyn Write>, printer: Box<dyn Write>) -> Self {
        Self {
            tape_in,
            tape_out,
            printer,
        }
    }

    /// Reader on standard input, punch on standard output and printer on standard error.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(io::stdin()),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    /// An empty tape in the reader and all output discarded.
    pub fn detached() -> Self {
        Self::new(Box::new(io::empty()), Box::new(io::sink()), Box::new(io::sink()))
    }
}

impl std::fmt::Debug for Peripherals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peripherals").finish_non_exhaustive()
    }
}
