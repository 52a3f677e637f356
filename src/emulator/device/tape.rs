//! Paper tape devices.
//!
//! Both devices occupy two words. Programs talk to them purely by polling these words, the
//! devices never interrupt.
//!
//! # Reader
//!
//! Offset 0 holds the value under the read head. It is only meaningful once the control word
//! says so; a negative value means the end of the tape (or no tape at all). Writes to it have
//! no effect.
//!
//! Writing 1 to offset 1 advances the tape by one position. Offset 1 reads negative once the
//! value at offset 0 is valid.
//!
//! To acquire one byte of input:
//!
//! 1. Write 1 to offset 1.
//! 2. Read offset 1 until it is negative.
//! 3. Read offset 0; if it is negative, the input has ended.
//! 4. Otherwise the value at offset 0 is the input byte.
//!
//! # Punch
//!
//! Writing to offset 0 outputs the low byte of the written value and advances the tape. Reading
//! offset 1 yields a status word: bit 15 is set when the punch is in position for new output,
//! bit 14 is set when the tape has run out (in which case bit 15 is meaningless).
//!
//! To produce one byte of output:
//!
//! 1. Read offset 1 until it is negative.
//! 2. If bit 14 is set, report an error.
//! 3. Write the output byte to offset 0.

use std::io::{self, Read, Write};

use super::{busy_ticks, Device};
use crate::emulator::Word;

/// Offset of the data word.
pub const DATA: usize = 0;
/// Offset of the control/status word.
pub const STATUS: usize = 1;

/// Bit 15, set when the device is ready.
pub const READY: Word = 0x8000;
/// Bit 14 of the punch status word, set when the tape has run out.
pub const END_OF_TAPE: Word = 0x4000;
/// Value the reader places at the data offset once the input is exhausted.
pub const END_OF_INPUT: Word = 0x8000;

/// Command word which advances the reader by one position.
const ADVANCE: Word = 1;

/// Tape reader fed by a byte stream.
#[derive(Debug)]
pub struct TapeReader<R> {
    source: R,
    busy: u64,
    latency: u64,
}

impl<R: Read> TapeReader<R> {
    pub fn new(source: R, frequency: u32) -> Self {
        Self {
            source,
            busy: 0,
            latency: busy_ticks(frequency),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }

    /// Reads the next byte from the tape. Read errors are treated like the end of the tape.
    fn next_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return None,
                Ok(_) => return Some(byte[0]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(%err, "tape reader failed");
                    return None;
                }
            }
        }
    }
}

impl<R: Read> Device for TapeReader<R> {
    fn on_write(&mut self, cells: &mut [Word], offset: usize) {
        if offset != STATUS || self.is_busy() || cells[STATUS] != ADVANCE {
            return;
        }

        // Nothing valid under the read head until the tape has moved
        cells[DATA] = 0;
        cells[STATUS] = 0;
        self.busy = self.latency;
    }

    fn on_tick(&mut self, cells: &mut [Word]) {
        if self.busy == 0 {
            return;
        }

        self.busy -= 1;
        if self.busy == 0 {
            cells[DATA] = match self.next_byte() {
                Some(byte) => byte as Word,
                None => END_OF_INPUT,
            };
            cells[STATUS] = READY;
        }
    }
}

/// Tape punch (or printer) writing to a byte stream.
#[derive(Debug)]
pub struct TapeWriter<W> {
    sink: W,
    busy: u64,
    latency: u64,
    at_end: bool,
    flush_each_byte: bool,
}

impl<W: Write> TapeWriter<W> {
    pub fn new(sink: W, frequency: u32) -> Self {
        Self {
            sink,
            busy: 0,
            latency: busy_ticks(frequency),
            at_end: false,
            flush_each_byte: true,
        }
    }

    /// Whether every punched byte is flushed to the sink right away. Otherwise output is only
    /// flushed through [`Device::flush`].
    pub fn flush_each_byte(mut self, enabled: bool) -> Self {
        self.flush_each_byte = enabled;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }

    /// Whether the sink has failed and no further output is possible.
    pub fn at_end(&self) -> bool {
        self.at_end
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    fn punch(&mut self, byte: u8) {
        if self.at_end {
            return;
        }

        let mut result = self.sink.write_all(&[byte]);
        if self.flush_each_byte {
            result = result.and_then(|_| self.sink.flush());
        }
        if let Err(err) = result {
            tracing::warn!(%err, "tape punch failed, marking tape as ended");
            self.at_end = true;
        }
    }
}

impl<W: Write> Device for TapeWriter<W> {
    fn on_read(&mut self, cells: &mut [Word], offset: usize) {
        let mut status = 0;
        if offset == STATUS {
            if !self.is_busy() {
                status |= READY;
            }
            if self.at_end {
                status |= END_OF_TAPE;
            }
        } else if self.at_end {
            status |= READY;
        }
        cells[offset] = status;
    }

    fn on_write(&mut self, cells: &mut [Word], offset: usize) {
        if offset != DATA || self.is_busy() {
            return;
        }

        self.punch(cells[DATA] as u8);
        self.busy = self.latency;
    }

    fn on_tick(&mut self, _cells: &mut [Word]) {
        self.busy = self.busy.saturating_sub(1);
    }

    fn flush(&mut self) {
        if self.at_end {
            return;
        }
        if let Err(err) = self.sink.flush() {
            tracing::warn!(%err, "tape punch failed to flush, marking tape as ended");
            self.at_end = true;
        }
    }
}
