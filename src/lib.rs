//! Emulator for the Hack computer, extended with a paper tape reader, a tape punch and a
//! printer.

/// Hack computer emulator
pub mod emulator;

/// Conversion between `.hack` text and ROM images
pub mod converter;

/// ROM image loading
pub mod rom;

/// Chrome tracing of the emulator itself
pub mod instrumentation;
