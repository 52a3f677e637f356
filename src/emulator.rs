use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use thiserror::Error;

use crate::{
    emulator::{
        clock::{Clock, ClockConfig, ClockError},
        cpu::{Cpu, Registers, Step},
        device::Peripherals,
        memory::Memory,
        trace::Tracer,
    },
    rom::Rom,
};

/// The arithmetic logic unit.
pub mod alu;
/// Pacing of the fetch-execute loop.
pub mod clock;
pub mod cpu;
/// Memory-mapped I/O devices.
pub mod device;
/// Instruction decoding and disassembly.
pub mod instruction;
pub mod memory;
/// Per-instruction execution trace.
pub mod trace;

/// The machine word. Used as an unsigned bit pattern or as a two's complement integer depending
/// on context.
pub type Word = u16;

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error("Unable to write trace: {0}")]
    Trace(#[source] std::io::Error),
}

/// A complete Hack computer: CPU, ROM, data memory with its devices and the clock driving it.
pub struct Emulator {
    cpu: Cpu,
    rom: Rom,
    memory: Memory,
    clock: Clock,
    tracer: Option<Tracer<Box<dyn Write>>>,
    /// Number of instructions started so far
    ticks: u64,
}

impl Emulator {
    /// Fails when `config` describes a clock that cannot be paced.
    #[tracing::instrument(skip(rom, peripherals))]
    pub fn new(
        rom: Rom,
        peripherals: Peripherals,
        config: ClockConfig,
    ) -> Result<Self, EmulatorError> {
        let clock = Clock::new(config)?;
        Ok(Self {
            cpu: Cpu::new(),
            rom,
            memory: Memory::new(peripherals, config),
            clock,
            tracer: None,
            ticks: 0,
        })
    }

    /// Records every instruction to `out`. The trace header is written immediately.
    pub fn with_tracer(mut self, out: Box<dyn Write>) -> Result<Self, EmulatorError> {
        self.tracer = Some(Tracer::new(out).map_err(EmulatorError::Trace)?);
        Ok(self)
    }

    pub fn is_tracing(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fetches, traces and executes one instruction, without pacing.
    pub fn step(&mut self) -> Result<Step, EmulatorError> {
        let registers = self.cpu.registers();
        let instruction = self.rom.fetch(registers.pc);

        if let Some(tracer) = self.tracer.as_mut() {
            tracer
                .record(self.ticks, &registers, instruction, &self.memory)
                .map_err(EmulatorError::Trace)?;
        }

        let step = self
            .cpu
            .execute(instruction, &self.rom, &mut self.memory);
        self.ticks += 1;

        Ok(step)
    }

    /// Runs the program until it halts, paced by the clock. Returns the final registers.
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) -> Result<Registers, EmulatorError> {
        self.clock.start();

        while self.step()? == Step::Continue {
            self.clock.wait()?;
        }

        self.memory.flush();

        if let Some(tracer) = self.tracer.as_mut() {
            tracer.flush().map_err(EmulatorError::Trace)?;
        }

        let registers = self.cpu.registers();
        tracing::info!(ticks = self.ticks, ?registers, "program halted");
        Ok(registers)
    }
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("cpu", &self.cpu)
            .field("ticks", &self.ticks)
            .field("tracing", &self.tracer.is_some())
            .finish_non_exhaustive()
    }
}

fn parse_scale(arg: &str) -> Result<f64, String> {
    let scale: f64 = arg.parse().map_err(|e| format!("{e}"))?;
    if !scale.is_finite() || scale < 0.0 {
        return Err(format!("must be a non-negative number, got {arg}"));
    }
    Ok(scale)
}

#[derive(clap::Args, Debug)]
pub struct EmulationArgs {
    #[clap(short, long, default_value_t = ClockConfig::DEFAULT_FREQUENCY)]
    #[clap(value_parser = clap::value_parser!(u32).range(1..))]
    #[clap(help = "Clock frequency in Hz")]
    pub frequency: u32,
    #[clap(short, long, default_value_t = ClockConfig::DEFAULT_SCALE)]
    #[clap(value_parser = parse_scale)]
    #[clap(help = "Time scale: 0 = as fast as possible, 1 = real time, 2 = half speed")]
    pub scale: f64,
    #[clap(short, long, value_name = "FILE")]
    #[clap(help = "Write an execution trace to FILE")]
    #[clap(long_help = "Write one tab-separated line per executed instruction to FILE,
showing the tick, PC, instruction (octal), A, D and RAM[0..5]
before the instruction executes.")]
    pub trace: Option<PathBuf>,
    #[clap(help = "ROM image to run, as produced by `hackem rom`")]
    pub rom: PathBuf,
}

/// Runs a ROM image with the devices attached to the standard streams. Returns the process exit
/// status: the low byte of D, or 0 when tracing.
pub fn emulate(args: &EmulationArgs) -> anyhow::Result<u8> {
    let rom = Rom::load(&args.rom)
        .with_context(|| format!("Unable to load ROM image {}", args.rom.display()))?;

    let config = ClockConfig {
        frequency: args.frequency,
        scale: args.scale,
    };
    let mut emulator = Emulator::new(rom, Peripherals::stdio(), config)?;

    if let Some(path) = &args.trace {
        let file = File::create(path)
            .with_context(|| format!("Unable to create trace file {}", path.display()))?;
        emulator = emulator.with_tracer(Box::new(BufWriter::new(file)))?;
    }

    let registers = emulator.run()?;

    if emulator.is_tracing() {
        return Ok(0);
    }
    Ok((registers.d & 0xff) as u8)
}
