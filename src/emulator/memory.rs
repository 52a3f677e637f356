use crate::emulator::{
    clock::ClockConfig,
    device::{Device, Dummy, Peripherals, TapeReader, TapeWriter},
    Word,
};

/// Address regions and the memory map.
pub mod map;

pub use map::{Region, RegionKind, MEMORY_MAP};

/// A region of the memory map together with the device attached to it.
struct Slot {
    region: Region,
    device: Option<Box<dyn Device>>,
}

/// The data memory of the Hack computer including its memory-mapped devices.
///
/// All accesses go through the memory map: reads and writes to a region with a device attached
/// call into that device, accesses outside every region are ignored.
pub struct Memory {
    ram: Box<[Word]>,
    slots: Vec<Slot>,
    /// Index into `slots` for every RAM address, resolved once up front
    lookup: Box<[Option<u8>]>,
}

impl Memory {
    /// Number of words of RAM, including the I/O space.
    pub const RAM_SIZE: usize = 32 * 1024;

    /// Builds the memory with its devices attached to the given streams. Tape latencies follow
    /// the clock frequency, and output is only flushed byte by byte when the clock is paced.
    #[tracing::instrument(skip(peripherals))]
    pub fn new(peripherals: Peripherals, clock: ClockConfig) -> Self {
        let frequency = clock.frequency;
        let flush_each_byte = clock.is_paced();

        let Peripherals {
            tape_in,
            tape_out,
            printer,
        } = peripherals;

        let mut tape_in = Some(tape_in);
        let mut tape_out = Some(tape_out);
        let mut printer = Some(printer);

        let slots = MEMORY_MAP
            .iter()
            .map(|region| {
                let device: Option<Box<dyn Device>> = match region.kind {
                    RegionKind::Ram | RegionKind::Screen => None,
                    RegionKind::Keyboard => Some(Box::new(Dummy)),
                    RegionKind::TapeReader => tape_in.take().map(|source| -> Box<dyn Device> {
                        Box::new(TapeReader::new(source, frequency))
                    }),
                    RegionKind::TapePunch => tape_out.take().map(|sink| -> Box<dyn Device> {
                        Box::new(TapeWriter::new(sink, frequency).flush_each_byte(flush_each_byte))
                    }),
                    RegionKind::Printer => printer.take().map(|sink| -> Box<dyn Device> {
                        Box::new(TapeWriter::new(sink, frequency).flush_each_byte(flush_each_byte))
                    }),
                };
                if device.is_some() {
                    tracing::debug!(region = %region.kind, base = region.base, "attached device");
                }
                Slot {
                    region: *region,
                    device,
                }
            })
            .collect();

        let lookup = (0..Self::RAM_SIZE)
            .map(|address| map::find(address as Word).map(|index| index as u8))
            .collect();

        Self {
            ram: vec![0; Self::RAM_SIZE].into_boxed_slice(),
            slots,
            lookup,
        }
    }

    /// Finds the region `address` belongs to.
    pub fn lookup(&self, address: Word) -> Option<&Region> {
        self.slot_index(address)
            .map(|index| &self.slots[index].region)
    }

    fn slot_index(&self, address: Word) -> Option<usize> {
        self.lookup
            .get(address as usize)
            .copied()
            .flatten()
            .map(usize::from)
    }

    /// Reads a word, giving the device at `address` a chance to update it first. Unmapped
    /// addresses read as zero.
    pub fn read(&mut self, address: Word) -> Word {
        let Some(index) = self.slot_index(address) else {
            return 0;
        };

        let slot = &mut self.slots[index];
        let span = slot.region.span();
        let offset = slot.region.offset(address);
        if let Some(device) = slot.device.as_mut() {
            device.on_read(&mut self.ram[span], offset);
        }

        self.ram[address as usize]
    }

    /// Stores a word and then notifies the device at `address`, which may react to or replace
    /// the stored value. Writes to unmapped addresses are discarded.
    pub fn write(&mut self, address: Word, value: Word) {
        let Some(index) = self.slot_index(address) else {
            return;
        };

        self.ram[address as usize] = value;

        let slot = &mut self.slots[index];
        let span = slot.region.span();
        let offset = slot.region.offset(address);
        if let Some(device) = slot.device.as_mut() {
            device.on_write(&mut self.ram[span], offset);
        }
    }

    /// Advances every device by one clock tick, in memory map order.
    pub fn tick(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(device) = slot.device.as_mut() {
                device.on_tick(&mut self.ram[slot.region.span()]);
            }
        }
    }

    /// Flushes the output of every device.
    pub fn flush(&mut self) {
        for device in self.slots.iter_mut().filter_map(|slot| slot.device.as_mut()) {
            device.flush();
        }
    }

    /// Reads a word without involving any device. Addresses beyond the RAM read as zero.
    pub fn peek(&self, address: Word) -> Word {
        self.ram.get(address as usize).copied().unwrap_or(0)
    }

    /// Get a slice of the raw RAM contents
    pub fn slice(&self, start_address: usize, end_address: usize) -> &[Word] {
        &self.ram[start_address..end_address]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(Peripherals::detached(), ClockConfig::default())
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let regions: Vec<RegionKind> = self.slots.iter().map(|slot| slot.region.kind).collect();
        f.debug_struct("Memory")
            .field("regions", &regions)
            .finish_non_exhaustive()
    }
}
