use std::ops::Range;

use crate::emulator::Word;

/// Mask with the low `n` bits clear.
const fn mask(n: u32) -> Word {
    Word::MAX << n
}

/// The regions of the address space, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::EnumIter)]
pub enum RegionKind {
    Ram,
    Screen,
    Keyboard,
    TapeReader,
    TapePunch,
    Printer,
}

impl RegionKind {
    /// Base address of the region.
    pub const fn base(self) -> Word {
        match self {
            RegionKind::Ram => 0x0000,
            RegionKind::Screen => 0x4000,
            RegionKind::Keyboard => 0x6000,
            RegionKind::TapeReader => 0x7000,
            RegionKind::TapePunch => 0x7002,
            RegionKind::Printer => 0x7004,
        }
    }

    /// Address bits which must equal the base for an address to fall into the region.
    pub const fn mask(self) -> Word {
        match self {
            RegionKind::Ram => mask(14),
            RegionKind::Screen => mask(13),
            RegionKind::Keyboard => mask(0),
            RegionKind::TapeReader | RegionKind::TapePunch | RegionKind::Printer => mask(1),
        }
    }
}

/// A mask-aligned slice of the address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    pub base: Word,
    pub mask: Word,
}

impl Region {
    pub const fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            base: kind.base(),
            mask: kind.mask(),
        }
    }

    pub fn contains(&self, address: Word) -> bool {
        address & self.mask == self.base
    }

    /// Offset of `address` from the base of the region.
    pub fn offset(&self, address: Word) -> usize {
        (address & !self.mask) as usize
    }

    /// Number of words covered.
    pub fn len(&self) -> usize {
        (!self.mask) as usize + 1
    }

    /// RAM indices covered by the region.
    pub fn span(&self) -> Range<usize> {
        let base = self.base as usize;
        base..base + self.len()
    }
}

/// The memory map. The first matching entry wins, although no two entries overlap.
pub const MEMORY_MAP: [Region; 6] = [
    Region::new(RegionKind::Ram),
    Region::new(RegionKind::Screen),
    Region::new(RegionKind::Keyboard),
    Region::new(RegionKind::TapeReader),
    Region::new(RegionKind::TapePunch),
    Region::new(RegionKind::Printer),
];

/// Scans the map for the region containing `address`.
pub fn find(address: Word) -> Option<usize> {
    MEMORY_MAP.iter().position(|region| region.contains(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn test_map_follows_declaration_order() {
        let kinds: Vec<RegionKind> = MEMORY_MAP.iter().map(|region| region.kind).collect();
        assert_eq!(kinds, RegionKind::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_region_sizes() {
        let sizes: Vec<(RegionKind, usize)> = MEMORY_MAP
            .iter()
            .map(|region| (region.kind, region.len()))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (RegionKind::Ram, 16384),
                (RegionKind::Screen, 8192),
                (RegionKind::Keyboard, 1),
                (RegionKind::TapeReader, 2),
                (RegionKind::TapePunch, 2),
                (RegionKind::Printer, 2),
            ]
        );
    }

    #[test]
    fn test_regions_are_disjoint() {
        for address in 0..=Word::MAX {
            let claims = MEMORY_MAP
                .iter()
                .filter(|region| region.contains(address))
                .count();
            assert!(claims <= 1, "{:#06x} claimed {} times", address, claims);
        }
    }

    #[test]
    fn test_find() {
        struct TestCase {
            address: Word,
            expected: Option<RegionKind>,
        }

        let tests = vec![
            TestCase { address: 0, expected: Some(RegionKind::Ram) },
            TestCase { address: 16383, expected: Some(RegionKind::Ram) },
            TestCase { address: 16384, expected: Some(RegionKind::Screen) },
            TestCase { address: 24575, expected: Some(RegionKind::Screen) },
            TestCase { address: 24576, expected: Some(RegionKind::Keyboard) },
            TestCase { address: 24577, expected: None },
            TestCase { address: 28671, expected: None },
            TestCase { address: 28672, expected: Some(RegionKind::TapeReader) },
            TestCase { address: 28673, expected: Some(RegionKind::TapeReader) },
            TestCase { address: 28674, expected: Some(RegionKind::TapePunch) },
            TestCase { address: 28675, expected: Some(RegionKind::TapePunch) },
            TestCase { address: 28676, expected: Some(RegionKind::Printer) },
            TestCase { address: 28677, expected: Some(RegionKind::Printer) },
            TestCase { address: 28678, expected: None },
            TestCase { address: 32767, expected: None },
            TestCase { address: 32768, expected: None },
            TestCase { address: 0xffff, expected: None },
        ];

        for tc in tests {
            let kind = find(tc.address).map(|index| MEMORY_MAP[index].kind);
            assert_eq!(kind, tc.expected, "address {}", tc.address);
        }
    }

    #[test]
    fn test_offset() {
        let printer = Region::new(RegionKind::Printer);
        assert_eq!(printer.offset(0x7004), 0);
        assert_eq!(printer.offset(0x7005), 1);
        assert_eq!(printer.span(), 0x7004..0x7006);
    }
}
