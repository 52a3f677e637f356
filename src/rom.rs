use std::{fs, path::Path};

use thiserror::Error;

use crate::emulator::Word;

#[derive(Error, Debug)]
pub enum RomError {
    #[error("Unable to read ROM image: {0}")]
    Io(#[from] std::io::Error),
    #[error("ROM image has odd length ({0} bytes), it must consist of whole 16-bit words")]
    OddLength(usize),
    #[error("ROM image too large, got {actual} words while limit is {limit}")]
    TooLarge { actual: usize, limit: usize },
}

/// The instruction memory. Read-only once loaded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Rom {
    words: Vec<Word>,
}

impl Rom {
    /// Maximum number of words in a ROM image.
    pub const MAX_WORDS: usize = 32 * 1024;

    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Interprets `bytes` as words in machine byte order, as written by the converter.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RomError> {
        if bytes.len() % 2 != 0 {
            return Err(RomError::OddLength(bytes.len()));
        }

        let words = bytes.len() / 2;
        if words > Self::MAX_WORDS {
            return Err(RomError::TooLarge {
                actual: words,
                limit: Self::MAX_WORDS,
            });
        }

        Ok(Self::new(
            bytes
                .chunks_exact(2)
                .map(|pair| Word::from_ne_bytes([pair[0], pair[1]]))
                .collect(),
        ))
    }

    #[tracing::instrument]
    pub fn load(path: &Path) -> Result<Self, RomError> {
        let rom = Self::from_bytes(&fs::read(path)?)?;
        tracing::info!(words = rom.len(), "loaded ROM image");
        Ok(rom)
    }

    /// Returns the instruction at `address`. Addresses past the end of the image read as zero.
    pub fn fetch(&self, address: Word) -> Word {
        self.words.get(address as usize).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The image as it is stored on disk.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|word| word.to_ne_bytes()).collect()
    }
}

impl From<Vec<Word>> for Rom {
    fn from(words: Vec<Word>) -> Self {
        Self::new(words)
    }
}
