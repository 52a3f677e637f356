//! Conversion between `.hack` text and ROM images.
//!
//! A `.hack` file holds one instruction per line, written as exactly sixteen binary digits with
//! the most significant bit first:
//!
//! ```text
//! 0000000000000101   # @5
//! 1110110000010000   # D=A
//! ```
//!
//! Spaces, tabs and blank lines are ignored and `#` starts a comment running to the end of the
//! line. Each instruction becomes one word of the image, stored in machine byte order.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::Context;
use thiserror::Error;

use crate::{
    emulator::{instruction::Instruction, Word},
    rom::Rom,
};

/// Number of digits of an instruction line.
pub const DIGITS: usize = Word::BITS as usize;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("line {line}: expected '0' or '1', found {found:?}")]
    UnexpectedCharacter { line: usize, found: char },
    #[error("line {line}: wrong number of digits (must be 16), found {count}")]
    WrongDigitCount { line: usize, count: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Scans `.hack` text and hands every complete instruction word to `emit`, in order. Returns the
/// number of words emitted. Words emitted before an error stay emitted.
fn scan<R: Read>(
    input: R,
    mut emit: impl FnMut(Word) -> io::Result<()>,
) -> Result<usize, ConvertError> {
    let mut line = 1;
    let mut digits = 0;
    let mut word: Word = 0;
    let mut in_comment = false;
    let mut emitted = 0;

    let mut end_of_line = |line: usize, digits: usize, word: Word| -> Result<(), ConvertError> {
        match digits {
            0 => Ok(()),
            DIGITS => {
                emit(word)?;
                emitted += 1;
                Ok(())
            }
            count => Err(ConvertError::WrongDigitCount { line, count }),
        }
    };

    for byte in BufReader::new(input).bytes() {
        let byte = byte?;

        if in_comment && byte != b'\n' {
            continue;
        }
        in_comment = false;

        match byte {
            b'#' => in_comment = true,
            b'\n' => {
                end_of_line(line, digits, word)?;
                line += 1;
                digits = 0;
            }
            b' ' | b'\t' | b'\r' | 0x0b | 0x0c => {}
            b'0' | b'1' => {
                word = word << 1 | Word::from(byte - b'0');
                digits += 1;
            }
            _ => {
                return Err(ConvertError::UnexpectedCharacter {
                    line,
                    found: byte as char,
                })
            }
        }
    }

    // Last line without a newline
    end_of_line(line, digits, word)?;

    Ok(emitted)
}

/// Converts `.hack` text from `input` into a ROM image written to `output`. Words are written as
/// soon as their line is complete, so on error the image holds everything before the bad line.
/// Returns the number of words written.
#[tracing::instrument(skip_all)]
pub fn convert<R: Read, W: Write>(input: R, mut output: W) -> Result<usize, ConvertError> {
    let result = scan(input, |word| output.write_all(&word.to_ne_bytes()));
    output.flush()?;

    let words = result?;
    tracing::debug!(words, "converted");
    Ok(words)
}

/// Parses `.hack` text into instruction words.
pub fn parse(text: &str) -> Result<Vec<Word>, ConvertError> {
    let mut words = Vec::new();
    scan(text.as_bytes(), |word| {
        words.push(word);
        Ok(())
    })?;
    Ok(words)
}

/// Renders words as `.hack` text, each line annotated with its address and disassembly.
pub fn render(words: &[Word]) -> String {
    words
        .iter()
        .enumerate()
        .map(|(address, &word)| {
            format!(
                "{:016b}  # {:#06x}  {}\n",
                word,
                address,
                Instruction::decode(word)
            )
        })
        .collect()
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    #[clap(help = "ROM image to write")]
    pub output: PathBuf,
    #[clap(short, long, value_name = "FILE")]
    #[clap(help = "Read .hack text from FILE instead of standard input")]
    pub input: Option<PathBuf>,
}

/// Converts a `.hack` file, or standard input, into a ROM image file.
pub fn convert_file(args: &ConvertArgs) -> anyhow::Result<()> {
    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Unable to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin()),
    };

    let output = File::create(&args.output)
        .with_context(|| format!("Unable to create {}", args.output.display()))?;

    let words = convert(input, BufWriter::new(output))
        .with_context(|| format!("Conversion to {} failed", args.output.display()))?;
    tracing::info!(words, output = %args.output.display(), "wrote ROM image");

    Ok(())
}

#[derive(clap::Args, Debug)]
pub struct DumpArgs {
    #[clap(help = "ROM image to print")]
    pub rom: PathBuf,
}

/// Writes the annotated `.hack` listing of `words` to `out`.
pub fn write_listing<W: Write>(words: &[Word], mut out: W) -> io::Result<()> {
    out.write_all(render(words).as_bytes())?;
    out.flush()
}

/// Prints a ROM image as annotated `.hack` text.
pub fn dump(args: &DumpArgs) -> anyhow::Result<()> {
    let rom = Rom::load(&args.rom)
        .with_context(|| format!("Unable to load ROM image {}", args.rom.display()))?;
    write_listing(rom.words(), io::stdout().lock()).context("Unable to write listing")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    struct TestCase {
        input: &'static str,
        expected: Vec<Word>,
    }

    #[test]
    fn test_parse() {
        let tests = vec![
            TestCase {
                input: "",
                expected: vec![],
            },
            TestCase {
                input: "0000000000000101\n1110110000010000\n",
                expected: vec![5, 0xec10],
            },
            TestCase {
                input: "  0000 0000 0000 0101\t\n\n\n1111111111111111",
                expected: vec![5, 0xffff],
            },
            TestCase {
                input: "# header\n0000000000000001 # @1\n   # indented comment\n",
                expected: vec![1],
            },
            TestCase {
                input: "0000000000000010\r\n0000000000000011\r\n",
                expected: vec![2, 3],
            },
            TestCase {
                input: "1000000000000000# comment at end of file",
                expected: vec![0x8000],
            },
        ];

        for test in tests {
            assert_eq!(parse(test.input).unwrap(), test.expected, "{:?}", test.input);
        }
    }

    #[test]
    fn test_parse_errors() {
        let tests = vec![
            (
                "0000000000000000\n000000000000001\n",
                "line 2: wrong number of digits (must be 16), found 15",
            ),
            (
                "00000000000000001\n",
                "line 1: wrong number of digits (must be 16), found 17",
            ),
            ("\n\n0000000000000002\n", "line 3: expected '0' or '1', found '2'"),
            ("0101", "line 1: wrong number of digits (must be 16), found 4"),
            ("@5\n", "line 1: expected '0' or '1', found '@'"),
        ];

        for (input, expected) in tests {
            assert_eq!(parse(input).unwrap_err().to_string(), expected, "{:?}", input);
        }
    }

    #[test]
    fn test_convert_writes_native_words() {
        let mut image = Vec::new();
        let words = convert("0001001000110100\n1110101010000111\n".as_bytes(), &mut image).unwrap();

        assert_eq!(words, 2);
        let mut expected = 0x1234u16.to_ne_bytes().to_vec();
        expected.extend(0xea87u16.to_ne_bytes());
        assert_eq!(image, expected);
    }

    #[test]
    fn test_convert_keeps_lines_before_error() {
        let mut image = Vec::new();
        let err = convert("0000000000000111\n0000000000000001x\n".as_bytes(), &mut image).unwrap_err();

        assert!(matches!(err, ConvertError::UnexpectedCharacter { line: 2, found: 'x' }));
        assert_eq!(image, 7u16.to_ne_bytes().to_vec());
    }

    #[test]
    fn test_render() {
        let text = render(&[5, 0b111_1_110111_101_000, 0b111_0_101010_000_111]);
        assert_eq!(
            text,
            "0000000000000101  # 0x0000  @5\n\
             1111110111101000  # 0x0001  AM=M+1\n\
             1110101010000111  # 0x0002  0;JMP\n"
        );
    }

    #[test]
    fn test_render_then_parse() {
        let words = vec![0, 1, 0x7fff, 0x8000, 0xea87, 0xfc10, 0xffff];
        assert_eq!(parse(&render(&words)).unwrap(), words);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_listing() {
        let mut out = Vec::new();
        write_listing(&[5], &mut out).unwrap();
        assert_eq!(out, b"0000000000000101  # 0x0000  @5\n");

        let err = write_listing(&[5], ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
