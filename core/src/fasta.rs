//! Reading and writing FASTA sequences and alignments.
//!
//! The [`Reader`] yields one [`Sequence`] at a time. Headers have the form `>NAME [TOKENS...]`,
//! where the first token that parses as a [`Region`] (`chrom:start-end`, optionally followed by
//! a strand) sets the region of the sequence, and the remaining tokens form its description.
//!
//! Alignments are read block by block using [`alignment::Reader`], where blocks are separated by
//! blank lines.

use std::{fmt, io, str::FromStr};

use crate::seq::{self, iupac, Region, Sequence};

pub mod alignment;
pub use alignment::Alignment;

pub mod filter;

mod writer;
pub use writer::Writer;

/// The alphabet of symbols accepted in sequence lines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Alphabet {
    /// IUPAC nucleotide codes and gaps.
    #[default]
    Dna,
    /// Amino acid letters, stops, and gaps.
    Protein,
}

impl Alphabet {
    /// Returns true if the symbol belongs to the alphabet.
    pub fn contains(&self, symbol: u8) -> bool {
        match self {
            Alphabet::Dna => iupac::bases(symbol).is_some(),
            Alphabet::Protein => {
                symbol.is_ascii_alphabetic() || matches!(symbol, b'*' | b'-' | b'.')
            }
        }
    }
}

/// A FASTA sequence reader.
pub struct Reader<R> {
    inner: R,
    alphabet: Alphabet,
    line: usize,
    buf: String,
    next_header: Option<PendingHeader>,
}

/// A header line that has been read, but whose sequence has not.
struct PendingHeader {
    line: usize,
    text: String,
    after_blank: bool,
}

/// A sequence along with where it was found.
pub(crate) struct Record {
    pub(crate) sequence: Sequence,
    pub(crate) line: usize,
    pub(crate) starts_block: bool,
}

impl<R> Reader<R>
where
    R: io::BufRead,
{
    /// Creates a new DNA reader.
    pub fn new(inner: R) -> Self {
        Self::with_alphabet(inner, Alphabet::Dna)
    }

    /// Creates a new reader accepting the provided alphabet.
    pub fn with_alphabet(inner: R, alphabet: Alphabet) -> Self {
        Self {
            inner,
            alphabet,
            line: 0,
            buf: String::new(),
            next_header: None,
        }
    }

    /// Reads the next sequence, returning `None` at the end of input.
    pub fn read_sequence(&mut self) -> Result<Option<Sequence>, Error> {
        Ok(self.read_record()?.map(|record| record.sequence))
    }

    fn read_line(&mut self) -> io::Result<bool> {
        self.buf.clear();

        if self.inner.read_line(&mut self.buf)? == 0 {
            Ok(false)
        } else {
            self.line += 1;
            Ok(true)
        }
    }

    pub(crate) fn read_record(&mut self) -> Result<Option<Record>, Error> {
        let header = match self.next_header.take() {
            Some(header) => header,
            None => {
                let mut after_blank = false;

                loop {
                    if !self.read_line()? {
                        return Ok(None);
                    }

                    let line = self.buf.trim_end();

                    if line.is_empty() {
                        after_blank = true;
                    } else if line.starts_with('>') {
                        break PendingHeader {
                            line: self.line,
                            text: line.to_string(),
                            after_blank,
                        };
                    } else {
                        return Err(Error::malformed(
                            self.line,
                            "sequence data before first header",
                        ));
                    }
                }
            }
        };

        let sequence = parse_header(&header)?;
        let mut symbols = Vec::new();
        let mut blank = false;

        while self.read_line()? {
            let line = self.buf.trim_end();

            if line.is_empty() {
                blank = true;
            } else if line.starts_with('>') {
                self.next_header = Some(PendingHeader {
                    line: self.line,
                    text: line.to_string(),
                    after_blank: blank,
                });
                break;
            } else if let Some(&symbol) = line
                .as_bytes()
                .iter()
                .find(|&&symbol| !self.alphabet.contains(symbol))
            {
                return Err(Error::malformed(
                    self.line,
                    format!("invalid symbol '{}'", char::from(symbol).escape_default()),
                ));
            } else {
                symbols.extend_from_slice(line.as_bytes());
            }
        }

        Ok(Some(Record {
            sequence: sequence.with_symbols(symbols),
            line: header.line,
            starts_block: header.after_blank,
        }))
    }
}

fn parse_header(header: &PendingHeader) -> Result<Sequence, Error> {
    let mut tokens = header.text[1..].split_whitespace();

    let name = tokens
        .next()
        .ok_or_else(|| Error::malformed(header.line, "empty header"))?;

    let mut region = None;
    let mut description = Vec::new();

    for token in tokens {
        match Region::from_str(token) {
            Ok(parsed) if region.is_none() => region = Some(parsed),
            _ => description.push(token),
        }
    }

    let mut sequence = Sequence::new(name, Vec::new());
    if let Some(region) = region {
        sequence = sequence.with_region(region);
    }
    if !description.is_empty() {
        sequence = sequence.with_description(description.join(" "));
    }

    Ok(sequence)
}

/// An error associated with reading FASTA.
#[derive(Debug)]
pub enum Error {
    /// I/O error.
    Io(io::Error),
    /// Input does not follow the FASTA format.
    MalformedFormat {
        /// One-based line number of the offending line.
        line: usize,
        /// Reason the line was rejected.
        reason: String,
    },
    /// Rows do not form a valid alignment.
    InvalidAlignment {
        /// Reason the rows were rejected.
        reason: String,
    },
    /// Sequence could not be transformed.
    Seq(seq::Error),
}

impl Error {
    pub(crate) fn malformed<S>(line: usize, reason: S) -> Self
    where
        S: Into<String>,
    {
        Self::MalformedFormat {
            line,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{e}"),
            Error::MalformedFormat { line, reason } => {
                write!(f, "malformed FASTA at line {line}: {reason}")
            }
            Error::InvalidAlignment { reason } => write!(f, "invalid alignment: {reason}"),
            Error::Seq(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Seq(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<seq::Error> for Error {
    fn from(e: seq::Error) -> Self {
        Self::Seq(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::seq::Strand;

    #[test]
    fn test_read_sequences() -> Result<(), Box<dyn std::error::Error>> {
        let src = b">seq1 chr1:11-18- some gene\nACGT\nacgt\n\n>seq2\nNN-RY\n";
        let mut reader = Reader::new(&src[..]);

        let first = reader.read_sequence()?.ok_or("missing first")?;
        assert_eq!(first.name(), "seq1");
        assert_eq!(first.symbols(), b"ACGTacgt");
        assert_eq!(first.description(), Some("some gene"));
        let region = first.region().ok_or("missing region")?;
        assert_eq!((region.chrom(), region.start(), region.end()), ("chr1", 11, 18));
        assert_eq!(region.strand(), Strand::Reverse);
        assert!(first.needs_orientation());

        let second = reader.read_sequence()?.ok_or("missing second")?;
        assert_eq!(second.name(), "seq2");
        assert_eq!(second.symbols(), b"NN-RY");
        assert_eq!(second.region(), None);

        assert!(reader.read_sequence()?.is_none());
        assert!(reader.read_sequence()?.is_none());

        Ok(())
    }

    #[test]
    fn test_data_before_header() {
        let mut reader = Reader::new(&b"\nACGT\n>seq\nACGT\n"[..]);

        assert!(matches!(
            reader.read_sequence(),
            Err(Error::MalformedFormat { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_header() {
        let mut reader = Reader::new(&b">  \nACGT\n"[..]);

        assert!(matches!(
            reader.read_sequence(),
            Err(Error::MalformedFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_symbol() {
        let mut reader = Reader::new(&b">a\nACGT\nACXT\n"[..]);

        assert!(matches!(
            reader.read_sequence(),
            Err(Error::MalformedFormat { line: 3, .. })
        ));
    }

    #[test]
    fn test_protein_alphabet() -> Result<(), Error> {
        let mut reader = Reader::with_alphabet(&b">p\nMKLV*\n"[..], Alphabet::Protein);
        assert_eq!(
            reader.read_sequence()?.map(|s| s.symbols().to_vec()),
            Some(b"MKLV*".to_vec())
        );

        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<(), Error> {
        let mut reader = Reader::new(&b"\n\n"[..]);
        assert!(reader.read_sequence()?.is_none());

        Ok(())
    }
}
