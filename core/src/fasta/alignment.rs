//! Multiple sequence alignments.

use std::{collections::HashSet, io};

use crate::seq::{Region, Sequence};

use super::{Alphabet, Error, Record};

/// A block of aligned sequences.
///
/// An alignment has at least one row, all rows have the same length, and no two rows share a
/// name. The first row is the reference row of the block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alignment {
    rows: Vec<Sequence>,
}

impl Alignment {
    /// Creates a new alignment.
    ///
    /// # Errors
    ///
    /// If there are no rows, rows differ in length, or names are repeated.
    pub fn new(rows: Vec<Sequence>) -> Result<Self, Error> {
        let invalid = |reason: String| Err(Error::InvalidAlignment { reason });

        let Some(first) = rows.first() else {
            return invalid("no sequences".to_string());
        };

        if let Some(row) = rows.iter().find(|row| row.len() != first.len()) {
            return invalid(format!(
                "sequence '{}' has length {}, expected {}",
                row.name(),
                row.len(),
                first.len()
            ));
        }

        let mut names = HashSet::with_capacity(rows.len());
        if let Some(row) = rows.iter().find(|row| !names.insert(row.name())) {
            return invalid(format!("duplicate sequence name '{}'", row.name()));
        }

        Ok(Self { rows })
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns false; an alignment always has at least one row.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the number of columns.
    pub fn width(&self) -> usize {
        self.reference().len()
    }

    /// Returns the reference row, i.e. the first row.
    pub fn reference(&self) -> &Sequence {
        &self.rows[0]
    }

    /// Returns the region of the reference row, if any.
    pub fn region(&self) -> Option<&Region> {
        self.reference().region()
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Sequence] {
        &self.rows
    }

    /// Returns the rows, consuming the alignment.
    pub fn into_rows(self) -> Vec<Sequence> {
        self.rows
    }

    /// Returns the symbols of the column with the provided index, one per row.
    pub fn column(&self, index: usize) -> impl Iterator<Item = u8> + '_ {
        self.rows.iter().map(move |row| row.symbols()[index])
    }

    /// Reverse complements rows on the reverse strand, so that every oriented row reads 5' to 3'
    /// on the forward strand.
    ///
    /// If `first_only` is set, only the reference row is considered.
    pub fn orient(&mut self, first_only: bool) -> Result<(), Error> {
        let n = if first_only { 1 } else { self.rows.len() };

        for row in self.rows.iter_mut().take(n) {
            if row.needs_orientation() {
                log::trace!("Reverse complementing sequence '{}'", row.name());
                row.reverse_complement()?;
            }
        }

        Ok(())
    }
}

/// An alignment reader.
///
/// Alignment blocks are separated by one or more blank lines; input without blank lines between
/// sequences is read as a single block.
pub struct Reader<R> {
    inner: super::Reader<R>,
    pending: Option<Record>,
}

impl<R> Reader<R>
where
    R: io::BufRead,
{
    /// Creates a new DNA alignment reader.
    pub fn new(inner: R) -> Self {
        Self::with_alphabet(inner, Alphabet::Dna)
    }

    /// Creates a new alignment reader accepting the provided alphabet.
    pub fn with_alphabet(inner: R, alphabet: Alphabet) -> Self {
        Self {
            inner: super::Reader::with_alphabet(inner, alphabet),
            pending: None,
        }
    }

    /// Reads the next alignment block, returning `None` at the end of input.
    pub fn read_alignment(&mut self) -> Result<Option<Alignment>, Error> {
        let first = match self.pending.take() {
            Some(record) => record,
            None => match self.inner.read_record()? {
                Some(record) => record,
                None => return Ok(None),
            },
        };

        let line = first.line;
        let mut rows = vec![first.sequence];

        while let Some(record) = self.inner.read_record()? {
            if record.starts_block {
                self.pending = Some(record);
                break;
            }

            rows.push(record.sequence);
        }

        Alignment::new(rows).map(Some).map_err(|e| match e {
            Error::InvalidAlignment { reason } => Error::MalformedFormat { line, reason },
            e => e,
        })
    }
}

impl<R> Iterator for Reader<R>
where
    R: io::BufRead,
{
    type Item = Result<Alignment, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_alignment().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCKS: &[u8] = b"\
>human-1 chr1:1-6
ACG-TA
>human-2 chr1:1-6
ACGGTA

>human-1 chr1:20-23-
AACC
>human-2 chr1:20-23-
AGCC
";

    #[test]
    fn test_read_blocks() -> Result<(), Box<dyn std::error::Error>> {
        let mut reader = Reader::new(BLOCKS);

        let first = reader.read_alignment()?.ok_or("missing first block")?;
        assert_eq!(first.len(), 2);
        assert_eq!(first.width(), 6);
        assert_eq!(first.column(3).collect::<Vec<_>>(), b"-G");

        let second = reader.read_alignment()?.ok_or("missing second block")?;
        assert_eq!(second.width(), 4);
        assert_eq!(second.region().map(Region::start), Some(20));

        assert!(reader.read_alignment()?.is_none());

        Ok(())
    }

    #[test]
    fn test_single_block_without_blank_lines() -> Result<(), Error> {
        let reader = Reader::new(&b">a\nAC\n>b\nAG\n>c\nAT\n"[..]);
        let alignments = reader.collect::<Result<Vec<_>, _>>()?;

        assert_eq!(alignments.len(), 1);
        assert_eq!(alignments[0].len(), 3);

        Ok(())
    }

    #[test]
    fn test_unequal_lengths() {
        let mut reader = Reader::new(&b">a\nACGT\n>b\nACG\n"[..]);

        assert!(matches!(
            reader.read_alignment(),
            Err(Error::MalformedFormat { line: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let mut reader = Reader::new(&b"\n>a\nACGT\n>a\nACGA\n"[..]);

        assert!(matches!(
            reader.read_alignment(),
            Err(Error::MalformedFormat { line: 2, .. })
        ));
    }

    #[test]
    fn test_orient() -> Result<(), Box<dyn std::error::Error>> {
        let mut reader = Reader::new(BLOCKS);
        reader.read_alignment()?;

        let mut all = reader.read_alignment()?.ok_or("missing block")?;
        let mut first_only = all.clone();

        all.orient(false)?;
        assert_eq!(all.rows()[0].symbols(), b"GGTT");
        assert_eq!(all.rows()[1].symbols(), b"GGCT");

        first_only.orient(true)?;
        assert_eq!(first_only.rows()[0].symbols(), b"GGTT");
        assert_eq!(first_only.rows()[1].symbols(), b"AGCC");

        first_only.orient(true)?;
        assert_eq!(first_only.rows()[0].symbols(), b"GGTT");

        Ok(())
    }
}
