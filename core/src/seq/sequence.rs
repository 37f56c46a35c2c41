use std::fmt;

use super::{code, iupac, Error, Region, Strand};

/// A named sequence of nucleotide or amino acid symbols.
///
/// Symbols are indexed by zero-based offset into the sequence; the genomic coordinates of the
/// sequence, if known, are given by its [`Region`]. Mutating methods never change the region.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sequence {
    name: String,
    description: Option<String>,
    region: Option<Region>,
    symbols: Vec<u8>,
    frame: usize,
    reverse_complemented: bool,
}

impl Sequence {
    /// Creates a new sequence without region, in frame zero.
    pub fn new<S>(name: S, symbols: Vec<u8>) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            description: None,
            region: None,
            symbols,
            frame: 0,
            reverse_complemented: false,
        }
    }

    /// Sets the region of the sequence.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Sets the free-text description of the sequence.
    pub fn with_description<S>(mut self, description: S) -> Self
    where
        S: Into<String>,
    {
        self.description = Some(description.into());
        self
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the region, if any.
    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Returns the symbols.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// Returns the number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns true if the sequence has no symbols.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the reading frame, i.e. the number of symbols before the first complete codon.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Sets the reading frame.
    ///
    /// # Errors
    ///
    /// If the frame is not 0, 1, or 2.
    pub fn set_frame(&mut self, frame: usize) -> Result<(), Error> {
        if frame < 3 {
            self.frame = frame;
            Ok(())
        } else {
            Err(Error::invalid_region(frame, frame, "frame must be 0, 1, or 2"))
        }
    }

    /// Returns true if the sequence has been reverse complemented relative to how it was read.
    pub fn is_reverse_complemented(&self) -> bool {
        self.reverse_complemented
    }

    /// Returns true if the sequence lies on the reverse strand and has not yet been oriented.
    pub fn needs_orientation(&self) -> bool {
        self.region
            .as_ref()
            .is_some_and(|region| region.strand() == Strand::Reverse)
            && !self.reverse_complemented
    }

    /// Removes all symbols that are not unambiguous nucleotides.
    pub fn purge(&mut self) {
        self.symbols.retain(|&symbol| iupac::is_unambiguous(symbol));
    }

    /// Reverse complements the sequence in place.
    ///
    /// The reading frame is recomputed so that the same codons are read on the opposite strand.
    ///
    /// # Errors
    ///
    /// If any symbol is not a legal nucleotide symbol; the sequence is left unchanged.
    pub fn reverse_complement(&mut self) -> Result<(), Error> {
        self.symbols = iupac::reverse_complement(&self.symbols)?;
        self.frame = (self.len().saturating_sub(self.frame)) % 3;
        self.reverse_complemented = !self.reverse_complemented;
        Ok(())
    }

    /// Returns `len` symbols starting at offset `start`.
    ///
    /// # Errors
    ///
    /// If the range falls outside the sequence.
    pub fn subsequence(&self, start: usize, len: usize) -> Result<&[u8], Error> {
        start
            .checked_add(len)
            .and_then(|end| self.symbols.get(start..end))
            .ok_or_else(|| {
                Error::invalid_region(start, start.saturating_add(len), "outside sequence")
            })
    }

    /// Returns `len` symbols starting at offset `start`, which must cover whole codons.
    ///
    /// # Errors
    ///
    /// If the range falls outside the sequence, or does not start and end on codon boundaries
    /// in the current frame.
    pub fn in_frame_range(&self, start: usize, len: usize) -> Result<&[u8], Error> {
        let symbols = self.subsequence(start, len)?;

        if start < self.frame || (start - self.frame) % 3 != 0 || len % 3 != 0 {
            Err(Error::invalid_region(start, start + len, "not aligned to reading frame"))
        } else {
            Ok(symbols)
        }
    }

    /// Returns an iterator over the complete codons in the current frame.
    pub fn codons(&self) -> impl Iterator<Item = &[u8]> {
        self.symbols
            .get(self.frame..)
            .unwrap_or_default()
            .chunks_exact(3)
    }

    /// Returns the codon with the provided index in the current frame, if it is complete.
    pub fn codon(&self, index: usize) -> Option<&[u8]> {
        let start = self.frame + 3 * index;
        self.symbols.get(start..start + 3)
    }

    /// Returns true if the symbol at the provided offset is the third position of a four-fold
    /// degenerate codon in the current frame.
    pub fn is_synonymous(&self, offset: usize) -> bool {
        if offset < self.frame || (offset - self.frame) % 3 != 2 {
            return false;
        }

        self.codon((offset - self.frame) / 3)
            .is_some_and(code::is_fourfold_degenerate)
    }

    pub(crate) fn with_symbols(mut self, symbols: Vec<u8>) -> Self {
        self.symbols = symbols;
        self
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.symbols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge() {
        let mut sequence = Sequence::new("x", b"AC-GNtRa".to_vec());
        sequence.purge();
        assert_eq!(sequence.symbols(), b"ACGta");
    }

    #[test]
    fn test_reverse_complement_frame() -> Result<(), Error> {
        let mut sequence = Sequence::new("x", b"GATGCCTAAT".to_vec());
        sequence.set_frame(1)?;
        assert_eq!(sequence.codon(0), Some(b"ATG".as_slice()));

        sequence.reverse_complement()?;
        assert!(sequence.is_reverse_complemented());
        assert_eq!(sequence.symbols(), b"ATTAGGCATC");
        assert_eq!(sequence.frame(), 0);
        assert_eq!(sequence.codon(0), Some(b"ATT".as_slice()));

        sequence.reverse_complement()?;
        assert!(!sequence.is_reverse_complemented());
        assert_eq!(sequence.symbols(), b"GATGCCTAAT");
        assert_eq!(sequence.frame(), 1);

        Ok(())
    }

    #[test]
    fn test_reverse_complement_invalid_leaves_sequence() {
        let mut sequence = Sequence::new("x", b"AC*".to_vec());
        assert_eq!(sequence.reverse_complement(), Err(Error::InvalidBase(b'*')));
        assert_eq!(sequence.symbols(), b"AC*");
        assert!(!sequence.is_reverse_complemented());
    }

    #[test]
    fn test_set_frame_out_of_range() {
        let mut sequence = Sequence::new("x", b"ACGT".to_vec());
        assert!(sequence.set_frame(3).is_err());
        assert_eq!(sequence.frame(), 0);
    }

    #[test]
    fn test_subsequence() -> Result<(), Error> {
        let sequence = Sequence::new("x", b"ACGTACGT".to_vec());
        assert_eq!(sequence.subsequence(2, 3)?, b"GTA");
        assert_eq!(sequence.subsequence(8, 0)?, b"");
        assert!(matches!(
            sequence.subsequence(6, 3),
            Err(Error::InvalidRegion { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_in_frame_range() -> Result<(), Error> {
        let mut sequence = Sequence::new("x", b"AATGGCCTTT".to_vec());
        sequence.set_frame(1)?;

        assert_eq!(sequence.in_frame_range(1, 6)?, b"ATGGCC");
        assert_eq!(sequence.in_frame_range(4, 3)?, b"GCC");
        assert!(sequence.in_frame_range(0, 3).is_err());
        assert!(sequence.in_frame_range(2, 3).is_err());
        assert!(sequence.in_frame_range(1, 4).is_err());
        assert!(sequence.in_frame_range(7, 6).is_err());

        Ok(())
    }

    #[test]
    fn test_codons() -> Result<(), Error> {
        let mut sequence = Sequence::new("x", b"CATGAAAT".to_vec());
        sequence.set_frame(1)?;

        let codons: Vec<_> = sequence.codons().collect();
        assert_eq!(codons, [b"ATG".as_slice(), b"AAA".as_slice()]);
        assert_eq!(sequence.codon(2), None);

        Ok(())
    }

    #[test]
    fn test_is_synonymous() {
        let sequence = Sequence::new("x", b"ATGCTAAAA".to_vec());

        assert!(sequence.is_synonymous(5));
        assert!(!sequence.is_synonymous(2));
        assert!(!sequence.is_synonymous(4));
        assert!(!sequence.is_synonymous(8));
        assert!(!sequence.is_synonymous(11));
    }

    #[test]
    fn test_needs_orientation() -> Result<(), Error> {
        let region = Region::new("chr1", 1, 4, Strand::Reverse)?;
        let mut sequence = Sequence::new("x", b"ACGT".to_vec()).with_region(region.clone());
        assert!(sequence.needs_orientation());

        sequence.reverse_complement()?;
        assert!(!sequence.needs_orientation());
        assert_eq!(sequence.region(), Some(&region));

        Ok(())
    }
}
