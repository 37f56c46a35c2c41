use std::{fmt, str::FromStr};

use super::Error;

/// A strand of a double-stranded sequence.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Strand {
    /// Forward, or plus, strand.
    #[default]
    Forward,
    /// Reverse, or minus, strand.
    Reverse,
}

impl Strand {
    /// Returns the opposite strand.
    pub fn flip(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }

    /// Returns the `+`/`-` symbol of the strand.
    pub fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

/// A genomic region.
///
/// Coordinates are one-based and inclusive at both ends.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Region {
    chrom: String,
    start: usize,
    end: usize,
    strand: Strand,
    description: Option<String>,
}

impl Region {
    /// Creates a new region.
    ///
    /// # Errors
    ///
    /// If `start` is zero or `start > end`.
    pub fn new<S>(chrom: S, start: usize, end: usize, strand: Strand) -> Result<Self, Error>
    where
        S: Into<String>,
    {
        if start == 0 {
            Err(Error::invalid_region(start, end, "one-based start cannot be zero"))
        } else if start > end {
            Err(Error::invalid_region(start, end, "start after end"))
        } else {
            Ok(Self {
                chrom: chrom.into(),
                start,
                end,
                strand,
                description: None,
            })
        }
    }

    /// Sets a free-text description.
    pub fn with_description<S>(mut self, description: S) -> Self
    where
        S: Into<String>,
    {
        self.description = Some(description.into());
        self
    }

    /// Returns the chromosome name.
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Returns the first position of the region.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the last position of the region.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the strand.
    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// Returns the description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the number of positions in the region.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Returns false; a region always spans at least one position.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if the position falls within the region.
    pub fn contains(&self, position: usize) -> bool {
        (self.start..=self.end).contains(&position)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}{}",
            self.chrom,
            self.start,
            self.end,
            self.strand.symbol()
        )
    }
}

impl FromStr for Region {
    type Err = Error;

    /// Parses `chrom:start-end`, optionally followed by a `+` or `-` strand.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::invalid_region(0, 0, "expected 'chrom:start-end'");

        let (chrom, range) = s.rsplit_once(':').ok_or_else(malformed)?;

        let (range, strand) = if let Some(range) = range.strip_suffix('-') {
            (range, Strand::Reverse)
        } else if let Some(range) = range.strip_suffix('+') {
            (range, Strand::Forward)
        } else {
            (range, Strand::Forward)
        };

        let (start, end) = range.split_once('-').ok_or_else(malformed)?;
        let start = start.parse().map_err(|_| malformed())?;
        let end = end.parse().map_err(|_| malformed())?;

        if chrom.is_empty() {
            return Err(malformed());
        }

        Self::new(chrom, start, end, strand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() -> Result<(), Error> {
        let region = Region::from_str("chr12:9111571-9111670-")?;
        assert_eq!(region.chrom(), "chr12");
        assert_eq!(region.start(), 9111571);
        assert_eq!(region.end(), 9111670);
        assert_eq!(region.strand(), Strand::Reverse);
        assert_eq!(region.len(), 100);

        assert_eq!(Region::from_str("2:5-5")?.strand(), Strand::Forward);

        Ok(())
    }

    #[test]
    fn test_parse_invalid_region() {
        assert!(Region::from_str("chr1").is_err());
        assert!(Region::from_str("chr1:10").is_err());
        assert!(Region::from_str(":1-2").is_err());
        assert!(matches!(
            Region::from_str("chr1:20-10"),
            Err(Error::InvalidRegion { start: 20, end: 10, .. })
        ));
    }

    #[test]
    fn test_display_region() -> Result<(), Error> {
        let region = Region::new("chr1", 3, 9, Strand::Reverse)?;
        assert_eq!(region.to_string(), "chr1:3-9-");
        assert_eq!(Region::from_str(&region.to_string())?, region);

        Ok(())
    }
}
