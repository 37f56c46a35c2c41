use std::fmt;

use super::Error;

/// An unambiguous nucleotide.
///
/// Bases are ordered, and indexed, as `A`, `C`, `G`, `T`; the same order is used for count vectors
/// throughout the crate.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Base {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Thymine.
    T = 3,
}

impl Base {
    /// The number of bases.
    pub const N: usize = 4;

    /// All bases in index order.
    pub const VARIANTS: [Base; Self::N] = [Self::A, Self::C, Self::G, Self::T];

    /// Returns the index of the base in `A`, `C`, `G`, `T` order.
    pub fn index(self) -> usize {
        self as u8 as usize
    }

    /// Returns the base with the provided index, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::VARIANTS.get(index).copied()
    }

    /// Returns the Watson-Crick complement.
    pub fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::C => Self::G,
            Self::G => Self::C,
            Self::T => Self::A,
        }
    }

    /// Returns the upper-case symbol.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::A => b'A',
            Self::C => b'C',
            Self::G => b'G',
            Self::T => b'T',
        }
    }

    /// Returns true for the strong bases `C` and `G`.
    pub fn is_strong(self) -> bool {
        matches!(self, Self::C | Self::G)
    }
}

impl TryFrom<u8> for Base {
    type Error = Error;

    /// Parses a base, ignoring case. Uracil is read as thymine.
    fn try_from(symbol: u8) -> Result<Self, Self::Error> {
        match symbol {
            b'A' | b'a' => Ok(Self::A),
            b'C' | b'c' => Ok(Self::C),
            b'G' | b'g' => Ok(Self::G),
            b'T' | b't' | b'U' | b'u' => Ok(Self::T),
            _ => Err(Error::InvalidBase(symbol)),
        }
    }
}

impl TryFrom<char> for Base {
    type Error = Error;

    fn try_from(symbol: char) -> Result<Self, Self::Error> {
        u8::try_from(symbol)
            .map_err(|_| Error::InvalidBase(b'?'))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.as_u8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_from_symbol() {
        assert_eq!(Base::try_from(b'a'), Ok(Base::A));
        assert_eq!(Base::try_from(b'G'), Ok(Base::G));
        assert_eq!(Base::try_from(b'u'), Ok(Base::T));
        assert_eq!(Base::try_from(b'N'), Err(Error::InvalidBase(b'N')));
        assert_eq!(Base::try_from(b'-'), Err(Error::InvalidBase(b'-')));
    }

    #[test]
    fn test_base_index_roundtrip() {
        for base in Base::VARIANTS {
            assert_eq!(Base::from_index(base.index()), Some(base));
            assert_eq!(base.complement().complement(), base);
        }

        assert_eq!(Base::from_index(4), None);
    }
}
