//! IUPAC nucleotide codes.

use super::{Base, Error};

use Base::{A, C, G, T};

/// Returns the bases represented by a legal IUPAC symbol, ignoring case.
///
/// Gaps represent no bases, and `N` represents all of them. Returns `None` for symbols that are
/// not IUPAC nucleotide codes.
pub fn bases(symbol: u8) -> Option<&'static [Base]> {
    let bases: &'static [Base] = match symbol.to_ascii_uppercase() {
        b'A' => &[A],
        b'C' => &[C],
        b'G' => &[G],
        b'T' | b'U' => &[T],
        b'R' => &[A, G],
        b'Y' => &[C, T],
        b'S' => &[C, G],
        b'W' => &[A, T],
        b'K' => &[G, T],
        b'M' => &[A, C],
        b'B' => &[C, G, T],
        b'D' => &[A, G, T],
        b'H' => &[A, C, T],
        b'V' => &[A, C, G],
        b'N' => &[A, C, G, T],
        b'-' | b'.' => &[],
        _ => return None,
    };

    Some(bases)
}

/// Returns true if the symbol is a gap.
pub fn is_gap(symbol: u8) -> bool {
    matches!(symbol, b'-' | b'.')
}

/// Returns true if the symbol is an unambiguous nucleotide.
pub fn is_unambiguous(symbol: u8) -> bool {
    matches!(symbol.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// Returns true if the symbol is a legal, complementable DNA symbol.
///
/// Uracil is not legal here, since it has no DNA complement that maps back to it.
pub fn is_legal(symbol: u8) -> bool {
    complement(symbol).is_some()
}

/// Returns the complement of a legal symbol, preserving case.
pub fn complement(symbol: u8) -> Option<u8> {
    let complement = match symbol.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'R' => b'Y',
        b'Y' => b'R',
        b'K' => b'M',
        b'M' => b'K',
        b'B' => b'V',
        b'V' => b'B',
        b'D' => b'H',
        b'H' => b'D',
        b'S' => b'S',
        b'W' => b'W',
        b'N' => b'N',
        b'-' => b'-',
        b'.' => b'.',
        _ => return None,
    };

    if symbol.is_ascii_lowercase() {
        Some(complement.to_ascii_lowercase())
    } else {
        Some(complement)
    }
}

/// Returns the reverse complement of a sequence of legal symbols.
///
/// The operation is its own inverse on every legal sequence.
pub fn reverse_complement(symbols: &[u8]) -> Result<Vec<u8>, Error> {
    symbols
        .iter()
        .rev()
        .map(|&symbol| complement(symbol).ok_or(Error::InvalidBase(symbol)))
        .collect()
}
