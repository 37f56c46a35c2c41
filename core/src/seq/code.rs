//! The standard genetic code.

use super::Base;

/// Amino acids of the standard code, indexed by codon in `T`, `C`, `A`, `G` order.
const STANDARD: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn tcag_index(base: Base) -> usize {
    match base {
        Base::T => 0,
        Base::C => 1,
        Base::A => 2,
        Base::G => 3,
    }
}

fn parse(codon: &[u8]) -> Option<[Base; 3]> {
    match codon {
        &[first, second, third] => Some([
            Base::try_from(first).ok()?,
            Base::try_from(second).ok()?,
            Base::try_from(third).ok()?,
        ]),
        _ => None,
    }
}

fn lookup(codon: [Base; 3]) -> u8 {
    let [first, second, third] = codon.map(tcag_index);
    STANDARD[16 * first + 4 * second + third]
}

/// Translates a codon into its one-letter amino acid, with `*` for stops.
///
/// Returns `None` if the codon is not three unambiguous nucleotides.
pub fn translate(codon: &[u8]) -> Option<u8> {
    parse(codon).map(lookup)
}

/// Returns true if the codon is a stop codon.
pub fn is_stop(codon: &[u8]) -> bool {
    translate(codon) == Some(b'*')
}

/// Returns true if the codon is the canonical start codon `ATG`.
pub fn is_start(codon: &[u8]) -> bool {
    parse(codon) == Some([Base::A, Base::T, Base::G])
}

/// Returns true if every base in the third position of the codon codes for the same amino acid.
pub fn is_fourfold_degenerate(codon: &[u8]) -> bool {
    let Some([first, second, _]) = parse(codon) else {
        return false;
    };

    let amino_acid = lookup([first, second, Base::A]);

    amino_acid != b'*'
        && Base::VARIANTS
            .iter()
            .all(|&third| lookup([first, second, third]) == amino_acid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate() {
        assert_eq!(translate(b"ATG"), Some(b'M'));
        assert_eq!(translate(b"ttt"), Some(b'F'));
        assert_eq!(translate(b"TGG"), Some(b'W'));
        assert_eq!(translate(b"GGC"), Some(b'G'));
        assert_eq!(translate(b"ANG"), None);
        assert_eq!(translate(b"AT"), None);
    }

    #[test]
    fn test_stop_and_start() {
        for stop in [b"TAA", b"TAG", b"TGA"] {
            assert!(is_stop(stop));
        }
        assert!(!is_stop(b"TGG"));

        assert!(is_start(b"atg"));
        assert!(!is_start(b"GTG"));
    }

    #[test]
    fn test_fourfold_degenerate() {
        for codon in [b"CTA", b"GTC", b"TCG", b"CCT", b"ACA", b"GCG", b"CGT", b"GGA"] {
            assert!(is_fourfold_degenerate(codon), "{}", String::from_utf8_lossy(codon));
        }

        for codon in [b"ATG", b"TTT", b"AGA", b"TAA", b"CAN"] {
            assert!(!is_fourfold_degenerate(codon), "{}", String::from_utf8_lossy(codon));
        }
    }
}
