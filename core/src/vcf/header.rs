use super::Error;

/// The VCF column header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    samples: Vec<String>,
}

impl Header {
    /// The fixed leading columns of the header line.
    pub const FIELDS: [&'static str; 9] = [
        "#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT",
    ];

    /// Creates a new header with the provided sample names.
    pub fn new(samples: Vec<String>) -> Self {
        Self { samples }
    }

    /// Returns the sample names.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Checks the fixed columns and sample names of the tab-separated column header line.
    pub(crate) fn check(line: usize, s: &str) -> Result<(), Error> {
        let mut fields = s.split('\t');

        for expected in Self::FIELDS {
            match fields.next() {
                Some(field) if field == expected => (),
                Some(field) => {
                    return Err(Error::malformed(
                        line,
                        format!("expected header field '{expected}', found '{field}'"),
                    ))
                }
                None => {
                    return Err(Error::malformed(
                        line,
                        format!("missing header field '{expected}'"),
                    ))
                }
            }
        }

        if fields.any(str::is_empty) {
            return Err(Error::malformed(line, "empty sample name"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_header() {
        assert!(
            Header::check(3, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tind1\tind2")
                .is_ok()
        );
        assert!(matches!(
            Header::check(3, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tind1\t"),
            Err(Error::MalformedFormat { line: 3, .. })
        ));
    }

    #[test]
    fn test_check_header_wrong_field() {
        assert!(matches!(
            Header::check(1, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tINFO\tFILTER\tFORMAT\tind1"),
            Err(Error::MalformedFormat { line: 1, .. })
        ));
        assert!(Header::check(1, "#CHROM POS ID REF ALT QUAL FILTER INFO FORMAT ind1").is_err());
    }

    #[test]
    fn test_check_header_missing_format() {
        assert!(Header::check(1, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").is_err());
    }
}
