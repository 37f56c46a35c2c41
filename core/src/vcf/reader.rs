use std::io;

use noodles_vcf as vcf;

use crate::position::Tracker;

use super::{call::InvalidReference, Error, GenotypeCall, Header};

/// A VCF reader.
///
/// Records must be sorted: positions strictly increase within a chromosome, and a chromosome may
/// not reappear once left. Records whose reference allele does not start with an unambiguous base
/// are skipped and counted. Records with a symbolic alternate allele are counted as reference.
pub struct Reader<R> {
    inner: vcf::Reader<R>,
    vcf_header: vcf::Header,
    header: Header,
    ploidy: usize,
    line: usize,
    record: vcf::record::Record,
    tracker: Tracker,
    invalid_reference: usize,
    symbolic_alternate: usize,
}

impl<R> Reader<R>
where
    R: io::BufRead,
{
    /// Creates a new reader, reading the header from the start of the input.
    ///
    /// # Errors
    ///
    /// If the header is missing or malformed, or if the ploidy is zero.
    pub fn new(mut inner: R, ploidy: usize) -> Result<Self, Error> {
        if ploidy == 0 {
            return Err(Error::malformed(0, "ploidy must be positive"));
        }

        let mut text = String::new();
        let mut line = 0;

        loop {
            let start = text.len();
            if inner.read_line(&mut text)? == 0 {
                return Err(Error::malformed(line, "missing header line"));
            }
            line += 1;

            let s = text[start..].trim_end_matches(['\n', '\r']);
            if !s.starts_with("##") {
                Header::check(line, s)?;
                break;
            }
        }

        let vcf_header: vcf::Header = text
            .parse()
            .map_err(|e| Error::malformed(line, format!("invalid header: {e}")))?;
        let header = Header::new(vcf_header.sample_names().iter().cloned().collect());

        Ok(Self {
            inner: vcf::Reader::new(inner),
            vcf_header,
            header,
            ploidy,
            line,
            record: vcf::record::Record::default(),
            tracker: Tracker::default(),
            invalid_reference: 0,
            symbolic_alternate: 0,
        })
    }

    /// Returns the header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the ploidy.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Returns the number of records skipped for an invalid reference base so far.
    pub fn invalid_reference(&self) -> usize {
        self.invalid_reference
    }

    /// Returns the number of records with a symbolic alternate allele so far.
    pub fn symbolic_alternate(&self) -> usize {
        self.symbolic_alternate
    }

    /// Reads the next genotype call, returning `None` at the end of input.
    pub fn read_call(&mut self) -> Result<Option<GenotypeCall>, Error> {
        loop {
            let read = match self.inner.read_record(&self.vcf_header, &mut self.record) {
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Err(Error::malformed(self.line + 1, e.to_string()))
                }
                Err(e) => return Err(e.into()),
            };

            if read == 0 {
                return Ok(None);
            }
            self.line += 1;

            let samples = self.header.samples().len();
            let parsed = GenotypeCall::from_record(self.line, &self.record, samples, self.ploidy)?;

            let (chrom, position) = match &parsed {
                Ok(call) => (call.chrom(), call.position()),
                Err(InvalidReference { chrom, position }) => (chrom.as_str(), *position),
            };

            if let Err(violation) = self.tracker.check(chrom, position) {
                return Err(Error::malformed(
                    self.line,
                    violation.describe(chrom, position),
                ));
            }

            match parsed {
                Ok(call) => {
                    if call.has_symbolic_alternate() {
                        if self.symbolic_alternate == 0 {
                            log::warn!(
                                "Counting VCF record at position '{}:{}' with symbolic alternate \
                                allele as reference. This warning will be shown only once.",
                                call.chrom(),
                                call.position(),
                            );
                        }
                        self.symbolic_alternate += 1;
                    }

                    return Ok(Some(call));
                }
                Err(InvalidReference { chrom, position }) => {
                    if self.invalid_reference == 0 {
                        log::warn!(
                            "Skipping VCF record at position '{chrom}:{position}' due to invalid \
                            reference base. This warning will be shown only once."
                        );
                    }
                    self.invalid_reference += 1;
                }
            }
        }
    }
}

impl<R> Iterator for Reader<R>
where
    R: io::BufRead,
{
    type Item = Result<GenotypeCall, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_call().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::seq::Base;

    const HEADER: &str = "##fileformat=VCFv4.2\n\
        ##contig=<ID=chr1>\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tind1\tind2\n";

    fn reader(body: &str) -> Result<Reader<io::Cursor<String>>, Error> {
        Reader::new(io::Cursor::new(format!("{HEADER}{body}")), 2)
    }

    #[test]
    fn test_read_calls() -> Result<(), Error> {
        let mut reader = reader(
            "chr1\t3\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr1\t7\t.\tN\tG\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr1\t9\t.\tC\tT\t.\t.\t.\tGT\t0/0\t./.\n\
            chr2\t1\t.\tG\tT\t.\t.\t.\tGT\t0/0\t0/1\n",
        )?;

        assert_eq!(reader.header().samples(), ["ind1", "ind2"]);

        let positions = reader
            .by_ref()
            .map(|call| call.map(|call| (call.chrom().to_string(), call.position())))
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(
            positions,
            [
                (String::from("chr1"), 3),
                (String::from("chr1"), 9),
                (String::from("chr2"), 1),
            ]
        );
        assert_eq!(reader.invalid_reference(), 1);
        assert_eq!(reader.symbolic_alternate(), 0);

        Ok(())
    }

    #[test]
    fn test_count_symbolic_alternates() -> Result<(), Error> {
        let mut reader = reader(
            "chr1\t3\t.\tA\t<DEL>\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr1\t4\t.\tC\tT\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr1\t5\t.\tG\tN\t.\t.\t.\tGT\t1/1\t0/0\n",
        )?;

        let calls = reader.by_ref().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(calls.len(), 3);
        assert_eq!(reader.symbolic_alternate(), 2);
        assert_eq!(
            calls[2].bases(0).collect::<Vec<_>>(),
            [Some(Base::G), Some(Base::G)]
        );

        Ok(())
    }

    #[test]
    fn test_unsorted_positions() -> Result<(), Error> {
        let mut reader = reader(
            "chr1\t3\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr1\t3\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1\n",
        )?;

        assert!(reader.read_call()?.is_some());
        assert!(matches!(
            reader.read_call(),
            Err(Error::MalformedFormat { line: 5, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_revisited_chromosome() -> Result<(), Error> {
        let mut reader = reader(
            "chr1\t3\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr2\t1\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1\n\
            chr1\t5\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1\n",
        )?;

        assert!(reader.read_call()?.is_some());
        assert!(reader.read_call()?.is_some());
        assert!(reader.read_call().is_err());

        Ok(())
    }

    #[test]
    fn test_missing_header() {
        let result = Reader::new(&b"##fileformat=VCFv4.2\n"[..], 2);
        assert!(matches!(result, Err(Error::MalformedFormat { .. })));

        let result = Reader::new(&b"chr1\t3\t.\tA\tG\t.\t.\t.\tGT\t0/1\n"[..], 2);
        assert!(matches!(result, Err(Error::MalformedFormat { line: 1, .. })));
    }
}
