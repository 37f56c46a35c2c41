use std::io;

use crate::position::Tracker;

use super::{AlleleCounts, Error, Header, Population, Record};

/// A Counts file reader.
///
/// Fields may be separated by any whitespace. Comment lines starting with `#` between the first
/// line and the column header are kept as header comments, except for the `#PLOIDY` and
/// `#SAMPLESIZE` metadata lines. Other comment lines are skipped.
pub struct Reader<R> {
    inner: R,
    header: Header,
    declared: usize,
    read: usize,
    line: usize,
    buf: String,
    tracker: Tracker,
}

impl<R> Reader<R>
where
    R: io::BufRead,
{
    /// Creates a new reader, reading the header from the start of the input.
    pub fn new(mut inner: R) -> Result<Self, Error> {
        let mut buf = String::new();
        let mut line = 0;

        let mut next_line = |buf: &mut String, line: &mut usize| -> Result<bool, Error> {
            buf.clear();
            let read = inner.read_line(buf)? > 0;
            *line += 1;
            Ok(read)
        };

        let mut first = None;
        while next_line(&mut buf, &mut line)? {
            if !buf.starts_with('#') && !buf.trim().is_empty() {
                first = Some(parse_first_line(line, &buf)?);
                break;
            }
        }
        let Some((populations, declared)) = first else {
            return Err(Error::malformed(line, "missing COUNTSFILE line"));
        };

        let mut ploidy = None;
        let mut sample_size = None;
        let mut comments = Vec::new();
        let names = loop {
            if !next_line(&mut buf, &mut line)? {
                return Err(Error::malformed(line, "missing column header"));
            }

            let mut fields = buf.split_whitespace();
            match fields.next() {
                None => continue,
                Some(Header::PLOIDY) => {
                    ploidy = Some(parse_metadata(line, fields, populations)?);
                }
                Some(Header::SAMPLE_SIZE) => {
                    sample_size = Some(parse_metadata(line, fields, populations)?);
                }
                Some(field) if field.starts_with('#') => {
                    let comment = buf.trim_end().trim_start_matches('#').trim_start();
                    comments.push(comment.to_string());
                }
                Some(chrom) => break parse_column_header(line, chrom, fields, populations)?,
            }
        };

        let populations = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                Population::new(name)
                    .with_ploidy(ploidy.as_ref().and_then(|v: &Vec<_>| v[i]))
                    .with_sample_size(sample_size.as_ref().and_then(|v: &Vec<_>| v[i]))
            })
            .collect();

        Ok(Self {
            inner,
            header: Header::new(populations).with_comments(comments),
            declared,
            read: 0,
            line,
            buf,
            tracker: Tracker::default(),
        })
    }

    /// Returns the header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the number of sites declared in the header.
    pub fn declared_sites(&self) -> usize {
        self.declared
    }

    /// Reads the next record, returning `None` at the end of input.
    ///
    /// # Errors
    ///
    /// If a record is malformed or out of order, if its counts exceed the sample size of a
    /// population, or if the number of records does not match the header at the end of input.
    pub fn read_record(&mut self) -> Result<Option<Record>, Error> {
        loop {
            self.buf.clear();
            if self.inner.read_line(&mut self.buf)? == 0 {
                if self.read != self.declared {
                    return Err(Error::malformed(
                        self.line,
                        format!(
                            "header declares {} sites, found {}",
                            self.declared, self.read
                        ),
                    ));
                }

                return Ok(None);
            }
            self.line += 1;

            let s = self.buf.trim();
            if s.is_empty() || s.starts_with('#') {
                continue;
            }

            let record = parse_record(self.line, s, &self.header)?;

            if let Err(violation) = self.tracker.check(record.chrom(), record.position()) {
                return Err(Error::malformed(
                    self.line,
                    violation.describe(record.chrom(), record.position()),
                ));
            }

            self.read += 1;
            return Ok(Some(record));
        }
    }
}

impl<R> Iterator for Reader<R>
where
    R: io::BufRead,
{
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn parse_count(line: usize, field: Option<&str>, name: &str) -> Result<usize, Error> {
    field
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| Error::malformed(line, format!("invalid or missing {name}")))
}

fn parse_first_line(line: usize, s: &str) -> Result<(usize, usize), Error> {
    let mut fields = s.split_whitespace();

    if fields.next() != Some(Header::MAGIC) {
        return Err(Error::malformed(line, "expected COUNTSFILE line"));
    }

    if fields.next() != Some("NPOP") {
        return Err(Error::malformed(line, "expected NPOP after COUNTSFILE"));
    }
    let populations = parse_count(line, fields.next(), "NPOP")?;

    if fields.next() != Some("NSITES") {
        return Err(Error::malformed(line, "expected NSITES after NPOP"));
    }
    let sites = parse_count(line, fields.next(), "NSITES")?;

    if fields.next().is_some() {
        return Err(Error::malformed(line, "trailing fields after NSITES"));
    }

    Ok((populations, sites))
}

fn parse_metadata<'a, I>(
    line: usize,
    fields: I,
    populations: usize,
) -> Result<Vec<Option<usize>>, Error>
where
    I: Iterator<Item = &'a str>,
{
    let values = fields
        .map(|field| match field {
            "." => Ok(None),
            field => field.parse().map(Some).map_err(|_| {
                Error::malformed(line, format!("invalid metadata value '{field}'"))
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != populations {
        return Err(Error::malformed(
            line,
            format!(
                "found {} metadata values, expected {populations}",
                values.len()
            ),
        ));
    }

    Ok(values)
}

fn parse_column_header<'a, I>(
    line: usize,
    chrom: &str,
    mut fields: I,
    populations: usize,
) -> Result<Vec<String>, Error>
where
    I: Iterator<Item = &'a str>,
{
    let position = fields.next().unwrap_or_default();

    if !chrom.eq_ignore_ascii_case("CHROM") || !position.eq_ignore_ascii_case("POS") {
        return Err(Error::malformed(line, "column header must start with CHROM and POS"));
    }

    let names: Vec<String> = fields.map(String::from).collect();

    if names.len() != populations {
        return Err(Error::malformed(
            line,
            format!(
                "column header names {} populations, NPOP is {populations}",
                names.len()
            ),
        ));
    }

    Ok(names)
}

fn parse_record(line: usize, s: &str, header: &Header) -> Result<Record, Error> {
    let mut fields = s.split_whitespace();

    let chrom = fields.next().unwrap_or_default();
    let position = parse_count(line, fields.next(), "position")?;

    let counts = fields
        .map(|field| {
            field
                .parse::<AlleleCounts>()
                .map_err(|e| Error::malformed(line, e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if counts.len() != header.len() {
        return Err(Error::malformed(
            line,
            format!(
                "found {} allele count vectors, expected {}",
                counts.len(),
                header.len()
            ),
        ));
    }

    for (population, counts) in header.populations().iter().zip(&counts) {
        if let Some(sample_size) = population.sample_size() {
            if counts.total() > sample_size {
                return Err(Error::malformed(
                    line,
                    format!(
                        "counts of population '{}' sum to {}, exceeding sample size {sample_size}",
                        population.name(),
                        counts.total(),
                    ),
                ));
            }
        }
    }

    Ok(Record::new(chrom, position, counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "\
        # produced by hand\n\
        COUNTSFILE NPOP 2 NSITES 3\n\
        #PLOIDY\t2\t.\n\
        #SAMPLESIZE\t4\t.\n\
        # a comment\n\
        Chrom Pos pop1 pop2\n\
        chr1\t1\t0,0,4,0\t1,0,0,7\n\
        chr1 5 0,2,2,0 0,0,0,0\n\
        \n\
        chr2\t2\t4,0,0,0\t0,9,0,0\n";

    #[test]
    fn test_read_counts_file() -> Result<(), Error> {
        let mut reader = Reader::new(FILE.as_bytes())?;

        let header = reader.header();
        assert_eq!(header.names().collect::<Vec<_>>(), ["pop1", "pop2"]);
        assert_eq!(header.populations()[0].ploidy(), Some(2));
        assert_eq!(header.populations()[0].sample_size(), Some(4));
        assert_eq!(header.populations()[1].sample_size(), None);
        assert_eq!(header.comments(), ["a comment"]);
        assert_eq!(reader.declared_sites(), 3);

        let records = reader.by_ref().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].to_string(), "chr1\t5\t0,2,2,0\t0,0,0,0");
        assert_eq!(records[2].chrom(), "chr2");

        Ok(())
    }

    #[test]
    fn test_read_without_metadata() -> Result<(), Error> {
        let file = "COUNTSFILE\tNPOP\t1\tNSITES\t1\nCHROM\tPOS\tx\nNA\t1\t1,1,1,1\n";
        let mut reader = Reader::new(file.as_bytes())?;

        assert_eq!(reader.header().populations()[0].ploidy(), None);
        assert!(reader.read_record()?.is_some());
        assert!(reader.read_record()?.is_none());

        Ok(())
    }

    #[test]
    fn test_read_npop_mismatch() {
        let file = "COUNTSFILE NPOP 3 NSITES 0\nCHROM POS a b\n";
        assert!(matches!(
            Reader::new(file.as_bytes()),
            Err(Error::MalformedFormat { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_wrong_vector_count() -> Result<(), Error> {
        let file = "COUNTSFILE NPOP 2 NSITES 1\nCHROM POS a b\nNA 1 1,0,0,0\n";
        let mut reader = Reader::new(file.as_bytes())?;

        assert!(matches!(
            reader.read_record(),
            Err(Error::MalformedFormat { line: 3, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_read_exceeds_sample_size() -> Result<(), Error> {
        let file = "COUNTSFILE NPOP 1 NSITES 1\n#SAMPLESIZE 2\nCHROM POS a\nNA 1 1,0,2,0\n";
        let mut reader = Reader::new(file.as_bytes())?;

        assert!(reader.read_record().is_err());

        Ok(())
    }

    #[test]
    fn test_read_unsorted() -> Result<(), Error> {
        let file = "COUNTSFILE NPOP 1 NSITES 2\nCHROM POS a\nNA 2 1,0,0,0\nNA 2 1,0,0,0\n";
        let mut reader = Reader::new(file.as_bytes())?;

        assert!(reader.read_record()?.is_some());
        assert!(reader.read_record().is_err());

        Ok(())
    }

    #[test]
    fn test_read_site_count_mismatch() -> Result<(), Error> {
        let file = "COUNTSFILE NPOP 1 NSITES 2\nCHROM POS a\nNA 1 1,0,0,0\n";
        let mut reader = Reader::new(file.as_bytes())?;

        assert!(reader.read_record()?.is_some());
        assert!(matches!(
            reader.read_record(),
            Err(Error::MalformedFormat { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_read_corrupt_first_line() {
        assert!(Reader::new(&b"COUNTS NPOP 1 NSITES 2\n"[..]).is_err());
        assert!(Reader::new(&b"COUNTSFILE NPOP x NSITES 2\n"[..]).is_err());
        assert!(Reader::new(&b""[..]).is_err());
    }
}
