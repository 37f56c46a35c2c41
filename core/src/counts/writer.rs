use std::io::{self, Seek, Write};

use tempfile::SpooledTempFile;

use crate::position::Tracker;

use super::{Error, Header, Record};

/// Size of the record body kept in memory before spilling to a temporary file.
const SPOOL_SIZE: usize = 16 * 1024 * 1024;

/// A Counts file writer.
///
/// The header declares the number of sites, which is only known once all records are written.
/// Records are therefore spooled, and the file is written in full by [`Writer::finish`].
pub struct Writer<W> {
    inner: W,
    header: Header,
    body: io::BufWriter<SpooledTempFile>,
    tracker: Tracker,
    sites: usize,
}

impl<W> Writer<W>
where
    W: Write,
{
    /// Creates a new writer.
    pub fn new(inner: W, header: Header) -> Self {
        Self {
            inner,
            header,
            body: io::BufWriter::new(SpooledTempFile::new(SPOOL_SIZE)),
            tracker: Tracker::default(),
            sites: 0,
        }
    }

    /// Returns the header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the number of records written so far.
    pub fn sites(&self) -> usize {
        self.sites
    }

    /// Writes a record.
    ///
    /// # Errors
    ///
    /// If the record does not have one vector of counts per population, or if it does not come
    /// after the previous record: positions must strictly increase on a chromosome, and a
    /// chromosome cannot be returned to.
    pub fn write_record(&mut self, record: &Record) -> Result<(), Error> {
        if record.counts().len() != self.header.len() {
            return Err(Error::RecordShape {
                expected: self.header.len(),
                found: record.counts().len(),
            });
        }

        if let Err(violation) = self.tracker.check(record.chrom(), record.position()) {
            return Err(Error::OutOfOrderWrite {
                chrom: record.chrom().to_string(),
                position: record.position(),
                previous: violation.previous(),
            });
        }

        writeln!(self.body, "{record}")?;
        self.sites += 1;

        Ok(())
    }

    /// Writes the header followed by all records, and returns the inner writer.
    pub fn finish(self) -> Result<W, Error> {
        let Self {
            mut inner,
            header,
            body,
            sites,
            ..
        } = self;

        let mut body = body.into_inner().map_err(io::IntoInnerError::into_error)?;
        body.rewind()?;

        header.write(&mut inner, sites)?;
        io::copy(&mut body, &mut inner)?;
        inner.flush()?;

        log::debug!(target: "counts", "Wrote {sites} sites");

        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::counts::{AlleleCounts, Population, Reader};

    fn header() -> Header {
        Header::new(vec![Population::new("a"), Population::new("b")])
    }

    fn record(chrom: &str, position: usize) -> Record {
        Record::new(
            chrom,
            position,
            vec![AlleleCounts::new([1, 0, 0, 0]), AlleleCounts::new([0, 0, 0, 2])],
        )
    }

    #[test]
    fn test_write_counts_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = Writer::new(Vec::new(), header());

        writer.write_record(&record("chr1", 1))?;
        writer.write_record(&record("chr1", 5))?;
        writer.write_record(&record("chr2", 3))?;
        assert_eq!(writer.sites(), 3);

        let dest = writer.finish()?;

        assert_eq!(
            String::from_utf8(dest)?,
            "COUNTSFILE\tNPOP\t2\tNSITES\t3\n\
            #PLOIDY\t.\t.\n\
            #SAMPLESIZE\t.\t.\n\
            CHROM\tPOS\ta\tb\n\
            chr1\t1\t1,0,0,0\t0,0,0,2\n\
            chr1\t5\t1,0,0,0\t0,0,0,2\n\
            chr2\t3\t1,0,0,0\t0,0,0,2\n"
        );

        Ok(())
    }

    #[test]
    fn test_write_out_of_order() -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = Writer::new(Vec::new(), header());

        writer.write_record(&record("chr1", 5))?;
        assert!(matches!(
            writer.write_record(&record("chr1", 5)),
            Err(Error::OutOfOrderWrite {
                previous: Some(5),
                ..
            })
        ));
        assert!(matches!(
            writer.write_record(&record("chr1", 4)),
            Err(Error::OutOfOrderWrite { .. })
        ));

        writer.write_record(&record("chr2", 1))?;
        assert!(matches!(
            writer.write_record(&record("chr1", 10)),
            Err(Error::OutOfOrderWrite { previous: None, .. })
        ));

        Ok(())
    }

    #[test]
    fn test_write_wrong_shape() {
        let mut writer = Writer::new(Vec::new(), header());
        let record = Record::new("chr1", 1, vec![AlleleCounts::default()]);

        assert!(matches!(
            writer.write_record(&record),
            Err(Error::RecordShape {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_written_file_reads_back_identical() -> Result<(), Box<dyn std::error::Error>> {
        let header = Header::new(vec![
            Population::new("a")
                .with_ploidy(Some(2))
                .with_sample_size(Some(4)),
            Population::new("b").with_ploidy(Some(2)),
            Population::new("c"),
        ])
        .with_comments(vec![String::from("picked individuals: a-1 b-2")]);

        let records = vec![
            Record::new(
                "chr1",
                1,
                vec![
                    AlleleCounts::new([4, 0, 0, 0]),
                    AlleleCounts::new([0, 3, 0, 5]),
                    AlleleCounts::new([1, 1, 1, 1]),
                ],
            ),
            Record::new(
                "chr1",
                7,
                vec![
                    AlleleCounts::default(),
                    AlleleCounts::default(),
                    AlleleCounts::default(),
                ],
            ),
            Record::new(
                "chr2",
                2,
                vec![
                    AlleleCounts::new([0, 0, 2, 2]),
                    AlleleCounts::default(),
                    AlleleCounts::new([0, 0, 0, 12]),
                ],
            ),
        ];

        let mut writer = Writer::new(Vec::new(), header.clone());
        for record in records.iter() {
            writer.write_record(record)?;
        }
        let dest = writer.finish()?;

        let mut reader = Reader::new(&dest[..])?;
        assert_eq!(reader.header(), &header);
        assert_eq!(reader.declared_sites(), records.len());
        assert_eq!(reader.by_ref().collect::<Result<Vec<_>, _>>()?, records);

        Ok(())
    }

    #[test]
    fn test_write_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dest = Writer::new(Vec::new(), header()).finish()?;
        assert!(String::from_utf8(dest)?.starts_with("COUNTSFILE\tNPOP\t2\tNSITES\t0\n"));

        Ok(())
    }
}
