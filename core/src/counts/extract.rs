use std::io;

use crate::{
    fasta,
    seq::{Base, Sequence},
};

use super::{AlleleCounts, Downsampler, Error, Reader};

/// The base chosen for a population at each site when extracting sequences.
#[derive(Clone, Debug)]
pub enum Extraction {
    /// The most frequent base, with ties broken in `A`, `C`, `G`, `T` order.
    Consensus,
    /// A random base, drawn with probability proportional to its count.
    Sample(Downsampler),
}

impl Extraction {
    fn choose(&mut self, counts: &AlleleCounts) -> Option<Base> {
        match self {
            Extraction::Consensus => counts.max_base(),
            Extraction::Sample(downsampler) => downsampler.choose(counts),
        }
    }
}

/// Extracts one sequence per population from a Counts file.
///
/// Sites where a population has no alleles are written as `N`. Returns the number of sites read.
pub fn to_fasta<R, W>(
    reader: &mut Reader<R>,
    mut extraction: Extraction,
    writer: &mut fasta::Writer<W>,
) -> Result<usize, Error>
where
    R: io::BufRead,
    W: io::Write,
{
    let mut symbols = vec![Vec::new(); reader.header().len()];
    let mut sites = 0;

    while let Some(record) = reader.read_record()? {
        for (population, counts) in symbols.iter_mut().zip(record.counts()) {
            let symbol = extraction.choose(counts).map_or(b'N', Base::as_u8);
            population.push(symbol);
        }

        sites += 1;
    }

    for (name, symbols) in reader.header().names().zip(symbols) {
        writer.write_sequence(&Sequence::new(name, symbols))?;
    }

    log::debug!(target: "extract", "Extracted {sites} sites");

    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNTS: &[u8] = b"COUNTSFILE\tNPOP\t2\tNSITES\t3\n\
        CHROM\tPOS\tp\tq\n\
        chr1\t1\t2,0,0,0\t0,0,0,0\n\
        chr1\t2\t0,1,1,0\t0,0,0,3\n\
        chr2\t1\t0,0,0,1\t0,2,1,0\n";

    fn extract(extraction: Extraction) -> Result<String, Error> {
        let mut reader = Reader::new(COUNTS)?;
        let mut writer = fasta::Writer::new(Vec::new());

        assert_eq!(to_fasta(&mut reader, extraction, &mut writer)?, 3);

        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    #[test]
    fn test_consensus() -> Result<(), Error> {
        assert_eq!(extract(Extraction::Consensus)?, ">p\nACT\n>q\nNTC\n");

        Ok(())
    }

    #[test]
    fn test_sample() -> Result<(), Error> {
        let fasta = extract(Extraction::Sample(Downsampler::from_seed(7)))?;
        let lines: Vec<&str> = fasta.lines().collect();

        assert_eq!(lines[0], ">p");
        assert!(matches!(lines[1].as_bytes(), [b'A', b'C' | b'G', b'T']));
        assert_eq!(lines[2], ">q");
        assert!(matches!(lines[3].as_bytes(), [b'N', b'T', b'C' | b'G']));

        Ok(())
    }
}
