//! Lock-step scanning of multiple VCF readers.

use std::io;

use crate::position::{Tracker, Violation};

use super::{Error, GenotypeCall, Reader};

/// The calls of all readers at one site.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    /// Chromosome of the site.
    pub chrom: String,
    /// One-based position of the site.
    pub position: usize,
    /// Call of each reader at the site, if any.
    pub calls: Vec<Option<GenotypeCall>>,
}

/// A scanner over a number of VCF readers, advancing them site by site.
///
/// Each reader holds one look-ahead call. On each step, the scanner determines the consensus
/// site: the current chromosome while any reader remains on it, and otherwise the chromosome of
/// the first reader that is not exhausted; and the smallest position of any reader on that
/// chromosome. Exactly the readers with a call at the consensus site are advanced.
///
/// If a maximum skip is set, a reader whose next call on the consensus chromosome lies more than
/// this many positions ahead of the consensus position is considered out of sync.
pub struct Scanner<R> {
    readers: Vec<Reader<R>>,
    heads: Vec<Option<GenotypeCall>>,
    max_skip: Option<usize>,
    chrom: Option<String>,
    tracker: Tracker,
}

impl<R> Scanner<R>
where
    R: io::BufRead,
{
    /// Creates a new scanner, reading the first call of every reader.
    pub fn new(mut readers: Vec<Reader<R>>, max_skip: Option<usize>) -> Result<Self, Error> {
        let heads = readers
            .iter_mut()
            .map(Reader::read_call)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            readers,
            heads,
            max_skip,
            chrom: None,
            tracker: Tracker::default(),
        })
    }

    /// Returns the readers.
    pub fn readers(&self) -> &[Reader<R>] {
        &self.readers
    }

    /// Returns the total number of records skipped by the readers for an invalid reference base.
    pub fn invalid_reference(&self) -> usize {
        self.readers.iter().map(Reader::invalid_reference).sum()
    }

    /// Returns the chromosome and position of the next site without advancing, or `None` if all
    /// readers are exhausted.
    pub fn peek(&mut self) -> Result<Option<(&str, usize)>, Error> {
        let Some(position) = self.consensus()? else {
            return Ok(None);
        };

        Ok(self.chrom.as_deref().map(|chrom| (chrom, position)))
    }

    /// Reads the calls at the next site, returning `None` if all readers are exhausted.
    pub fn read_next_base(&mut self) -> Result<Option<Site>, Error> {
        let Some(position) = self.consensus()? else {
            return Ok(None);
        };
        let chrom = self.chrom.clone().unwrap_or_default();

        if let Err(violation) = self.tracker.check(&chrom, position) {
            return Err(match violation {
                Violation::Revisited => Error::ChromosomeOrder { chrom, position },
                Violation::NotIncreasing { .. } => {
                    Error::malformed(0, violation.describe(&chrom, position))
                }
            });
        }

        let mut calls = Vec::with_capacity(self.heads.len());
        for (head, reader) in self.heads.iter_mut().zip(self.readers.iter_mut()) {
            if head
                .as_ref()
                .is_some_and(|call| call.chrom() == chrom && call.position() == position)
            {
                calls.push(head.take());
                *head = reader.read_call()?;
            } else {
                calls.push(None);
            }
        }

        Ok(Some(Site {
            chrom,
            position,
            calls,
        }))
    }

    /// Skips sites on the chromosome before the position, returning the number of sites skipped.
    ///
    /// Sites on other chromosomes are never skipped.
    pub fn seek(&mut self, chrom: &str, position: usize) -> Result<usize, Error> {
        let mut skipped = 0;

        while let Some((next_chrom, next_position)) = self.peek()? {
            if next_chrom != chrom || next_position >= position {
                break;
            }

            self.read_next_base()?;
            skipped += 1;
        }

        Ok(skipped)
    }

    /// Skips the next site.
    pub fn skip(&mut self) -> Result<(), Error> {
        self.read_next_base().map(|_| ())
    }

    fn consensus(&mut self) -> Result<Option<usize>, Error> {
        let on_current = |head: &Option<GenotypeCall>, chrom: &str| {
            head.as_ref().is_some_and(|call| call.chrom() == chrom)
        };

        let current = self
            .chrom
            .as_deref()
            .filter(|&chrom| self.heads.iter().any(|head| on_current(head, chrom)));

        if current.is_none() {
            match self.heads.iter().flatten().next() {
                Some(call) => self.chrom = Some(call.chrom().to_string()),
                None => return Ok(None),
            }
        }

        let chrom = self.chrom.as_deref().unwrap_or_default();

        let Some(consensus) = self
            .heads
            .iter()
            .flatten()
            .filter(|call| call.chrom() == chrom)
            .map(GenotypeCall::position)
            .min()
        else {
            return Ok(None);
        };

        if let Some(max_skip) = self.max_skip {
            let ahead = self.heads.iter().enumerate().find_map(|(reader, head)| {
                head.as_ref()
                    .filter(|call| call.chrom() == chrom)
                    .filter(|call| call.position() - consensus > max_skip)
                    .map(|call| (reader, call.position()))
            });

            if let Some((reader, position)) = ahead {
                return Err(Error::Desync {
                    chrom: chrom.to_string(),
                    consensus,
                    reader,
                    position,
                });
            }
        }

        Ok(Some(consensus))
    }
}

/// A builder of a [`Scanner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Builder {
    ploidy: usize,
    max_skip: Option<usize>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            ploidy: 2,
            max_skip: None,
        }
    }
}

impl Builder {
    /// Builds a scanner from the provided inputs, reading the header of each.
    pub fn build<R, I>(self, inputs: I) -> Result<Scanner<R>, Error>
    where
        R: io::BufRead,
        I: IntoIterator<Item = R>,
    {
        let readers = inputs
            .into_iter()
            .map(|inner| Reader::new(inner, self.ploidy))
            .collect::<Result<Vec<_>, _>>()?;

        Scanner::new(readers, self.max_skip)
    }

    /// Sets the ploidy of the individuals in all inputs.
    pub fn set_ploidy(mut self, ploidy: usize) -> Self {
        self.ploidy = ploidy;
        self
    }

    /// Sets the largest accepted distance between a reader and the consensus position.
    pub fn set_max_skip(mut self, max_skip: usize) -> Self {
        self.max_skip = Some(max_skip);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vcf(samples: &[&str], records: &[(&str, usize, &str)]) -> Vec<u8> {
        let mut s = format!(
            "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}\n",
            samples.join("\t")
        );

        for (chrom, position, genotypes) in records {
            s.push_str(&format!("{chrom}\t{position}\t.\tA\tC\t.\t.\t.\tGT\t{genotypes}\n"));
        }

        s.into_bytes()
    }

    type Positions = Vec<(String, usize, Vec<bool>)>;

    fn positions<R>(scanner: &mut Scanner<R>) -> Result<Positions, Error>
    where
        R: io::BufRead,
    {
        let mut positions = Vec::new();

        while let Some(site) = scanner.read_next_base()? {
            let present = site.calls.iter().map(Option::is_some).collect();
            positions.push((site.chrom, site.position, present));
        }

        Ok(positions)
    }

    #[test]
    fn test_lock_step() -> Result<(), Error> {
        let a = vcf(&["a"], &[("chr1", 2, "0/1"), ("chr1", 5, "1/1"), ("chr2", 1, "0/0")]);
        let b = vcf(&["b"], &[("chr1", 5, "0/1"), ("chr1", 6, "0/1")]);

        let mut scanner = Builder::default().build([&a[..], &b[..]])?;

        assert_eq!(
            positions(&mut scanner)?,
            [
                (String::from("chr1"), 2, vec![true, false]),
                (String::from("chr1"), 5, vec![true, true]),
                (String::from("chr1"), 6, vec![false, true]),
                (String::from("chr2"), 1, vec![true, false]),
            ]
        );
        assert!(scanner.read_next_base()?.is_none());

        Ok(())
    }

    #[test]
    fn test_desync() -> Result<(), Error> {
        let a = vcf(&["a"], &[("chr1", 1, "0/1"), ("chr1", 2, "0/1")]);
        let b = vcf(&["b"], &[("chr1", 4, "0/1")]);

        let mut scanner = Builder::default().set_max_skip(3).build([&a[..], &b[..]])?;
        assert!(scanner.read_next_base()?.is_some());

        let mut scanner = Builder::default().set_max_skip(2).build([&a[..], &b[..]])?;
        assert!(matches!(
            scanner.read_next_base(),
            Err(Error::Desync {
                consensus: 1,
                reader: 1,
                position: 4,
                ..
            })
        ));

        Ok(())
    }

    #[test]
    fn test_chromosome_order() -> Result<(), Error> {
        let a = vcf(&["a"], &[("chr1", 1, "0/1"), ("chr2", 1, "0/1")]);
        let b = vcf(&["b"], &[("chr2", 5, "0/1"), ("chr1", 9, "0/1")]);

        let mut scanner = Builder::default().build([&a[..], &b[..]])?;

        assert!(scanner.read_next_base()?.is_some());
        assert!(scanner.read_next_base()?.is_some());
        assert!(scanner.read_next_base()?.is_some());
        assert!(matches!(
            scanner.read_next_base(),
            Err(Error::ChromosomeOrder { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_seek() -> Result<(), Error> {
        let a = vcf(&["a"], &[("chr1", 1, "0/1"), ("chr1", 3, "0/1"), ("chr2", 1, "0/1")]);
        let b = vcf(&["b"], &[("chr1", 2, "0/1"), ("chr1", 7, "0/1")]);

        let mut scanner = Builder::default().build([&a[..], &b[..]])?;

        assert_eq!(scanner.seek("chr1", 3)?, 2);
        assert_eq!(scanner.peek()?, Some(("chr1", 3)));
        assert_eq!(scanner.seek("chr1", 100)?, 2);
        assert_eq!(scanner.peek()?, Some(("chr2", 1)));
        assert_eq!(scanner.seek("chr1", 200)?, 0);

        Ok(())
    }
}
