use noodles_vcf as vcf;
use vcf::record::{
    genotypes::sample::value::genotype::Genotype as VcfGenotype, Chromosome, Record as VcfRecord,
};

use crate::seq::Base;

use super::Error;

/// The genotype calls of all individuals in a VCF file at one site.
#[derive(Clone, Debug, PartialEq)]
pub struct GenotypeCall {
    chrom: String,
    position: usize,
    reference: Base,
    indel: bool,
    symbolic: bool,
    alternates: Vec<String>,
    alternate_bases: Vec<Base>,
    quality: Option<f64>,
    ploidy: usize,
    alleles: Vec<Option<usize>>,
}

/// A record skipped since its reference allele does not start with an unambiguous base.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct InvalidReference {
    pub(crate) chrom: String,
    pub(crate) position: usize,
}

impl GenotypeCall {
    /// Returns the chromosome.
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Returns the one-based position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the reference base, i.e. the first base of the reference allele.
    pub fn reference(&self) -> Base {
        self.reference
    }

    /// Returns true if the reference allele is not a single base, or any alternate allele is not
    /// a single `A,C,G,T` base.
    ///
    /// All alleles of an indel are counted as the reference base.
    pub fn is_indel(&self) -> bool {
        self.indel
    }

    /// Returns true if any alternate allele is symbolic or contains other symbols than `A,C,G,T`.
    ///
    /// Such calls are treated like indels.
    pub fn has_symbolic_alternate(&self) -> bool {
        self.symbolic
    }

    /// Returns the alternate alleles.
    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    /// Returns the quality, if any.
    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    /// Returns the ploidy.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Returns the number of individuals.
    pub fn individuals(&self) -> usize {
        self.alleles.len() / self.ploidy
    }

    /// Returns the allele indices of each chromosome copy of an individual, with `None` for
    /// missing alleles.
    pub fn alleles(&self, individual: usize) -> &[Option<usize>] {
        &self.alleles[individual * self.ploidy..(individual + 1) * self.ploidy]
    }

    /// Returns the observed base of each chromosome copy of an individual.
    ///
    /// Missing alleles are `None`. The reference allele and all alleles of indels are returned as
    /// the reference base.
    pub fn bases(&self, individual: usize) -> impl Iterator<Item = Option<Base>> + '_ {
        self.alleles(individual)
            .iter()
            .map(move |allele| allele.map(|index| self.allele_base(index)))
    }

    fn allele_base(&self, index: usize) -> Base {
        // Allele indices are checked against the alternates, which are all single bases unless
        // the call is an indel.
        if self.indel || index == 0 {
            self.reference
        } else {
            self.alternate_bases[index - 1]
        }
    }

    /// Creates a call from a VCF record.
    ///
    /// The outer result is an error if the record is malformed, while the inner result is an
    /// error if the record is well-formed but must be skipped for an invalid reference base.
    pub(crate) fn from_record(
        line: usize,
        record: &VcfRecord,
        samples: usize,
        ploidy: usize,
    ) -> Result<Result<Self, InvalidReference>, Error> {
        let chrom = match record.chromosome() {
            Chromosome::Name(s) | Chromosome::Symbol(s) => s.to_string(),
        };
        let position = usize::from(record.position());

        let reference_allele = record.reference_bases().to_string();
        let alternates: Vec<String> = record
            .alternate_bases()
            .iter()
            .map(|allele| allele.to_string())
            .collect();
        let quality = record
            .quality_score()
            .map(|score| f64::from(f32::from(score)));

        if !record
            .genotypes()
            .keys()
            .iter()
            .any(|key| key.to_string() == "GT")
        {
            return Err(Error::malformed(line, "FORMAT does not contain GT"));
        }

        let genotypes = record
            .genotypes()
            .genotypes()
            .map_err(|e| Error::malformed(line, e.to_string()))?;

        if genotypes.len() != samples {
            return Err(Error::malformed(
                line,
                format!("expected {samples} samples, found {}", genotypes.len()),
            ));
        }

        let mut alleles = Vec::with_capacity(samples * ploidy);
        for genotype in genotypes.iter() {
            push_genotype(
                line,
                genotype.as_ref(),
                ploidy,
                alternates.len(),
                &mut alleles,
            )?;
        }

        let Some(reference) = reference_allele
            .bytes()
            .next()
            .and_then(|b| Base::try_from(b).ok())
        else {
            return Ok(Err(InvalidReference { chrom, position }));
        };

        let symbolic = !alternates.iter().all(|alt| is_bases(alt));
        let alternate_bases: Vec<Base> = alternates
            .iter()
            .filter_map(|alt| single_base(alt))
            .collect();
        let indel = reference_allele.len() > 1 || alternate_bases.len() != alternates.len();

        Ok(Ok(Self {
            chrom,
            position,
            reference,
            indel,
            symbolic,
            alternates,
            alternate_bases: if indel { Vec::new() } else { alternate_bases },
            quality,
            ploidy,
            alleles,
        }))
    }
}

fn single_base(allele: &str) -> Option<Base> {
    match allele.as_bytes() {
        &[b] if is_bases(allele) => Base::try_from(b).ok(),
        _ => None,
    }
}

fn is_bases(allele: &str) -> bool {
    !allele.is_empty()
        && allele
            .bytes()
            .all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T'))
}

fn push_genotype(
    line: usize,
    genotype: Option<&VcfGenotype>,
    ploidy: usize,
    alternates: usize,
    alleles: &mut Vec<Option<usize>>,
) -> Result<(), Error> {
    let positions: Vec<Option<usize>> = match genotype {
        Some(genotype) => genotype[..].iter().map(|allele| allele.position()).collect(),
        None => Vec::new(),
    };

    if positions.is_empty() || positions == [None] {
        alleles.extend(std::iter::repeat(None).take(ploidy));
        return Ok(());
    }

    if positions.len() != ploidy {
        return Err(Error::malformed(
            line,
            format!(
                "genotype has {} alleles, expected ploidy {ploidy}",
                positions.len()
            ),
        ));
    }

    if let Some(index) = positions.iter().flatten().find(|&&index| index > alternates) {
        return Err(Error::malformed(
            line,
            format!("allele index {index} exceeds {alternates} alternate alleles"),
        ));
    }

    alleles.extend(positions);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    use crate::vcf::Reader;

    fn parse(s: &str, samples: usize, ploidy: usize) -> Result<GenotypeCall, Error> {
        let names: Vec<String> = (1..=samples).map(|i| format!("\tind{i}")).collect();
        let vcf = format!(
            "##fileformat=VCFv4.2\n\
            #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT{}\n{s}\n",
            names.concat()
        );

        let mut reader = Reader::new(vcf.as_bytes(), ploidy)?;
        reader
            .read_call()?
            .ok_or_else(|| Error::malformed(3, "record skipped"))
    }

    #[test]
    fn test_parse_call() -> Result<(), Error> {
        let call = parse("chr1\t5\t.\tA\tC,T\t30\tPASS\t.\tGT:DP\t0/1:3\t2|.\t./.", 3, 2)?;

        assert_eq!(call.chrom(), "chr1");
        assert_eq!(call.position(), 5);
        assert_eq!(call.reference(), Base::A);
        assert_eq!(call.alternates(), ["C", "T"]);
        assert_eq!(call.quality(), Some(30.0));
        assert!(!call.is_indel());
        assert!(!call.has_symbolic_alternate());
        assert_eq!(call.individuals(), 3);
        assert_eq!(call.alleles(1), [Some(2), None]);

        assert_eq!(
            call.bases(0).collect::<Vec<_>>(),
            [Some(Base::A), Some(Base::C)]
        );
        assert_eq!(call.bases(1).collect::<Vec<_>>(), [Some(Base::T), None]);
        assert_eq!(call.bases(2).collect::<Vec<_>>(), [None, None]);

        Ok(())
    }

    #[test]
    fn test_parse_indel_counts_as_reference() -> Result<(), Error> {
        let call = parse("chr1\t5\t.\tGA\tG\t.\t.\t.\tGT\t1/1", 1, 2)?;

        assert!(call.is_indel());
        assert!(!call.has_symbolic_alternate());
        assert_eq!(call.reference(), Base::G);
        assert_eq!(
            call.bases(0).collect::<Vec<_>>(),
            [Some(Base::G), Some(Base::G)]
        );

        Ok(())
    }

    #[test]
    fn test_parse_symbolic_alternate_counts_as_reference() -> Result<(), Error> {
        for alternates in ["<DEL>", "N", "T,*"] {
            let call = parse(
                &format!("chr1\t5\t.\tC\t{alternates}\t.\t.\t.\tGT\t0/1"),
                1,
                2,
            )?;

            assert!(call.has_symbolic_alternate());
            assert!(call.is_indel());
            assert_eq!(
                call.bases(0).collect::<Vec<_>>(),
                [Some(Base::C), Some(Base::C)]
            );
        }

        Ok(())
    }

    #[test]
    fn test_parse_missing_genotype_and_haploid() -> Result<(), Error> {
        let call = parse("chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t.\t1", 2, 1)?;

        assert_eq!(call.alleles(0), [None]);
        assert_eq!(call.alleles(1), [Some(1)]);

        let call = parse("chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t.\t1/0", 2, 2)?;
        assert_eq!(call.alleles(0), [None, None]);
        assert_eq!(call.alleles(1), [Some(1), Some(0)]);

        Ok(())
    }

    #[test]
    fn test_push_genotype() -> Result<(), Box<dyn std::error::Error>> {
        let mut alleles = Vec::new();

        push_genotype(1, Some(&VcfGenotype::from_str("0|1")?), 2, 1, &mut alleles)?;
        push_genotype(1, Some(&VcfGenotype::from_str("./1")?), 2, 1, &mut alleles)?;
        push_genotype(1, None, 2, 1, &mut alleles)?;
        assert_eq!(alleles, [Some(0), Some(1), None, Some(1), None, None]);

        let triploid = VcfGenotype::from_str("0/0/0")?;
        assert!(push_genotype(1, Some(&triploid), 2, 1, &mut alleles).is_err());

        let out_of_range = VcfGenotype::from_str("1/2")?;
        assert!(push_genotype(1, Some(&out_of_range), 2, 1, &mut alleles).is_err());

        Ok(())
    }

    #[test]
    fn test_parse_wrong_ploidy() {
        assert!(matches!(
            parse("chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t0/1/1", 1, 2),
            Err(Error::MalformedFormat { .. })
        ));
        assert!(parse("chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t0", 1, 2).is_err());
    }

    #[test]
    fn test_parse_allele_out_of_range() {
        assert!(parse("chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t0/2", 1, 2).is_err());
        assert!(parse("chr1\t5\t.\tA\t.\t.\t.\t.\tGT\t0/1", 1, 2).is_err());
    }

    #[test]
    fn test_parse_missing_gt() {
        assert!(parse("chr1\t5\t.\tA\tT\t.\t.\t.\tDP\t4", 1, 2).is_err());
    }

    #[test]
    fn test_parse_wrong_sample_count() {
        assert!(parse("chr1\t5\t.\tA\tT\t.\t.\t.\tGT\t0/1\t0/0", 1, 2).is_err());
    }
}
