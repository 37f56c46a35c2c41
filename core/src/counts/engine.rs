use std::{cmp::Ordering, collections::VecDeque, io};

use indexmap::IndexSet;

use crate::{
    fasta::{self, alignment, filter::FilterConfig, Alignment},
    seq::{iupac, Base, Sequence},
    vcf::{self, Scanner},
};

use super::{
    population::Assignment, AbsentPolicy, AlleleCounts, Builder, Downsampler, Error, Header,
    Insufficient, Population, Populations, Record, RefCheck, Skip, Statistics, Writer,
    ZeroCoverage,
};

/// The state of an [`Engine`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// No site has been requested yet.
    Idle,
    /// Looking for the next site to emit.
    Scanning,
    /// A record has just been emitted.
    EmittingSite,
    /// All input has been consumed.
    Exhausted,
    /// An error occurred, and no more records can be produced.
    Error,
}

/// An engine producing allele count records from alignments or variant calls.
///
/// Created by a [`Builder`]. Records are produced one at a time by [`Engine::next_record`], with
/// skipped sites counted in the [`Statistics`].
pub struct Engine<R> {
    source: Source<R>,
    assignment: Assignment,
    settings: Builder,
    header: Header,
    downsampler: Option<Downsampler>,
    statistics: Statistics,
    state: State,
}

impl<R> Engine<R>
where
    R: io::BufRead,
{
    pub(super) fn new(
        source: Source<R>,
        assignment: Assignment,
        settings: Builder,
        ploidy: usize,
        downsampler: Option<Downsampler>,
        comments: Vec<String>,
    ) -> Self {
        let header = Header::new(
            assignment
                .names()
                .map(|name| {
                    Population::new(name)
                        .with_ploidy(Some(ploidy))
                        .with_sample_size(settings.sample_size)
                })
                .collect(),
        )
        .with_comments(comments);

        Self {
            source,
            assignment,
            settings,
            header,
            downsampler,
            statistics: Statistics::default(),
            state: State::Idle,
        }
    }

    /// Returns the header of the records.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the statistics so far.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Returns the current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the next record, or `None` when the input is exhausted.
    ///
    /// # Errors
    ///
    /// If reading the input fails. After an error, the engine cannot continue, and every later
    /// call fails with [`Error::Halted`].
    pub fn next_record(&mut self) -> Result<Option<Record>, Error> {
        match self.state {
            State::Exhausted => return Ok(None),
            State::Error => return Err(Error::Halted),
            State::Idle | State::Scanning | State::EmittingSite => (),
        }

        self.state = State::Scanning;

        loop {
            let site = match self.scan() {
                Ok(Some(site)) => site,
                Ok(None) => {
                    self.state = State::Exhausted;
                    return Ok(None);
                }
                Err(e) => {
                    self.state = State::Error;
                    return Err(e);
                }
            };

            if let Some(record) = self.count(site) {
                self.statistics.emit();
                self.state = State::EmittingSite;
                return Ok(Some(record));
            }
        }
    }

    /// Writes all remaining records, returning the statistics.
    pub fn run<W>(mut self, writer: &mut Writer<W>) -> Result<Statistics, Error>
    where
        W: io::Write,
    {
        while let Some(record) = self.next_record()? {
            writer.write_record(&record)?;
        }

        Ok(self.finish())
    }

    /// Logs a summary of the statistics and returns them.
    pub fn finish(self) -> Statistics {
        self.statistics.summarize();
        self.statistics
    }

    fn scan(&mut self) -> Result<Option<RawSite>, Error> {
        let site = self
            .source
            .next_site(&mut self.assignment, &mut self.statistics)?;

        if site.is_none() {
            self.source.finish(&mut self.statistics)?;
        }

        Ok(site)
    }

    fn count(&mut self, site: RawSite) -> Option<Record> {
        let RawSite {
            chrom,
            position,
            reference,
            mut counts,
        } = site;

        if let Some(max_alleles) = self.settings.max_alleles {
            let total = counts.iter().fold(AlleleCounts::default(), |mut total, x| {
                total += x;
                total
            });

            if total.distinct(self.settings.noise) > max_alleles {
                self.statistics.skip(Skip::Multiallelic, &chrom, position);
                return None;
            }
        }

        for counts in counts.iter_mut() {
            if counts.is_empty() {
                self.statistics.zero_coverage_population();
            }
        }

        if let (Some(sample_size), Some(downsampler)) =
            (self.settings.sample_size, self.downsampler.as_mut())
        {
            for counts in counts.iter_mut() {
                *counts = match downsampler.downsample(counts, sample_size) {
                    Some(downsampled) => downsampled,
                    None if counts.is_empty() => match (self.settings.zero_coverage, reference) {
                        (ZeroCoverage::ForceReference, Some(base)) => {
                            AlleleCounts::fixed(base, sample_size)
                        }
                        _ => {
                            self.statistics.missing_population();
                            AlleleCounts::default()
                        }
                    },
                    None => match self.settings.insufficient {
                        Insufficient::SkipSite => {
                            self.statistics
                                .skip(Skip::InsufficientCoverage, &chrom, position);
                            return None;
                        }
                        Insufficient::MarkMissing => {
                            self.statistics.missing_population();
                            AlleleCounts::default()
                        }
                    },
                };
            }
        }

        Some(Record::new(chrom, position, counts))
    }
}

/// The reference sequence input of an engine counting variant calls.
pub enum Reference<R> {
    /// Each sequence of a FASTA file is a reference sequence.
    Sequences(fasta::Reader<R>),
    /// The first row of each alignment is a reference sequence.
    Alignments(alignment::Reader<R>),
}

impl<R> From<fasta::Reader<R>> for Reference<R> {
    fn from(reader: fasta::Reader<R>) -> Self {
        Self::Sequences(reader)
    }
}

impl<R> From<alignment::Reader<R>> for Reference<R> {
    fn from(reader: alignment::Reader<R>) -> Self {
        Self::Alignments(reader)
    }
}

impl<R> Reference<R>
where
    R: io::BufRead,
{
    fn read_reference(
        &mut self,
        filters: &FilterConfig,
        statistics: &mut Statistics,
    ) -> Result<Option<Sequence>, Error> {
        match self {
            Reference::Sequences(reader) => {
                let Some(mut sequence) = reader.read_sequence()? else {
                    return Ok(None);
                };

                if sequence.needs_orientation() {
                    sequence.reverse_complement()?;
                }

                Ok(Some(sequence))
            }
            Reference::Alignments(reader) => {
                while let Some(mut alignment) = reader.read_alignment()? {
                    alignment.orient(true)?;

                    if filters.apply(&alignment, statistics.alignments_mut()) {
                        return Ok(alignment.into_rows().into_iter().next());
                    }
                }

                Ok(None)
            }
        }
    }
}

/// The counts of all populations at a site, before filtering and downsampling.
pub(super) struct RawSite {
    chrom: String,
    position: usize,
    reference: Option<Base>,
    counts: Vec<AlleleCounts>,
}

pub(super) enum Source<R> {
    Alignments(AlignmentSource<R>),
    Variants(VariantSource<R>),
}

impl<R> Source<R>
where
    R: io::BufRead,
{
    fn next_site(
        &mut self,
        assignment: &mut Assignment,
        statistics: &mut Statistics,
    ) -> Result<Option<RawSite>, Error> {
        match self {
            Source::Alignments(source) => source.next_site(assignment, statistics),
            Source::Variants(source) => source.next_site(assignment, statistics),
        }
    }

    fn finish(&mut self, statistics: &mut Statistics) -> Result<(), Error> {
        match self {
            Source::Alignments(_) => Ok(()),
            Source::Variants(source) => source.finish(statistics),
        }
    }
}

/// An alignment being counted column by column.
struct Block {
    alignment: Alignment,
    chrom: String,
    start: usize,
    column: usize,
}

pub(super) struct AlignmentSource<R> {
    reader: alignment::Reader<R>,
    pending: Option<Alignment>,
    block: Option<Block>,
    populations: Populations,
    filters: FilterConfig,
    chrom: String,
    counter: usize,
    weight: usize,
}

impl<R> AlignmentSource<R>
where
    R: io::BufRead,
{
    pub(super) fn new(
        reader: alignment::Reader<R>,
        first: Alignment,
        populations: Populations,
        settings: &Builder,
    ) -> Self {
        Self {
            reader,
            pending: Some(first),
            block: None,
            populations,
            filters: settings.filters.clone(),
            chrom: settings.chrom.clone(),
            counter: 0,
            weight: if settings.double_fixed_sites { 2 } else { 1 },
        }
    }

    fn next_block(
        &mut self,
        assignment: &mut Assignment,
        statistics: &mut Statistics,
    ) -> Result<Option<Block>, Error> {
        loop {
            let mut alignment = match self.pending.take() {
                Some(alignment) => alignment,
                None => match self.reader.read_alignment()? {
                    Some(alignment) => alignment,
                    None => return Ok(None),
                },
            };

            alignment.orient(false)?;

            if !self.filters.apply(&alignment, statistics.alignments_mut()) {
                continue;
            }

            let names: Vec<&str> = alignment.rows().iter().map(|row| row.name()).collect();
            assignment.reassign(&self.populations, 0, &names)?;

            let (chrom, start) = match alignment.region() {
                Some(region) => (region.chrom().to_string(), region.start()),
                None => {
                    let start = self.counter + 1;
                    self.counter += alignment.width();
                    (self.chrom.clone(), start)
                }
            };

            log::debug!(
                target: "counts",
                "Counting alignment of {} sequences at {chrom}:{start}",
                alignment.len()
            );

            return Ok(Some(Block {
                alignment,
                chrom,
                start,
                column: 0,
            }));
        }
    }

    fn next_site(
        &mut self,
        assignment: &mut Assignment,
        statistics: &mut Statistics,
    ) -> Result<Option<RawSite>, Error> {
        loop {
            let exhausted = self
                .block
                .as_ref()
                .map_or(true, |block| block.column >= block.alignment.width());

            if exhausted {
                self.block = self.next_block(assignment, statistics)?;

                if self.block.is_none() {
                    return Ok(None);
                }

                continue;
            }

            let Some(block) = self.block.as_mut() else {
                continue;
            };

            let column = block.column;
            block.column += 1;
            statistics.read_site();

            let mut counts = vec![AlleleCounts::default(); assignment.len()];
            for (row, symbol) in block.alignment.column(column).enumerate() {
                if let Some(population) = assignment.get(0, row) {
                    counts[population.0].add_symbol(symbol, self.weight);
                }
            }

            let reference = Base::try_from(block.alignment.reference().symbols()[column]).ok();

            return Ok(Some(RawSite {
                chrom: block.chrom.clone(),
                position: block.start + column,
                reference,
                counts,
            }));
        }
    }
}

/// A reference sequence being walked coordinate by coordinate.
struct Cursor {
    sequence: Sequence,
    chrom: String,
    index: usize,
    position: usize,
}

pub(super) struct VariantSource<R> {
    reference: Reference<R>,
    scanner: Scanner<R>,
    cursor: Option<Cursor>,
    pending: VecDeque<Cursor>,
    chromosomes: IndexSet<String>,
    reference_exhausted: bool,
    matched: Option<usize>,
    unknown: IndexSet<String>,
    filters: FilterConfig,
    ploidy: usize,
    absent: AbsentPolicy,
    ref_check: RefCheck,
    only_synonymous: bool,
}

enum Step {
    Take,
    Seek,
    Skip,
    ReadAhead,
    Stop,
}

impl<R> VariantSource<R>
where
    R: io::BufRead,
{
    pub(super) fn new(
        reference: Reference<R>,
        scanner: Scanner<R>,
        ploidy: usize,
        settings: &Builder,
    ) -> Self {
        Self {
            reference,
            scanner,
            cursor: None,
            pending: VecDeque::new(),
            chromosomes: IndexSet::new(),
            reference_exhausted: false,
            matched: None,
            unknown: IndexSet::new(),
            filters: settings.filters.clone(),
            ploidy,
            absent: settings.absent,
            ref_check: settings.ref_check,
            only_synonymous: settings.only_synonymous,
        }
    }

    /// Reads the next reference sequence, recording its chromosome in reference order.
    fn read_cursor(&mut self, statistics: &mut Statistics) -> Result<Option<Cursor>, Error> {
        if self.reference_exhausted {
            return Ok(None);
        }

        let Some(sequence) = self.reference.read_reference(&self.filters, statistics)? else {
            self.reference_exhausted = true;
            return Ok(None);
        };

        let (chrom, start) = match sequence.region() {
            Some(region) => (region.chrom().to_string(), region.start()),
            None => (sequence.name().to_string(), 1),
        };

        self.chromosomes.insert(chrom.clone());

        Ok(Some(Cursor {
            sequence,
            chrom,
            index: 0,
            position: start,
        }))
    }

    fn next_cursor(&mut self, statistics: &mut Statistics) -> Result<Option<Cursor>, Error> {
        let cursor = match self.pending.pop_front() {
            Some(cursor) => cursor,
            None => match self.read_cursor(statistics)? {
                Some(cursor) => cursor,
                None => return Ok(None),
            },
        };

        log::debug!(
            target: "counts",
            "Counting variants along reference '{}' from {}:{}",
            cursor.sequence.name(),
            cursor.chrom,
            cursor.position,
        );

        Ok(Some(cursor))
    }

    /// Advances the scanner to the reference coordinate, returning the calls at it, if any.
    ///
    /// Variant sites before the coordinate on the same chromosome, on a chromosome the reference
    /// has already left, or on a chromosome missing from the reference, are skipped as
    /// unmatched. Whether a chromosome comes later in the reference is decided by reading the
    /// reference ahead.
    fn calls_at(
        &mut self,
        chrom: &str,
        position: usize,
        statistics: &mut Statistics,
    ) -> Result<Option<vcf::Site>, Error> {
        let current = self.chromosomes.get_index_of(chrom);

        loop {
            let step = match self.scanner.peek()? {
                None => Step::Stop,
                Some((next_chrom, next_position)) if next_chrom == chrom => {
                    match next_position.cmp(&position) {
                        Ordering::Less => Step::Seek,
                        Ordering::Equal => Step::Take,
                        Ordering::Greater => Step::Stop,
                    }
                }
                Some((next_chrom, next_position)) => {
                    match self.chromosomes.get_index_of(next_chrom) {
                        Some(index) if Some(index) > current => Step::Stop,
                        Some(index) if self.matched.is_some_and(|matched| matched > index) => {
                            return Err(Error::Vcf(vcf::Error::ReferenceOrder {
                                chrom: next_chrom.to_string(),
                                position: next_position,
                            }))
                        }
                        Some(_) => Step::Skip,
                        None if !self.reference_exhausted => Step::ReadAhead,
                        None => {
                            if self.unknown.insert(next_chrom.to_string()) {
                                log::warn!(
                                    target: "counts",
                                    "Skipping variant calls on chromosome '{next_chrom}', \
                                    which is not in the reference"
                                );
                            }

                            Step::Skip
                        }
                    }
                }
            };

            match step {
                Step::Take => {
                    self.matched = self.matched.max(current);
                    return Ok(self.scanner.read_next_base()?);
                }
                Step::Seek => {
                    *statistics.unmatched_calls_mut() += self.scanner.seek(chrom, position)?;
                }
                Step::Skip => {
                    self.scanner.skip()?;
                    *statistics.unmatched_calls_mut() += 1;
                }
                Step::ReadAhead => {
                    if let Some(cursor) = self.read_cursor(statistics)? {
                        self.pending.push_back(cursor);
                    }
                }
                Step::Stop => return Ok(None),
            }
        }
    }

    fn next_site(
        &mut self,
        assignment: &mut Assignment,
        statistics: &mut Statistics,
    ) -> Result<Option<RawSite>, Error> {
        loop {
            let exhausted = self
                .cursor
                .as_ref()
                .map_or(true, |cursor| cursor.index >= cursor.sequence.len());

            if exhausted {
                let Some(next) = self.next_cursor(statistics)? else {
                    return Ok(None);
                };

                self.cursor = Some(next);
                continue;
            }

            let Some(cursor) = self.cursor.as_mut() else {
                continue;
            };

            let index = cursor.index;
            let symbol = cursor.sequence.symbols()[index];
            cursor.index += 1;

            if iupac::is_gap(symbol) {
                continue;
            }

            let position = cursor.position;
            cursor.position += 1;

            let chrom = cursor.chrom.clone();
            let synonymous = !self.only_synonymous || cursor.sequence.is_synonymous(index);

            statistics.read_site();
            let site = self.calls_at(&chrom, position, statistics)?;

            if !synonymous {
                statistics.skip(Skip::NonSynonymous, &chrom, position);
                continue;
            }

            let Ok(reference) = Base::try_from(symbol) else {
                statistics.skip(Skip::InvalidReference, &chrom, position);
                continue;
            };

            let calls = match site {
                Some(site) => site.calls,
                None => vec![None; self.scanner.readers().len()],
            };

            if let Some(call) = calls
                .iter()
                .flatten()
                .find(|call| call.reference() != reference)
            {
                match self.ref_check {
                    RefCheck::Fail => {
                        return Err(Error::Vcf(vcf::Error::RefMismatch {
                            chrom,
                            position,
                            expected: reference.as_u8(),
                            found: call.reference().as_u8(),
                        }))
                    }
                    RefCheck::WarnAndSkip => {
                        statistics.skip(Skip::RefMismatch, &chrom, position);
                        continue;
                    }
                    RefCheck::Ignore => (),
                }
            }

            if self.absent == AbsentPolicy::Skip && calls.iter().all(Option::is_none) {
                statistics.skip(Skip::Uncalled, &chrom, position);
                continue;
            }

            let mut counts = vec![AlleleCounts::default(); assignment.len()];
            for (input, call) in calls.iter().enumerate() {
                match call {
                    Some(call) => {
                        for individual in 0..call.individuals() {
                            if let Some(population) = assignment.get(input, individual) {
                                for base in call.bases(individual).flatten() {
                                    counts[population.0].add(base, 1);
                                }
                            }
                        }
                    }
                    None if self.absent == AbsentPolicy::Reference => {
                        let individuals = self.scanner.readers()[input].header().samples().len();
                        for individual in 0..individuals {
                            if let Some(population) = assignment.get(input, individual) {
                                counts[population.0].add(reference, self.ploidy);
                            }
                        }
                    }
                    None => (),
                }
            }

            return Ok(Some(RawSite {
                chrom,
                position,
                reference: Some(reference),
                counts,
            }));
        }
    }

    fn finish(&mut self, statistics: &mut Statistics) -> Result<(), Error> {
        while self.scanner.peek()?.is_some() {
            self.scanner.skip()?;
            *statistics.unmatched_calls_mut() += 1;
        }

        statistics.set_invalid_calls(self.scanner.invalid_reference());

        Ok(())
    }
}
