use std::fmt;

/// A population in a Counts file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Population {
    name: String,
    ploidy: Option<usize>,
    sample_size: Option<usize>,
}

impl Population {
    /// Creates a new population with unknown ploidy that is not downsampled.
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            ploidy: None,
            sample_size: None,
        }
    }

    /// Sets the ploidy of the individuals in the population.
    pub fn with_ploidy(mut self, ploidy: Option<usize>) -> Self {
        self.ploidy = ploidy;
        self
    }

    /// Sets the number of alleles each site is downsampled to.
    pub fn with_sample_size(mut self, sample_size: Option<usize>) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ploidy, if known.
    pub fn ploidy(&self) -> Option<usize> {
        self.ploidy
    }

    /// Returns the sample size, or `None` if the population is not downsampled.
    pub fn sample_size(&self) -> Option<usize> {
        self.sample_size
    }
}

/// The header of a Counts file: the ordered populations, and free-text comments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    populations: Vec<Population>,
    comments: Vec<String>,
}

impl Header {
    pub(crate) const MAGIC: &'static str = "COUNTSFILE";
    pub(crate) const PLOIDY: &'static str = "#PLOIDY";
    pub(crate) const SAMPLE_SIZE: &'static str = "#SAMPLESIZE";

    /// Creates a new header.
    pub fn new(populations: Vec<Population>) -> Self {
        Self {
            populations,
            comments: Vec::new(),
        }
    }

    /// Sets the comments, written as `#` lines after the first header line.
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// Returns the comments.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    /// Returns the populations.
    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    /// Returns the population names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.populations.iter().map(Population::name)
    }

    /// Returns the number of populations.
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    /// Returns true if there are no populations.
    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    /// Writes the header lines, declaring the provided number of sites.
    pub(crate) fn write<W>(&self, writer: &mut W, sites: usize) -> std::io::Result<()>
    where
        W: std::io::Write,
    {
        writeln!(
            writer,
            "{}\tNPOP\t{}\tNSITES\t{sites}",
            Self::MAGIC,
            self.len()
        )?;
        for comment in self.comments.iter() {
            writeln!(writer, "# {comment}")?;
        }
        writeln!(
            writer,
            "{}{}",
            Self::PLOIDY,
            Fields(self.populations.iter().map(|p| Optional(p.ploidy)))
        )?;
        writeln!(
            writer,
            "{}{}",
            Self::SAMPLE_SIZE,
            Fields(self.populations.iter().map(|p| Optional(p.sample_size)))
        )?;
        writeln!(
            writer,
            "CHROM\tPOS{}",
            Fields(self.populations.iter().map(Population::name))
        )
    }
}

struct Optional(Option<usize>);

impl fmt::Display for Optional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("."),
        }
    }
}

/// Tab-prefixed fields.
struct Fields<I>(I);

impl<I, T> fmt::Display for Fields<I>
where
    I: Iterator<Item = T> + Clone,
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.clone().try_for_each(|field| write!(f, "\t{field}"))
    }
}
