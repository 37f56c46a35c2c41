use std::io::{self, Write};

use crate::seq::Sequence;

/// A FASTA writer.
pub struct Writer<W> {
    inner: W,
    line_width: usize,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    /// The default number of symbols per line.
    pub const DEFAULT_LINE_WIDTH: usize = 60;

    /// Creates a new writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            line_width: Self::DEFAULT_LINE_WIDTH,
        }
    }

    /// Sets the number of symbols per line; zero writes each sequence on a single line.
    pub fn set_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    /// Writes a sequence, including its region and description in the header.
    pub fn write_sequence(&mut self, sequence: &Sequence) -> io::Result<()> {
        write!(self.inner, ">{}", sequence.name())?;
        if let Some(region) = sequence.region() {
            write!(self.inner, " {region}")?;
        }
        if let Some(description) = sequence.description() {
            write!(self.inner, " {description}")?;
        }
        writeln!(self.inner)?;

        let symbols = sequence.symbols();
        let chunk_size = if self.line_width == 0 {
            symbols.len().max(1)
        } else {
            self.line_width
        };

        for line in symbols.chunks(chunk_size) {
            self.inner.write_all(line)?;
            writeln!(self.inner)?;
        }

        Ok(())
    }

    /// Writes an empty line, separating alignment blocks.
    pub fn write_block_separator(&mut self) -> io::Result<()> {
        writeln!(self.inner)
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        fasta::Reader,
        seq::{Region, Strand},
    };

    #[test]
    fn test_write_wrapped() -> Result<(), Box<dyn std::error::Error>> {
        let region = Region::new("chr2", 5, 14, Strand::Reverse)?;
        let sequence = Sequence::new("pop1", b"ACGTACGTAC".to_vec())
            .with_region(region)
            .with_description("consensus");

        let mut writer = Writer::new(Vec::new()).set_line_width(4);
        writer.write_sequence(&sequence)?;

        let written = writer.into_inner();
        assert_eq!(
            String::from_utf8(written.clone())?,
            ">pop1 chr2:5-14- consensus\nACGT\nACGT\nAC\n"
        );

        let read = Reader::new(&written[..]).read_sequence()?;
        assert_eq!(read, Some(sequence));

        Ok(())
    }

    #[test]
    fn test_write_single_line() -> io::Result<()> {
        let mut writer = Writer::new(Vec::new()).set_line_width(0);
        writer.write_sequence(&Sequence::new("a", b"ACGTACGT".to_vec()))?;

        assert_eq!(writer.into_inner(), b">a\nACGTACGT\n");

        Ok(())
    }
}
