//! Output destinations for writing counts, alignments, and model input.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use noodles_bgzf as bgzf;

/// An output destination for writing.
///
/// Paths ending in `.gz` are written BGZF compressed, so that they remain readable as gzip and
/// can be indexed by tools that expect block compression.
pub enum Output {
    /// Stdout.
    Stdout(BufWriter<io::Stdout>),
    /// An uncompressed file.
    File(BufWriter<File>),
    /// A BGZF compressed file.
    Bgzf(bgzf::Writer<File>),
}

impl Output {
    /// Creates a new output, writing to stdout when no path is provided.
    pub fn create(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => {
                let file = File::create(path)?;

                if path.extension().is_some_and(|extension| extension == "gz") {
                    log::debug!("Writing BGZF compressed output to {}", path.display());
                    Ok(Self::Bgzf(bgzf::Writer::new(file)))
                } else {
                    Ok(Self::File(BufWriter::new(file)))
                }
            }
            None => Ok(Self::Stdout(BufWriter::new(io::stdout()))),
        }
    }

    /// Flushes all buffered output and, for compressed output, writes the end-of-file marker.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Output::Stdout(mut writer) => writer.flush(),
            Output::File(mut writer) => writer.flush(),
            Output::Bgzf(writer) => writer.finish().map(|_| ()),
        }
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(writer) => writer.write(buf),
            Output::File(writer) => writer.write(buf),
            Output::Bgzf(writer) => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(writer) => writer.flush(),
            Output::File(writer) => writer.flush(),
            Output::Bgzf(writer) => writer.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Read;

    use flate2::read::MultiGzDecoder;

    #[test]
    fn test_create_bgzf_for_gz_extension() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.counts.gz");

        let mut output = Output::create(Some(&path))?;
        assert!(matches!(output, Output::Bgzf(_)));
        output.write_all(b"COUNTSFILE\tNPOP\t1\tNSITES\t0\n")?;
        output.finish()?;

        let mut s = String::new();
        MultiGzDecoder::new(File::open(&path)?).read_to_string(&mut s)?;
        assert_eq!(s, "COUNTSFILE\tNPOP\t1\tNSITES\t0\n");

        Ok(())
    }

    #[test]
    fn test_create_plain_file() -> io::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.counts");

        let mut output = Output::create(Some(&path))?;
        assert!(matches!(output, Output::File(_)));
        output.write_all(b"abc")?;
        output.finish()?;

        assert_eq!(std::fs::read(&path)?, b"abc");

        Ok(())
    }
}
