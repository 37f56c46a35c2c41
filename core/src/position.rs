//! Ordering of genomic positions in a stream.

use indexmap::IndexSet;

/// A violation of stream ordering.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Violation {
    /// Position did not strictly increase on the current chromosome.
    NotIncreasing { previous: usize },
    /// Chromosome was left earlier in the stream.
    Revisited,
}

impl Violation {
    pub(crate) fn previous(&self) -> Option<usize> {
        match self {
            Violation::NotIncreasing { previous } => Some(*previous),
            Violation::Revisited => None,
        }
    }

    pub(crate) fn describe(&self, chrom: &str, position: usize) -> String {
        match self {
            Violation::NotIncreasing { previous } => {
                format!("position {chrom}:{position} does not follow previous position {previous}")
            }
            Violation::Revisited => {
                format!("chromosome '{chrom}' revisited at position {position}")
            }
        }
    }
}

/// Tracks the last seen position to check that a stream is sorted.
///
/// Positions must strictly increase within a chromosome, and a chromosome may not reappear once
/// the stream has moved on from it.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tracker {
    current: Option<(String, usize)>,
    finished: IndexSet<String>,
}

impl Tracker {
    pub(crate) fn check(&mut self, chrom: &str, position: usize) -> Result<(), Violation> {
        match &mut self.current {
            Some((current, previous)) if current.as_str() == chrom => {
                if position > *previous {
                    *previous = position;
                    Ok(())
                } else {
                    Err(Violation::NotIncreasing {
                        previous: *previous,
                    })
                }
            }
            _ if self.finished.contains(chrom) => Err(Violation::Revisited),
            current => {
                if let Some((left, _)) = current.replace((chrom.to_string(), position)) {
                    self.finished.insert(left);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_sorted() {
        let mut tracker = Tracker::default();

        assert_eq!(tracker.check("chr1", 5), Ok(()));
        assert_eq!(tracker.check("chr1", 9), Ok(()));
        assert_eq!(tracker.check("chr2", 1), Ok(()));
        assert_eq!(tracker.check("chr3", 1), Ok(()));
    }

    #[test]
    fn test_tracker_not_increasing() {
        let mut tracker = Tracker::default();

        assert_eq!(tracker.check("chr1", 5), Ok(()));
        assert_eq!(
            tracker.check("chr1", 5),
            Err(Violation::NotIncreasing { previous: 5 })
        );
        assert_eq!(
            tracker.check("chr1", 4),
            Err(Violation::NotIncreasing { previous: 5 })
        );
    }

    #[test]
    fn test_tracker_revisited() {
        let mut tracker = Tracker::default();

        assert_eq!(tracker.check("chr1", 5), Ok(()));
        assert_eq!(tracker.check("chr2", 1), Ok(()));
        assert_eq!(tracker.check("chr1", 6), Err(Violation::Revisited));
    }
}
