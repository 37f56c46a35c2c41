//! Assignment of individuals to populations.

use std::{fs::File, io, path::Path};

use indexmap::{IndexMap, IndexSet};

use rand::{seq::SliceRandom, Rng};

use super::Error;

/// The index of a population, in order of first appearance.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PopulationId(pub usize);

/// An explicit map from sample names to population names.
///
/// Read from lines of the form `sample<TAB>population`. A line without a tab assigns the sample
/// to a population of its own name. Empty lines and lines starting with `#` are skipped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PopulationMap {
    samples: IndexMap<String, PopulationId>,
    populations: Names,
}

impl PopulationMap {
    /// Reads a map from a path.
    pub fn from_path<P>(path: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        File::open(path).and_then(Self::from_reader)
    }

    /// Reads a map from a reader.
    pub fn from_reader<R>(mut reader: R) -> io::Result<Self>
    where
        R: io::Read,
    {
        let mut s = String::new();
        let _ = reader.read_to_string(&mut s)?;

        Ok(Self::from_str(&s))
    }

    fn from_str(s: &str) -> Self {
        s.lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.split_once('\t').unwrap_or((line, line)))
            .collect()
    }

    /// Returns the population of a sample.
    pub fn get(&self, sample: &str) -> Option<PopulationId> {
        self.samples.get(sample).copied()
    }

    /// Returns the name of the population a sample belongs to.
    pub fn population_of(&self, sample: &str) -> Option<&str> {
        self.get(sample).and_then(|id| self.populations.name(id))
    }

    /// Returns the population names in order of first appearance.
    pub fn populations(&self) -> impl Iterator<Item = &str> {
        self.populations.0.iter().map(String::as_str)
    }

    /// Returns the number of populations.
    pub fn number_of_populations(&self) -> usize {
        self.populations.0.len()
    }

    /// Returns the sample names.
    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.samples.keys().map(String::as_str)
    }

    /// Returns true if no samples are mapped.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl<S, P> FromIterator<(S, P)> for PopulationMap
where
    S: Into<String>,
    P: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
    {
        let mut populations = Names::default();

        let samples = iter
            .into_iter()
            .map(|(sample, population)| {
                (sample.into(), populations.get_or_insert(population.into()))
            })
            .collect();

        Self {
            samples,
            populations,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Names(IndexSet<String>);

impl Names {
    fn get(&self, name: &str) -> Option<PopulationId> {
        self.0.get_index_of(name).map(PopulationId)
    }

    fn get_or_insert(&mut self, name: String) -> PopulationId {
        self.get(&name).unwrap_or_else(|| self.insert(name))
    }

    fn insert(&mut self, name: String) -> PopulationId {
        PopulationId(self.0.insert_full(name).0)
    }

    fn name(&self, id: PopulationId) -> Option<&str> {
        self.0.get_index(id.0).map(String::as_str)
    }
}

/// The rule for assigning individuals to populations.
#[derive(Clone, Debug, PartialEq)]
pub enum Populations {
    /// Individuals belong to the population named by the part of their name before the last
    /// occurrence of the character, or their full name if it does not occur.
    Split(char),
    /// Individuals belong to the populations given by an explicit map; unmapped individuals are
    /// ignored.
    Map(PopulationMap),
    /// All individuals of each input form one population, named in input order.
    MergeFiles(Vec<String>),
}

impl Default for Populations {
    fn default() -> Self {
        Self::Split('-')
    }
}

impl Populations {
    fn population_of<'a>(&'a self, input: usize, individual: &'a str) -> Option<&'a str> {
        match self {
            Populations::Split(c) => Some(
                individual
                    .rsplit_once(*c)
                    .map_or(individual, |(population, _)| population),
            ),
            Populations::Map(map) => map.population_of(individual),
            Populations::MergeFiles(names) => names.get(input).map(String::as_str),
        }
    }
}

/// The population of every individual of a number of inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Assignment {
    names: Names,
    individuals: Vec<Vec<Option<PopulationId>>>,
}

impl Assignment {
    /// Assigns the individuals of each input, creating populations in order of first appearance.
    pub(crate) fn new<S>(populations: &Populations, inputs: &[&[S]]) -> Result<Self, Error>
    where
        S: AsRef<str>,
    {
        if let Populations::MergeFiles(names) = populations {
            if names.len() != inputs.len() {
                return Err(Error::Config(format!(
                    "{} population names provided for merging {} inputs",
                    names.len(),
                    inputs.len()
                )));
            }
        }

        let mut names = Names::default();
        let mut unassigned = 0;

        let individuals: Vec<Vec<_>> = inputs
            .iter()
            .enumerate()
            .map(|(input, individuals)| {
                individuals
                    .iter()
                    .map(|individual| {
                        let population = populations.population_of(input, individual.as_ref());
                        if population.is_none() {
                            unassigned += 1;
                        }
                        population.map(|name| names.get_or_insert(name.to_string()))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        if names.0.is_empty() {
            return Err(Error::Config(String::from(
                "no individuals are assigned to a population",
            )));
        }

        if unassigned > 0 {
            log::debug!(
                target: "populations",
                "Ignoring {unassigned} individuals without a population"
            );
        }

        Ok(Self { names, individuals })
    }

    /// Returns the population names in order.
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.names.0.iter().map(String::as_str)
    }

    /// Returns the number of populations.
    pub(crate) fn len(&self) -> usize {
        self.names.0.len()
    }

    /// Returns the population of an individual of an input.
    pub(crate) fn get(&self, input: usize, individual: usize) -> Option<PopulationId> {
        self.individuals
            .get(input)
            .and_then(|individuals| individuals.get(individual))
            .copied()
            .flatten()
    }

    /// Keeps a single individual of each population, picked at random, and unassigns the rest.
    ///
    /// Returns the input and index of the picked individual of each population, in population
    /// order.
    pub(crate) fn pick_one<G>(&mut self, rng: &mut G) -> Vec<(usize, usize)>
    where
        G: Rng + ?Sized,
    {
        let mut candidates = vec![Vec::new(); self.len()];
        for (input, individuals) in self.individuals.iter().enumerate() {
            for (individual, population) in individuals.iter().enumerate() {
                if let Some(population) = population {
                    candidates[population.0].push((input, individual));
                }
            }
        }

        let picks: Vec<_> = candidates
            .iter()
            .filter_map(|candidates| candidates.choose(rng).copied())
            .collect();

        for individuals in self.individuals.iter_mut() {
            individuals.iter_mut().for_each(|population| *population = None);
        }
        for (population, &(input, individual)) in picks.iter().enumerate() {
            self.individuals[input][individual] = Some(PopulationId(population));
        }

        picks
    }

    /// Reassigns the individuals of an input by name, without creating new populations.
    pub(crate) fn reassign<S>(
        &mut self,
        populations: &Populations,
        input: usize,
        individuals: &[S],
    ) -> Result<(), Error>
    where
        S: AsRef<str>,
    {
        let assigned = individuals
            .iter()
            .map(|individual| {
                let individual = individual.as_ref();

                match populations.population_of(input, individual) {
                    Some(name) => self.names.get(name).map(Some).ok_or_else(|| {
                        Error::Config(format!(
                            "individual '{individual}' belongs to population '{name}', \
                            which is not present in the first alignment"
                        ))
                    }),
                    None => Ok(None),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(slot) = self.individuals.get_mut(input) {
            *slot = assigned;
        }

        Ok(())
    }
}
