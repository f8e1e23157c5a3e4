//! Dense pairwise matrices over the candidates of one election.

use std::collections::HashMap;
use std::marker::PhantomData;

/// Marker for matrices holding direct pairwise preferences: `d[V,W]` is the
/// number of voters preferring V over W.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Defeats {}

/// Marker for matrices holding the strength of the strongest path between two
/// candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PathStrength {}

/// A square matrix of counts indexed by ordered pairs of candidates.
///
/// Candidates keep the order in which they were declared. Cells on the
/// diagonal are always zero.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairwiseMatrix<K> {
    candidates: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<u64>,
    _kind: PhantomData<K>,
}

pub type DefeatsMatrix = PairwiseMatrix<Defeats>;
pub type PathStrengthMatrix = PairwiseMatrix<PathStrength>;

impl<K> PairwiseMatrix<K> {
    /// An all-zero matrix. Candidate names are expected to be unique: if a
    /// name is repeated, lookups by name resolve to its first position.
    pub(crate) fn zeros(candidates: &[String]) -> Self {
        let n = candidates.len();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (idx, name) in candidates.iter().enumerate() {
            index.entry(name.clone()).or_insert(idx);
        }
        PairwiseMatrix {
            candidates: candidates.to_vec(),
            index,
            cells: vec![0; n * n],
            _kind: PhantomData,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn position(&self, candidate: &str) -> Option<usize> {
        self.index.get(candidate).cloned()
    }

    /// The value for the pair (v, w). Unknown candidates read as zero.
    pub fn get(&self, v: &str, w: &str) -> u64 {
        match (self.position(v), self.position(w)) {
            (Some(i), Some(j)) => self.at(i, j),
            _ => 0,
        }
    }

    #[inline]
    pub(crate) fn at(&self, i: usize, j: usize) -> u64 {
        self.cells[i * self.candidates.len() + j]
    }

    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, value: u64) {
        let n = self.candidates.len();
        self.cells[i * n + j] = value;
    }

    #[inline]
    pub(crate) fn increment(&mut self, i: usize, j: usize) {
        let n = self.candidates.len();
        self.cells[i * n + j] += 1;
    }

    /// All the ordered pairs of distinct candidates with their value, row by row.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, u64)> + '_ {
        let n = self.candidates.len();
        (0..n).flat_map(move |i| {
            (0..n).filter(move |j| *j != i).map(move |j| {
                (
                    self.candidates[i].as_str(),
                    self.candidates[j].as_str(),
                    self.at(i, j),
                )
            })
        })
    }
}
