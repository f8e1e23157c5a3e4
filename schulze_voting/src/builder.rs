use std::collections::{HashMap, HashSet};

pub use crate::config::*;

/// A builder for adding ballots.
///
/// Entries added for the same voter are grouped into a single ballot.
///
/// ```
/// pub use schulze_voting::builder::Builder;
/// pub use schulze_voting::{ElectionRules, Rank};
/// # use schulze_voting::VotingErrors;
///
/// let mut builder = Builder::new(&ElectionRules::DEFAULT_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ranked("voter-1", &["Anna".to_string(), "Bob".to_string()])?;
/// builder.add_record("voter-2", "Bob", 1)?;
/// builder.add_record("voter-2", "Anna", 100_000_000)?;
///
/// let result = builder.run()?;
/// assert_eq!(result.winners, vec!["Anna".to_string()]);
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ElectionRules,
    pub(crate) _candidates: Vec<String>,
    pub(crate) _ballots: BallotBox,
}

impl Builder {
    pub fn new(rules: &ElectionRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: BallotBox::default(),
        })
    }

    /// Declares the candidates, in order. Any ballot added before is dropped.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        let mut seen: HashSet<&String> = HashSet::new();
        for c in cands {
            if !seen.insert(c) {
                return Err(VotingErrors::DuplicateCandidate(c.clone()));
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _ballots: BallotBox::default(),
        })
    }

    /// Adds candidates in order of preference: the first one gets rank 1.
    pub fn add_ranked(&mut self, voter: &str, candidates: &[String]) -> Result<(), VotingErrors> {
        let entries: Vec<(String, Rank)> = candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.clone(), Rank::Ranked((idx + 1) as u32)))
            .collect();
        self.add_ballot(voter, &entries)
    }

    /// Adds entries to the ballot of a voter.
    pub fn add_ballot(&mut self, voter: &str, entries: &[(String, Rank)]) -> Result<(), VotingErrors> {
        let ballot = self._ballots.ballot_mut(voter);
        ballot.entries.extend(entries.iter().cloned());
        Ok(())
    }

    /// Adds one raw record, as kept by a ballot store.
    pub fn add_record(&mut self, voter: &str, candidate: &str, rank: u64) -> Result<(), VotingErrors> {
        self._ballots.add_record(voter, candidate, rank)
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self._ballots.ballots
    }

    pub fn run(&self) -> Result<SchulzeResult, VotingErrors> {
        crate::run_schulze(&self._candidates, &self._ballots.ballots, &self._rules)
    }
}

/// Groups entries per voter, in the order in which voters are first seen.
#[derive(Default)]
pub(crate) struct BallotBox {
    pub(crate) ballots: Vec<Ballot>,
    voters: HashMap<String, usize>,
}

impl BallotBox {
    pub(crate) fn ballot_mut(&mut self, voter: &str) -> &mut Ballot {
        let idx = match self.voters.get(voter) {
            Some(idx) => *idx,
            None => {
                self.ballots.push(Ballot {
                    voter: voter.to_string(),
                    entries: Vec::new(),
                });
                let idx = self.ballots.len() - 1;
                self.voters.insert(voter.to_string(), idx);
                idx
            }
        };
        &mut self.ballots[idx]
    }

    /// The voter is registered even when the record carries no opinion.
    pub(crate) fn add_record(
        &mut self,
        voter: &str,
        candidate: &str,
        rank: u64,
    ) -> Result<(), VotingErrors> {
        let r = Rank::from_raw(rank).ok_or_else(|| VotingErrors::InvalidRank {
            voter: voter.to_string(),
            candidate: candidate.to_string(),
            rank,
        })?;
        let ballot = self.ballot_mut(voter);
        if r != Rank::NoOpinion {
            ballot.entries.push((candidate.to_string(), r));
        }
        Ok(())
    }
}
