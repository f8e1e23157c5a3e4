// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use crate::matrix::{DefeatsMatrix, PathStrengthMatrix};

/// The numeric rank that ballot stores use to record that a voter has no
/// opinion about a candidate.
pub const NO_OPINION_RANK: u64 = 100_000_000;

/// The rank given by a voter to a candidate.
///
/// Lower ranks are preferred: `Ranked(1)` is the first choice of the voter.
/// Several candidates may share the same rank, in which case the voter is
/// indifferent between them.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Rank {
    Ranked(u32),
    /// The voter explicitly declined to rank this candidate.
    /// It carries no preference and is dropped before counting.
    NoOpinion,
}

impl Rank {
    /// Converts a raw numeric rank, as stored by ballot collection systems.
    ///
    /// [NO_OPINION_RANK] maps to [Rank::NoOpinion]. Zero and values that do not
    /// fit in a `u32` are not valid ranks.
    pub fn from_raw(raw: u64) -> Option<Rank> {
        match raw {
            NO_OPINION_RANK => Some(Rank::NoOpinion),
            0 => None,
            x => u32::try_from(x).ok().map(Rank::Ranked),
        }
    }

    /// True if this rank is strictly preferred to the other one.
    /// No opinion is never preferred, and nothing is preferred to it.
    pub fn is_preferred_to(&self, other: &Rank) -> bool {
        match (self, other) {
            (Rank::Ranked(a), Rank::Ranked(b)) => a < b,
            _ => false,
        }
    }
}

/// All the preferences expressed by one voter.
///
/// The voter identifier is only used to group entries together. Candidates
/// that are not mentioned in `entries` are not compared for this voter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub voter: String,
    pub entries: Vec<(String, Rank)>,
}

/// A single (voter, candidate, rank) row, as kept by a ballot store.
///
/// The rank is the raw numeric value, including the [NO_OPINION_RANK] sentinel.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotRecord {
    pub voter: String,
    pub candidate: String,
    pub rank: u64,
}

// ******** Output data structures *********

/// Candidates that beat the same number of other candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankGroup {
    /// The number of candidates beaten by each member of this group.
    pub wins: u32,
    /// The tied candidates, in the order in which they were declared.
    pub candidates: Vec<String>,
}

/// The Schulze ranking of all the candidates.
///
/// Groups are stored by increasing number of wins: the last group holds the
/// winners. Use [Ranking::best_first] to iterate from the winners down.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ranking {
    groups: Vec<RankGroup>,
}

impl Ranking {
    pub(crate) fn from_groups(mut groups: Vec<RankGroup>) -> Ranking {
        groups.sort_by_key(|g| g.wins);
        Ranking { groups }
    }

    /// The groups, by increasing number of wins.
    pub fn groups(&self) -> &[RankGroup] {
        &self.groups
    }

    /// The groups, from the winners to the losers.
    pub fn best_first(&self) -> impl Iterator<Item = &RankGroup> {
        self.groups.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Takes whole groups from the top of the ranking until at least
    /// `num_winners` candidates have been collected.
    ///
    /// A tie group is never split, so more than `num_winners` candidates may
    /// be returned.
    pub fn top(&self, num_winners: usize) -> Vec<&RankGroup> {
        let mut res: Vec<&RankGroup> = Vec::new();
        let mut collected = 0;
        for group in self.best_first() {
            if collected >= num_winners {
                break;
            }
            collected += group.candidates.len();
            res.push(group);
        }
        res
    }

    /// The names of the winners for an election with `num_winners` seats.
    pub fn winners(&self, num_winners: usize) -> Vec<String> {
        self.top(num_winners)
            .iter()
            .flat_map(|g| g.candidates.iter().cloned())
            .collect()
    }

    /// All the candidates, from the best to the worst.
    pub fn ordered_candidates(&self) -> Vec<String> {
        self.best_first()
            .flat_map(|g| g.candidates.iter().cloned())
            .collect()
    }
}

/// Everything computed while running the Schulze method on one election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeResult {
    pub defeats: DefeatsMatrix,
    pub strongest_paths: PathStrengthMatrix,
    pub ranking: Ranking,
    /// The winners, truncated to the number of seats in the rules.
    pub winners: Vec<String>,
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// No candidate was provided.
    EmptyElection,
    /// The same candidate was declared twice.
    DuplicateCandidate(String),
    /// A ballot mentions a candidate that is not running in this election.
    MalformedBallot { voter: String, candidate: String },
    /// A raw rank could not be interpreted.
    InvalidRank {
        voter: String,
        candidate: String,
        rank: u64,
    },
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyElection => write!(f, "no candidate in the election"),
            VotingErrors::DuplicateCandidate(name) => {
                write!(f, "candidate {} is declared more than once", name)
            }
            VotingErrors::MalformedBallot { voter, candidate } => write!(
                f,
                "ballot of voter {} references unknown candidate {}",
                voter, candidate
            ),
            VotingErrors::InvalidRank {
                voter,
                candidate,
                rank,
            } => write!(
                f,
                "ballot of voter {} has invalid rank {} for candidate {}",
                voter, rank, candidate
            ),
        }
    }
}

// ********* Configuration **********

/// What to do with ballot entries that mention an undeclared candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UnknownCandidatePolicy {
    /// Skip the entry and log a warning. The rest of the ballot still counts.
    Ignore,
    /// Fail the whole tabulation with [VotingErrors::MalformedBallot].
    Reject,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionRules {
    /// The number of seats. Tied candidates at the cutoff all get selected.
    pub number_of_winners: u32,
    pub unknown_candidate_policy: UnknownCandidatePolicy,
}

impl ElectionRules {
    pub const DEFAULT_RULES: ElectionRules = ElectionRules {
        number_of_winners: 1,
        unknown_candidate_policy: UnknownCandidatePolicy::Ignore,
    };
}
