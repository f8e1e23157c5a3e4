pub mod builder;
mod config;
pub mod manual;
mod matrix;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashSet};

pub use crate::config::*;
pub use crate::matrix::*;

use crate::builder::BallotBox;

/// Runs the Schulze method with the given rules for the given ballots.
///
/// Arguments:
/// * `candidates` the registered candidates for this election, in order. The order
/// is only used to present tied candidates.
/// * `ballots` the preferences of each voter
/// * `rules` the rules that govern this election
pub fn run_schulze(
    candidates: &[String],
    ballots: &[Ballot],
    rules: &ElectionRules,
) -> Result<SchulzeResult, VotingErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        ballots.len(),
        candidates,
        rules
    );
    if candidates.is_empty() {
        return Err(VotingErrors::EmptyElection);
    }
    checks(candidates, ballots, rules)?;

    let defeats = count_defeats(candidates, ballots);
    let strongest_paths = solve_paths(&defeats);
    let ranking = rank(&strongest_paths);
    let winners = ranking.winners(rules.number_of_winners as usize);
    for group in ranking.best_first() {
        info!("{} wins: {:?}", group.wins, group.candidates);
    }
    info!("Winners: {:?}", winners);
    Ok(SchulzeResult {
        defeats,
        strongest_paths,
        ranking,
        winners,
    })
}

// Candidates must be unique, and ballots may only mention them when the rules are strict.
fn checks(
    candidates: &[String],
    ballots: &[Ballot],
    rules: &ElectionRules,
) -> Result<(), VotingErrors> {
    let mut known: HashSet<&str> = HashSet::new();
    for c in candidates {
        if !known.insert(c.as_str()) {
            return Err(VotingErrors::DuplicateCandidate(c.clone()));
        }
    }
    if rules.unknown_candidate_policy == UnknownCandidatePolicy::Reject {
        for b in ballots {
            // No opinion about an unknown candidate carries no preference.
            let unknown = b
                .entries
                .iter()
                .find(|(c, r)| *r != Rank::NoOpinion && !known.contains(c.as_str()));
            if let Some((name, _)) = unknown {
                return Err(VotingErrors::MalformedBallot {
                    voter: b.voter.clone(),
                    candidate: name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Groups raw records into one ballot per voter, in the order in which voters
/// are first seen.
///
/// Records carrying [NO_OPINION_RANK] are dropped. A voter who only has such
/// records still gets an (empty) ballot.
pub fn group_records(records: &[BallotRecord]) -> Result<Vec<Ballot>, VotingErrors> {
    let mut ballot_box = BallotBox::default();
    for r in records {
        ballot_box.add_record(&r.voter, &r.candidate, r.rank)?;
    }
    Ok(ballot_box.ballots)
}

/// Builds the matrix of pairwise defeats: `d[V,W]` is the number of voters
/// who rank V strictly better than W.
///
/// Two candidates are only compared on a ballot when the voter ranked both.
/// Entries with no opinion, entries naming an unknown candidate and repeated
/// mentions of a candidate in the same ballot are skipped.
pub fn count_defeats(candidates: &[String], ballots: &[Ballot]) -> DefeatsMatrix {
    let mut d: DefeatsMatrix = PairwiseMatrix::zeros(candidates);
    for ballot in ballots.iter() {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut ranked: Vec<(usize, Rank)> = Vec::new();
        for (name, r) in ballot.entries.iter() {
            if *r == Rank::NoOpinion {
                continue;
            }
            match d.position(name) {
                None => {
                    warn!(
                        "count_defeats: voter {}: ignoring unknown candidate {:?}",
                        ballot.voter, name
                    );
                }
                Some(idx) if !seen.insert(idx) => {
                    warn!(
                        "count_defeats: voter {}: ignoring repeated candidate {:?}",
                        ballot.voter, name
                    );
                }
                Some(idx) => ranked.push((idx, *r)),
            }
        }

        for (v, vr) in ranked.iter() {
            for (w, wr) in ranked.iter() {
                if v != w && vr.is_preferred_to(wr) {
                    d.increment(*v, *w);
                }
            }
        }
    }
    debug!("count_defeats: {:?}", d);
    d
}

/// Computes the strength of the strongest path between every pair of candidates.
///
/// The direct link from X to Y is `d[X,Y]` when X beats Y head to head, and
/// nothing otherwise. Paths are then widened through every candidate taken as an
/// intermediate step, as in the Floyd–Warshall algorithm.
pub fn solve_paths(d: &DefeatsMatrix) -> PathStrengthMatrix {
    let n = d.len();
    let mut p: PathStrengthMatrix = PairwiseMatrix::zeros(d.candidates());
    for x in 0..n {
        for y in 0..n {
            if x != y && d.at(x, y) > d.at(y, x) {
                p.set(x, y, d.at(x, y));
            }
        }
    }
    close_paths(&mut p);
    debug!("solve_paths: {:?}", p);
    p
}

// The intermediate candidate must be the outer loop.
fn close_paths(p: &mut PathStrengthMatrix) {
    let n = p.len();
    for x in 0..n {
        for z in 0..n {
            if z == x {
                continue;
            }
            for y in 0..n {
                if y == x || y == z {
                    continue;
                }
                let through_x = p.at(z, x).min(p.at(x, y));
                if through_x > p.at(z, y) {
                    p.set(z, y, through_x);
                }
            }
        }
    }
}

/// Ranks the candidates by the number of other candidates they beat.
///
/// V beats W when `p[V,W] > p[W,V]`. Candidates with the same number of wins
/// form one group and are not separated.
pub fn rank(p: &PathStrengthMatrix) -> Ranking {
    let n = p.len();
    let mut wins: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for v in 0..n {
        let count = (0..n).filter(|w| *w != v && p.at(v, *w) > p.at(*w, v)).count() as u32;
        wins.entry(count)
            .or_default()
            .push(p.candidates()[v].clone());
    }
    debug!("rank: wins: {:?}", wins);
    Ranking::from_groups(
        wins.into_iter()
            .map(|(wins, candidates)| RankGroup { wins, candidates })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn names(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    fn ballot(voter: &str, entries: &[(&str, u32)]) -> Ballot {
        Ballot {
            voter: voter.to_string(),
            entries: entries
                .iter()
                .map(|(c, r)| (c.to_string(), Rank::Ranked(*r)))
                .collect(),
        }
    }

    fn defeats(candidates: &[&str], values: &[(&str, &str, u64)]) -> DefeatsMatrix {
        let mut d: DefeatsMatrix = PairwiseMatrix::zeros(&names(candidates));
        for (v, w, x) in values {
            let i = d.position(v).unwrap();
            let j = d.position(w).unwrap();
            d.set(i, j, *x);
        }
        d
    }

    fn paths(candidates: &[&str], values: &[(&str, &str, u64)]) -> PathStrengthMatrix {
        let mut p: PathStrengthMatrix = PairwiseMatrix::zeros(&names(candidates));
        for (v, w, x) in values {
            let i = p.position(v).unwrap();
            let j = p.position(w).unwrap();
            p.set(i, j, *x);
        }
        p
    }

    fn as_map<K>(m: &PairwiseMatrix<K>) -> HashMap<(String, String), u64> {
        m.pairs()
            .map(|(v, w, x)| ((v.to_string(), w.to_string()), x))
            .collect()
    }

    #[test]
    fn defeats_two_voters() {
        init();
        let ballots = vec![
            ballot("voter1", &[("A", 1), ("B", 2), ("C", 3)]),
            ballot("voter2", &[("B", 1), ("C", 2), ("A", 3)]),
        ];
        let d = count_defeats(&names(&["A", "B", "C"]), &ballots);
        assert_eq!(d.get("A", "B"), 1);
        assert_eq!(d.get("B", "A"), 1);
        assert_eq!(d.get("A", "C"), 1);
        assert_eq!(d.get("C", "A"), 1);
        assert_eq!(d.get("B", "C"), 2);
        assert_eq!(d.get("C", "B"), 0);
    }

    #[test]
    fn defeats_without_ballots() {
        let d = count_defeats(&names(&["A", "B"]), &[]);
        assert!(d.pairs().all(|(_, _, x)| x == 0));
    }

    #[test]
    fn equal_ranks_count_for_nobody() {
        let ballots = vec![ballot("v", &[("A", 1), ("B", 1), ("C", 2)])];
        let d = count_defeats(&names(&["A", "B", "C"]), &ballots);
        assert_eq!(d.get("A", "B"), 0);
        assert_eq!(d.get("B", "A"), 0);
        assert_eq!(d.get("A", "C"), 1);
        assert_eq!(d.get("B", "C"), 1);
    }

    #[test]
    fn unranked_candidates_are_not_compared() {
        let ballots = vec![ballot("v", &[("A", 1)])];
        let d = count_defeats(&names(&["A", "B"]), &ballots);
        assert_eq!(d.get("A", "B"), 0);
    }

    #[test]
    fn no_opinion_ballots_count_for_nothing() {
        let ballots = vec![Ballot {
            voter: "v".to_string(),
            entries: vec![
                ("A".to_string(), Rank::NoOpinion),
                ("B".to_string(), Rank::NoOpinion),
            ],
        }];
        let d = count_defeats(&names(&["A", "B"]), &ballots);
        assert!(d.pairs().all(|(_, _, x)| x == 0));
    }

    #[test]
    fn unknown_and_repeated_candidates_are_skipped() {
        init();
        let ballots = vec![ballot(
            "v",
            &[("A", 2), ("Zed", 1), ("B", 3), ("A", 4), ("C", 5)],
        )];
        let d = count_defeats(&names(&["A", "B", "C"]), &ballots);
        assert_eq!(d.get("A", "B"), 1);
        assert_eq!(d.get("A", "C"), 1);
        assert_eq!(d.get("B", "C"), 1);
        assert_eq!(d.get("B", "A"), 0);
        assert_eq!(d.get("C", "A"), 0);
    }

    #[test]
    fn paths_golden_fixture() {
        let d = defeats(
            &["A", "B", "C", "D"],
            &[
                ("A", "B", 12),
                ("B", "A", 9),
                ("A", "C", 7),
                ("C", "A", 14),
                ("A", "D", 16),
                ("D", "A", 3),
                ("B", "C", 5),
                ("C", "B", 10),
                ("B", "D", 18),
                ("D", "B", 1),
                ("C", "D", 2),
                ("D", "C", 20),
            ],
        );
        let p = solve_paths(&d);
        let expected = paths(
            &["A", "B", "C", "D"],
            &[
                ("A", "B", 12),
                ("B", "A", 14),
                ("A", "C", 16),
                ("C", "A", 14),
                ("A", "D", 16),
                ("D", "A", 14),
                ("B", "C", 18),
                ("C", "B", 12),
                ("B", "D", 18),
                ("D", "B", 12),
                ("C", "D", 14),
                ("D", "C", 20),
            ],
        );
        assert_eq!(as_map(&p), as_map(&expected));
    }

    #[test]
    fn head_to_head_tie_gives_no_link() {
        let d = defeats(&["A", "B"], &[("A", "B", 3), ("B", "A", 3)]);
        let p = solve_paths(&d);
        assert_eq!(p.get("A", "B"), 0);
        assert_eq!(p.get("B", "A"), 0);
        let r = rank(&p);
        assert_eq!(r.groups().len(), 1);
        assert_eq!(r.groups()[0].candidates, names(&["A", "B"]));
    }

    #[test]
    fn rank_simple() {
        let p = paths(
            &["A", "B", "C"],
            &[
                ("A", "B", 10),
                ("B", "A", 5),
                ("A", "C", 15),
                ("C", "A", 2),
                ("B", "C", 8),
                ("C", "B", 3),
            ],
        );
        let r = rank(&p);
        assert_eq!(
            r.groups(),
            &[
                RankGroup {
                    wins: 0,
                    candidates: names(&["C"])
                },
                RankGroup {
                    wins: 1,
                    candidates: names(&["B"])
                },
                RankGroup {
                    wins: 2,
                    candidates: names(&["A"])
                },
            ]
        );
    }

    #[test]
    fn rank_cycle_is_a_single_tie() {
        let p = paths(
            &["A", "B", "C"],
            &[
                ("A", "B", 10),
                ("B", "A", 5),
                ("B", "C", 10),
                ("C", "B", 5),
                ("C", "A", 10),
                ("A", "C", 5),
            ],
        );
        let r = rank(&p);
        assert_eq!(
            r.groups(),
            &[RankGroup {
                wins: 1,
                candidates: names(&["A", "B", "C"])
            }]
        );
    }

    #[test]
    fn rock_paper_scissors_ballots() {
        init();
        let ballots = vec![
            ballot("1", &[("A", 1), ("B", 2), ("C", 3)]),
            ballot("2", &[("B", 1), ("C", 2), ("A", 3)]),
            ballot("3", &[("C", 1), ("A", 2), ("B", 3)]),
        ];
        let res = run_schulze(
            &names(&["A", "B", "C"]),
            &ballots,
            &ElectionRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.ranking.groups().len(), 1);
        assert_eq!(res.ranking.groups()[0].wins, 1);
        assert_eq!(res.winners, names(&["A", "B", "C"]));
    }

    #[test]
    fn unmentioned_candidate_ranks_last() {
        let ballots = vec![
            ballot("1", &[("A", 1), ("B", 2)]),
            ballot("2", &[("B", 1), ("A", 2)]),
            ballot("3", &[("A", 1), ("B", 2)]),
        ];
        let res = run_schulze(
            &names(&["A", "B", "Ghost"]),
            &ballots,
            &ElectionRules::DEFAULT_RULES,
        )
        .unwrap();
        let lowest = &res.ranking.groups()[0];
        assert_eq!(lowest.wins, 0);
        assert_eq!(lowest.candidates, names(&["B", "Ghost"]));
        assert_eq!(res.winners, names(&["A"]));
    }

    #[test]
    fn single_seat_with_tied_winners() {
        let ballots = vec![
            ballot("1", &[("A", 1), ("B", 1), ("C", 2)]),
            ballot("2", &[("B", 1), ("A", 1), ("C", 3)]),
        ];
        let res = run_schulze(
            &names(&["A", "B", "C"]),
            &ballots,
            &ElectionRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.winners, names(&["A", "B"]));
    }

    #[test]
    fn multiple_seats() {
        let ballots = vec![
            ballot("1", &[("A", 1), ("B", 2), ("C", 3), ("D", 4)]),
            ballot("2", &[("A", 1), ("C", 2), ("B", 3), ("D", 4)]),
            ballot("3", &[("B", 1), ("A", 2), ("C", 3), ("D", 4)]),
        ];
        let rules = ElectionRules {
            number_of_winners: 2,
            ..ElectionRules::DEFAULT_RULES
        };
        let res = run_schulze(&names(&["A", "B", "C", "D"]), &ballots, &rules).unwrap();
        assert_eq!(res.winners, names(&["A", "B"]));
    }

    #[test]
    fn strict_rules_reject_unknown_candidates() {
        let ballots = vec![ballot("v", &[("A", 1), ("Zed", 2)])];
        let rules = ElectionRules {
            unknown_candidate_policy: UnknownCandidatePolicy::Reject,
            ..ElectionRules::DEFAULT_RULES
        };
        assert_eq!(
            run_schulze(&names(&["A", "B"]), &ballots, &rules),
            Err(VotingErrors::MalformedBallot {
                voter: "v".to_string(),
                candidate: "Zed".to_string()
            })
        );
        assert!(run_schulze(&names(&["A", "B"]), &ballots, &ElectionRules::DEFAULT_RULES).is_ok());
    }

    #[test]
    fn strict_rules_accept_no_opinion_on_unknown_candidates() {
        let ballots = vec![Ballot {
            voter: "v".to_string(),
            entries: vec![
                ("A".to_string(), Rank::Ranked(1)),
                ("B".to_string(), Rank::Ranked(2)),
                ("Zed".to_string(), Rank::NoOpinion),
            ],
        }];
        let rules = ElectionRules {
            unknown_candidate_policy: UnknownCandidatePolicy::Reject,
            ..ElectionRules::DEFAULT_RULES
        };
        let res = run_schulze(&names(&["A", "B"]), &ballots, &rules).unwrap();
        assert_eq!(res.winners, names(&["A"]));
    }

    #[test]
    fn duplicate_and_empty_candidates() {
        assert_eq!(
            run_schulze(&names(&["A", "A"]), &[], &ElectionRules::DEFAULT_RULES),
            Err(VotingErrors::DuplicateCandidate("A".to_string()))
        );
        assert_eq!(
            run_schulze(&[], &[], &ElectionRules::DEFAULT_RULES),
            Err(VotingErrors::EmptyElection)
        );
        assert!(rank(&solve_paths(&count_defeats(&[], &[]))).is_empty());
    }

    #[test]
    fn group_records_drops_no_opinion() {
        let records = vec![
            BallotRecord {
                voter: "x".to_string(),
                candidate: "A".to_string(),
                rank: 1,
            },
            BallotRecord {
                voter: "x".to_string(),
                candidate: "B".to_string(),
                rank: NO_OPINION_RANK,
            },
            BallotRecord {
                voter: "y".to_string(),
                candidate: "B".to_string(),
                rank: NO_OPINION_RANK,
            },
        ];
        let ballots = group_records(&records).unwrap();
        assert_eq!(
            ballots,
            vec![
                Ballot {
                    voter: "x".to_string(),
                    entries: vec![("A".to_string(), Rank::Ranked(1))]
                },
                Ballot {
                    voter: "y".to_string(),
                    entries: vec![]
                }
            ]
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const CANDIDATES: [&str; 5] = ["A", "B", "C", "D", "E"];

        // Each ballot ranks a subset of the candidates with ranks in 1..=4, ties allowed.
        fn ballots_strategy() -> impl Strategy<Value = Vec<Vec<Option<u32>>>> {
            prop::collection::vec(
                prop::collection::vec(prop::option::of(1u32..=4), CANDIDATES.len()),
                0..30,
            )
        }

        fn to_ballots(raw: &[Vec<Option<u32>>]) -> Vec<Ballot> {
            raw.iter()
                .enumerate()
                .map(|(idx, ranks)| Ballot {
                    voter: format!("voter-{}", idx),
                    entries: ranks
                        .iter()
                        .zip(CANDIDATES.iter())
                        .filter_map(|(r, c)| r.map(|r| (c.to_string(), Rank::Ranked(r))))
                        .collect(),
                })
                .collect()
        }

        fn group_sets(r: &Ranking) -> Vec<(u32, Vec<String>)> {
            r.groups()
                .iter()
                .map(|g| {
                    let mut cs = g.candidates.clone();
                    cs.sort();
                    (g.wins, cs)
                })
                .collect()
        }

        proptest! {
            #[test]
            fn prop_pairs_are_counted_independently(raw in ballots_strategy()) {
                let ballots = to_ballots(&raw);
                let d = count_defeats(&names(&CANDIDATES), &ballots);
                for (v, w, x) in d.pairs() {
                    let both_ranked = ballots
                        .iter()
                        .filter(|b| {
                            b.entries.iter().any(|(c, _)| c == v) && b.entries.iter().any(|(c, _)| c == w)
                        })
                        .count() as u64;
                    prop_assert!(x + d.get(w, v) <= both_ranked);
                }
            }

            #[test]
            fn prop_closure_is_idempotent(raw in ballots_strategy()) {
                let d = count_defeats(&names(&CANDIDATES), &to_ballots(&raw));
                let p = solve_paths(&d);
                let mut again = p.clone();
                close_paths(&mut again);
                prop_assert_eq!(p, again);
            }

            #[test]
            fn prop_paths_are_widest(raw in ballots_strategy()) {
                let d = count_defeats(&names(&CANDIDATES), &to_ballots(&raw));
                let p = solve_paths(&d);
                for x in CANDIDATES {
                    for y in CANDIDATES {
                        for z in CANDIDATES {
                            if x != y && y != z && x != z {
                                prop_assert!(p.get(x, y) >= p.get(x, z).min(p.get(z, y)));
                            }
                        }
                    }
                }
            }

            #[test]
            fn prop_ranking_ignores_input_order(raw in ballots_strategy()) {
                let ballots = to_ballots(&raw);
                let rules = ElectionRules::DEFAULT_RULES;
                let res = run_schulze(&names(&CANDIDATES), &ballots, &rules).unwrap();

                let mut reversed_ballots = ballots.clone();
                reversed_ballots.reverse();
                let mut reversed_candidates = names(&CANDIDATES);
                reversed_candidates.reverse();
                let res2 = run_schulze(&reversed_candidates, &reversed_ballots, &rules).unwrap();

                prop_assert_eq!(group_sets(&res.ranking), group_sets(&res2.ranking));
                let mut w1 = res.winners.clone();
                let mut w2 = res2.winners.clone();
                w1.sort();
                w2.sort();
                prop_assert_eq!(w1, w2);
            }

            #[test]
            fn prop_no_opinion_adds_nothing(raw in ballots_strategy()) {
                let mut ballots = to_ballots(&raw);
                let before = count_defeats(&names(&CANDIDATES), &ballots);
                ballots.push(Ballot {
                    voter: "silent".to_string(),
                    entries: CANDIDATES.iter().map(|c| (c.to_string(), Rank::NoOpinion)).collect(),
                });
                let after = count_defeats(&names(&CANDIDATES), &ballots);
                prop_assert_eq!(before, after);
            }
        }
    }
}
