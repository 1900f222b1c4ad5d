use std::collections::HashSet;

use cup8_sim::TournamentError;
use cup8_sim::match_sim::{GroupId, Phase, ScoringPolicy};
use cup8_sim::rankings::RankTable;
use cup8_sim::tournament::{Stage, Tournament, sort_group};

fn field() -> Vec<String> {
    ["Polska", "Brazylia", "Niemcy", "Japan", "Panama", "Morocco", "Iceland", "Chile"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn played(seed: u64, policy: ScoringPolicy) -> Tournament {
    let table = RankTable::builtin();
    let mut tournament =
        Tournament::new(&field(), &table, policy, Some(seed)).expect("valid field");
    tournament.run().expect("full run");
    tournament
}

#[test]
fn full_run_has_expected_shape() {
    for seed in 0..20 {
        let t = played(seed, ScoringPolicy::StrengthWeighted);
        assert_eq!(t.stage(), Stage::Report);
        assert_eq!(t.matches().len(), 16);
        let group_games = t.matches().iter().filter(|m| m.phase.is_group()).count();
        assert_eq!(group_games, 12);

        let mut seen = HashSet::new();
        for group in GroupId::ALL {
            assert_eq!(t.group(group).len(), 4);
            seen.extend(t.group(group).iter().copied());
            assert_eq!(t.group_matches(group).count(), 6);
        }
        assert_eq!(seen.len(), 8);
    }
}

#[test]
fn standings_are_ordered_by_points_then_goals() {
    for seed in 0..20 {
        let t = played(seed, ScoringPolicy::Uniform);
        for group in GroupId::ALL {
            let standings = t.standings(group);
            let keys: Vec<(u32, u32)> = standings
                .iter()
                .map(|id| {
                    let team = t.teams().get(*id).expect("known team");
                    (team.points, team.goals)
                })
                .collect();
            assert!(keys.windows(2).all(|w| w[0] >= w[1]), "seed {seed}: {keys:?}");
            assert_eq!(sort_group(t.teams(), t.group(group)), standings.to_vec());
        }
    }
}

#[test]
fn knockout_follows_cross_group_bracket() {
    for seed in 0..20 {
        let t = played(seed, ScoringPolicy::StrengthWeighted);
        let a = t.standings(GroupId::A);
        let b = t.standings(GroupId::B);
        let [sf1, sf2] = t.semifinals().expect("semifinals played");
        assert_eq!((sf1.first, sf1.second), (a[0], b[1]));
        assert_eq!((sf2.first, sf2.second), (b[0], a[1]));
        assert_eq!(sf1.phase, Phase::Semifinal(1));

        let final_match = t.final_match().expect("final played");
        let third = t.third_place_match().expect("third place played");
        assert_eq!(final_match.first, sf1.winner().expect("sf1 decided"));
        assert_eq!(final_match.second, sf2.winner().expect("sf2 decided"));
        assert_eq!(third.first, sf1.loser().expect("sf1 decided"));
        assert_eq!(third.second, sf2.loser().expect("sf2 decided"));

        let podium = t.podium().expect("podium");
        let places: HashSet<_> =
            [podium.champion, podium.runner_up, podium.third, podium.fourth].into();
        assert_eq!(places.len(), 4);
    }
}

#[test]
fn knockout_draws_always_have_a_shootout() {
    for seed in 0..50 {
        let t = played(seed, ScoringPolicy::Uniform);
        for m in t.matches().iter().filter(|m| !m.phase.is_group()) {
            let (a, b) = m.score().expect("played");
            match m.penalties() {
                Some((pa, pb)) => {
                    assert_eq!(a, b);
                    assert_ne!(pa, pb);
                }
                None => assert_ne!(a, b),
            }
        }
    }
}

#[test]
fn group_points_and_goals_add_up() {
    let t = played(11, ScoringPolicy::StrengthWeighted);
    let mut expected_points = 0;
    for m in t.matches().iter().filter(|m| m.phase.is_group()) {
        let (a, b) = m.score().expect("played");
        expected_points += if a == b { 2 } else { 3 };
    }
    let points: u32 = t.teams().teams().iter().map(|team| team.points).sum();
    assert_eq!(points, expected_points);

    let goals: u32 = t
        .matches()
        .iter()
        .filter_map(|m| m.score())
        .map(|(a, b)| a as u32 + b as u32)
        .sum();
    assert_eq!(t.teams().total_goals(), goals);
}

#[test]
fn same_seed_replays_identically() {
    let first = played(2024, ScoringPolicy::StrengthWeighted)
        .outcome()
        .expect("outcome");
    let second = played(2024, ScoringPolicy::StrengthWeighted)
        .outcome()
        .expect("outcome");
    assert_eq!(first, second);
    assert_eq!(first.seed, 2024);
    assert_eq!(first.matches.len(), 16);
    assert_eq!(first.standings.len(), 2);
}

#[test]
fn invalid_fields_are_rejected() {
    let table = RankTable::builtin();
    let mut short = field();
    short.pop();
    assert_eq!(
        Tournament::new(&short, &table, ScoringPolicy::Uniform, Some(1)).err(),
        Some(TournamentError::WrongTeamCount {
            expected: 8,
            found: 7
        })
    );

    let mut dup = field();
    dup[7] = "poland".to_string();
    assert_eq!(
        Tournament::new(&dup, &table, ScoringPolicy::Uniform, Some(1)).err(),
        Some(TournamentError::DuplicateName("Poland".to_string()))
    );
}

#[test]
fn stages_must_run_in_order() {
    let table = RankTable::builtin();
    let mut t = Tournament::new(&field(), &table, ScoringPolicy::Uniform, Some(3))
        .expect("valid field");
    assert_eq!(t.stage(), Stage::AssignGroups);
    assert_eq!(
        t.play_semifinals().err(),
        Some(TournamentError::StageOrder {
            expected: Stage::Semifinals,
            actual: Stage::AssignGroups
        })
    );
    t.assign_groups().expect("groups");
    assert!(t.play_group(GroupId::B).is_err());
    t.play_group(GroupId::A).expect("group A");
    t.play_group(GroupId::B).expect("group B");
    assert!(t.podium().is_err());
    t.compute_standings().expect("standings");
    t.play_semifinals().expect("semis");
    t.play_third_place().expect("third");
    t.play_final().expect("final");
    assert_eq!(t.stage(), Stage::Report);
    assert!(t.podium().is_ok());
}
