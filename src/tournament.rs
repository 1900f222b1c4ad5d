use std::cmp::Reverse;

use log::{debug, info};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::entrants::EntrantCollector;
use crate::error::TournamentError;
use crate::match_sim::{GroupId, Match, Phase, ScoringPolicy};
use crate::rankings::RankProvider;
use crate::stats::TournamentReport;
use crate::team::{Team, TeamId, TeamRegistry};

pub const TEAM_COUNT: usize = 8;
pub const GROUP_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    CollectTeams,
    AssignGroups,
    GroupAPlay,
    GroupBPlay,
    Standings,
    Semifinals,
    ThirdPlace,
    Final,
    Report,
}

impl Stage {
    pub fn next(self) -> Stage {
        match self {
            Stage::CollectTeams => Stage::AssignGroups,
            Stage::AssignGroups => Stage::GroupAPlay,
            Stage::GroupAPlay => Stage::GroupBPlay,
            Stage::GroupBPlay => Stage::Standings,
            Stage::Standings => Stage::Semifinals,
            Stage::Semifinals => Stage::ThirdPlace,
            Stage::ThirdPlace => Stage::Final,
            Stage::Final => Stage::Report,
            Stage::Report => Stage::Report,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::CollectTeams => "collect teams",
            Stage::AssignGroups => "assign groups",
            Stage::GroupAPlay => "group A",
            Stage::GroupBPlay => "group B",
            Stage::Standings => "standings",
            Stage::Semifinals => "semifinals",
            Stage::ThirdPlace => "third place",
            Stage::Final => "final",
            Stage::Report => "report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podium {
    pub champion: TeamId,
    pub runner_up: TeamId,
    pub third: TeamId,
    pub fourth: TeamId,
}

/// One group-stage-plus-knockout run over eight teams.
///
/// Steps must be called in stage order (or all at once through [`run`]);
/// each step fails with [`TournamentError::StageOrder`] otherwise.
///
/// [`run`]: Tournament::run
#[derive(Debug, Clone)]
pub struct Tournament {
    teams: TeamRegistry,
    groups: [Vec<TeamId>; 2],
    standings: [Vec<TeamId>; 2],
    matches: Vec<Match>,
    semifinals: Option<[usize; 2]>,
    third_place: Option<usize>,
    final_match: Option<usize>,
    stage: Stage,
    policy: ScoringPolicy,
    seed: u64,
    rng: ChaCha8Rng,
}

impl Tournament {
    /// Validates the entrants and registers them with their world rank.
    /// `seed` of `None` draws a fresh one from OS entropy.
    pub fn new(
        names: &[String],
        provider: &dyn RankProvider,
        policy: ScoringPolicy,
        seed: Option<u64>,
    ) -> Result<Self, TournamentError> {
        if names.len() != TEAM_COUNT {
            return Err(TournamentError::WrongTeamCount {
                expected: TEAM_COUNT,
                found: names.len(),
            });
        }
        let mut collector = EntrantCollector::new();
        for name in names {
            collector.try_add(name)?;
        }

        let mut teams = TeamRegistry::new();
        for name in collector.into_names()? {
            let team = Team::from_provider(name, provider);
            debug!("registered {team}");
            teams.add(team);
        }

        let seed = seed.unwrap_or_else(rand::random);
        info!(
            "tournament created: {} teams, {} scoring, seed {seed}",
            teams.len(),
            policy.label()
        );

        Ok(Self {
            teams,
            groups: [Vec::new(), Vec::new()],
            standings: [Vec::new(), Vec::new()],
            matches: Vec::new(),
            semifinals: None,
            third_place: None,
            final_match: None,
            stage: Stage::AssignGroups,
            policy,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn from_config(
        names: &[String],
        provider: &dyn RankProvider,
        config: &Config,
    ) -> Result<Self, TournamentError> {
        Self::new(names, provider, config.policy, config.seed)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn group(&self, group: GroupId) -> &[TeamId] {
        &self.groups[group.index()]
    }

    /// Final group order; empty until standings are computed.
    pub fn standings(&self, group: GroupId) -> &[TeamId] {
        &self.standings[group.index()]
    }

    pub fn group_matches(&self, group: GroupId) -> impl Iterator<Item = &Match> + '_ {
        self.matches
            .iter()
            .filter(move |m| m.phase == Phase::Group(group))
    }

    pub fn semifinals(&self) -> Option<[&Match; 2]> {
        let [a, b] = self.semifinals?;
        Some([self.matches.get(a)?, self.matches.get(b)?])
    }

    pub fn third_place_match(&self) -> Option<&Match> {
        self.third_place.and_then(|idx| self.matches.get(idx))
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.final_match.and_then(|idx| self.matches.get(idx))
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), TournamentError> {
        if self.stage != expected {
            return Err(TournamentError::StageOrder {
                expected,
                actual: self.stage,
            });
        }
        Ok(())
    }

    fn advance(&mut self) {
        let next = self.stage.next();
        info!("stage complete: {} -> {}", self.stage.label(), next.label());
        self.stage = next;
    }

    fn play(&mut self, first: TeamId, second: TeamId, phase: Phase) -> Result<usize, TournamentError> {
        let mut m = Match::new(first, second, phase)?;
        m.simulate(&mut self.teams, self.policy, &mut self.rng)?;
        self.matches.push(m);
        Ok(self.matches.len() - 1)
    }

    /// Shuffles the field; the first four form group A, the rest group B.
    pub fn assign_groups(&mut self) -> Result<(), TournamentError> {
        self.expect_stage(Stage::AssignGroups)?;
        let mut ids: Vec<TeamId> = self.teams.ids().collect();
        ids.shuffle(&mut self.rng);
        let group_b = ids.split_off(GROUP_SIZE);
        self.groups = [ids, group_b];
        for group in GroupId::ALL {
            let names: Vec<&str> = self
                .group(group)
                .iter()
                .map(|id| self.teams.name(*id))
                .collect();
            info!("{}: {}", group.label(), names.join(", "));
        }
        self.advance();
        Ok(())
    }

    /// Round robin inside one group. Returns the indices of the matches played.
    pub fn play_group(&mut self, group: GroupId) -> Result<Vec<usize>, TournamentError> {
        let expected = match group {
            GroupId::A => Stage::GroupAPlay,
            GroupId::B => Stage::GroupBPlay,
        };
        self.expect_stage(expected)?;
        let members = self.groups[group.index()].clone();
        let mut played = Vec::new();
        for (first, second) in round_robin_pairs(&members) {
            played.push(self.play(first, second, Phase::Group(group))?);
        }
        self.advance();
        Ok(played)
    }

    pub fn compute_standings(&mut self) -> Result<(), TournamentError> {
        self.expect_stage(Stage::Standings)?;
        for group in GroupId::ALL {
            let order = sort_group(&self.teams, &self.groups[group.index()]);
            self.standings[group.index()] = order;
        }
        self.advance();
        Ok(())
    }

    pub fn play_semifinals(&mut self) -> Result<Vec<usize>, TournamentError> {
        self.expect_stage(Stage::Semifinals)?;
        let pairs = semifinal_pairs(&self.standings[0], &self.standings[1])?;
        let sf1 = self.play(pairs[0].0, pairs[0].1, Phase::Semifinal(1))?;
        let sf2 = self.play(pairs[1].0, pairs[1].1, Phase::Semifinal(2))?;
        self.semifinals = Some([sf1, sf2]);
        self.advance();
        Ok(vec![sf1, sf2])
    }

    pub fn play_third_place(&mut self) -> Result<Vec<usize>, TournamentError> {
        self.expect_stage(Stage::ThirdPlace)?;
        let [sf1, sf2] = self.semifinals().ok_or(TournamentError::MatchNotPlayed)?;
        let (first, second) = (sf1.loser()?, sf2.loser()?);
        let idx = self.play(first, second, Phase::ThirdPlace)?;
        self.third_place = Some(idx);
        self.advance();
        Ok(vec![idx])
    }

    pub fn play_final(&mut self) -> Result<Vec<usize>, TournamentError> {
        self.expect_stage(Stage::Final)?;
        let [sf1, sf2] = self.semifinals().ok_or(TournamentError::MatchNotPlayed)?;
        let (first, second) = (sf1.winner()?, sf2.winner()?);
        let idx = self.play(first, second, Phase::Final)?;
        self.final_match = Some(idx);
        self.advance();
        if let Ok(podium) = self.podium() {
            info!("champion: {}", self.teams.name(podium.champion));
        }
        Ok(vec![idx])
    }

    /// Runs every remaining stage.
    pub fn run(&mut self) -> Result<Podium, TournamentError> {
        self.run_with(|_, _| {})
    }

    /// Like [`Tournament::run`], calling `on_match` after each match in play
    /// order.
    pub fn run_with(
        &mut self,
        mut on_match: impl FnMut(&Match, &TeamRegistry),
    ) -> Result<Podium, TournamentError> {
        while self.stage != Stage::Report {
            let played = match self.stage {
                Stage::CollectTeams => {
                    return Err(TournamentError::StageOrder {
                        expected: Stage::AssignGroups,
                        actual: Stage::CollectTeams,
                    });
                }
                Stage::AssignGroups => {
                    self.assign_groups()?;
                    Vec::new()
                }
                Stage::GroupAPlay => self.play_group(GroupId::A)?,
                Stage::GroupBPlay => self.play_group(GroupId::B)?,
                Stage::Standings => {
                    self.compute_standings()?;
                    Vec::new()
                }
                Stage::Semifinals => self.play_semifinals()?,
                Stage::ThirdPlace => self.play_third_place()?,
                Stage::Final => self.play_final()?,
                Stage::Report => Vec::new(),
            };
            for idx in played {
                if let Some(m) = self.matches.get(idx) {
                    on_match(m, &self.teams);
                }
            }
        }
        self.podium()
    }

    pub fn podium(&self) -> Result<Podium, TournamentError> {
        self.expect_stage(Stage::Report)?;
        let final_match = self.final_match().ok_or(TournamentError::MatchNotPlayed)?;
        let third_place = self
            .third_place_match()
            .ok_or(TournamentError::MatchNotPlayed)?;
        Ok(Podium {
            champion: final_match.winner()?,
            runner_up: final_match.loser()?,
            third: third_place.winner()?,
            fourth: third_place.loser()?,
        })
    }

    /// Owned snapshot of a finished run for reporting and persistence.
    pub fn outcome(&self) -> Result<TournamentOutcome, TournamentError> {
        let podium = self.podium()?;
        let name = |id: TeamId| self.teams.name(id).to_string();
        let matches = self
            .matches
            .iter()
            .map(|m| MatchRecord {
                phase: m.phase.label(),
                first: name(m.first),
                second: name(m.second),
                score: m.score(),
                penalties: m.penalties(),
                summary: m.summary(&self.teams),
            })
            .collect();
        let standings = GroupId::ALL.map(|g| GroupStanding {
            group: g.label().to_string(),
            order: self.standings(g).iter().map(|id| name(*id)).collect(),
        });
        Ok(TournamentOutcome {
            seed: self.seed,
            policy: self.policy,
            teams: self.teams.teams().to_vec(),
            standings: standings.to_vec(),
            matches,
            champion: name(podium.champion),
            runner_up: name(podium.runner_up),
            third: name(podium.third),
            total_goals: self.teams.total_goals(),
            report: TournamentReport::from_teams(self.teams.teams()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub phase: String,
    pub first: String,
    pub second: String,
    pub score: Option<(u8, u8)>,
    pub penalties: Option<(u8, u8)>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStanding {
    pub group: String,
    pub order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentOutcome {
    pub seed: u64,
    pub policy: ScoringPolicy,
    pub teams: Vec<Team>,
    pub standings: Vec<GroupStanding>,
    pub matches: Vec<MatchRecord>,
    pub champion: String,
    pub runner_up: String,
    pub third: String,
    pub total_goals: u32,
    pub report: TournamentReport,
}

/// Every unordered pair once, in member order.
pub fn round_robin_pairs(members: &[TeamId]) -> Vec<(TeamId, TeamId)> {
    let mut pairs = Vec::with_capacity(members.len() * members.len().saturating_sub(1) / 2);
    for (i, first) in members.iter().enumerate() {
        for second in &members[i + 1..] {
            pairs.push((*first, *second));
        }
    }
    pairs
}

/// Orders a group by points, then goals. The sort is stable, so teams level
/// on both keys keep their draw order.
pub fn sort_group(teams: &TeamRegistry, group: &[TeamId]) -> Vec<TeamId> {
    let mut order = group.to_vec();
    order.sort_by_key(|id| {
        teams
            .get(*id)
            .map(|t| Reverse((t.points, t.goals)))
            .unwrap_or(Reverse((0, 0)))
    });
    order
}

/// Cross-group bracket: A1 v B2 and B1 v A2.
pub fn semifinal_pairs(
    group_a: &[TeamId],
    group_b: &[TeamId],
) -> Result<[(TeamId, TeamId); 2], TournamentError> {
    let (Some(a1), Some(a2)) = (group_a.first(), group_a.get(1)) else {
        return Err(TournamentError::WrongTeamCount {
            expected: GROUP_SIZE,
            found: group_a.len(),
        });
    };
    let (Some(b1), Some(b2)) = (group_b.first(), group_b.get(1)) else {
        return Err(TournamentError::WrongTeamCount {
            expected: GROUP_SIZE,
            found: group_b.len(),
        });
    };
    Ok([(*a1, *b2), (*b1, *a2)])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rankings::RankTable;

    fn names() -> Vec<String> {
        [
            "Polska", "Brazylia", "Niemcy", "Japan", "Panama", "Morocco", "Iceland", "Chile",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn tournament(seed: u64) -> Tournament {
        Tournament::new(
            &names(),
            &RankTable::builtin(),
            ScoringPolicy::StrengthWeighted,
            Some(seed),
        )
        .expect("valid field")
    }

    #[test]
    fn rejects_wrong_field_size_and_duplicates() {
        let table = RankTable::builtin();
        let short = names()[..7].to_vec();
        assert_eq!(
            Tournament::new(&short, &table, ScoringPolicy::Uniform, Some(1)).err(),
            Some(TournamentError::WrongTeamCount {
                expected: 8,
                found: 7
            })
        );
        let mut dup = names();
        dup[7] = "poland".to_string();
        assert_eq!(
            Tournament::new(&dup, &table, ScoringPolicy::Uniform, Some(1)).err(),
            Some(TournamentError::DuplicateName("Poland".to_string()))
        );
    }

    #[test]
    fn registers_normalized_names_with_rank() {
        let t = tournament(1);
        let poland = &t.teams().teams()[0];
        assert_eq!(poland.name, "Poland");
        assert_eq!(poland.fifa_rank, 34);
        assert!((poland.strength - 0.46).abs() < 1e-9);
        assert_eq!(t.teams().teams()[6].fifa_rank, crate::rankings::WORST_RANK);
    }

    #[test]
    fn groups_partition_the_field() {
        let mut t = tournament(5);
        t.assign_groups().unwrap();
        let a: HashSet<TeamId> = t.group(GroupId::A).iter().copied().collect();
        let b: HashSet<TeamId> = t.group(GroupId::B).iter().copied().collect();
        assert_eq!(a.len(), 4);
        assert_eq!(b.len(), 4);
        assert!(a.is_disjoint(&b));
        let all: HashSet<TeamId> = a.union(&b).copied().collect();
        let expected: HashSet<TeamId> = t.teams().ids().collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn round_robin_covers_each_pair_once() {
        let members = [TeamId(3), TeamId(0), TeamId(6), TeamId(1)];
        let pairs = round_robin_pairs(&members);
        assert_eq!(pairs.len(), 6);
        let unordered: HashSet<(TeamId, TeamId)> =
            pairs.iter().map(|(a, b)| ((*a).min(*b), (*a).max(*b))).collect();
        assert_eq!(unordered.len(), 6);
        assert!(pairs.iter().all(|(a, b)| a != b));
    }

    #[test]
    fn steps_out_of_order_fail() {
        let mut t = tournament(2);
        assert_eq!(
            t.play_group(GroupId::A),
            Err(TournamentError::StageOrder {
                expected: Stage::GroupAPlay,
                actual: Stage::AssignGroups
            })
        );
        t.assign_groups().unwrap();
        assert!(matches!(
            t.assign_groups(),
            Err(TournamentError::StageOrder { .. })
        ));
        assert!(matches!(
            t.play_group(GroupId::B),
            Err(TournamentError::StageOrder { .. })
        ));
        assert!(matches!(t.podium(), Err(TournamentError::StageOrder { .. })));
    }

    #[test]
    fn standings_sort_by_points_then_goals_stably() {
        let mut teams = TeamRegistry::new();
        let ids: Vec<TeamId> = (0..4)
            .map(|i| teams.add(Team::new(format!("T{i}"), 20)))
            .collect();
        let stats = [(4, 5), (7, 2), (4, 5), (4, 6)];
        for (id, (points, goals)) in ids.iter().zip(stats) {
            let team = teams.get_mut(*id).unwrap();
            team.points = points;
            team.goals = goals;
        }
        let order = sort_group(&teams, &ids);
        assert_eq!(order, vec![ids[1], ids[3], ids[0], ids[2]]);
    }

    #[test]
    fn semifinals_cross_the_groups() {
        let a = [TeamId(0), TeamId(1), TeamId(2), TeamId(3)];
        let b = [TeamId(4), TeamId(5), TeamId(6), TeamId(7)];
        let pairs = semifinal_pairs(&a, &b).unwrap();
        assert_eq!(pairs[0], (TeamId(0), TeamId(5)));
        assert_eq!(pairs[1], (TeamId(4), TeamId(1)));
        assert!(semifinal_pairs(&a[..1], &b).is_err());
    }

    #[test]
    fn full_run_plays_sixteen_matches() {
        let mut t = tournament(42);
        let mut seen = 0;
        let podium = t.run_with(|_, _| seen += 1).unwrap();
        assert_eq!(seen, 16);
        assert_eq!(t.matches().len(), 16);
        assert_eq!(t.stage(), Stage::Report);
        assert_eq!(t.group_matches(GroupId::A).count(), 6);
        assert_eq!(t.group_matches(GroupId::B).count(), 6);

        let finalists = [podium.champion, podium.runner_up];
        let [sf1, sf2] = t.semifinals().unwrap();
        assert!(finalists.contains(&sf1.winner().unwrap()));
        assert!(finalists.contains(&sf2.winner().unwrap()));
        assert!(sf1.involves(podium.third) || sf2.involves(podium.third));
        let distinct: HashSet<TeamId> =
            [podium.champion, podium.runner_up, podium.third, podium.fourth].into();
        assert_eq!(distinct.len(), 4);

        let sum: u32 = t
            .matches()
            .iter()
            .filter_map(|m| m.score())
            .map(|(a, b)| a as u32 + b as u32)
            .sum();
        assert_eq!(sum, t.teams().total_goals());
    }

    #[test]
    fn same_seed_replays_identically() {
        let mut first = tournament(2024);
        let mut second = tournament(2024);
        first.run().unwrap();
        second.run().unwrap();
        assert_eq!(first.matches(), second.matches());
        assert_eq!(first.podium(), second.podium());
        assert_eq!(first.outcome().unwrap(), second.outcome().unwrap());
    }

    #[test]
    fn run_refuses_an_uncollected_field() {
        let mut t = tournament(5);
        t.stage = Stage::CollectTeams;
        assert_eq!(
            t.run().err(),
            Some(TournamentError::StageOrder {
                expected: Stage::AssignGroups,
                actual: Stage::CollectTeams,
            })
        );
        assert!(t.matches().is_empty());
    }
}
