use std::fmt;

use log::debug;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::TournamentError;
use crate::team::{TeamId, TeamRegistry};

const UNIFORM_MAX_GOALS: u8 = 5;
const WEIGHTED_MAX_GOALS: f64 = 7.0;
const GOALS_TOTAL_BASE: f64 = 2.5;

const REGULATION_KICKS: usize = 5;
/// Sudden-death rounds before a coin toss settles the shootout.
pub const MAX_SUDDEN_DEATH_ROUNDS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupId {
    A,
    B,
}

impl GroupId {
    pub const ALL: [GroupId; 2] = [GroupId::A, GroupId::B];

    pub fn label(self) -> &'static str {
        match self {
            GroupId::A => "Group A",
            GroupId::B => "Group B",
        }
    }

    pub fn index(self) -> usize {
        match self {
            GroupId::A => 0,
            GroupId::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Group(GroupId),
    Semifinal(u8),
    ThirdPlace,
    Final,
}

impl Phase {
    /// Group phases award points; everything else is a knockout tie.
    pub fn is_group(self) -> bool {
        matches!(self, Phase::Group(_))
    }

    pub fn label(self) -> String {
        match self {
            Phase::Group(group) => group.label().to_string(),
            Phase::Semifinal(n) => format!("Semifinal {n}"),
            Phase::ThirdPlace => "Third place".to_string(),
            Phase::Final => "Final".to_string(),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringPolicy {
    /// Goals uniform in 0..=5, strength ignored.
    Uniform,
    /// Goals around a strength-split expected rate.
    #[default]
    StrengthWeighted,
}

impl ScoringPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "uniform" => Some(ScoringPolicy::Uniform),
            "weighted" | "strength" | "strength_weighted" => Some(ScoringPolicy::StrengthWeighted),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoringPolicy::Uniform => "uniform",
            ScoringPolicy::StrengthWeighted => "weighted",
        }
    }

    fn draw_goals<R: Rng + ?Sized>(self, own: f64, other: f64, rng: &mut R) -> u8 {
        match self {
            ScoringPolicy::Uniform => rng.gen_range(0..=UNIFORM_MAX_GOALS),
            ScoringPolicy::StrengthWeighted => {
                let lambda = expected_goals(own, other);
                let z: f64 = rng.sample(StandardNormal);
                (lambda + z).clamp(0.0, WEIGHTED_MAX_GOALS).floor() as u8
            }
        }
    }

    fn penalty_success(self, strength: f64) -> f64 {
        match self {
            ScoringPolicy::Uniform => 0.5,
            ScoringPolicy::StrengthWeighted => (0.7 + 0.2 * strength).clamp(0.05, 0.95),
        }
    }
}

/// Share of the base goal total owed to a side with strength `own`.
pub fn expected_goals(own: f64, other: f64) -> f64 {
    let total = own + other;
    if total <= 0.0 {
        return GOALS_TOTAL_BASE / 2.0;
    }
    GOALS_TOTAL_BASE * own / total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub score: (u8, u8),
    pub penalties: Option<(u8, u8)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub first: TeamId,
    pub second: TeamId,
    pub phase: Phase,
    score: Option<(u8, u8)>,
    penalties: Option<(u8, u8)>,
}

impl Match {
    pub fn new(first: TeamId, second: TeamId, phase: Phase) -> Result<Self, TournamentError> {
        if first == second {
            return Err(TournamentError::SameTeam);
        }
        Ok(Self {
            first,
            second,
            phase,
            score: None,
            penalties: None,
        })
    }

    pub fn is_played(&self) -> bool {
        self.score.is_some()
    }

    pub fn score(&self) -> Option<(u8, u8)> {
        self.score
    }

    pub fn penalties(&self) -> Option<(u8, u8)> {
        self.penalties
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.first == team || self.second == team
    }

    /// Plays the match: draws a score, runs a shootout for a level knockout
    /// tie, and credits both teams.
    pub fn simulate<R: Rng + ?Sized>(
        &mut self,
        teams: &mut TeamRegistry,
        policy: ScoringPolicy,
        rng: &mut R,
    ) -> Result<MatchOutcome, TournamentError> {
        if self.is_played() {
            return Err(TournamentError::AlreadyPlayed);
        }
        let s_first = teams.get(self.first)?.strength;
        let s_second = teams.get(self.second)?.strength;

        let g_first = policy.draw_goals(s_first, s_second, rng);
        let g_second = policy.draw_goals(s_second, s_first, rng);

        let penalties = if !self.phase.is_group() && g_first == g_second {
            Some(penalty_shootout(
                policy.penalty_success(s_first),
                policy.penalty_success(s_second),
                rng,
            ))
        } else {
            None
        };

        self.record_result(teams, (g_first, g_second), penalties)
    }

    /// Applies a decided result. Penalties must be present exactly when a
    /// knockout match ends level, and must not be level themselves.
    pub fn record_result(
        &mut self,
        teams: &mut TeamRegistry,
        score: (u8, u8),
        penalties: Option<(u8, u8)>,
    ) -> Result<MatchOutcome, TournamentError> {
        if self.is_played() {
            return Err(TournamentError::AlreadyPlayed);
        }
        let needs_penalties = !self.phase.is_group() && score.0 == score.1;
        match penalties {
            Some((a, b)) if !needs_penalties || a == b => {
                return Err(TournamentError::InconsistentResult);
            }
            None if needs_penalties => return Err(TournamentError::InconsistentResult),
            _ => {}
        }
        // Validate both ids before touching either team.
        teams.get(self.first)?;
        teams.get(self.second)?;

        let (pts_first, pts_second) = if self.phase.is_group() {
            match score.0.cmp(&score.1) {
                std::cmp::Ordering::Greater => (3, 0),
                std::cmp::Ordering::Less => (0, 3),
                std::cmp::Ordering::Equal => (1, 1),
            }
        } else {
            (0, 0)
        };

        let first = teams.get_mut(self.first)?;
        first.goals += score.0 as u32;
        first.points += pts_first;
        let second = teams.get_mut(self.second)?;
        second.goals += score.1 as u32;
        second.points += pts_second;

        self.score = Some(score);
        self.penalties = penalties;
        debug!("{}", self.summary(teams));

        Ok(MatchOutcome { score, penalties })
    }

    pub fn winner(&self) -> Result<TeamId, TournamentError> {
        let (a, b) = self.score.ok_or(TournamentError::MatchNotPlayed)?;
        if a > b {
            return Ok(self.first);
        }
        if b > a {
            return Ok(self.second);
        }
        match self.penalties {
            Some((pa, pb)) if pa > pb => Ok(self.first),
            Some((pa, pb)) if pb > pa => Ok(self.second),
            _ => Err(TournamentError::NoWinner),
        }
    }

    pub fn loser(&self) -> Result<TeamId, TournamentError> {
        let winner = self.winner()?;
        Ok(if winner == self.first {
            self.second
        } else {
            self.first
        })
    }

    pub fn summary(&self, teams: &TeamRegistry) -> String {
        let first = teams.name(self.first);
        let second = teams.name(self.second);
        let Some((a, b)) = self.score else {
            return format!("[{}] {first} vs {second}", self.phase);
        };
        let mut out = format!("[{}] {first} {a} : {b} {second}", self.phase);
        if let Some((pa, pb)) = self.penalties {
            out.push_str(&format!(" (pens: {first} {pa} - {pb} {second})"));
        }
        out
    }
}

/// Five kicks each, then lock-step sudden death until the counts differ.
pub fn penalty_shootout<R: Rng + ?Sized>(p_first: f64, p_second: f64, rng: &mut R) -> (u8, u8) {
    let p_first = p_first.clamp(0.0, 1.0);
    let p_second = p_second.clamp(0.0, 1.0);
    let mut made_first = 0u8;
    let mut made_second = 0u8;

    for _ in 0..REGULATION_KICKS {
        made_first += rng.gen_bool(p_first) as u8;
        made_second += rng.gen_bool(p_second) as u8;
    }

    let mut rounds = 0usize;
    while made_first == made_second {
        if rounds >= MAX_SUDDEN_DEATH_ROUNDS {
            if rng.gen_bool(0.5) {
                made_first += 1;
            } else {
                made_second += 1;
            }
            break;
        }
        made_first += rng.gen_bool(p_first) as u8;
        made_second += rng.gen_bool(p_second) as u8;
        rounds += 1;
    }

    (made_first, made_second)
}
