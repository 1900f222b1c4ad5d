use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TournamentError;
use crate::rankings::{RankProvider, WORST_RANK};

/// Lowest strength handed out; keeps goal rates and penalty odds positive
/// for teams ranked near the bottom.
pub const MIN_STRENGTH: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub fifa_rank: u32,
    pub strength: f64,
    pub points: u32,
    pub goals: u32,
}

impl Team {
    pub fn new(name: impl Into<String>, fifa_rank: u32) -> Self {
        let fifa_rank = fifa_rank.clamp(1, WORST_RANK);
        Self {
            name: name.into(),
            fifa_rank,
            strength: strength_from_rank(fifa_rank),
            points: 0,
            goals: 0,
        }
    }

    pub fn from_provider(name: impl Into<String>, provider: &dyn RankProvider) -> Self {
        let name = name.into();
        let rank = provider.lookup(&name);
        Self::new(name, rank)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} – {} pts, {} goals (FIFA rank: {})",
            self.name, self.points, self.goals, self.fifa_rank
        )
    }
}

/// Piecewise-linear strength curve over world rank.
pub fn strength_from_rank(rank: u32) -> f64 {
    let r = rank.clamp(1, WORST_RANK) as f64;
    let raw = if r <= 10.0 {
        0.9 - 0.02 * r
    } else if r <= 50.0 {
        0.7 - 0.01 * (r - 10.0)
    } else {
        0.3 - 0.0025 * (r - 50.0)
    };
    raw.max(MIN_STRENGTH)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRegistry {
    teams: Vec<Team>,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, team: Team) -> TeamId {
        self.teams.push(team);
        TeamId(self.teams.len() - 1)
    }

    pub fn get(&self, id: TeamId) -> Result<&Team, TournamentError> {
        self.teams.get(id.0).ok_or(TournamentError::UnknownTeam(id))
    }

    pub fn get_mut(&mut self, id: TeamId) -> Result<&mut Team, TournamentError> {
        self.teams.get_mut(id.0).ok_or(TournamentError::UnknownTeam(id))
    }

    /// Name for display; unknown ids render as `?` rather than failing a
    /// whole summary line.
    pub fn name(&self, id: TeamId) -> &str {
        self.teams.get(id.0).map(|t| t.name.as_str()).unwrap_or("?")
    }

    pub fn ids(&self) -> impl Iterator<Item = TeamId> + '_ {
        (0..self.teams.len()).map(TeamId)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn total_goals(&self) -> u32 {
        self.teams.iter().map(|t| t.goals).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::RankTable;

    #[test]
    fn strength_follows_rank_bands() {
        assert!((strength_from_rank(1) - 0.88).abs() < 1e-9);
        assert!((strength_from_rank(10) - 0.70).abs() < 1e-9);
        assert!((strength_from_rank(34) - 0.46).abs() < 1e-9);
        assert!((strength_from_rank(50) - 0.30).abs() < 1e-9);
        assert!((strength_from_rank(100) - 0.175).abs() < 1e-9);
    }

    #[test]
    fn strength_never_drops_below_floor() {
        assert_eq!(strength_from_rank(WORST_RANK), MIN_STRENGTH);
        assert_eq!(strength_from_rank(999), MIN_STRENGTH);
        assert!((strength_from_rank(0) - 0.88).abs() < 1e-9);
    }

    #[test]
    fn team_from_provider_uses_rank() {
        let table = RankTable::builtin();
        let team = Team::from_provider("Poland", &table);
        assert_eq!(team.fifa_rank, 34);
        assert!((team.strength - 0.46).abs() < 0.01);
        assert_eq!(team.to_string(), "Poland – 0 pts, 0 goals (FIFA rank: 34)");
    }

    #[test]
    fn registry_rejects_unknown_ids() {
        let mut registry = TeamRegistry::new();
        let id = registry.add(Team::new("Brazil", 5));
        assert_eq!(registry.get(id).map(|t| t.name.as_str()), Ok("Brazil"));
        assert_eq!(
            registry.get(TeamId(7)).err(),
            Some(TournamentError::UnknownTeam(TeamId(7)))
        );
        assert_eq!(registry.name(TeamId(7)), "?");
    }
}
