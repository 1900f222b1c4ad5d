use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::team::Team;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLine {
    pub name: String,
    pub fifa_rank: u32,
    pub points: u32,
    pub goals: u32,
}

impl From<&Team> for TeamLine {
    fn from(team: &Team) -> Self {
        Self {
            name: team.name.clone(),
            fifa_rank: team.fifa_rank,
            points: team.points,
            goals: team.goals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentReport {
    pub total_goals: u32,
    pub average_goals_per_team: f64,
    pub top_scorers: Vec<TeamLine>,
    pub best_by_rank: Vec<TeamLine>,
    /// (goals scored, number of teams), ascending by goals.
    pub goal_distribution: Vec<(u32, usize)>,
    /// Every team ordered by world rank, best first.
    pub rank_vs_performance: Vec<TeamLine>,
}

impl TournamentReport {
    pub fn from_teams(teams: &[Team]) -> Self {
        Self {
            total_goals: total_goals(teams),
            average_goals_per_team: average_goals_per_team(teams),
            top_scorers: top_scorers(teams, DEFAULT_TOP_N),
            best_by_rank: best_teams(teams, DEFAULT_TOP_N),
            goal_distribution: goal_distribution(teams),
            rank_vs_performance: rank_vs_performance(teams),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Tournament statistics ===");
        let _ = writeln!(out, "Total goals: {}", self.total_goals);
        let _ = writeln!(
            out,
            "Average goals per team: {:.2}",
            self.average_goals_per_team
        );

        let _ = writeln!(out, "\nTop scorers:");
        for (i, line) in self.top_scorers.iter().enumerate() {
            let _ = writeln!(out, "{}. {} - {} goals", i + 1, line.name, line.goals);
        }

        let _ = writeln!(out, "\nBest teams:");
        for (i, line) in self.best_by_rank.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. {} - {} pts, {} goals (FIFA rank: {})",
                i + 1,
                line.name,
                line.points,
                line.goals,
                line.fifa_rank
            );
        }

        let _ = writeln!(out, "\nGoal distribution:");
        for (goals, count) in &self.goal_distribution {
            let _ = writeln!(out, "{goals:>3} | {} ({count})", "#".repeat(*count));
        }

        let _ = writeln!(out, "\nRank vs performance:");
        for line in &self.rank_vs_performance {
            let _ = writeln!(
                out,
                "#{:<4} {:<20} {:>2} pts {:>3} goals",
                line.fifa_rank, line.name, line.points, line.goals
            );
        }
        out
    }
}

pub fn total_goals(teams: &[Team]) -> u32 {
    teams.iter().map(|t| t.goals).sum()
}

pub fn average_goals_per_team(teams: &[Team]) -> f64 {
    if teams.is_empty() {
        return 0.0;
    }
    total_goals(teams) as f64 / teams.len() as f64
}

pub fn top_scorers(teams: &[Team], n: usize) -> Vec<TeamLine> {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by_key(|t| Reverse(t.goals));
    sorted.into_iter().take(n).map(TeamLine::from).collect()
}

/// Top `n` by points, then goals.
pub fn best_teams(teams: &[Team], n: usize) -> Vec<TeamLine> {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by_key(|t| Reverse((t.points, t.goals)));
    sorted.into_iter().take(n).map(TeamLine::from).collect()
}

pub fn goal_distribution(teams: &[Team]) -> Vec<(u32, usize)> {
    let mut buckets: BTreeMap<u32, usize> = BTreeMap::new();
    for team in teams {
        *buckets.entry(team.goals).or_default() += 1;
    }
    buckets.into_iter().collect()
}

pub fn rank_vs_performance(teams: &[Team]) -> Vec<TeamLine> {
    let mut sorted: Vec<&Team> = teams.iter().collect();
    sorted.sort_by_key(|t| t.fifa_rank);
    sorted.into_iter().map(TeamLine::from).collect()
}
