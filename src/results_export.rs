use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::team::Team;
use crate::tournament::{MatchRecord, TournamentOutcome};

pub struct ExportReport {
    pub teams: usize,
    pub matches: usize,
    pub standings: usize,
}

/// Writes `Teams`, `Matches` and `Standings` sheets for a finished run.
pub fn export_results_xlsx(path: &Path, outcome: &TournamentOutcome) -> Result<ExportReport> {
    let mut teams_rows = vec![vec![
        "Team".to_string(),
        "FIFA Rank".to_string(),
        "Strength".to_string(),
        "Points".to_string(),
        "Goals".to_string(),
    ]];
    teams_rows.extend(outcome.teams.iter().map(team_row));

    let mut matches_rows = vec![vec![
        "#".to_string(),
        "Phase".to_string(),
        "First".to_string(),
        "Second".to_string(),
        "Score".to_string(),
        "Penalties".to_string(),
    ]];
    matches_rows.extend(
        outcome
            .matches
            .iter()
            .enumerate()
            .map(|(idx, m)| match_row(idx, m)),
    );

    let mut standings_rows = vec![vec![
        "Group".to_string(),
        "Position".to_string(),
        "Team".to_string(),
    ]];
    for group in &outcome.standings {
        for (pos, team) in group.order.iter().enumerate() {
            standings_rows.push(vec![
                group.group.clone(),
                (pos + 1).to_string(),
                team.clone(),
            ]);
        }
    }
    standings_rows.push(Vec::new());
    standings_rows.push(vec!["Champion".to_string(), String::new(), outcome.champion.clone()]);
    standings_rows.push(vec![
        "Runner-up".to_string(),
        String::new(),
        outcome.runner_up.clone(),
    ]);
    standings_rows.push(vec!["Third".to_string(), String::new(), outcome.third.clone()]);
    standings_rows.push(vec![
        "Seed".to_string(),
        String::new(),
        outcome.seed.to_string(),
    ]);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Teams")?;
        write_rows(sheet, &teams_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Matches")?;
        write_rows(sheet, &matches_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        teams: teams_rows.len().saturating_sub(1),
        matches: matches_rows.len().saturating_sub(1),
        standings: outcome.standings.iter().map(|g| g.order.len()).sum(),
    })
}

fn team_row(team: &Team) -> Vec<String> {
    vec![
        team.name.clone(),
        team.fifa_rank.to_string(),
        format!("{:.3}", team.strength),
        team.points.to_string(),
        team.goals.to_string(),
    ]
}

fn match_row(idx: usize, m: &MatchRecord) -> Vec<String> {
    vec![
        (idx + 1).to_string(),
        m.phase.clone(),
        m.first.clone(),
        m.second.clone(),
        pair_to_string(m.score),
        pair_to_string(m.penalties),
    ]
}

fn pair_to_string(pair: Option<(u8, u8)>) -> String {
    pair.map(|(a, b)| format!("{a}:{b}")).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_render_as_colon_separated() {
        assert_eq!(pair_to_string(Some((3, 2))), "3:2");
        assert_eq!(pair_to_string(None), "");
    }
}
