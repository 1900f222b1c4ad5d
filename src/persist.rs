use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::team::Team;
use crate::tournament::TournamentOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team: String,
    pub fifa_rank: u32,
    pub strength: f64,
    pub points: u32,
    pub goals: u32,
}

impl From<&Team> for TeamRecord {
    fn from(team: &Team) -> Self {
        Self {
            team: team.name.clone(),
            fifa_rank: team.fifa_rank,
            strength: team.strength,
            points: team.points,
            goals: team.goals,
        }
    }
}

/// Writes one record per team as pretty JSON, via a temp file and rename.
pub fn save_results_json(path: &Path, teams: &[Team]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create results dir {}", dir.display()))?;
        }
    }
    let records: Vec<TeamRecord> = teams.iter().map(TeamRecord::from).collect();
    let json = serde_json::to_string_pretty(&records).context("serialize results")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

pub fn load_results_json(path: &Path) -> Result<Vec<TeamRecord>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read results {}", path.display()))?;
    serde_json::from_str(&raw).context("invalid results json")
}

/// Run history in SQLite: one row per tournament, plus its teams and matches.
pub struct ResultsDb {
    conn: Connection,
    path: PathBuf,
}

impl ResultsDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create results dir {}", parent.display()))?;
            }
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores a finished run in a single transaction; returns its run id.
    pub fn record_run(&mut self, outcome: &TournamentOutcome) -> Result<i64> {
        let tx = self
            .conn
            .transaction()
            .context("begin results transaction")?;
        tx.execute(
            "INSERT INTO runs(played_at, seed, policy, champion, runner_up, third, total_goals)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                Utc::now().to_rfc3339(),
                // SQLite integers are signed; keep the seed's bits.
                outcome.seed as i64,
                outcome.policy.label(),
                outcome.champion,
                outcome.runner_up,
                outcome.third,
                outcome.total_goals as i64,
            ],
        )
        .context("insert run")?;
        let run_id = tx.last_insert_rowid();

        for team in &outcome.teams {
            tx.execute(
                "INSERT INTO team_results(run_id, team, fifa_rank, strength, points, goals)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run_id,
                    team.name,
                    team.fifa_rank as i64,
                    team.strength,
                    team.points as i64,
                    team.goals as i64,
                ],
            )
            .context("insert team result")?;
        }

        for (seq, m) in outcome.matches.iter().enumerate() {
            let (goals_first, goals_second) = m.score.unzip();
            let (pens_first, pens_second) = m.penalties.unzip();
            tx.execute(
                "INSERT INTO match_results(run_id, seq, phase, first_team, second_team,
                    first_goals, second_goals, first_pens, second_pens)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    run_id,
                    seq as i64,
                    m.phase,
                    m.first,
                    m.second,
                    goals_first,
                    goals_second,
                    pens_first,
                    pens_second,
                ],
            )
            .context("insert match result")?;
        }

        tx.commit().context("commit results transaction")?;
        Ok(run_id)
    }

    pub fn run_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))
            .context("count runs")
    }

    /// How often each team has won, most titles first.
    pub fn title_counts(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT champion, COUNT(*) AS titles FROM runs
                 GROUP BY champion ORDER BY titles DESC, champion ASC",
            )
            .context("prepare title counts")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .context("query title counts")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("read title row")?);
        }
        Ok(out)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            played_at TEXT NOT NULL,
            seed INTEGER NOT NULL,
            policy TEXT NOT NULL,
            champion TEXT NOT NULL,
            runner_up TEXT NOT NULL,
            third TEXT NOT NULL,
            total_goals INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS team_results (
            run_id INTEGER NOT NULL REFERENCES runs(run_id),
            team TEXT NOT NULL,
            fifa_rank INTEGER NOT NULL,
            strength REAL NOT NULL,
            points INTEGER NOT NULL,
            goals INTEGER NOT NULL,
            PRIMARY KEY (run_id, team)
        );

        CREATE TABLE IF NOT EXISTS match_results (
            run_id INTEGER NOT NULL REFERENCES runs(run_id),
            seq INTEGER NOT NULL,
            phase TEXT NOT NULL,
            first_team TEXT NOT NULL,
            second_team TEXT NOT NULL,
            first_goals INTEGER NULL,
            second_goals INTEGER NULL,
            first_pens INTEGER NULL,
            second_pens INTEGER NULL,
            PRIMARY KEY (run_id, seq)
        );
        CREATE INDEX IF NOT EXISTS idx_runs_champion ON runs(champion);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}
