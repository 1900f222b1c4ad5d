use std::collections::VecDeque;

use crate::config::Config;
use crate::entrants::EntrantCollector;
use crate::rankings::RankProvider;
use crate::session::persist_outcome;
use crate::tournament::{Tournament, TournamentOutcome};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Entry,
    Groups,
    Bracket,
    Stats,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Screen::Entry => "ENTRY",
            Screen::Groups => "GROUPS",
            Screen::Bracket => "BRACKET",
            Screen::Stats => "STATS",
        }
    }
}

pub struct AppState {
    pub screen: Screen,
    pub input: String,
    pub collector: EntrantCollector,
    pub tournament: Option<Tournament>,
    pub outcome: Option<TournamentOutcome>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Entry,
            input: String::new(),
            collector: EntrantCollector::new(),
            tournament: None,
            outcome: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if self.screen == Screen::Entry {
            self.input.push(ch);
        }
    }

    /// Deletes a character, or the last accepted entrant when the input is
    /// already empty.
    pub fn backspace(&mut self) {
        if self.input.pop().is_some() {
            return;
        }
        if let Some(name) = self.collector.pop() {
            self.push_log(format!("[INFO] Removed {name}"));
        }
    }

    /// Validates the typed name. Returns true once the field is full.
    pub fn submit_input(&mut self, provider: &dyn RankProvider) -> bool {
        let raw = std::mem::take(&mut self.input);
        match self.collector.try_add(&raw) {
            Ok(name) => {
                let name = name.to_string();
                let rank = provider.lookup(&name);
                let left = self.collector.remaining();
                self.push_log(format!(
                    "[INFO] Added {name} (FIFA rank {rank}), {left} to go"
                ));
            }
            Err(err) => self.push_log(format!("[WARN] {err}")),
        }
        self.collector.is_complete()
    }

    /// Plays a full tournament on the collected field and persists it.
    /// `seed` overrides the configured seed (used for replays).
    pub fn start_tournament(
        &mut self,
        provider: &dyn RankProvider,
        config: &Config,
        seed: Option<u64>,
    ) -> bool {
        let names = self.collector.names().to_vec();
        let seed = seed.or(config.seed);
        let mut tournament = match Tournament::new(&names, provider, config.policy, seed) {
            Ok(t) => t,
            Err(err) => {
                self.push_log(format!("[WARN] Cannot start: {err}"));
                return false;
            }
        };

        let mut summaries = Vec::new();
        let result = tournament.run_with(|m, teams| summaries.push(m.summary(teams)));
        for line in summaries {
            self.push_log(line);
        }
        if let Err(err) = result {
            self.push_log(format!("[WARN] Tournament failed: {err}"));
            return false;
        }

        match tournament.outcome() {
            Ok(outcome) => {
                self.push_log(format!(
                    "[INFO] Champion: {} | Runner-up: {} | Third: {} | seed {}",
                    outcome.champion, outcome.runner_up, outcome.third, outcome.seed
                ));
                let persisted = persist_outcome(config, &outcome);
                for line in persisted.saved {
                    self.push_log(format!("[INFO] {line}"));
                }
                for line in persisted.errors {
                    self.push_log(format!("[WARN] {line}"));
                }
                self.outcome = Some(outcome);
            }
            Err(err) => {
                self.push_log(format!("[WARN] No result: {err}"));
                return false;
            }
        }

        self.tournament = Some(tournament);
        self.screen = Screen::Groups;
        true
    }

    /// Clears results and returns to name entry with an empty field.
    pub fn reset(&mut self) {
        self.collector = EntrantCollector::new();
        self.input.clear();
        self.tournament = None;
        self.outcome = None;
        self.screen = Screen::Entry;
        self.push_log("[INFO] New tournament");
    }

    pub fn cycle_screen(&mut self) {
        if self.outcome.is_none() {
            return;
        }
        self.screen = match self.screen {
            Screen::Entry | Screen::Stats => Screen::Groups,
            Screen::Groups => Screen::Bracket,
            Screen::Bracket => Screen::Stats,
        };
    }

    pub fn show(&mut self, screen: Screen) {
        if screen == Screen::Entry || self.outcome.is_some() {
            self.screen = screen;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rankings::RankTable;

    fn quiet_config() -> Config {
        Config {
            seed: Some(9),
            results_json: None,
            results_db: None,
            results_xlsx: None,
            ..Config::default()
        }
    }

    fn type_name(state: &mut AppState, name: &str, table: &RankTable) -> bool {
        for ch in name.chars() {
            state.push_char(ch);
        }
        state.submit_input(table)
    }

    #[test]
    fn entry_reports_validation_errors_and_continues() {
        let table = RankTable::builtin();
        let mut state = AppState::new();
        assert!(!type_name(&mut state, "polska", &table));
        assert!(!type_name(&mut state, "Poland", &table));
        assert!(!type_name(&mut state, "  ", &table));
        assert_eq!(state.collector.len(), 1);
        let warnings = state.logs.iter().filter(|l| l.starts_with("[WARN]")).count();
        assert_eq!(warnings, 2);
        assert!(state.logs[0].contains("Poland (FIFA rank 34)"));
    }

    #[test]
    fn backspace_edits_then_removes_entrant() {
        let table = RankTable::builtin();
        let mut state = AppState::new();
        type_name(&mut state, "Spain", &table);
        state.push_char('x');
        state.backspace();
        assert_eq!(state.collector.len(), 1);
        state.backspace();
        assert!(state.collector.is_empty());
    }

    #[test]
    fn full_field_starts_tournament() {
        let table = RankTable::builtin();
        let mut state = AppState::new();
        let mut complete = false;
        for name in [
            "Brazil", "Spain", "France", "Japan", "Panama", "Chile", "Egypt", "Peru",
        ] {
            complete = type_name(&mut state, name, &table);
        }
        assert!(complete);
        assert!(state.tournament.is_none());
        assert!(state.start_tournament(&table, &quiet_config(), None));
        assert_eq!(state.screen, Screen::Groups);
        let outcome = state.outcome.as_ref().expect("outcome stored");
        assert_eq!(outcome.seed, 9);
        assert_eq!(outcome.matches.len(), 16);

        state.cycle_screen();
        assert_eq!(state.screen, Screen::Bracket);
        state.reset();
        assert_eq!(state.screen, Screen::Entry);
        state.show(Screen::Stats);
        assert_eq!(state.screen, Screen::Entry);
    }
}
