use crate::error::TournamentError;
use crate::rankings::normalize_country_name;
use crate::tournament::TEAM_COUNT;

/// Gathers team names one at a time until the field is full.
///
/// Names are normalized before the duplicate check, so `"Polska"` and
/// `"poland"` count as the same entrant.
#[derive(Debug, Clone, Default)]
pub struct EntrantCollector {
    names: Vec<String>,
}

impl EntrantCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_add(&mut self, raw: &str) -> Result<&str, TournamentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TournamentError::EmptyName);
        }
        if self.is_complete() {
            return Err(TournamentError::WrongTeamCount {
                expected: TEAM_COUNT,
                found: TEAM_COUNT + 1,
            });
        }
        let name = normalize_country_name(trimmed);
        let key = name.to_lowercase();
        if self.names.iter().any(|n| n.to_lowercase() == key) {
            return Err(TournamentError::DuplicateName(name));
        }
        self.names.push(name);
        Ok(self.names.last().map(String::as_str).unwrap_or_default())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn remaining(&self) -> usize {
        TEAM_COUNT.saturating_sub(self.names.len())
    }

    pub fn is_complete(&self) -> bool {
        self.names.len() == TEAM_COUNT
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Drops the most recent entrant (console "undo").
    pub fn pop(&mut self) -> Option<String> {
        self.names.pop()
    }

    pub fn into_names(self) -> Result<Vec<String>, TournamentError> {
        if !self.is_complete() {
            return Err(TournamentError::WrongTeamCount {
                expected: TEAM_COUNT,
                found: self.names.len(),
            });
        }
        Ok(self.names)
    }
}
