use thiserror::Error;

use crate::team::TeamId;
use crate::tournament::Stage;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TournamentError {
    #[error("team name must not be empty")]
    EmptyName,

    #[error("team {0} is already registered")]
    DuplicateName(String),

    #[error("expected {expected} teams, found {found}")]
    WrongTeamCount { expected: usize, found: usize },

    #[error("a match needs two distinct teams")]
    SameTeam,

    #[error("match has not been played yet")]
    MatchNotPlayed,

    #[error("drawn group match has no winner")]
    NoWinner,

    #[error("match has already been played")]
    AlreadyPlayed,

    #[error("penalties must be decisive and only follow a level knockout match")]
    InconsistentResult,

    #[error("stage {actual:?} reached, but {expected:?} was required")]
    StageOrder { expected: Stage, actual: Stage },

    #[error("unknown team id {0:?}")]
    UnknownTeam(TeamId),
}

impl TournamentError {
    /// Entrant validation errors are retried by the caller; everything else
    /// is a broken precondition.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TournamentError::EmptyName | TournamentError::DuplicateName(_)
        )
    }
}
