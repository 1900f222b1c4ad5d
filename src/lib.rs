pub mod config;
pub mod entrants;
pub mod error;
pub mod http_cache;
pub mod http_client;
pub mod match_sim;
pub mod persist;
pub mod rankings;
pub mod results_export;
pub mod session;
pub mod state;
pub mod stats;
pub mod team;
pub mod tournament;

pub use error::TournamentError;
