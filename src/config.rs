use std::env;
use std::path::PathBuf;

use log::warn;

use crate::http_cache::app_cache_dir;
use crate::match_sim::ScoringPolicy;

const DEFAULT_RESULTS_JSON: &str = "data.json";
const DEFAULT_RESULTS_DB: &str = "results.sqlite";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub seed: Option<u64>,
    pub policy: ScoringPolicy,
    pub results_json: Option<PathBuf>,
    pub results_db: Option<PathBuf>,
    pub results_xlsx: Option<PathBuf>,
    pub rankings_file: Option<PathBuf>,
    pub rankings_url: Option<String>,
}

/// Fixed seedless config with only the JSON sink enabled. The SQLite default
/// path depends on the environment, so it is filled in by
/// [`Config::from_lookup`] only.
impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            policy: ScoringPolicy::default(),
            results_json: Some(PathBuf::from(DEFAULT_RESULTS_JSON)),
            results_db: None,
            results_xlsx: None,
            rankings_file: None,
            rankings_url: None,
        }
    }
}

impl Config {
    /// Loads `.env.local` and `.env` (if present), then reads the process
    /// environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let seed = get("TOURNAMENT_SEED").and_then(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<u64>() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("ignoring TOURNAMENT_SEED={trimmed:?}: not an unsigned integer");
                    None
                }
            }
        });

        let policy = match get("SCORING_POLICY") {
            Some(raw) => ScoringPolicy::parse(&raw).unwrap_or_else(|| {
                warn!("unknown SCORING_POLICY={raw:?}, using weighted");
                ScoringPolicy::default()
            }),
            None => ScoringPolicy::default(),
        };

        let results_json = match get("RESULTS_JSON") {
            Some(raw) => non_empty_path(&raw),
            None => Some(PathBuf::from(DEFAULT_RESULTS_JSON)),
        };

        let results_db = match get("RESULTS_DB") {
            Some(raw) => non_empty_path(&raw),
            None => app_cache_dir().map(|dir| dir.join(DEFAULT_RESULTS_DB)),
        };

        Self {
            seed,
            policy,
            results_json,
            results_db,
            results_xlsx: get("RESULTS_XLSX").and_then(|raw| non_empty_path(&raw)),
            rankings_file: get("RANKINGS_FILE").and_then(|raw| non_empty_path(&raw)),
            rankings_url: get("RANKINGS_URL")
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty()),
        }
    }
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let cfg = config_from(&[("RESULTS_DB", "")]);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.policy, ScoringPolicy::StrengthWeighted);
        assert_eq!(cfg.results_json, Some(PathBuf::from("data.json")));
        assert_eq!(cfg.results_db, None);
        assert_eq!(cfg.results_xlsx, None);
    }

    #[test]
    fn db_defaults_to_cache_dir_only_from_environment() {
        let cfg = config_from(&[]);
        assert_eq!(
            cfg.results_db,
            app_cache_dir().map(|dir| dir.join("results.sqlite"))
        );
        assert_eq!(Config::default().results_db, None);
        assert_eq!(Config::default().results_json, cfg.results_json);
    }

    #[test]
    fn parses_seed_and_policy() {
        let cfg = config_from(&[
            ("TOURNAMENT_SEED", " 42 "),
            ("SCORING_POLICY", "Uniform"),
            ("RESULTS_XLSX", "out/results.xlsx"),
            ("RANKINGS_URL", "  "),
        ]);
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.policy, ScoringPolicy::Uniform);
        assert_eq!(cfg.results_xlsx, Some(PathBuf::from("out/results.xlsx")));
        assert_eq!(cfg.rankings_url, None);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = config_from(&[("TOURNAMENT_SEED", "-3"), ("SCORING_POLICY", "chaos")]);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.policy, ScoringPolicy::StrengthWeighted);
    }
}
