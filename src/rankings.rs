use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::http_cache::fetch_json_cached;
use crate::http_client::http_client;

/// Rank handed to any team missing from the table.
pub const WORST_RANK: u32 = 211;

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("polska", "Poland"),
    ("niemcy", "Germany"),
    ("usa", "United States"),
    ("holandia", "Netherlands"),
    ("włochy", "Italy"),
    ("francja", "France"),
    ("hiszpania", "Spain"),
    ("anglia", "England"),
    ("brazylia", "Brazil"),
    ("argentyna", "Argentina"),
];

// Snapshot of the top of the world ranking, used when no other source loads.
const BUILTIN_RANKINGS: &[(u32, &str, f64)] = &[
    (1, "Argentina", 1867.25),
    (2, "Spain", 1854.64),
    (3, "France", 1852.71),
    (4, "England", 1819.20),
    (5, "Brazil", 1776.03),
    (6, "Netherlands", 1752.44),
    (7, "Portugal", 1750.08),
    (8, "Belgium", 1735.75),
    (9, "Italy", 1718.31),
    (10, "Germany", 1716.98),
    (11, "Croatia", 1698.66),
    (12, "Morocco", 1694.24),
    (13, "Uruguay", 1679.49),
    (14, "Colombia", 1679.04),
    (15, "Japan", 1652.64),
    (16, "United States", 1648.81),
    (17, "Mexico", 1646.94),
    (18, "Iran", 1637.39),
    (19, "Senegal", 1630.32),
    (20, "Switzerland", 1624.06),
    (21, "Denmark", 1620.19),
    (22, "Austria", 1580.22),
    (23, "South Korea", 1574.93),
    (24, "Ecuador", 1566.48),
    (25, "Ukraine", 1559.78),
    (26, "Australia", 1554.68),
    (27, "Turkey", 1554.28),
    (28, "Sweden", 1536.07),
    (29, "Wales", 1534.63),
    (30, "Serbia", 1530.48),
    (31, "Egypt", 1518.57),
    (32, "Canada", 1517.24),
    (33, "Russia", 1512.32),
    (34, "Poland", 1510.34),
    (35, "Panama", 1505.93),
    (36, "Norway", 1505.79),
    (37, "Hungary", 1505.24),
    (38, "Algeria", 1501.42),
    (39, "Scotland", 1497.27),
    (40, "Czech Republic", 1494.34),
    (41, "Peru", 1493.74),
    (42, "Nigeria", 1491.71),
    (43, "Slovakia", 1488.99),
    (44, "Romania", 1481.40),
    (45, "Greece", 1478.14),
    (46, "Venezuela", 1476.30),
    (47, "Paraguay", 1474.43),
    (48, "Tunisia", 1474.28),
    (49, "Ivory Coast", 1470.17),
    (50, "Slovenia", 1467.68),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub country: String,
    #[serde(default)]
    pub points: f64,
}

/// Maps a team display name to a world rank (1 = best).
pub trait RankProvider {
    fn lookup(&self, display_name: &str) -> u32;
}

/// Lookup table keyed by lowercase normalized country name.
#[derive(Debug, Clone, Default)]
pub struct RankTable {
    ranks: HashMap<String, u32>,
}

impl RankTable {
    pub fn new(entries: impl IntoIterator<Item = RankingEntry>) -> Self {
        let mut ranks = HashMap::new();
        for entry in entries {
            let key = normalize_country_name(&entry.country).to_lowercase();
            if key.is_empty() {
                continue;
            }
            // Keep the best rank if a source lists a country twice.
            let rank = entry.rank.clamp(1, WORST_RANK);
            ranks
                .entry(key)
                .and_modify(|r: &mut u32| *r = (*r).min(rank))
                .or_insert(rank);
        }
        Self { ranks }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_RANKINGS
                .iter()
                .map(|(rank, country, points)| RankingEntry {
                    rank: *rank,
                    country: country.to_string(),
                    points: *points,
                }),
        )
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl RankProvider for RankTable {
    fn lookup(&self, display_name: &str) -> u32 {
        let key = normalize_country_name(display_name).to_lowercase();
        self.ranks.get(&key).copied().unwrap_or(WORST_RANK)
    }
}

/// Canonical English display name for a raw team name.
///
/// Known Polish country names are translated; anything else is trimmed,
/// whitespace-collapsed and title-cased word by word.
pub fn normalize_country_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if let Some((_, english)) = COUNTRY_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return english.to_string();
    }
    lower
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut at_start = true;
    for ch in word.chars() {
        if at_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        // Hyphenated and apostrophe names capitalize each part.
        at_start = !ch.is_alphanumeric();
    }
    out
}

pub fn parse_rankings_json(raw: &str) -> Result<Vec<RankingEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let entries: Vec<RankingEntry> =
        serde_json::from_str(trimmed).context("invalid rankings json")?;
    Ok(entries.into_iter().filter(|e| e.rank > 0).collect())
}

pub fn load_rankings_file(path: &Path) -> Result<Vec<RankingEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading rankings from {}", path.display()))?;
    parse_rankings_json(&raw)
}

pub fn fetch_rankings(url: &str) -> Result<Vec<RankingEntry>> {
    let client = http_client()?;
    let body = fetch_json_cached(client, url, &[]).context("rankings request failed")?;
    parse_rankings_json(&body)
}

/// Builds the rank table from the configured sources, falling back to the
/// builtin snapshot. Never fails: a broken source only degrades lookups.
pub fn load_rankings(config: &Config) -> RankTable {
    if let Some(path) = config.rankings_file.as_deref() {
        match load_rankings_file(path) {
            Ok(entries) if !entries.is_empty() => {
                info!("loaded {} rankings from {}", entries.len(), path.display());
                return RankTable::new(entries);
            }
            Ok(_) => warn!("rankings file {} is empty", path.display()),
            Err(err) => warn!("rankings file unavailable: {err:#}"),
        }
    }

    if let Some(url) = config.rankings_url.as_deref() {
        match fetch_rankings(url) {
            Ok(entries) if !entries.is_empty() => {
                info!("fetched {} rankings from {url}", entries.len());
                return RankTable::new(entries);
            }
            Ok(_) => warn!("rankings endpoint {url} returned no entries"),
            Err(err) => warn!("rankings fetch failed: {err:#}"),
        }
    }

    RankTable::builtin()
}
