use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow};
use env_logger::Env;

use cup8_sim::config::Config;
use cup8_sim::entrants::EntrantCollector;
use cup8_sim::match_sim::ScoringPolicy;
use cup8_sim::rankings::load_rankings;
use cup8_sim::session::persist_outcome;
use cup8_sim::tournament::{TEAM_COUNT, Tournament};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let mut config = Config::from_env();

    if let Some(seed) = parse_value_arg("--seed") {
        config.seed = Some(
            seed.parse::<u64>()
                .with_context(|| format!("invalid --seed {seed:?}"))?,
        );
    }
    if let Some(raw) = parse_value_arg("--policy") {
        config.policy =
            ScoringPolicy::parse(&raw).ok_or_else(|| anyhow!("unknown --policy {raw:?}"))?;
    }

    println!("=== Football tournament simulator ({TEAM_COUNT} teams, 2 groups) ===");
    let collector = match parse_value_arg("--teams") {
        Some(raw) => collect_from_list(&raw)?,
        None => collect_from_stdin()?,
    };
    let names = collector.into_names()?;

    let rankings = load_rankings(&config);
    let mut tournament = Tournament::from_config(&names, &rankings, &config)?;

    let mut last_phase = None;
    let podium = tournament.run_with(|m, teams| {
        if last_phase != Some(m.phase) {
            println!("\n=== {} ===", m.phase);
            last_phase = Some(m.phase);
        }
        println!("{}", m.summary(teams));
    })?;

    let teams = tournament.teams();
    println!("\n=== Final standings ===");
    println!("Champion:  {}", teams.name(podium.champion));
    println!("Runner-up: {}", teams.name(podium.runner_up));
    println!("Third:     {}", teams.name(podium.third));
    println!("\nSeed: {} (replay with --seed {})", tournament.seed(), tournament.seed());

    let outcome = tournament.outcome()?;
    println!("\n{}", outcome.report.render());

    let persisted = persist_outcome(&config, &outcome);
    for line in persisted.saved.iter().chain(persisted.errors.iter()) {
        println!("{line}");
    }
    Ok(())
}

fn collect_from_list(raw: &str) -> Result<EntrantCollector> {
    let mut collector = EntrantCollector::new();
    for name in raw.split(',') {
        collector
            .try_add(name)
            .with_context(|| format!("invalid team {name:?}"))?;
    }
    if !collector.is_complete() {
        return Err(anyhow!(
            "--teams needs exactly {TEAM_COUNT} names, got {}",
            collector.len()
        ));
    }
    Ok(collector)
}

fn collect_from_stdin() -> Result<EntrantCollector> {
    println!("Enter exactly {TEAM_COUNT} teams:");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut collector = EntrantCollector::new();
    while !collector.is_complete() {
        print!("Team {}: ", collector.len() + 1);
        io::stdout().flush().ok();
        let Some(line) = lines.next() else {
            return Err(anyhow!(
                "input ended after {} of {TEAM_COUNT} teams",
                collector.len()
            ));
        };
        let line = line.context("failed reading team name")?;
        match collector.try_add(&line) {
            Ok(_) => {}
            Err(err) if err.is_validation() => println!("Error: {err}"),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(collector)
}

fn parse_value_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
