use crate::{
    config::parse_seconds,
    types::{ItineraryRequest, SourceTag},
    EngineConfig,
};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Arg, ArgAction, Command};
use tracing::{info, Level};

/// CLI entry point for the tiny-trip tool
pub async fn run() -> anyhow::Result<()> {
    let matches = Command::new("tiny-trip")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan a day-by-day trip with LLM providers and an offline fallback")
        .arg(
            Arg::new("destination")
                .help("Where the trip goes")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("start-date")
                .short('s')
                .long("start-date")
                .value_name("YYYY-MM-DD")
                .help("First day of the trip (defaults to today)"),
        )
        .arg(
            Arg::new("days")
                .short('d')
                .long("days")
                .value_name("COUNT")
                .help("Trip length in days (1-14)")
                .default_value("3"),
        )
        .arg(
            Arg::new("prefs")
                .short('p')
                .long("prefs")
                .value_name("TAGS")
                .help("Comma separated interests, e.g. food_wine,history"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for reproducible random choices (or set ITINERARY_SEED)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Overall deadline; the offline generator answers when it expires"),
        )
        .arg(
            Arg::new("mock-only")
                .long("mock-only")
                .action(ArgAction::SetTrue)
                .help("Skip every provider and use the offline generator"),
        )
        .arg(
            Arg::new("no-enrich")
                .long("no-enrich")
                .action(ArgAction::SetTrue)
                .help("Do not enrich activities with lookups"),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .action(ArgAction::SetTrue)
                .help("Verbose logging and a generation replay on stderr"),
        )
        .get_matches();

    let trace = matches.get_flag("trace");
    // stdout carries only the itinerary JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if trace { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = EngineConfig::from_env().context("invalid environment configuration")?;
    if let Some(seed) = matches.get_one::<String>("seed") {
        config = config.with_seed(seed.parse().context("--seed must be an unsigned integer")?);
    }
    if matches.get_flag("no-enrich") {
        config = config.with_enrichment(false);
    }

    let start_date = match matches.get_one::<String>("start-date") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("--start-date `{raw}` is not YYYY-MM-DD"))?,
        None => Local::now().date_naive(),
    };
    let days: u32 = matches
        .get_one::<String>("days")
        .map(|raw| raw.parse())
        .transpose()
        .context("--days must be a whole number")?
        .unwrap_or(3);
    let preferences: Vec<String> = matches
        .get_one::<String>("prefs")
        .map(|raw| raw.split(',').map(str::to_string).collect())
        .unwrap_or_default();
    let destination = matches
        .get_one::<String>("destination")
        .context("destination is required")?;

    let request = ItineraryRequest::new(destination.as_str(), start_date, days, preferences)?;
    let orchestrator = config.build_orchestrator()?;
    info!(providers = ?orchestrator.provider_order(), "orchestrator ready");

    let result = if matches.get_flag("mock-only") {
        orchestrator.mock_only(&request)
    } else if let Some(raw) = matches.get_one::<String>("timeout") {
        let deadline = parse_seconds("--timeout", raw)?;
        orchestrator
            .generate_within(&request, deadline)
            .await
    } else {
        orchestrator.generate(&request).await
    };

    if trace {
        eprintln!("{}", result.replay());
    }
    if result.source == SourceTag::Mock && !matches.get_flag("mock-only") {
        eprintln!("note: every provider failed, itinerary comes from the offline generator");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
