use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use house_cup::config::{self, Config};
use house_cup::lifecycle::{EventDraft, EventLifecycle, EventPatch, LifecycleError};
use house_cup::model::{Category, EventKind, EventResult, EventStatus};
use house_cup::output;
use house_cup::roster;
use house_cup::standings;
use house_cup::store::{CompetitionStore, JsonFileStore, StoreError};
use house_cup::ScoringConfig;

const EXIT_SUCCESS: i32 = 0;
/// Domain error: validation, state, or lookup failure.
const EXIT_DOMAIN: i32 = 1;
/// Data error: the competition file is missing, unreadable, or corrupt.
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Parser, Debug)]
#[command(name = "house-cup")]
#[command(about = "Family competition tracker: events, placements, leaderboards", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/house-cup/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the competition data file (overrides the config file)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the competition data file
    Init {
        /// Seed houses, categories, and players from a roster YAML file
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Replace an existing data file
        #[arg(long)]
        force: bool,
    },
    /// Create, run, and score events
    #[command(subcommand)]
    Event(EventCommands),
    /// Show the leaderboards
    Standings {
        /// Player leaderboard for one category (name or id)
        #[arg(long)]
        category: Option<String>,

        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,

        /// Keep the screen updated as results come in
        #[arg(long)]
        watch: bool,

        /// How often watch mode re-reads the data file
        #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
    /// Manage the competition roster
    #[command(subcommand)]
    Roster(RosterCommands),
}

#[derive(Subcommand, Debug)]
enum EventCommands {
    /// Schedule a new event
    Create {
        #[arg(long)]
        name: String,

        /// Category (name or id)
        #[arg(long)]
        category: String,

        /// "individual" (players place) or "group" (houses place)
        #[arg(long, default_value = "individual")]
        kind: String,

        /// Placement table, e.g. "1=10,2=6,3=3" (defaults from config)
        #[arg(long)]
        scoring: Option<String>,
    },
    /// List events
    List {
        /// Only events with this status (scheduled, in-progress, completed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one event in full
    Show { id: String },
    /// Edit a scheduled, running, or completed event
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Category (name or id)
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        kind: Option<String>,

        /// Placement table, e.g. "1=10,2=6,3=3"
        #[arg(long)]
        scoring: Option<String>,
    },
    /// Start a scheduled event
    Start { id: String },
    /// Record results and complete a running event
    Complete {
        id: String,

        /// A placement, repeated: --result 1=Ana --result 2=p4
        /// (participants by name or id; players for individual events,
        /// houses for group events)
        #[arg(long = "result", value_name = "PLACE=PARTICIPANT", required = true)]
        results: Vec<String>,
    },
    /// Return an event to scheduled, discarding times and results
    Reset { id: String },
    /// Delete a scheduled event
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum RosterCommands {
    /// Add houses, categories, and players from a roster YAML file
    Import { file: PathBuf },
    /// List the current roster
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let data_path = cli
        .data
        .clone()
        .or_else(|| config.data_path.clone())
        .unwrap_or_else(config::default_data_path);

    match run(cli.command, &config, &data_path).await {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("house_cup=debug")
        } else {
            EnvFilter::new("house_cup=info")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

/// Anything with a store fault in its chain is a data problem; everything
/// else that reaches here is a domain error (validation, state, lookup).
///
/// The lifecycle wraps store faults transparently, so its `Store` variant
/// has to be matched as well — the inner `StoreError` is not a separate
/// link in the chain.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    let store_fault = err.chain().any(|cause| {
        cause.downcast_ref::<StoreError>().is_some()
            || matches!(
                cause.downcast_ref::<LifecycleError>(),
                Some(LifecycleError::Store(_))
            )
    });
    if store_fault {
        EXIT_DATA
    } else {
        EXIT_DOMAIN
    }
}

async fn run(command: Commands, config: &Config, data_path: &PathBuf) -> Result<()> {
    match command {
        Commands::Init { roster, force } => cmd_init(data_path, roster, force),
        Commands::Event(event_command) => {
            let store: Arc<JsonFileStore> = Arc::new(JsonFileStore::open(data_path)?);
            cmd_event(store, config, event_command)
        }
        Commands::Standings {
            category,
            tsv,
            watch,
            interval,
        } => {
            let store = Arc::new(JsonFileStore::open(data_path)?);
            cmd_standings(store, category, tsv, watch, interval).await
        }
        Commands::Roster(roster_command) => {
            let store = Arc::new(JsonFileStore::open(data_path)?);
            cmd_roster(store, roster_command)
        }
    }
}

fn cmd_init(data_path: &PathBuf, roster_path: Option<PathBuf>, force: bool) -> Result<()> {
    let store = JsonFileStore::create(data_path, force)?;
    println!("Created {}", store.path().display());

    if let Some(path) = roster_path {
        let roster_file = roster::load_roster(&path)?;
        let summary = roster::import_roster(&store, &roster_file)?;
        println!(
            "Imported {} houses, {} categories, {} players",
            summary.houses, summary.categories, summary.players
        );
    }
    Ok(())
}

fn cmd_event(store: Arc<JsonFileStore>, config: &Config, command: EventCommands) -> Result<()> {
    let lifecycle = EventLifecycle::new(store.clone() as Arc<dyn CompetitionStore>);
    let use_colors = output::should_use_colors();

    match command {
        EventCommands::Create {
            name,
            category,
            kind,
            scoring,
        } => {
            let category = resolve_category(store.as_ref(), &category)?;
            let kind = EventKind::parse(&kind)?;
            let scoring = match scoring {
                Some(s) => ScoringConfig::parse(&s)?,
                None => config.default_scoring.clone().unwrap_or_default(),
            };
            let event = lifecycle.create(EventDraft {
                name,
                category_id: category.id,
                kind,
                scoring,
            })?;
            println!("Created event {} ({})", event.id, event.name);
        }
        EventCommands::List { status } => {
            let status = status.as_deref().map(EventStatus::parse).transpose()?;
            let mut events = store.events()?;
            if let Some(status) = status {
                events.retain(|event| event.status == status);
            }
            let categories = store.categories()?;
            println!(
                "{}",
                output::format_event_list(&events, &categories, use_colors)
            );
        }
        EventCommands::Show { id } => {
            let event = store
                .event(&id)?
                .with_context(|| format!("no event with id {}", id))?;
            println!(
                "{}",
                output::format_event_detail(
                    &event,
                    &store.categories()?,
                    &store.players()?,
                    &store.houses()?,
                    use_colors
                )
            );
        }
        EventCommands::Update {
            id,
            name,
            category,
            kind,
            scoring,
        } => {
            let category_id = category
                .map(|c| resolve_category(store.as_ref(), &c).map(|category| category.id))
                .transpose()?;
            let patch = EventPatch {
                name,
                category_id,
                kind: kind.as_deref().map(EventKind::parse).transpose()?,
                scoring: scoring.as_deref().map(ScoringConfig::parse).transpose()?,
            };
            let event = lifecycle.update(&id, patch)?;
            println!("Updated event {} ({})", event.id, event.name);
        }
        EventCommands::Start { id } => {
            let event = lifecycle.start(&id)?;
            println!("Started {} ({})", event.name, event.id);
        }
        EventCommands::Complete { id, results } => {
            // The event's kind decides whether participants are players or
            // houses, so it has to be fetched before resolution. The status
            // check still happens inside complete().
            let event = store
                .event(&id)?
                .with_context(|| format!("no event with id {}", id))?;
            let resolved = resolve_results(store.as_ref(), event.kind, &results)?;
            let event = lifecycle.complete(&id, resolved)?;
            println!(
                "Completed {} with {} results",
                event.name,
                event.results.as_ref().map(Vec::len).unwrap_or(0)
            );
        }
        EventCommands::Reset { id } => {
            let event = lifecycle.reset(&id)?;
            println!("Reset {} to scheduled", event.name);
        }
        EventCommands::Delete { id } => {
            lifecycle.delete(&id)?;
            println!("Deleted event {}", id);
        }
    }
    Ok(())
}

async fn cmd_standings(
    store: Arc<JsonFileStore>,
    category: Option<String>,
    tsv: bool,
    watch: bool,
    interval: Duration,
) -> Result<()> {
    let category_id = category
        .map(|c| resolve_category(store.as_ref(), &c).map(|category| category.id))
        .transpose()?;
    let use_colors = output::should_use_colors();

    let render = {
        let store = store.clone();
        move || render_standings(store.as_ref(), category_id.as_deref(), tsv, use_colors)
    };

    if watch {
        house_cup::live::run_watch(store, interval, render).await
    } else {
        let mut render = render;
        println!("{}", render()?);
        Ok(())
    }
}

fn render_standings(
    store: &dyn CompetitionStore,
    category_id: Option<&str>,
    tsv: bool,
    use_colors: bool,
) -> Result<String> {
    let houses = store.houses()?;
    let players = store.players()?;
    let categories = store.categories()?;
    let events = store.events()?;

    if let Some(category_id) = category_id {
        let rows = standings::category_standings(category_id, &houses, &players, &events);
        if tsv {
            return Ok(output::format_standings_tsv(&[], &rows, &houses, &players));
        }
        return Ok(output::format_player_table(
            &rows, &players, &houses, use_colors,
        ));
    }

    let standings = standings::aggregate(&houses, &players, &events);
    if tsv {
        return Ok(output::format_standings_tsv(
            &standings.houses,
            &standings.players,
            &houses,
            &players,
        ));
    }

    Ok(format!(
        "Houses\n{}\n\nPlayers\n{}",
        output::format_house_table(&standings.houses, &houses, &categories, use_colors),
        output::format_player_table(&standings.players, &players, &houses, use_colors)
    ))
}

fn cmd_roster(store: Arc<JsonFileStore>, command: RosterCommands) -> Result<()> {
    match command {
        RosterCommands::Import { file } => {
            let roster_file = roster::load_roster(&file)?;
            let summary = roster::import_roster(store.as_ref(), &roster_file)?;
            println!(
                "Imported {} houses, {} categories, {} players",
                summary.houses, summary.categories, summary.players
            );
        }
        RosterCommands::Show => {
            let houses = store.houses()?;
            let categories = store.categories()?;
            let players = store.players()?;

            println!("Houses:");
            for house in &houses {
                println!("  {}  {} ({})", house.id, house.name, house.color);
            }
            println!("Categories:");
            for category in &categories {
                println!("  {}  {} ({})", category.id, category.name, category.label);
            }
            println!("Players:");
            for player in &players {
                let house = houses
                    .iter()
                    .find(|h| h.id == player.house_id)
                    .map(|h| h.name.as_str())
                    .unwrap_or(player.house_id.as_str());
                let category = categories
                    .iter()
                    .find(|c| c.id == player.category_id)
                    .map(|c| c.name.as_str())
                    .unwrap_or(player.category_id.as_str());
                println!(
                    "  {}  {} ({}, {})",
                    player.id, player.full_name, house, category
                );
            }
        }
    }
    Ok(())
}

/// Resolve a category given by id or (case-insensitive) name.
fn resolve_category(store: &dyn CompetitionStore, wanted: &str) -> Result<Category> {
    let wanted = wanted.trim();
    let categories = store.categories()?;
    categories
        .iter()
        .find(|category| category.id == wanted)
        .or_else(|| {
            categories
                .iter()
                .find(|category| category.name.eq_ignore_ascii_case(wanted))
        })
        .cloned()
        .with_context(|| {
            let known: Vec<&str> = categories
                .iter()
                .map(|category| category.name.as_str())
                .collect();
            format!(
                "No category \"{}\" (known: {})",
                wanted,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
}

/// Split a `--result PLACE=PARTICIPANT` flag into its parts.
fn parse_result_spec(spec: &str) -> Result<(u32, &str)> {
    let (place, who) = spec
        .split_once('=')
        .with_context(|| format!("Expected <placement>=<participant>, got \"{}\"", spec))?;
    let placement: u32 = place
        .trim()
        .parse()
        .with_context(|| format!("Invalid placement \"{}\"", place.trim()))?;
    Ok((placement, who.trim()))
}

/// Resolve `--result` flags to result entries. Participants are matched by
/// id first, then by name; the event's kind decides whether that means a
/// player or a house.
fn resolve_results(
    store: &dyn CompetitionStore,
    kind: EventKind,
    specs: &[String],
) -> Result<Vec<EventResult>> {
    let players = store.players()?;
    let houses = store.houses()?;

    specs
        .iter()
        .map(|spec| {
            let (placement, who) = parse_result_spec(spec)?;
            let participant_id = match kind {
                EventKind::Individual => players
                    .iter()
                    .find(|p| p.id == who)
                    .or_else(|| {
                        players
                            .iter()
                            .find(|p| p.full_name.eq_ignore_ascii_case(who))
                    })
                    .map(|p| p.id.clone())
                    .with_context(|| format!("No player \"{}\"", who))?,
                EventKind::Group => houses
                    .iter()
                    .find(|h| h.id == who)
                    .or_else(|| houses.iter().find(|h| h.name.eq_ignore_ascii_case(who)))
                    .map(|h| h.id.clone())
                    .with_context(|| format!("No house \"{}\"", who))?,
            };
            Ok(EventResult {
                placement,
                participant_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use house_cup::model::{House, Player};
    use house_cup::store::MemoryStore;

    fn roster_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_house(House {
                id: String::new(),
                name: "Emerald".to_string(),
                color: "#2ECC71".to_string(),
            })
            .unwrap();
        store
            .create_category(Category {
                id: String::new(),
                name: "kids".to_string(),
                label: "Kids (under 12)".to_string(),
            })
            .unwrap();
        store
            .create_player(Player {
                id: String::new(),
                full_name: "Ana Flores".to_string(),
                category_id: "c2".to_string(),
                house_id: "h1".to_string(),
            })
            .unwrap();
        store
    }

    #[test]
    fn test_parse_result_spec() {
        assert_eq!(parse_result_spec("1=Ana").unwrap(), (1, "Ana"));
        assert_eq!(parse_result_spec(" 2 = p4 ").unwrap(), (2, "p4"));
        assert!(parse_result_spec("first=Ana").is_err());
        assert!(parse_result_spec("Ana").is_err());
    }

    #[test]
    fn test_resolve_category_by_id_or_name() {
        let store = roster_store();
        assert_eq!(resolve_category(&store, "c2").unwrap().name, "kids");
        assert_eq!(resolve_category(&store, "KIDS").unwrap().id, "c2");

        let err = resolve_category(&store, "teens").unwrap_err();
        assert!(err.to_string().contains("kids"));
    }

    #[test]
    fn test_resolve_results_by_name_and_id() {
        let store = roster_store();

        let results = resolve_results(
            &store,
            EventKind::Individual,
            &["1=ana flores".to_string()],
        )
        .unwrap();
        assert_eq!(results[0].participant_id, "p3");
        assert_eq!(results[0].placement, 1);

        let results =
            resolve_results(&store, EventKind::Group, &["1=Emerald".to_string()]).unwrap();
        assert_eq!(results[0].participant_id, "h1");
    }

    #[test]
    fn test_resolve_results_respects_event_kind() {
        let store = roster_store();
        // A house name is not a valid participant for an individual event.
        let err =
            resolve_results(&store, EventKind::Individual, &["1=Emerald".to_string()]).unwrap_err();
        assert!(err.to_string().contains("No player"));
    }

    #[test]
    fn test_store_errors_map_to_data_exit_code() {
        let err = anyhow::Error::from(StoreError::UnsupportedVersion(9));
        assert_eq!(exit_code_for(&err), EXIT_DATA);

        // The same fault wrapped by a lifecycle operation still counts.
        let err = anyhow::Error::from(LifecycleError::Store(StoreError::UnsupportedVersion(9)));
        assert_eq!(exit_code_for(&err), EXIT_DATA);

        let err = anyhow::anyhow!("no player \"x\"");
        assert_eq!(exit_code_for(&err), EXIT_DOMAIN);

        let err = anyhow::Error::from(LifecycleError::EmptyName);
        assert_eq!(exit_code_for(&err), EXIT_DOMAIN);
    }
}
