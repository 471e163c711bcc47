use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use client::{
    ClientConfig, ClientError, Completion, HttpMatchupApi, Identity, OptimisticMutator,
    RefreshScope, StaticSession,
};
use storage::MatchupStore;
use storage::dto::MatchupDraft;
use storage::models::{MatchupId, MatchupRecord, SkillLevel, UserId};
use storage::repository::{FilterMode, MatchupQuery};
use storage::services::{CapacityGuard, LifecycleState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "matchups")]
#[command(about = "Browse, join and organise campus matchups", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "MATCHUPS_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[arg(long, env = "MATCHUPS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "MATCHUPS_USER_ID")]
    user_id: i64,

    #[arg(long, env = "MATCHUPS_DISPLAY_NAME", default_value = "Unknown User")]
    display_name: String,

    #[arg(long, env = "MATCHUPS_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    #[arg(long, env = "MATCHUPS_READ_RETRIES", default_value_t = 2)]
    read_retries: u32,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    List {
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,

        #[arg(long, default_value = "")]
        search: String,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        sport: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        max_participants: u32,

        /// RFC 3339, e.g. 2030-05-03T18:00:00Z
        #[arg(long, value_parser = parse_date)]
        date: DateTime<Utc>,

        #[arg(long, default_value_t = SkillLevel::Beginner)]
        skill: SkillLevel,

        #[arg(long, default_value = "")]
        description: String,
    },
    Join {
        id: i64,
    },
    Close {
        id: i64,
    },
    Leave {
        id: i64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Available,
    Mine,
    Closed,
}

impl FilterArg {
    fn mode(self, user: UserId) -> FilterMode {
        match self {
            FilterArg::All => FilterMode::All,
            FilterArg::Available => FilterMode::Available,
            FilterArg::Mine => FilterMode::Mine(user),
            FilterArg::Closed => FilterMode::Closed,
        }
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "matchups={},client={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<ClientError>() {
            Some(client_err) if !client_err.user_message().is_empty() => {
                tracing::debug!("{:#}", e);
                eprintln!("{}", client_err.user_message());
            }
            _ => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let user = UserId(cli.user_id);
    let session = Arc::new(StaticSession::new(
        Identity::new(user, cli.display_name.clone()),
        cli.token.clone(),
    ));

    let config = ClientConfig::new(cli.api_url.clone())
        .with_timeout(Duration::from_secs(cli.timeout_secs))
        .with_read_retries(cli.read_retries);
    let api = Arc::new(
        HttpMatchupApi::new(config, session.clone()).context("Failed to build HTTP client")?,
    );

    let store = Arc::new(MatchupStore::new());
    let mutator = OptimisticMutator::new(api, session, &store);

    match cli.command {
        Commands::List { filter, search } => {
            let mode = filter.mode(user);
            store.set_query(MatchupQuery::new(search, mode));
            mutator.refetch_all(RefreshScope::for_filter(mode)).await?;

            let visible = store.visible();
            if visible.is_empty() {
                println!("No matchups found.");
            }
            for record in &visible {
                print_summary(record, user);
            }
        }
        Commands::Show { id } => {
            let record = load(&mutator, &store, MatchupId(id)).await?;
            print_details(&record, user);
        }
        Commands::Create {
            title,
            sport,
            location,
            max_participants,
            date,
            skill,
            description,
        } => {
            let draft = MatchupDraft {
                title,
                description,
                sport,
                location,
                max_participants,
                skill_level: skill,
                event_date: date,
            };
            let record = mutator.create(draft).await?;
            println!("Matchup created successfully!");
            print_details(&record, user);
        }
        Commands::Join { id } => {
            load(&mutator, &store, MatchupId(id)).await?;
            let completion = mutator.join(MatchupId(id)).await?;
            report(completion, "Successfully joined the matchup!", user);
        }
        Commands::Close { id } => {
            load(&mutator, &store, MatchupId(id)).await?;
            let completion = mutator.close(MatchupId(id)).await?;
            report(completion, "Matchup closed successfully", user);
        }
        Commands::Leave { id } => {
            load(&mutator, &store, MatchupId(id)).await?;
            mutator.leave(MatchupId(id))?;
        }
    }

    Ok(())
}

async fn load(
    mutator: &OptimisticMutator,
    store: &MatchupStore,
    id: MatchupId,
) -> anyhow::Result<MatchupRecord> {
    mutator.refetch(id).await?;
    store
        .get(id)
        .with_context(|| format!("Matchup {} was not loaded", id))
}

fn report(completion: Completion, success: &str, user: UserId) {
    match completion {
        Completion::Applied(record) => {
            println!("{}", success);
            print_details(&record, user);
        }
        Completion::Superseded => println!("{} (a newer update is already shown)", success),
        Completion::Detached => {}
    }
}

fn print_summary(record: &MatchupRecord, user: UserId) {
    let eligibility = CapacityGuard::assess(record, user);
    println!(
        "#{:<5} {:<30} {:<12} {:<20} {} {}/{} [{}]{}",
        record.id.0,
        record.title,
        record.sport,
        record.location,
        record.event_date.format("%Y-%m-%d %H:%M"),
        record.participants.len(),
        record.max_participants,
        LifecycleState::of(record),
        if eligibility.is_member { " *" } else { "" }
    );
}

fn print_details(record: &MatchupRecord, user: UserId) {
    let eligibility = CapacityGuard::assess(record, user);
    println!("{} ({})", record.title, LifecycleState::of(record));
    println!("  Sport:       {}", record.sport);
    println!("  Skill level: {}", record.skill_level);
    println!("  Location:    {}", record.location);
    println!("  Date:        {}", record.event_date.format("%Y-%m-%d %H:%M UTC"));
    println!(
        "  Players:     {}/{} ({} seats left)",
        record.participants.len(),
        record.max_participants,
        eligibility.seats_left
    );
    if !record.description.is_empty() {
        println!("  About:       {}", record.description);
    }
    if let Some(email) = &record.contact_email {
        println!("  Contact:     {}", email);
    }
    for participant in &record.participants {
        println!("    - {}", participant.display_name);
    }
    if eligibility.can_join {
        println!("  You can join this matchup.");
    }
    if eligibility.can_close {
        println!("  You can close this matchup.");
    }
}
