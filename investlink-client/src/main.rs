//! InvestLink command-line client
//!
//! Drives the swipe core against a running InvestLink server: fetch
//! recommendations, swipe, review and edit history, look up profiles and
//! search. `session` runs an interactive swipe session on stdin.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use investlink_client::fetcher::{BatchFetcher, FetchOutcome};
use investlink_client::search::{SearchClient, SearchOutcome};
use investlink_client::session::{DecisionOutcome, LoadOutcome, SwipeSession};
use investlink_client::InvestLink;
use investlink_common::config::{ClientConfig, ConfigOverrides};
use investlink_common::events::SessionPhase;
use investlink_common::models::Profile;
use investlink_common::{Candidate, EntityId, InteractionLists, InteractionStatus, Role, Viewer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

/// Command-line arguments for investlink
#[derive(Parser, Debug)]
#[command(name = "investlink")]
#[command(about = "Swipe client for the InvestLink matchmaking API")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to <config dir>/investlink/config.toml)
    #[arg(short, long, env = "INVESTLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Server origin, e.g. http://localhost:8000
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one batch of recommendations
    Recommend {
        role: Role,
        viewer: EntityId,
        /// Batch size hint
        #[arg(long)]
        num: Option<u32>,
    },
    /// Record a one-time like/dislike
    Swipe {
        role: Role,
        viewer: EntityId,
        target: EntityId,
        #[arg(long, conflicts_with = "dislike", required_unless_present = "dislike")]
        like: bool,
        #[arg(long)]
        dislike: bool,
    },
    /// Show liked and disliked lists
    History { role: Role, viewer: EntityId },
    /// Change an interaction (like, dislike, remove)
    SetStatus {
        role: Role,
        viewer: EntityId,
        target: EntityId,
        status: InteractionStatus,
    },
    /// Show an investor or company profile
    Profile { role: Role, id: EntityId },
    /// Search investors or companies
    Search {
        kind: Role,
        query: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Check server health and account counts
    Health,
    /// Interactive swipe session (l = like, d = dislike, m = load more, r = retry, q = quit)
    Session { role: Role, viewer: EntityId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before the config is read
    let (subscriber, filter_handle) = bootstrap_tracing(args.log_level.as_deref(), std::io::stderr);
    subscriber.init();

    let overrides = ConfigOverrides {
        base_url: args.base_url.clone(),
        timeout_ms: args.timeout_ms,
        batch_size: None,
        log_level: args.log_level.clone(),
    };
    let config = ClientConfig::resolve(args.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    if let Some(handle) = filter_handle {
        handle
            .reload(default_filter(&config.logging.level))
            .context("Failed to apply configured log level")?;
    }

    info!("Using InvestLink server at {}", config.base_url);

    let link = InvestLink::connect(config).context("Failed to initialize API client")?;
    run(link, args.command).await
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Subscriber installed before the config is read
///
/// `RUST_LOG` wins and is never replaced. Otherwise the CLI level (or info)
/// applies until the returned handle switches to the configured level.
fn bootstrap_tracing<W>(
    cli_level: Option<&str>,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, Option<FilterHandle>)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| default_filter(cli_level.unwrap_or("info"))),
    );
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));
    (subscriber, (!from_env).then_some(handle))
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!(
        "investlink={level},investlink_client={level},investlink_common={level}",
        level = level
    ))
}

async fn run(link: InvestLink, command: Command) -> Result<()> {
    match command {
        Command::Recommend { role, viewer, num } => {
            let viewer = Viewer::new(role, viewer);
            let num = num.unwrap_or(link.config().batch_size);
            match BatchFetcher::new(link.api(), num).fetch_batch(viewer).await? {
                FetchOutcome::Batch(batch) => {
                    for candidate in batch.iter() {
                        print_candidate(candidate, viewer.target_role());
                    }
                }
                FetchOutcome::Exhausted => {
                    println!("All caught up: no new recommendations for {}", viewer)
                }
            }
        }
        Command::Swipe {
            role,
            viewer,
            target,
            like,
            ..
        } => {
            let viewer = Viewer::new(role, viewer);
            link.api().swipe(viewer, target, like).await?;
            println!(
                "Recorded {} on {} {}",
                if like { "like" } else { "dislike" },
                viewer.target_role(),
                target
            );
        }
        Command::History { role, viewer } => {
            let lists = link.ledger(Viewer::new(role, viewer)).refresh().await?;
            print_history(&lists, role.counterpart());
        }
        Command::SetStatus {
            role,
            viewer,
            target,
            status,
        } => {
            let lists = link
                .ledger(Viewer::new(role, viewer))
                .set_status(target, status)
                .await?;
            println!("Set {} {} to {}", role.counterpart(), target, status);
            print_history(&lists, role.counterpart());
        }
        Command::Profile { role, id } => {
            let profile = link.directory().profile(role, id).await?;
            print_profile(&profile)?;
        }
        Command::Search { kind, query, limit } => {
            let limit = limit.unwrap_or(link.config().search_limit);
            let search = SearchClient::new(link.api(), limit, Duration::ZERO);
            match search.search(kind, &query).await? {
                SearchOutcome::Applied(results) if results.is_empty() => println!("No results"),
                SearchOutcome::Applied(results) => {
                    for candidate in &results {
                        print_candidate(candidate, kind);
                    }
                }
                SearchOutcome::Superseded => {}
            }
        }
        Command::Health => {
            let directory = link.directory();
            let health = directory.health().await?;
            println!(
                "Server: {} (database: {})",
                health.status,
                health.database.as_deref().unwrap_or("unknown")
            );
            if let Some(error) = &health.error {
                println!("Error: {}", error);
            }
            let counts = directory.counts().await?;
            println!("Investors: {}  Companies: {}", counts.investors, counts.companies);
            if !health.is_healthy() {
                bail!("server reports {}", health.status);
            }
        }
        Command::Session { role, viewer } => {
            let session = link.session(Viewer::new(role, viewer));
            run_session(&session).await?;
        }
    }
    Ok(())
}

async fn run_session(session: &SwipeSession) -> Result<()> {
    let role = session.viewer().target_role();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    report_load(session.load().await);
    show_current(session, role).await;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "l" | "like" => report_decision(session.decide(true).await),
            "d" | "dislike" => report_decision(session.decide(false).await),
            "m" | "more" => report_load(session.load_more().await),
            "r" | "retry" => report_load(session.retry().await),
            "q" | "quit" => break,
            "" => continue,
            other => {
                println!("Unknown command '{}' (l, d, m, r, q)", other);
                continue;
            }
        }
        show_current(session, role).await;
    }

    session.close().await;
    Ok(())
}

fn report_load(outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Ready { batch_len } => println!("Loaded {} candidates", batch_len),
        LoadOutcome::Exhausted => {}
        LoadOutcome::Failed(error) => println!("Could not load recommendations: {} (r to retry)", error),
        LoadOutcome::Ignored(reason) => println!("Ignored: {:?}", reason),
        LoadOutcome::Stale => {}
    }
}

fn report_decision(outcome: DecisionOutcome) {
    match outcome {
        DecisionOutcome::Acknowledged { target, like, .. } => {
            println!("{} {}", if like { "Liked" } else { "Passed on" }, target)
        }
        // Dropped swipes are logged by the session; the viewer just sees the same card
        DecisionOutcome::Dropped { .. } => {}
        DecisionOutcome::Ignored(reason) => println!("Ignored: {:?}", reason),
        DecisionOutcome::Stale { .. } => {}
    }
}

async fn show_current(session: &SwipeSession, role: Role) {
    let snapshot = session.snapshot().await;
    match snapshot.phase {
        SessionPhase::Ready | SessionPhase::Deciding => {
            if let Some(candidate) = &snapshot.current {
                println!("[{}/{}]", snapshot.cursor + 1, snapshot.batch_len);
                print_candidate(candidate, role);
            }
        }
        SessionPhase::Exhausted => println!("All caught up (m to load more)"),
        SessionPhase::Error => println!("Error loading recommendations (r to retry)"),
        SessionPhase::Loading | SessionPhase::Closed => {}
    }
}

fn print_candidate(candidate: &Candidate, role: Role) {
    let view = candidate.view(role);
    let name = view.name().unwrap_or_else(|| format!("{} {}", role, candidate.id));
    match candidate.match_probability {
        Some(p) => println!("#{} {} ({:.0}% match)", candidate.id, name, p),
        None => println!("#{} {}", candidate.id, name),
    }
    let location = view.location();
    if !location.is_empty() {
        println!("    Location:   {}", location.join(", "));
    }
    let stage = view.stage();
    if !stage.is_empty() {
        println!("    Stage:      {}", stage.join(", "));
    }
    let industries = view.industries();
    if !industries.is_empty() {
        println!("    Industries: {}", industries.join(", "));
    }
    if let Some(range) = view.financial_range() {
        match (range.min, range.max) {
            (Some(min), Some(max)) => println!("    Range:      {} - {}", min, max),
            (Some(amount), None) | (None, Some(amount)) => println!("    Amount:     {}", amount),
            (None, None) => {}
        }
    }
    if let Some(description) = view.description() {
        println!("    {}", description);
    }
}

fn print_history(lists: &InteractionLists, role: Role) {
    println!("Liked ({}):", lists.liked.len());
    for candidate in &lists.liked {
        print_candidate(candidate, role);
    }
    println!("Disliked ({}):", lists.disliked.len());
    for candidate in &lists.disliked {
        print_candidate(candidate, role);
    }
}

fn print_profile(profile: &Profile) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(profile)?);
    Ok(())
}
