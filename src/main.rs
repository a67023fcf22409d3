use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::{Commands, KindArg};
use config::Config;

use loopcycle::domain::{Loop, LoopStatus, PALETTE, Tier};
use loopcycle::navigator::{Advance, Navigator};
use loopcycle::progress::{cascade_progress, display_status, period_momentum};
use loopcycle::rollover::{PeriodSummary, period_summary};
use loopcycle::storage::{JsonlStorage, Persistence, build_seed};
use loopcycle::store::LoopStore;
use loopcycle::sync::{HttpSyncClient, SyncManager, SyncOutcome};

fn setup_logging(default_level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loopcycle")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("loopcycle.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Loaded collection plus where it lives
struct Session {
    storage: Arc<JsonlStorage>,
    store: LoopStore,
    navigator: Navigator,
}

impl Session {
    fn open(config: &Config, today: NaiveDate) -> Result<Self> {
        let storage = JsonlStorage::new(&config.storage.data_dir)
            .with_context(|| format!("Failed to open storage at {}", config.storage.data_dir.display()))?;
        let loops = match storage.load().context("Failed to load loops")? {
            Some(loops) => loops,
            None => {
                info!("Storage empty, starting from seed");
                build_seed(today)
            }
        };
        Ok(Self {
            storage: Arc::new(storage),
            store: LoopStore::new(loops),
            navigator: Navigator::new(today),
        })
    }

    /// Save the current collection and flag it for the next sync
    fn persist(&self) -> Result<()> {
        self.storage.save(self.store.loops()).context("Failed to save loops")?;
        self.storage.mark_pending(true).context("Failed to update sync state")?;
        Ok(())
    }

    fn sync_manager(&self, config: &Config) -> Result<SyncManager> {
        let client = HttpSyncClient::new(config.sync.http_config()).context("Failed to create sync client")?;
        Ok(SyncManager::new(Arc::new(client), self.storage.clone()))
    }
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let today = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let mut session = Session::open(config, today)?;

    match &cli.command {
        None => handle_list_command(&session, None, false),
        Some(Commands::List { tier, all }) => handle_list_command(&session, *tier, *all),
        Some(Commands::Add {
            tier,
            title,
            kind,
            recurring,
            link,
            steps,
        }) => handle_add_command(&mut session, *tier, title, *kind, *recurring, link.as_deref(), steps),
        Some(Commands::Toggle { loop_id, subtask_id }) => handle_toggle_command(&mut session, loop_id, subtask_id),
        Some(Commands::Step { loop_id, text }) => handle_step_command(&mut session, loop_id, text),
        Some(Commands::Link { loop_id, parent_id }) => handle_link_command(&mut session, loop_id, parent_id.as_deref()),
        Some(Commands::Summary { tier }) => handle_summary_command(&session, *tier),
        Some(Commands::Advance { tier, yes }) => handle_advance_command(&mut session, *tier, *yes),
        Some(Commands::Back { tier }) => handle_back_command(&mut session, *tier),
        Some(Commands::Sync) => handle_sync_command(&mut session, config),
        Some(Commands::Migrate) => handle_migrate_command(&mut session, config),
    }
}

fn tier_heading(tier: Tier) -> ColoredString {
    match tier {
        Tier::Monthly => "MONTHLY".magenta().bold(),
        Tier::Weekly => "WEEKLY".blue().bold(),
        Tier::Daily => "DAILY".cyan().bold(),
    }
}

fn progress_bar(pct: u8) -> String {
    let filled = (pct as usize + 5) / 10;
    format!("{}{}", "#".repeat(filled), ".".repeat(10 - filled))
}

fn print_loop(l: &Loop, all: &[Loop]) {
    let pct = cascade_progress(l, all);
    let status = match display_status(l, all) {
        LoopStatus::Closed => "closed".green(),
        LoopStatus::Expired => "expired".red(),
        LoopStatus::Active => "active".normal(),
    };
    let mut tags = vec![format!("{:?}", l.kind).to_lowercase()];
    if l.is_recurring() {
        tags.push("recurring".to_string());
    }
    if let Some(from) = &l.rolled_from {
        tags.push(format!("from {}", from));
    }

    println!(
        "  {} {} [{}] {:>3}% {} ({})",
        l.id.dimmed(),
        l.title.bold(),
        progress_bar(pct),
        pct,
        status,
        tags.join(", ")
    );
    if let Some(parent_id) = &l.linked_to {
        let parent = all
            .iter()
            .find(|p| &p.id == parent_id)
            .map(|p| p.title.as_str())
            .unwrap_or("(missing)");
        println!("      {} {}", "->".dimmed(), parent.italic());
    }
    for s in &l.subtasks {
        let mark = if s.done { "[x]".green() } else { "[ ]".normal() };
        println!("      {} {} {}", mark, s.text, s.id.dimmed());
    }
}

fn print_tier(store: &LoopStore, tier: Tier, period: &str, include_expired: bool) {
    let all = store.loops();
    let loops: Vec<&Loop> = store
        .loops_in(tier, period)
        .into_iter()
        .filter(|l| include_expired || !l.is_expired())
        .collect();
    println!(
        "{} {}  momentum {}%",
        tier_heading(tier),
        period,
        period_momentum(all, tier, period)
    );
    if loops.is_empty() {
        println!("  {}", "(nothing here)".dimmed());
    }
    for l in loops {
        print_loop(l, all);
    }
    println!();
}

fn print_summary(tier: Tier, period: &str, summary: &PeriodSummary) {
    println!(
        "{} {} summary: {}% closed",
        tier_heading(tier),
        period,
        summary.closed_percent()
    );
    for l in &summary.closed {
        println!("  {} {}", "closed ".green(), l.title);
    }
    for l in &summary.expired {
        println!("  {} {}", "expires".red(), l.title);
    }
    for l in &summary.rolling {
        println!("  {} {}", "rolls  ".yellow(), l.title);
    }
}

fn handle_list_command(session: &Session, tier: Option<Tier>, all: bool) -> Result<()> {
    info!("Listing loops - tier: {:?}, all: {}", tier, all);
    let pointer = session.navigator.pointer();
    let tiers: Vec<Tier> = match tier {
        Some(t) => vec![t],
        None => vec![Tier::Monthly, Tier::Weekly, Tier::Daily],
    };
    for t in tiers {
        print_tier(&session.store, t, pointer.get(t), all);
    }
    Ok(())
}

fn handle_add_command(
    session: &mut Session,
    tier: Tier,
    title: &str,
    kind: KindArg,
    recurring: bool,
    link: Option<&str>,
    steps: &[String],
) -> Result<()> {
    info!("Adding {} loop: {}", tier, title);
    let period = session.navigator.pointer().get(tier).to_string();
    let color = PALETTE[session.store.len() % PALETTE.len()];

    let mut l = Loop::new(tier, kind.into(), title.trim(), period)
        .with_color(color)
        .with_steps(steps.iter().map(|s| s.trim()).filter(|s| !s.is_empty()));
    if recurring {
        l = l.recurring();
    }
    if let Some(parent) = link {
        l = l.link_to(parent);
    }

    let id = l.id.clone();
    session.store.add_loop(l).context("Failed to add loop")?;
    session.persist()?;
    println!("{} {} {}", "Added:".green(), id, title);
    Ok(())
}

fn handle_toggle_command(session: &mut Session, loop_id: &str, subtask_id: &str) -> Result<()> {
    info!("Toggling subtask {} on {}", subtask_id, loop_id);
    session.store.toggle_subtask(loop_id, subtask_id)?;
    session.persist()?;
    if let Some(l) = session.store.get(loop_id) {
        print_loop(l, session.store.loops());
    }
    Ok(())
}

fn handle_step_command(session: &mut Session, loop_id: &str, text: &str) -> Result<()> {
    info!("Appending subtask to {}", loop_id);
    session.store.append_subtask(loop_id, text)?;
    session.persist()?;
    if let Some(l) = session.store.get(loop_id) {
        print_loop(l, session.store.loops());
    }
    Ok(())
}

fn handle_link_command(session: &mut Session, loop_id: &str, parent_id: Option<&str>) -> Result<()> {
    info!("Linking {} to {:?}", loop_id, parent_id);
    if let Err(e) = session.store.set_link(loop_id, parent_id) {
        if let Ok(candidates) = session.store.link_candidates(loop_id) {
            if !candidates.is_empty() {
                println!("{}", "Possible parents:".yellow());
                for c in candidates {
                    println!("  {} {} ({})", c.id.dimmed(), c.title, c.period);
                }
            }
        }
        return Err(e.into());
    }
    session.persist()?;
    match parent_id {
        Some(parent) => println!("{} {} -> {}", "Linked:".green(), loop_id, parent),
        None => println!("{} {}", "Unlinked:".green(), loop_id),
    }
    Ok(())
}

fn handle_summary_command(session: &Session, tier: Tier) -> Result<()> {
    let period = session.navigator.pointer().get(tier);
    info!("Summarizing {} {}", tier, period);
    let summary = period_summary(session.store.loops(), period, tier);
    print_summary(tier, period, &summary);
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn handle_advance_command(session: &mut Session, tier: Tier, yes: bool) -> Result<()> {
    info!("Advancing {} from {}", tier, session.navigator.pointer().get(tier));
    match session.navigator.advance(tier, &mut session.store)? {
        Advance::Moved(_) => {}
        Advance::Pending(pending) => {
            print_summary(tier, &pending.source, &pending.summary);
            let prompt = format!("Roll {} over into {}?", pending.source, pending.target);
            if !yes && !confirm(&prompt)? {
                println!("{}", "Rollover cancelled".yellow());
                return Ok(());
            }
            session.navigator.confirm(pending, &mut session.store)?;
        }
    }
    session.persist()?;
    let period = session.navigator.pointer().get(tier).to_string();
    println!("{} {}", "Now in:".green(), period);
    print_tier(&session.store, tier, &period, false);
    Ok(())
}

fn handle_back_command(session: &mut Session, tier: Tier) -> Result<()> {
    let pointer = session.navigator.retreat(tier)?;
    let period = pointer.get(tier).to_string();
    info!("Showing previous {} period {}", tier, period);
    print_tier(&session.store, tier, &period, true);
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to start async runtime")
}

fn handle_sync_command(session: &mut Session, config: &Config) -> Result<()> {
    info!("Syncing with {}", config.sync.base_url);
    let manager = session.sync_manager(config)?;
    let outcome = runtime()?.block_on(manager.sync(session.store.loops()));

    match outcome {
        SyncOutcome::Synced { loops, conflicts } => {
            let count = loops.len();
            session.store.replace_all(loops);
            println!("{} {} loops", "Synced:".green(), count);
            for c in conflicts {
                println!("  {} {} ({})", "conflict".yellow(), c.client_id, c.reason);
            }
        }
        SyncOutcome::Offline => {
            session.storage.save(session.store.loops()).context("Failed to save loops")?;
            println!("{}", "Offline: changes kept locally and marked pending".yellow());
        }
        SyncOutcome::AuthError => {
            return Err(eyre!("Sync server rejected the token in ${}", config.sync.token_env));
        }
        SyncOutcome::SignedOut => {
            println!(
                "{} set ${} to a token to enable sync",
                "Signed out:".yellow(),
                config.sync.token_env
            );
        }
    }
    Ok(())
}

fn handle_migrate_command(session: &mut Session, config: &Config) -> Result<()> {
    info!("Migrating local loops to {}", config.sync.base_url);
    let manager = session.sync_manager(config)?;
    let local = session.storage.load().context("Failed to load loops")?.unwrap_or_default();
    let migration = runtime()?
        .block_on(manager.migrate_local_to_server(&local))
        .context("Migration failed")?;

    session.store.replace_all(migration.loops);
    if migration.migrated > 0 {
        println!("{} {} local loops", "Migrated:".green(), migration.migrated);
    } else {
        println!("{} {} loops from server", "Using:".green(), session.store.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    setup_logging(config.log_level.as_deref().unwrap_or("info")).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
