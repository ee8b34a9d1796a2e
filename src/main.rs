mod db;
mod export;
mod parser;
mod summary;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

#[derive(Parser)]
#[command(name = "guestlist", about = "Guest-list planner with free-text bulk import")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed default tiers and categories
    Init,
    /// Manage guest categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage invitation tiers
    Tier {
        #[command(subcommand)]
        action: TierAction,
    },
    /// Manage households
    Household {
        #[command(subcommand)]
        action: HouseholdAction,
    },
    /// Bulk-import households from pasted free text
    Import {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
        /// Tier assigned to every imported household (default: first tier)
        #[arg(short, long)]
        tier: Option<String>,
        /// New-category candidate to leave uncreated (repeatable)
        #[arg(long = "skip", value_name = "CATEGORY")]
        skip: Vec<String>,
        /// Show the parsed preview without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Create new categories without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Category × tier guest-count grid
    Summary {
        /// Restrict totals to one event's selections
        #[arg(short, long)]
        event: Option<String>,
    },
    /// Manage events (subsets of category × tier)
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Export households as CSV or everything as a JSON backup
    Export {
        #[command(subcommand)]
        what: ExportWhat,
    },
    /// Replace all data from a JSON backup
    Restore { file: PathBuf },
    /// Entity counts
    Stats,
}

#[derive(Subcommand)]
enum CategoryAction {
    Add {
        name: String,
        /// bride, groom, both, or unspecified
        #[arg(long, default_value = "unspecified")]
        side: String,
    },
    List,
    Remove { name: String },
}

#[derive(Subcommand)]
enum TierAction {
    Add { name: String },
    List,
    /// Move a tier to a new slot (0-based)
    Move { name: String, position: usize },
}

#[derive(Subcommand)]
enum HouseholdAction {
    Add {
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        tier: String,
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// RSVP likelihood in percent (0-100)
        #[arg(long)]
        rsvp: Option<u32>,
    },
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Remove { id: i64 },
}

#[derive(Subcommand)]
enum EventAction {
    Add { name: String },
    List,
    /// Add a category × tier cell to an event's selections
    Include {
        event: String,
        category: String,
        tier: String,
    },
}

#[derive(Subcommand)]
enum ExportWhat {
    Csv { file: Option<PathBuf> },
    Backup { file: Option<PathBuf> },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let conn = db::connect()?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            if db::seed_defaults(&conn)? {
                println!("Database ready; seeded default tiers and categories.");
            } else {
                println!("Database ready; existing data left untouched.");
            }
            Ok(())
        }
        Commands::Category { action } => run_category(&conn, action),
        Commands::Tier { action } => run_tier(&conn, action),
        Commands::Household { action } => run_household(&conn, action),
        Commands::Import {
            file,
            tier,
            skip,
            dry_run,
            yes,
        } => run_import(&conn, file.as_deref(), tier.as_deref(), &skip, dry_run, yes),
        Commands::Summary { event } => run_summary(&conn, event.as_deref()),
        Commands::Event { action } => run_event(&conn, action),
        Commands::Export { what } => run_export(&conn, what),
        Commands::Restore { file } => run_restore(&conn, &file),
        Commands::Stats => {
            let s = db::get_stats(&conn)?;
            println!("Categories: {}", s.categories);
            println!("Tiers:      {}", s.tiers);
            println!("Households: {}", s.households);
            println!("Guests:     {}", s.guests);
            println!("Events:     {}", s.events);
            Ok(())
        }
    }
}

fn run_category(conn: &Connection, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::Add { name, side } => {
            if !["bride", "groom", "both", "unspecified"].contains(&side.as_str()) {
                bail!("side must be one of: bride, groom, both, unspecified");
            }
            db::insert_category(conn, &name, &side)
                .with_context(|| format!("could not add category \"{}\"", name))?;
            println!("Added category \"{}\".", name.trim());
            Ok(())
        }
        CategoryAction::List => {
            for c in db::fetch_categories(conn)? {
                println!("{:<30} {}", c.name, c.side);
            }
            Ok(())
        }
        CategoryAction::Remove { name } => {
            let cat = db::find_category(conn, &name)?
                .with_context(|| format!("category not found: {}", name))?;
            db::delete_category(conn, cat.id)
                .context("category still has households; remove them first")?;
            println!("Removed category \"{}\".", cat.name);
            Ok(())
        }
    }
}

fn run_tier(conn: &Connection, action: TierAction) -> Result<()> {
    match action {
        TierAction::Add { name } => {
            db::insert_tier(conn, &name)
                .with_context(|| format!("could not add tier \"{}\"", name))?;
            println!("Added tier \"{}\".", name.trim());
            Ok(())
        }
        TierAction::List => {
            for t in db::fetch_tiers(conn)? {
                println!("{:>2}  {}", t.position, t.name);
            }
            Ok(())
        }
        TierAction::Move { name, position } => {
            let tier =
                db::find_tier(conn, &name)?.with_context(|| format!("tier not found: {}", name))?;
            db::move_tier(conn, tier.id, position)?;
            println!("Moved tier \"{}\" to slot {}.", tier.name, position);
            Ok(())
        }
    }
}

fn run_household(conn: &Connection, action: HouseholdAction) -> Result<()> {
    match action {
        HouseholdAction::Add {
            name,
            category,
            tier,
            count,
            rsvp,
        } => {
            if count < 1 {
                bail!("guest count must be at least 1");
            }
            let cat = db::find_category(conn, &category)?
                .with_context(|| format!("category not found: {}", category))?;
            let t =
                db::find_tier(conn, &tier)?.with_context(|| format!("tier not found: {}", tier))?;
            db::insert_household(
                conn,
                &db::NewHousehold {
                    name: name.trim().to_string(),
                    guest_count: count,
                    category_id: cat.id,
                    tier_id: t.id,
                    rsvp_probability: rsvp,
                },
            )?;
            println!("Added \"{}\" ({} guests).", name.trim(), count);
            Ok(())
        }
        HouseholdAction::List { category } => {
            let rows = db::fetch_household_details(conn, category.as_deref())?;
            if rows.is_empty() {
                println!("No households.");
                return Ok(());
            }
            println!(
                "{:>4} | {:<28} | {:>6} | {:<20} | {:<10} | {:>4}",
                "#", "Household", "Guests", "Category", "Tier", "RSVP"
            );
            println!("{}", "-".repeat(86));
            for r in &rows {
                let rsvp = r
                    .rsvp_probability
                    .map(|p| format!("{}%", p))
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{:>4} | {:<28} | {:>6} | {:<20} | {:<10} | {:>4}",
                    r.id,
                    truncate(&r.name, 28),
                    r.guest_count,
                    truncate(&r.category, 20),
                    truncate(&r.tier, 10),
                    rsvp
                );
            }
            let guests: u32 = rows.iter().map(|r| r.guest_count).sum();
            println!("\n{} households, {} guests", rows.len(), guests);
            Ok(())
        }
        HouseholdAction::Remove { id } => {
            if db::delete_household(conn, id)? == 0 {
                bail!("no household with id {}", id);
            }
            println!("Removed household {}.", id);
            Ok(())
        }
    }
}

fn run_import(
    conn: &Connection,
    file: Option<&Path>,
    tier: Option<&str>,
    skip: &[String],
    dry_run: bool,
    yes: bool,
) -> Result<()> {
    // Tier precondition comes before any parsing: imported households need
    // a tier to land in.
    let tiers = db::fetch_tiers(conn)?;
    if tiers.is_empty() {
        bail!("no tiers defined; create one first with `guestlist tier add <name>`");
    }
    let target_tier = match tier {
        Some(name) => {
            db::find_tier(conn, name)?.with_context(|| format!("tier not found: {}", name))?
        }
        None => tiers[0].clone(),
    };

    let text = read_input(file)?;
    let categories = db::fetch_categories(conn)?;
    let known: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
    let preview = parser::parse_import(&text, &known);

    if preview.households.is_empty() {
        bail!("no valid households found in the input");
    }

    println!(
        "{:<28} | {:>6} | {:<20}",
        "Household", "Guests", "Category"
    );
    println!("{}", "-".repeat(60));
    for h in &preview.households {
        println!(
            "{:<28} | {:>6} | {:<20}",
            truncate(&h.name, 28),
            h.guest_count,
            truncate(&h.category_name, 20)
        );
    }
    let guests: u32 = preview.households.iter().map(|h| h.guest_count).sum();
    println!(
        "\n{} households, {} guests, tier \"{}\"",
        preview.households.len(),
        guests,
        target_tier.name
    );

    let skipped: Vec<String> = skip.iter().map(|s| s.trim().to_lowercase()).collect();
    let to_create: Vec<String> = preview
        .new_categories
        .iter()
        .filter(|c| !skipped.contains(&c.to_lowercase()))
        .cloned()
        .collect();

    // A skipped category leaves its households with nowhere to go; the
    // whole batch is blocked rather than silently dropping rows.
    let blocked = preview
        .households
        .iter()
        .filter(|h| skipped.contains(&h.category_name.to_lowercase()))
        .count();
    if blocked > 0 {
        bail!(
            "{} households belong to skipped categories; remove them from the text or drop --skip",
            blocked
        );
    }

    if !to_create.is_empty() {
        println!("\nNew categories: {}", to_create.join(", "));
    }
    if dry_run {
        println!("Dry run: nothing written.");
        return Ok(());
    }
    if !to_create.is_empty() && !yes {
        bail!("re-run with --yes to create the new categories, or --skip <name> to leave some out");
    }

    let created = db::insert_categories(conn, &to_create)?;
    tracing::info!(created = created.len(), "categories created");

    let mut all_categories = categories;
    all_categories.extend(created);

    // Resolve every row before inserting anything; inserts then land in a
    // single transaction, so the batch is all-or-nothing.
    let mut rows = Vec::with_capacity(preview.households.len());
    for h in &preview.households {
        let cat = all_categories
            .iter()
            .find(|c| c.name.to_lowercase() == h.category_name.to_lowercase())
            .with_context(|| format!("category not found: {}", h.category_name))?;
        rows.push(db::NewHousehold {
            name: h.name.clone(),
            guest_count: h.guest_count,
            category_id: cat.id,
            tier_id: target_tier.id,
            rsvp_probability: None,
        });
    }
    let inserted = db::insert_households(conn, &rows)?;
    println!(
        "Imported {} households into tier \"{}\". Review with `guestlist household list`.",
        inserted, target_tier.name
    );
    Ok(())
}

fn run_summary(conn: &Connection, event: Option<&str>) -> Result<()> {
    let categories = db::fetch_categories(conn)?;
    let tiers = db::fetch_tiers(conn)?;
    let households = db::fetch_households(conn)?;

    let selections = match event {
        Some(name) => {
            let ev = db::find_event(conn, name)?
                .with_context(|| format!("event not found: {}", name))?;
            Some(db::fetch_selections(conn, ev.id)?)
        }
        None => None,
    };
    let grid = summary::build_summary(&categories, &tiers, &households, selections.as_deref());

    print!("{:<24}", "Category");
    for t in &grid.tier_names {
        print!(" | {:>8}", truncate(t, 8));
    }
    println!(" | {:>8}", "Total");
    println!("{}", "-".repeat(24 + 11 * (grid.tier_names.len() + 1)));

    for row in &grid.rows {
        print!("{:<24}", truncate(&row.category_name, 24));
        for cell in &row.cells {
            if cell.included {
                print!(" | {:>8}", cell.guest_count);
            } else {
                print!(" | {:>8}", format!("({})", cell.guest_count));
            }
        }
        println!(" | {:>8}", row.total);
    }

    print!("{:<24}", "Total");
    for t in &grid.tier_totals {
        print!(" | {:>8}", t);
    }
    println!(" | {:>8}", grid.grand_total);
    if event.is_some() {
        println!("\nCells in parentheses are outside the event's selections.");
    }
    Ok(())
}

fn run_event(conn: &Connection, action: EventAction) -> Result<()> {
    match action {
        EventAction::Add { name } => {
            db::insert_event(conn, &name)
                .with_context(|| format!("could not add event \"{}\"", name))?;
            println!("Added event \"{}\".", name.trim());
            Ok(())
        }
        EventAction::List => {
            let events = db::fetch_events(conn)?;
            if events.is_empty() {
                println!("No events.");
                return Ok(());
            }
            let households = db::fetch_households(conn)?;
            println!(
                "{:<24} | {:>8} | {:>8}",
                "Event", "Invited", "Expected"
            );
            println!("{}", "-".repeat(46));
            for ev in &events {
                let selections = db::fetch_selections(conn, ev.id)?;
                println!(
                    "{:<24} | {:>8} | {:>8}",
                    truncate(&ev.name, 24),
                    summary::invited_count(&households, &selections),
                    summary::expected_attendance(&households, &selections)
                );
            }
            Ok(())
        }
        EventAction::Include {
            event,
            category,
            tier,
        } => {
            let ev = db::find_event(conn, &event)?
                .with_context(|| format!("event not found: {}", event))?;
            let cat = db::find_category(conn, &category)?
                .with_context(|| format!("category not found: {}", category))?;
            let t =
                db::find_tier(conn, &tier)?.with_context(|| format!("tier not found: {}", tier))?;
            db::add_selection(conn, ev.id, cat.id, t.id)?;
            println!(
                "Event \"{}\" now includes {} × {}.",
                ev.name, cat.name, t.name
            );
            Ok(())
        }
    }
}

fn run_export(conn: &Connection, what: ExportWhat) -> Result<()> {
    match what {
        ExportWhat::Csv { file } => {
            let rows = db::fetch_household_details(conn, None)?;
            let csv = export::households_to_csv(&rows)?;
            write_output(file.as_deref(), &csv)?;
            tracing::info!(rows = rows.len(), "exported CSV");
            Ok(())
        }
        ExportWhat::Backup { file } => {
            let backup = export::make_backup(db::export_snapshot(conn)?);
            let json = export::backup_to_json(&backup)?;
            write_output(file.as_deref(), &json)?;
            Ok(())
        }
    }
}

fn run_restore(conn: &Connection, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("could not read {}", file.display()))?;
    let backup = export::parse_backup(&json)?;
    db::import_snapshot(conn, &backup.data)?;
    println!(
        "Restored {} categories, {} tiers, {} households, {} events (backup from {}).",
        backup.data.categories.len(),
        backup.data.tiers.len(),
        backup.data.households.len(),
        backup.data.events.len(),
        backup.exported_at
    );
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(file: Option<&Path>, content: &str) -> Result<()> {
    match file {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Wrote {}.", path.display());
            Ok(())
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
