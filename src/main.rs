// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use record_keeper::{
    app, db, logging, CategoryFilter, Config, ContactBook, Expense, StoreError,
};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "record-keeper", version, about = "Contact book and expense log")]
struct Cli {
    /// Config file (defaults to <config dir>/record-keeper/config.toml)
    #[arg(long, global = true, env = "RECORD_KEEPER_CONFIG")]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage the contact book
    #[command(subcommand)]
    Contacts(ContactCommand),
    /// Manage the expense log
    #[command(subcommand)]
    Expenses(ExpenseCommand),
    /// Open the terminal UI (default)
    Ui,
}

#[derive(Subcommand, Debug)]
enum ContactCommand {
    /// List contacts with their row numbers
    List,
    /// Append a contact
    Add { name: String, phone: String },
    /// Overwrite the contact at ROW (as shown by `list`)
    Update { row: usize, name: String, phone: String },
    /// Remove the contact at ROW (as shown by `list`)
    Remove { row: usize },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// Record an expense
    Add(AddExpenseArgs),
    /// List expenses, optionally filtered
    List {
        /// Only expenses on this date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "category")]
        date: Option<String>,
        /// Only expenses in this category ("All" for every category)
        #[arg(long)]
        category: Option<String>,
    },
    /// Totals per category
    Summary,
    /// Totals per day
    Timeline,
    /// Write every expense as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Insert expenses from a CSV file with Date,Category,Amount,Description columns
    Import { file: PathBuf },
}

#[derive(Args, Debug)]
struct AddExpenseArgs {
    /// Date as YYYY-MM-DD (today when omitted)
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    category: String,
    #[arg(long)]
    amount: String,
    #[arg(long, default_value = "")]
    description: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<StoreError>() {
            Some(store_err) if store_err.is_user_error() => {
                eprintln!("⚠️  {}: {}", store_err.title(), store_err);
            }
            _ => eprintln!("❌ Error: {:?}", err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Commands::Contacts(cmd)) => {
            logging::init(cli.debug, &config.log_level).ok();
            run_contacts(&config, cmd, cli.json)
        }
        Some(Commands::Expenses(cmd)) => {
            logging::init(cli.debug, &config.log_level).ok();
            run_expenses(&config, cmd, cli.json)
        }
        Some(Commands::Ui) | None => run_ui_mode(&config),
    }
}

// ============================================================================
// Contacts
// ============================================================================

/// CLI rows are 1-based; 0 selects nothing
fn selection(row: usize) -> Option<usize> {
    row.checked_sub(1)
}

fn run_contacts(config: &Config, cmd: ContactCommand, json: bool) -> Result<()> {
    let mut book = ContactBook::open(&config.contacts_file)
        .with_context(|| format!("Failed to open contact book {:?}", config.contacts_file))?;

    match cmd {
        ContactCommand::List => {
            if json {
                println!("{}", serde_json::to_string_pretty(book.list())?);
            } else if book.is_empty() {
                println!("No contacts yet.");
            } else {
                for (i, contact) in book.list().iter().enumerate() {
                    println!("{:>4}. {:<30} {}", i + 1, contact.name, contact.phone);
                }
            }
        }
        ContactCommand::Add { name, phone } => {
            book.add(&name, &phone)?;
            println!("✓ Added {} ({} contacts)", name, book.len());
        }
        ContactCommand::Update { row, name, phone } => {
            book.update(selection(row), &name, &phone)?;
            println!("✓ Updated row {}", row);
        }
        ContactCommand::Remove { row } => {
            let removed = book.remove(selection(row))?;
            println!("✓ Removed {} ({} contacts left)", removed.name, book.len());
        }
    }

    Ok(())
}

// ============================================================================
// Expenses
// ============================================================================

fn run_expenses(config: &Config, cmd: ExpenseCommand, json: bool) -> Result<()> {
    let conn = db::open_database(&config.expenses_db)
        .with_context(|| format!("Failed to open expense database {:?}", config.expenses_db))?;

    match cmd {
        ExpenseCommand::Add(args) => {
            let date = args
                .date
                .unwrap_or_else(|| app::today().format(db::DATE_FORMAT).to_string());
            let expense =
                app::coerce_expense(&date, &args.category, &args.amount, &args.description)?;
            if !config.categories.iter().any(|c| c == &expense.category) {
                tracing::info!(category = %expense.category, "category is not in the configured list");
            }
            let id = db::insert_expense(&conn, &expense)?;
            println!("✓ Recorded expense #{}", id);
        }
        ExpenseCommand::List { date, category } => {
            let rows = match (date, category) {
                (Some(date), _) => db::list_by_date(&conn, &date)?,
                (None, Some(category)) => {
                    db::search_by_category(&conn, &CategoryFilter::parse(&category))?
                }
                (None, None) => db::list_all(&conn)?,
            };
            print_expenses(&rows, json)?;
        }
        ExpenseCommand::Summary => {
            let totals = db::sum_by_category(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else if totals.is_empty() {
                println!("No expenses yet.");
            } else {
                let grand: f64 = totals.values().sum();
                for (category, total) in &totals {
                    let share = if grand == 0.0 { 0.0 } else { total / grand * 100.0 };
                    println!("{:<15} {:>12.2} {:>6.1}%", category, total, share);
                }
                println!("{:<15} {:>12.2}", "Total", grand);
            }
        }
        ExpenseCommand::Timeline => {
            let series = db::daily_totals(&conn)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                for (day, total) in &series {
                    println!("{}  {:>12.2}", day.format(db::DATE_FORMAT), total);
                }
            }
        }
        ExpenseCommand::Export { output } => {
            let written = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    let n = db::export_csv(&conn, file)?;
                    println!("✓ Exported {} expenses to {:?}", n, path);
                    n
                }
                None => db::export_csv(&conn, io::stdout().lock())?,
            };
            tracing::debug!(written, "export finished");
        }
        ExpenseCommand::Import { file } => {
            let reader =
                File::open(&file).with_context(|| format!("Failed to open {:?}", file))?;
            let expenses = db::read_csv(reader)?;
            let inserted = db::insert_expenses(&conn, &expenses)?;
            println!("✓ Imported {} expenses from {:?}", inserted, file);
            println!("✓ Database contains {} expenses", db::count_expenses(&conn)?);
        }
    }

    Ok(())
}

fn print_expenses(rows: &[Expense], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No matching expenses.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<10}  {:<12}  {:>10}  {}",
        "ID", "Date", "Category", "Amount", "Description"
    );
    for e in rows {
        println!(
            "{:>5}  {:<10}  {:<12}  {:>10.2}  {}",
            e.id, e.date, e.category, e.amount, e.description
        );
    }
    Ok(())
}

// ============================================================================
// Terminal UI
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    use record_keeper::{ContactsState, ExpensesState};

    let book = ContactBook::open(&config.contacts_file)
        .with_context(|| format!("Failed to open contact book {:?}", config.contacts_file))?;
    let conn = db::open_database(&config.expenses_db)
        .with_context(|| format!("Failed to open expense database {:?}", config.expenses_db))?;

    let contacts = ContactsState::new(book);
    let expenses = ExpensesState::new(conn, config.categories.clone())?;

    let mut app = ui::App::new(contacts, expenses);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: record-keeper contacts --help");
    std::process::exit(1);
}
