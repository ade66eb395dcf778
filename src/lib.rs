// Record Keeper - Core Library
// Contact book (flat text file) and expense log (SQLite), shared by the
// CLI, the terminal UI and the API server

pub mod app;
pub mod config;
pub mod contacts;
pub mod db;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use app::{
    coerce_expense, parse_amount, parse_date, ContactForm, ContactsState, ExpenseForm,
    ExpenseView, ExpensesState, Notice, Outcome,
};
pub use config::Config;
pub use contacts::{load_contacts, save_contacts, Contact, ContactBook};
pub use db::{
    add_expense, count_expenses, daily_totals, export_csv, insert_expense, insert_expenses,
    list_all, list_by_category, list_by_date, open_database, read_csv, search_by_category,
    setup_database, sum_by_category, CategoryFilter, Expense, NewExpense, DEFAULT_CATEGORIES,
};
pub use error::{Result, StoreError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
