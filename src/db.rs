// 💸 Expense Store - single SQLite table, queried directly per view action
//
// Rows are immutable once inserted: there is no update or delete.

use crate::error::{Result, StoreError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Storage form of expense dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Categories offered by the entry form, in display order
pub const DEFAULT_CATEGORIES: [&str; 7] = ["Food", "Bills", "Travel", "Home", "Office", "Car", "Bike"];

// ============================================================================
// EXPENSE
// ============================================================================

/// One stored expense row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "ID")]
    pub id: i64,

    #[serde(rename = "Date")]
    pub date: String,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "Description")]
    pub description: String,
}

impl Expense {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Expense {
            id: row.get(0)?,
            date: row.get(1)?,
            category: row.get(2)?,
            amount: row.get(3)?,
            description: row.get(4)?,
        })
    }
}

/// An expense that has passed the input boundary but has no id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub description: String,
}

/// Category selection for the category search, where "All" means no filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(String),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Self {
        if value == "All" {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "All"),
            CategoryFilter::Only(category) => write!(f, "{}", category),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    tracing::debug!(path = ?path, "expense database ready");
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY,
            date TEXT,
            category TEXT,
            amount REAL,
            description TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// WRITES
// ============================================================================

/// Insert one expense; returns the id SQLite assigned
pub fn add_expense(
    conn: &Connection,
    date: NaiveDate,
    category: &str,
    amount: f64,
    description: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO expenses (date, category, amount, description) VALUES (?1, ?2, ?3, ?4)",
        params![
            date.format(DATE_FORMAT).to_string(),
            category,
            amount,
            description
        ],
    )?;

    let id = conn.last_insert_rowid();
    tracing::debug!(id, %date, category, amount, "expense added");
    Ok(id)
}

pub fn insert_expense(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    add_expense(
        conn,
        expense.date,
        &expense.category,
        expense.amount,
        &expense.description,
    )
}

// ============================================================================
// READS
// ============================================================================

fn query_expenses(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(sql)?;
    let expenses = stmt
        .query_map(params, Expense::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(expenses)
}

/// Every expense in id (insertion) order
pub fn list_all(conn: &Connection) -> Result<Vec<Expense>> {
    query_expenses(
        conn,
        "SELECT id, date, category, amount, description FROM expenses ORDER BY id",
        [],
    )
}

/// Expenses whose date text equals `date` exactly
pub fn list_by_date(conn: &Connection, date: &str) -> Result<Vec<Expense>> {
    query_expenses(
        conn,
        "SELECT id, date, category, amount, description FROM expenses
         WHERE date = ?1 ORDER BY id",
        [date],
    )
}

/// Expenses whose category equals `category` exactly
pub fn list_by_category(conn: &Connection, category: &str) -> Result<Vec<Expense>> {
    query_expenses(
        conn,
        "SELECT id, date, category, amount, description FROM expenses
         WHERE category = ?1 ORDER BY id",
        [category],
    )
}

pub fn search_by_category(conn: &Connection, filter: &CategoryFilter) -> Result<Vec<Expense>> {
    match filter {
        CategoryFilter::All => list_all(conn),
        CategoryFilter::Only(category) => list_by_category(conn, category),
    }
}

/// Total amount per distinct category
pub fn sum_by_category(conn: &Connection) -> Result<BTreeMap<String, f64>> {
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount) FROM expenses GROUP BY category",
    )?;

    let totals = stmt
        .query_map([], |row| {
            let category: Option<String> = row.get(0)?;
            let total: Option<f64> = row.get(1)?;
            Ok((category.unwrap_or_default(), total.unwrap_or(0.0)))
        })?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

    Ok(totals)
}

/// Sum of amounts per calendar day, oldest first
pub fn daily_totals(conn: &Connection) -> Result<Vec<(NaiveDate, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT date, SUM(amount) FROM expenses GROUP BY date ORDER BY date",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let date: Option<String> = row.get(0)?;
            let total: Option<f64> = row.get(1)?;
            Ok((date.unwrap_or_default(), total.unwrap_or(0.0)))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut series = Vec::with_capacity(rows.len());
    for (date, total) in rows {
        let day = NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .map_err(|e| StoreError::bad_value("date", date.as_str(), e.to_string()))?;
        series.push((day, total));
    }
    series.sort_by_key(|(day, _)| *day);

    Ok(series)
}

pub fn count_expenses(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// CSV
// ============================================================================

/// CSV row accepted by `read_csv`
#[derive(Debug, Deserialize)]
struct CsvExpense {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Description", default)]
    description: String,
}

/// Write every expense as CSV; returns the number of rows written
pub fn export_csv<W: Write>(conn: &Connection, writer: W) -> Result<usize> {
    let expenses = list_all(conn)?;
    let mut wtr = csv::Writer::from_writer(writer);
    for expense in &expenses {
        wtr.serialize(expense)?;
    }
    wtr.flush().map_err(|e| StoreError::io("<csv output>", e))?;
    Ok(expenses.len())
}

/// Read `Date,Category,Amount,Description` rows, coercing each field the
/// same way the entry form does. Nothing is inserted.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<NewExpense>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut expenses = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        let row: CsvExpense = result?;
        let line = i + 2; // header is line 1
        let expense = crate::app::coerce_expense(&row.date, &row.category, &row.amount, &row.description)
            .map_err(|e| StoreError::parse(line, e.to_string()))?;
        expenses.push(expense);
    }

    Ok(expenses)
}

/// Insert a batch of expenses; returns how many were inserted
pub fn insert_expenses(conn: &Connection, expenses: &[NewExpense]) -> Result<usize> {
    let mut inserted = 0;
    for expense in expenses {
        insert_expense(conn, expense)?;
        inserted += 1;
    }
    tracing::info!(inserted, "expenses imported");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn seeded_db() -> Connection {
        let conn = test_db();
        add_expense(&conn, date("2024-01-01"), "Food", 10.0, "lunch").unwrap();
        add_expense(&conn, date("2024-01-02"), "Food", 5.0, "coffee").unwrap();
        add_expense(&conn, date("2024-01-01"), "Travel", 3.0, "bus").unwrap();
        conn
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let conn = test_db();

        assert!(list_all(&conn).unwrap().is_empty());
        assert!(sum_by_category(&conn).unwrap().is_empty());
        assert!(daily_totals(&conn).unwrap().is_empty());
        assert_eq!(count_expenses(&conn).unwrap(), 0);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = seeded_db();
        setup_database(&conn).unwrap();

        assert_eq!(count_expenses(&conn).unwrap(), 3);
    }

    #[test]
    fn test_ids_assigned_in_insertion_order() {
        let conn = seeded_db();
        let rows = list_all(&conn).unwrap();

        let ids: Vec<i64> = rows.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows[0].date, "2024-01-01");
        assert_eq!(rows[2].description, "bus");
    }

    #[test]
    fn test_list_by_date_exact_match() {
        let conn = seeded_db();
        let rows = list_by_date(&conn, "2024-01-01").unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|e| e.date == "2024-01-01"));

        assert!(list_by_date(&conn, "2024-1-1").unwrap().is_empty());
    }

    #[test]
    fn test_list_by_category() {
        let conn = seeded_db();

        let food = list_by_category(&conn, "Food").unwrap();
        assert_eq!(food.len(), 2);
        assert!(list_by_category(&conn, "food").unwrap().is_empty());

        let all = search_by_category(&conn, &CategoryFilter::parse("All")).unwrap();
        assert_eq!(all.len(), 3);
        let travel = search_by_category(&conn, &CategoryFilter::parse("Travel")).unwrap();
        assert_eq!(travel.len(), 1);
    }

    #[test]
    fn test_category_filter_matches_percent_text_literally() {
        let conn = test_db();
        add_expense(&conn, date("2024-01-01"), "Fees%2B", 4.0, "").unwrap();
        add_expense(&conn, date("2024-01-01"), "Fees+", 6.0, "").unwrap();
        add_expense(&conn, date("2024-01-01"), "100%", 1.0, "").unwrap();

        let rows = search_by_category(&conn, &CategoryFilter::parse("Fees%2B")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 4.0);

        let rows = search_by_category(&conn, &CategoryFilter::parse("100%")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, "100%");
    }

    #[test]
    fn test_sum_by_category() {
        let conn = seeded_db();
        let totals = sum_by_category(&conn).unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals["Food"], 15.0);
        assert_eq!(totals["Travel"], 3.0);
    }

    #[test]
    fn test_free_text_category() {
        let conn = seeded_db();
        add_expense(&conn, date("2024-02-01"), "Gifts", 20.0, "").unwrap();

        let totals = sum_by_category(&conn).unwrap();
        assert_eq!(totals["Gifts"], 20.0);
    }

    #[test]
    fn test_daily_totals_sorted() {
        let conn = seeded_db();
        add_expense(&conn, date("2023-12-31"), "Bills", 7.5, "power").unwrap();

        let series = daily_totals(&conn).unwrap();
        assert_eq!(
            series,
            vec![
                (date("2023-12-31"), 7.5),
                (date("2024-01-01"), 13.0),
                (date("2024-01-02"), 5.0),
            ]
        );
    }

    #[test]
    fn test_daily_totals_rejects_non_iso_dates() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO expenses (date, category, amount, description) VALUES ('01/02/2024', 'Food', 1.0, '')",
            [],
        )
        .unwrap();

        let err = daily_totals(&conn).unwrap_err();
        assert!(
            matches!(err, StoreError::BadValue { ref field, ref value, .. } if field == "date" && value == "01/02/2024")
        );
        assert!(!err.to_string().contains("line"));
    }

    #[test]
    fn test_export_csv() {
        let conn = seeded_db();
        let mut out = Vec::new();

        let written = export_csv(&conn, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(written, 3);
        assert!(text.starts_with("ID,Date,Category,Amount,Description\n"));
        assert!(text.contains("1,2024-01-01,Food,10.0,lunch"));
    }

    #[test]
    fn test_import_csv() {
        let conn = test_db();
        let data = "Date,Category,Amount,Description\n2024-03-01,Car,40.5,fuel\n2024-03-02,Home, 12 ,\n";

        let expenses = read_csv(data.as_bytes()).unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1].amount, 12.0);

        insert_expenses(&conn, &expenses).unwrap();
        let rows = list_by_date(&conn, "2024-03-01").unwrap();
        assert_eq!(rows[0].category, "Car");
        assert_eq!(rows[0].amount, 40.5);
    }

    #[test]
    fn test_import_csv_reports_bad_row() {
        let data = "Date,Category,Amount,Description\n2024-03-01,Car,40.5,fuel\n2024-03-02,Home,lots,\n";

        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Parse { line: 3, .. }));
    }
}
