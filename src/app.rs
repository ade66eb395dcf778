// Application state for the front-ends
//
// Handlers take the state they act on explicitly. A failed action comes
// back as a `Notice`, which the front-end shows before anything else
// happens.

use crate::contacts::{Contact, ContactBook, SEPARATOR};
use crate::db::{self, CategoryFilter, Expense, NewExpense, DATE_FORMAT};
use crate::error::{Result, StoreError};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;

// ============================================================================
// INPUT BOUNDARY
// ============================================================================

pub fn parse_amount(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(StoreError::validation(
            "amount",
            format!("Please enter a valid amount (got {:?})", trimmed),
        )),
    }
}

pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| {
        StoreError::validation(
            "date",
            format!("Please enter a date as YYYY-MM-DD (got {:?})", text.trim()),
        )
    })
}

/// Coerce raw form/CSV text into an insertable expense
pub fn coerce_expense(
    date: &str,
    category: &str,
    amount: &str,
    description: &str,
) -> Result<NewExpense> {
    let date = parse_date(date)?;
    let category = category.trim();
    if category.is_empty() {
        return Err(StoreError::validation("category", "Please choose a category"));
    }
    let amount = parse_amount(amount)?;

    Ok(NewExpense {
        date,
        category: category.to_string(),
        amount,
        description: description.to_string(),
    })
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// NOTICE
// ============================================================================

/// Blocking notification for a failed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: String,
}

impl From<StoreError> for Notice {
    fn from(err: StoreError) -> Self {
        if !err.is_user_error() {
            tracing::error!(error = %err, "store operation failed");
        }
        Notice {
            title: err.title(),
            message: err.to_string(),
        }
    }
}

impl Notice {
    /// Saved, but the name will split differently when the file is reloaded
    pub fn lossy_name(contact: &Contact) -> Self {
        Notice {
            title: "Input Warning",
            message: format!(
                "Saved, but \"{}\" contains \"{}\" and will not reload as typed",
                contact.name, SEPARATOR
            ),
        }
    }
}

pub type Outcome = std::result::Result<(), Notice>;

// ============================================================================
// CONTACTS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
}

impl ContactForm {
    pub fn clear(&mut self) {
        self.name.clear();
        self.phone.clear();
    }
}

/// Contact book plus the row and form the user is working with
#[derive(Debug)]
pub struct ContactsState {
    pub book: ContactBook,
    pub selected: Option<usize>,
    pub form: ContactForm,
    /// Set after a successful save that will not survive a reload
    pub warning: Option<Notice>,
}

impl ContactsState {
    pub fn new(book: ContactBook) -> Self {
        Self {
            book,
            selected: None,
            form: ContactForm::default(),
            warning: None,
        }
    }

    pub fn contacts(&self) -> &[Contact] {
        self.book.list()
    }

    /// Select a row and copy it into the form. Out-of-range clears the selection.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.book.len());
        if let Some(contact) = self.selected.and_then(|i| self.book.get(i)) {
            self.form.name = contact.name.clone();
            self.form.phone = contact.phone.clone();
        }
    }

    pub fn add(&mut self) -> Outcome {
        let id = self.book.add(&self.form.name, &self.form.phone)?;
        self.check_round_trip(self.book.index_of(id));
        self.reset();
        Ok(())
    }

    pub fn update(&mut self) -> Outcome {
        self.book
            .update(self.selected, &self.form.name, &self.form.phone)?;
        self.check_round_trip(self.selected);
        self.reset();
        Ok(())
    }

    fn check_round_trip(&mut self, index: Option<usize>) {
        self.warning = index
            .and_then(|i| self.book.get(i))
            .filter(|c| !c.round_trips())
            .map(Notice::lossy_name);
    }

    pub fn remove(&mut self) -> Outcome {
        self.book.remove(self.selected)?;
        self.reset();
        Ok(())
    }

    /// The table is rebuilt after a change, so the selection goes with it
    fn reset(&mut self) {
        self.form.clear();
        self.selected = None;
    }
}

// ============================================================================
// EXPENSES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseForm {
    pub date: String,
    pub category: usize,
    pub amount: String,
    pub description: String,
}

impl ExpenseForm {
    pub fn new() -> Self {
        Self {
            date: today().format(DATE_FORMAT).to_string(),
            category: 0,
            amount: String::new(),
            description: String::new(),
        }
    }
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Which rows the expense table currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseView {
    All,
    ByDate(String),
    ByCategory(CategoryFilter),
}

impl ExpenseView {
    pub fn label(&self) -> String {
        match self {
            ExpenseView::All => "All expenses".to_string(),
            ExpenseView::ByDate(date) => format!("Date = {}", date),
            ExpenseView::ByCategory(filter) => format!("Category = {}", filter),
        }
    }
}

/// Expense database plus form, search inputs and the rows on screen
pub struct ExpensesState {
    conn: Connection,
    pub categories: Vec<String>,
    pub form: ExpenseForm,
    pub search_date: String,
    /// 0 is "All", n is `categories[n - 1]`
    pub search_category: usize,
    pub view: ExpenseView,
    pub rows: Vec<Expense>,
}

impl ExpensesState {
    pub fn new(conn: Connection, categories: Vec<String>) -> Result<Self> {
        db::setup_database(&conn)?;
        let mut state = Self {
            conn,
            categories,
            form: ExpenseForm::new(),
            search_date: today().format(DATE_FORMAT).to_string(),
            search_category: 0,
            view: ExpenseView::All,
            rows: Vec::new(),
        };
        state.reload()?;
        Ok(state)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn form_category(&self) -> &str {
        self.categories
            .get(self.form.category)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn search_filter(&self) -> CategoryFilter {
        match self.search_category {
            0 => CategoryFilter::All,
            n => self
                .categories
                .get(n - 1)
                .map(|c| CategoryFilter::Only(c.clone()))
                .unwrap_or(CategoryFilter::All),
        }
    }

    /// Step the form's category by `delta`, wrapping around
    pub fn cycle_form_category(&mut self, delta: isize) {
        self.form.category = wrap(self.form.category, delta, self.categories.len());
    }

    /// Step the search category by `delta`, wrapping through "All"
    pub fn cycle_search_category(&mut self, delta: isize) {
        self.search_category = wrap(self.search_category, delta, self.categories.len() + 1);
    }

    /// Coerce the form, insert, then show the full list again
    pub fn add(&mut self) -> Outcome {
        let expense = coerce_expense(
            &self.form.date,
            self.form_category(),
            &self.form.amount,
            &self.form.description,
        )?;
        db::insert_expense(&self.conn, &expense)?;

        self.form.amount.clear();
        self.form.description.clear();
        self.show_all()
    }

    pub fn show_all(&mut self) -> Outcome {
        self.view = ExpenseView::All;
        self.reload()?;
        Ok(())
    }

    pub fn search_by_date(&mut self) -> Outcome {
        let date = parse_date(&self.search_date)?;
        self.view = ExpenseView::ByDate(date.format(DATE_FORMAT).to_string());
        self.reload()?;
        Ok(())
    }

    pub fn search_by_category(&mut self) -> Outcome {
        self.view = ExpenseView::ByCategory(self.search_filter());
        self.reload()?;
        Ok(())
    }

    /// Re-run the query behind the current view
    pub fn reload(&mut self) -> Result<()> {
        self.rows = match &self.view {
            ExpenseView::All => db::list_all(&self.conn)?,
            ExpenseView::ByDate(date) => db::list_by_date(&self.conn, date)?,
            ExpenseView::ByCategory(filter) => db::search_by_category(&self.conn, filter)?,
        };
        Ok(())
    }

    /// Category totals with their share of the grand total (percent).
    /// Empty only when no expense exists; a zero grand total gives 0% shares.
    pub fn distribution(&self) -> Result<Vec<(String, f64, f64)>> {
        let totals = db::sum_by_category(&self.conn)?;
        let grand: f64 = totals.values().sum();
        Ok(totals
            .into_iter()
            .map(|(category, total)| {
                let share = if grand == 0.0 { 0.0 } else { total / grand * 100.0 };
                (category, total, share)
            })
            .collect())
    }

    pub fn timeline(&self) -> Result<Vec<(NaiveDate, f64)>> {
        db::daily_totals(&self.conn)
    }

    pub fn count(&self) -> Result<i64> {
        db::count_expenses(&self.conn)
    }
}

fn wrap(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as isize;
    ((current as isize + delta).rem_euclid(len)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_CATEGORIES;
    use tempfile::TempDir;

    fn contacts_state(dir: &TempDir) -> ContactsState {
        let book = ContactBook::open(dir.path().join("contact_book.txt")).unwrap();
        ContactsState::new(book)
    }

    fn expenses_state() -> ExpensesState {
        let conn = Connection::open_in_memory().unwrap();
        let categories = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        ExpensesState::new(conn, categories).unwrap()
    }

    fn fill(state: &mut ExpensesState, date: &str, category: usize, amount: &str) {
        state.form.date = date.to_string();
        state.form.category = category;
        state.form.amount = amount.to_string();
        state.form.description = "test".to_string();
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 12.50 ").unwrap(), 12.5);
        assert_eq!(parse_amount("-3").unwrap(), -3.0);
        assert!(parse_amount("").is_err());
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("NaN").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn test_contact_add_clears_form() {
        let dir = TempDir::new().unwrap();
        let mut state = contacts_state(&dir);

        state.form.name = "Ann".to_string();
        state.form.phone = "123".to_string();
        state.add().unwrap();

        assert_eq!(state.contacts().len(), 1);
        assert_eq!(state.form, ContactForm::default());
    }

    #[test]
    fn test_contact_add_missing_field_notice() {
        let dir = TempDir::new().unwrap();
        let mut state = contacts_state(&dir);

        state.form.name = "Ann".to_string();
        let notice = state.add().unwrap_err();

        assert_eq!(notice.title, "Input Error");
        assert_eq!(notice.message, "Please enter both name and phone number");
        assert_eq!(state.form.name, "Ann");
    }

    #[test]
    fn test_contact_select_then_update() {
        let dir = TempDir::new().unwrap();
        let mut state = contacts_state(&dir);
        for (name, phone) in [("A", "1"), ("B", "2"), ("C", "3")] {
            state.form.name = name.to_string();
            state.form.phone = phone.to_string();
            state.add().unwrap();
        }

        state.select(Some(1));
        assert_eq!(state.form.name, "B");
        assert_eq!(state.form.phone, "2");

        state.form.name = "D".to_string();
        state.update().unwrap();

        let names: Vec<_> = state.contacts().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "D", "C"]);
        assert_eq!(state.selected, None);
    }

    #[test]
    fn test_contact_remove_requires_selection() {
        let dir = TempDir::new().unwrap();
        let mut state = contacts_state(&dir);
        state.form.name = "A".to_string();
        state.form.phone = "1".to_string();
        state.add().unwrap();

        let notice = state.remove().unwrap_err();
        assert_eq!(notice.title, "Selection Error");
        assert_eq!(notice.message, "Please select a contact to remove");

        state.select(Some(5));
        assert_eq!(state.selected, None);

        state.select(Some(0));
        state.remove().unwrap();
        assert!(state.contacts().is_empty());
    }

    #[test]
    fn test_expense_add_shows_all() {
        let mut state = expenses_state();
        fill(&mut state, "2024-01-01", 0, "10");
        state.add().unwrap();
        fill(&mut state, "2024-01-02", 2, "3");
        state.add().unwrap();

        assert_eq!(state.view, ExpenseView::All);
        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.rows[1].category, "Travel");
        assert!(state.form.amount.is_empty());
        assert_eq!(state.form.date, "2024-01-02");
    }

    #[test]
    fn test_expense_bad_amount_never_reaches_storage() {
        let mut state = expenses_state();
        fill(&mut state, "2024-01-01", 0, "ten");

        let notice = state.add().unwrap_err();
        assert_eq!(notice.title, "Input Error");
        assert_eq!(state.count().unwrap(), 0);
    }

    #[test]
    fn test_expense_searches() {
        let mut state = expenses_state();
        fill(&mut state, "2024-01-01", 0, "10");
        state.add().unwrap();
        fill(&mut state, "2024-01-01", 2, "3");
        state.add().unwrap();
        fill(&mut state, "2024-01-05", 0, "5");
        state.add().unwrap();

        state.search_date = "2024-01-01".to_string();
        state.search_by_date().unwrap();
        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.view, ExpenseView::ByDate("2024-01-01".to_string()));

        state.search_category = 1;
        state.search_by_category().unwrap();
        assert_eq!(state.rows.len(), 2);
        assert!(state.rows.iter().all(|e| e.category == "Food"));

        state.cycle_search_category(-1);
        assert_eq!(state.search_filter(), CategoryFilter::All);
        state.search_by_category().unwrap();
        assert_eq!(state.rows.len(), 3);
    }

    #[test]
    fn test_category_cycling_wraps() {
        let mut state = expenses_state();

        state.cycle_form_category(-1);
        assert_eq!(state.form_category(), "Bike");
        state.cycle_form_category(1);
        assert_eq!(state.form_category(), "Food");

        state.cycle_search_category(-1);
        assert_eq!(
            state.search_filter(),
            CategoryFilter::Only("Bike".to_string())
        );
    }

    #[test]
    fn test_distribution_shares() {
        let mut state = expenses_state();
        assert!(state.distribution().unwrap().is_empty());

        fill(&mut state, "2024-01-01", 0, "10");
        state.add().unwrap();
        fill(&mut state, "2024-01-01", 0, "5");
        state.add().unwrap();
        fill(&mut state, "2024-01-01", 2, "5");
        state.add().unwrap();

        let dist = state.distribution().unwrap();
        assert_eq!(
            dist,
            vec![
                ("Food".to_string(), 15.0, 75.0),
                ("Travel".to_string(), 5.0, 25.0),
            ]
        );
    }

    #[test]
    fn test_distribution_with_zero_grand_total_lists_categories() {
        let mut state = expenses_state();
        fill(&mut state, "2024-01-01", 0, "10");
        state.add().unwrap();
        fill(&mut state, "2024-01-02", 1, "-10");
        state.add().unwrap();

        let dist = state.distribution().unwrap();
        assert_eq!(
            dist,
            vec![
                ("Bills".to_string(), -10.0, 0.0),
                ("Food".to_string(), 10.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_lossy_name_raises_warning() {
        let dir = TempDir::new().unwrap();
        let mut state = contacts_state(&dir);

        state.form.name = "Ann".to_string();
        state.form.phone = "1".to_string();
        state.add().unwrap();
        assert!(state.warning.is_none());

        state.form.name = "Dr: Who".to_string();
        state.form.phone = "2".to_string();
        state.add().unwrap();
        let warning = state.warning.take().unwrap();
        assert_eq!(warning.title, "Input Warning");
        assert!(warning.message.contains("Dr: Who"));

        state.select(Some(0));
        state.form.name = "Mr: X".to_string();
        state.update().unwrap();
        assert!(state.warning.is_some());
    }
}
