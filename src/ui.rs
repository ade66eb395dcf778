use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row,
        Table, TableState, Wrap,
    },
    Frame, Terminal,
};
use record_keeper::{ContactsState, ExpensesState, Notice, Outcome, StoreError};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Contacts,
    Expenses,
    Timeline,
    Distribution,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Contacts => Page::Expenses,
            Page::Expenses => Page::Timeline,
            Page::Timeline => Page::Distribution,
            Page::Distribution => Page::Contacts,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Contacts => Page::Distribution,
            Page::Expenses => Page::Contacts,
            Page::Timeline => Page::Expenses,
            Page::Distribution => Page::Timeline,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Contacts => "Contacts",
            Page::Expenses => "Expenses",
            Page::Timeline => "Timeline",
            Page::Distribution => "Distribution",
        }
    }
}

/// What keystrokes currently mean
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// Editing the contact form; `updating` decides what Enter does
    ContactForm { updating: bool, field: usize },
    /// Editing the expense form: 0 date, 1 category, 2 amount, 3 description
    ExpenseForm { field: usize },
    /// Typing the date to search for
    DateSearch,
}

const CONTACT_FIELDS: usize = 2;
const EXPENSE_FIELDS: usize = 4;

pub struct App {
    pub contacts: ContactsState,
    pub expenses: ExpensesState,
    pub current_page: Page,
    pub mode: Mode,
    pub contact_table: TableState,
    pub expense_table: TableState,
    pub notice: Option<Notice>,
}

impl App {
    pub fn new(contacts: ContactsState, expenses: ExpensesState) -> Self {
        let mut expense_table = TableState::default();
        if !expenses.rows.is_empty() {
            expense_table.select(Some(0));
        }

        Self {
            contacts,
            expenses,
            current_page: Page::Contacts,
            mode: Mode::Browse,
            contact_table: TableState::default(),
            expense_table,
            notice: None,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Keep the outcome of an action, surfacing a failure as the notice
    fn report(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Ok(()) => true,
            Err(notice) => {
                self.notice = Some(notice);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------

    fn select_contact(&mut self, index: Option<usize>) {
        self.contacts.select(index);
        self.contact_table.select(self.contacts.selected);
    }

    fn move_contact(&mut self, delta: isize) {
        let len = self.contacts.contacts().len();
        if len == 0 {
            return;
        }
        let i = match self.contacts.selected {
            Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
            None => 0,
        };
        self.select_contact(Some(i));
    }

    fn begin_contact_edit(&mut self) {
        if self.contacts.selected.is_none() {
            self.notice = Some(StoreError::selection("contact", "update").into());
            return;
        }
        self.mode = Mode::ContactForm {
            updating: true,
            field: 0,
        };
    }

    fn submit_contact(&mut self, updating: bool) {
        let outcome = if updating {
            self.contacts.update()
        } else {
            self.contacts.add()
        };
        if self.report(outcome) {
            self.mode = Mode::Browse;
            self.notice = self.contacts.warning.take();
        }
        self.contact_table.select(self.contacts.selected);
    }

    fn remove_contact(&mut self) {
        let outcome = self.contacts.remove();
        self.report(outcome);
        self.contact_table.select(self.contacts.selected);
    }

    // ------------------------------------------------------------------
    // Expenses
    // ------------------------------------------------------------------

    fn move_expense(&mut self, delta: isize) {
        let len = self.expenses.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.expense_table.selected() {
            Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
            None => 0,
        };
        self.expense_table.select(Some(i));
    }

    fn after_expense_query(&mut self, outcome: Outcome) -> bool {
        let ok = self.report(outcome);
        let selected = if self.expenses.rows.is_empty() {
            None
        } else {
            Some(0)
        };
        self.expense_table.select(selected);
        ok
    }

    fn submit_expense(&mut self) {
        let outcome = self.expenses.add();
        if self.after_expense_query(outcome) {
            self.mode = Mode::Browse;
        }
    }

    fn search_expenses_by_date(&mut self) {
        let outcome = self.expenses.search_by_date();
        if self.after_expense_query(outcome) {
            self.mode = Mode::Browse;
        }
    }

    fn search_expenses_by_category(&mut self, delta: isize) {
        self.expenses.cycle_search_category(delta);
        let outcome = self.expenses.search_by_category();
        self.after_expense_query(outcome);
    }

    fn show_all_expenses(&mut self) {
        let outcome = self.expenses.show_all();
        self.after_expense_query(outcome);
    }

    // ------------------------------------------------------------------
    // Keys
    // ------------------------------------------------------------------

    /// Returns false when the app should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.notice.is_some() {
            self.notice = None;
            return true;
        }

        let mode = self.mode;
        match mode {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::ContactForm { updating, field } => self.handle_contact_form_key(key, updating, field),
            Mode::ExpenseForm { field } => self.handle_expense_form_key(key, field),
            Mode::DateSearch => self.handle_date_search_key(key),
        }
        true
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            _ => match self.current_page {
                Page::Contacts => match key.code {
                    KeyCode::Down | KeyCode::Char('j') => self.move_contact(1),
                    KeyCode::Up | KeyCode::Char('k') => self.move_contact(-1),
                    KeyCode::Char('a') => {
                        self.contacts.form.clear();
                        self.mode = Mode::ContactForm {
                            updating: false,
                            field: 0,
                        };
                    }
                    KeyCode::Char('e') => self.begin_contact_edit(),
                    KeyCode::Char('d') | KeyCode::Delete => self.remove_contact(),
                    _ => {}
                },
                Page::Expenses => match key.code {
                    KeyCode::Down | KeyCode::Char('j') => self.move_expense(1),
                    KeyCode::Up | KeyCode::Char('k') => self.move_expense(-1),
                    KeyCode::Char('a') => self.mode = Mode::ExpenseForm { field: 0 },
                    KeyCode::Char('/') => self.mode = Mode::DateSearch,
                    KeyCode::Char('f') => self.search_expenses_by_category(1),
                    KeyCode::Char('F') => self.search_expenses_by_category(-1),
                    KeyCode::Char('r') => self.show_all_expenses(),
                    _ => {}
                },
                Page::Timeline | Page::Distribution => {}
            },
        }
        true
    }

    fn handle_contact_form_key(&mut self, key: KeyEvent, updating: bool, field: usize) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.submit_contact(updating),
            KeyCode::Tab | KeyCode::Down | KeyCode::Up | KeyCode::BackTab => {
                self.mode = Mode::ContactForm {
                    updating,
                    field: (field + 1) % CONTACT_FIELDS,
                };
            }
            KeyCode::Backspace => {
                contact_field(&mut self.contacts, field).pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                contact_field(&mut self.contacts, field).push(c);
            }
            _ => {}
        }
    }

    fn handle_expense_form_key(&mut self, key: KeyEvent, field: usize) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.submit_expense(),
            KeyCode::Tab | KeyCode::Down => {
                self.mode = Mode::ExpenseForm {
                    field: (field + 1) % EXPENSE_FIELDS,
                };
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.mode = Mode::ExpenseForm {
                    field: (field + EXPENSE_FIELDS - 1) % EXPENSE_FIELDS,
                };
            }
            KeyCode::Left if field == 1 => self.expenses.cycle_form_category(-1),
            KeyCode::Right if field == 1 => self.expenses.cycle_form_category(1),
            KeyCode::Backspace => {
                if let Some(text) = expense_field(&mut self.expenses, field) {
                    text.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(text) = expense_field(&mut self.expenses, field) {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_date_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.search_expenses_by_date(),
            KeyCode::Backspace => {
                self.expenses.search_date.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.expenses.search_date.push(c);
            }
            _ => {}
        }
    }
}

fn contact_field(state: &mut ContactsState, field: usize) -> &mut String {
    if field == 0 {
        &mut state.form.name
    } else {
        &mut state.form.phone
    }
}

/// Text behind an expense form field; the category field is picked, not typed
fn expense_field(state: &mut ExpensesState, field: usize) -> Option<&mut String> {
    match field {
        0 => Some(&mut state.form.date),
        2 => Some(&mut state.form.amount),
        3 => Some(&mut state.form.description),
        _ => None,
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != event::KeyEventKind::Press {
                continue;
            }
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Contacts => render_contacts(f, chunks[1], app),
        Page::Expenses => render_expenses(f, chunks[1], app),
        Page::Timeline => render_timeline(f, chunks[1], app),
        Page::Distribution => render_distribution(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);

    if let Some(notice) = &app.notice {
        render_notice(f, notice);
    }
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Contacts, Page::Expenses, Page::Timeline, Page::Distribution];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Contacts: {}", app.contacts.contacts().len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Shown expenses: {}", app.expenses.rows.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

/// One "Label: value" form line, highlighted when focused
fn form_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let label_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let value_style = if focused {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let value = if focused { format!("{}▏", value) } else { value };

    Line::from(vec![
        Span::styled(format!("  {:<13}", label), label_style),
        Span::styled(value, value_style),
    ])
}

fn render_contacts(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let (title, focus) = match app.mode {
        Mode::ContactForm { updating: true, field } => (" Update Contact ", Some(field)),
        Mode::ContactForm { updating: false, field } => (" Add Contact ", Some(field)),
        _ => (" Contact ", None),
    };
    let form = &app.contacts.form;
    let lines = vec![
        form_line("Name:", form.name.clone(), focus == Some(0)),
        form_line("Phone:", form.phone.clone(), focus == Some(1)),
    ];
    let form_block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focus.is_some() {
                Color::Yellow
            } else {
                Color::White
            }))
            .title(title),
    );
    f.render_widget(form_block, chunks[0]);

    let header = Row::new(
        ["Name", "Phone"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.contacts.contacts().iter().map(|c| {
        Row::new(vec![
            Cell::from(truncate(&c.name, 38)),
            Cell::from(truncate(&c.phone, 28)),
        ])
        .height(1)
    });

    let table = Table::new(rows, [Constraint::Length(40), Constraint::Length(30)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Contacts "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.contact_table);
}

fn render_expenses(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Entry form
            Constraint::Length(3), // Search
            Constraint::Min(0),    // Table
        ])
        .split(area);

    let focus = match app.mode {
        Mode::ExpenseForm { field } => Some(field),
        _ => None,
    };
    let form = &app.expenses.form;
    let lines = vec![
        form_line("Date:", form.date.clone(), focus == Some(0)),
        form_line(
            "Category:",
            format!("◀ {} ▶", app.expenses.form_category()),
            focus == Some(1),
        ),
        form_line("Amount:", form.amount.clone(), focus == Some(2)),
        form_line("Description:", form.description.clone(), focus == Some(3)),
    ];
    let form_block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focus.is_some() {
                Color::Yellow
            } else {
                Color::White
            }))
            .title(" Add Expense "),
    );
    f.render_widget(form_block, chunks[0]);

    let searching = app.mode == Mode::DateSearch;
    let search = Line::from(vec![
        Span::styled("  Date: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            if searching {
                format!("{}▏", app.expenses.search_date)
            } else {
                app.expenses.search_date.clone()
            },
            if searching {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            },
        ),
        Span::raw("    "),
        Span::styled("Category: ", Style::default().fg(Color::Cyan)),
        Span::raw(app.expenses.search_filter().to_string()),
        Span::raw("    "),
        Span::styled("Showing: ", Style::default().fg(Color::Cyan)),
        Span::styled(app.expenses.view.label(), Style::default().fg(Color::Green)),
    ]);
    let search_block = Paragraph::new(search).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Search "),
    );
    f.render_widget(search_block, chunks[1]);

    let header = Row::new(
        ["ID", "Date", "Category", "Amount", "Description"]
            .iter()
            .map(|h| Cell::from(*h).style(header_style())),
    )
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows = app.expenses.rows.iter().map(|e| {
        let color = if e.amount < 0.0 { Color::Green } else { Color::Red };
        Row::new(vec![
            Cell::from(e.id.to_string()),
            Cell::from(e.date.clone()),
            Cell::from(truncate(&e.category, 14)),
            Cell::from(format!("{:.2}", e.amount)).style(Style::default().fg(color)),
            Cell::from(truncate(&e.description, 40)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[2], &mut app.expense_table);
}

fn placeholder(f: &mut Frame, area: Rect, title: &str, message: String) {
    let paragraph = Paragraph::new(message).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title.to_string()),
    );
    f.render_widget(paragraph, area);
}

fn render_timeline(f: &mut Frame, area: Rect, app: &App) {
    const TITLE: &str = " Expenses Over Time ";

    let series = match app.expenses.timeline() {
        Ok(series) => series,
        Err(e) => return placeholder(f, area, TITLE, format!("  {}", e)),
    };
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => return placeholder(f, area, TITLE, "  No expenses recorded yet".to_string()),
    };

    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|(day, total)| (days_between(first, *day), *total))
        .collect();

    let span = days_between(first, last).max(1.0);
    let (min_y, max_y) = points.iter().fold((0.0_f64, 0.0_f64), |(lo, hi), (_, y)| {
        (lo.min(*y), hi.max(*y))
    });
    let max_y = if max_y == min_y { min_y + 1.0 } else { max_y };

    let datasets = vec![Dataset::default()
        .name("Daily total")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(TITLE),
        )
        .x_axis(
            Axis::default()
                .title("Date")
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, span])
                .labels(vec![
                    Span::raw(first.to_string()),
                    Span::raw(last.to_string()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Amount")
                .style(Style::default().fg(Color::Gray))
                .bounds([min_y, max_y])
                .labels(vec![
                    Span::raw(format!("{:.0}", min_y)),
                    Span::raw(format!("{:.0}", (min_y + max_y) / 2.0)),
                    Span::raw(format!("{:.0}", max_y)),
                ]),
        );

    f.render_widget(chart, area);
}

fn days_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

fn render_distribution(f: &mut Frame, area: Rect, app: &App) {
    const TITLE: &str = " Expense Distribution by Category ";

    let distribution = match app.expenses.distribution() {
        Ok(d) if d.is_empty() => {
            return placeholder(f, area, TITLE, "  No expenses recorded yet".to_string())
        }
        Ok(d) => d,
        Err(e) => return placeholder(f, area, TITLE, format!("  {}", e)),
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    // Bars take whole units; negative totals draw as empty bars
    let data: Vec<(&str, u64)> = distribution
        .iter()
        .map(|(category, total, _)| (category.as_str(), total.max(0.0).round() as u64))
        .collect();

    let bars = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(TITLE),
        )
        .data(data.as_slice())
        .bar_width(9)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .label_style(Style::default().fg(Color::Yellow));
    f.render_widget(bars, chunks[0]);

    let legend: Vec<Line> = distribution
        .iter()
        .map(|(category, total, share)| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<12}", truncate(category, 12)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(format!("{:>10.2} ", total)),
                Span::styled(format!("{:>5.1}%", share), Style::default().fg(Color::Green)),
            ])
        })
        .collect();
    let legend = Paragraph::new(legend).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Share "),
    );
    f.render_widget(legend, chunks[1]);
}

/// Key hints for the current mode and page
fn status_hints(mode: Mode, page: Page) -> &'static [(&'static str, &'static str)] {
    match (mode, page) {
        (Mode::ContactForm { .. }, _) => &[
            ("Tab", "Next field"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ],
        (Mode::ExpenseForm { .. }, _) => &[
            ("Tab", "Next field"),
            ("←/→", "Category"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ],
        (Mode::DateSearch, _) => &[("Enter", "Search"), ("Esc", "Cancel")],
        (Mode::Browse, Page::Contacts) => &[
            ("a", "Add"),
            ("e", "Edit"),
            ("d", "Remove"),
            ("↑/↓", "Select"),
            ("Tab", "Page"),
            ("q", "Quit"),
        ],
        (Mode::Browse, Page::Expenses) => &[
            ("a", "Add"),
            ("/", "By date"),
            ("f/F", "By category"),
            ("r", "All"),
            ("Tab", "Page"),
            ("q", "Quit"),
        ],
        (Mode::Browse, _) => &[("Tab", "Page"), ("q", "Quit")],
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let hints = status_hints(app.mode, app.current_page);

    let mut status_spans = vec![];
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            status_spans.push(Span::raw(" | "));
        }
        let key_style = if *key == "q" {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Yellow)
        };
        status_spans.push(Span::styled(*key, key_style));
        status_spans.push(Span::raw(format!(" {}", label)));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_notice(f: &mut Frame, notice: &Notice) {
    let area = centered_rect(50, 7, f.size());

    let content = vec![
        Line::from(""),
        Line::from(Span::raw(format!("  {}", notice.message))),
        Line::from(""),
        Line::from(Span::styled(
            "  Press any key to continue",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    let popup = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(format!(" {} ", notice.title)),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

/// Rect of `percent_x` width and `height` rows centred in `r`
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_keeper::{ContactBook, DEFAULT_CATEGORIES};
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn test_app(dir: &TempDir) -> App {
        let book = ContactBook::open(dir.path().join("contact_book.txt")).unwrap();
        let conn = Connection::open_in_memory().unwrap();
        let categories = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        App::new(
            ContactsState::new(book),
            ExpensesState::new(conn, categories).unwrap(),
        )
    }

    #[test]
    fn test_add_contact_through_form() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "Ann");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "555");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.contacts.contacts()[0].name, "Ann");
        assert_eq!(app.contacts.contacts()[0].phone, "555");
    }

    #[test]
    fn test_edit_without_selection_shows_notice() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.handle_key(key(KeyCode::Char('e')));
        let notice = app.notice.clone().unwrap();
        assert_eq!(notice.title, "Selection Error");
        assert_eq!(app.mode, Mode::Browse);

        // Any key dismisses, and is not acted on
        assert!(app.handle_key(key(KeyCode::Char('q'))));
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_lossy_name_shows_warning_after_save() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "Dr: Who");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "555");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.contacts.contacts().len(), 1);
        assert_eq!(app.notice.as_ref().unwrap().title, "Input Warning");
    }

    #[test]
    fn test_category_hint_only_on_expense_form() {
        let has_category = |mode: Mode, page: Page| {
            status_hints(mode, page).iter().any(|(_, label)| *label == "Category")
        };

        assert!(!has_category(
            Mode::ContactForm { updating: false, field: 0 },
            Page::Contacts
        ));
        assert!(!has_category(
            Mode::ContactForm { updating: true, field: 1 },
            Page::Contacts
        ));
        assert!(has_category(Mode::ExpenseForm { field: 1 }, Page::Expenses));
    }

    #[test]
    fn test_empty_form_keeps_editing() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "Ann");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.notice.as_ref().unwrap().title, "Input Error");
        assert!(matches!(app.mode, Mode::ContactForm { updating: false, .. }));
        assert!(app.contacts.contacts().is_empty());
    }

    #[test]
    fn test_expense_form_and_category_filter() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.current_page, Page::Expenses);

        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "42.5");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.expenses.rows.len(), 1);
        assert_eq!(app.expenses.rows[0].category, "Bills");
        assert_eq!(app.expense_table.selected(), Some(0));

        app.handle_key(key(KeyCode::Char('f')));
        assert!(app.expenses.rows.is_empty());
        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.expenses.rows.len(), 1);
        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.expenses.rows.len(), 1);
    }

    #[test]
    fn test_quit() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        assert!(!app.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }
}
