//! Terminal dashboard: overview, transactions, and chat tabs over one
//! shared store, with gateway calls running on the background worker.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::sync::mpsc::Receiver;
use tokio::sync::mpsc::UnboundedSender;

use finsight_core::{
    apply_chat_event, ChatMessage, ChatStreamEvent, MessageState, Role, TransactionStore, TxnKind,
    CATEGORIES, GENERIC_FAILURE_MESSAGE, RATE_LIMIT_MESSAGE, UNCATEGORIZED,
};
use finsight_gateway::InsightsView;

use crate::config::{self, Config};
use crate::state;
use crate::worker::{self, GatewayEvent, GatewayRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Transactions,
    Chat,
}

struct App {
    cfg: Config,
    tab: Tab,
    store: TransactionStore,
    messages: Vec<ChatMessage>,
    input: String,
    selected: usize,
    busy: bool,
    status: Option<String>,
    insights_view: Option<InsightsView>,
    next_request_id: u64,
    current_request: Option<u64>,
    next_message_id: u64,
    req_tx: Option<UnboundedSender<GatewayRequest>>,
}

impl App {
    fn new(cfg: Config, store: TransactionStore, req_tx: Option<UnboundedSender<GatewayRequest>>, tab: Tab) -> Self {
        Self {
            cfg,
            tab,
            store,
            messages: Vec::new(),
            input: String::new(),
            selected: 0,
            busy: false,
            status: None,
            insights_view: None,
            next_request_id: 1,
            current_request: None,
            next_message_id: 1,
            req_tx,
        }
    }

    fn begin_request(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.current_request = Some(id);
        self.busy = true;
        id
    }

    fn finish_request(&mut self) {
        self.current_request = None;
        self.busy = false;
    }
}

pub fn run_dashboard(initial: Tab) -> Result<()> {
    let cfg = config::load_config()?;
    let store = state::load_store()?;

    let (ev_tx, ev_rx) = std::sync::mpsc::channel();
    let (status, req_tx) = match config::build_client(&cfg) {
        Ok(client) => {
            let (req_tx, req_rx) = tokio::sync::mpsc::unbounded_channel();
            tokio::spawn(worker::run_worker(client, cfg.chat.max_turns_context, req_rx, ev_tx));
            (None, Some(req_tx))
        }
        Err(e) => (Some(format!("{e:#}")), None),
    };

    let mut app = App::new(cfg, store, req_tx, initial);
    app.status = status;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = dashboard_loop(&mut terminal, &mut app, &ev_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn dashboard_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    ev_rx: &Receiver<GatewayEvent>,
) -> Result<()> {
    loop {
        while let Ok(ev) = ev_rx.try_recv() {
            on_gateway_event(app, ev)?;
        }

        terminal.draw(|f| ui(f, app))?;

        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(app, key.code)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Fold one worker event into the app. Events from a superseded request are
/// discarded wholesale.
fn on_gateway_event(app: &mut App, ev: GatewayEvent) -> Result<()> {
    if app.current_request != Some(ev.request_id()) {
        log::debug!("discarding event from stale request {}", ev.request_id());
        return Ok(());
    }
    match ev {
        GatewayEvent::Started { .. } => {}
        GatewayEvent::ChatDelta { message_id, text, .. } => {
            app.messages =
                apply_chat_event(&app.messages, message_id, &ChatStreamEvent::Delta(text));
        }
        GatewayEvent::ChatCompleted { message_id, .. } => {
            app.messages = apply_chat_event(&app.messages, message_id, &ChatStreamEvent::Completed);
            app.finish_request();
        }
        GatewayEvent::ChatFailed { message_id, rate_limited, .. } => {
            app.messages = apply_chat_event(
                &app.messages,
                message_id,
                &ChatStreamEvent::Failed { rate_limited },
            );
            app.status = Some(classified_message(rate_limited).to_string());
            app.finish_request();
        }
        GatewayEvent::Categorized { assignments, .. } => {
            let n = app
                .store
                .apply_assignments(&assignments, app.cfg.categorize.on_unknown_category);
            state::save_store(&app.store)?;
            let anomalies = assignments.iter().filter(|a| a.is_anomaly).count();
            app.status = Some(format!("Categorized {n} transactions ({anomalies} anomalies)"));
            app.finish_request();
        }
        GatewayEvent::CategorizeFailed { rate_limited, .. } => {
            app.status = Some(classified_message(rate_limited).to_string());
            app.finish_request();
        }
        GatewayEvent::Insights { view, .. } => {
            app.insights_view = Some(view);
            app.finish_request();
        }
    }
    Ok(())
}

fn classified_message(rate_limited: bool) -> &'static str {
    if rate_limited {
        RATE_LIMIT_MESSAGE
    } else {
        GENERIC_FAILURE_MESSAGE
    }
}

/// Returns true when the dashboard should exit.
fn handle_key(app: &mut App, code: KeyCode) -> Result<bool> {
    match code {
        KeyCode::Esc => return Ok(true),
        KeyCode::Tab => {
            app.tab = match app.tab {
                Tab::Overview => Tab::Transactions,
                Tab::Transactions => Tab::Chat,
                Tab::Chat => Tab::Overview,
            };
            return Ok(false);
        }
        _ => {}
    }

    match app.tab {
        Tab::Overview => match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => app.tab = Tab::Overview,
            KeyCode::Char('2') => app.tab = Tab::Transactions,
            KeyCode::Char('3') => app.tab = Tab::Chat,
            KeyCode::Char('i') => request_insights(app),
            _ => {}
        },
        Tab::Transactions => match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => app.tab = Tab::Overview,
            KeyCode::Char('2') => app.tab = Tab::Transactions,
            KeyCode::Char('3') => app.tab = Tab::Chat,
            KeyCode::Up => app.selected = app.selected.saturating_sub(1),
            KeyCode::Down => {
                if app.selected + 1 < app.store.len() {
                    app.selected += 1;
                }
            }
            KeyCode::Char('c') => cycle_selected_category(app)?,
            KeyCode::Char('g') => request_categorize(app),
            _ => {}
        },
        Tab::Chat => match code {
            KeyCode::Enter => send_chat(app),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) => app.input.push(c),
            _ => {}
        },
    }
    Ok(false)
}

/// Manual category edit: cycle through the fixed set, then Uncategorized.
pub(crate) fn next_category(current: &str) -> &'static str {
    let ring: Vec<&'static str> =
        CATEGORIES.iter().copied().chain(std::iter::once(UNCATEGORIZED)).collect();
    match ring.iter().position(|c| *c == current) {
        Some(i) => ring[(i + 1) % ring.len()],
        None => ring[0],
    }
}

fn cycle_selected_category(app: &mut App) -> Result<()> {
    let Some(txn) = app.store.transactions().get(app.selected).cloned() else {
        return Ok(());
    };
    let next = next_category(&txn.category);
    app.store.set_category(&txn.id, next);
    state::save_store(&app.store)?;
    app.status = Some(format!("{} -> {next}", txn.description));
    Ok(())
}

fn require_worker(app: &mut App) -> bool {
    if app.busy {
        app.status = Some("Still working on the last request".to_string());
        return false;
    }
    if app.req_tx.is_none() {
        app.status =
            Some(format!("Set {} to enable the assistant", app.cfg.llm.api_key_env));
        return false;
    }
    true
}

fn request_insights(app: &mut App) {
    if !require_worker(app) {
        return;
    }
    let request_id = app.begin_request();
    let txns = app.store.transactions().to_vec();
    if let Some(tx) = &app.req_tx {
        let _ = tx.send(GatewayRequest::Insights { request_id, txns });
    }
}

fn request_categorize(app: &mut App) {
    if !require_worker(app) {
        return;
    }
    let txns = app.store.uncategorized();
    if txns.is_empty() {
        app.status = Some("Nothing left to categorize".to_string());
        return;
    }
    let request_id = app.begin_request();
    if let Some(tx) = &app.req_tx {
        let _ = tx.send(GatewayRequest::Categorize { request_id, txns });
    }
}

fn send_chat(app: &mut App) {
    let text = app.input.trim().to_string();
    if text.is_empty() || !require_worker(app) {
        return;
    }

    let user_id = app.next_message_id;
    let model_id = app.next_message_id + 1;
    app.next_message_id += 2;
    app.messages.push(ChatMessage::user(user_id, text.clone()));
    app.messages.push(ChatMessage::pending_model(model_id));
    app.input.clear();

    let request_id = app.begin_request();
    let context = app.store.transactions().to_vec();
    if let Some(tx) = &app.req_tx {
        let _ = tx.send(GatewayRequest::Chat { request_id, message_id: model_id, text, context });
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match app.tab {
        Tab::Overview => draw_overview(f, app, chunks[1]),
        Tab::Transactions => draw_transactions(f, app, chunks[1]),
        Tab::Chat => draw_chat(f, app, chunks[1]),
    }
    draw_status(f, app, chunks[2]);
}

fn tab_span(label: &str, active: bool) -> Span<'static> {
    if active {
        Span::styled(
            format!(" {label} "),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {label} "), Style::default().fg(Color::Gray))
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("Finsight", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        tab_span("[1] overview", app.tab == Tab::Overview),
        tab_span("[2] transactions", app.tab == Tab::Transactions),
        tab_span("[3] chat", app.tab == Tab::Chat),
    ];
    if app.busy {
        spans.push(Span::styled("  working…", Style::default().fg(Color::Magenta)));
    }
    let header =
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_overview(f: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let summary = app.store.summary();
    let mut lines = vec![
        Line::from(vec![
            Span::raw("Income    "),
            Span::styled(format!("${:.2}", summary.income), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::raw("Expenses  "),
            Span::styled(format!("${:.2}", summary.expenses), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            Span::raw("Balance   "),
            Span::styled(
                format!("${:.2}", summary.balance),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::raw(""),
        Line::from(Span::styled("Spending by category", Style::default().fg(Color::Gray))),
    ];
    for (category, total) in &summary.by_category {
        lines.push(Line::raw(format!("  {category:<18} ${total:.2}")));
    }
    let block = Block::default().borders(Borders::ALL).title("overview");
    f.render_widget(Paragraph::new(Text::from(lines)).block(block), halves[0]);

    let title = if app.busy { "insights (working…)" } else { "insights — press i" };
    let mut lines: Vec<Line> = Vec::new();
    match &app.insights_view {
        Some(view) => {
            for l in view.text.lines() {
                lines.push(Line::raw(l.to_string()));
            }
            if view.rate_limited {
                lines.push(Line::raw(""));
                lines.push(Line::from(Span::styled(
                    "rate limited — wait a minute before retrying",
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "No insights yet. Press i to ask the assistant.",
            Style::default().fg(Color::Gray),
        ))),
    }
    let block = Block::default().borders(Borders::ALL).title(title);
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(block).wrap(Wrap { trim: false }),
        halves[1],
    );
}

fn draw_transactions(f: &mut Frame, app: &App, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.selected.saturating_sub(visible.saturating_sub(1));

    let mut lines: Vec<Line> = Vec::new();
    for (i, t) in app.store.transactions().iter().enumerate().skip(skip).take(visible) {
        let amount = match t.kind {
            TxnKind::Income => {
                Span::styled(format!("{:>10}", format!("+{:.2}", t.amount)), Style::default().fg(Color::Green))
            }
            TxnKind::Expense => {
                Span::styled(format!("{:>10}", format!("-{:.2}", t.amount)), Style::default().fg(Color::Red))
            }
        };
        let anomaly = if t.anomaly == Some(true) {
            Span::styled(" !", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            Span::raw("  ")
        };
        let row_style = if i == app.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(
            Line::from(vec![
                Span::raw(format!("{}  ", t.date)),
                Span::raw(format!("{:<32.32}", t.description)),
                Span::styled(
                    format!("{:<16.16}", t.category),
                    if t.is_uncategorized() {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default().fg(Color::Cyan)
                    },
                ),
                amount,
                anomaly,
            ])
            .style(row_style),
        );
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title("transactions — ↑/↓ select, c = edit category, g = auto-categorize");
    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn draw_chat(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if app.messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask anything about your transactions.",
            Style::default().fg(Color::Gray),
        )));
    }
    for m in &app.messages {
        let (tag, color) = match m.role {
            Role::User => ("you", Color::Cyan),
            Role::Model => ("finsight", Color::Magenta),
        };
        let text = match m.state {
            MessageState::Pending => "…".to_string(),
            _ => m.text.clone(),
        };
        let style = if m.state == MessageState::Failed {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{tag}: "), Style::default().fg(color)),
            Span::styled(text, style),
        ]));
        lines.push(Line::raw(""));
    }

    // keep the latest messages in view
    let inner_height = chunks[0].height.saturating_sub(2) as usize;
    let scroll = lines.len().saturating_sub(inner_height) as u16;

    let block = Block::default().borders(Borders::ALL).title("conversation");
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(block).wrap(Wrap { trim: false }).scroll((scroll, 0)),
        chunks[0],
    );

    let title = if app.busy { "message (waiting for reply…)" } else { "message — enter to send" };
    let input = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));
    f.render_widget(input, chunks[1]);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let hint = match app.tab {
        Tab::Overview => "tab switch · i insights · q quit",
        Tab::Transactions => "tab switch · ↑/↓ · c category · g categorize · q quit",
        Tab::Chat => "tab switch · enter send · esc quit",
    };
    let line = match &app.status {
        Some(s) => Line::from(vec![
            Span::styled(s.clone(), Style::default().fg(Color::Yellow)),
            Span::styled(format!("   ({hint})"), Style::default().fg(Color::DarkGray)),
        ]),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    };
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("status")),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_category_cycles_through_the_fixed_set() {
        let mut seen = vec![];
        let mut current = UNCATEGORIZED;
        for _ in 0..(CATEGORIES.len() + 1) {
            current = next_category(current);
            seen.push(current);
        }
        assert_eq!(seen.first().copied(), Some(CATEGORIES[0]));
        assert_eq!(seen.last().copied(), Some(UNCATEGORIZED));
    }

    #[test]
    fn test_next_category_resets_on_unknown_value() {
        assert_eq!(next_category("Crypto Winnings"), CATEGORIES[0]);
    }
}
