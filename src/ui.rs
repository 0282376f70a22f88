use crate::{
    abi::{
        MarketStatus,
        Side,
    },
    client::{
        AppSnapshot,
        MarketForm,
    },
    view,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ethers::types::U256;
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthStr;

pub enum UserEvent {
    Quit,
    Redraw,
    Refresh,
    OpenTeam(U256),
    OpenMarket(U256),
    CloseTeam,
    CloseMarket,
    ConfirmAddTeam {
        name: String,
        manager: String,
        fan_token: String,
    },
    ConfirmCreateMarket(MarketForm),
    ConfirmOrder {
        outcome_index: usize,
        side: Side,
        amount: String,
        odds: String,
    },
    ConfirmCancel {
        bet_id: U256,
    },
}

#[derive(Debug, Default)]
pub struct UiState {
    screen: Screen,
    mode: Mode,
    team_idx: usize,
    market_idx: usize,
    outcome_idx: usize,
    bet_idx: usize,
    focus: DetailFocus,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Screen {
    #[default]
    Teams,
    Markets,
    MarketDetail,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum DetailFocus {
    #[default]
    Outcomes,
    Bets,
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    AddTeamModal(FormState),
    CreateMarketModal(FormState),
    OrderModal(OrderState),
    CancelModal {
        bet_id: U256,
    },
    QuitModal,
}

#[derive(Clone, Debug)]
struct FormState {
    fields: Vec<(&'static str, String)>,
    active: usize,
}

impl FormState {
    fn new(labels: &[&'static str]) -> Self {
        Self {
            fields: labels.iter().map(|l| (*l, String::new())).collect(),
            active: 0,
        }
    }

    fn value(&self, label: &str) -> String {
        self.fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.trim().to_string())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
struct OrderState {
    outcome_index: usize,
    side: Side,
    amount: String,
    odds: String,
    editing_odds: bool,
}

impl OrderState {
    fn new(outcome_index: usize, side: Side) -> Self {
        Self {
            outcome_index,
            side,
            amount: String::new(),
            odds: String::new(),
            editing_odds: false,
        }
    }
}

pub type InputEventReceiver = mpsc::UnboundedReceiver<Event>;

/// Crossterm's event::read blocks, so it lives on its own thread and feeds
/// the async loop through a channel.
pub fn input_event_stream() -> InputEventReceiver {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

pub async fn next_raw_event(input_events: &mut InputEventReceiver) -> Result<Event> {
    input_events
        .recv()
        .await
        .ok_or_else(|| eyre!("input event stream closed"))
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    // Create a single persistent Terminal to preserve buffers across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    // Lists shrink after refetches; keep cursors in range.
    state.team_idx = state.team_idx.min(snap.teams.len().saturating_sub(1));
    state.market_idx = state.market_idx.min(snap.markets.len().saturating_sub(1));
    state.bet_idx = state.bet_idx.min(snap.my_bets.len().saturating_sub(1));
    if let Some(detail) = &snap.market_detail {
        state.outcome_idx = state.outcome_idx.min(detail.options.len().saturating_sub(1));
    }
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn interpret_event(
    state: &mut UiState,
    snap: &AppSnapshot,
    event: Event,
) -> Option<UserEvent> {
    let Event::Key(k) = event else {
        return None;
    };
    if k.kind != KeyEventKind::Press {
        return None;
    }

    // Modal handling
    match &mut state.mode {
        Mode::AddTeamModal(form) => {
            return match k.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Tab | KeyCode::Down => {
                    form.active = (form.active + 1) % form.fields.len();
                    Some(UserEvent::Redraw)
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.active = (form.active + form.fields.len() - 1) % form.fields.len();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Backspace => {
                    form.fields[form.active].1.pop();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) => {
                    form.fields[form.active].1.push(c);
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => {
                    let event = UserEvent::ConfirmAddTeam {
                        name: form.value("Name"),
                        manager: form.value("Manager address"),
                        fan_token: form.value("Fan token address"),
                    };
                    state.mode = Mode::Normal;
                    Some(event)
                }
                _ => None,
            };
        }
        Mode::CreateMarketModal(form) => {
            return match k.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Tab | KeyCode::Down => {
                    form.active = (form.active + 1) % form.fields.len();
                    Some(UserEvent::Redraw)
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.active = (form.active + form.fields.len() - 1) % form.fields.len();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Backspace => {
                    form.fields[form.active].1.pop();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) => {
                    form.fields[form.active].1.push(c);
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => {
                    let form_values = MarketForm {
                        category: form.value("Category"),
                        question: form.value("Question"),
                        description: form.value("Description"),
                        options: form
                            .value("Options (comma separated)")
                            .split(',')
                            .map(|o| o.to_string())
                            .collect(),
                        start_time: form.value("Starts (YYYY-MM-DD HH:MM or unix)"),
                        end_time: form.value("Ends (YYYY-MM-DD HH:MM or unix)"),
                    };
                    state.mode = Mode::Normal;
                    Some(UserEvent::ConfirmCreateMarket(form_values))
                }
                _ => None,
            };
        }
        Mode::OrderModal(os) => {
            return match k.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                    os.editing_odds = !os.editing_odds;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Left | KeyCode::Right => {
                    os.side = os.side.toggled();
                    Some(UserEvent::Redraw)
                }
                KeyCode::Backspace => {
                    if os.editing_odds {
                        os.odds.pop();
                    } else {
                        os.amount.pop();
                    }
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                    if os.editing_odds {
                        os.odds.push(c);
                    } else {
                        os.amount.push(c);
                    }
                    Some(UserEvent::Redraw)
                }
                KeyCode::Enter => {
                    let event = UserEvent::ConfirmOrder {
                        outcome_index: os.outcome_index,
                        side: os.side,
                        amount: os.amount.clone(),
                        odds: os.odds.clone(),
                    };
                    state.mode = Mode::Normal;
                    Some(event)
                }
                _ => None,
            };
        }
        Mode::CancelModal { bet_id } => {
            return match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    let bet_id = *bet_id;
                    state.mode = Mode::Normal;
                    Some(UserEvent::ConfirmCancel { bet_id })
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::QuitModal => {
            return match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }

    if matches!(k.code, KeyCode::Char('q')) {
        state.mode = Mode::QuitModal;
        return Some(UserEvent::Redraw);
    }
    if matches!(k.code, KeyCode::Char('r')) {
        return Some(UserEvent::Refresh);
    }

    match state.screen {
        Screen::Teams => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.team_idx = state.team_idx.saturating_sub(1);
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.team_idx =
                    (state.team_idx + 1).min(snap.teams.len().saturating_sub(1));
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let team = snap.teams.get(state.team_idx)?;
                state.screen = Screen::Markets;
                state.market_idx = 0;
                Some(UserEvent::OpenTeam(team.id))
            }
            KeyCode::Char('a') => {
                state.mode = Mode::AddTeamModal(FormState::new(&[
                    "Name",
                    "Manager address",
                    "Fan token address",
                ]));
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Screen::Markets => match k.code {
            KeyCode::Esc => {
                state.screen = Screen::Teams;
                Some(UserEvent::CloseTeam)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.market_idx = state.market_idx.saturating_sub(1);
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.market_idx =
                    (state.market_idx + 1).min(snap.markets.len().saturating_sub(1));
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let market = snap.markets.get(state.market_idx)?;
                state.screen = Screen::MarketDetail;
                state.outcome_idx = 0;
                state.bet_idx = 0;
                state.focus = DetailFocus::Outcomes;
                Some(UserEvent::OpenMarket(market.id))
            }
            KeyCode::Char('n') => {
                state.mode = Mode::CreateMarketModal(FormState::new(&[
                    "Category",
                    "Question",
                    "Description",
                    "Options (comma separated)",
                    "Starts (YYYY-MM-DD HH:MM or unix)",
                    "Ends (YYYY-MM-DD HH:MM or unix)",
                ]));
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Screen::MarketDetail => match k.code {
            KeyCode::Esc => {
                state.screen = Screen::Markets;
                Some(UserEvent::CloseMarket)
            }
            KeyCode::Tab => {
                state.focus = match state.focus {
                    DetailFocus::Outcomes => DetailFocus::Bets,
                    DetailFocus::Bets => DetailFocus::Outcomes,
                };
                Some(UserEvent::Redraw)
            }
            KeyCode::Up | KeyCode::Char('k') => {
                match state.focus {
                    DetailFocus::Outcomes => {
                        state.outcome_idx = state.outcome_idx.saturating_sub(1);
                    }
                    DetailFocus::Bets => {
                        state.bet_idx = state.bet_idx.saturating_sub(1);
                    }
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                match state.focus {
                    DetailFocus::Outcomes => {
                        let max = snap
                            .market_detail
                            .as_ref()
                            .map(|m| m.options.len().saturating_sub(1))
                            .unwrap_or(0);
                        state.outcome_idx = (state.outcome_idx + 1).min(max);
                    }
                    DetailFocus::Bets => {
                        state.bet_idx =
                            (state.bet_idx + 1).min(snap.my_bets.len().saturating_sub(1));
                    }
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter | KeyCode::Char('b') => {
                if market_is_open(snap) {
                    state.mode =
                        Mode::OrderModal(OrderState::new(state.outcome_idx, Side::Back));
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('l') => {
                if market_is_open(snap) {
                    state.mode =
                        Mode::OrderModal(OrderState::new(state.outcome_idx, Side::Lay));
                }
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('c') => {
                let bet = snap.my_bets.get(state.bet_idx)?;
                state.mode = Mode::CancelModal { bet_id: bet.id };
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
    }
}

fn market_is_open(snap: &AppSnapshot) -> bool {
    snap.market_detail
        .as_ref()
        .map(|m| m.status == MarketStatus::Open)
        .unwrap_or(false)
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    // Clear the whole frame to avoid leftover fragments
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(10),   // screen body
            Constraint::Length(6), // status/errors
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_header(f, chunks[0], snap);
    match state.screen {
        Screen::Teams => draw_teams(f, state, chunks[1], snap),
        Screen::Markets => draw_markets(f, state, chunks[1], snap),
        Screen::MarketDetail => draw_market_detail(f, state, chunks[1], snap),
    }
    draw_status(f, chunks[2], snap);
    draw_help(f, state, chunks[3]);
    draw_modals(f, state, snap);
}

fn draw_header(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = format!(
        "Network: {} | Account: {} | Teams: {} | Markets: {}",
        snap.network, snap.account, snap.team_count, snap.market_count
    );
    let widget = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("FanPredix"));
    f.render_widget(widget, area);
}

fn draw_teams(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::new();
    if snap.teams.is_empty() {
        lines.push(Line::styled(
            "No teams yet (a to add one)",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        for (i, team) in snap.teams.iter().enumerate() {
            let cur = if i == state.team_idx { ">" } else { " " };
            lines.push(Line::from(format!(
                "{} #{} {} | manager {} | token {}",
                cur, team.id, team.name, team.manager, team.fan_token
            )));
        }
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Teams"));
    f.render_widget(widget, area);
}

fn draw_markets(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let max_question = (area.width as usize).saturating_sub(40);
    let mut lines = Vec::new();
    if snap.markets.is_empty() {
        lines.push(Line::styled(
            "No markets for this team (n to create one)",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        for (i, market) in snap.markets.iter().enumerate() {
            let cur = if i == state.market_idx { ">" } else { " " };
            let outcome = match &market.resolved_outcome {
                Some(label) => format!(" -> {label}"),
                None => String::new(),
            };
            let options = market.options.iter().join(" / ");
            let text = format!(
                "{} #{} [{}] {} ({}){} | {} | ends {}",
                cur,
                market.id,
                market.status_label(),
                fit_width(&market.question, max_question),
                market.category,
                outcome,
                options,
                market.ends
            );
            let style = match market.status {
                MarketStatus::Open => Style::default(),
                MarketStatus::Closed => Style::default().fg(Color::DarkGray),
                MarketStatus::Resolved => Style::default().fg(Color::Cyan),
            };
            lines.push(Line::styled(text, style));
        }
    }
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Markets"));
    f.render_widget(widget, area);
}

fn draw_market_detail(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut left = Vec::new();
    match &snap.market_detail {
        Some(market) => {
            left.push(Line::from(format!(
                "[{}] {} ({})",
                market.status_label(),
                market.question,
                market.category
            )));
            if !market.description.is_empty() {
                left.push(Line::from(market.description.clone()));
            }
            left.push(Line::from(format!(
                "{} -> {}",
                market.starts, market.ends
            )));
            if let Some(outcome) = &market.resolved_outcome {
                left.push(Line::styled(
                    format!("Resolved: {outcome}"),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ));
            }
            left.push(Line::from(""));
            left.push(Line::from("Outcomes:"));
            for (i, option) in market.options.iter().enumerate() {
                let cur = if i == state.outcome_idx && state.focus == DetailFocus::Outcomes
                {
                    ">"
                } else {
                    " "
                };
                let winner = market.resolved_outcome.as_deref() == Some(option.as_str());
                let text = format!("{cur} {i}. {option}");
                if winner {
                    left.push(Line::styled(text, Style::default().fg(Color::Cyan)));
                } else {
                    left.push(Line::from(text));
                }
            }
        }
        None => left.push(Line::styled(
            "Loading market...",
            Style::default().fg(Color::DarkGray),
        )),
    }
    let outcomes_title = if state.focus == DetailFocus::Outcomes {
        "Market [focus]"
    } else {
        "Market"
    };
    let widget = Paragraph::new(left).wrap(Wrap { trim: false }).block(
        Block::default().borders(Borders::ALL).title(outcomes_title),
    );
    f.render_widget(widget, halves[0]);

    let mut right = Vec::new();
    if snap.my_bets.is_empty() {
        right.push(Line::styled(
            "No orders on this market",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        for (i, bet) in snap.my_bets.iter().enumerate() {
            let cur = if i == state.bet_idx && state.focus == DetailFocus::Bets {
                ">"
            } else {
                " "
            };
            let text = format!(
                "{} #{} [{}] {} {} @ {} on '{}'",
                cur,
                bet.id,
                bet.status_badge(),
                bet.side.label(),
                bet.amount,
                bet.odds,
                bet.outcome
            );
            let style = match bet.market_status {
                MarketStatus::Open => Style::default(),
                MarketStatus::Closed => Style::default().fg(Color::DarkGray),
                MarketStatus::Resolved => Style::default().fg(Color::Cyan),
            };
            right.push(Line::styled(text, style));
            right.push(Line::styled(
                format!("     wins {} / risks {}", bet.potential_payout, bet.liability),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    let bets_title = if state.focus == DetailFocus::Bets {
        "My Orders [focus]"
    } else {
        "My Orders"
    };
    let widget = Paragraph::new(right)
        .block(Block::default().borders(Borders::ALL).title(bets_title));
    f.render_widget(widget, halves[1]);
}

fn draw_status(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let widget = if snap.errors.is_empty() {
        let mut lines: Vec<Line> = Vec::new();
        if snap.status.trim().is_empty() {
            lines.push(Line::from("Ready"));
        } else {
            for line in snap.status.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for e in &snap.errors {
            lines.push(Line::from(e.clone()));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(widget, area);
}

fn draw_help(f: &mut Frame, state: &UiState, area: Rect) {
    let text = match state.screen {
        Screen::Teams => "↑/↓ select | Enter markets | a add team | r refresh | q quit",
        Screen::Markets => {
            "↑/↓ select | Enter open | n new market | Esc teams | r refresh | q quit"
        }
        Screen::MarketDetail => {
            "Tab focus | ↑/↓ select | b back | l lay | c cancel order | Esc back | q quit"
        }
    };
    let help =
        Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match &state.mode {
        Mode::AddTeamModal(form) => {
            draw_form(f, "Add Team", form);
        }
        Mode::CreateMarketModal(form) => {
            draw_form(f, "Create Market", form);
        }
        Mode::OrderModal(os) => {
            let area = centered_rect(50, 40, f.area());
            let block = Block::default().borders(Borders::ALL).title("Place Order");
            let outcome = snap
                .market_detail
                .as_ref()
                .and_then(|m| m.options.get(os.outcome_index))
                .map(|o| o.as_str())
                .unwrap_or("?");
            let amount_cur = if os.editing_odds { " " } else { ">" };
            let odds_cur = if os.editing_odds { ">" } else { " " };
            let mut lines = vec![
                Line::from(format!("Outcome: {outcome}")),
                Line::from(format!("Side: {} (←/→ toggle)", os.side.label())),
                Line::from(format!("{amount_cur} Amount: {}", os.amount)),
                Line::from(format!("{odds_cur} Odds: {}", os.odds)),
            ];
            if let (Ok(amount), Ok(odds)) = (
                view::parse_amount(&os.amount, snap.token_decimals),
                view::parse_odds(&os.odds),
            ) {
                let (payout, liability) = view::payout_preview(os.side, amount, odds);
                lines.push(Line::styled(
                    format!(
                        "Wins {} / risks {}",
                        view::format_amount(payout, snap.token_decimals),
                        view::format_amount(liability, snap.token_decimals)
                    ),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from("Enter=submit Esc=cancel Tab=switch field"));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(Paragraph::new(lines), block.inner(area));
        }
        Mode::CancelModal { bet_id } => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Cancel Order");
            let p = Paragraph::new(format!("Cancel order {bet_id}? (Y/N)"));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit FanPredix? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn draw_form(f: &mut Frame, title: &'static str, form: &FormState) {
    let area = centered_rect(60, 50, f.area());
    let block = Block::default().borders(Borders::ALL).title(title);
    let mut lines = Vec::new();
    for (i, (label, value)) in form.fields.iter().enumerate() {
        let cur = if i == form.active { ">" } else { " " };
        lines.push(Line::from(format!("{cur} {label}: {value}")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Enter=submit Esc=cancel Tab=next field"));
    f.render_widget(Clear, area);
    f.render_widget(block.clone(), area);
    f.render_widget(Paragraph::new(lines), block.inner(area));
}

fn fit_width(text: &str, max: usize) -> String {
    if max == 0 || text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= max {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}
