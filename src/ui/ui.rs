use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::model::{VaultDetail, VaultSummary};
use crate::store::{CollectionState, DetailState, Selection, VaultStore};
use crate::ui::format::*;
use crate::ui::slider::ThresholdSlider;

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Reload,
    CursorUp,
    CursorDown,
    ScrollDetail(i16),
    NudgeThreshold(i64),
    ThresholdMin,
    ThresholdMax,
    Select,
    Close,
    Help,
    SaveConfig,
    Ignore,
}

/// Maps a key press to an [`Action`]. `overlay_open` changes the meaning of Esc and the arrows.
pub fn map_key(key: KeyEvent, overlay_open: bool) -> Action {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Esc if overlay_open => Action::Close,
        KeyCode::Esc => Action::Quit,
        KeyCode::Up if overlay_open => Action::ScrollDetail(-1),
        KeyCode::Down if overlay_open => Action::ScrollDetail(1),
        KeyCode::Up => Action::CursorUp,
        KeyCode::Down => Action::CursorDown,
        KeyCode::Left => Action::NudgeThreshold(-1),
        KeyCode::Right => Action::NudgeThreshold(1),
        KeyCode::PageDown => Action::NudgeThreshold(-10),
        KeyCode::PageUp => Action::NudgeThreshold(10),
        KeyCode::Home => Action::ThresholdMin,
        KeyCode::End => Action::ThresholdMax,
        KeyCode::Enter => Action::Select,
        KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::F(5) => Action::Reload,
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => Action::Help,
        KeyCode::Char('s') | KeyCode::Char('S') => Action::SaveConfig,
        _ => Action::Ignore,
    }
}

#[derive(Debug, Default)]
pub struct UIState {
    pub cursor: usize,
    pub detail_scroll: u16,
}

impl UIState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self, visible: usize) {
        if self.cursor + 1 < visible {
            self.cursor += 1;
        }
    }

    /// Keeps the cursor on a row after the visible set shrinks.
    pub fn clamp_cursor(&mut self, visible: usize) {
        self.cursor = self.cursor.min(visible.saturating_sub(1));
    }

    pub fn scroll_detail(&mut self, delta: i16) {
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
    }
}

/// Static inputs for rendering that do not live in the store.
pub struct ViewContext<'a> {
    pub source: &'a str,
    pub slider: ThresholdSlider,
    pub show_debug_info: bool,
}

pub fn draw(f: &mut Frame, ui_state: &UIState, store: &VaultStore, ctx: &ViewContext<'_>) {
    let size = f.size();
    match store.collection() {
        CollectionState::Idle | CollectionState::Loading => draw_loading(f, size, ctx),
        CollectionState::Failed(message) => draw_error(f, size, message),
        CollectionState::Loaded(vaults) => {
            draw_explorer(f, size, ui_state, store, vaults.len(), ctx);
            if let Some(selection) = store.selection() {
                draw_detail(f, size, ui_state, selection, store.find(&selection.key));
            }
        }
    }
}

fn draw_loading(f: &mut Frame, area: Rect, ctx: &ViewContext<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(area);

    let loading = Paragraph::new(vec![
        Line::from(vec![Span::styled(
            "PENDLE VAULT EXPLORER",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw("Source: "),
            Span::styled(ctx.source.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(""),
        Line::from("Loading vaults..."),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().title("Loading").borders(Borders::ALL));

    f.render_widget(loading, chunks[1]);
}

fn draw_error(f: &mut Frame, area: Rect, message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(area);

    let error = Paragraph::new(vec![
        Line::from(vec![Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Press R to try again or Q to quit."),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().title("Error").borders(Borders::ALL));

    f.render_widget(error, chunks[1]);
}

fn draw_explorer(
    f: &mut Frame,
    area: Rect,
    ui_state: &UIState,
    store: &VaultStore,
    total: usize,
    ctx: &ViewContext<'_>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let visible = store.visible();
    let max = store.max_liquidity();
    let threshold = store.threshold();

    let mut header_spans = vec![
        Span::styled(
            "Pendle Vaults",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {} of {} shown", visible.len(), total)),
    ];
    if ctx.show_debug_info {
        header_spans.push(Span::styled(
            format!("  [{}]", ctx.source),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let header =
        Paragraph::new(Line::from(header_spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title("Minimum liquidity (←/→, PgUp/PgDn, Home/End)")
                .borders(Borders::ALL),
        )
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(ctx.slider.ratio(threshold, max))
        .label(format!("≥ {} of {}", format_usd(threshold), format_usd(max)));
    f.render_widget(gauge, chunks[1]);

    let now = Utc::now();
    let rows: Vec<Row> = visible
        .iter()
        .map(|vault| {
            Row::new(vec![
                Cell::from(vault.name.clone()),
                Cell::from(vault.symbol.clone()),
                Cell::from(vault.chain_id.to_string()),
                Cell::from(format_expiry(vault.expiry, now)),
                Cell::from(format_usd(vault.liquidity)),
                Cell::from(format_apy(vault.implied_apy)),
                Cell::from(format_apy(vault.underlying_apy)),
                Cell::from(format_apy(vault.lp_apy)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(18),
        Constraint::Percentage(16),
        Constraint::Length(7),
        Constraint::Length(20),
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                "Name", "Symbol", "Chain", "Expiry", "Liquidity", "Implied", "Underlying", "LP APY",
            ])
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().title("Vaults").borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    let mut table_state = TableState::default();
    if !visible.is_empty() {
        table_state.select(Some(ui_state.cursor.min(visible.len() - 1)));
    }
    f.render_stateful_widget(table, chunks[2], &mut table_state);

    let footer =
        Paragraph::new("Enter details | Esc close | R reload | H help | S save config | Q quit")
            .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[3]);
}

fn draw_detail(
    f: &mut Frame,
    area: Rect,
    ui_state: &UIState,
    selection: &Selection,
    summary: Option<&VaultSummary>,
) {
    let popup = centered_rect(75, 75, area);
    let loaded_name = match &selection.detail {
        DetailState::Loaded(detail) => detail.name().map(str::to_string),
        _ => None,
    };
    let title = loaded_name
        .or_else(|| summary.map(|v| v.name.clone()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| selection.key.address.clone());

    let lines = match &selection.detail {
        DetailState::Loading => vec![Line::from(""), Line::from("Loading details...")],
        DetailState::Failed(message) => vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                format!("⚠ {}", message),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from("Enter to retry, Esc to close."),
        ],
        DetailState::Loaded(detail) => detail_lines(selection, detail, summary),
    };

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((ui_state.detail_scroll, 0))
        .block(
            Block::default()
                .title(format!("{} | {}", title, selection.key))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    f.render_widget(Clear, popup);
    f.render_widget(body, popup);
}

/// Known fields first (detail value, else the listing's), then every passthrough field.
pub fn detail_lines(
    selection: &Selection,
    detail: &VaultDetail,
    summary: Option<&VaultSummary>,
) -> Vec<Line<'static>> {
    let now = Utc::now();
    let label = Style::default().fg(Color::Yellow);

    let field = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("{:<16}", name), label), Span::raw(value)])
    };

    let mut lines = vec![
        field("Address", selection.key.address.clone()),
        field("Chain", selection.key.chain_id.to_string()),
        field(
            "Symbol",
            detail
                .symbol()
                .map(str::to_string)
                .or_else(|| summary.map(|v| v.symbol.clone()))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        ),
        field(
            "Expiry",
            format_expiry(detail.expiry().or_else(|| summary.and_then(|v| v.expiry)), now),
        ),
        field(
            "Liquidity",
            format_usd_or_na(detail.liquidity().or_else(|| summary.map(|v| v.liquidity))),
        ),
        field(
            "24h Volume",
            format_usd_or_na(detail.volume_24h().or_else(|| summary.map(|v| v.volume_24h))),
        ),
        field(
            "Implied APY",
            format_apy(detail.implied_apy().or_else(|| summary.and_then(|v| v.implied_apy))),
        ),
        field(
            "Underlying APY",
            format_apy(detail.underlying_apy().or_else(|| summary.and_then(|v| v.underlying_apy))),
        ),
        field(
            "LP APY",
            format_apy(detail.lp_apy().or_else(|| summary.and_then(|v| v.lp_apy))),
        ),
        field(
            "PT Price",
            format_price(detail.pt_price().or_else(|| summary.map(|v| v.pt_price))),
        ),
        field(
            "YT Price",
            format_price(detail.yt_price().or_else(|| summary.map(|v| v.yt_price))),
        ),
    ];

    let extra = detail.extra();
    if !extra.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            "Additional fields",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]));
        for (key, value) in extra {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", key), label),
                Span::raw(format_value(value)),
            ]));
        }
    }

    lines
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
