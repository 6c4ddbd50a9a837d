// Terminal front-end for the board engine
// Renders the session, maps mouse/keys to engine events and rings the bell for sounds

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, info};
use rand::RngCore;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use crate::mns_board::{CellView, Pos};
use crate::mns_config::{save_config, Config};
use crate::mns_game::{Difficulty, Game, Outcome, Phase, SoundEffect, SoundSink};
use crate::mns_lang::{fill, Lang};
use crate::mns_palette::{Depth, Palette};

const MIN_WIDTH: u16 = 70;

/// Realizes sound events as the terminal bell
pub struct TerminalBell {
    enabled: bool,
}

impl TerminalBell {
    pub fn new(enabled: bool) -> Self {
        TerminalBell { enabled }
    }
}

impl SoundSink for TerminalBell {
    fn play(&mut self, effect: SoundEffect) {
        debug!("sound: {:?}", effect);
        if self.enabled && matches!(effect, SoundEffect::Explosion | SoundEffect::Win) {
            let mut out = io::stdout();
            let _ = out.write_all(b"\x07").and_then(|_| out.flush());
        }
    }
}

type TermGame = Game<TerminalBell>;

// Runtime UI variables grouped so they can be passed around together
#[derive(Debug)]
struct UiState {
    cursor: Pos,
    board_rect: Option<Rect>,
    menu_rect: Option<Rect>,
    menu_hover: usize,
    showing_help: bool,
    result_handled: bool, // win already recorded for this session
    new_record: bool,
    exit: bool,
}

impl UiState {
    fn new() -> Self {
        UiState {
            cursor: Pos::new(0, 0),
            board_rect: None,
            menu_rect: None,
            menu_hover: 0,
            showing_help: false,
            result_handled: false,
            new_record: false,
            exit: false,
        }
    }

    fn reset_after_new_game(&mut self, game: &TermGame) {
        let board = game.session().board();
        self.cursor = Pos::new(
            self.cursor.x.min(board.width() - 1),
            self.cursor.y.min(board.height() - 1),
        );
        self.result_handled = false;
        self.new_record = false;
        self.showing_help = false;
    }

    fn step_cursor(&mut self, game: &TermGame, dx: isize, dy: isize) {
        let board = game.session().board();
        let nx = (self.cursor.x as isize + dx).clamp(0, board.width() as isize - 1) as usize;
        let ny = (self.cursor.y as isize + dy).clamp(0, board.height() as isize - 1) as usize;
        self.cursor = Pos::new(nx, ny);
    }
}

struct Glyphs {
    hidden: &'static str,
    mine: &'static str,
    flag: &'static str,
}

impl Glyphs {
    fn new(ascii: bool) -> Self {
        Glyphs {
            hidden: if ascii { "." } else { "■" },
            mine: if ascii { "*" } else { "☼" },
            flag: if ascii { "F" } else { "⚑" },
        }
    }
}

pub fn run(cfg: &mut Config, lang: &mut Lang) -> Result<()> {
    let seed = cfg.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    // configuration errors surface here, before the terminal is touched
    let mut game = Game::new(cfg.difficulty, TerminalBell::new(cfg.sound), seed)?;
    info!("starting {} game (seed {})", cfg.difficulty.name(), seed);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = event_loop(&mut terminal, &mut game, cfg, lang);

    // Save current difficulty before exiting
    save_config(cfg);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    game: &mut TermGame,
    cfg: &mut Config,
    lang: &mut Lang,
) -> Result<()> {
    let palette = Palette::new(Depth::detect());
    let mut ui = UiState::new();
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    while !ui.exit {
        terminal.draw(|f| draw(f, game, cfg, lang, &palette, &mut ui))?;

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, game, cfg, lang, &mut ui)?,
                Event::Mouse(me) => handle_mouse(me, game, cfg, &mut ui)?,
                _ => {}
            }
            record_win(game, cfg, &mut ui);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn select_difficulty(d: Difficulty, game: &mut TermGame, cfg: &mut Config, ui: &mut UiState) -> Result<()> {
    game.on_difficulty_change_requested(d)?;
    cfg.difficulty = d;
    save_config(cfg);
    ui.reset_after_new_game(game);
    Ok(())
}

fn handle_key(key: KeyEvent, game: &mut TermGame, cfg: &mut Config, lang: &mut Lang, ui: &mut UiState) -> Result<()> {
    if ui.showing_help {
        ui.showing_help = false;
        return Ok(());
    }

    if game.menu_open() {
        match key.code {
            KeyCode::Char(c @ '1'..='3') => {
                if let Some(d) = Difficulty::from_index(c as usize - '1' as usize) {
                    select_difficulty(d, game, cfg, ui)?;
                }
            }
            KeyCode::Up => ui.menu_hover = ui.menu_hover.saturating_sub(1),
            KeyCode::Down => ui.menu_hover = (ui.menu_hover + 1).min(Difficulty::ALL.len() - 1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if let Some(d) = Difficulty::from_index(ui.menu_hover) {
                    select_difficulty(d, game, cfg, ui)?;
                }
            }
            KeyCode::Esc | KeyCode::F(5) => game.close_difficulty_menu(),
            _ => {}
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Left => ui.step_cursor(game, -1, 0),
        KeyCode::Right => ui.step_cursor(game, 1, 0),
        KeyCode::Up => ui.step_cursor(game, 0, -1),
        KeyCode::Down => ui.step_cursor(game, 0, 1),
        KeyCode::Char(' ') | KeyCode::Enter => game.on_primary_click(ui.cursor),
        KeyCode::Char('f') | KeyCode::Char('F') => game.on_secondary_click(ui.cursor),
        KeyCode::Char(c @ '1'..='3') => {
            // direct switch works in any phase
            if let Some(d) = Difficulty::from_index(c as usize - '1' as usize) {
                select_difficulty(d, game, cfg, ui)?;
            }
        }
        KeyCode::F(1) => ui.showing_help = true,
        KeyCode::F(2) => {
            game.on_restart_requested()?;
            ui.reset_after_new_game(game);
        }
        KeyCode::F(5) => {
            if game.open_difficulty_menu() {
                ui.menu_hover = game.session().difficulty().to_index();
            }
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            cfg.language = lang.toggle().to_string();
            save_config(cfg);
        }
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => ui.exit = true,
        _ => {}
    }
    Ok(())
}

fn handle_mouse(me: MouseEvent, game: &mut TermGame, cfg: &mut Config, ui: &mut UiState) -> Result<()> {
    if ui.showing_help {
        if let MouseEventKind::Down(_) = me.kind {
            ui.showing_help = false;
        }
        return Ok(());
    }

    if game.menu_open() {
        let item = ui.menu_rect.and_then(|r| menu_item_at(r, me.column, me.row));
        match me.kind {
            MouseEventKind::Moved => {
                if let Some(i) = item {
                    ui.menu_hover = i;
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(d) = item.and_then(Difficulty::from_index) {
                    select_difficulty(d, game, cfg, ui)?;
                }
            }
            _ => {}
        }
        return Ok(());
    }

    let board = game.session().board();
    let cell = ui
        .board_rect
        .and_then(|r| cell_at(r, board.width(), board.height(), me.column, me.row));
    let Some(pos) = cell else {
        return Ok(());
    };
    ui.cursor = pos;
    match me.kind {
        MouseEventKind::Down(MouseButton::Left) => game.on_primary_click(pos),
        MouseEventKind::Down(MouseButton::Right) => game.on_secondary_click(pos),
        _ => {}
    }
    Ok(())
}

/// Store a best time once per won session
fn record_win(game: &TermGame, cfg: &mut Config, ui: &mut UiState) {
    let session = game.session();
    if session.outcome() != Outcome::Won || ui.result_handled {
        return;
    }
    ui.result_handled = true;
    let secs = session.elapsed().as_secs();
    ui.new_record = cfg.set_record(session.difficulty(), secs);
    if ui.new_record {
        info!("new {} record: {}s", session.difficulty().name(), secs);
        save_config(cfg);
    }
}

/// Map a terminal cell inside the board block to a grid position.
/// Each grid cell is two columns wide, after a one-cell border.
fn cell_at(rect: Rect, width: usize, height: usize, column: u16, row: u16) -> Option<Pos> {
    let col = column.checked_sub(rect.x + 1)? as usize;
    let row = row.checked_sub(rect.y + 1)? as usize;
    let x = col / 2;
    (x < width && row < height).then(|| Pos::new(x, row))
}

/// Difficulty entry under the pointer; entries start after the border and one blank line
fn menu_item_at(rect: Rect, column: u16, row: u16) -> Option<usize> {
    if column <= rect.x || column >= rect.x + rect.width.saturating_sub(1) {
        return None;
    }
    let local = row.checked_sub(rect.y + 2)? as usize;
    (local < Difficulty::ALL.len()).then_some(local)
}

fn draw<B: Backend>(f: &mut Frame<B>, game: &TermGame, cfg: &Config, lang: &Lang, p: &Palette, ui: &mut UiState) {
    let size = f.size();
    let session = game.session();
    let board = session.board();
    let a = &lang.assets;

    let min_height = 8 + board.height() as u16;
    if size.width < MIN_WIDTH || size.height < min_height {
        let warn_lines = vec![
            Spans::from(Span::raw(a.tsmsg_line1)),
            Spans::from(Span::raw(fill(a.tsmsg_line2, &[&MIN_WIDTH, &min_height]))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title(a.tsmsg_title))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let w = 40u16.min(size.width.saturating_sub(2));
        let h = 5u16.min(size.height.saturating_sub(2));
        f.render_widget(warn, center_rect(w, h, size));
        ui.board_rect = None;
        ui.menu_rect = None;
        return;
    }

    // layout: top menu row, center board, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6), Constraint::Length(3)].as_ref())
        .split(size);

    let key_style = Style::default().fg(p.accent_fg).add_modifier(Modifier::BOLD);
    let menu_items = [
        ("F1", a.menu_help),
        ("F2", a.menu_new),
        ("F5", a.menu_difficulty),
        ("L", a.menu_language),
        ("Esc", a.menu_exit),
    ];
    let mut spans_vec: Vec<Span> = vec![Span::raw(" ")];
    for (i, (key, rest)) in menu_items.iter().enumerate() {
        if i > 0 {
            spans_vec.push(Span::raw("   "));
        }
        spans_vec.push(Span::styled(*key, key_style));
        spans_vec.push(Span::raw(format!(": {}", rest)));
    }
    let menu = Paragraph::new(Spans::from(spans_vec)).block(Block::default().borders(Borders::ALL));
    f.render_widget(menu, chunks[0]);

    // status row: counters on the left, outcome on the right
    let left_text = fill(a.status_fmt, &[&board.remaining_mines(), &session.elapsed().as_secs()]);
    let right_text = match session.phase() {
        Phase::AwaitingFirstClick => a.status_ready.to_string(),
        Phase::Active => best_time_text(cfg, lang, session.difficulty()),
        Phase::Won if ui.new_record => a.status_won_record.to_string(),
        Phase::Won => a.status_won.to_string(),
        Phase::Lost => a.status_lost.to_string(),
    };
    let inner_w = chunks[2].width.saturating_sub(2) as usize;
    let used = left_text.as_str().width() + right_text.as_str().width() + 1;
    let mid_spaces = inner_w.saturating_sub(used).max(1);
    let right_style = match session.outcome() {
        Outcome::Won => Style::default().fg(p.number(2)).add_modifier(Modifier::BOLD),
        Outcome::Lost => Style::default().fg(p.flag_fg).add_modifier(Modifier::BOLD),
        Outcome::InProgress => Style::default(),
    };
    let status = Paragraph::new(Spans::from(vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(mid_spaces)),
        Span::styled(right_text, right_style),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[2]);

    // board area
    let glyphs = Glyphs::new(cfg.ascii_icons);
    let board_area = center_rect((board.width() * 2) as u16 + 3, board.height() as u16 + 2, chunks[1]);
    ui.board_rect = Some(board_area);
    let mut lines = Vec::with_capacity(board.height());
    for y in 0..board.height() {
        let mut spans = Vec::with_capacity(board.width() + 1);
        for x in 0..board.width() {
            let pos = Pos::new(x, y);
            let (s, mut style) = match board.view(pos).unwrap_or(CellView::Hidden) {
                CellView::Hidden => (glyphs.hidden.to_string(), Style::default().fg(p.hidden_fg).bg(p.board_bg)),
                CellView::Flagged => (glyphs.flag.to_string(), Style::default().fg(p.flag_fg).bg(p.board_bg)),
                CellView::Mine => (glyphs.mine.to_string(), Style::default().fg(p.mine_fg).bg(p.open_bg)),
                CellView::Open(0) => (" ".to_string(), Style::default().bg(p.open_bg)),
                CellView::Open(n) => (
                    n.to_string(),
                    Style::default().fg(p.number(n)).bg(p.open_bg).add_modifier(Modifier::BOLD),
                ),
            };
            if ui.cursor == pos && !game.menu_open() && !session.phase().is_terminal() {
                style = style.bg(p.cursor_bg);
            }
            spans.push(Span::styled(format!(" {}", s), style));
        }
        // right-side padding uses the board background
        spans.push(Span::styled(" ", Style::default().bg(p.board_bg)));
        lines.push(Spans::from(spans));
    }
    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(lang.diff_name(session.difficulty()))
            .title_alignment(Alignment::Center),
    );
    f.render_widget(paragraph, board_area);

    // modals
    ui.menu_rect = None;
    if game.menu_open() {
        let mrect = center_rect(60, 8, size);
        ui.menu_rect = Some(mrect);
        let mut lines = vec![Spans::from(Span::raw(""))];
        for d in Difficulty::ALL {
            let c = d.config();
            let text = format!(
                " {}  {}  {}x{}  {}  {} ",
                d.to_index() + 1,
                lang.diff_name(d),
                c.width,
                c.height,
                fill(a.diff_mines_fmt, &[&c.mines]),
                record_text(cfg, lang, d),
            );
            let style = if d.to_index() == ui.menu_hover {
                Style::default().bg(p.cursor_bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Spans::from(Span::styled(text, style)));
        }
        lines.push(Spans::from(Span::raw("")));
        lines.push(Spans::from(Span::styled(format!(" {}", a.diff_hint), key_style)));
        f.render_widget(Clear, mrect);
        f.render_widget(
            Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title(a.menu_difficulty)),
            mrect,
        );
    } else if ui.showing_help {
        let hrect = center_rect(44, a.help_lines.len() as u16 + 3, size);
        let mut lines: Vec<Spans> = a.help_lines.iter().map(|l| Spans::from(Span::raw(*l))).collect();
        lines.insert(0, Spans::from(Span::raw("")));
        f.render_widget(Clear, hrect);
        f.render_widget(
            Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title(a.help_title)),
            hrect,
        );
    }
}

fn record_text(cfg: &Config, lang: &Lang, d: Difficulty) -> String {
    match cfg.get_record_detail(d) {
        Some((secs, date)) => fill(lang.assets.rec_best_fmt, &[&secs, &lang.format_date(&date)]),
        None => lang.assets.rec_no_record.to_string(),
    }
}

fn best_time_text(cfg: &Config, lang: &Lang, d: Difficulty) -> String {
    if cfg.get_record(d).is_some() {
        record_text(cfg, lang, d)
    } else {
        String::new()
    }
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width - width) / 2;
    let y = r.y + (r.height - height) / 2;
    Rect::new(x, y, width, height)
}
