//! Layout and drawing: playfield, sidebar, pause and game-over overlays, line-clear flash.

use crate::theme::Theme;
use blockfall::{Cell, Snapshot};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each grid cell is two terminal columns wide so the board looks square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;
const SIDEBAR_WIDTH: u16 = 26;

/// Duration of the fade over rows that were just cleared.
const LINE_CLEAR_FADE_MS: u32 = 250;

/// Line-clear fade state, owned by the app and advanced on every draw.
#[derive(Default)]
pub struct ClearFlash {
    rows: Vec<usize>,
    effect: Option<Effect>,
    last_process: Option<Instant>,
}

impl ClearFlash {
    /// Begin a new fade over `rows` (grid row indices), replacing any running one.
    pub fn start(&mut self, rows: &[usize]) {
        self.rows = rows.to_vec();
        self.effect = None;
        self.last_process = None;
    }

    pub fn is_active(&self) -> bool {
        !self.rows.is_empty()
    }

    fn finish(&mut self) {
        self.rows.clear();
        self.effect = None;
        self.last_process = None;
    }
}

/// Terminal cells spanned by `cells` board cells of `per_cell` each, saturating at `u16::MAX`.
fn span(cells: usize, per_cell: u16) -> u16 {
    u16::try_from(cells).unwrap_or(u16::MAX).saturating_mul(per_cell)
}

/// Playfield size in terminal cells including the border.
fn playfield_outer_size(snap: &Snapshot) -> (u16, u16) {
    (
        span(snap.width, CELL_WIDTH).saturating_add(2),
        span(snap.height, CELL_HEIGHT).saturating_add(2),
    )
}

/// Smallest terminal (cols, rows) that fits board + sidebar.
pub fn required_terminal_size(width: usize, height: usize) -> (u16, u16) {
    (
        span(width, CELL_WIDTH).saturating_add(2 + SIDEBAR_WIDTH),
        span(height, CELL_HEIGHT).saturating_add(2),
    )
}

/// Playfield outer rect and sidebar rect, centred in `area`.
fn game_layout(area: Rect, snap: &Snapshot) -> (Rect, Rect) {
    let (pw, ph) = playfield_outer_size(snap);
    let total_w = pw.saturating_add(SIDEBAR_WIDTH);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Board rect (inside the border) for `area`; matches `draw_playfield`.
fn board_rect(area: Rect, snap: &Snapshot) -> Rect {
    let (playfield, _) = game_layout(area, snap);
    Rect {
        x: playfield.x + 1,
        y: playfield.y + 1,
        width: span(snap.width, CELL_WIDTH).min(playfield.width.saturating_sub(2)),
        height: span(snap.height, CELL_HEIGHT).min(playfield.height.saturating_sub(2)),
    }
}

/// Draw the whole screen for one snapshot.
pub fn draw(frame: &mut Frame, snap: &Snapshot, theme: &Theme, flash: &mut ClearFlash, now: Instant) {
    let area = frame.area();
    let (playfield, sidebar) = game_layout(area, snap);
    draw_playfield(frame, snap, theme, playfield);
    draw_sidebar(frame, snap, theme, sidebar);
    if flash.is_active() {
        apply_line_clear_effect(frame, snap, theme, area, flash, now);
    }
    if snap.over {
        draw_game_over(frame, theme, playfield);
    } else if snap.paused {
        draw_pause_overlay(frame, theme, playfield);
    }
}

fn draw_playfield(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board = Rect {
        width: span(snap.width, CELL_WIDTH).min(inner.width),
        height: span(snap.height, CELL_HEIGHT).min(inner.height),
        ..inner
    };
    let buf = frame.buffer_mut();
    for row in 0..snap.height {
        for col in 0..snap.width {
            let color = if snap.is_active_at(col as i32, row as i32) {
                Some(theme.active)
            } else {
                match snap.cell_at(row, col) {
                    Some(Cell::Filled) => Some(theme.filled),
                    _ => None,
                }
            };
            let x0 = board.x.saturating_add(span(col, CELL_WIDTH));
            let y = board.y.saturating_add(span(row, CELL_HEIGHT));
            for x in x0..x0.saturating_add(CELL_WIDTH) {
                if x >= board.x + board.width || y >= board.y + board.height {
                    continue;
                }
                let cell = &mut buf[(x, y)];
                match color {
                    Some(c) => {
                        cell.set_symbol("█").set_style(Style::default().fg(c).bg(theme.bg));
                    }
                    None => {
                        // Faint dot on the left half only, so empty space reads as a grid.
                        let symbol = if x == x0 { "·" } else { " " };
                        cell.set_symbol(symbol)
                            .set_style(Style::default().fg(theme.div_line).bg(theme.bg));
                    }
                }
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let hint_style = Style::default().fg(theme.inactive_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Status
            Constraint::Length(1), // gap
            Constraint::Length(11), // Controls
        ])
        .split(area);

    let status = if snap.over {
        Span::styled("Game over", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    } else if snap.paused {
        Span::styled("Paused", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Playing", fg_style)
    };
    let piece = snap
        .active_kind
        .map(|k| k.to_string())
        .unwrap_or_else(|| "-".to_string());
    let status_lines = vec![
        Line::from(vec![Span::styled("State: ", title_style), status]),
        Line::from(vec![
            Span::styled("Piece: ", title_style),
            Span::styled(piece, fg_style),
        ]),
        Line::from(vec![
            Span::styled("Board: ", title_style),
            Span::styled(format!("{}x{}", snap.width, snap.height), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Filled: ", title_style),
            Span::styled(
                snap.cells.iter().filter(|c| c.is_filled()).count().to_string(),
                fg_style,
            ),
        ]),
    ];
    Paragraph::new(status_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Status ", title_style)),
        )
        .render(chunks[0], frame.buffer_mut());

    let controls = [
        ("←/→ h/l", "Move"),
        ("↑ k", "Rotate"),
        ("↓ j", "Soft drop"),
        ("Space", "Hard drop"),
        ("Esc p", "Pause"),
        ("r", "Reset"),
        ("q", "Quit"),
    ];
    let control_lines: Vec<Line> = controls
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(format!("{keys:<9}"), fg_style),
                Span::styled(*what, hint_style),
            ])
        })
        .collect();
    Paragraph::new(control_lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Controls ", title_style)),
        )
        .render(chunks[2], frame.buffer_mut());
}

/// Buffer positions covered by the given grid rows.
fn row_buffer_positions(board: Rect, rows: &[usize]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &row in rows {
        let y = board.y.saturating_add(span(row, CELL_HEIGHT));
        if y >= board.y + board.height {
            continue;
        }
        for x in board.x..board.x + board.width {
            set.insert((x, y));
        }
    }
    set
}

/// Create or advance the fade over just-cleared rows; drop it once done.
fn apply_line_clear_effect(
    frame: &mut Frame,
    snap: &Snapshot,
    theme: &Theme,
    area: Rect,
    flash: &mut ClearFlash,
    now: Instant,
) {
    let board = board_rect(area, snap);
    let delta = flash
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.last_process = Some(now);

    if flash.effect.is_none() {
        let positions = row_buffer_positions(board, &flash.rows);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(theme.flash, theme.flash, (LINE_CLEAR_FADE_MS, Interpolation::Linear))
            .with_filter(filter)
            .with_area(board);
        flash.effect = Some(effect);
    }

    let done = match flash.effect.as_mut() {
        Some(effect) => {
            frame.render_effect(effect, board, TfxDuration::from_millis(delta_ms));
            effect.done()
        }
        None => true,
    };
    if done {
        flash.finish();
    }
}

fn centered_popup(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 20, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled(" Esc — Resume ", Style::default().fg(theme.main_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 20, 6);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R — Restart  Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall::{Engine, EngineConfig, ShapeKind};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_required_terminal_size() {
        assert_eq!(required_terminal_size(10, 20), (48, 22));
    }

    #[test]
    fn test_required_terminal_size_saturates_for_huge_boards() {
        assert_eq!(required_terminal_size(40_000, 20), (u16::MAX, 22));
        assert_eq!(required_terminal_size(10, usize::MAX), (48, u16::MAX));
    }

    #[test]
    fn test_row_buffer_positions_cover_full_rows() {
        let board = Rect::new(1, 1, 20, 20);
        let set = row_buffer_positions(board, &[0, 19, 25]);
        assert_eq!(set.len(), 40);
        assert!(set.contains(&(1, 1)));
        assert!(set.contains(&(20, 20)));
    }

    #[test]
    fn test_draw_shows_active_piece_and_status() {
        let mut engine = Engine::new(EngineConfig::default(), Some(3)).unwrap();
        engine.spawn_kind(ShapeKind::O);
        let snap = engine.snapshot();
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        let mut flash = ClearFlash::default();
        terminal
            .draw(|f| draw(f, &snap, &Theme::default(), &mut flash, Instant::now()))
            .unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Blockfall"));
        assert!(text.contains("Playing"));
        assert_eq!(text.matches('█').count(), 8);
    }

    #[test]
    fn test_draw_pause_overlay() {
        let mut engine = Engine::new(EngineConfig::default(), Some(3)).unwrap();
        engine.pause_toggle();
        let snap = engine.snapshot();
        let mut terminal = Terminal::new(TestBackend::new(60, 24)).unwrap();
        let mut flash = ClearFlash::default();
        terminal
            .draw(|f| draw(f, &snap, &Theme::default(), &mut flash, Instant::now()))
            .unwrap();
        assert!(buffer_text(&terminal).contains("Paused"));
    }
}
