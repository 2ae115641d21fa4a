//! App: terminal init, main loop, fixed-rate ticks and key handling.

use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, ClearFlash};
use anyhow::Result;
use blockfall::{Command, Engine};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on the wait for input between redraws.
const FRAME_MS: u64 = 16;

pub struct App {
    engine: Engine,
    theme: Theme,
    tick_interval: Duration,
    last_tick: Instant,
    flash: ClearFlash,
}

impl App {
    pub fn new(engine: Engine, theme: Theme, tick_rate: f64) -> Self {
        Self {
            engine,
            theme,
            tick_interval: Duration::from_secs_f64(1.0 / tick_rate),
            last_tick: Instant::now(),
            flash: ClearFlash::default(),
        }
    }

    /// Hand one command to the engine and start a line-clear fade if it locked a piece
    /// that completed rows.
    fn dispatch(&mut self, command: Command) {
        let had_piece = self.engine.active_piece().is_some();
        let was_paused = self.engine.is_paused();
        self.engine.apply(command);
        if command == Command::Reset && !was_paused {
            self.flash = ClearFlash::default();
            return;
        }
        let locked = had_piece && self.engine.active_piece().is_none();
        if locked && !self.engine.last_cleared_rows().is_empty() {
            debug!(rows = ?self.engine.last_cleared_rows(), "flash cleared rows");
            self.flash.start(self.engine.last_cleared_rows());
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.engine.stop(),
            // After game over only restart is accepted.
            Action::Engine(cmd) if self.engine.is_over() && cmd != Command::Reset => {}
            Action::Engine(cmd) => self.dispatch(cmd),
            Action::None => {}
        }
    }

    /// Gravity step when the tick interval has elapsed. Stops once the game is over.
    fn tick_if_due(&mut self, now: Instant) {
        if self.engine.is_over() || self.engine.is_paused() {
            self.last_tick = now;
            return;
        }
        if now.duration_since(self.last_tick) >= self.tick_interval {
            self.last_tick = now;
            self.dispatch(Command::Tick);
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size},
        };

        let (cols, rows) = size()?;
        let (need_cols, need_rows) =
            ui::required_terminal_size(self.engine.grid().width(), self.engine.grid().height());
        if cols < need_cols || rows < need_rows {
            warn!(cols, rows, need_cols, need_rows, "terminal smaller than the board");
        }

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        info!("session started");

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        info!("session ended");

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_tick = Instant::now();
        while self.engine.is_running() {
            let now = Instant::now();
            let snap = self.engine.snapshot();
            terminal.draw(|f| ui::draw(f, &snap, &self.theme, &mut self.flash, now))?;

            let until_tick = self.tick_interval.saturating_sub(self.last_tick.elapsed());
            let timeout = until_tick.min(Duration::from_millis(FRAME_MS));
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        self.handle_action(key_to_action(key));
                    }
                }
            }

            self.tick_if_due(Instant::now());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockfall::{Cell, EngineConfig, Grid, ShapeKind};

    fn app_with(engine: Engine) -> App {
        App::new(engine, Theme::default(), 10.0)
    }

    #[test]
    fn test_quit_stops_engine() {
        let mut app = app_with(Engine::new(EngineConfig::default(), Some(1)).unwrap());
        app.handle_action(Action::Quit);
        assert!(!app.engine.is_running());
    }

    #[test]
    fn test_tick_due_spawns_then_falls() {
        let mut app = app_with(Engine::new(EngineConfig::default(), Some(1)).unwrap());
        let start = app.last_tick;
        app.tick_if_due(start + Duration::from_millis(100));
        assert!(app.engine.active_piece().is_some());
        app.tick_if_due(start + Duration::from_millis(150));
        assert_eq!(app.engine.active_piece().unwrap().y, 0);
        app.tick_if_due(start + Duration::from_millis(200));
        assert_eq!(app.engine.active_piece().unwrap().y, 1);
    }

    #[test]
    fn test_hard_drop_clearing_rows_starts_flash() {
        let mut grid = Grid::new(10, 20).unwrap();
        for x in 0..10 {
            if x != 3 {
                grid.set(x, 19, Cell::Filled);
            }
        }
        let mut engine = Engine::with_grid(grid);
        engine.spawn_kind(ShapeKind::I);
        // Vertical I dropped into the hole at column 3.
        assert!(engine.rotate_piece());
        let mut app = app_with(engine);
        app.handle_action(Action::Engine(Command::HardDrop));
        assert!(app.flash.is_active());
        app.handle_action(Action::Engine(Command::Reset));
        assert!(!app.flash.is_active());
    }

    #[test]
    fn test_reset_while_paused_keeps_flash() {
        let mut grid = Grid::new(10, 20).unwrap();
        for x in 0..10 {
            if x != 3 {
                grid.set(x, 19, Cell::Filled);
            }
        }
        let mut engine = Engine::with_grid(grid);
        engine.spawn_kind(ShapeKind::I);
        assert!(engine.rotate_piece());
        let mut app = app_with(engine);
        app.handle_action(Action::Engine(Command::HardDrop));
        app.handle_action(Action::Engine(Command::PauseToggle));
        app.handle_action(Action::Engine(Command::Reset));
        assert!(app.flash.is_active());
        assert_eq!(app.engine.grid().filled_count(), 3);
    }

    #[test]
    fn test_game_over_accepts_only_reset() {
        let mut grid = Grid::new(10, 20).unwrap();
        grid.set(0, 0, Cell::Filled);
        let mut engine = Engine::with_grid(grid);
        engine.check_death();
        engine.spawn_kind(ShapeKind::O);
        let mut app = app_with(engine);
        app.handle_action(Action::Engine(Command::HardDrop));
        assert!(app.engine.active_piece().is_some());
        app.handle_action(Action::Engine(Command::Reset));
        assert!(!app.engine.is_over());
        assert!(app.engine.active_piece().is_none());
    }
}
