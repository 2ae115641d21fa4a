//! Board engine: active piece, gravity, locking, line clears, pause/reset lifecycle.
//!
//! The engine never blocks and never fails during play. Rejected moves and rotations are
//! silent no-ops; the only terminal condition is the `death` flag, which the caller observes.

use crate::error::GridError;
use crate::grid::{Cell, Grid};
use crate::shape::{Shape, ShapeKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

pub const DEFAULT_WIDTH: usize = 10;
pub const DEFAULT_HEIGHT: usize = 20;

/// Column of the bounding-box origin for freshly spawned pieces (row is always 0).
pub const SPAWN_COLUMN: i32 = 3;

/// `check_death_zone` sets the death flag once its counter reaches this value.
const DEATH_ZONE_LIMIT: u32 = 2;

/// Which death check, if any, runs after every lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeathCheck {
    /// Death checks are callable but never run automatically.
    #[default]
    Off,
    /// Run `check_death` after each lock.
    TopRow,
    /// Run `check_death_zone` after each lock.
    Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    pub spawn_column: i32,
    pub death_check: DeathCheck,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            spawn_column: SPAWN_COLUMN,
            death_check: DeathCheck::Off,
        }
    }
}

/// The falling piece: shape plus bounding-box origin in grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: ShapeKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl ActivePiece {
    /// Absolute (grid_x, grid_y) of every occupied sub-cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .cells()
            .map(move |(px, py)| (self.x + px, self.y + py))
    }
}

/// Full mutable state owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub grid: Grid,
    pub active: Option<ActivePiece>,
    pub running: bool,
    pub paused: bool,
    pub death: bool,
    pub death_zone_counter: u32,
}

impl GameState {
    fn new(grid: Grid) -> Self {
        Self {
            grid,
            active: None,
            running: true,
            paused: false,
            death: false,
            death_zone_counter: 0,
        }
    }
}

/// Discrete inputs accepted from the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    Reset,
    PauseToggle,
    Tick,
}

/// Read-only copy of everything a renderer needs, taken between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    /// Row-major: cells[row * width + col].
    pub cells: Vec<Cell>,
    pub active: Vec<(i32, i32)>,
    pub active_kind: Option<ShapeKind>,
    pub paused: bool,
    pub over: bool,
    /// Rows removed by the most recent lock (indices before compaction).
    pub cleared_rows: Vec<usize>,
}

impl Snapshot {
    pub fn cell_at(&self, row: usize, col: usize) -> Option<Cell> {
        (row < self.height && col < self.width).then(|| self.cells[row * self.width + col])
    }

    pub fn is_active_at(&self, col: i32, row: i32) -> bool {
        self.active.contains(&(col, row))
    }
}

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    state: GameState,
    rng: StdRng,
    last_cleared: Vec<usize>,
}

impl Engine {
    /// New engine with an empty grid. `seed` makes the spawn sequence reproducible.
    pub fn new(config: EngineConfig, seed: Option<u64>) -> Result<Self, GridError> {
        let grid = Grid::new(config.width, config.height)?;
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            state: GameState::new(grid),
            rng,
            last_cleared: Vec::new(),
        })
    }

    /// Engine starting from prepared terrain; other settings are defaults.
    pub fn with_grid(grid: Grid) -> Self {
        let config = EngineConfig {
            width: grid.width(),
            height: grid.height(),
            ..EngineConfig::default()
        };
        Self {
            config,
            state: GameState::new(grid),
            rng: StdRng::from_entropy(),
            last_cleared: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.state.grid
    }

    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.state.active.as_ref()
    }

    // --- Lifecycle ---

    /// Pick a shape uniformly at random and place it at the spawn position.
    pub fn spawn_piece(&mut self) {
        let kind = ShapeKind::ALL[self.rng.gen_range(0..ShapeKind::ALL.len())];
        self.spawn_kind(kind);
    }

    /// Place `kind` at the spawn position. The spawn cells are not checked against terrain;
    /// an overlap is only noticed by the next move or tick.
    pub fn spawn_kind(&mut self, kind: ShapeKind) {
        let piece = ActivePiece {
            kind,
            shape: kind.shape(),
            x: self.config.spawn_column,
            y: 0,
        };
        debug!(%kind, x = piece.x, y = piece.y, "spawn");
        self.state.active = Some(piece);
    }

    /// Back to construction-time state: empty grid, no piece, running, unpaused, alive.
    pub fn reset(&mut self) {
        self.state.grid.clear();
        self.state.active = None;
        self.state.running = true;
        self.state.paused = false;
        self.state.death = false;
        self.state.death_zone_counter = 0;
        self.last_cleared.clear();
        info!("reset");
    }

    pub fn pause_toggle(&mut self) {
        self.state.paused = !self.state.paused;
        info!(paused = self.state.paused, "pause toggled");
    }

    /// Ask the front end to stop; nothing else changes.
    pub fn stop(&mut self) {
        self.state.running = false;
    }

    // --- Validity ---

    /// True if every occupied sub-cell of `shape` (default: the active shape) at origin (x, y)
    /// lies inside the side walls, above the floor, and on an empty cell. Rows above the top
    /// are not rejected. With no shape and no active piece the answer is false.
    pub fn is_valid_position(&self, x: i32, y: i32, shape: Option<&Shape>) -> bool {
        let shape = match shape.or_else(|| self.state.active.as_ref().map(|p| &p.shape)) {
            Some(s) => s,
            None => return false,
        };
        let width = self.state.grid.width() as i32;
        let height = self.state.grid.height() as i32;
        shape.cells().all(|(px, py)| {
            let gx = x + px;
            let gy = y + py;
            if gx < 0 || gx >= width || gy >= height {
                return false;
            }
            if gy < 0 {
                return true;
            }
            !matches!(self.state.grid.get_signed(gx, gy), Some(Cell::Filled))
        })
    }

    // --- Movement ---

    /// Shift the active piece by (dx, dy). A failed step with `dy == 1` locks the piece;
    /// any other failure is ignored. Returns true if the piece moved.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        if self.state.paused {
            return false;
        }
        let (x, y) = match &self.state.active {
            Some(p) => (p.x + dx, p.y + dy),
            None => return false,
        };
        if self.is_valid_position(x, y, None) {
            if let Some(p) = self.state.active.as_mut() {
                p.x = x;
                p.y = y;
            }
            trace!(x, y, "move");
            return true;
        }
        if dy == 1 {
            self.lock_piece();
        }
        false
    }

    /// Rotate the active piece 90° clockwise in place. No kicks: a blocked rotation is dropped.
    pub fn rotate_piece(&mut self) -> bool {
        if self.state.paused {
            return false;
        }
        let (rotated, x, y) = match &self.state.active {
            Some(p) => (p.shape.rotated_cw(), p.x, p.y),
            None => return false,
        };
        if !self.is_valid_position(x, y, Some(&rotated)) {
            return false;
        }
        if let Some(p) = self.state.active.as_mut() {
            p.shape = rotated;
        }
        true
    }

    /// Fall until the next row down is blocked, then lock (even if no step was taken).
    pub fn hard_drop(&mut self) {
        if self.state.paused {
            return;
        }
        while let Some((x, y)) = self.state.active.as_ref().map(|p| (p.x, p.y)) {
            if !self.is_valid_position(x, y + 1, None) {
                break;
            }
            self.move_piece(0, 1);
        }
        self.lock_piece();
    }

    /// One gravity step, or a spawn when there is no active piece.
    pub fn tick(&mut self) {
        if self.state.paused {
            return;
        }
        if self.state.active.is_none() {
            self.spawn_piece();
        } else {
            self.move_piece(0, 1);
        }
    }

    /// Dispatch one command. While paused only `PauseToggle` gets through.
    pub fn apply(&mut self, command: Command) {
        if self.state.paused && command != Command::PauseToggle {
            return;
        }
        match command {
            Command::MoveLeft => {
                self.move_piece(-1, 0);
            }
            Command::MoveRight => {
                self.move_piece(1, 0);
            }
            Command::SoftDrop => {
                self.move_piece(0, 1);
            }
            Command::Rotate => {
                self.rotate_piece();
            }
            Command::HardDrop => self.hard_drop(),
            Command::Reset => self.reset(),
            Command::PauseToggle => self.pause_toggle(),
            Command::Tick => self.tick(),
        }
    }

    // --- Locking and clearing ---

    /// Write the active piece into the grid, clear full rows, and leave no active piece.
    pub fn lock_piece(&mut self) {
        let piece = match self.state.active.take() {
            Some(p) => p,
            None => return,
        };
        for (gx, gy) in piece.cells() {
            if gx >= 0 && gy >= 0 {
                self.state.grid.set(gx as usize, gy as usize, Cell::Filled);
            }
        }
        debug!(kind = %piece.kind, x = piece.x, y = piece.y, "lock");
        self.clear_lines();
        match self.config.death_check {
            DeathCheck::Off => {}
            DeathCheck::TopRow => {
                self.check_death();
            }
            DeathCheck::Zone => self.check_death_zone(),
        }
    }

    /// Remove all full rows and pad the top with empty rows. Returns how many were removed.
    pub fn clear_lines(&mut self) -> usize {
        self.last_cleared = self.state.grid.clear_full_rows();
        if !self.last_cleared.is_empty() {
            debug!(rows = ?self.last_cleared, "lines cleared");
        }
        self.last_cleared.len()
    }

    // --- Death checks ---

    /// True if any cell in the top row is filled; sets the death flag when it is.
    pub fn check_death(&mut self) -> bool {
        let topped_out = self.state.grid.row_has_filled(0);
        if topped_out && !self.state.death {
            info!("death: top row occupied");
            self.state.death = true;
        }
        topped_out
    }

    /// Scan the top row left to right: each filled cell bumps the counter, the first empty
    /// cell resets it to zero and ends the scan. Death once the counter reaches the limit.
    pub fn check_death_zone(&mut self) {
        for x in 0..self.state.grid.width() {
            if matches!(self.state.grid.get(x, 0), Some(Cell::Filled)) {
                self.state.death_zone_counter += 1;
            } else {
                self.state.death_zone_counter = 0;
                break;
            }
        }
        if self.state.death_zone_counter >= DEATH_ZONE_LIMIT && !self.state.death {
            info!(counter = self.state.death_zone_counter, "death: zone limit reached");
            self.state.death = true;
        }
    }

    // --- Queries ---

    pub fn cell_at(&self, row: usize, col: usize) -> Option<Cell> {
        self.state.grid.get(col, row)
    }

    pub fn active_piece_cells(&self) -> Vec<(i32, i32)> {
        self.state
            .active
            .as_ref()
            .map(|p| p.cells().collect())
            .unwrap_or_default()
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_over(&self) -> bool {
        self.state.death
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn death_zone_counter(&self) -> u32 {
        self.state.death_zone_counter
    }

    pub fn last_cleared_rows(&self) -> &[usize] {
        &self.last_cleared
    }

    pub fn snapshot(&self) -> Snapshot {
        let grid = &self.state.grid;
        Snapshot {
            width: grid.width(),
            height: grid.height(),
            cells: grid.rows().flat_map(|row| row.iter().copied()).collect(),
            active: self.active_piece_cells(),
            active_kind: self.state.active.as_ref().map(|p| p.kind),
            paused: self.state.paused,
            over: self.state.death,
            cleared_rows: self.last_cleared.clone(),
        }
    }
}
