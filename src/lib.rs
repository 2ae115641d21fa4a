//! Blockfall: a falling-block puzzle engine.
//!
//! [`Engine`] owns the grid and the active piece and accepts discrete [`Command`]s; a front end
//! drives it with a fixed-rate `Tick` and renders from [`Snapshot`]s.

pub mod engine;
pub mod error;
pub mod grid;
pub mod shape;

pub use engine::{ActivePiece, Command, DeathCheck, Engine, EngineConfig, GameState, Snapshot};
pub use error::{GridError, ShapeError};
pub use grid::{Cell, Grid};
pub use shape::{Shape, ShapeKind};
