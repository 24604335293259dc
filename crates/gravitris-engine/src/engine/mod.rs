//! Gameplay orchestration on top of the core data structures.
//!
//! - [`Simulation`] - The poll-driven game state machine (`act` / `tick`)
//! - [`PieceBuffer`] - Look-ahead queue and hold slot
//! - [`EngineSeed`] - Seed for deterministic piece generation
//! - [`ScoreBoard`] - Lines, combo, level, score, and drop statistics
//! - [`Clock`] - Time source abstraction, injectable for tests
//!
//! # Game Flow
//!
//! The host owns the loop: it forwards player input through [`Simulation::act`]
//! and calls [`Simulation::tick`] at a steady cadence. `tick` advances gravity
//! and the drop and line-clear animations, and returns the set of changes the
//! host should react to (redraw, score change, game over, and so on).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use gravitris_engine::{Action, PieceCatalog, Simulation, UpdateFlag};
//!
//! let catalog = Arc::new(PieceCatalog::standard());
//! let mut sim = Simulation::new(Arc::clone(&catalog));
//!
//! sim.act(Action::MoveLeft);
//! sim.act(Action::HardDrop);
//!
//! let updates = sim.tick();
//! if updates.contains(UpdateFlag::GameOver) {
//!     println!("final score: {}", sim.score());
//! }
//! ```

pub use self::{clock::*, piece_buffer::*, score_board::*, simulation::*};

mod clock;
mod piece_buffer;
mod score_board;
mod simulation;
