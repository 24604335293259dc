use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use arrayvec::ArrayVec;
use enumset::{EnumSet, EnumSetType, enum_set};
use rand::Rng as _;

use crate::{
    core::{ActivePiece, Board, Cell, ColorIndex, PieceCatalog, Rotation, Tetrimino},
    engine::{
        clock::{Clock, MonotonicClock},
        piece_buffer::{EngineSeed, LOOKAHEAD, PieceBuffer},
        score_board::ScoreBoard,
    },
};

/// Player commands accepted by [`Simulation::act`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateClockwise,
    RotateCounterClockwise,
    /// One immediate gravity step; also restarts the gravity timer.
    SoftDrop,
    /// Starts the animated descent to the ghost position.
    HardDrop,
    /// Swaps the falling piece with the hold slot, once per piece.
    Hold,
}

/// Persistent conditions of the simulation.
#[derive(EnumSetType, Debug)]
pub enum StateFlag {
    /// The falling piece cannot descend any further.
    Grounded,
    /// Hold has been used since the last lock-in.
    HoldUsed,
    /// The game ended on a spawn collision. Never cleared.
    Halted,
    /// The hard-drop descent animation is running.
    HardDropping,
    /// The line-clear animation is running.
    ClearingLines,
}

/// One-shot change notifications accumulated between [`Simulation::tick`]
/// calls and drained by the next one.
#[derive(EnumSetType, Debug)]
pub enum UpdateFlag {
    /// Something visible moved; the host should repaint.
    NeedRedraw,
    /// Score, combo, level, or line totals changed.
    ScoreChanged,
    /// A new piece entered the board.
    PieceSpawned,
    /// A freshly spawned piece collided; the game is over.
    GameOver,
    /// The hold slot was exercised.
    PieceHeld,
}

/// What a visible cell looks like right now.
///
/// [`Simulation::cell_at`] composes the locked grid with the falling piece
/// and its ghost, so a renderer needs no knowledge of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Empty,
    /// Preview of where the falling piece would land.
    Ghost,
    Filled(ColorIndex),
}

/// States during which player input is refused and gravity is suspended.
const SUSPENDED: EnumSet<StateFlag> =
    enum_set!(StateFlag::Halted | StateFlag::HardDropping | StateFlag::ClearingLines);

/// Extra time a grounded piece gets before it locks, regardless of level.
const GROUNDED_GRACE: Duration = Duration::from_millis(1000);

/// Offset sequence per axis for the rotation kick neighborhood: in place
/// first, then the negative step, then the positive one.
const KICK_ORDER: [i32; 3] = [0, -1, 1];

/// The falling-block game as a poll-driven state machine.
///
/// The simulation never blocks and never spawns threads. The host forwards
/// input through [`Self::act`] and calls [`Self::tick`] at a steady cadence;
/// `tick` advances gravity and the hard-drop and line-clear animations by at
/// most one step each, and returns the accumulated [`UpdateFlag`] set.
///
/// Time comes from an injected [`Clock`], which defaults to the wall clock;
/// pieces come from a [`PieceBuffer`] seeded randomly or explicitly.
#[derive(Debug, Clone)]
pub struct Simulation<C = MonotonicClock> {
    catalog: Arc<PieceCatalog>,
    board: Board,
    buffer: PieceBuffer,
    scores: ScoreBoard,
    piece: ActivePiece,
    ghost_row: i32,
    last_fall: Instant,
    state: EnumSet<StateFlag>,
    updates: EnumSet<UpdateFlag>,
    pending_rows: ArrayVec<usize, 4>,
    wipe_column: usize,
    clock: C,
}

impl Simulation {
    /// Starts a game over the given catalog with an entropy seed.
    #[must_use]
    pub fn new(catalog: Arc<PieceCatalog>) -> Self {
        Self::with_seed(catalog, rand::rng().random())
    }

    /// Like [`Self::new`], but with a seed for a reproducible piece sequence.
    #[must_use]
    pub fn with_seed(catalog: Arc<PieceCatalog>, seed: EngineSeed) -> Self {
        Self::with_clock(catalog, seed, MonotonicClock)
    }
}

impl<C: Clock> Simulation<C> {
    /// Like [`Self::with_seed`], but reading time from `clock`.
    #[must_use]
    pub fn with_clock(catalog: Arc<PieceCatalog>, seed: EngineSeed, clock: C) -> Self {
        let buffer = PieceBuffer::with_seed(catalog.len(), seed);
        let last_fall = clock.now();
        let mut this = Self {
            catalog,
            board: Board::new(),
            buffer,
            scores: ScoreBoard::new(),
            piece: ActivePiece::new(0, 0, 0),
            ghost_row: 0,
            last_fall,
            state: EnumSet::empty(),
            updates: EnumSet::empty(),
            pending_rows: ArrayVec::new(),
            wipe_column: 0,
            clock,
        };
        let first = this.buffer.pop_next();
        this.spawn(first);
        this
    }

    /// Applies a player action to the falling piece.
    ///
    /// Returns whether the action took effect. Movement and rotation report
    /// whether the piece actually moved; [`Action::HardDrop`] and
    /// [`Action::Hold`] always succeed when input is accepted at all. While
    /// the game is over or an animation is running, every action is refused.
    pub fn act(&mut self, action: Action) -> bool {
        if !self.state.is_disjoint(SUSPENDED) {
            return false;
        }

        let moved = match action {
            Action::MoveLeft => self.try_shift(-1),
            Action::MoveRight => self.try_shift(1),
            Action::RotateClockwise => self.try_rotation(self.piece.rotation.clockwise()),
            Action::RotateCounterClockwise => {
                self.try_rotation(self.piece.rotation.counter_clockwise())
            }
            Action::SoftDrop => {
                self.last_fall = self.clock.now();
                self.try_descend()
            }
            Action::HardDrop => {
                self.state.insert(StateFlag::HardDropping);
                true
            }
            Action::Hold => {
                self.hold_piece();
                true
            }
        };

        self.refresh_grounded();
        if action == Action::SoftDrop && !moved {
            self.finalize();
        }
        self.update_ghost();
        moved
    }

    /// Advances time-driven behavior by at most one step and drains the
    /// accumulated update set.
    ///
    /// Gravity runs only while no animation is active and the game is not
    /// over. The hard-drop animation descends one row per call; the
    /// line-clear animation wipes one column per call across all completed
    /// rows, then collapses them and applies the scores.
    pub fn tick(&mut self) -> EnumSet<UpdateFlag> {
        let now = self.clock.now();

        if self.state.is_disjoint(SUSPENDED) {
            let threshold = if self.state.contains(StateFlag::Grounded) {
                GROUNDED_GRACE
            } else {
                self.scores.gravity_interval()
            };
            if now.duration_since(self.last_fall) >= threshold {
                self.act(Action::SoftDrop);
            }
        }

        if self.state.contains(StateFlag::HardDropping) {
            if self.piece.y < self.ghost_row {
                self.piece.y += 1;
                self.updates.insert(UpdateFlag::NeedRedraw);
            } else {
                self.state.remove(StateFlag::HardDropping);
                self.act(Action::SoftDrop);
            }
        }

        if self.state.contains(StateFlag::ClearingLines) {
            if self.wipe_column > 0 {
                self.wipe_column -= 1;
                for &row in &self.pending_rows {
                    self.board.clear_cell(row, self.wipe_column);
                }
            } else {
                for &row in &self.pending_rows {
                    self.board.collapse_row(row);
                }
                #[expect(clippy::cast_possible_truncation)]
                self.scores.record_clear(self.pending_rows.len() as u32);
                self.pending_rows.clear();
                self.state.remove(StateFlag::ClearingLines);
                self.updates.insert(UpdateFlag::ScoreChanged);
                self.update_ghost();
            }
            self.updates.insert(UpdateFlag::NeedRedraw);
        }

        std::mem::take(&mut self.updates)
    }

    /// What the given visible cell looks like, falling piece and ghost
    /// included. The falling piece wins over its own ghost where they
    /// overlap.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is outside the visible board.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn cell_at(&self, row: usize, col: usize) -> CellView {
        let shape = self.catalog.piece(self.piece.type_id);
        let dx = col as i32 - self.piece.x;

        let dy = row as i32 - self.piece.y;
        if dy >= 0
            && dx >= 0
            && shape.occupies(self.piece.rotation, dy as usize, dx as usize)
        {
            return CellView::Filled(shape.color());
        }

        let ghost_dy = row as i32 - self.ghost_row;
        if ghost_dy >= 0
            && dx >= 0
            && shape.occupies(self.piece.rotation, ghost_dy as usize, dx as usize)
        {
            return CellView::Ghost;
        }

        match self.board.cell(row, col) {
            Cell::Empty => CellView::Empty,
            Cell::Filled(color) => CellView::Filled(color),
        }
    }

    /// The `n`-th upcoming piece, `0` being the next to spawn.
    ///
    /// # Panics
    ///
    /// Panics if `n >= LOOKAHEAD`.
    #[must_use]
    pub fn incoming(&self, n: usize) -> &Tetrimino {
        assert!(n < LOOKAHEAD);
        self.catalog.piece(self.buffer.peek(n))
    }

    /// The held piece, `None` until the first hold of the game.
    #[must_use]
    pub fn held(&self) -> Option<&Tetrimino> {
        self.buffer.held().map(|type_id| self.catalog.piece(type_id))
    }

    /// The piece currently falling.
    #[must_use]
    pub fn falling_piece(&self) -> &ActivePiece {
        &self.piece
    }

    #[must_use]
    pub fn state(&self) -> EnumSet<StateFlag> {
        self.state
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<PieceCatalog> {
        &self.catalog
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.scores.score()
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.scores.level()
    }

    #[must_use]
    pub fn combo(&self) -> u32 {
        self.scores.combo()
    }

    #[must_use]
    pub fn finished_lines(&self) -> u32 {
        self.scores.finished_lines()
    }

    #[must_use]
    pub fn completed_pieces(&self) -> usize {
        self.scores.completed_pieces()
    }

    #[must_use]
    pub fn line_clear_counter(&self) -> &[usize; 5] {
        self.scores.line_clear_counter()
    }

    fn try_shift(&mut self, dx: i32) -> bool {
        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(self.piece.type_id);
        if self
            .board
            .fits(shape, self.piece.x + dx, self.piece.y, self.piece.rotation)
        {
            self.piece.x += dx;
            self.updates.insert(UpdateFlag::NeedRedraw);
            true
        } else {
            false
        }
    }

    fn try_descend(&mut self) -> bool {
        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(self.piece.type_id);
        if self
            .board
            .fits(shape, self.piece.x, self.piece.y + 1, self.piece.rotation)
        {
            self.piece.y += 1;
            self.updates.insert(UpdateFlag::NeedRedraw);
            true
        } else {
            false
        }
    }

    /// Rotates in place if possible, otherwise kicks the piece to the first
    /// fitting cell of the surrounding 3×3 neighborhood. The current row is
    /// swept before the rows above and below it, so a piece squeezed against
    /// a wall slides sideways before it climbs.
    fn try_rotation(&mut self, rotation: Rotation) -> bool {
        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(self.piece.type_id);
        for dy in KICK_ORDER {
            for dx in KICK_ORDER {
                if self
                    .board
                    .fits(shape, self.piece.x + dx, self.piece.y + dy, rotation)
                {
                    self.piece.x += dx;
                    self.piece.y += dy;
                    self.piece.rotation = rotation;
                    self.updates.insert(UpdateFlag::NeedRedraw);
                    return true;
                }
            }
        }
        false
    }

    fn hold_piece(&mut self) {
        if self.state.contains(StateFlag::HoldUsed) {
            return;
        }
        let next = self.buffer.hold(self.piece.type_id);
        self.spawn(next);
        self.state.insert(StateFlag::HoldUsed);
        self.updates.insert(UpdateFlag::PieceHeld);
    }

    /// Locks the falling piece, queues up the line-clear animation if it
    /// completed any rows, and spawns the next piece.
    fn finalize(&mut self) {
        self.state.remove(StateFlag::HoldUsed);

        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(self.piece.type_id);
        self.board.fill_piece(shape, &self.piece);

        let rows = self.board.completed_rows();
        self.scores.record_piece(rows.len());
        if rows.is_empty() {
            self.scores.reset_combo();
        } else {
            self.pending_rows = rows;
            self.wipe_column = Board::WIDTH;
            self.state.insert(StateFlag::ClearingLines);
        }
        self.updates.insert(UpdateFlag::ScoreChanged);

        let next = self.buffer.pop_next();
        self.spawn(next);
    }

    /// Puts a fresh piece at its spawn position, centered horizontally and
    /// straddling the top edge. A collision right at spawn ends the game.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn spawn(&mut self, type_id: usize) {
        self.state.remove(StateFlag::Grounded);

        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(type_id);
        let dim = shape.dim() as i32;
        self.piece = ActivePiece::new(type_id, (Board::WIDTH as i32 - dim) / 2, -(dim / 2));
        self.updates.insert(UpdateFlag::PieceSpawned);
        self.updates.insert(UpdateFlag::NeedRedraw);

        if !self
            .board
            .fits(shape, self.piece.x, self.piece.y, self.piece.rotation)
        {
            self.state.insert(StateFlag::Halted);
            self.updates.insert(UpdateFlag::GameOver);
        }
        self.update_ghost();
    }

    fn refresh_grounded(&mut self) {
        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(self.piece.type_id);
        let grounded = !self
            .board
            .fits(shape, self.piece.x, self.piece.y + 1, self.piece.rotation);
        if grounded {
            self.state.insert(StateFlag::Grounded);
        } else {
            self.state.remove(StateFlag::Grounded);
        }
    }

    /// Recomputes where the falling piece would land. The ghost row is the
    /// lowest legal row at the piece's current column and rotation, and is
    /// never above the piece itself.
    fn update_ghost(&mut self) {
        let catalog = Arc::clone(&self.catalog);
        let shape = catalog.piece(self.piece.type_id);
        let mut row = self.piece.y;
        while self
            .board
            .fits(shape, self.piece.x, row + 1, self.piece.rotation)
        {
            row += 1;
        }
        self.ghost_row = row;
    }
}
