// Board grid model
// Owns the cells, deferred mine placement, neighbor counts and flood-fill reveal

use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

/// A grid coordinate (column, row)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Errors raised while building a board or placing its mines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    EmptyBoard { width: usize, height: usize },
    NoMines,
    TooManyMines { mines: usize, available: usize },
    MinesAlreadyPlaced,
    MineOutOfBounds(Pos),
    DuplicateMine(Pos),
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::EmptyBoard { width, height } => {
                write!(f, "board must have at least one cell (got {}x{})", width, height)
            }
            BoardError::NoMines => write!(f, "board must contain at least one mine"),
            BoardError::TooManyMines { mines, available } => write!(
                f,
                "{} mines do not fit: only {} cells remain outside the first-click zone",
                mines, available
            ),
            BoardError::MinesAlreadyPlaced => write!(f, "mines have already been placed on this board"),
            BoardError::MineOutOfBounds(pos) => write!(f, "mine at {} lies outside the board", pos),
            BoardError::DuplicateMine(pos) => write!(f, "mine at {} is listed twice", pos),
        }
    }
}

impl Error for BoardError {}

/// Board dimensions and mine count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl BoardConfig {
    /// Validate a configuration so that mine placement can never fail in play:
    /// the mines must fit outside the largest possible first-click zone.
    pub fn new(width: usize, height: usize, mines: usize) -> Result<Self, BoardError> {
        let config = BoardConfig { width, height, mines };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.width == 0 || self.height == 0 {
            return Err(BoardError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }
        if self.mines == 0 {
            return Err(BoardError::NoMines);
        }
        let available = self.cells() - self.max_exclusion();
        if self.mines > available {
            return Err(BoardError::TooManyMines {
                mines: self.mines,
                available,
            });
        }
        Ok(())
    }

    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Size of the largest clipped 3x3 zone a first click can exclude
    pub fn max_exclusion(&self) -> usize {
        self.width.min(3) * self.height.min(3)
    }
}

/// A single cell on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    has_mine: bool,
    revealed: bool,
    flagged: bool,
    neighbor_mines: u8, // 0-8, valid once mines are placed
}

impl Cell {
    pub fn has_mine(&self) -> bool {
        self.has_mine
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    pub fn neighbor_mines(&self) -> u8 {
        self.neighbor_mines
    }

    /// What a player is allowed to see of this cell
    pub fn view(&self) -> CellView {
        if self.revealed {
            if self.has_mine {
                CellView::Mine
            } else {
                CellView::Open(self.neighbor_mines)
            }
        } else if self.flagged {
            CellView::Flagged
        } else {
            CellView::Hidden
        }
    }
}

/// Render projection of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Mine,
    Open(u8),
}

/// Result of revealing a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Continue,
    Mine,
}

#[derive(Debug, Clone)]
pub struct Board {
    config: BoardConfig,
    cells: Vec<Cell>, // row-major, y * width + x
    mines_placed: bool,
}

impl Board {
    /// Allocate an empty board; mines are placed later by `place_mines`
    pub fn new(config: BoardConfig) -> Self {
        Board {
            config,
            cells: vec![Cell::default(); config.cells()],
            mines_placed: false,
        }
    }

    /// Build a board with a fixed mine layout, bypassing randomness
    pub fn with_mines(width: usize, height: usize, mines: &[Pos]) -> Result<Self, BoardError> {
        if width == 0 || height == 0 {
            return Err(BoardError::EmptyBoard { width, height });
        }
        let mut board = Board::new(BoardConfig {
            width,
            height,
            mines: mines.len(),
        });
        for &pos in mines {
            let idx = board.index(pos).ok_or(BoardError::MineOutOfBounds(pos))?;
            if board.cells[idx].has_mine {
                return Err(BoardError::DuplicateMine(pos));
            }
            board.cells[idx].has_mine = true;
        }
        board.mines_placed = true;
        board.calculate_neighbor_counts();
        Ok(board)
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn mine_count(&self) -> usize {
        self.config.mines
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    /// Convert a position to a flat index, None when out of bounds
    pub fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x < self.config.width && pos.y < self.config.height {
            Some(pos.y * self.config.width + pos.x)
        } else {
            None
        }
    }

    fn pos_of(&self, idx: usize) -> Pos {
        Pos::new(idx % self.config.width, idx / self.config.width)
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn view(&self, pos: Pos) -> Option<CellView> {
        self.cell(pos).map(Cell::view)
    }

    /// All cells with their positions, row by row
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (self.pos_of(i), c))
    }

    /// Chebyshev-adjacent positions, clipped at the edges; never includes `pos` itself
    pub fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        let (w, h) = (self.config.width, self.config.height);
        let xs = pos.x.saturating_sub(1)..=(pos.x + 1).min(w.saturating_sub(1));
        let ys = pos.y.saturating_sub(1)..=(pos.y + 1).min(h.saturating_sub(1));
        ys.flat_map(move |y| xs.clone().map(move |x| Pos::new(x, y)))
            .filter(move |p| *p != pos && p.x < w && p.y < h)
    }

    /// The clipped 3x3 neighborhood centered on `pos`, including `pos`
    pub fn exclusion_zone(&self, pos: Pos) -> Vec<Pos> {
        if self.index(pos).is_none() {
            return Vec::new();
        }
        let mut zone = vec![pos];
        zone.extend(self.neighbors(pos));
        zone
    }

    /// Place the configured number of mines uniformly at random outside `excluded`
    /// and compute neighbor counts. May run only once per board.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, excluded: &[Pos], rng: &mut R) -> Result<(), BoardError> {
        if self.mines_placed {
            return Err(BoardError::MinesAlreadyPlaced);
        }
        let mut blocked = vec![false; self.cells.len()];
        for &pos in excluded {
            if let Some(i) = self.index(pos) {
                blocked[i] = true;
            }
        }
        let candidates: Vec<usize> = (0..self.cells.len()).filter(|&i| !blocked[i]).collect();
        if self.config.mines > candidates.len() {
            return Err(BoardError::TooManyMines {
                mines: self.config.mines,
                available: candidates.len(),
            });
        }
        for &i in candidates.choose_multiple(rng, self.config.mines) {
            self.cells[i].has_mine = true;
        }
        self.mines_placed = true;
        self.calculate_neighbor_counts();
        debug!(
            "placed {} mines on {}x{} board ({} cells excluded)",
            self.config.mines,
            self.config.width,
            self.config.height,
            self.cells.len() - candidates.len()
        );
        Ok(())
    }

    /// Store the adjacent mine count on every non-mine cell
    pub fn calculate_neighbor_counts(&mut self) {
        for i in 0..self.cells.len() {
            if self.cells[i].has_mine {
                continue;
            }
            let pos = self.pos_of(i);
            let count = self
                .neighbors(pos)
                .filter(|&p| self.cells[p.y * self.config.width + p.x].has_mine)
                .count();
            self.cells[i].neighbor_mines = count as u8;
        }
    }

    /// Reveal a cell, expanding through zero-count cells with a work-list
    pub fn reveal(&mut self, pos: Pos) -> RevealOutcome {
        let Some(start) = self.index(pos) else {
            return RevealOutcome::Continue;
        };
        let cell = self.cells[start];
        if cell.revealed || cell.flagged {
            return RevealOutcome::Continue;
        }
        self.cells[start].revealed = true;
        if cell.has_mine {
            return RevealOutcome::Mine;
        }
        if cell.neighbor_mines != 0 {
            return RevealOutcome::Continue;
        }

        let mut queued = vec![false; self.cells.len()];
        queued[start] = true;
        let mut work = VecDeque::from([pos]);
        let mut opened = 1usize;
        while let Some(cur) = work.pop_front() {
            for next in self.neighbors(cur) {
                let i = next.y * self.config.width + next.x;
                if queued[i] {
                    continue;
                }
                queued[i] = true;
                let c = &mut self.cells[i];
                if c.revealed || c.flagged {
                    continue;
                }
                // a zero cell has no mine neighbors, so nothing reached here is a mine
                c.revealed = true;
                opened += 1;
                if c.neighbor_mines == 0 {
                    work.push_back(next);
                }
            }
        }
        trace!("flood fill from {} opened {} cells", pos, opened);
        RevealOutcome::Continue
    }

    /// Flip the flag on a hidden cell. Returns whether anything changed.
    pub fn toggle_flag(&mut self, pos: Pos) -> bool {
        match self.index(pos) {
            Some(i) if !self.cells[i].revealed => {
                self.cells[i].flagged = !self.cells[i].flagged;
                true
            }
            _ => false,
        }
    }

    pub fn reveal_all_mines(&mut self) {
        for c in self.cells.iter_mut().filter(|c| c.has_mine) {
            c.revealed = true;
        }
    }

    pub fn flag_all_mines(&mut self) {
        for c in self.cells.iter_mut().filter(|c| c.has_mine && !c.revealed) {
            c.flagged = true;
        }
    }

    /// True when every non-mine cell has been revealed
    pub fn is_cleared(&self) -> bool {
        self.cells.iter().all(|c| c.has_mine || c.revealed)
    }

    pub fn flag_count(&self) -> usize {
        self.cells.iter().filter(|c| c.flagged).count()
    }

    pub fn revealed_count(&self) -> usize {
        self.cells.iter().filter(|c| c.revealed).count()
    }

    /// Mine counter display value; negative when too many flags are placed
    pub fn remaining_mines(&self) -> isize {
        self.config.mines as isize - self.flag_count() as isize
    }
}
