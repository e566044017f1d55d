// Board state and cascade resolution
//
// The board is a fixed rows x cols grid of cells stored row-major. Every cell
// has a critical mass equal to its number of orthogonal neighbours; a cell
// holding at least that many orbs explodes, emptying itself and pushing one
// orb of its color into each neighbour, capturing it.

use log::debug;
use std::collections::VecDeque;
use std::fmt;

use crate::error::{EngineError, IllegalMoveReason, SnapshotError};
use crate::simple_profiler::ProfileGuard;
use crate::types::{Cell, Color, Position};

pub const MIN_DIMENSION: usize = 2;
pub const MAX_DIMENSION: usize = 32;

/// Explosion budget per cell for a single cascade before it is treated as a fault
pub const DEFAULT_CASCADE_STEPS_PER_CELL: usize = 64;

/// Neighbour offsets in visiting order: up, right, down, left
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// Result of a legal placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    /// Number of explosions the placement set off
    pub explosions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
    cascade_steps_per_cell: usize,
}

impl Board {
    /// Creates an empty board
    pub fn new(rows: usize, cols: usize) -> Result<Self, EngineError> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&rows)
            || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&cols)
        {
            return Err(EngineError::InvalidDimensions { rows, cols });
        }

        Ok(Board {
            rows,
            cols,
            cells: vec![Cell::EMPTY; rows * cols],
            cascade_steps_per_cell: DEFAULT_CASCADE_STEPS_PER_CELL,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Overrides the per-cell explosion budget used to detect runaway cascades
    pub fn set_cascade_steps_per_cell(&mut self, steps: usize) {
        self.cascade_steps_per_cell = steps.max(1);
    }

    /// Empties every cell, keeping dimensions and the explosion budget
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(Cell::clear);
    }

    /// Maximum explosions a single cascade may perform on this board
    pub fn explosion_limit(&self) -> usize {
        self.cascade_steps_per_cell * self.cells.len()
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    fn position_of(&self, idx: usize) -> Position {
        Position::new(idx / self.cols, idx % self.cols)
    }

    /// Number of orthogonal neighbours of a position: 2 in corners, 3 on
    /// edges, 4 inside. Depends only on the position and the dimensions.
    pub fn critical_mass(&self, row: usize, col: usize) -> u32 {
        critical_mass_for(self.rows, self.cols, row, col)
    }

    fn critical_mass_idx(&self, idx: usize) -> u32 {
        let pos = self.position_of(idx);
        self.critical_mass(pos.row, pos.col)
    }

    pub fn is_corner(&self, row: usize, col: usize) -> bool {
        self.critical_mass(row, col) == 2
    }

    pub fn is_edge(&self, row: usize, col: usize) -> bool {
        self.critical_mass(row, col) == 3
    }

    fn neighbor_indices(&self, idx: usize) -> [Option<usize>; 4] {
        let pos = self.position_of(idx);
        let mut out = [None; 4];
        for (slot, (dr, dc)) in out.iter_mut().zip(NEIGHBOR_OFFSETS.iter()) {
            let row = pos.row as isize + dr;
            let col = pos.col as isize + dc;
            if row >= 0 && col >= 0 {
                *slot = self.index(row as usize, col as usize);
            }
        }
        out
    }

    fn is_critical_idx(&self, idx: usize) -> bool {
        let cell = self.cells[idx];
        !cell.is_empty() && cell.orbs() >= self.critical_mass_idx(idx)
    }

    /// Cell at a position, `None` when out of bounds
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.index(row, col).map(|idx| self.cells[idx])
    }

    /// Owner of a cell; out-of-bounds positions read as empty
    pub fn owner(&self, row: usize, col: usize) -> Option<Color> {
        self.cell(row, col).and_then(|c| c.owner())
    }

    /// Orb count of a cell; out-of-bounds positions read as zero
    pub fn orb_count(&self, row: usize, col: usize) -> u32 {
        self.cell(row, col).map(|c| c.orbs()).unwrap_or(0)
    }

    /// Iterates over all cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (Position, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (self.position_of(idx), *cell))
    }

    /// Total orbs owned by a color
    pub fn score(&self, color: Color) -> u32 {
        self.cells
            .iter()
            .filter(|c| c.owner() == Some(color))
            .map(|c| c.orbs())
            .sum()
    }

    pub fn total_orbs(&self) -> u32 {
        self.cells.iter().map(|c| c.orbs()).sum()
    }

    /// Number of cells owned by each color, indexed by `Color::index`
    fn owned_cells(&self) -> [usize; 2] {
        let mut owned = [0usize; 2];
        for cell in &self.cells {
            if let Some(color) = cell.owner() {
                owned[color.index()] += 1;
            }
        }
        owned
    }

    /// A placement is legal on an empty cell or a cell already owned by `color`
    pub fn is_legal(&self, row: usize, col: usize, color: Color) -> bool {
        match self.cell(row, col) {
            Some(cell) => cell.owner().map_or(true, |owner| owner == color),
            None => false,
        }
    }

    /// All legal placements for `color` in row-major order
    pub fn legal_moves(&self, color: Color) -> Vec<Position> {
        let _guard = ProfileGuard::new("move_gen");
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.owner().map_or(true, |owner| owner == color))
            .map(|(idx, _)| self.position_of(idx))
            .collect()
    }

    /// Places one orb of `color` and resolves the resulting cascade.
    ///
    /// Illegal placements (out of bounds, opponent-owned target) are rejected
    /// before anything is touched. If the cascade exceeds the explosion limit
    /// the board is restored to its state before the call and
    /// `EngineError::CascadeLimit` is returned.
    pub fn place_orb(
        &mut self,
        row: usize,
        col: usize,
        color: Color,
    ) -> Result<Placement, EngineError> {
        let position = Position::new(row, col);
        let idx = self.index(row, col).ok_or(EngineError::IllegalMove {
            position,
            reason: IllegalMoveReason::OutOfBounds,
        })?;

        let cell = self.cells[idx];
        if let Some(owner) = cell.owner() {
            if owner != color {
                return Err(EngineError::IllegalMove {
                    position,
                    reason: IllegalMoveReason::OpponentOwned,
                });
            }
        }

        // A cascade cut short by elimination can leave critical cells behind;
        // they explode with the next placement.
        let will_explode = cell.orbs().saturating_add(1) >= self.critical_mass_idx(idx);
        if !will_explode && !(0..self.cells.len()).any(|i| self.is_critical_idx(i)) {
            self.cells[idx].add_orb(color);
            return Ok(Placement::default());
        }

        let saved = self.cells.clone();
        self.cells[idx].add_orb(color);

        let seeds: Vec<usize> = std::iter::once(idx)
            .chain((0..self.cells.len()).filter(|&i| i != idx && self.is_critical_idx(i)))
            .collect();

        match self.run_cascade(seeds) {
            Ok(explosions) => Ok(Placement { explosions }),
            Err(e) => {
                self.cells = saved;
                Err(e)
            }
        }
    }

    /// Explodes every critical cell (row-major discovery order) until the
    /// board settles. Returns the number of explosions.
    pub fn resolve_cascades(&mut self) -> Result<usize, EngineError> {
        let seeds: Vec<usize> = (0..self.cells.len())
            .filter(|&i| self.is_critical_idx(i))
            .collect();
        if seeds.is_empty() {
            return Ok(0);
        }

        let saved = self.cells.clone();
        self.run_cascade(seeds).map_err(|e| {
            self.cells = saved;
            e
        })
    }

    /// FIFO explosion loop. A cell is queued at most once at a time; cells
    /// that stopped being critical by the time they are popped are skipped.
    /// Resolution also stops as soon as the exploding color's opponent owns
    /// no cell: a single-colored board can only keep cycling.
    fn run_cascade(&mut self, seeds: Vec<usize>) -> Result<usize, EngineError> {
        let _guard = ProfileGuard::new("cascade");
        let limit = self.explosion_limit();

        let mut queued = vec![false; self.cells.len()];
        let mut queue = VecDeque::with_capacity(self.cells.len());
        for idx in seeds {
            if !queued[idx] && self.is_critical_idx(idx) {
                queued[idx] = true;
                queue.push_back(idx);
            }
        }

        let mut owned = self.owned_cells();
        let mut explosions = 0usize;

        while let Some(idx) = queue.pop_front() {
            queued[idx] = false;

            if !self.is_critical_idx(idx) {
                continue;
            }
            let color = match self.cells[idx].owner() {
                Some(color) => color,
                None => continue,
            };

            if explosions >= limit {
                return Err(EngineError::CascadeLimit { steps: explosions });
            }
            explosions += 1;

            self.cells[idx].clear();
            owned[color.index()] -= 1;

            let neighbors = self.neighbor_indices(idx);
            for neighbor in neighbors.into_iter().flatten() {
                let mass = self.critical_mass_idx(neighbor);
                let target = &mut self.cells[neighbor];

                match target.owner() {
                    Some(prev) if prev != color => {
                        owned[prev.index()] -= 1;
                        owned[color.index()] += 1;
                    }
                    None => owned[color.index()] += 1,
                    _ => {}
                }
                target.add_orb(color);

                if !queued[neighbor] && target.orbs() >= mass {
                    queued[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }

            if owned[color.opponent().index()] == 0 {
                debug!(
                    "Cascade stopped after {} explosions: {} owns the board",
                    explosions, color
                );
                break;
            }
        }

        Ok(explosions)
    }

    /// Overwrites a single cell without legality checks or cascades.
    ///
    /// Administrative: only snapshot loading goes through here.
    pub fn force_set_cell(
        &mut self,
        row: usize,
        col: usize,
        owner: Option<Color>,
        orbs: u32,
    ) -> Result<(), SnapshotError> {
        let position = Position::new(row, col);
        let idx = self
            .index(row, col)
            .ok_or(SnapshotError::OutOfBounds(position))?;
        let cell = Cell::new(owner, orbs).ok_or(SnapshotError::InconsistentCell {
            position,
            owner,
            orbs,
        })?;

        self.cells[idx] = cell;
        Ok(())
    }
}

/// Critical mass of `(row, col)` on a `rows x cols` grid
pub fn critical_mass_for(rows: usize, cols: usize, row: usize, col: usize) -> u32 {
    let mut neighbors = 0;
    if row > 0 {
        neighbors += 1;
    }
    if row + 1 < rows {
        neighbors += 1;
    }
    if col > 0 {
        neighbors += 1;
    }
    if col + 1 < cols {
        neighbors += 1;
    }
    neighbors
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            let line: Vec<String> = (0..self.cols)
                .map(|col| match self.cell(row, col) {
                    Some(cell) => match cell.owner() {
                        Some(color) => format!("{}{}", color.as_char(), cell.orbs()),
                        None => ".".to_string(),
                    },
                    None => ".".to_string(),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariant(board: &Board) {
        for (pos, cell) in board.cells() {
            assert_eq!(
                cell.orbs() == 0,
                cell.owner().is_none(),
                "owner/orb invariant broken at {}",
                pos
            );
        }
    }

    #[test]
    fn test_rejects_degenerate_dimensions() {
        assert!(Board::new(1, 6).is_err());
        assert!(Board::new(5, 0).is_err());
        assert!(Board::new(33, 6).is_err());
        assert!(Board::new(2, 2).is_ok());
    }

    #[test]
    fn test_critical_mass_by_position() {
        let board = Board::new(5, 6).unwrap();
        assert_eq!(board.critical_mass(0, 0), 2);
        assert_eq!(board.critical_mass(4, 5), 2);
        assert_eq!(board.critical_mass(0, 3), 3);
        assert_eq!(board.critical_mass(2, 0), 3);
        assert_eq!(board.critical_mass(2, 3), 4);
        assert!(board.is_corner(0, 5));
        assert!(board.is_edge(4, 2));
    }

    #[test]
    fn test_single_placement_does_not_explode() {
        let mut board = Board::new(5, 6).unwrap();
        let placement = board.place_orb(2, 2, Color::Red).unwrap();
        assert_eq!(placement.explosions, 0);
        assert_eq!(board.owner(2, 2), Some(Color::Red));
        assert_eq!(board.orb_count(2, 2), 1);
        assert_invariant(&board);
    }

    #[test]
    fn test_out_of_bounds_is_illegal() {
        let mut board = Board::new(5, 6).unwrap();
        let before = board.clone();
        let err = board.place_orb(5, 0, Color::Red).unwrap_err();
        assert_eq!(
            err,
            EngineError::IllegalMove {
                position: Position::new(5, 0),
                reason: IllegalMoveReason::OutOfBounds,
            }
        );
        assert_eq!(board, before);
    }

    #[test]
    fn test_corner_explosion_spreads_to_neighbors() {
        let mut board = Board::new(5, 6).unwrap();
        board.place_orb(0, 0, Color::Red).unwrap();
        board.place_orb(4, 5, Color::Blue).unwrap();
        let placement = board.place_orb(0, 0, Color::Red).unwrap();

        assert_eq!(placement.explosions, 1);
        assert_eq!(board.owner(0, 0), None);
        assert_eq!(board.orb_count(0, 1), 1);
        assert_eq!(board.orb_count(1, 0), 1);
        assert_eq!(board.owner(0, 1), Some(Color::Red));
        assert_eq!(board.owner(1, 0), Some(Color::Red));
        assert_invariant(&board);
    }

    #[test]
    fn test_cascade_limit_restores_board() {
        let mut board = Board::new(3, 3).unwrap();
        board.force_set_cell(0, 0, Some(Color::Red), 1).unwrap();
        board.force_set_cell(0, 1, Some(Color::Red), 2).unwrap();
        board.force_set_cell(2, 2, Some(Color::Blue), 1).unwrap();
        board.set_cascade_steps_per_cell(1);
        // limit is 9 explosions; a two-step chain fits
        assert!(board.clone().place_orb(0, 0, Color::Red).is_ok());

        let mut tight = board.clone();
        tight.cascade_steps_per_cell = 0;
        let before = tight.clone();
        let err = tight.place_orb(0, 0, Color::Red).unwrap_err();
        assert_eq!(err, EngineError::CascadeLimit { steps: 0 });
        assert_eq!(tight, before);
    }

    #[test]
    fn test_resolve_cascades_settles_loaded_board() {
        let mut board = Board::new(3, 3).unwrap();
        board.force_set_cell(0, 0, Some(Color::Red), 2).unwrap();
        board.force_set_cell(2, 2, Some(Color::Blue), 1).unwrap();
        let explosions = board.resolve_cascades().unwrap();
        assert_eq!(explosions, 1);
        assert_eq!(board.orb_count(0, 0), 0);
        assert_eq!(board.owner(0, 1), Some(Color::Red));
        assert_eq!(board.owner(1, 0), Some(Color::Red));
        assert_eq!(board.resolve_cascades().unwrap(), 0);
    }

    #[test]
    fn test_leftover_critical_cell_explodes_on_next_placement() {
        let mut board = Board::new(3, 3).unwrap();
        board.force_set_cell(0, 0, Some(Color::Red), 2).unwrap();
        let placement = board.place_orb(2, 2, Color::Blue).unwrap();

        assert_eq!(placement.explosions, 1);
        assert_eq!(board.owner(0, 0), None);
        assert_eq!(board.owner(0, 1), Some(Color::Red));
        assert_eq!(board.owner(2, 2), Some(Color::Blue));
        assert_invariant(&board);
    }

    #[test]
    fn test_force_set_cell_validates() {
        let mut board = Board::new(3, 3).unwrap();
        assert!(board.force_set_cell(0, 0, None, 2).is_err());
        assert!(board.force_set_cell(0, 0, Some(Color::Red), 0).is_err());
        assert!(board.force_set_cell(3, 0, Some(Color::Red), 1).is_err());
        assert!(board.force_set_cell(1, 1, Some(Color::Blue), 3).is_ok());
        assert_eq!(board.orb_count(1, 1), 3);
    }

    #[test]
    fn test_display_matches_console_notation() {
        let mut board = Board::new(2, 3).unwrap();
        board.place_orb(0, 1, Color::Red).unwrap();
        board.place_orb(1, 2, Color::Blue).unwrap();
        assert_eq!(board.to_string(), ". R1 .\n. . B1\n");
    }
}
