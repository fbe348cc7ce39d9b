//! Level construction and reachability validation
//!
//! A level pattern is a grid of single-character codes:
//! `N` normal, `H` hard, `U` unbreakable, `X` empty.
//!
//! Before a level is handed to the simulation every destructible block must
//! be reachable from the bottom edge through cells that are not Unbreakable
//! (8-connected). Walled-off blocks are opened up by demoting the nearest
//! Unbreakable block to Normal, then the grid is re-checked.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::state::{Block, BlockKind};
use crate::tuning::Tuning;

/// Errors raised while turning a pattern into a playable level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    /// The level catalog has no entries
    NoLevels,
    /// Pattern has no rows or an empty first row
    EmptyPattern,
    /// A row's length differs from the first row
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// A character outside `N`, `H`, `U`, `X`
    UnknownCode { row: usize, col: usize, code: char },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NoLevels => write!(f, "level catalog is empty"),
            LevelError::EmptyPattern => write!(f, "level pattern has no cells"),
            LevelError::RaggedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "level pattern row {} has {} cells, expected {}",
                row, found, expected
            ),
            LevelError::UnknownCode { row, col, code } => write!(
                f,
                "unknown block code '{}' at row {}, column {}",
                code, row, col
            ),
        }
    }
}

impl std::error::Error for LevelError {}

/// A named level layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelPattern {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelPattern {
    pub fn new(name: &str, rows: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            rows: rows.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// The built-in level catalog
pub fn default_catalog() -> Vec<LevelPattern> {
    vec![
        LevelPattern::new(
            "Classic",
            &["UXXXXXXU", "HHHHHHHH", "NNNNNNNN", "NNNNNNNN", "NNNNNNNN"],
        ),
        LevelPattern::new(
            "Fortress",
            &["UHHHHHHU", "HNNNNNNH", "HNNNNNNH", "HNNNNNNH", "UHHHHHHU"],
        ),
        LevelPattern::new(
            "Labyrinth",
            &["UNUNUNUN", "NUNUNUNU", "UNUNUNUN", "NUNUNUNU", "UNUNUNUN"],
        ),
    ]
}

/// Offsets of the 8 neighbors (orthogonal first, then diagonal)
const NEIGHBORS8: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Rectangular grid of optional blocks, row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGrid {
    pub rows: usize,
    pub cols: usize,
    cells: Vec<Option<BlockKind>>,
}

impl LevelGrid {
    /// Parse pattern rows into a grid
    pub fn parse<S: AsRef<str>>(pattern: &[S]) -> Result<Self, LevelError> {
        let rows = pattern.len();
        let cols = pattern.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(LevelError::EmptyPattern);
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in pattern.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != cols {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: cols,
                    found,
                });
            }
            for (col, code) in line.chars().enumerate() {
                let cell = match code {
                    'N' => Some(BlockKind::Normal),
                    'H' => Some(BlockKind::Hard),
                    'U' => Some(BlockKind::Unbreakable),
                    'X' => None,
                    _ => return Err(LevelError::UnknownCode { row, col, code }),
                };
                cells.push(cell);
            }
        }

        Ok(Self { rows, cols, cells })
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> Option<BlockKind> {
        self.cells[self.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Option<BlockKind>) {
        let i = self.index(row, col);
        self.cells[i] = cell;
    }

    /// A ball can travel through empty cells and destructible blocks
    pub fn is_passable(&self, row: usize, col: usize) -> bool {
        self.get(row, col) != Some(BlockKind::Unbreakable)
    }

    fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        NEIGHBORS8.iter().filter_map(move |&(dr, dc)| {
            let r = row.checked_add_signed(dr)?;
            let c = col.checked_add_signed(dc)?;
            (r < self.rows && c < self.cols).then_some((r, c))
        })
    }

    /// Multi-source BFS from every passable bottom-row cell
    ///
    /// Returns a row-major mask of cells a ball can reach from below.
    pub fn reachable_mask(&self) -> Vec<bool> {
        let mut reached = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();

        let bottom = self.rows - 1;
        for col in 0..self.cols {
            if self.is_passable(bottom, col) {
                reached[self.index(bottom, col)] = true;
                queue.push_back((bottom, col));
            }
        }

        while let Some((row, col)) = queue.pop_front() {
            for (r, c) in self.neighbors(row, col) {
                let i = self.index(r, c);
                if reached[i] || !self.is_passable(r, c) {
                    continue;
                }
                reached[i] = true;
                queue.push_back((r, c));
            }
        }

        reached
    }

    /// Destructible blocks no ball can reach, in row-major order
    pub fn unreachable_blocks(&self) -> Vec<(usize, usize)> {
        let reached = self.reachable_mask();
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let destructible = self.get(row, col).is_some_and(|k| k.is_destructible());
                if destructible && !reached[self.index(row, col)] {
                    out.push((row, col));
                }
            }
        }
        out
    }

    /// Nearest Unbreakable cell to `from` by 8-connected BFS over the whole grid
    pub fn nearest_unbreakable(&self, from: (usize, usize)) -> Option<(usize, usize)> {
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([from]);
        seen[self.index(from.0, from.1)] = true;

        while let Some((row, col)) = queue.pop_front() {
            if (row, col) != from && self.get(row, col) == Some(BlockKind::Unbreakable) {
                return Some((row, col));
            }
            for (r, c) in self.neighbors(row, col) {
                let i = self.index(r, c);
                if !seen[i] {
                    seen[i] = true;
                    queue.push_back((r, c));
                }
            }
        }

        None
    }

    /// Demote Unbreakable blocks until every destructible block is reachable
    ///
    /// Each pass demotes the nearest Unbreakable cell of every unreachable
    /// block, then re-verifies. Every pass removes at least one Unbreakable
    /// cell, so the loop ends with a fully reachable grid.
    pub fn repair(&mut self) -> RepairReport {
        let mut demoted = 0;
        let mut passes = 0;

        loop {
            let unreachable = self.unreachable_blocks();
            if unreachable.is_empty() {
                break;
            }
            passes += 1;

            let mut demoted_this_pass = 0;
            for target in unreachable {
                let Some((row, col)) = self.nearest_unbreakable(target) else {
                    continue;
                };
                // Two targets may share the same nearest wall
                if self.get(row, col) == Some(BlockKind::Unbreakable) {
                    log::debug!(
                        "Demoting unbreakable block at ({}, {}) to open ({}, {})",
                        row,
                        col,
                        target.0,
                        target.1
                    );
                    self.set(row, col, Some(BlockKind::Normal));
                    demoted_this_pass += 1;
                }
            }

            demoted += demoted_this_pass;
            if demoted_this_pass == 0 {
                break;
            }
        }

        let unreachable = self.unreachable_blocks().len();
        if unreachable > 0 {
            log::warn!(
                "{} blocks remain unreachable after {} repair passes",
                unreachable,
                passes
            );
        }

        RepairReport {
            demoted,
            passes,
            unreachable,
        }
    }
}

/// Summary of a reachability repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairReport {
    /// Unbreakable blocks turned into Normal blocks
    pub demoted: usize,
    pub passes: usize,
    /// Destructible blocks still unreachable afterward
    pub unreachable: usize,
}

/// A validated level ready to play
#[derive(Debug, Clone)]
pub struct BuiltLevel {
    pub blocks: Vec<Block>,
    pub repaired: usize,
}

/// Parse, validate and lay out a level
///
/// Blocks get consecutive ids starting at `first_id`, in row-major order,
/// and are centered horizontally in the field.
pub fn build_level<S: AsRef<str>, R: Rng + ?Sized>(
    pattern: &[S],
    tuning: &Tuning,
    rng: &mut R,
    first_id: u32,
) -> Result<BuiltLevel, LevelError> {
    let mut grid = LevelGrid::parse(pattern)?;
    let report = grid.repair();

    let pitch_x = tuning.block_width + tuning.block_padding;
    let pitch_y = tuning.block_height + tuning.block_padding;
    let left = (tuning.field_width - grid.cols as f32 * pitch_x) / 2.0;

    let mut blocks = Vec::new();
    let mut id = first_id;
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let Some(kind) = grid.get(row, col) else {
                continue;
            };
            let rect = Rect::new(
                left + col as f32 * pitch_x,
                tuning.block_top_offset + row as f32 * pitch_y,
                tuning.block_width,
                tuning.block_height,
            );
            let color = kind.pick_color(rng);
            blocks.push(Block::new(id, kind, rect, color));
            id += 1;
        }
    }

    Ok(BuiltLevel {
        blocks,
        repaired: report.demoted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid(rows: &[&str]) -> LevelGrid {
        LevelGrid::parse(rows).expect("valid pattern")
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(LevelGrid::parse::<&str>(&[]), Err(LevelError::EmptyPattern));
        assert_eq!(LevelGrid::parse(&[""]), Err(LevelError::EmptyPattern));
        assert_eq!(
            LevelGrid::parse(&["NNN", "NN"]),
            Err(LevelError::RaggedRow {
                row: 1,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            LevelGrid::parse(&["NNN", "NQN"]),
            Err(LevelError::UnknownCode {
                row: 1,
                col: 1,
                code: 'Q'
            })
        );
    }

    #[test]
    fn test_catalog_is_fully_reachable() {
        for level in default_catalog() {
            let g = LevelGrid::parse(level.rows.as_slice()).expect("valid pattern");
            assert!(g.unreachable_blocks().is_empty(), "{} has unreachable blocks", level.name);
        }
    }

    #[test]
    fn test_no_destructible_blocks_is_trivially_valid() {
        let mut g = grid(&["UUU", "XXX"]);
        assert!(g.unreachable_blocks().is_empty());
        assert_eq!(g.repair().demoted, 0);
    }

    #[test]
    fn test_destructible_blocks_are_passable() {
        // Top block reached through the hard blocks beneath it
        let g = grid(&["UNU", "UHU", "UHU"]);
        assert!(g.unreachable_blocks().is_empty());
    }

    #[test]
    fn test_diagonal_gap_counts() {
        // Only a diagonal opening between the walls
        let g = grid(&["NUU", "UXU", "UUX"]);
        assert!(g.unreachable_blocks().is_empty());
    }

    #[test]
    fn test_walled_block_is_repaired() {
        let mut g = grid(&["XXXXX", "XUUUX", "XUNUX", "XUUUX", "UUUUU"]);
        assert_eq!(g.unreachable_blocks(), vec![(2, 2)]);

        let report = g.repair();
        assert!(report.demoted >= 1);
        assert_eq!(report.unreachable, 0);
        assert!(g.unreachable_blocks().is_empty());
        // Nearest wall is an orthogonal neighbor, found first
        assert_eq!(g.get(1, 2), Some(BlockKind::Normal));
    }

    #[test]
    fn test_nearest_unbreakable_skips_self() {
        let g = grid(&["U", "X", "N"]);
        assert_eq!(g.nearest_unbreakable((2, 0)), Some((0, 0)));
        let g = grid(&["N", "X"]);
        assert_eq!(g.nearest_unbreakable((0, 0)), None);
    }

    #[test]
    fn test_build_level_layout() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let built = build_level(&["NXH", "UNN"], &tuning, &mut rng, 10).expect("valid level");

        assert_eq!(built.repaired, 0);
        assert_eq!(built.blocks.len(), 5);
        let ids: Vec<u32> = built.blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![10, 11, 12, 13, 14]);

        // 3 columns of 70px pitch centered in 800px: left = 295
        let first = &built.blocks[0];
        assert_eq!(first.rect, Rect::new(295.0, 50.0, 60.0, 20.0));
        let hard = &built.blocks[1];
        assert_eq!(hard.kind, BlockKind::Hard);
        assert_eq!(hard.rect.x, 435.0);
        assert_eq!(hard.health, 2);
        let wall = &built.blocks[2];
        assert_eq!(wall.kind, BlockKind::Unbreakable);
        assert_eq!(wall.rect.y, 80.0);
    }

    #[test]
    fn test_build_level_rejects_bad_code() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        assert!(matches!(
            build_level(&["N?"], &tuning, &mut rng, 1),
            Err(LevelError::UnknownCode { code: '?', .. })
        ));
    }

    fn arb_grid() -> impl Strategy<Value = Vec<String>> {
        (1usize..10, 1usize..12).prop_flat_map(|(rows, cols)| {
            proptest::collection::vec(
                proptest::collection::vec(
                    prop_oneof![
                        3 => Just('U'),
                        2 => Just('N'),
                        1 => Just('H'),
                        2 => Just('X'),
                    ],
                    cols,
                )
                .prop_map(|cells| cells.into_iter().collect::<String>()),
                rows,
            )
        })
    }

    proptest! {
        #[test]
        fn prop_repair_makes_every_block_reachable(pattern in arb_grid()) {
            let mut g = LevelGrid::parse(pattern.as_slice()).unwrap();
            let report = g.repair();
            prop_assert_eq!(report.unreachable, 0);
            prop_assert!(g.unreachable_blocks().is_empty());
        }

        #[test]
        fn prop_repair_only_demotes_unbreakable(pattern in arb_grid()) {
            let original = LevelGrid::parse(pattern.as_slice()).unwrap();
            let mut g = original.clone();
            g.repair();
            for row in 0..g.rows {
                for col in 0..g.cols {
                    let before = original.get(row, col);
                    let after = g.get(row, col);
                    if before != after {
                        prop_assert_eq!(before, Some(BlockKind::Unbreakable));
                        prop_assert_eq!(after, Some(BlockKind::Normal));
                    }
                }
            }
        }
    }
}
