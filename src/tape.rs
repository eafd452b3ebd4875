//! The memory tape.
//!
//! Cells are stored as `u32` and masked to the configured [`CellWidth`], so
//! one representation serves 8, 16 and 32 bit machines. The tape starts with
//! [`DEFAULT_TAPE_LEN`] zeroed cells and grows rightward by [`GROWTH_CHUNK`]
//! cells whenever the pointer reaches its end. Moving left of cell 0 is a
//! fault, never a growth trigger.

use std::fmt;
use std::str::FromStr;

/// Initial number of cells.
pub const DEFAULT_TAPE_LEN: usize = 30_000;

/// Number of zeroed cells appended each time the pointer runs off the end.
pub const GROWTH_CHUNK: usize = 30_000;

/// Width of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellWidth {
    #[default]
    Eight,
    Sixteen,
    ThirtyTwo,
}

impl CellWidth {
    pub fn bits(self) -> u32 {
        match self {
            CellWidth::Eight => 8,
            CellWidth::Sixteen => 16,
            CellWidth::ThirtyTwo => 32,
        }
    }

    /// Largest value a cell can hold, `2^bits - 1`.
    pub fn max(self) -> u32 {
        match self {
            CellWidth::Eight => u8::MAX as u32,
            CellWidth::Sixteen => u16::MAX as u32,
            CellWidth::ThirtyTwo => u32::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell width '{0}' (expected 8, 16 or 32)")]
pub struct InvalidCellWidth(pub String);

impl TryFrom<u32> for CellWidth {
    type Error = InvalidCellWidth;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(CellWidth::Eight),
            16 => Ok(CellWidth::Sixteen),
            32 => Ok(CellWidth::ThirtyTwo),
            other => Err(InvalidCellWidth(other.to_string())),
        }
    }
}

impl FromStr for CellWidth {
    type Err = InvalidCellWidth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u32>()
            .map_err(|_| InvalidCellWidth(trimmed.to_string()))
            .and_then(CellWidth::try_from)
    }
}

impl fmt::Display for CellWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// The pointer attempted to move left of cell 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pointer moved below cell 0 (ptr={ptr})")]
pub struct PointerUnderflow {
    /// The pointer value the move would have produced.
    pub ptr: isize,
}

/// A growable tape of fixed-width cells with a single data pointer.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u32>,
    pointer: usize,
    width: CellWidth,
    chunk: usize,
}

impl Tape {
    pub fn new(width: CellWidth) -> Self {
        Self::with_layout(width, DEFAULT_TAPE_LEN, GROWTH_CHUNK)
    }

    /// Create a tape with a custom initial length and growth chunk. Both are
    /// clamped to at least one cell.
    pub fn with_layout(width: CellWidth, initial_len: usize, chunk: usize) -> Self {
        Self {
            cells: vec![0; initial_len.max(1)],
            pointer: 0,
            width,
            chunk: chunk.max(1),
        }
    }

    pub fn move_right(&mut self) {
        self.pointer += 1;
        if self.pointer >= self.cells.len() {
            let grown = self.cells.len() + self.chunk;
            self.cells.resize(grown, 0);
        }
    }

    /// Move left; the pointer is left untouched when already at cell 0.
    pub fn move_left(&mut self) -> Result<(), PointerUnderflow> {
        if self.pointer == 0 {
            return Err(PointerUnderflow { ptr: -1 });
        }
        self.pointer -= 1;
        Ok(())
    }

    pub fn increment_cell(&mut self) {
        let max = self.width.max();
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1) & max;
    }

    pub fn decrement_cell(&mut self) {
        let max = self.width.max();
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1) & max;
    }

    pub fn read_cell(&self) -> u32 {
        self.cells[self.pointer]
    }

    /// Store `value` reduced modulo `2^bits`.
    pub fn write_cell(&mut self, value: u32) {
        self.cells[self.pointer] = value & self.width.max();
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn width(&self) -> CellWidth {
        self.width
    }

    /// The first `size` cells, or the whole tape if it is shorter.
    pub fn window(&self, size: usize) -> &[u32] {
        &self.cells[..size.min(self.cells.len())]
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(CellWidth::default())
    }
}
