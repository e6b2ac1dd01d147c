use bytemuck::{Pod, Zeroable};
use std::fmt;

use crate::error::LifeError;

/// Grid size as seen by the kernel. Uploaded once per run as a uniform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
}

impl GridDims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cells, i.e. the length of every snapshot buffer.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), LifeError> {
        let invalid = LifeError::InvalidDimensions {
            width: self.width,
            height: self.height,
        };
        if self.width == 0 || self.height == 0 {
            return Err(invalid);
        }
        // Linear indices are computed in u32 on the device.
        if self.width.checked_mul(self.height).is_none() {
            return Err(invalid);
        }
        // Signed neighbor arithmetic in the kernel.
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(invalid);
        }
        Ok(())
    }
}

/// Row-major linear index of `(x, y)`. Callers guarantee `x < width`.
#[inline]
pub fn to_index(x: u32, y: u32, width: u32) -> usize {
    (y * width + x) as usize
}

/// Host-side snapshot of one generation.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    dims: GridDims,
    cells: Vec<u32>,
}

impl Grid {
    /// An all-dead grid.
    pub fn new(dims: GridDims) -> Self {
        Self {
            dims,
            cells: vec![0; dims.cell_count()],
        }
    }

    /// Wraps existing cell data after checking its length and that every
    /// state is 0 or 1.
    pub fn from_cells(dims: GridDims, cells: Vec<u32>) -> Result<Self, LifeError> {
        dims.validate()?;
        if cells.len() != dims.cell_count() {
            return Err(LifeError::SnapshotLength {
                expected: dims.cell_count(),
                actual: cells.len(),
            });
        }
        if let Some((index, &value)) = cells.iter().enumerate().find(|(_, &v)| v > 1) {
            return Err(LifeError::InvalidCellState { index, value });
        }
        Ok(Self { dims, cells })
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<u32> {
        self.cells
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.dims.width && y < self.dims.height
    }

    /// State of the cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid. See [`Grid::try_get`].
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        assert!(
            self.contains(x, y),
            "cell ({x}, {y}) outside {}x{} grid",
            self.dims.width,
            self.dims.height
        );
        self.cells[to_index(x, y, self.dims.width)]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid. See [`Grid::try_set`].
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, alive: bool) {
        assert!(
            self.contains(x, y),
            "cell ({x}, {y}) outside {}x{} grid",
            self.dims.width,
            self.dims.height
        );
        let idx = to_index(x, y, self.dims.width);
        self.cells[idx] = alive as u32;
    }

    pub fn try_get(&self, x: u32, y: u32) -> Option<u32> {
        self.contains(x, y)
            .then(|| self.cells[to_index(x, y, self.dims.width)])
    }

    pub fn try_set(&mut self, x: u32, y: u32, alive: bool) -> Result<(), LifeError> {
        if !self.contains(x, y) {
            return Err(LifeError::CellOutOfBounds { x, y });
        }
        let idx = to_index(x, y, self.dims.width);
        self.cells[idx] = alive as u32;
        Ok(())
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }

    /// Coordinates of every live cell, in row-major order.
    pub fn live_cells(&self) -> Vec<(u32, u32)> {
        let width = self.dims.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == 1)
            .map(|(i, _)| (i as u32 % width, i as u32 / width))
            .collect()
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid {}x{}\n{}", self.dims.width, self.dims.height, self)
    }
}

/// Plaintext rendering: `O` alive, `.` dead, one row per line.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dims.width == 0 {
            return Ok(());
        }
        for row in self.cells.chunks(self.dims.width as usize) {
            for &cell in row {
                f.write_str(if cell == 1 { "O" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
