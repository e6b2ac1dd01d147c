//! Initial snapshots.

use std::fs;
use std::path::Path;

use rand::Rng;

use crate::error::LifeError;
use crate::grid::{Grid, GridDims};
use crate::rules::Pattern;

/// Something that can produce generation 0 for a grid.
pub trait Seed {
    fn generate(self, dims: GridDims) -> Result<Grid, LifeError>;
}

fn place(grid: &mut Grid, cells: impl IntoIterator<Item = (u64, u64)>) -> Result<(), LifeError> {
    let dims = grid.dims();
    for (x, y) in cells {
        if x >= dims.width as u64 || y >= dims.height as u64 {
            return Err(LifeError::SeedOutOfBounds { x, y });
        }
        grid.set(x as u32, y as u32, true);
    }
    Ok(())
}

/// Explicit live-cell coordinates, shifted by an offset.
#[derive(Debug, Clone)]
pub struct Cells {
    pub positions: Vec<(u32, u32)>,
    pub x_offset: u32,
    pub y_offset: u32,
}

impl Seed for Cells {
    fn generate(self, dims: GridDims) -> Result<Grid, LifeError> {
        dims.validate()?;
        let mut grid = Grid::new(dims);
        let (ox, oy) = (self.x_offset as u64, self.y_offset as u64);
        place(
            &mut grid,
            self.positions.iter().map(|&(x, y)| (x as u64 + ox, y as u64 + oy)),
        )?;
        Ok(grid)
    }
}

/// A named pattern with its top-left corner at `(x, y)`.
#[derive(Debug, Clone, Copy)]
pub struct PatternSeed {
    pub pattern: Pattern,
    pub x: u32,
    pub y: u32,
}

impl Seed for PatternSeed {
    fn generate(self, dims: GridDims) -> Result<Grid, LifeError> {
        dims.validate()?;
        let mut grid = Grid::new(dims);
        place(&mut grid, self.pattern.cells(self.x, self.y))?;
        Ok(grid)
    }
}

/// Each cell alive independently with the given probability.
#[derive(Debug, Clone, Copy)]
pub struct Random(pub f64);

impl Seed for Random {
    fn generate(self, dims: GridDims) -> Result<Grid, LifeError> {
        dims.validate()?;
        if !(0.0..=1.0).contains(&self.0) {
            return Err(LifeError::InvalidDensity(self.0));
        }
        let mut rng = rand::thread_rng();
        let cells = (0..dims.cell_count())
            .map(|_| rng.gen_bool(self.0) as u32)
            .collect();
        Grid::from_cells(dims, cells)
    }
}

/// A Life plaintext (`.cells`) document: `!` lines are comments, `.` is dead
/// and `O` alive.
#[derive(Debug, Clone)]
pub struct Plaintext {
    pub source: String,
    pub x_offset: u32,
    pub y_offset: u32,
}

impl Plaintext {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            x_offset: 0,
            y_offset: 0,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LifeError> {
        let path = path.as_ref();
        log::info!("Loading pattern from {}", path.display());
        Ok(Self::new(fs::read_to_string(path)?))
    }

    pub fn at(mut self, x_offset: u32, y_offset: u32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    /// Live cells relative to the top-left of the document.
    pub fn parse(&self) -> Result<Vec<(u32, u32)>, LifeError> {
        let mut live = Vec::new();
        let rows = self
            .source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.starts_with('!'));
        for (y, (line_no, line)) in rows.enumerate() {
            for (x, chr) in line.trim_end().chars().enumerate() {
                match chr {
                    '.' => {}
                    'O' | '*' => live.push((x as u32, y as u32)),
                    found => {
                        return Err(LifeError::PatternSyntax {
                            line: line_no + 1,
                            column: x + 1,
                            found,
                        })
                    }
                }
            }
        }
        Ok(live)
    }
}

impl Seed for Plaintext {
    fn generate(self, dims: GridDims) -> Result<Grid, LifeError> {
        Cells {
            positions: self.parse()?,
            x_offset: self.x_offset,
            y_offset: self.y_offset,
        }
        .generate(dims)
    }
}

/// Gosper glider gun placed away from the top-left corner.
pub fn glider_gun() -> PatternSeed {
    PatternSeed {
        pattern: Pattern::GosperGliderGun,
        x: 10,
        y: 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_offset() {
        let grid = Cells {
            positions: vec![(0, 0), (2, 1)],
            x_offset: 1,
            y_offset: 2,
        }
        .generate(GridDims::new(4, 4))
        .unwrap();
        assert_eq!(grid.live_cells(), vec![(1, 2), (3, 3)]);
    }

    #[test]
    fn cells_outside_grid_are_rejected() {
        let err = Cells {
            positions: vec![(3, 0)],
            x_offset: 1,
            y_offset: 0,
        }
        .generate(GridDims::new(4, 4))
        .unwrap_err();
        assert!(matches!(err, LifeError::SeedOutOfBounds { x: 4, y: 0 }));
    }

    #[test]
    fn plaintext_skips_comments() {
        let doc = "!Name: Glider\n!\n.O.\n..O\nOOO\n";
        let cells = Plaintext::new(doc).parse().unwrap();
        assert_eq!(cells, vec![(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
    }

    #[test]
    fn plaintext_reports_bad_character() {
        let err = Plaintext::new("!c\n.O.\n.X.\n").parse().unwrap_err();
        assert!(matches!(err, LifeError::PatternSyntax { line: 3, column: 2, found: 'X' }));
    }

    #[test]
    fn plaintext_generates_offset_grid() {
        let grid = Plaintext::new("OO\nOO\n").at(1, 1).generate(GridDims::new(4, 4)).unwrap();
        assert_eq!(grid.live_cells(), vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn random_density_bounds() {
        let dims = GridDims::new(8, 8);
        assert_eq!(Random(0.0).generate(dims).unwrap().live_count(), 0);
        assert_eq!(Random(1.0).generate(dims).unwrap().live_count(), 64);
        assert!(matches!(Random(1.5).generate(dims), Err(LifeError::InvalidDensity(_))));
    }

    #[test]
    fn every_seed_rejects_empty_dimensions() {
        for dims in [GridDims::new(0, 3), GridDims::new(3, 0)] {
            let results = [
                Cells {
                    positions: vec![],
                    x_offset: 0,
                    y_offset: 0,
                }
                .generate(dims),
                PatternSeed {
                    pattern: Pattern::Block,
                    x: 0,
                    y: 0,
                }
                .generate(dims),
                Random(0.5).generate(dims),
                Plaintext::new("!empty\n").generate(dims),
            ];
            for result in results {
                assert!(
                    matches!(result, Err(LifeError::InvalidDimensions { .. })),
                    "{dims:?}: {result:?}"
                );
            }
        }
    }

    #[test]
    fn glider_gun_fits_default_grid() {
        let grid = glider_gun().generate(GridDims::new(64, 64)).unwrap();
        assert_eq!(grid.live_count(), 36);
        assert_eq!(grid.get(10, 14), 1);
    }
}
