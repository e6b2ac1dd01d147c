use crate::error::LifeError;
use crate::grid::GridDims;
use crate::kernel::{BoundaryPolicy, Kernel, Tile};
use crate::rules::RuleTable;

pub const DEFAULT_GRID_WIDTH: u32 = 256;
pub const DEFAULT_GRID_HEIGHT: u32 = 256;
pub const DEFAULT_WORKGROUP_SIZE: u32 = 8;

/// Everything fixed for the lifetime of a run. Changing any of it means
/// building a new pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifeConfig {
    pub width: u32,
    pub height: u32,
    pub boundary: BoundaryPolicy,
    pub rules: RuleTable,
    pub tile: Tile,
    /// Write a visualization texel per cell alongside the next state.
    pub visualize: bool,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            boundary: BoundaryPolicy::Toroidal,
            rules: RuleTable::CONWAY,
            tile: Tile::new(DEFAULT_WORKGROUP_SIZE, DEFAULT_WORKGROUP_SIZE),
            visualize: true,
        }
    }
}

impl LifeConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryPolicy) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_tile(mut self, x: u32, y: u32) -> Self {
        self.tile = Tile::new(x, y);
        self
    }

    pub fn with_visualization(mut self, visualize: bool) -> Self {
        self.visualize = visualize;
        self
    }

    pub fn dims(&self) -> GridDims {
        GridDims::new(self.width, self.height)
    }

    pub fn kernel(&self) -> Kernel {
        Kernel::new(self.dims(), self.boundary, self.rules)
    }

    /// Checks everything that can be checked without a device. Device
    /// limits are checked when the pipeline is built.
    pub fn validate(&self) -> Result<(), LifeError> {
        self.dims().validate()?;
        self.rules.validate()?;
        if self.tile.x == 0 || self.tile.y == 0 {
            return Err(LifeError::InvalidTile {
                x: self.tile.x,
                y: self.tile.y,
            });
        }
        Ok(())
    }

    /// Checks that a snapshot was produced for this grid.
    pub fn check_dims(&self, dims: GridDims) -> Result<(), LifeError> {
        if dims != self.dims() {
            return Err(LifeError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width: dims.width,
                actual_height: dims.height,
            });
        }
        Ok(())
    }
}
