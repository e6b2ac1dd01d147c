//! Conway's Game of Life as a wgpu compute kernel.
//!
//! Every generation is one dispatch with one invocation per cell. The
//! invocation reads the frozen input snapshot, counts live neighbors under a
//! clamped or toroidal boundary, applies the survive/birth tables and writes
//! its own slot of the output snapshot (and, optionally, one visualization
//! texel). The host swaps the two snapshot buffers between generations.

pub mod compute;
pub mod config;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod render;
pub mod rules;
pub mod seed;
pub mod state;

pub use config::LifeConfig;
pub use error::LifeError;
pub use grid::{to_index, Grid, GridDims};
pub use kernel::{BoundaryPolicy, CellUpdate, Kernel, Tile};
pub use rules::{Pattern, RuleTable};
pub use seed::Seed;
pub use state::LifeState;
