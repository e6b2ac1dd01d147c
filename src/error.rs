/// Errors raised by the host side of the simulation.
///
/// The kernel itself has no failure modes; everything here is detected
/// before a dispatch is recorded or while moving data on and off the device.
#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to request GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("Grid dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Snapshot holds {actual} cells, grid needs {expected}")]
    SnapshotLength { expected: usize, actual: usize },

    #[error("Cell {index} has state {value}, expected 0 or 1")]
    InvalidCellState { index: usize, value: u32 },

    #[error("Workgroup tile {x}x{y} is invalid")]
    InvalidTile { x: u32, y: u32 },

    #[error("Cell ({x}, {y}) lies outside the grid")]
    CellOutOfBounds { x: u32, y: u32 },

    #[error("Rule table entry {table}[{count}] is {value}, expected 0 or 1")]
    InvalidRuleTable {
        table: &'static str,
        count: usize,
        value: u32,
    },

    #[error("{what} of {requested} exceeds the device limit of {limit}")]
    ExceedsDeviceLimit {
        what: &'static str,
        requested: u64,
        limit: u64,
    },

    #[error("Compute shader rejected: {0}")]
    Shader(String),

    #[error("Visualization output was not enabled for this run")]
    VisualizationDisabled,

    #[error("Grid is {actual_width}x{actual_height}, run is configured for {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Seed cell ({x}, {y}) lies outside the grid")]
    SeedOutOfBounds { x: u64, y: u64 },

    #[error("Unexpected {found:?} at line {line}, column {column} of pattern")]
    PatternSyntax {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("Random fill density {0} is outside [0, 1]")]
    InvalidDensity(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
