/// Predefined patterns for seeding a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// A small oscillator
    Blinker,
    /// A small oscillator
    Toad,
    /// A small stationary pattern
    Block,
    /// A diagonal spaceship
    Glider,
    /// A horizontal spaceship
    LightweightSpaceship,
    /// A pattern that grows indefinitely
    GosperGliderGun,
}

impl Pattern {
    /// Live cells of the pattern, relative to its top-left corner.
    #[rustfmt::skip]
    pub fn offsets(&self) -> &'static [(u32, u32)] {
        match self {
            Pattern::Blinker => &[(0, 0), (0, 1), (0, 2)],
            Pattern::Toad => &[
                (1, 0), (2, 0), (3, 0),
                (0, 1), (1, 1), (2, 1),
            ],
            Pattern::Block => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            Pattern::Glider => &[
                (1, 0),
                (2, 1),
                (0, 2), (1, 2), (2, 2),
            ],
            Pattern::LightweightSpaceship => &[
                (0, 1), (0, 3),
                (1, 0),
                (2, 0),
                (3, 0), (3, 3),
                (4, 0), (4, 1), (4, 2),
            ],
            Pattern::GosperGliderGun => &[
                (24, 0),
                (22, 1), (24, 1),
                (12, 2), (13, 2), (20, 2), (21, 2), (34, 2), (35, 2),
                (11, 3), (15, 3), (20, 3), (21, 3), (34, 3), (35, 3),
                (0, 4), (1, 4), (10, 4), (16, 4), (20, 4), (21, 4),
                (0, 5), (1, 5), (10, 5), (14, 5), (16, 5), (17, 5), (22, 5), (24, 5),
                (10, 6), (16, 6), (24, 6),
                (11, 7), (15, 7),
                (12, 8), (13, 8),
            ],
        }
    }

    /// Bounding box of the pattern as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        self.offsets()
            .iter()
            .fold((0, 0), |(w, h), &(x, y)| (w.max(x + 1), h.max(y + 1)))
    }

    /// Absolute cells of the pattern with its top-left corner at `(x, y)`.
    pub fn cells(&self, x: u32, y: u32) -> Vec<(u64, u64)> {
        self.offsets()
            .iter()
            .map(|&(dx, dy)| (x as u64 + dx as u64, y as u64 + dy as u64))
            .collect()
    }
}
