use super::RuleTable;

impl RuleTable {
    /// Preset for Conway's classic Game of Life (B3/S23)
    pub fn conway() -> Self {
        Self::CONWAY
    }

    /// HighLife variant (B36/S23) - has a self-replicating pattern
    pub fn high_life() -> Self {
        Self::from_counts(&[3, 6], &[2, 3])
    }

    /// Day & Night variant (B3678/S34678)
    pub fn day_and_night() -> Self {
        Self::from_counts(&[3, 6, 7, 8], &[3, 4, 6, 7, 8])
    }
}
