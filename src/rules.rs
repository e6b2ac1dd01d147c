//! Rules module for the Life kernel
//!
//! A rule is pure data: two lookup tables indexed by live-neighbor count.
//! Swapping the tables changes the automaton without touching the kernel.
use std::fmt;

use crate::error::LifeError;

pub mod patterns;
pub mod presets;

pub use patterns::Pattern;

/// Number of possible Moore-neighborhood counts, 0 through 8.
pub const NEIGHBOR_COUNTS: usize = 9;

/// Survive/birth lookup tables.
///
/// `survive[n]` is the next state of a live cell with `n` live neighbors,
/// `birth[n]` the next state of a dead one. Entries are 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleTable {
    pub survive: [u32; NEIGHBOR_COUNTS],
    pub birth: [u32; NEIGHBOR_COUNTS],
}

impl RuleTable {
    /// Classic Life, B3/S23.
    pub const CONWAY: RuleTable = RuleTable {
        survive: [0, 0, 1, 1, 0, 0, 0, 0, 0],
        birth: [0, 0, 0, 1, 0, 0, 0, 0, 0],
    };

    /// Builds the tables from the neighbor counts that cause birth and
    /// survival. Counts above 8 are ignored.
    pub fn from_counts(birth: &[u32], survive: &[u32]) -> Self {
        let mut table = RuleTable {
            survive: [0; NEIGHBOR_COUNTS],
            birth: [0; NEIGHBOR_COUNTS],
        };
        for &n in birth.iter().filter(|&&n| (n as usize) < NEIGHBOR_COUNTS) {
            table.birth[n as usize] = 1;
        }
        for &n in survive.iter().filter(|&&n| (n as usize) < NEIGHBOR_COUNTS) {
            table.survive[n as usize] = 1;
        }
        table
    }

    /// Checks that every entry is a cell state. The kernel writes table
    /// entries straight into the next snapshot.
    pub fn validate(&self) -> Result<(), LifeError> {
        for (table, entries) in [("survive", &self.survive), ("birth", &self.birth)] {
            if let Some((count, &value)) = entries.iter().enumerate().find(|(_, &v)| v > 1) {
                return Err(LifeError::InvalidRuleTable {
                    table,
                    count,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Next state of a cell from its current state and live-neighbor count.
    #[inline]
    pub fn next_state(&self, current: u32, live_neighbors: u32) -> u32 {
        let n = live_neighbors as usize;
        if current == 1 {
            self.survive[n]
        } else {
            self.birth[n]
        }
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::CONWAY
    }
}

/// B/S rulestring, e.g. `B3/S23`.
impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B")?;
        for (n, _) in self.birth.iter().enumerate().filter(|(_, &v)| v == 1) {
            write!(f, "{n}")?;
        }
        f.write_str("/S")?;
        for (n, _) in self.survive.iter().enumerate().filter(|(_, &v)| v == 1) {
            write!(f, "{n}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_cell_survives_only_with_two_or_three() {
        let rules = RuleTable::CONWAY;
        for n in 0..=8 {
            let expected = u32::from(n == 2 || n == 3);
            assert_eq!(rules.next_state(1, n), expected, "live cell, {n} neighbors");
        }
    }

    #[test]
    fn dead_cell_born_only_with_three() {
        let rules = RuleTable::CONWAY;
        for n in 0..=8 {
            let expected = u32::from(n == 3);
            assert_eq!(rules.next_state(0, n), expected, "dead cell, {n} neighbors");
        }
    }

    #[test]
    fn from_counts_matches_conway_table() {
        assert_eq!(RuleTable::from_counts(&[3], &[2, 3]), RuleTable::CONWAY);
        assert_eq!(RuleTable::default(), RuleTable::CONWAY);
    }

    #[test]
    fn validate_reports_first_non_binary_entry() {
        assert!(RuleTable::CONWAY.validate().is_ok());
        assert!(RuleTable::day_and_night().validate().is_ok());
        let mut rules = RuleTable::CONWAY;
        rules.birth[6] = 3;
        assert!(matches!(
            rules.validate(),
            Err(LifeError::InvalidRuleTable { table: "birth", count: 6, value: 3 })
        ));
    }

    #[test]
    fn rulestring() {
        assert_eq!(RuleTable::CONWAY.to_string(), "B3/S23");
        assert_eq!(RuleTable::high_life().to_string(), "B36/S23");
        assert_eq!(RuleTable::day_and_night().to_string(), "B3678/S34678");
    }
}
