//! Strongly-typed identifiers for turns and players.

use std::fmt;

/// Index of a lockstep turn.
///
/// Turn indices start at 0 and increase by one for every turn the
/// simulation advances. They are the unit of the verification cadence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnIndex(pub u32);

impl TurnIndex {
    /// Whether this turn falls on a cadence boundary (`index % cadence == 0`).
    ///
    /// A zero cadence never matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn_core::TurnIndex;
    ///
    /// assert!(TurnIndex(0).is_multiple_of(100));
    /// assert!(TurnIndex(200).is_multiple_of(100));
    /// assert!(!TurnIndex(150).is_multiple_of(100));
    /// ```
    pub fn is_multiple_of(self, cadence: u32) -> bool {
        cadence != 0 && self.0 % cadence == 0
    }
}

impl fmt::Display for TurnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TurnIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Simulation time advanced by one turn, in engine-defined ticks
/// (milliseconds in practice).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnLength(pub u32);

impl fmt::Display for TurnLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TurnLength {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies the player that issued a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PlayerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cadence_never_matches() {
        assert!(!TurnIndex(0).is_multiple_of(0));
        assert!(!TurnIndex(100).is_multiple_of(0));
    }

    #[test]
    fn display_is_bare_number() {
        assert_eq!(TurnIndex(42).to_string(), "42");
        assert_eq!(TurnLength(200).to_string(), "200");
        assert_eq!(PlayerId(3).to_string(), "3");
    }
}
