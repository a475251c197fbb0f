//! # Lifecycle phase token.
//!
//! Hosts that order their own startup components by phase compare against
//! [`Phase::INITIALIZE`]: anything that accepts external traffic must sit in a
//! strictly later phase, such as [`Phase::LISTEN`].

/// Ordering key for host lifecycle scheduling; lower phases start first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Phase(i32);

impl Phase {
    /// Phase of the initialization gate: the earliest possible one.
    pub const INITIALIZE: Phase = Phase(i32::MIN);

    /// Phase at which network listeners become active.
    pub const LISTEN: Phase = Phase(i32::MAX - 1);

    /// Creates a host-defined phase.
    pub const fn new(value: i32) -> Self {
        Phase(value)
    }

    /// Raw ordering value.
    pub const fn value(self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_runs_before_everything() {
        assert!(Phase::INITIALIZE < Phase::LISTEN);
        assert!(Phase::INITIALIZE <= Phase::new(i32::MIN));
        assert!(Phase::new(0) < Phase::LISTEN);
    }
}
