//! Suppression gate
//!
//! While a restoration is correcting the scroll offset, the scroll events it
//! causes must not be saved as if the user had scrolled there.

/// Identifies one restoration sequence. A newer sequence invalidates older tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreToken(u64);

impl RestoreToken {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Whether saving is currently allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePhase {
    /// Saves go through
    #[default]
    Idle,
    /// A restoration sequence is in flight; saves are dropped
    Restoring { token: RestoreToken },
}

/// Two-state gate owned by the coordinator
#[derive(Debug, Default)]
pub struct SuppressionGate {
    phase: RestorePhase,
    generation: u64,
}

impl SuppressionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RestorePhase {
        self.phase
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, RestorePhase::Restoring { .. })
    }

    /// Enter `Restoring` with a fresh token, superseding any earlier sequence
    pub fn begin(&mut self) -> RestoreToken {
        self.generation += 1;
        let token = RestoreToken(self.generation);
        self.phase = RestorePhase::Restoring { token };
        token
    }

    /// Whether `token` belongs to the sequence currently holding the gate
    pub fn is_current(&self, token: RestoreToken) -> bool {
        self.phase == RestorePhase::Restoring { token }
    }

    /// Return to `Idle`, but only on behalf of the current sequence
    pub fn release(&mut self, token: RestoreToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.phase = RestorePhase::Idle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_and_release() {
        let mut gate = SuppressionGate::new();
        assert!(!gate.is_active());

        let token = gate.begin();
        assert!(gate.is_active());
        assert_eq!(gate.phase(), RestorePhase::Restoring { token });

        assert!(gate.release(token));
        assert_eq!(gate.phase(), RestorePhase::Idle);
    }

    #[test]
    fn test_stale_token_cannot_release() {
        let mut gate = SuppressionGate::new();
        let first = gate.begin();
        let second = gate.begin();

        assert!(!gate.is_current(first));
        assert!(!gate.release(first));
        assert!(gate.is_active());
        assert!(gate.release(second));
        assert_eq!(second.generation(), first.generation() + 1);
    }
}
