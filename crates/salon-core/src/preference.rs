use tracing::warn;

/// A boolean preference shown optimistically while its write is in flight.
///
/// `shown` is what the user sees, `confirmed` is what the store last
/// acknowledged. A failed write puts `shown` back to `confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticToggle {
    confirmed: bool,
    shown: bool,
    in_flight: bool,
}

impl OptimisticToggle {
    pub fn new(confirmed: bool) -> Self {
        Self {
            confirmed,
            shown: confirmed,
            in_flight: false,
        }
    }

    pub fn shown(&self) -> bool {
        self.shown
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Show `value` right away. Returns `None` while another write is
    /// still pending.
    pub fn request(&mut self, value: bool) -> Option<bool> {
        if self.in_flight {
            return None;
        }
        self.shown = value;
        self.in_flight = true;
        Some(value)
    }

    pub fn flip(&mut self) -> Option<bool> {
        self.request(!self.shown)
    }

    /// Reconcile with the store's answer. Errors are handed back untouched;
    /// there is no retry.
    pub fn settle<E>(&mut self, result: Result<(), E>) -> Result<bool, E> {
        self.in_flight = false;
        match result {
            Ok(()) => {
                self.confirmed = self.shown;
                Ok(self.confirmed)
            }
            Err(e) => {
                warn!(
                    "Preference write failed, reverting {} -> {}",
                    self.shown, self.confirmed
                );
                self.shown = self.confirmed;
                Err(e)
            }
        }
    }

    /// Request `value` and run `commit` with it in one go.
    pub fn apply<E>(&mut self, value: bool, commit: impl FnOnce(bool) -> Result<(), E>) -> Result<bool, E> {
        match self.request(value) {
            Some(requested) => {
                let result = commit(requested);
                self.settle(result)
            }
            None => Ok(self.shown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_adopts_new_value() {
        let mut toggle = OptimisticToggle::new(true);
        assert_eq!(toggle.flip(), Some(false));
        assert!(!toggle.shown());
        assert!(toggle.confirmed());

        assert_eq!(toggle.settle::<()>(Ok(())), Ok(false));
        assert!(!toggle.confirmed());
        assert!(!toggle.is_in_flight());
    }

    #[test]
    fn failure_reverts_and_surfaces_error() {
        let mut toggle = OptimisticToggle::new(false);
        toggle.flip();
        assert!(toggle.shown());

        let result = toggle.settle(Err("network down"));
        assert_eq!(result, Err("network down"));
        assert!(!toggle.shown());
        assert!(!toggle.confirmed());
    }

    #[test]
    fn second_request_waits_for_the_first() {
        let mut toggle = OptimisticToggle::new(false);
        assert_eq!(toggle.flip(), Some(true));
        assert_eq!(toggle.flip(), None);
        assert!(toggle.shown());
    }

    #[test]
    fn apply_runs_commit_with_requested_value() {
        let mut toggle = OptimisticToggle::new(true);
        let mut written = None;
        let result = toggle.apply(false, |v| {
            written = Some(v);
            Ok::<(), String>(())
        });
        assert_eq!(result, Ok(false));
        assert_eq!(written, Some(false));

        let result = toggle.apply(true, |_| Err("denied".to_string()));
        assert_eq!(result, Err("denied".to_string()));
        assert!(!toggle.shown());
    }
}
