use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Remembers whether anonymous temporary files have been seen to be unsupported.
///
/// The flag only ever moves from "unknown" to "unsupported". Once set, allocation goes straight
/// to named temporary files, and linking goes straight to `rename`.
#[derive(Debug, Default)]
pub struct Capability {
    unsupported: AtomicBool,
}

static PROCESS: Capability = Capability::new();

impl Capability {
    pub const fn new() -> Capability {
        Capability {
            unsupported: AtomicBool::new(false),
        }
    }

    /// The instance shared by the free functions in this crate.
    pub fn process() -> &'static Capability {
        &PROCESS
    }

    #[inline]
    pub fn unsupported(&self) -> bool {
        self.unsupported.load(Ordering::Acquire)
    }

    /// Record that the anonymous primitive is unavailable.
    ///
    /// Returns `true` only for the call which performed the transition; racing callers get `false`.
    pub fn mark_unsupported(&self) -> bool {
        let first = !self.unsupported.swap(true, Ordering::AcqRel);
        if first {
            tracing::debug!("anonymous temporary files unsupported, using named files from now on");
        }
        first
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::Capability;

    #[test]
    fn starts_unknown() {
        assert!(!Capability::new().unsupported());
    }

    #[test]
    fn transition_is_monotonic() {
        let cap = Capability::new();
        assert!(cap.mark_unsupported());
        assert!(cap.unsupported());
        assert!(!cap.mark_unsupported());
        assert!(cap.unsupported());
    }

    #[test]
    fn exactly_one_racer_wins() {
        let cap = Arc::new(Capability::new());
        let wins = (0..8)
            .map(|_| {
                let cap = Arc::clone(&cap);
                thread::spawn(move || cap.mark_unsupported())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(1, wins);
        assert!(cap.unsupported());
    }
}
