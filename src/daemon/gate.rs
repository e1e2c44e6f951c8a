use std::sync::atomic::{AtomicBool, Ordering};

/// Allows at most one file-choosing dialog at a time. A trigger while one is open is dropped.
#[derive(Debug, Default)]
pub struct DialogGate {
    open: AtomicBool,
}

impl DialogGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the caller now owns the gate.
    pub fn try_open(&self) -> bool {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn second_open_is_refused_until_closed() {
        let gate = DialogGate::new();

        assert!(gate.try_open());
        assert!(gate.is_open());
        assert!(!gate.try_open());

        gate.close();
        assert!(!gate.is_open());
        assert!(gate.try_open());
    }

    #[test]
    fn only_one_thread_wins_the_gate() {
        let gate = Arc::new(DialogGate::new());
        let contenders: Vec<_> = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.try_open())
            })
            .collect();

        let winners = contenders
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
