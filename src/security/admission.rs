//! Admission gate bounding concurrently in-flight requests.
//!
//! # Responsibilities
//! - Count in-flight races across the whole process
//! - Reject new requests once the count exceeds the configured maximum
//! - Release the slot on every exit path (RAII permit)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Process-wide in-flight counter.
#[derive(Debug)]
pub struct AdmissionGate {
    in_flight: AtomicUsize,
    max_in_flight: usize,
}

impl AdmissionGate {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight,
        }
    }

    /// Try to admit one request.
    ///
    /// Rejects (without counting) only when the current count already exceeds
    /// the maximum, so up to `max_in_flight + 1` requests can be in flight.
    pub fn try_admit(self: &Arc<Self>) -> Option<AdmissionPermit> {
        let mut prev = self.in_flight.load(Ordering::Relaxed);
        loop {
            if prev > self.max_in_flight {
                return None;
            }
            match self.in_flight.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(AdmissionPermit { gate: self.clone() })
    }

    /// Current number of admitted, unfinished requests.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    fn release(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A RAII guard holding one admission slot.
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_after_max_plus_one() {
        let gate = Arc::new(AdmissionGate::new(2));
        let permits: Vec<_> = (0..3).map(|_| gate.try_admit().expect("admitted")).collect();
        assert_eq!(gate.in_flight(), 3);

        assert!(gate.try_admit().is_none());
        assert_eq!(gate.in_flight(), 3, "rejection must not count");

        drop(permits);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_release_restores_one_slot() {
        let gate = Arc::new(AdmissionGate::new(0));
        let first = gate.try_admit().expect("first admitted");
        assert!(gate.try_admit().is_none());

        drop(first);
        let second = gate.try_admit();
        assert!(second.is_some());
        assert!(gate.try_admit().is_none());
    }

    #[test]
    fn test_concurrent_admission_has_no_lost_updates() {
        let gate = Arc::new(AdmissionGate::new(1_000_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let permit = gate.try_admit();
                        assert!(permit.is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_concurrent_admission_respects_bound() {
        let gate = Arc::new(AdmissionGate::new(9));
        let admitted = std::sync::Mutex::new(Vec::new());
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..10 {
                        if let Some(permit) = gate.try_admit() {
                            admitted.lock().unwrap().push(permit);
                        }
                    }
                });
            }
        });
        assert_eq!(admitted.lock().unwrap().len(), 10);
        assert_eq!(gate.in_flight(), 10);
    }
}
