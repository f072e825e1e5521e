//! Offset cell shared between the gesture side and the renderer

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Horizontal row offset stored as `f64` bits.
///
/// One writer (the gesture handler), any number of readers (rendering).
/// Clones share the same cell.
#[derive(Debug, Clone, Default)]
pub struct SharedOffset {
    bits: Arc<AtomicU64>,
}

impl SharedOffset {
    pub fn new(value: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_closed() {
        assert_eq!(SharedOffset::default().load(), 0.0);
    }

    #[test]
    fn test_clones_share_value() {
        let writer = SharedOffset::new(0.0);
        let reader = writer.clone();
        writer.store(-42.5);
        assert_eq!(reader.load(), -42.5);
    }

    #[test]
    fn test_reader_on_other_thread() {
        let writer = SharedOffset::new(0.0);
        let reader = writer.clone();
        writer.store(-100.0);
        let seen = std::thread::spawn(move || reader.load()).join().unwrap();
        assert_eq!(seen, -100.0);
    }
}
