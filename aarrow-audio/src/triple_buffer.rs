//! Lock-free snapshot cell for handing parameters to the audio thread.
//!
//! Three slots: the writer fills its private back slot and swaps it into the
//! shared middle position; the reader swaps the middle slot out into its
//! private front position when something fresh has been published. Neither
//! side ever waits, and the reader always sees a complete value.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const INDEX_MASK: u8 = 0b11;
const FRESH: u8 = 0b100;

struct Shared<T> {
    slots: [UnsafeCell<T>; 3],
    /// Index of the middle slot, plus FRESH when the writer published since the last read.
    middle: AtomicU8,
}

// Safety: each slot is only touched by whichever side currently owns its index,
// and ownership moves exclusively through the atomic swap.
unsafe impl<T: Send> Sync for Shared<T> {}

/// Publishing half. Exactly one per cell.
pub struct SnapshotWriter<T> {
    shared: Arc<Shared<T>>,
    back: usize,
}

/// Consuming half. Exactly one per cell.
pub struct SnapshotReader<T> {
    shared: Arc<Shared<T>>,
    front: usize,
}

/// Create a cell holding `initial`.
pub fn snapshot_cell<T: Clone + Send>(initial: T) -> (SnapshotWriter<T>, SnapshotReader<T>) {
    let shared = Arc::new(Shared {
        slots: [
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial),
        ],
        middle: AtomicU8::new(1),
    });
    (
        SnapshotWriter {
            shared: Arc::clone(&shared),
            back: 2,
        },
        SnapshotReader { shared, front: 0 },
    )
}

impl<T: Send> SnapshotWriter<T> {
    /// Make `value` the latest snapshot.
    pub fn publish(&mut self, value: T) {
        // Safety: the back slot belongs to the writer until it is swapped out below.
        unsafe {
            *self.shared.slots[self.back].get() = value;
        }
        let previous = self
            .shared
            .middle
            .swap(self.back as u8 | FRESH, Ordering::AcqRel);
        self.back = (previous & INDEX_MASK) as usize;
    }
}

impl<T: Send> SnapshotReader<T> {
    /// Whether a value was published since the last `latest()`.
    pub fn has_fresh(&self) -> bool {
        self.shared.middle.load(Ordering::Acquire) & FRESH != 0
    }

    /// The most recently published snapshot.
    pub fn latest(&mut self) -> &T {
        if self.has_fresh() {
            let previous = self
                .shared
                .middle
                .swap(self.front as u8, Ordering::AcqRel);
            self.front = (previous & INDEX_MASK) as usize;
        }
        // Safety: the front slot belongs to the reader until it is swapped out above.
        unsafe { &*self.shared.slots[self.front].get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_initial_value() {
        let (_writer, mut reader) = snapshot_cell(7u32);
        assert!(!reader.has_fresh());
        assert_eq!(*reader.latest(), 7);
    }

    #[test]
    fn reader_sees_latest_publish() {
        let (mut writer, mut reader) = snapshot_cell(0u32);
        writer.publish(1);
        writer.publish(2);
        writer.publish(3);
        assert!(reader.has_fresh());
        assert_eq!(*reader.latest(), 3);
        assert!(!reader.has_fresh());
        assert_eq!(*reader.latest(), 3);
    }

    #[test]
    fn interleaved_publish_and_read() {
        let (mut writer, mut reader) = snapshot_cell(String::from("a"));
        for word in ["b", "c", "d", "e"] {
            writer.publish(word.to_string());
            assert_eq!(reader.latest(), word);
        }
    }

    #[test]
    fn values_cross_threads_whole() {
        let (mut writer, mut reader) = snapshot_cell([0u64; 8]);
        let handle = std::thread::spawn(move || {
            for i in 1..=10_000u64 {
                writer.publish([i; 8]);
            }
        });
        let mut last = 0;
        while last < 10_000 {
            let snap = *reader.latest();
            assert!(snap.iter().all(|&v| v == snap[0]), "torn read");
            assert!(snap[0] >= last);
            last = snap[0];
        }
        handle.join().unwrap();
    }
}
