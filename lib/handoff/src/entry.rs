use core::{
    fmt,
    hint::spin_loop,
    sync::atomic::{AtomicUsize, Ordering, fence},
};

const UNPUBLISHED: usize = 0;

/// Payload entry address shared by all harts.
///
/// Holds a sentinel until the boot hart publishes the address. Everything
/// the boot hart wrote before [`EntryPoint::publish`] is visible to a hart
/// once [`EntryPoint::get`] or [`EntryPoint::wait`] returned the address.
#[derive(Debug)]
pub struct EntryPoint(AtomicUsize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The address equals the sentinel.
    Sentinel,
    /// An address was published already; it is kept.
    AlreadyPublished(usize),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentinel => write!(f, "entry point {:#x} is the sentinel", UNPUBLISHED),
            Self::AlreadyPublished(entry) => {
                write!(f, "entry point already published at {:#x}", entry)
            }
        }
    }
}

impl EntryPoint {
    pub const fn new() -> Self {
        Self(AtomicUsize::new(UNPUBLISHED))
    }

    /// Publishes `entry`. Only the first publication takes effect.
    pub fn publish(&self, entry: usize) -> Result<(), PublishError> {
        if entry == UNPUBLISHED {
            return Err(PublishError::Sentinel);
        }
        self.0
            .compare_exchange(UNPUBLISHED, entry, Ordering::Release, Ordering::Acquire)
            .map(|_| ())
            .map_err(PublishError::AlreadyPublished)
    }

    pub fn get(&self) -> Option<usize> {
        match self.0.load(Ordering::Acquire) {
            UNPUBLISHED => None,
            entry => Some(entry),
        }
    }

    /// Spins until an entry point is published and returns it. Never gives up.
    pub fn wait(&self) -> usize {
        loop {
            if let Some(entry) = self.get() {
                return entry;
            }
            fence(Ordering::SeqCst);
            spin_loop();
        }
    }
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread, vec::Vec};

    #[test]
    fn sentinel_until_published() {
        let entry = EntryPoint::new();
        assert_eq!(entry.get(), None);
        assert_eq!(entry.publish(0), Err(PublishError::Sentinel));
        assert_eq!(entry.get(), None);
        entry.publish(0x8000_0000).unwrap();
        assert_eq!(entry.get(), Some(0x8000_0000));
    }

    #[test]
    fn first_publication_wins() {
        let entry = EntryPoint::new();
        entry.publish(0x8000_0000).unwrap();
        assert_eq!(
            entry.publish(0x8020_0000),
            Err(PublishError::AlreadyPublished(0x8000_0000))
        );
        assert_eq!(entry.wait(), 0x8000_0000);
    }

    #[test]
    fn racing_publishers_agree() {
        let entry = Arc::new(EntryPoint::new());
        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let entry = entry.clone();
                thread::spawn(move || entry.publish(i * 0x1000).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&won| won)
            .count();
        assert_eq!(winners, 1);
        assert!(entry.get().is_some());
    }

    #[test]
    fn waiters_observe_publication() {
        let entry = Arc::new(EntryPoint::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let entry = entry.clone();
                thread::spawn(move || entry.wait())
            })
            .collect();
        thread::sleep(std::time::Duration::from_millis(10));
        entry.publish(0x8040_0000).unwrap();
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), 0x8040_0000);
        }
    }
}
