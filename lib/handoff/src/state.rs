use core::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    entry::{EntryPoint, PublishError},
    mask::{is_set, live_harts},
};

/// State shared by all harts during boot.
pub static BOOT_STATE: BootState = BootState::new();

/// What a hart receives when it may run the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handoff {
    pub entry: usize,
    pub hart_id: usize,
    /// Address of the relocated device tree.
    pub dtb: usize,
    /// Harts that will run the payload, one bit per hart id.
    pub live_harts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HartFate {
    /// Wait for interrupts forever.
    Park,
    Enter(Handoff),
}

/// Boot results written by the boot hart and read by every hart.
///
/// The masks and the tree address are stored before the entry point is
/// published; the release/acquire pair on the entry point orders them, so
/// the fields themselves are relaxed.
#[derive(Debug)]
pub struct BootState {
    entry: EntryPoint,
    disabled: AtomicUsize,
    present: AtomicUsize,
    dtb: AtomicUsize,
}

impl BootState {
    pub const fn new() -> Self {
        Self {
            entry: EntryPoint::new(),
            disabled: AtomicUsize::new(0),
            present: AtomicUsize::new(0),
            dtb: AtomicUsize::new(0),
        }
    }

    /// Records the hart masks found in the tree and where the tree went.
    /// Must happen before [`BootState::publish`].
    pub fn record_filter(&self, present: usize, disabled: usize, dtb: usize) {
        self.present.store(present, Ordering::Relaxed);
        self.disabled.store(disabled, Ordering::Relaxed);
        self.dtb.store(dtb, Ordering::Relaxed);
    }

    /// Publishes the payload entry point, releasing every hart.
    pub fn publish(&self, entry: usize) -> Result<(), PublishError> {
        self.entry.publish(entry)
    }

    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    /// Fate of `hart_id` once `entry` has been published.
    pub fn decide(&self, hart_id: usize, entry: usize) -> HartFate {
        let disabled = self.disabled.load(Ordering::Relaxed);
        // Disabled ids and ids without a mask bit never run the payload.
        if is_set(disabled, hart_id) || !is_set(usize::MAX, hart_id) {
            return HartFate::Park;
        }
        HartFate::Enter(Handoff {
            entry,
            hart_id,
            dtb: self.dtb.load(Ordering::Relaxed),
            live_harts: live_harts(self.present.load(Ordering::Relaxed), disabled),
        })
    }

    /// Waits for the entry point, then decides the fate of `hart_id`.
    pub fn wait_and_decide(&self, hart_id: usize) -> HartFate {
        let entry = self.entry.wait();
        let fate = self.decide(hart_id, entry);
        log::debug!("hart {}: {:x?}", hart_id, fate);
        fate
    }
}

impl Default for BootState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::device::MAX_HARTS;
    use std::{sync::Arc, thread, vec::Vec};

    #[test]
    fn disabled_harts_park() {
        let state = BootState::new();
        state.record_filter(0b11, 0b10, 0x8060_0000);
        state.publish(0x8000_0000).unwrap();

        assert_eq!(
            state.wait_and_decide(0),
            HartFate::Enter(Handoff {
                entry: 0x8000_0000,
                hart_id: 0,
                dtb: 0x8060_0000,
                live_harts: 0b01,
            })
        );
        assert_eq!(state.wait_and_decide(1), HartFate::Park);
        assert_eq!(state.decide(MAX_HARTS, 0x8000_0000), HartFate::Park);
    }

    #[test]
    fn live_mask_excludes_absent_harts() {
        let state = BootState::new();
        state.record_filter(0b0101, 0b0100, 0x8060_0000);
        match state.decide(0, 0x8000_0000) {
            HartFate::Enter(handoff) => assert_eq!(handoff.live_harts, 0b0001),
            HartFate::Park => panic!("hart 0 parked"),
        }
    }

    #[test]
    fn harts_released_by_publication() {
        let state = Arc::new(BootState::new());
        let harts: Vec<_> = (1..4)
            .map(|hart_id| {
                let state = state.clone();
                thread::spawn(move || state.wait_and_decide(hart_id))
            })
            .collect();

        state.record_filter(0b1111, 0b0100, 0x8060_0000);
        state.publish(0x8000_0000).unwrap();
        let boot_hart = state.wait_and_decide(0);

        let fates: Vec<_> = harts.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(matches!(boot_hart, HartFate::Enter(h) if h.live_harts == 0b1011));
        assert!(matches!(fates[0], HartFate::Enter(h) if h.hart_id == 1 && h.dtb == 0x8060_0000));
        assert_eq!(fates[1], HartFate::Park);
        assert!(matches!(fates[2], HartFate::Enter(h) if h.hart_id == 3));
    }
}
