//! In-place edits applied to the relocated tree.
//!
//! Each filter is a [`FdtVisitor`]. None of them fails on a tree that lacks
//! what it looks for; such a tree is left as it was.

use config::{
    device::{
        BLOCKED_COMPATIBLES, CPU_DEVICE_TYPE, HART_STATUS_MASKED, HART_STATUS_OKAY, IRQ_M_EXT,
        MAX_HARTS, PLIC_COMPATIBLES,
    },
    mm::{PAGING_SCHEME, PagingScheme},
};

use crate::{
    error::DtbResult,
    header::{align4, nop_range, read_be32, write_be32},
    scan::{FdtVisitor, ScanNode, ScanProp, scan},
};

/// Harts found by [`filter_harts`], one bit per hart id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HartMasks {
    /// Every hart node with a usable id.
    pub present: usize,
    /// Harts that must never run the payload.
    pub disabled: usize,
}

impl HartMasks {
    /// Harts that will run the payload.
    pub const fn live(&self) -> usize {
        !self.disabled & self.present
    }
}

#[derive(Default)]
struct HartScratch {
    is_cpu: bool,
    hart_id: Option<u64>,
    /// Offset and length of the `status` value.
    status: Option<(usize, usize)>,
    status_okay: bool,
    mmu_supported: bool,
}

struct HartFilter {
    scheme: PagingScheme,
    masks: HartMasks,
}

impl FdtVisitor for HartFilter {
    type Scratch = HartScratch;

    fn prop(&mut self, prop: &ScanProp<'_>, hart: &mut HartScratch) {
        match prop.name {
            "device_type" => hart.is_cpu = prop.as_str() == Some(CPU_DEVICE_TYPE),
            "reg" => hart.hart_id = prop.address(),
            "status" => {
                hart.status = Some((prop.value_offset, prop.value.len()));
                hart.status_okay = prop.as_str() == Some(HART_STATUS_OKAY);
            }
            "mmu-type" => {
                hart.mmu_supported = prop.as_str().is_some_and(|ty| self.scheme.runs_on(ty));
            }
            _ => {}
        }
    }

    fn done(&mut self, node: &ScanNode, hart: &mut HartScratch, blob: &mut [u8]) {
        if !hart.is_cpu {
            return;
        }
        let Some(id) = hart.hart_id else {
            log::warn!("cpu node {} has no reg", node.name(blob));
            return;
        };
        let in_range = id < MAX_HARTS as u64;
        if in_range {
            self.masks.present |= 1 << id;
        } else {
            log::warn!("hart {} is beyond the {} supported harts", id, MAX_HARTS);
        }

        let enabled =
            in_range && hart.status.is_none_or(|_| hart.status_okay) && hart.mmu_supported;
        if enabled {
            return;
        }
        if in_range {
            self.masks.disabled |= 1 << id;
        }
        log::info!("masking hart {}", id);
        // The value may grow into its alignment padding.
        let masked_len = HART_STATUS_MASKED.len() + 1;
        match hart.status {
            Some((offset, len)) if align4(len) >= masked_len => {
                let used = offset + align4(masked_len);
                let slot = &mut blob[offset..used];
                slot.fill(0);
                slot[..HART_STATUS_MASKED.len()].copy_from_slice(HART_STATUS_MASKED.as_bytes());
                write_be32(blob, offset - 8, masked_len as u32);
                // Words the shorter value no longer covers become tokens again.
                nop_range(blob, used..offset + align4(len));
            }
            _ => nop_range(blob, node.begin..node.end),
        }
    }
}

/// Masks the hart nodes that must not run the payload and records which
/// harts exist and which were disabled.
///
/// A hart is disabled when its `status` is present and not `okay`, or when
/// its `mmu-type` is missing or cannot run `scheme`. Its `status` becomes
/// `masked` when the padded value slot has room; otherwise the node is
/// removed.
pub fn filter_harts(blob: &mut [u8], scheme: PagingScheme) -> DtbResult<HartMasks> {
    let mut filter = HartFilter {
        scheme,
        masks: HartMasks::default(),
    };
    scan(blob, &mut filter)?;
    Ok(filter.masks)
}

#[derive(Default)]
struct PlicScratch {
    is_plic: bool,
    interrupts: Option<(usize, usize)>,
}

struct PlicFilter<'a> {
    compatibles: &'a [&'a str],
    redacted: usize,
}

impl FdtVisitor for PlicFilter<'_> {
    type Scratch = PlicScratch;

    fn prop(&mut self, prop: &ScanProp<'_>, plic: &mut PlicScratch) {
        match prop.name {
            "compatible" => {
                plic.is_plic = self.compatibles.iter().any(|c| prop.contains_str(c));
            }
            "interrupts-extended" => {
                plic.interrupts = Some((prop.value_offset, prop.value.len()));
            }
            _ => {}
        }
    }

    fn done(&mut self, _node: &ScanNode, plic: &mut PlicScratch, blob: &mut [u8]) {
        let (true, Some((offset, len))) = (plic.is_plic, plic.interrupts) else {
            return;
        };
        // (phandle, cause) pairs
        for pair in (offset..offset + len / 8 * 8).step_by(8) {
            if read_be32(blob, pair + 4) == Ok(IRQ_M_EXT) {
                write_be32(blob, pair + 4, u32::MAX);
                self.redacted += 1;
            }
        }
    }
}

/// Removes the machine external interrupt contexts from platform interrupt
/// controllers matching `compatibles`. Returns how many were removed.
pub fn filter_plic(blob: &mut [u8], compatibles: &[&str]) -> DtbResult<usize> {
    let mut filter = PlicFilter {
        compatibles,
        redacted: 0,
    };
    scan(blob, &mut filter)?;
    Ok(filter.redacted)
}

struct CompatFilter<'a> {
    compatible: &'a str,
    removed: usize,
}

impl FdtVisitor for CompatFilter<'_> {
    type Scratch = bool;

    fn prop(&mut self, prop: &ScanProp<'_>, matched: &mut bool) {
        if prop.name == "compatible" && prop.contains_str(self.compatible) {
            *matched = true;
        }
    }

    fn done(&mut self, node: &ScanNode, matched: &mut bool, blob: &mut [u8]) {
        if *matched {
            log::debug!("removing {} ({})", node.name(blob), self.compatible);
            nop_range(blob, node.begin..node.end);
            self.removed += 1;
        }
    }
}

/// Removes every node whose `compatible` list contains `compatible`.
/// Returns how many nodes were removed.
pub fn filter_compat(blob: &mut [u8], compatible: &str) -> DtbResult<usize> {
    let mut filter = CompatFilter {
        compatible,
        removed: 0,
    };
    scan(blob, &mut filter)?;
    Ok(filter.removed)
}

/// What [`filter_dtb`] acts on.
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig<'a> {
    pub scheme: PagingScheme,
    pub plic_compatibles: &'a [&'a str],
    pub blocked_compatibles: &'a [&'a str],
}

impl FilterConfig<'static> {
    /// The configuration this loader was built with.
    pub const fn from_build() -> Self {
        Self {
            scheme: PAGING_SCHEME,
            plic_compatibles: PLIC_COMPATIBLES,
            blocked_compatibles: BLOCKED_COMPATIBLES,
        }
    }
}

/// Outcome of [`filter_dtb`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub harts: HartMasks,
    pub plic_contexts: usize,
    pub removed_nodes: usize,
}

/// Runs the hart filter, the interrupt controller filter and one compatible
/// filter per blocked string, in that order.
pub fn filter_dtb(blob: &mut [u8], config: &FilterConfig<'_>) -> DtbResult<FilterReport> {
    let harts = filter_harts(blob, config.scheme)?;
    let plic_contexts = filter_plic(blob, config.plic_compatibles)?;
    let mut removed_nodes = 0;
    for compatible in config.blocked_compatibles {
        removed_nodes += filter_compat(blob, compatible)?;
    }
    log::info!(
        "dtb filtered: harts present {:#x} disabled {:#x}, {} plic contexts, {} nodes removed",
        harts.present,
        harts.disabled,
        plic_contexts,
        removed_nodes
    );
    Ok(FilterReport {
        harts,
        plic_contexts,
        removed_nodes,
    })
}
