//! Lookups the loader makes on the relocated tree.

use config::device::{CHOSEN_KERNEL_END, CHOSEN_KERNEL_START};
use flat_device_tree::Fdt;

use crate::{
    error::DtbResult,
    scan::{FdtVisitor, ScanNode, ScanProp, scan},
};

#[derive(Default)]
struct UartScratch {
    matched: bool,
    address: Option<u64>,
}

struct UartQuery<'a> {
    compatible: &'a str,
    found: Option<u64>,
}

impl FdtVisitor for UartQuery<'_> {
    type Scratch = UartScratch;

    fn prop(&mut self, prop: &ScanProp<'_>, uart: &mut UartScratch) {
        match prop.name {
            "compatible" => uart.matched |= prop.contains_str(self.compatible),
            "reg" => uart.address = prop.address(),
            _ => {}
        }
    }

    fn done(&mut self, _node: &ScanNode, uart: &mut UartScratch, _blob: &mut [u8]) {
        if self.found.is_none() && uart.matched {
            self.found = uart.address;
        }
    }
}

/// Base address of the first UART compatible with `compatible` that has a
/// `reg` property.
pub fn query_uart16550(blob: &mut [u8], compatible: &str) -> DtbResult<Option<u64>> {
    let mut query = UartQuery {
        compatible,
        found: None,
    };
    scan(blob, &mut query)?;
    Ok(query.found)
}

/// A payload placed in memory by an earlier boot stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChosenPayload {
    pub kernel_start: usize,
    pub kernel_end: usize,
}

/// The preloaded payload declared under `/chosen`, if any.
pub fn query_chosen(blob: &[u8]) -> Option<ChosenPayload> {
    let fdt = Fdt::new(blob).ok()?;
    let chosen = fdt.find_node("/chosen")?;
    let kernel_start = chosen.property(CHOSEN_KERNEL_START)?.as_usize()?;
    let kernel_end = chosen.property(CHOSEN_KERNEL_END)?.as_usize()?;
    if kernel_end <= kernel_start {
        log::warn!(
            "ignoring preloaded payload {:#x}..{:#x}",
            kernel_start,
            kernel_end
        );
        return None;
    }
    Some(ChosenPayload {
        kernel_start,
        kernel_end,
    })
}
