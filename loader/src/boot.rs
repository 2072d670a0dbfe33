//! The boot sequence.
//!
//! [`boot_loader`] runs on the boot hart, [`boot_other_hart`] on every other
//! one. Both end in [`enter`], which never returns.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use core::{cmp, fmt, slice};

use arch::{
    hart::park,
    mm::enable_paging,
    privilege::{enter_machine_mode, enter_supervisor_mode},
};
use config::{
    board::{BOOT_MODE, BootMode, PRINT_DEVICE_TREE, SHOW_LOGO},
    device::CONSOLE_COMPATIBLE,
    mm::{KERNEL_START_PHYS, PAGING_SCHEME, PagingScheme},
};
use devtree::{
    DtbError, FilterConfig, FilterReport, dtb_output, filter_dtb, header::fdt_size_at,
    print_tree, query_chosen, query_uart16550, relocate_raw,
};
use driver::println;
use handoff::{BOOT_STATE, BootState, Handoff, HartFate, PublishError};
use mm::{BootPageTables, KernelLayout};

use crate::{layout, machine, vm};

const LOGO: &str = r"
          __                  __
   ____  / /_  ____ _ __  __ / /
  / __ \/ __ \/ __ `// / / // /
 / /_/ / /_/ / /_/ // /_/ //_/
/ .___/_.___/\__,_/ \__, /(_)
/_/ boot loader    /____/
";

/// Physical extent of the payload image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    pub start: usize,
    pub end: usize,
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    Dtb(DtbError),
    Publish(PublishError),
    NoPayload,
}

impl From<DtbError> for BootError {
    fn from(err: DtbError) -> Self {
        Self::Dtb(err)
    }
}

impl From<PublishError> for BootError {
    fn from(err: PublishError) -> Self {
        Self::Publish(err)
    }
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dtb(err) => write!(f, "device tree: {}", err),
            Self::Publish(err) => write!(f, "{}", err),
            Self::NoPayload => write!(f, "no payload embedded or preloaded"),
        }
    }
}

/// What the boot hart published for the other harts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    /// Entry point as the payload sees it.
    pub entry: usize,
    /// Device tree address as the payload sees it.
    pub dtb: usize,
    pub report: FilterReport,
}

/// The payload preloaded by an earlier stage if `/chosen` names one,
/// otherwise `embedded`.
pub fn select_payload(tree: &[u8], embedded: Payload) -> Payload {
    match query_chosen(tree) {
        Some(chosen) => {
            log::info!(
                "preloaded payload {:#x} - {:#x}",
                chosen.kernel_start,
                chosen.kernel_end
            );
            Payload {
                start: chosen.kernel_start,
                end: chosen.kernel_end,
            }
        }
        None => embedded,
    }
}

/// Where the relocated device tree goes: past both the loader image and
/// the payload, on a megapage boundary.
pub fn dtb_destination(loader_end: usize, payload: &Payload, scheme: PagingScheme) -> usize {
    dtb_output(cmp::max(loader_end, payload.end), scheme.megapage_size())
}

/// Filters the relocated tree at `dtb` (physical address `dtb_phys`),
/// builds `tables` for a supervisor-mode payload and publishes the entry
/// point through `state`. A machine-mode payload runs untranslated and
/// leaves `tables` alone.
///
/// `on_console` receives the console UART found in the tree, before any
/// filtering output is logged.
pub fn prepare(
    dtb: &mut [u8],
    dtb_phys: usize,
    payload: Payload,
    tables: &mut BootPageTables<'_>,
    mode: BootMode,
    state: &BootState,
    on_console: impl FnOnce(usize),
) -> Result<Published, BootError> {
    if let Some(base) = query_uart16550(dtb, CONSOLE_COMPATIBLE)? {
        on_console(base as usize);
    }

    let config = FilterConfig {
        scheme: tables.scheme(),
        ..FilterConfig::from_build()
    };
    let report = filter_dtb(dtb, &config)?;
    if PRINT_DEVICE_TREE {
        print_tree(dtb);
    }

    let (entry, dtb) = match mode {
        BootMode::Supervisor => {
            let layout = KernelLayout {
                phys_start: KERNEL_START_PHYS,
                map_end: dtb_phys + dtb.len(),
            };
            tables.build(&layout);
            log::info!(
                "{:?} tables at ppn {:#x} map {:#x} - {:#x}",
                tables.scheme(),
                tables.root_ppn(),
                layout.phys_start,
                layout.map_end
            );
            let offset = tables.scheme().virt_offset();
            (payload.start + offset, dtb_phys + offset)
        }
        BootMode::Machine => (payload.start, dtb_phys),
    };
    state.record_filter(report.harts.present, report.harts.disabled, dtb);
    state.publish(entry)?;
    log::info!("entry point {:#x} published, dtb at {:#x}", entry, dtb);

    Ok(Published { entry, dtb, report })
}

fn run_boot_hart(dtb: usize) -> Result<Published, BootError> {
    let tree = unsafe {
        let size = fdt_size_at(dtb)?;
        slice::from_raw_parts(dtb as *const u8, size)
    };
    let embedded = Payload {
        start: layout::payload_start(),
        end: layout::payload_end(),
    };
    let payload = select_payload(tree, embedded);
    if payload.is_empty() {
        return Err(BootError::NoPayload);
    }

    let dtb_phys = dtb_destination(layout::loader_end(), &payload, PAGING_SCHEME);
    // Nothing lives past the image yet; the copy may overlap the source.
    let relocated = unsafe { relocate_raw(dtb, dtb_phys)? };
    let mut tables = unsafe { vm::boot_tables() };

    prepare(
        relocated,
        dtb_phys,
        payload,
        &mut tables,
        BOOT_MODE,
        &BOOT_STATE,
        |base| {
            unsafe { driver::init_uart16550(base) };
            if SHOW_LOGO {
                println!("{}", LOGO);
            }
            log::info!(
                "loader {:#x} - {:#x}, payload {:#x} - {:#x}, dtb {:#x} -> {:#x}",
                layout::loader_start(),
                layout::loader_end(),
                payload.start,
                payload.end,
                dtb,
                dtb_phys
            );
        },
    )
}

/// Boot hart: prepares the payload's environment, publishes the entry
/// point and then takes the same path as every other hart.
pub fn boot_loader(hart_id: usize, dtb: usize) -> ! {
    logger::init();
    machine::init_hart(hart_id);
    if let Err(err) = run_boot_hart(dtb) {
        panic!("boot failed: {}", err);
    }
    enter(BOOT_STATE.wait_and_decide(hart_id))
}

/// Every hart but the boot hart: waits for the entry point, then enters the
/// payload or parks.
pub fn boot_other_hart(hart_id: usize) -> ! {
    machine::init_hart(hart_id);
    enter(BOOT_STATE.wait_and_decide(hart_id))
}

/// Carries out `fate`.
pub fn enter(fate: HartFate) -> ! {
    match fate {
        HartFate::Park => park(),
        HartFate::Enter(handoff) => enter_payload(handoff),
    }
}

fn enter_payload(handoff: Handoff) -> ! {
    let Handoff {
        entry,
        hart_id,
        dtb,
        live_harts,
    } = handoff;
    match BOOT_MODE {
        BootMode::Machine => unsafe {
            let call_vector = &raw const machine::CALL_VECTOR as usize;
            enter_machine_mode(entry, hart_id, dtb, live_harts, call_vector)
        },
        BootMode::Supervisor => unsafe {
            enable_paging(vm::satp());
            enter_supervisor_mode(entry, hart_id, dtb, live_harts)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::mm::{KERNEL_SLOT, SV64_VIRT_OFFSET};
    use devtree::{builder::FdtBuilder, relocate};
    use mm::{PageTableEntry, Sv64Table};
    use std::thread;

    const MIB: usize = 1 << 20;

    fn two_hart_platform(chosen: Option<(u32, u32)>) -> Vec<u8> {
        let b = FdtBuilder::new()
            .begin_node("")
            .prop_u32("#address-cells", 2)
            .prop_u32("#size-cells", 2)
            .begin_node("chosen");
        let b = match chosen {
            Some((start, end)) => b
                .prop_u32("riscv,kernel-start", start)
                .prop_u32("riscv,kernel-end", end),
            None => b,
        };
        let mut b = b
            .end_node()
            .begin_node("cpus")
            .prop_u32("#address-cells", 1)
            .prop_u32("#size-cells", 0);
        for (id, status) in [(0, "okay"), (1, "disabled")] {
            b = b
                .begin_node(&format!("cpu@{id}"))
                .prop_str("device_type", "cpu")
                .prop_u32("reg", id)
                .prop_str("mmu-type", "riscv,sv39")
                .prop_str("status", status)
                .end_node();
        }
        b.end_node()
            .begin_node("soc")
            .prop_u32("#address-cells", 1)
            .prop_u32("#size-cells", 1)
            .begin_node("clint@2000000")
            .prop_strs("compatible", &["riscv,clint0"])
            .prop_cells("reg", &[0x200_0000, 0x1_0000])
            .end_node()
            .begin_node("uart@10000000")
            .prop_strs("compatible", &["ns16550a"])
            .prop_cells("reg", &[0x1000_0000, 0x100])
            .end_node()
            .end_node()
            .end_node()
            .finish()
    }

    fn contains(blob: &[u8], needle: &[u8]) -> bool {
        blob.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn dtb_lands_past_loader_and_payload() {
        let payload = Payload {
            start: 0x8020_0000,
            end: 0x8031_0000,
        };
        assert_eq!(
            dtb_destination(0x8004_0000, &payload, PagingScheme::Sv39),
            0x8040_0000
        );
        assert_eq!(
            dtb_destination(0x8060_0000, &payload, PagingScheme::Sv39),
            0x8060_0000
        );
        assert_eq!(
            dtb_destination(0x8004_0000, &payload, PagingScheme::Sv32),
            0x8000_0000 + 4 * MIB
        );
    }

    #[test]
    fn chosen_payload_wins() {
        let embedded = Payload {
            start: 0x8020_0000,
            end: 0x8030_0000,
        };
        let tree = two_hart_platform(None);
        assert_eq!(select_payload(&tree, embedded), embedded);

        let tree = two_hart_platform(Some((0x8100_0000, 0x8180_0000)));
        assert_eq!(
            select_payload(&tree, embedded),
            Payload {
                start: 0x8100_0000,
                end: 0x8180_0000
            }
        );
    }

    #[test]
    fn two_hart_boot() {
        let firmware_tree = two_hart_platform(None);
        let payload = Payload {
            start: 0x8020_0000,
            end: 0x8030_0000,
        };
        let dtb_phys = dtb_destination(0x8040_1000, &payload, PagingScheme::Sv39);
        assert_eq!(dtb_phys, 0x8060_0000);

        let mut dst = vec![0u8; firmware_tree.len()];
        let relocated = relocate(&firmware_tree, &mut dst).unwrap();
        assert_eq!(&relocated[..], &firmware_tree[..]);

        let mut root = Box::new(Sv64Table::empty());
        let mut tables = BootPageTables::Sv39 { root: &mut root };
        let state = BootState::new();
        let mut console = None;
        let published = prepare(
            relocated,
            dtb_phys,
            payload,
            &mut tables,
            BootMode::Supervisor,
            &state,
            |base| console = Some(base),
        )
        .unwrap();

        assert_eq!(console, Some(0x1000_0000));

        // The copy was filtered, the firmware tree was not.
        assert_eq!(published.report.harts.present, 0b11);
        assert_eq!(published.report.harts.disabled, 0b10);
        assert_eq!(published.report.removed_nodes, 1);
        assert!(contains(&dst, b"masked\0"));
        assert!(!contains(&dst, b"disabled\0"));
        assert!(!contains(&dst, b"riscv,clint0"));
        assert!(contains(&firmware_tree, b"disabled\0"));

        let leaf = root[KERNEL_SLOT];
        assert!(leaf.is_leaf());
        assert_eq!(leaf.ppn(), KERNEL_START_PHYS >> 12);

        let virt = SV64_VIRT_OFFSET as usize;
        assert_eq!(published.entry, 0x8020_0000 + virt);
        assert_eq!(published.dtb, dtb_phys + virt);
        assert_eq!(state.entry().get(), Some(published.entry));

        let (boot_hart, hart1) = thread::scope(|s| {
            let hart1 = s.spawn(|| state.wait_and_decide(1));
            (state.wait_and_decide(0), hart1.join().unwrap())
        });
        assert_eq!(
            boot_hart,
            HartFate::Enter(Handoff {
                entry: published.entry,
                hart_id: 0,
                dtb: published.dtb,
                live_harts: 0b01,
            })
        );
        assert_eq!(hart1, HartFate::Park);
    }

    #[test]
    fn machine_mode_uses_physical_addresses() {
        let mut tree = two_hart_platform(None);
        let mut root = Box::new(Sv64Table::empty());
        let mut tables = BootPageTables::Sv39 { root: &mut root };
        let state = BootState::new();
        let payload = Payload {
            start: 0x8020_0000,
            end: 0x8030_0000,
        };
        let published = prepare(
            &mut tree,
            0x8040_0000,
            payload,
            &mut tables,
            BootMode::Machine,
            &state,
            |_| {},
        )
        .unwrap();
        assert_eq!(published.entry, 0x8020_0000);
        assert_eq!(published.dtb, 0x8040_0000);
        drop(tables);
        assert_eq!(root.valid_entries().count(), 0);

        let mut again = Box::new(Sv64Table::empty());
        let mut tables = BootPageTables::Sv39 { root: &mut again };
        assert_eq!(
            prepare(
                &mut tree,
                0x8040_0000,
                payload,
                &mut tables,
                BootMode::Machine,
                &state,
                |_| {},
            ),
            Err(BootError::Publish(PublishError::AlreadyPublished(0x8020_0000)))
        );
    }
}
