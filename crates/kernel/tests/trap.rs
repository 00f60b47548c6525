mod common;

use kernel::arch::{self, host};
use kernel::console;
use kernel::fatal;
use kernel::trap::{self, SIE_STIE, TrapFrame, TrapInfo, TrapVectorMode, decode_stvec};
use kernel::FatalKind;

#[test]
fn test_boot_installs_direct_vector() {
    let _kernel = common::booted_kernel(2);
    let (base, mode) = decode_stvec(arch::read_stvec());
    assert_eq!(base, arch::trap_entry_addr());
    assert_eq!(mode, Some(TrapVectorMode::Direct));
}

#[test]
fn test_vectored_mode_points_at_table() {
    host::reset();
    let value = trap::install_trap_vector(TrapVectorMode::Vectored).unwrap();
    assert_eq!(value, arch::trap_vector_table_addr() | 1);
    assert_eq!(arch::read_stvec(), value);
}

#[test]
fn test_every_trap_reports_diagnostics() {
    host::reset();
    host::set_trap_info(TrapInfo::new(2, 0x0000_0013, 0x8020_0144));
    let mut frame = TrapFrame {
        sp: 0x8021_0000,
        ..TrapFrame::default()
    };

    let err = trap::kernel_trap(&mut frame).unwrap_err();
    assert_eq!(
        *err.kind(),
        FatalKind::UnexpectedTrap {
            scause: 2,
            stval: 0x13,
            sepc: 0x8020_0144,
        }
    );

    console::take_output();
    let parked = std::panic::catch_unwind(|| fatal::halt(&err));
    assert!(parked.is_err());
    let out = console::take_output();
    assert!(out.starts_with("PANIC: "), "{out}");
    assert!(out.contains("scause=00000002 stval=00000013 sepc=80200144 (illegal instruction)"));
}

#[test]
fn test_timer_interrupts_enable_bits() {
    host::reset();
    assert!(!host::interrupts_enabled());
    trap::enable_timer_interrupts();
    assert!(host::interrupts_enabled());
    assert_eq!(host::enabled_sources() & SIE_STIE, SIE_STIE);
}
