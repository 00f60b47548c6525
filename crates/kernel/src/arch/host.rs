//! Simulated hart for running the kernel core on the build machine.
//!
//! Each thread owns one hart: a live callee-saved register bank, a live
//! stack pointer into a private boot stack, the CSRs the kernel writes, and
//! a console capture buffer. `switch_context` pushes and pops the exact same
//! frame as the riscv32 stub, on real stack memory, so saved stack pointers
//! stored in process control blocks behave identically; control flow itself
//! does not move, callers observe the switch through [`live_regs`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::mem::size_of;

use crate::sbi::{EID_CONSOLE_GETCHAR, EID_CONSOLE_PUTCHAR, EID_SYSTEM_RESET, SbiError, SbiRet};
use crate::task::{SWITCH_FRAME_SIZE, SwitchFrame};
use crate::trap::{SSTATUS_SIE, TrapInfo};

pub const TRAP_VECTOR_TABLE_ENTRIES: usize = 16;

const HOST_TRAP_ENTRY: usize = 0x8020_0000;
const HOST_TRAP_VECTOR_TABLE: usize = 0x8020_0100;
const BOOT_STACK_WORDS: usize = 1024;

struct Hart {
    regs: SwitchFrame,
    sp: usize,
    stvec: usize,
    sscratch: usize,
    sstatus: usize,
    sie: usize,
    trap: TrapInfo,
    console: Vec<u8>,
    input: VecDeque<u8>,
    shutdown_requested: bool,
    boot_stack: Box<[usize]>,
}

impl Hart {
    fn new() -> Self {
        let boot_stack = vec![0usize; BOOT_STACK_WORDS].into_boxed_slice();
        let sp = boot_stack.as_ptr() as usize + BOOT_STACK_WORDS * size_of::<usize>();
        Self {
            regs: SwitchFrame::default(),
            sp,
            stvec: 0,
            sscratch: 0,
            sstatus: 0,
            sie: 0,
            trap: TrapInfo::default(),
            console: Vec::new(),
            input: VecDeque::new(),
            shutdown_requested: false,
            boot_stack,
        }
    }

    fn boot_stack_top(&self) -> usize {
        self.boot_stack.as_ptr() as usize + self.boot_stack.len() * size_of::<usize>()
    }
}

thread_local! {
    static HART: RefCell<Hart> = RefCell::new(Hart::new());
}

fn with_hart<R>(f: impl FnOnce(&mut Hart) -> R) -> R {
    HART.with(|hart| f(&mut hart.borrow_mut()))
}

/// Power-cycle this thread's hart. Stack pointers saved from the previous
/// boot stack become dangling.
pub fn reset() {
    with_hart(|hart| *hart = Hart::new());
}

/// Callee-saved registers of whatever is "running" on this hart.
pub fn live_regs() -> SwitchFrame {
    with_hart(|hart| hart.regs)
}

pub fn set_live_regs(regs: SwitchFrame) {
    with_hart(|hart| hart.regs = regs);
}

pub fn live_sp() -> usize {
    with_hart(|hart| hart.sp)
}

pub fn boot_stack_top() -> usize {
    with_hart(|hart| hart.boot_stack_top())
}

/// Latch the diagnostics the next `read_trap_info` returns.
pub fn set_trap_info(info: TrapInfo) {
    with_hart(|hart| hart.trap = info);
}

pub fn interrupts_enabled() -> bool {
    with_hart(|hart| hart.sstatus & SSTATUS_SIE != 0)
}

/// Current `sie` source mask.
pub fn enabled_sources() -> usize {
    with_hart(|hart| hart.sie)
}

pub fn take_console_output() -> String {
    let bytes = with_hart(|hart| std::mem::take(&mut hart.console));
    String::from_utf8_lossy(&bytes).into_owned()
}

pub fn push_console_input(bytes: &[u8]) {
    with_hart(|hart| hart.input.extend(bytes.iter().copied()));
}

pub fn shutdown_requested() -> bool {
    with_hart(|hart| hart.shutdown_requested)
}

pub fn trap_entry_addr() -> usize {
    HOST_TRAP_ENTRY
}

pub fn trap_vector_table_addr() -> usize {
    HOST_TRAP_VECTOR_TABLE
}

pub fn read_trap_info() -> TrapInfo {
    with_hart(|hart| hart.trap)
}

/// # Safety
/// Mirrors the riscv32 signature; writing the simulated CSR is always safe.
pub unsafe fn write_stvec(value: usize) {
    with_hart(|hart| hart.stvec = value);
}

pub fn read_stvec() -> usize {
    with_hart(|hart| hart.stvec)
}

/// # Safety
/// Mirrors the riscv32 signature; writing the simulated CSR is always safe.
pub unsafe fn write_sscratch(value: usize) {
    with_hart(|hart| hart.sscratch = value);
}

pub fn read_sscratch() -> usize {
    with_hart(|hart| hart.sscratch)
}

pub fn enable_interrupts(sie_bits: usize) {
    with_hart(|hart| {
        hart.sie |= sie_bits;
        hart.sstatus |= SSTATUS_SIE;
    });
}

pub fn disable_interrupts() -> bool {
    with_hart(|hart| {
        let was_enabled = hart.sstatus & SSTATUS_SIE != 0;
        hart.sstatus &= !SSTATUS_SIE;
        was_enabled
    })
}

pub fn restore_interrupts(was_enabled: bool) {
    if was_enabled {
        with_hart(|hart| hart.sstatus |= SSTATUS_SIE);
    }
}

/// Same contract and stack layout as the riscv32 stub.
///
/// # Safety
/// `save_to` must be writable and `*resume_from` must hold a stack pointer
/// with a [`SwitchFrame`] stored at it.
pub unsafe fn switch_context(save_to: *mut usize, resume_from: *const usize) {
    with_hart(|hart| {
        let sp = hart.sp - SWITCH_FRAME_SIZE;
        unsafe {
            (sp as *mut SwitchFrame).write_unaligned(hart.regs);
            save_to.write(sp);
            let next = resume_from.read();
            hart.regs = (next as *const SwitchFrame).read_unaligned();
            hart.sp = next + SWITCH_FRAME_SIZE;
        }
    });
}

pub fn wait_for_interrupt() {}

pub fn park() -> ! {
    panic!("hart parked");
}

pub fn sbi_call(args: [isize; 6], _fid: isize, eid: isize) -> SbiRet {
    with_hart(|hart| match eid {
        EID_CONSOLE_PUTCHAR => {
            hart.console.push(args[0] as u8);
            SbiRet::new(0, 0)
        }
        EID_CONSOLE_GETCHAR => match hart.input.pop_front() {
            Some(byte) => SbiRet::new(byte as isize, 0),
            None => SbiRet::new(-1, 0),
        },
        EID_SYSTEM_RESET => {
            hart.shutdown_requested = true;
            SbiRet::new(0, 0)
        }
        _ => SbiRet::new(SbiError::NOT_SUPPORTED, 0),
    })
}
