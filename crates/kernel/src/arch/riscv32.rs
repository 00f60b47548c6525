use core::arch::{asm, global_asm, naked_asm};

use crate::fatal;
use crate::sbi::SbiRet;
use crate::trap::{self, SSTATUS_SIE, TrapFrame, TrapInfo};

/// Slots in the vectored jump table; every one jumps to `trap_entry`.
pub const TRAP_VECTOR_TABLE_ENTRIES: usize = 16;

// Trap entry: swap in the kernel stack from sscratch, store the register
// file as a `TrapFrame` (31 words, `sp` last), re-arm sscratch with the
// kernel stack top, call `trap_handler`, then restore and `sret`.
global_asm!(
    r#"
    .pushsection .text.trap, "ax", @progbits
    .balign 4
    .global trap_entry
trap_entry:
    csrrw sp, sscratch, sp
    addi sp, sp, -4 * 31
    sw ra,  4 * 0(sp)
    sw gp,  4 * 1(sp)
    sw tp,  4 * 2(sp)
    sw t0,  4 * 3(sp)
    sw t1,  4 * 4(sp)
    sw t2,  4 * 5(sp)
    sw t3,  4 * 6(sp)
    sw t4,  4 * 7(sp)
    sw t5,  4 * 8(sp)
    sw t6,  4 * 9(sp)
    sw a0,  4 * 10(sp)
    sw a1,  4 * 11(sp)
    sw a2,  4 * 12(sp)
    sw a3,  4 * 13(sp)
    sw a4,  4 * 14(sp)
    sw a5,  4 * 15(sp)
    sw a6,  4 * 16(sp)
    sw a7,  4 * 17(sp)
    sw s0,  4 * 18(sp)
    sw s1,  4 * 19(sp)
    sw s2,  4 * 20(sp)
    sw s3,  4 * 21(sp)
    sw s4,  4 * 22(sp)
    sw s5,  4 * 23(sp)
    sw s6,  4 * 24(sp)
    sw s7,  4 * 25(sp)
    sw s8,  4 * 26(sp)
    sw s9,  4 * 27(sp)
    sw s10, 4 * 28(sp)
    sw s11, 4 * 29(sp)

    csrr a0, sscratch
    sw a0, 4 * 30(sp)

    addi a0, sp, 4 * 31
    csrw sscratch, a0

    mv a0, sp
    call {handler}

    lw ra,  4 * 0(sp)
    lw gp,  4 * 1(sp)
    lw tp,  4 * 2(sp)
    lw t0,  4 * 3(sp)
    lw t1,  4 * 4(sp)
    lw t2,  4 * 5(sp)
    lw t3,  4 * 6(sp)
    lw t4,  4 * 7(sp)
    lw t5,  4 * 8(sp)
    lw t6,  4 * 9(sp)
    lw a0,  4 * 10(sp)
    lw a1,  4 * 11(sp)
    lw a2,  4 * 12(sp)
    lw a3,  4 * 13(sp)
    lw a4,  4 * 14(sp)
    lw a5,  4 * 15(sp)
    lw a6,  4 * 16(sp)
    lw a7,  4 * 17(sp)
    lw s0,  4 * 18(sp)
    lw s1,  4 * 19(sp)
    lw s2,  4 * 20(sp)
    lw s3,  4 * 21(sp)
    lw s4,  4 * 22(sp)
    lw s5,  4 * 23(sp)
    lw s6,  4 * 24(sp)
    lw s7,  4 * 25(sp)
    lw s8,  4 * 26(sp)
    lw s9,  4 * 27(sp)
    lw s10, 4 * 28(sp)
    lw s11, 4 * 29(sp)
    lw sp,  4 * 30(sp)
    sret

    .balign 64
    .global trap_vector_table
trap_vector_table:
    .rept {entries}
    j trap_entry
    .endr
    .popsection
    "#,
    handler = sym trap_handler,
    entries = const TRAP_VECTOR_TABLE_ENTRIES,
);

unsafe extern "C" {
    fn trap_entry();
    fn trap_vector_table();
}

extern "C" fn trap_handler(frame: *mut TrapFrame) {
    // SAFETY: the entry stub passes the frame it just stored on the kernel stack.
    let frame = unsafe { &mut *frame };
    if let Err(fatal) = trap::kernel_trap(frame) {
        fatal::halt(&fatal);
    }
}

pub fn trap_entry_addr() -> usize {
    trap_entry as *const () as usize
}

pub fn trap_vector_table_addr() -> usize {
    trap_vector_table as *const () as usize
}

pub fn read_trap_info() -> TrapInfo {
    let scause: u32;
    let stval: u32;
    let sepc: u32;
    unsafe {
        asm!("csrr {0}, scause", out(reg) scause);
        asm!("csrr {0}, stval", out(reg) stval);
        asm!("csrr {0}, sepc", out(reg) sepc);
    }
    TrapInfo::new(scause, stval, sepc)
}

/// # Safety
/// `value` must point at a valid trap entry.
pub unsafe fn write_stvec(value: usize) {
    unsafe { asm!("csrw stvec, {0}", in(reg) value) };
}

pub fn read_stvec() -> usize {
    let value: usize;
    unsafe { asm!("csrr {0}, stvec", out(reg) value) };
    value
}

/// # Safety
/// `value` must be the top of a stack the next trap may safely use.
pub unsafe fn write_sscratch(value: usize) {
    unsafe { asm!("csrw sscratch, {0}", in(reg) value) };
}

pub fn read_sscratch() -> usize {
    let value: usize;
    unsafe { asm!("csrr {0}, sscratch", out(reg) value) };
    value
}

/// Set the given `sie` source bits, then `sstatus.SIE`.
pub fn enable_interrupts(sie_bits: usize) {
    unsafe {
        asm!("csrs sie, {0}", in(reg) sie_bits);
        asm!("csrs sstatus, {0}", in(reg) SSTATUS_SIE);
    }
}

/// Clear `sstatus.SIE`; returns whether it was set.
pub fn disable_interrupts() -> bool {
    let prev: usize;
    unsafe { asm!("csrrc {0}, sstatus, {1}", out(reg) prev, in(reg) SSTATUS_SIE) };
    prev & SSTATUS_SIE != 0
}

pub fn restore_interrupts(was_enabled: bool) {
    if was_enabled {
        unsafe { asm!("csrs sstatus, {0}", in(reg) SSTATUS_SIE) };
    }
}

/// Push `ra, s0..s11` on the current stack, store `sp` into `*save_to`,
/// load `sp` from `*resume_from` and pop the same bank.
///
/// # Safety
/// `*resume_from` must hold a stack pointer produced by this function or by
/// `Process::prepare`, and interrupts must be masked.
#[unsafe(naked)]
pub unsafe extern "C" fn switch_context(save_to: *mut usize, resume_from: *const usize) {
    naked_asm!(
        "addi sp, sp, -13 * 4",
        "sw ra,  0  * 4(sp)",
        "sw s0,  1  * 4(sp)",
        "sw s1,  2  * 4(sp)",
        "sw s2,  3  * 4(sp)",
        "sw s3,  4  * 4(sp)",
        "sw s4,  5  * 4(sp)",
        "sw s5,  6  * 4(sp)",
        "sw s6,  7  * 4(sp)",
        "sw s7,  8  * 4(sp)",
        "sw s8,  9  * 4(sp)",
        "sw s9,  10 * 4(sp)",
        "sw s10, 11 * 4(sp)",
        "sw s11, 12 * 4(sp)",
        "sw sp, (a0)",
        "lw sp, (a1)",
        "lw ra,  0  * 4(sp)",
        "lw s0,  1  * 4(sp)",
        "lw s1,  2  * 4(sp)",
        "lw s2,  3  * 4(sp)",
        "lw s3,  4  * 4(sp)",
        "lw s4,  5  * 4(sp)",
        "lw s5,  6  * 4(sp)",
        "lw s6,  7  * 4(sp)",
        "lw s7,  8  * 4(sp)",
        "lw s8,  9  * 4(sp)",
        "lw s9,  10 * 4(sp)",
        "lw s10, 11 * 4(sp)",
        "lw s11, 12 * 4(sp)",
        "addi sp, sp, 13 * 4",
        "ret",
    )
}

pub fn wait_for_interrupt() {
    unsafe { asm!("wfi", options(nomem, nostack)) };
}

pub fn park() -> ! {
    loop {
        wait_for_interrupt();
    }
}

pub fn sbi_call(args: [isize; 6], fid: isize, eid: isize) -> SbiRet {
    let error: isize;
    let value: isize;
    unsafe {
        asm!(
            "ecall",
            inlateout("a0") args[0] => error,
            inlateout("a1") args[1] => value,
            in("a2") args[2],
            in("a3") args[3],
            in("a4") args[4],
            in("a5") args[5],
            in("a6") fid,
            in("a7") eid,
        );
    }
    SbiRet::new(error, value)
}
