//! Boot glue shared by the kernel binary.

pub use types::BootInfo;

/// Zero the uninitialized-data region.
pub fn clear_bss(bss: &mut [u8]) {
    bss.fill(0);
}

#[cfg(target_arch = "riscv32")]
mod linker {
    unsafe extern "C" {
        pub static __bss: u8;
        pub static __bss_end: u8;
        pub static __stack_top: u8;
        pub static __free_ram: u8;
        pub static __free_ram_end: u8;
    }
}

/// Layout from `kernel.ld`.
#[cfg(target_arch = "riscv32")]
pub fn boot_info() -> BootInfo {
    // SAFETY: only the addresses of the linker symbols are taken.
    unsafe {
        BootInfo::new(
            &raw const linker::__bss as usize,
            &raw const linker::__bss_end as usize,
            &raw const linker::__stack_top as usize,
            &raw const linker::__free_ram as usize,
            &raw const linker::__free_ram_end as usize,
        )
    }
}

/// # Safety
/// Must run first thing after entry, before any static in `.bss` is used.
#[cfg(target_arch = "riscv32")]
pub unsafe fn clear_kernel_bss(info: &BootInfo) {
    // SAFETY: the bounds come from the linker script and nothing lives in
    // `.bss` yet.
    let bss = unsafe { core::slice::from_raw_parts_mut(info.bss_start as *mut u8, info.bss_len()) };
    clear_bss(bss);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_every_byte() {
        let mut bss = [0xffu8; 64];
        clear_bss(&mut bss);
        assert!(bss.iter().all(|&b| b == 0));
    }
}
