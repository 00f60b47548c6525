//! Boot-time layout handed from the link step to the kernel core.
//!
//! The boot glue collects the linker-provided bounds into a `BootInfo` so the
//! rest of the kernel never touches linker symbols directly.

/// Memory layout fixed by the linker script.
///
/// All bounds are half-open (`start..end`). Fields are `usize` so the same
/// structure can describe a host-backed RAM window in tests.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootInfo {
    /// First byte of the zero-initialized data region.
    pub bss_start: usize,
    /// One past the last byte of the zero-initialized data region.
    pub bss_end: usize,
    /// Top of the boot stack (`sp` at entry).
    pub stack_top: usize,
    /// First byte of the free-RAM extent served by the page allocator.
    pub free_ram_start: usize,
    /// One past the last byte of the free-RAM extent.
    pub free_ram_end: usize,
}

impl BootInfo {
    pub const fn new(
        bss_start: usize,
        bss_end: usize,
        stack_top: usize,
        free_ram_start: usize,
        free_ram_end: usize,
    ) -> Self {
        Self {
            bss_start,
            bss_end,
            stack_top,
            free_ram_start,
            free_ram_end,
        }
    }

    pub const fn bss_len(&self) -> usize {
        self.bss_end.saturating_sub(self.bss_start)
    }

    pub const fn free_ram_len(&self) -> usize {
        self.free_ram_end.saturating_sub(self.free_ram_start)
    }

    /// Number of whole pages in the free-RAM extent.
    pub const fn free_ram_pages(&self, page_size: usize) -> usize {
        self.free_ram_len() / page_size
    }
}
