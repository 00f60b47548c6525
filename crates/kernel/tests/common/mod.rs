#![allow(dead_code)]

use std::alloc::{Layout, alloc};
use std::ptr;

use kernel::arch::host;
use kernel::mm::PageAllocator;
use kernel::{BootInfo, Config, Kernel, PhysAddr};

pub const PAGE_SIZE: usize = Config::PAGE_SIZE;

/// Leaked, page-aligned host memory standing in for the free-RAM extent.
/// Filled with a poison pattern so zeroing is observable.
pub fn ram_window(pages: usize) -> (PhysAddr, PhysAddr) {
    let len = pages.max(1) * PAGE_SIZE;
    let layout = Layout::from_size_align(len, PAGE_SIZE).unwrap();
    let base = unsafe { alloc(layout) };
    assert!(!base.is_null(), "host allocation failed");
    unsafe { ptr::write_bytes(base, 0xa5, len) };
    let base = base as usize;
    (PhysAddr(base), PhysAddr(base + pages * PAGE_SIZE))
}

pub fn page_allocator(pages: usize) -> PageAllocator {
    let (base, end) = ram_window(pages);
    unsafe { PageAllocator::new(base, end) }.unwrap()
}

pub fn boot_info(pages: usize) -> BootInfo {
    let (base, end) = ram_window(pages);
    BootInfo::new(0, 0, host::boot_stack_top(), base.as_usize(), end.as_usize())
}

/// Fresh hart plus a kernel initialised over `pages` pages of RAM. Boxed so
/// it never moves.
pub fn booted_kernel(pages: usize) -> Box<Kernel> {
    host::reset();
    let mut kernel = Box::new(Kernel::new());
    unsafe { kernel.init(&boot_info(pages)) }.unwrap();
    kernel
}
