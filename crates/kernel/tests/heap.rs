mod common;

use common::PAGE_SIZE;
use kernel::mm::Heap;
use kernel::mm::heap::HEADER_SIZE;

#[test]
fn test_first_allocation_installs_head() {
    let mut pages = common::page_allocator(8);
    let mut heap = Heap::new();
    assert_eq!(heap.blocks(&pages).count(), 0);

    let ptr = heap.alloc(&mut pages, 1).unwrap();
    assert_eq!(ptr.as_usize(), pages.base().as_usize() + HEADER_SIZE);
    // One page of payload plus the header spills into a second page.
    assert_eq!(pages.allocated_pages(), 2);

    let blocks: Vec<_> = heap.blocks(&pages).collect();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].size, PAGE_SIZE);
    assert!(!blocks[0].free);
    assert_eq!(blocks[0].payload(), ptr);
}

#[test]
fn test_freed_block_is_reused_first_fit() {
    let mut pages = common::page_allocator(16);
    let mut heap = Heap::new();

    let a = heap.alloc(&mut pages, 2).unwrap();
    let b = heap.alloc(&mut pages, 1).unwrap();
    heap.free(&mut pages, Some(a));
    let used = pages.allocated_pages();

    // Smaller request takes A whole; no new pages.
    let c = heap.alloc(&mut pages, 1).unwrap();
    assert_eq!(c, a);
    assert_eq!(pages.allocated_pages(), used);

    let blocks: Vec<_> = heap.blocks(&pages).collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].size, 2 * PAGE_SIZE);
    assert!(!blocks[0].free);
    assert_eq!(blocks[1].payload(), b);
}

#[test]
fn test_adjacent_free_blocks_are_not_coalesced() {
    let mut pages = common::page_allocator(16);
    let mut heap = Heap::new();

    let a = heap.alloc(&mut pages, 1).unwrap();
    let b = heap.alloc(&mut pages, 1).unwrap();
    heap.free(&mut pages, Some(a));
    heap.free(&mut pages, Some(b));
    let used = pages.allocated_pages();

    let c = heap.alloc(&mut pages, 2).unwrap();
    assert_ne!(c, a);
    assert_ne!(c, b);
    assert_eq!(pages.allocated_pages(), used + 3);

    let free: Vec<bool> = heap.blocks(&pages).map(|block| block.free).collect();
    assert_eq!(free, vec![true, true, false]);
}

#[test]
fn test_free_none_is_noop() {
    let mut pages = common::page_allocator(4);
    let mut heap = Heap::new();
    heap.free(&mut pages, None);
    assert_eq!(heap.blocks(&pages).count(), 0);

    let a = heap.alloc(&mut pages, 1).unwrap();
    heap.free(&mut pages, None);
    assert!(!heap.blocks(&pages).next().unwrap().free);
    heap.free(&mut pages, Some(a));
    assert!(heap.blocks(&pages).next().unwrap().free);
}

#[test]
fn test_exhaustion_returns_none() {
    let mut pages = common::page_allocator(3);
    let mut heap = Heap::new();

    assert_eq!(heap.alloc(&mut pages, 0), None);
    let a = heap.alloc(&mut pages, 2).unwrap();
    assert_eq!(pages.remaining_pages(), 0);
    assert_eq!(heap.alloc(&mut pages, 1), None);

    // The free list still works once something is released.
    heap.free(&mut pages, Some(a));
    assert_eq!(heap.alloc(&mut pages, 1), Some(a));
}

#[test]
fn test_payload_view() {
    let mut pages = common::page_allocator(4);
    let mut heap = Heap::new();
    let ptr = heap.alloc(&mut pages, 1).unwrap();

    let payload = heap.payload_mut(&mut pages, ptr, 16).unwrap();
    assert!(payload.iter().all(|&b| b == 0));
    payload.copy_from_slice(b"sixteen bytes!!!");
    assert_eq!(pages.bytes(ptr, 16).unwrap(), b"sixteen bytes!!!");

    assert!(heap.payload_mut(&mut pages, ptr, PAGE_SIZE + 1).is_none());
    heap.free(&mut pages, Some(ptr));
    assert!(heap.payload_mut(&mut pages, ptr, 1).is_none());
}

#[test]
fn test_kernel_heap_wrappers() {
    let mut kernel = common::booted_kernel(8);
    let a = kernel.alloc(1);
    assert!(a.is_some());
    kernel.free(a);
    assert_eq!(kernel.alloc(1), a);
}

#[test]
fn test_reuse_takes_first_large_enough_block() {
    let mut pages = common::page_allocator(16);
    let mut heap = Heap::new();

    let big = heap.alloc(&mut pages, 3).unwrap();
    let _middle = heap.alloc(&mut pages, 1).unwrap();
    let last = heap.alloc(&mut pages, 1).unwrap();
    heap.free(&mut pages, Some(big));
    heap.free(&mut pages, Some(last));
    let used = pages.allocated_pages();

    // The 3-page block comes first in the list, so it wins over the exact fit.
    assert_eq!(heap.alloc(&mut pages, 1), Some(big));
    assert_eq!(pages.allocated_pages(), used);

    let free: Vec<bool> = heap.blocks(&pages).map(|block| block.free).collect();
    assert_eq!(free, vec![false, false, true]);
}

#[test]
fn test_free_ignores_pointers_that_are_not_blocks() {
    let mut kernel = common::booted_kernel(16);

    // A pointer into the middle of a live payload.
    let a = kernel.alloc(1).unwrap();
    kernel
        .heap
        .payload_mut(&mut kernel.pages, a, 128)
        .unwrap()
        .fill(0x11);
    kernel.free(a.checked_add(100));
    assert!(kernel.pages.bytes(a, 128).unwrap().iter().all(|&b| b == 0x11));
    assert!(!kernel.heap.blocks(&kernel.pages).next().unwrap().free);

    // A pointer into a page the heap never owned.
    let raw = kernel.alloc_pages(1).unwrap();
    kernel.free(raw.checked_add(HEADER_SIZE));
    assert!(kernel.pages.bytes(raw, PAGE_SIZE).unwrap().iter().all(|&b| b == 0));
    assert!(kernel.heap.payload_mut(&mut kernel.pages, raw.checked_add(HEADER_SIZE).unwrap(), 1).is_none());

    // The real block is still released normally.
    kernel.free(Some(a));
    assert!(kernel.heap.blocks(&kernel.pages).next().unwrap().free);
    assert_eq!(kernel.heap.blocks(&kernel.pages).count(), 1);
}
