//! Page-granular free-list heap on top of [`PageAllocator`].
//!
//! Every block starts with a [`PageMeta`] header followed by the payload the
//! caller receives. Blocks are linked in allocation order through the
//! header's `next` field, stored as a byte offset from the start of the
//! free-RAM extent. Reuse is first-fit over that list. Oversized blocks are
//! granted whole and adjacent free blocks are never merged, so a request that
//! only fits two neighbours combined grows the heap instead.

use core::mem::size_of;

use types::PhysAddr;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::page::PageAllocator;
use crate::Config;

const PAGE_SIZE: usize = Config::PAGE_SIZE;

/// `next` value of the last block.
const END_OF_LIST: u32 = u32::MAX;

/// Block header as stored in memory, directly before the payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct PageMeta {
    /// Granted payload size in bytes; always a whole number of pages.
    size: u32,
    next: u32,
    free: u32,
}

pub const HEADER_SIZE: usize = size_of::<PageMeta>();

/// Offset of a block header from the extent base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BlockId(u32);

/// Snapshot of one block, for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub header: PhysAddr,
    pub size: usize,
    pub free: bool,
}

impl BlockInfo {
    pub fn payload(&self) -> PhysAddr {
        PhysAddr::new(self.header.as_usize() + HEADER_SIZE)
    }
}

#[derive(Debug, Default)]
pub struct Heap {
    /// First block; set by the first allocation and never reset.
    head: Option<BlockId>,
}

impl Heap {
    pub const fn new() -> Self {
        Self { head: None }
    }

    /// Grow by enough whole pages to cover `bytes`. `None` when the page
    /// allocator cannot supply them.
    pub fn sbrk(&mut self, pages: &mut PageAllocator, bytes: usize) -> Option<PhysAddr> {
        let count = bytes.div_ceil(PAGE_SIZE);
        let addr = pages.try_alloc_pages(count)?;
        log::debug!("sbrk: bytes={} pages={} addr={}", bytes, count, addr);
        Some(addr)
    }

    /// Allocate `n_pages` pages of payload. `None` for zero pages or when
    /// physical memory is exhausted; never fatal.
    pub fn alloc(&mut self, pages: &mut PageAllocator, n_pages: usize) -> Option<PhysAddr> {
        if n_pages == 0 {
            return None;
        }
        let size = n_pages.checked_mul(PAGE_SIZE)?;
        let size = u32::try_from(size).ok()?;

        let Some(head) = self.head else {
            let block = self.grow(pages, size)?;
            self.head = Some(block);
            return Some(payload_addr(pages, block));
        };

        let mut cursor = head;
        let last = loop {
            let mut meta = read_meta(pages, cursor)?;
            if meta.free != 0 && meta.size >= size {
                meta.free = 0;
                write_meta(pages, cursor, &meta)?;
                log::debug!("heap: reuse block at +{:#x} (size={} wanted={})", cursor.0, meta.size, size);
                return Some(payload_addr(pages, cursor));
            }
            if meta.next == END_OF_LIST {
                break cursor;
            }
            cursor = BlockId(meta.next);
        };

        let block = self.grow(pages, size)?;
        let mut tail = read_meta(pages, last)?;
        tail.next = block.0;
        write_meta(pages, last, &tail)?;
        Some(payload_addr(pages, block))
    }

    /// Release a payload pointer from [`alloc`](Self::alloc). `None` is a
    /// no-op, and so is any pointer that is not the payload of a block on
    /// the list. The block stays in the list for later first-fit reuse.
    pub fn free(&mut self, pages: &mut PageAllocator, ptr: Option<PhysAddr>) {
        let Some(ptr) = ptr else {
            return;
        };
        let Some((block, mut meta)) = self.find_block(pages, ptr) else {
            log::warn!("heap: free of {} which is not a heap block ignored", ptr);
            return;
        };
        meta.free = 1;
        if write_meta(pages, block, &meta).is_some() {
            log::debug!("heap: free block at +{:#x} (size={})", block.0, meta.size);
        }
    }

    /// Blocks in list order.
    pub fn blocks<'a>(&self, pages: &'a PageAllocator) -> Blocks<'a> {
        Blocks {
            pages,
            next: self.head,
        }
    }

    /// Writable view of the first `len` payload bytes of a live block.
    pub fn payload_mut<'a>(
        &self,
        pages: &'a mut PageAllocator,
        ptr: PhysAddr,
        len: usize,
    ) -> Option<&'a mut [u8]> {
        let (_, meta) = self.find_block(pages, ptr)?;
        if meta.free != 0 || len > meta.size as usize {
            return None;
        }
        pages.bytes_mut(ptr, len)
    }

    /// Block on the list whose payload starts at `ptr`.
    fn find_block(&self, pages: &PageAllocator, ptr: PhysAddr) -> Option<(BlockId, PageMeta)> {
        let wanted = block_of(pages, ptr)?;
        let mut cursor = self.head;
        while let Some(block) = cursor {
            let meta = read_meta(pages, block)?;
            if block == wanted {
                return Some((block, meta));
            }
            cursor = (meta.next != END_OF_LIST).then_some(BlockId(meta.next));
        }
        None
    }

    fn grow(&mut self, pages: &mut PageAllocator, size: u32) -> Option<BlockId> {
        let addr = self.sbrk(pages, size as usize + HEADER_SIZE)?;
        let block = BlockId(u32::try_from(addr.offset_from(pages.base())?).ok()?);
        let meta = PageMeta {
            size,
            next: END_OF_LIST,
            free: 0,
        };
        write_meta(pages, block, &meta)?;
        log::debug!("heap: new block at +{:#x} (size={})", block.0, size);
        Some(block)
    }
}

fn header_addr(pages: &PageAllocator, block: BlockId) -> PhysAddr {
    PhysAddr::new(pages.base().as_usize() + block.0 as usize)
}

fn payload_addr(pages: &PageAllocator, block: BlockId) -> PhysAddr {
    PhysAddr::new(header_addr(pages, block).as_usize() + HEADER_SIZE)
}

fn block_of(pages: &PageAllocator, payload: PhysAddr) -> Option<BlockId> {
    let header = payload.checked_sub(HEADER_SIZE)?;
    let offset = header.offset_from(pages.base())?;
    u32::try_from(offset).ok().map(BlockId)
}

fn read_meta(pages: &PageAllocator, block: BlockId) -> Option<PageMeta> {
    let bytes = pages.bytes(header_addr(pages, block), HEADER_SIZE)?;
    PageMeta::read_from_bytes(bytes).ok()
}

fn write_meta(pages: &mut PageAllocator, block: BlockId, meta: &PageMeta) -> Option<()> {
    let addr = header_addr(pages, block);
    let bytes = pages.bytes_mut(addr, HEADER_SIZE)?;
    meta.write_to(bytes).ok()
}

pub struct Blocks<'a> {
    pages: &'a PageAllocator,
    next: Option<BlockId>,
}

impl Iterator for Blocks<'_> {
    type Item = BlockInfo;

    fn next(&mut self) -> Option<BlockInfo> {
        let block = self.next?;
        let meta = read_meta(self.pages, block)?;
        self.next = (meta.next != END_OF_LIST).then_some(BlockId(meta.next));
        Some(BlockInfo {
            header: header_addr(self.pages, block),
            size: meta.size as usize,
            free: meta.free != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        assert_eq!(HEADER_SIZE, 12);
        let meta = PageMeta {
            size: 4096,
            next: END_OF_LIST,
            free: 1,
        };
        assert_eq!(meta.as_bytes()[..4], 4096u32.to_ne_bytes());
        assert_eq!(PageMeta::read_from_bytes(meta.as_bytes()).ok(), Some(meta));
    }

    #[test]
    fn block_of_rejects_addresses_below_the_extent() {
        let pages = PageAllocator::empty();
        assert_eq!(block_of(&pages, PhysAddr(4)), None);
        assert_eq!(block_of(&pages, PhysAddr(HEADER_SIZE + 8)), Some(BlockId(8)));
    }
}
