use core::{ptr, slice};

use types::PhysAddr;

use crate::{Config, Fatal};

const PAGE_SIZE: usize = Config::PAGE_SIZE;

/// Bump allocator over the free-RAM extent. Pages are zeroed on the way out
/// and never come back.
#[derive(Debug, Clone, Copy)]
pub struct PageAllocator {
    base: PhysAddr,
    end: PhysAddr,
    next: PhysAddr,
}

impl PageAllocator {
    /// An allocator with nothing to hand out, used until boot provides the
    /// real extent.
    pub const fn empty() -> Self {
        Self {
            base: PhysAddr::new(0),
            end: PhysAddr::new(0),
            next: PhysAddr::new(0),
        }
    }

    /// Serve pages from `[base, end)`. A partial page at the end is ignored.
    ///
    /// # Safety
    /// The extent must be RAM that nothing else reads or writes for as long
    /// as the allocator and the pages it returns are alive.
    pub unsafe fn new(base: PhysAddr, end: PhysAddr) -> Result<Self, Fatal> {
        if !base.is_aligned(PAGE_SIZE) {
            return Err(Fatal::invalid_request("free RAM base is not page aligned"));
        }
        let end = if end < base { base } else { end.align_down(PAGE_SIZE) };
        Ok(Self {
            base,
            end,
            next: base,
        })
    }

    pub fn base(&self) -> PhysAddr {
        self.base
    }

    pub fn end(&self) -> PhysAddr {
        self.end
    }

    /// Address the next allocation will return.
    pub fn cursor(&self) -> PhysAddr {
        self.next
    }

    pub fn total_pages(&self) -> usize {
        (self.end.as_usize() - self.base.as_usize()) / PAGE_SIZE
    }

    pub fn allocated_pages(&self) -> usize {
        (self.next.as_usize() - self.base.as_usize()) / PAGE_SIZE
    }

    pub fn remaining_pages(&self) -> usize {
        (self.end.as_usize() - self.next.as_usize()) / PAGE_SIZE
    }

    /// Allocate `n` zeroed pages, or `None` when `n` is zero or more than
    /// remain. The cursor only moves on success.
    pub fn try_alloc_pages(&mut self, n: usize) -> Option<PhysAddr> {
        if n == 0 || n > self.remaining_pages() {
            return None;
        }
        let addr = self.next;
        let len = n * PAGE_SIZE;
        // SAFETY: `[addr, addr + len)` is inside the extent given to `new`
        // and has never been handed out.
        unsafe { ptr::write_bytes(addr.as_mut_ptr::<u8>(), 0, len) };
        self.next = PhysAddr::new(addr.as_usize() + len);
        log::trace!("alloc_pages: n={} addr={} remaining={}", n, addr, self.remaining_pages());
        Some(addr)
    }

    /// Allocate `n` zeroed pages; running out is fatal.
    #[track_caller]
    pub fn alloc_pages(&mut self, n: usize) -> Result<PhysAddr, Fatal> {
        if n == 0 {
            return Err(Fatal::invalid_request("alloc_pages called with zero pages"));
        }
        match self.try_alloc_pages(n) {
            Some(addr) => Ok(addr),
            None => {
                log::error!(
                    "alloc_pages: out of memory (requested={} remaining={})",
                    n,
                    self.remaining_pages()
                );
                Err(Fatal::out_of_memory(n, self.remaining_pages()))
            }
        }
    }

    /// Whether `[addr, addr + len)` lies inside memory already handed out.
    pub fn is_allocated(&self, addr: PhysAddr, len: usize) -> bool {
        match addr.checked_add(len) {
            Some(end) => addr >= self.base && end <= self.next,
            None => false,
        }
    }

    /// View of handed-out memory; `None` outside `[base, cursor)`.
    pub fn bytes(&self, addr: PhysAddr, len: usize) -> Option<&[u8]> {
        if !self.is_allocated(addr, len) {
            return None;
        }
        // SAFETY: the range was checked against the allocated prefix of the
        // extent, which `new`'s contract reserves for us.
        Some(unsafe { slice::from_raw_parts(addr.as_mut_ptr::<u8>(), len) })
    }

    pub fn bytes_mut(&mut self, addr: PhysAddr, len: usize) -> Option<&mut [u8]> {
        if !self.is_allocated(addr, len) {
            return None;
        }
        // SAFETY: as in `bytes`; `&mut self` keeps the view unique.
        Some(unsafe { slice::from_raw_parts_mut(addr.as_mut_ptr::<u8>(), len) })
    }
}

impl Default for PageAllocator {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FatalKind;

    fn ram(pages: usize) -> PageAllocator {
        let layout = std::alloc::Layout::from_size_align(pages * PAGE_SIZE, PAGE_SIZE).unwrap();
        let base = unsafe { std::alloc::alloc(layout) } as usize;
        // Poison the window so zero-filling is observable.
        unsafe { ptr::write_bytes(base as *mut u8, 0xa5, pages * PAGE_SIZE) };
        unsafe { PageAllocator::new(PhysAddr(base), PhysAddr(base + pages * PAGE_SIZE)) }.unwrap()
    }

    #[test]
    fn empty_allocator_has_nothing() {
        let mut pages = PageAllocator::empty();
        assert_eq!(pages.total_pages(), 0);
        assert_eq!(pages.try_alloc_pages(1), None);
    }

    #[test]
    fn rejects_misaligned_base() {
        let err = unsafe { PageAllocator::new(PhysAddr(0x8000_0010), PhysAddr(0x8001_0000)) }.unwrap_err();
        assert!(matches!(err.kind(), FatalKind::InvalidRequest { .. }));
    }

    #[test]
    fn partial_trailing_page_is_ignored() {
        let pages = unsafe { PageAllocator::new(PhysAddr(0x1000), PhysAddr(0x3800)) }.unwrap();
        assert_eq!(pages.total_pages(), 2);
        assert_eq!(pages.end(), PhysAddr(0x3000));
    }

    #[test]
    fn zero_pages_is_a_contract_violation() {
        let mut pages = ram(2);
        let err = pages.alloc_pages(0).unwrap_err();
        assert!(matches!(err.kind(), FatalKind::InvalidRequest { .. }));
        assert_eq!(pages.allocated_pages(), 0);
    }

    #[test]
    fn views_are_limited_to_allocated_memory() {
        let mut pages = ram(3);
        let addr = pages.alloc_pages(1).unwrap();
        assert!(pages.bytes(addr, PAGE_SIZE).is_some());
        assert!(pages.bytes(addr, PAGE_SIZE + 1).is_none());
        assert!(pages.bytes_mut(pages.cursor(), 1).is_none());
        assert!(pages.bytes(PhysAddr(usize::MAX), 2).is_none());
    }
}
