use core::fmt;

/// Physical address newtype.
///
/// Paging is never enabled, so every address the kernel hands out or stores
/// is physical.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysAddr(pub usize);

impl PhysAddr {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// `align` must be a power of two.
    pub const fn is_aligned(self, align: usize) -> bool {
        self.0 & (align - 1) == 0
    }

    pub const fn align_down(self, align: usize) -> Self {
        Self(self.0 & !(align - 1))
    }

    pub fn checked_add(self, value: usize) -> Option<Self> {
        self.0.checked_add(value).map(PhysAddr)
    }

    pub fn checked_sub(self, value: usize) -> Option<Self> {
        self.0.checked_sub(value).map(PhysAddr)
    }

    /// Byte distance from `base` up to `self`; `None` when `self` is below `base`.
    pub fn offset_from(self, base: PhysAddr) -> Option<usize> {
        self.0.checked_sub(base.0)
    }

    pub fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_helpers() {
        let addr = PhysAddr::new(0x8020_1234);
        assert!(!addr.is_aligned(4096));
        assert_eq!(addr.align_down(4096), PhysAddr(0x8020_1000));
        assert!(PhysAddr(0x8020_2000).is_aligned(4096));
    }

    #[test]
    fn offsets_and_overflow() {
        let base = PhysAddr(0x1000);
        assert_eq!(PhysAddr(0x1010).offset_from(base), Some(0x10));
        assert_eq!(PhysAddr(0x0ff0).offset_from(base), None);
        assert_eq!(PhysAddr(usize::MAX).checked_add(1), None);
    }

    #[test]
    fn display_is_zero_padded_hex() {
        extern crate std;
        use std::format;
        assert_eq!(format!("{}", PhysAddr(0x2000)), "0x00002000");
        assert_eq!(format!("{:x}", PhysAddr(0xbeef)), "beef");
    }
}
