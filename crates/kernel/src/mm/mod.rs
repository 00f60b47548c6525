//! Physical memory: a bump page allocator and a free-list heap over it.

pub mod heap;
pub mod page;

pub use heap::{BlockInfo, Heap};
pub use page::PageAllocator;
