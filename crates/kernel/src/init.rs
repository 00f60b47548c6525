use types::{BootInfo, PhysAddr};

use crate::mm::{Heap, PageAllocator};
use crate::sched::{PendingSwitch, Scheduler};
use crate::task::{Pid, ProcessTable};
use crate::{Config, Fatal, arch, trap};

/// Everything the kernel mutates: allocators, process table and scheduler.
///
/// There is exactly one, and it must not move once a process has been
/// created; saved stack pointers point into `procs`.
pub struct Kernel {
    pub pages: PageAllocator,
    pub heap: Heap,
    pub procs: ProcessTable,
    pub sched: Scheduler,
}

impl Kernel {
    pub const fn new() -> Self {
        Self {
            pages: PageAllocator::empty(),
            heap: Heap::new(),
            procs: ProcessTable::new(),
            sched: Scheduler::new(),
        }
    }

    /// Bring up the allocators and the trap path from the boot layout.
    ///
    /// # Safety
    /// The free-RAM extent in `info` must be unused by anything else, and
    /// `self` must stay at its current address from here on.
    pub unsafe fn init(&mut self, info: &BootInfo) -> Result<(), Fatal> {
        let base = PhysAddr::new(info.free_ram_start);
        let end = PhysAddr::new(info.free_ram_end);
        // SAFETY: forwarded from the caller.
        self.pages = unsafe { PageAllocator::new(base, end) }?;
        log::info!(
            "free ram: {}..{} ({} pages)",
            self.pages.base(),
            self.pages.end(),
            self.pages.total_pages()
        );

        // Traps taken by the boot context land on the idle PCB's stack, so
        // the stack top is in place before the vector can fire.
        // SAFETY: the idle stack lives in `self`, which does not move.
        unsafe { arch::write_sscratch(self.procs.idle().stack_top()) };
        trap::install_trap_vector(Config::TRAP_VECTOR_MODE)?;

        if Config::ENABLE_TIMER_INTERRUPTS {
            trap::enable_timer_interrupts();
        }
        Ok(())
    }

    #[track_caller]
    pub fn create_process(&mut self, entry: usize) -> Result<Pid, Fatal> {
        self.procs.create_process(entry)
    }

    #[track_caller]
    pub fn alloc_pages(&mut self, n: usize) -> Result<PhysAddr, Fatal> {
        self.pages.alloc_pages(n)
    }

    pub fn alloc(&mut self, n_pages: usize) -> Option<PhysAddr> {
        self.heap.alloc(&mut self.pages, n_pages)
    }

    pub fn free(&mut self, ptr: Option<PhysAddr>) {
        self.heap.free(&mut self.pages, ptr)
    }

    pub fn current_pid(&self) -> Pid {
        self.sched.current_pid(&self.procs)
    }

    /// Scheduling decision for [`crate::sched::yield_now`].
    pub fn prepare_yield(&mut self) -> Option<PendingSwitch> {
        self.sched.prepare_switch(&mut self.procs)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
