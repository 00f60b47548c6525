use log::LevelFilter;

use crate::trap::TrapVectorMode;

/// Compile-time kernel configuration.
pub struct Config;

impl Config {
    /// Granule of the physical and heap allocators.
    pub const PAGE_SIZE: usize = 4096;
    /// Capacity of the process table (the idle process is kept outside it).
    pub const PROCS_MAX: usize = 8;
    /// Private kernel stack per process, also used as its trap stack.
    pub const KERNEL_STACK_SIZE: usize = 8192;
    /// `s0..s11`; `ra` is saved in addition to these.
    pub const SWITCH_SAVED_REGS: usize = 12;
    pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;
    pub const TRAP_VECTOR_MODE: TrapVectorMode = TrapVectorMode::Direct;
    /// No trap is recoverable yet, so a timer tick would halt the kernel.
    pub const ENABLE_TIMER_INTERRUPTS: bool = false;
    /// Rounds each demo process prints before requesting shutdown; `0` runs forever.
    pub const DEMO_ALTERNATIONS: usize = 0;
}
