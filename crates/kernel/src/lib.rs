#![cfg_attr(target_arch = "riscv32", no_std)]

pub mod arch;
pub mod boot;
pub mod config;
pub mod console;
pub mod fatal;
pub mod global;
pub mod init;
pub mod logger;
pub mod mm;
pub mod sbi;
pub mod sched;
pub mod task;
pub mod trap;

pub use config::Config;
pub use fatal::{Fatal, FatalKind};
pub use init::Kernel;
pub use types::{BootInfo, PhysAddr};
