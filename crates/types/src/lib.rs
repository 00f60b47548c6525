#![no_std]
//! Types shared between the boot glue and the kernel core.

pub mod addr;
pub use addr::PhysAddr;

pub mod boot;
pub use boot::BootInfo;
