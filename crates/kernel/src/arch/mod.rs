//! Architecture-specific support.
//!
//! Each backend defines the same set of names and this module re-exports
//! them, so the rest of the kernel calls `arch::switch_context`,
//! `arch::write_stvec` and friends without caring which one is active.
//!
//! - `riscv32`: the real hart (CSR access, trap stubs, context switch, SBI).
//! - `host`: a per-thread simulated hart used by tests and the simulator.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "riscv32")] {
        mod riscv32;
        pub use riscv32::*;
    } else {
        pub mod host;
        pub use host::*;
    }
}
