use core::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::Config;

/// The `switch_context` primitive; see the arch backend for the stub.
pub use crate::arch::switch_context;

/// Callee-saved bank as `switch_context` lays it out on a stack, lowest
/// address first: `ra`, then `s0..s11`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct SwitchFrame {
    pub ra: usize,
    pub s: [usize; Config::SWITCH_SAVED_REGS],
}

pub const SWITCH_FRAME_SIZE: usize = size_of::<SwitchFrame>();

const _: () = assert!(SWITCH_FRAME_SIZE == (Config::SWITCH_SAVED_REGS + 1) * size_of::<usize>());

impl SwitchFrame {
    /// Frame for a process that has never run: return into `entry` with
    /// every `s` register zeroed.
    pub const fn entry(entry: usize) -> Self {
        Self {
            ra: entry,
            s: [0; Config::SWITCH_SAVED_REGS],
        }
    }
}
