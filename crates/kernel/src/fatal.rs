//! Unrecoverable kernel conditions.
//!
//! Library code never halts on its own: it returns `Err(Fatal)` and the
//! top-level driver (`kernel_main` or the trap entry) hands the value to
//! [`halt`], which prints the report and parks the hart for good.

use core::fmt;
use core::panic::Location;

use crate::trap::TrapCause;
use crate::{arch, kprintln};

/// What went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatalKind {
    /// `create_process` found no unused slot.
    ProcessTableFull { capacity: usize },
    /// The page allocator cannot satisfy a request from the free-RAM extent.
    OutOfMemory {
        requested_pages: usize,
        remaining_pages: usize,
    },
    /// Every trap is unrecoverable in this kernel.
    UnexpectedTrap { scause: u32, stval: u32, sepc: u32 },
    /// A caller broke an operation's contract (zero-sized request, misaligned base).
    InvalidRequest { what: &'static str },
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FatalKind::ProcessTableFull { capacity } => {
                write!(f, "no free process slots (capacity={capacity})")
            }
            FatalKind::OutOfMemory {
                requested_pages,
                remaining_pages,
            } => write!(
                f,
                "out of memory: requested {requested_pages} pages, {remaining_pages} remaining"
            ),
            FatalKind::UnexpectedTrap { scause, stval, sepc } => write!(
                f,
                "unexpected trap scause={:08x} stval={:08x} sepc={:08x} ({})",
                scause,
                stval,
                sepc,
                TrapCause::from_scause(scause).name()
            ),
            FatalKind::InvalidRequest { what } => write!(f, "invalid request: {what}"),
        }
    }
}

/// A fatal condition tagged with the source location that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fatal {
    kind: FatalKind,
    location: &'static Location<'static>,
}

impl Fatal {
    #[track_caller]
    pub fn new(kind: FatalKind) -> Self {
        Self {
            kind,
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn process_table_full(capacity: usize) -> Self {
        Self::new(FatalKind::ProcessTableFull { capacity })
    }

    #[track_caller]
    pub fn out_of_memory(requested_pages: usize, remaining_pages: usize) -> Self {
        Self::new(FatalKind::OutOfMemory {
            requested_pages,
            remaining_pages,
        })
    }

    #[track_caller]
    pub fn invalid_request(what: &'static str) -> Self {
        Self::new(FatalKind::InvalidRequest { what })
    }

    pub fn kind(&self) -> &FatalKind {
        &self.kind
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PANIC: {}:{}: {}",
            self.location.file(),
            self.location.line(),
            self.kind
        )
    }
}

/// Report `fatal` on the console and stop the world.
pub fn halt(fatal: &Fatal) -> ! {
    kprintln!("{}", fatal);
    arch::park()
}
