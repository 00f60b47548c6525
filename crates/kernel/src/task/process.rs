use core::fmt;

use crate::Config;

/// Process identifier. `0` is the idle process; table slot `i` runs pid `i + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl Pid {
    pub const IDLE: Pid = Pid(0);
    /// Sentinel held by unused table slots.
    pub const UNUSED: Pid = Pid(u32::MAX);

    pub const fn for_slot(slot: usize) -> Pid {
        Pid(slot as u32 + 1)
    }

    /// Table slot of a non-idle pid.
    pub fn slot(self) -> Option<usize> {
        match self {
            Pid::IDLE | Pid::UNUSED => None,
            Pid(pid) => Some(pid as usize - 1),
        }
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Pid::UNUSED => f.write_str("-"),
            Pid(pid) => write!(f, "{pid}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProcessState {
    #[default]
    Unused,
    Runnable,
}

/// Private kernel-mode stack. 16-byte aligned as the psABI requires.
#[repr(C, align(16))]
pub struct KernelStack(pub [u8; Config::KERNEL_STACK_SIZE]);

impl KernelStack {
    pub const ZEROED: KernelStack = KernelStack([0; Config::KERNEL_STACK_SIZE]);

    pub fn base(&self) -> usize {
        self.0.as_ptr() as usize
    }

    /// One past the highest byte; the initial `sp`.
    pub fn top(&self) -> usize {
        self.base() + self.0.len()
    }
}

/// Process control block.
pub struct Process {
    pub(crate) pid: Pid,
    pub(crate) state: ProcessState,
    /// Saved stack pointer; stale while this process is the one running.
    pub(crate) sp: usize,
    pub(crate) stack: KernelStack,
}

impl Process {
    pub const UNUSED: Process = Process {
        pid: Pid::UNUSED,
        state: ProcessState::Unused,
        sp: 0,
        stack: KernelStack::ZEROED,
    };

    /// The boot context. It is running when the kernel starts, so its saved
    /// `sp` is filled in by the first switch away from it.
    pub const IDLE: Process = Process {
        pid: Pid::IDLE,
        state: ProcessState::Runnable,
        sp: 0,
        stack: KernelStack::ZEROED,
    };

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn is_runnable(&self) -> bool {
        self.state == ProcessState::Runnable
    }

    pub fn saved_sp(&self) -> usize {
        self.sp
    }

    pub fn stack(&self) -> &KernelStack {
        &self.stack
    }

    pub fn stack_top(&self) -> usize {
        self.stack.top()
    }

    pub(crate) fn saved_sp_ptr(&mut self) -> *mut usize {
        &raw mut self.sp
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("state", &self.state)
            .field("sp", &format_args!("0x{:08x}", self.sp))
            .field("stack_top", &format_args!("0x{:08x}", self.stack.top()))
            .finish()
    }
}
