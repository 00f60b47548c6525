//! Cooperative round-robin scheduler.
//!
//! `yield_now` is the only place control changes hands. The decision is made
//! while `&mut Kernel` is borrowed; the switch itself runs after that borrow
//! has ended, with only raw pointers into the process table, because the
//! process that resumes will borrow the kernel again on its own stack.

use crate::arch;
use crate::init::Kernel;
use crate::task::{Pid, ProcessTable, Slot};
use crate::Config;

#[derive(Debug)]
pub struct Scheduler {
    current: Slot,
}

impl Scheduler {
    /// Starts out running the idle process, which is the boot context.
    pub const fn new() -> Self {
        Self { current: Slot::Idle }
    }

    pub fn current(&self) -> Slot {
        self.current
    }

    pub fn current_pid(&self, table: &ProcessTable) -> Pid {
        table.process(self.current).pid()
    }

    /// Next process in round-robin order, starting after the current slot
    /// and wrapping. The current process is considered last; idle only
    /// when nothing in the table is runnable.
    pub fn pick_next(&self, table: &ProcessTable) -> Slot {
        let start = match self.current {
            Slot::Idle => 0,
            Slot::Index(index) => index + 1,
        };
        (0..Config::PROCS_MAX)
            .map(|offset| (start + offset) % Config::PROCS_MAX)
            .find(|&index| table.get(index).is_some_and(|proc| proc.is_runnable()))
            .map_or(Slot::Idle, Slot::Index)
    }

    /// Commit to the next process and return the switch that moves there,
    /// or `None` when it is the one already running. Interrupts are masked
    /// from here until the switch completes, so the new process's stack top
    /// is published to `sscratch` with no trap able to observe it early.
    pub fn prepare_switch(&mut self, table: &mut ProcessTable) -> Option<PendingSwitch> {
        let next = self.pick_next(table);
        if next == self.current {
            return None;
        }
        let prev = self.current;

        let were_enabled = arch::disable_interrupts();
        // SAFETY: the stack top belongs to a PCB in the table, which does not
        // move while the kernel runs.
        unsafe { arch::write_sscratch(table.process(next).stack_top()) };
        self.current = next;

        let from = table.process(prev).pid();
        let to = table.process(next).pid();
        let save_to = table.process_mut(prev).saved_sp_ptr();
        let resume_from = table.process_mut(next).saved_sp_ptr().cast_const();
        log::trace!("sched: switch pid {} -> pid {}", from, to);
        Some(PendingSwitch {
            from,
            to,
            save_to,
            resume_from,
            were_enabled,
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A switch decided by [`Scheduler::prepare_switch`] but not yet performed.
#[derive(Debug)]
#[must_use]
pub struct PendingSwitch {
    pub from: Pid,
    pub to: Pid,
    save_to: *mut usize,
    resume_from: *const usize,
    were_enabled: bool,
}

impl PendingSwitch {
    /// Switch stacks, then restore the interrupt mask that was in force
    /// before [`Scheduler::prepare_switch`] once this context is resumed.
    ///
    /// # Safety
    /// The process table this came from must still be alive, unmoved, and
    /// not borrowed. The calling context must be the one `from` names.
    pub unsafe fn perform(self) {
        // SAFETY: both pointers address `sp` fields of PCBs in the table,
        // and `resume_from` holds a stack pointer with a switch frame on it.
        unsafe { arch::switch_context(self.save_to, self.resume_from) };
        arch::restore_interrupts(self.were_enabled);
    }
}

/// Give up the hart to the next runnable process.
///
/// Returns immediately when no other process is runnable; otherwise returns
/// when some later `yield_now` switches back to the caller.
///
/// # Safety
/// `kernel` must point at the live kernel context and no reference into it
/// may be held across this call.
pub unsafe fn yield_now(kernel: *mut Kernel) {
    // SAFETY: caller guarantees the pointer is valid and unaliased; the
    // borrow ends before the switch.
    let pending = unsafe { (*kernel).prepare_yield() };
    if let Some(switch) = pending {
        // SAFETY: the table lives inside `*kernel`, which is not borrowed now.
        unsafe { switch.perform() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(runnable: &[usize]) -> Box<ProcessTable> {
        let mut table = Box::new(ProcessTable::new());
        for _ in 0..=runnable.iter().copied().max().unwrap_or(0) {
            table.create_process(0x8020_0000).unwrap();
        }
        for index in 0..Config::PROCS_MAX {
            if !runnable.contains(&index) {
                table.slot_mut(index).state = crate::task::ProcessState::Unused;
            }
        }
        table
    }

    #[test]
    fn idle_only_when_table_is_empty() {
        let table = Box::new(ProcessTable::new());
        assert_eq!(Scheduler::new().pick_next(&table), Slot::Idle);
    }

    #[test]
    fn scans_after_current_and_wraps() {
        let table = table_with(&[1, 4]);
        let mut sched = Scheduler::new();
        assert_eq!(sched.pick_next(&table), Slot::Index(1));
        sched.current = Slot::Index(1);
        assert_eq!(sched.pick_next(&table), Slot::Index(4));
        sched.current = Slot::Index(4);
        assert_eq!(sched.pick_next(&table), Slot::Index(1));
    }

    #[test]
    fn lone_runnable_process_picks_itself() {
        let table = table_with(&[2]);
        let sched = Scheduler { current: Slot::Index(2) };
        assert_eq!(sched.pick_next(&table), Slot::Index(2));
    }
}
