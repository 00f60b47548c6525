use crate::Config;

use super::process::{Pid, Process};

/// Reference to a process: the idle process or a table slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Idle,
    Index(usize),
}

/// Fixed-capacity process table plus the idle process.
pub struct ProcessTable {
    idle: Process,
    procs: [Process; Config::PROCS_MAX],
}

impl ProcessTable {
    pub const fn new() -> Self {
        Self {
            idle: Process::IDLE,
            procs: [Process::UNUSED; Config::PROCS_MAX],
        }
    }

    pub const fn capacity(&self) -> usize {
        Config::PROCS_MAX
    }

    pub fn idle(&self) -> &Process {
        &self.idle
    }

    pub fn get(&self, index: usize) -> Option<&Process> {
        self.procs.get(index)
    }

    /// `slot` must come from this table (the scheduler or `slot_of`).
    pub fn process(&self, slot: Slot) -> &Process {
        match slot {
            Slot::Idle => &self.idle,
            Slot::Index(index) => &self.procs[index],
        }
    }

    pub fn process_mut(&mut self, slot: Slot) -> &mut Process {
        match slot {
            Slot::Idle => &mut self.idle,
            Slot::Index(index) => &mut self.procs[index],
        }
    }

    pub fn iter_runnable(&self) -> impl Iterator<Item = &Process> {
        self.procs.iter().filter(|proc| proc.is_runnable())
    }

    /// Runnable processes in the table; the idle process is not counted.
    pub fn runnable_count(&self) -> usize {
        self.iter_runnable().count()
    }

    pub fn slot_of(&self, pid: Pid) -> Option<Slot> {
        if pid == Pid::IDLE {
            return Some(Slot::Idle);
        }
        let index = pid.slot()?;
        match self.procs.get(index) {
            Some(proc) if proc.pid == pid => Some(Slot::Index(index)),
            _ => None,
        }
    }

    pub(crate) fn first_unused(&self) -> Option<usize> {
        self.procs.iter().position(|proc| !proc.is_runnable())
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Process {
        &mut self.procs[index]
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
