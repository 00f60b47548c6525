use zerocopy::IntoBytes;

use crate::Fatal;

use super::process::{Pid, Process, ProcessState};
use super::switch::{SWITCH_FRAME_SIZE, SwitchFrame};
use super::table::ProcessTable;

impl ProcessTable {
    /// Claim the first unused slot and prepare it to start at `entry` on its
    /// first switch-in. Nothing runs here.
    #[track_caller]
    pub fn create_process(&mut self, entry: usize) -> Result<Pid, Fatal> {
        let Some(index) = self.first_unused() else {
            log::error!("create_process: table full (capacity={})", self.capacity());
            return Err(Fatal::process_table_full(self.capacity()));
        };
        let pid = Pid::for_slot(index);
        let proc = self.slot_mut(index);
        proc.prepare(pid, entry);
        log::info!(
            "create_process: pid={} slot={} entry={:#010x} sp={:#010x}",
            pid,
            index,
            entry,
            proc.sp
        );
        Ok(pid)
    }
}

impl Process {
    /// Store the synthetic switch frame at the top of the stack and mark the
    /// process runnable.
    pub(crate) fn prepare(&mut self, pid: Pid, entry: usize) {
        let frame = SwitchFrame::entry(entry);
        let at = self.stack.0.len() - SWITCH_FRAME_SIZE;
        self.stack.0[at..].copy_from_slice(frame.as_bytes());
        self.sp = self.stack.base() + at;
        self.pid = pid;
        self.state = ProcessState::Runnable;
    }
}
