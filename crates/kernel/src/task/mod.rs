// Process model
// -------------
// Every process owns a fixed kernel stack inside its control block. Control
// moves between processes only through `switch_context`, which pushes the
// callee-saved bank (`ra`, `s0..s11`) onto the running stack, stores the
// resulting `sp` in the outgoing PCB, loads the incoming PCB's `sp` and pops
// the same bank.
//
// Stack of a process that has not run yet (`Process::prepare`):
//
//     top  ->  +----------------+
//              | s11 = 0        |
//              | ...            |
//              | s0  = 0        |
//     sp   ->  | ra  = entry    |   SwitchFrame, lowest address first
//              +----------------+
//
// The first switch into it pops that frame and `ret`s to `entry` with
// `sp == top`. The same stack top is published in `sscratch` whenever the
// process is scheduled, so traps taken while it runs land on its own stack.
//
// Notes:
// - The idle process (pid 0) is the boot context; it lives outside the table
//   and is only chosen when nothing else is runnable.
// - Slots never go back to UNUSED: there is no exit or reaping.
// - Saved stack pointers are addresses into the table, so it must not move
//   once the first process has been created.

pub mod prep;
pub mod process;
pub mod switch;
pub mod table;

pub use process::{KernelStack, Pid, Process, ProcessState};
pub use switch::{SWITCH_FRAME_SIZE, SwitchFrame, switch_context};
pub use table::{ProcessTable, Slot};
