use kernel::Config;
use kernel::arch::host;
use kernel::task::{ProcessState, ProcessTable, SWITCH_FRAME_SIZE, SwitchFrame, switch_context};
use zerocopy::FromBytes;

const ENTRY: usize = 0x8020_4000;

#[test]
fn test_new_process_stack_holds_entry_frame() {
    let mut table = Box::new(ProcessTable::new());
    table.create_process(ENTRY).unwrap();
    let proc = table.get(0).unwrap();

    assert_eq!(proc.state(), ProcessState::Runnable);
    assert_eq!(proc.saved_sp(), proc.stack_top() - SWITCH_FRAME_SIZE);

    let bytes = &proc.stack().0[Config::KERNEL_STACK_SIZE - SWITCH_FRAME_SIZE..];
    let frame = SwitchFrame::read_from_bytes(bytes).ok();
    assert_eq!(frame, Some(SwitchFrame::entry(ENTRY)));
}

#[test]
fn test_switch_round_trip_preserves_callee_saved() {
    host::reset();
    let mut s = [0usize; Config::SWITCH_SAVED_REGS];
    for (i, reg) in s.iter_mut().enumerate() {
        *reg = 0x1000 + i;
    }
    let before = SwitchFrame { ra: 0x8020_0abc, s };
    host::set_live_regs(before);
    let sp_before = host::live_sp();

    let mut table = Box::new(ProcessTable::new());
    table.create_process(ENTRY).unwrap();
    let stack_top = table.get(0).unwrap().stack_top();

    let mut a_sp = 0usize;
    let mut b_sp = table.get(0).unwrap().saved_sp();

    unsafe { switch_context(&mut a_sp, &b_sp) };
    assert_eq!(a_sp, sp_before - SWITCH_FRAME_SIZE);
    assert_eq!(host::live_regs(), SwitchFrame::entry(ENTRY));
    assert_eq!(host::live_sp(), stack_top);

    unsafe { switch_context(&mut b_sp, &a_sp) };
    assert_eq!(b_sp, stack_top - SWITCH_FRAME_SIZE);
    assert_eq!(host::live_regs(), before);
    assert_eq!(host::live_sp(), sp_before);
}
