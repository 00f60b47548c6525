#![no_std]
#![no_main]

use core::panic::PanicInfo;

use kernel::global::Global;
use kernel::{Config, Kernel, arch, boot, fatal, kprint, kprintln, logger, sbi, sched};

static KERNEL: Global<Kernel> = Global::new(Kernel::new());

/// Entry point: set up the boot stack and jump to `kernel_main`.
#[unsafe(naked)]
#[unsafe(no_mangle)]
#[unsafe(link_section = ".text.boot")]
pub extern "C" fn boot() -> ! {
    core::arch::naked_asm!(
        "la sp, __stack_top",
        "j {main}",
        main = sym kernel_main,
    );
}

extern "C" fn kernel_main() -> ! {
    let info = boot::boot_info();
    // SAFETY: first thing after entry; nothing has touched `.bss`.
    unsafe { boot::clear_kernel_bss(&info) };

    logger::init(Config::LOG_LEVEL);
    kprintln!("\n\nHello World!");
    kprintln!("1 + 2 = {}, {:x}", 1 + 2, 0x1234_abcd);
    log::info!(
        "boot: bss={:#010x}..{:#010x} stack_top={:#010x}",
        info.bss_start,
        info.bss_end,
        info.stack_top
    );

    // SAFETY: single hart and no process exists yet, so this is the only
    // reference; it is dropped before the first yield.
    let kernel = unsafe { KERNEL.get_mut() };
    // SAFETY: the free-RAM extent is reserved by the linker script and
    // `KERNEL` is a static.
    if let Err(fatal) = unsafe { kernel.init(&info) } {
        fatal::halt(&fatal);
    }
    for entry in [proc_a as *const () as usize, proc_b as *const () as usize] {
        if let Err(fatal) = kernel.create_process(entry) {
            fatal::halt(&fatal);
        }
    }

    loop {
        // SAFETY: no reference into `KERNEL` is live here.
        unsafe { sched::yield_now(KERNEL.as_ptr()) };
        arch::wait_for_interrupt();
    }
}

extern "C" fn proc_a() -> ! {
    demo_process('A')
}

extern "C" fn proc_b() -> ! {
    demo_process('B')
}

fn demo_process(letter: char) -> ! {
    let mut rounds = 0;
    loop {
        kprint!("{letter}");
        rounds += 1;
        // SAFETY: processes never hold references into `KERNEL`.
        unsafe { sched::yield_now(KERNEL.as_ptr()) };
        if Config::DEMO_ALTERNATIONS != 0 && rounds >= Config::DEMO_ALTERNATIONS {
            kprintln!();
            sbi::shutdown();
        }
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    match info.location() {
        Some(location) => kprintln!(
            "PANIC: {}:{}: {}",
            location.file(),
            location.line(),
            info.message()
        ),
        None => kprintln!("PANIC: {}", info.message()),
    }
    arch::park()
}
