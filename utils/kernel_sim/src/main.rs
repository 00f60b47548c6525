use std::alloc::{Layout, alloc_zeroed};

use anyhow::{Result, anyhow, bail, ensure};
use clap::Parser;
use colored::*;
use kernel::arch::{self, host};
use kernel::task::Pid;
use kernel::trap::decode_stvec;
use kernel::{BootInfo, Config, Kernel, console, kprintln, logger, sched};
use log::LevelFilter;

/// Fake entry points; the host hart never jumps to them.
const ENTRY_BASE: usize = 0x8020_1000;
const ENTRY_STRIDE: usize = 0x100;

/// Host-side simulator for the kernel core: boots it over a heap-backed RAM
/// window, creates processes and prints the schedule the idle loop observes
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of processes to create
    #[arg(short, long, default_value_t = 2)]
    procs: usize,

    /// Number of yields the idle loop performs
    #[arg(short, long, default_value_t = 20)]
    rounds: usize,

    /// Pages of simulated free RAM
    #[arg(long, default_value_t = 64)]
    ram_pages: usize,

    /// Kernel log level (off, error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    ensure!(
        (1..=Config::PROCS_MAX).contains(&args.procs),
        "--procs must be between 1 and {}",
        Config::PROCS_MAX
    );
    ensure!(args.ram_pages > 0, "--ram-pages must be at least 1");
    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| anyhow!("unknown log level: {}", args.log_level))?;

    println!("{}", "Kernel Simulator v0.1.0".bold().blue());
    println!("{}", "=====================================".blue());

    // Boot
    logger::init(level);
    kprintln!("\n\nHello World!");
    let info = ram_window(args.ram_pages)?;
    let mut kernel = Box::new(Kernel::new());
    unsafe { kernel.init(&info) }.map_err(|fatal| anyhow!("{fatal}"))?;
    flush_console();

    let (base, mode) = decode_stvec(arch::read_stvec());
    println!("  trap vector: {:#010x} ({:?})", base, mode);
    println!(
        "  free ram:    {}..{} ({} pages)",
        kernel.pages.base(),
        kernel.pages.end(),
        kernel.pages.total_pages()
    );

    // Heap
    println!();
    println!("{}", "Heap".bold());
    let first = kernel.alloc(1);
    let second = kernel.alloc(2);
    kernel.free(first);
    let reused = kernel.alloc(1);
    flush_console();
    if first.is_some() && reused == first {
        println!("  {} freed block reused first-fit", "✔".green());
    } else {
        println!("  {} heap could not serve the demo allocations", "✘".yellow());
    }
    kernel.free(second);
    for block in kernel.heap.blocks(&kernel.pages) {
        let state = if block.free { "free".green() } else { "used".yellow() };
        println!("  {} size={:>6} {}", block.header, block.size, state);
    }

    // Processes
    println!();
    println!("{}", "Processes".bold());
    for index in 0..args.procs {
        let entry = ENTRY_BASE + index * ENTRY_STRIDE;
        let pid = kernel.create_process(entry).map_err(|fatal| anyhow!("{fatal}"))?;
        println!("  pid {} -> {} entry={:#010x}", pid, letter_for(pid), entry);
    }
    flush_console();

    // Idle loop
    let kp: *mut Kernel = &mut *kernel;
    let mut schedule = String::new();
    for _ in 0..args.rounds {
        unsafe { sched::yield_now(kp) };
        let pid = unsafe { (*kp).current_pid() };
        schedule.push(letter_for(pid));
        flush_console();
    }

    println!();
    println!("{} {}", "Schedule:".bold(), schedule.cyan());
    let expected: String = (0..args.procs)
        .cycle()
        .take(args.rounds)
        .map(|index| letter_for(Pid::for_slot(index)))
        .collect();
    if schedule != expected {
        bail!("schedule {schedule} is not round-robin (expected {expected})");
    }
    println!("{} round-robin over {} processes", "✔".green(), args.procs);
    println!(
        "  pages: {} allocated, {} remaining",
        kernel.pages.allocated_pages(),
        kernel.pages.remaining_pages()
    );
    Ok(())
}

/// Leaked, page-aligned host memory described as the boot layout.
fn ram_window(pages: usize) -> Result<BootInfo> {
    let len = pages * Config::PAGE_SIZE;
    let layout = Layout::from_size_align(len, Config::PAGE_SIZE)?;
    let base = unsafe { alloc_zeroed(layout) };
    if base.is_null() {
        bail!("could not allocate {pages} pages of simulated RAM");
    }
    let base = base as usize;
    Ok(BootInfo::new(0, 0, host::boot_stack_top(), base, base + len))
}

fn letter_for(pid: Pid) -> char {
    match pid {
        Pid::IDLE => '.',
        Pid(pid) => char::from(b'A' + (pid - 1) as u8),
    }
}

fn flush_console() {
    let out = console::take_output();
    if !out.is_empty() {
        print!("{}", out.dimmed());
    }
}
