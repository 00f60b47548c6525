//! Console output through the firmware putchar call.

use core::fmt::{self, Write};

use crate::sbi;

/// Zero-sized writer over `sbi::putchar`.
pub struct Console;

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            sbi::putchar(byte);
        }
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments<'_>) {
    // Console writes cannot fail.
    let _ = Console.write_fmt(args);
}

/// Everything written to the console on this thread since the last call.
#[cfg(not(target_arch = "riscv32"))]
pub fn take_output() -> String {
    crate::arch::host::take_console_output()
}

#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kprintln {
    () => {
        $crate::kprint!("\n")
    };
    ($($arg:tt)*) => {
        $crate::console::_print(format_args!("{}\n", format_args!($($arg)*)))
    };
}
