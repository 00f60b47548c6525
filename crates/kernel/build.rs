use std::env;

fn main() {
    println!("cargo:rerun-if-changed=kernel.ld");
    let target = env::var("TARGET").unwrap_or_default();
    if target.starts_with("riscv32") {
        let dir = env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
        println!("cargo:rustc-link-arg-bins=-T{dir}/kernel.ld");
    }
}
