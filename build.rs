fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (tests, fuzz) have no ESP-IDF toolchain to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
