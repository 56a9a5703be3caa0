//! Emits the native link line when the `libotama` feature is enabled.
//!
//! # Environment variables
//!
//! - `OTAMA_LIB_DIR`: extra search path for libotama.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OTAMA_LIB_DIR");

    #[cfg(feature = "libotama")]
    {
        if let Ok(dir) = std::env::var("OTAMA_LIB_DIR") {
            println!("cargo:rustc-link-search=native={dir}");
        }
        println!("cargo:rustc-link-lib=dylib=otama");
    }
}
