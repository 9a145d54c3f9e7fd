fn main() {
    // ndarray-linalg is built against openblas; on windows the import libraries must be named explicitly
    #[cfg(windows)]
    {
        println!("cargo:rustc-link-lib=dylib=openblas");
        println!("cargo:rustc-link-lib=dylib=lapack");
    }
    println!("cargo:rerun-if-changed=build.rs");
}
