/// Simulation compute shader; entry point `simulate`
pub fn simulate() -> &'static str {
    include_str!("simulate.wgsl")
}

/// Presentation shader; entry points `vs_main` and `fs_main`
pub fn present() -> &'static str {
    include_str!("present.wgsl")
}
