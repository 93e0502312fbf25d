//! Paths and tool names the helper depends on.
//!
//! Every path is relative to the `movement/make` directory.

/// Basename the working directory must have.
pub const MAKE_DIR_NAME: &str = "make";

/// Source file whose default clock gets stamped before a build.
pub const STAMP_TARGET: &str = "../../watch-library/hardware/main.c";

/// Files the build cannot run without. The stamp target comes first.
pub const REQUIRED_FILES: &[&str] = &[STAMP_TARGET, "Makefile"];

/// Files the firmware picks up when present.
pub const OPTIONAL_FILES: &[&str] = &["alarms.csv", "timers.csv", "timezone_offset"];

/// Output directory of the emscripten build, served for emulation.
pub const SIM_OUTPUT_DIR: &str = "build-sim";

pub const MAKE: &str = "make";
pub const EMMAKE: &str = "emmake";
pub const PYTHON: &str = "python3";
