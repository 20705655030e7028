//! Minimal ANSI color constants for terminal output. No-op when the output
//! stream doesn't support color (`anstream` handles the actual stripping).

#![allow(unused)]

pub const RED: &str = "\x1b[0;31m";
pub const GREEN: &str = "\x1b[0;32m";
pub const YELLOW: &str = "\x1b[0;33m";
pub const GRAY: &str = "\x1b[38;5;248m";
pub const RESET: &str = "\x1b[0m";
