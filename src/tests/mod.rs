//! Scenario tests wired in from the binary crate, so they can reach both the
//! library and the command handling in `main.rs`.

mod cli_tests;
mod scenario_tests;
