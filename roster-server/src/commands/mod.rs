//! Non-server subcommands of the `roster-server` binary.

pub mod spec;
