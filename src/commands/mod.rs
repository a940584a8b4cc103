// ABOUTME: Command implementations for each CLI subcommand
// ABOUTME: Exports migrate, validate, and verify

pub mod migrate;
pub mod validate;
pub mod verify;

pub use migrate::migrate;
pub use validate::validate;
pub use verify::verify;
