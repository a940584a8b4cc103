// ABOUTME: PostgreSQL destination access
// ABOUTME: Connection lifecycle, parameter values, and insert statement building

pub mod connection;
pub mod types;
pub mod writer;

pub use connection::{connect, connect_with_retry};
