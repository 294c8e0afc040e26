//! Types shared between the bootmount library and its binary.

pub mod errors;

pub use errors::{BootError, BootResult};
