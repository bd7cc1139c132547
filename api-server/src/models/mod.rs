//! Response bodies

pub mod status;

pub use status::*;
