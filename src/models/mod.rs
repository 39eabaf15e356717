// src/models/mod.rs

pub mod kit;
pub mod patient;
pub mod result;

pub use kit::*;
pub use patient::*;
pub use result::*;
