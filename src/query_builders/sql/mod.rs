// src/query_builders/sql/mod.rs
//! SQL builders

pub mod select;
pub mod count;

pub use select::SafeQueryBuilder;
pub use count::CountQueryBuilder;
