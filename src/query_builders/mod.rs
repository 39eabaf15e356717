// src/query_builders/mod.rs
//! Query builders for listing screens

pub mod sql;
pub mod utils;

pub use sql::{CountQueryBuilder, SafeQueryBuilder};
