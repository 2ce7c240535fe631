// src/handlers/mod.rs
pub mod analyze;
pub mod compare;
pub mod error;
pub mod search;
