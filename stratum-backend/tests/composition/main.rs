//! Integration tests for TieredBackend.

#[path = "../common/mod.rs"]
mod common;

mod read;
mod remove;
mod write;
