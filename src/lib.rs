// src/lib.rs
// basalt: a snippet vault with LLM-guarded capture, merge, and bulk
// import/export over a virtual hierarchical file store.

pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod oracle;
pub mod persistence;
pub mod relocate;
pub mod state;
pub mod transfer;
pub mod vault;
