//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate validation, tree mutation and persistence calls.
//! - Keep scripting callers decoupled from storage details.

pub mod engine;
