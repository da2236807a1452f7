//! core
//!
//! Core domain types and configuration for gitblog.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, BranchName, Reference
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing

pub mod config;
pub mod types;
