//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Orchestrate repository calls into the resource store operations.
//! - Keep callers decoupled from storage details.

pub mod resource_store;
