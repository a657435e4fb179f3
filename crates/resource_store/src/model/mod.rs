//! Domain model for user-owned resources and the profiles that bound them.
//!
//! # Invariants
//! - A resource is identified by `(resource_name, user_id)`.
//! - A negative user quota means unlimited.

pub mod resource;
pub mod user;
