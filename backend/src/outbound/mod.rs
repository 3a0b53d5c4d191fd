//! Outbound adapters implementing domain ports.
//!
//! - **memory**: lock-protected in-process repositories
//! - **argon2_hasher**: Argon2id password hashing
//!
//! Adapters are thin translators between domain types and their backing
//! primitives. They contain no access-control logic.

pub mod argon2_hasher;
pub mod memory;
