//! Access control for small web services.
//!
//! The crate bundles a bearer token service, a role-based policy engine, a
//! linearizable in-memory repository, and the account and resource services
//! that combine them. Inbound adapters translate HTTP requests into service
//! calls; outbound adapters implement the storage and hashing ports.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod telemetry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
