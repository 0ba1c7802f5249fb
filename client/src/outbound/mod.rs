//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed [`ResourceTransport`](crate::domain::ports::ResourceTransport)
//! - **override_store**: file-backed
//!   [`StatusOverrideStore`](crate::domain::ports::StatusOverrideStore)
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod http;
pub mod override_store;
