//! HTTP outbound adapters.
//!
//! This module provides a thin reqwest implementation of the
//! `ResourceTransport` port.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
