//! # Cross-Context Relay Test Suite
//!
//! End-to-end flows across the relay process, a main context and its
//! worker.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── cancellation_flow.rs   # main cancels, worker observes via relay
//!     ├── rpc_relay_flow.rs      # worker calls main through the relay
//!     └── relay_lifecycle.rs     # reinstall, shutdown, missing owners
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xc-tests
//! cargo test -p xc-tests integration::cancellation_flow
//! ```

pub mod integration;
