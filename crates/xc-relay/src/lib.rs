//! # XC Relay - Cross-Context Relay Process
//!
//! The shared intermediary between execution contexts that never share
//! memory.
//!
//! ```text
//! ┌──────────────┐  setCanceled / deleteCanceled   ┌──────────────────────┐
//! │   Context    │ ──────────────────────────────▶ │    Relay process     │
//! │ (RelayClient)│                                 │  (own thread + rt)   │
//! │              │  blocking fetch (GET/POST/...)  │                      │
//! │              │ ◀─────────────────────────────▶ │  CancellationStore   │
//! └──────────────┘                                 │  ClientDirectory     │
//!                                                  └──────────┬───────────┘
//!                                                             │ Rpc + ReplyChannel
//!                                                             ▼
//!                                                  ┌──────────────────────┐
//!                                                  │ Owning main context  │
//!                                                  └──────────────────────┘
//! ```
//!
//! ## Responses of the reserved addresses
//!
//! | Address | Method | Status |
//! |---------|--------|--------|
//! | `./@cancellation@/{id}/{client}` | GET | 200 canceled, 299 not canceled |
//! | `./@cancellation@/{id}/{client}` | POST / DELETE | 200 |
//! | `./@rpc@/{requestId}` | any | 200 reply, 400 bad body, 500 no client or dropped reply |
//! | anything else | any | 404 |

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod command;
pub mod config;
pub mod error;
pub mod fetch;
pub mod handle;
pub mod process;
pub mod store;

pub use config::RelayConfig;
pub use error::RelayError;
pub use fetch::{
    FetchMethod, FetchRequest, FetchResponse, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR,
    STATUS_NOT_CANCELED, STATUS_NOT_FOUND, STATUS_OK,
};
pub use handle::{ClientPort, RelayClient, RelayHandle};
pub use process::{RelayProcess, RelayState, RelayStatus};
pub use store::CancellationStore;
