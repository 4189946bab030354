//! # Obol Test Suite
//!
//! Cross-subsystem integration scenarios driving the full engine the way
//! the chain layer would: decoded transactions in block order, block-end
//! hooks, then assertions over every derived view.
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── support.rs          # engine/transaction scaffolding
//!     ├── conservation.rs     # supply conservation across mixed blocks
//!     ├── exchange_flows.rs   # DEx + MetaDEx end-to-end flows
//!     ├── activation_flows.rs # feature gate, checkpoints, divergence
//!     └── crowdsale_flows.rs  # crowdsale lifecycle
//! ```
//!
//! Run with `cargo test -p ob-tests`.

#![allow(dead_code)]

pub mod integration;
