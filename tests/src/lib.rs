//! # GePG Client Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── counterparty.rs   # In-process gateway (signs responses, checks requests)
//! │   └── integration/      # End-to-end exchanges and callbacks
//! └── benches/              # Signing, verification and envelope throughput
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p gepg-tests
//!
//! # By category
//! cargo test -p gepg-tests integration::exchanges::
//! cargo test -p gepg-tests integration::callbacks::
//!
//! # Benchmarks
//! cargo bench -p gepg-tests
//! ```

pub mod integration;
