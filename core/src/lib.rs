//! rgm-core — pricing and promotion analytics for consumer-goods retail data.
//!
//! The core consumes a consolidated sales/pricing dataset (one flat table of
//! product/retailer/time records), narrows it with composable filters, and
//! derives elasticity benchmarks, price/distribution what-if projections, and
//! multi-event promotion simulations (waterfall decomposition + calendar
//! week grid).
//!
//! All operations are synchronous, request-scoped, and in-memory: the engine
//! holds an immutable dataset snapshot and every derived structure is freshly
//! allocated per call. Callers (HTTP layer, UI shell, headless runner)
//! serialize the request/response types with serde.

pub mod config;
pub mod dataset;
pub mod elasticity;
pub mod engine;
pub mod error;
pub mod filter;
pub mod promotion;
pub mod simulator;
pub mod types;
