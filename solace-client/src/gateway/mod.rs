//! Remote gateways
//!
//! Both durable state and analysis live behind external services. The
//! data gateway is an interface only (the hosted document store is not
//! reimplemented here); the analysis gateway ships with a reqwest-backed
//! implementation.

pub mod analysis;
pub mod data;

pub use analysis::{AnalysisGateway, HttpAnalysisGateway};
pub use data::{DataGateway, Direction, DocPath, Document, Query, Snapshot, Subscription};
