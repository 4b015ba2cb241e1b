//! Grouped descriptive statistics over a JMeter JTL transaction log.
//!
//! Pipeline: [`ingest`] → [`group`] (+ [`rate`] for the per-second series)
//! → [`stats`] → [`summarizer::Summarizer`] cache.

pub mod config;
pub mod group;
pub mod ingest;
pub mod rate;
pub mod stats;
pub mod summarizer;

pub use ingest::{read_jtl, ColumnLayout, Ingested, RawRow};
pub use summarizer::Summarizer;
