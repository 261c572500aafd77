//! Data ingestion and analysis layer.
//!
//! Responsible for discovering transcript sources, extracting their grades
//! payload, building transcripts, aggregating chart inputs and running the
//! top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod transcript;

pub use grade_core as core;
