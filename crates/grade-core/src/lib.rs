//! Core types and calculations for transcript analysis.
//!
//! Holds the course model, subject classification rules, grade series
//! calculations, CLI settings and shared error type. Nothing here touches
//! the filesystem except rule persistence.

pub mod classifier;
pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod series;
pub mod settings;
pub mod time_utils;
