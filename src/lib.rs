//! Chart lyrics enrichment library - shared modules for all binaries.

pub mod cache;
pub mod charts;
pub mod clean;
pub mod config;
pub mod emotion;
pub mod fetcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod provider;
pub mod runner;
pub mod safety;
pub mod scoring;
pub mod table;
