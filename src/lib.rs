//! Compilatio - medieval manuscript metadata aggregator.
//!
//! Imports digitized-manuscript metadata from institutional IIIF
//! catalogues into a single SQLite database. Each source is described
//! by configuration (discovery strategy, URL templates, normalization
//! policy); one shared pipeline does discovery, manifest fetch,
//! normalization, and idempotent upsert.

pub mod checkpoint;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dates;
pub mod discovery;
pub mod fetch;
pub mod iiif;
pub mod importer;
pub mod models;
pub mod record;
pub mod repository;
pub mod sources;
