#![doc = "finding-aid: generation and lifecycle pipeline for archival finding aids."]

//! This crate renders downloadable finding-aid documents (PDF or RTF) from
//! hierarchical archival description records, tracks their generate/upload
//! lifecycle through named properties, extracts text transcripts, and keeps
//! a search index synchronized with the current status.
//!
//! # Usage
//! Construct a [`pipeline::FindingAidPipeline`] with your collaborators
//! (EAD exporter, process runner, property store, search indexer) and call
//! `generate`, `upload` or `delete`. The external tools (XSLT processor,
//! FO renderer, text extractor) are reached through the injectable
//! [`runner::ProcessRunner`] capability.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod indexer;
pub mod jobs;
pub mod load_config;
pub mod locator;
pub mod normalise;
pub mod pipeline;
pub mod properties;
pub mod resource;
pub mod runner;
pub mod stylesheet;
pub mod transform;
