//! bedrock-definitions: a language server for Bedrock add-ons
//!
//! This crate provides the core functionality for the `bedrock-definitions`
//! server: go to definition, completions and document links for the JSON and
//! `.mcfunction` files of behaviour and resource packs.
//!
//! # Overview
//!
//! References between add-on files are plain identifier strings
//! (`geometry.pig`, `custom:smoke`, `mobs/spawn`). Resolving them means knowing
//! which files declare which identifiers, so the heart of the crate is a lazily
//! populated, per-type resource cache:
//!
//! - **Classification**: which kind of resource a document is
//! - **Extraction**: identifier → location maps for each resource schema
//! - **Caching**: one scan per type, refreshed per file on save
//! - **Resolution**: from the word or command under the cursor to its definition
//!
//! # Architecture
//!
//! - [`resource`]: resource types and the per-type extraction rules
//! - [`cache`]: the resource cache
//! - [`selection`]: what the cursor is on inside an entity file
//! - [`line_parser`]: resource usages inside command lines
//! - [`resolve`]: from a reference to the location of its definition
//! - [`provider`]: the entry points called by the server
//!
//! ```ignore
//! use bedrock_definitions::config::Settings;
//! use bedrock_definitions::provider::Provider;
//!
//! let provider = Provider::new(&workspace_root, Settings::default());
//! let location = provider.resolve_definition(&document, position).await;
//! ```

// Resource model and cache
pub mod cache;
pub mod classify;
pub mod resource;

// LSP feature modules
pub mod completion;
pub mod gotodef;
pub mod links;
pub mod provider;

// Reference resolution
pub mod line_parser;
pub mod resolve;
pub mod selection;

// Documents, files and configuration
pub mod config;
pub mod document;
pub mod error;
pub mod json_tree;
pub mod logging;
pub mod workspace;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
