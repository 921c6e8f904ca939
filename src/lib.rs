//! # metadata-remapper
//!
//! Rewrites class names embedded in compiled metadata annotations
//! (`@kotlin.Metadata` detail strings) inside loose class files and
//! arbitrarily nested jars, using a tiny mapping file.
//!
//! ## Architecture
//!
//! - **tiny**: tiny v1/v2 mapping parser with header auto-detection
//! - **mapping**: immutable class table and the source-namespace resolver
//! - **metadata**: detail string remapping (span scan or legacy replace loop)
//! - **classfile**: structural class file codec and annotation payloads
//! - **rewrite**: metadata annotation rewrite for a single class
//! - **walk**: directory and nested archive traversal
//! - **backup**: snapshot, mutate, restore-if-unchanged
//! - **config** / **cli** / **logging**: run configuration and process plumbing

pub mod backup;
pub mod classfile;
pub mod cli;
pub mod config;
pub mod logging;
pub mod mapping;
pub mod metadata;
pub mod rewrite;
pub mod tiny;
pub mod walk;
