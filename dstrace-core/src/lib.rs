#![doc = "dstrace-core: notebook transformation pipeline and publish orchestration for dstrace."]

//! All logic that does not need a network client lives here: the notebook
//! model, the directive scanner and transform stages, the scoped temp-file
//! pipeline, batch publishing against the [`contract`] traits, git metadata,
//! hook installation and pre-commit conversion.
//!
//! # Usage
//! The `dstrace` CLI crate wires these together with its Confluence client.

pub mod config;
pub mod contract;
pub mod convert;
pub mod credentials;
pub mod directive;
pub mod error;
pub mod git;
pub mod hooks;
pub mod notebook;
pub mod pipeline;
pub mod publish;
pub mod storage_format;
pub mod transform;
