//! Core of the datakit project: an in-process reactive document data toolkit.
//!
//! This crate provides:
//!
//! - **Constraints** ([`constraint`]) - Filter and sort rules over record fields
//! - **Statements** ([`statement`]) - Filter + sort + limit combined into one queryable unit
//! - **Updates** ([`update`]) - The partial-update expression algebra
//! - **Provider contract** ([`provider`]) - The abstract backend interface
//! - **Record traits** ([`record`]) - Typed call-site schemas over BSON documents
//! - **Store facade** ([`store`], [`collection`]) - Namespaced collection handles
//! - **Error handling** ([`error`]) - Error taxonomy and result alias
//! - **Value primitives** ([`value`]) - Comparison, path resolution, canonical encoding
//!
//! Records are plain `bson::Document` values carrying a unique string `id`
//! field. Queries are immutable [`Statement`](statement::Statement)s that
//! filter, sort, and limit; their canonical string form doubles as a cache
//! and subscription key.

#[allow(unused_extern_crates)]
extern crate self as datakit_core;

pub mod collection;
pub mod constraint;
pub mod error;
pub mod provider;
pub mod record;
pub mod statement;
pub mod store;
pub mod update;
pub mod value;
