//! kvmodel - schema-driven records, secondary indexes and uniqueness checks
//! over an ordered key-value store
//!
//! A [`schema::Schema`] describes the fields of one entity. A
//! [`model::Model`] binds it to a [`store::KvStore`] and keeps, for every
//! saved record, one primary entry plus one secondary entry per indexed
//! field, all written in a single atomic batch.

pub mod cli;
pub mod config;
pub mod ids;
pub mod keys;
pub mod model;
pub mod observability;
pub mod schema;
pub mod store;
