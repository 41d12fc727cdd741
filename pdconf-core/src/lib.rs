//! pdconf Core
//!
//! Core library for managing configuration objects declaratively: resource
//! model, schemas, diff engine and the Provider contract

pub mod diagnostics;
pub mod differ;
pub mod effect;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
