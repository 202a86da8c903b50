//! Test helpers for plugin unit and integration tests
//!
//! This module provides an in-memory schema host and fixtures (a `documents`
//! table with a `bytea` column, recording transforms and resolvers) so the
//! plugin can be exercised without a database or a real schema builder.

pub mod fixtures;
pub mod mock_schema;

pub use fixtures::*;
pub use mock_schema::{CamelCaseInflector, MockSchemaBuilder};
