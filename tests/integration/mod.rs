//! Integration tests for talk-to-data.

pub mod pipeline_test;
pub mod store_test;
