//! Shared helpers for the integration tests

#![allow(dead_code)]

use prism_rex::types::{DataType, SqlTypeName, TypeFactory};
use prism_rex::RexBuilder;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Route `tracing` output to the test harness; `RUST_LOG` selects the level
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn builder() -> RexBuilder {
    init_tracing();
    RexBuilder::default()
}

pub fn sql_type(b: &RexBuilder, type_name: SqlTypeName) -> DataType {
    b.type_factory()
        .create_type(type_name)
        .expect("basic type")
}

pub fn nullable(b: &RexBuilder, type_name: SqlTypeName) -> DataType {
    let t = sql_type(b, type_name);
    b.type_factory().create_type_with_nullability(&t, true)
}
