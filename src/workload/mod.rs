//! Randomized SQL workload generation.
//!
//! [`generate_workload`] is the entry point: it synthesizes a schema, seeds it,
//! draws random CRUD statements against it and tears it down again. All
//! randomness flows through the caller's RNG, so a seeded
//! [`rand::rngs::StdRng`] reproduces a workload exactly.

pub mod generator;
pub mod identifier;
pub mod schema;
pub mod statement;

pub use generator::{build_workload, generate_workload, Workload, VALUE_RANGE};
pub use identifier::{generate_identifier, IDENTIFIER_LEN};
pub use schema::{Column, ColumnType, Schema, Table, COLUMN_COUNT};
pub use statement::{
    CompareOp, Connective, Predicate, Statement, StatementKind, Value, WhereClause,
};
