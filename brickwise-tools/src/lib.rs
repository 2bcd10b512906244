//! # brickwise-tools
//!
//! External capability facades the routing core consumes: the building
//! metadata index, the Brick/RDF graph store, and the SQL source with
//! its read-only statement guard. Facade failures stay in-band as
//! `{"error": ...}` payloads so decision nodes can observe and re-route.

pub mod brick;
pub mod metadata;
pub mod rdf_tool;
pub mod sql;
pub mod turtle;

#[cfg(feature = "postgres")]
pub mod pg;

pub use brick::{BrickGraph, BrickStore, RdfOperation, RdfRequest};
pub use metadata::MetadataIndex;
pub use rdf_tool::{RdfToolkit, RDF_TOOLKIT};
pub use sql::{
    has_explicit_limit, validate_statement, GetSchemaTool, ListTablesTool, RunQueryTool,
    SqlSource, StaticSqlSource, GET_SCHEMA_TOOL, LIST_TABLES_TOOL, RUN_QUERY_TOOL,
};

#[cfg(feature = "postgres")]
pub use pg::PgDatabase;
