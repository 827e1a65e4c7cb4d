//! finsight-ingest: CSV statement parsing.

pub mod statement;

pub use statement::parse_statement;
