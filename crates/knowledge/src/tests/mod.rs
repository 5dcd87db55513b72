//! Cross-module tests: ranking through the SQLite index and the full
//! ingest → retrieve → answer path.

mod pipeline;
