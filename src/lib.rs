//! Purpose: Read-only decoder for crema binary datasets, shared by the `crema` CLI and tests.
//! Exports: `api` (reader, tables, rows, typed values, errors) and `core` internals.
//! Role: Library backing the inspector binary and any embedding application.
//! Invariants: `api` is the supported surface; `core` paths may move between releases.
//! Invariants: Readers are single-threaded; the shared string pool is thread-local.
pub mod api;
pub mod core;
