//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for task records.
//! - Isolate SQLite query details from the store and presenters.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Deletion is a hard delete; no row survives a successful `delete_task`.

pub mod task_repo;
