// [libs/infra/db/src/lib.rs]
//! libSQL-backed persistence for the scanning control plane: connection
//! management, idempotent schema application, and one repository per
//! aggregate the domain layer reads or writes.

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::TursoClient;
pub use errors::DbError;
pub use schema::apply_full_schema;
