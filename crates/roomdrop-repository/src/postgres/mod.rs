//! PostgreSQL room storage.

mod connection;
mod migration;
mod repository;

pub use connection::DatabasePool;
pub use migration::run_migrations;
pub use repository::PostgresRoomRepository;
