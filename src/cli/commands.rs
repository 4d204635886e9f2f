pub mod initdb;
pub mod serve;

pub use initdb::{init_database, run_migrations};
pub use serve::serve;
