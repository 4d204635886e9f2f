pub mod authenticatable;
pub mod credentials;
pub mod entities;

pub use authenticatable::Authenticatable;

// Re-export tracing for use in this crate
pub use tracing;
