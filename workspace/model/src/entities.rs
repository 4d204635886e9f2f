//! This file serves as the root for all SeaORM entity modules.
//! Users own articles; nothing else in the application touches the tables
//! directly.

pub mod article;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::article::Entity as Article;
    pub use super::user::Entity as User;
}
