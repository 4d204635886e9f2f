use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelTrait, QueryFilter, Set, TransactionTrait};
use thiserror::Error;

use crate::Authenticatable;
use crate::credentials::{self, CredentialError};

/// Represents a registered user of the site.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Login name, 3 to 80 characters.
    #[sea_orm(unique, indexed)]
    pub username: String,
    /// Argon2 PHC string. The plaintext password is never stored.
    pub password_hash: String,
    /// Optional address, unique when present.
    #[sea_orm(unique)]
    pub email: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    // A user can submit multiple articles.
    #[sea_orm(has_many = "super::article::Entity")]
    Article,
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(chrono::Utc::now());
        }
        Ok(self)
    }
}

impl ActiveModel {
    /// Hash `plaintext` and store the result as this user's password.
    pub fn set_password(&mut self, plaintext: &str) -> Result<(), CredentialError> {
        self.password_hash = Set(credentials::set_password(plaintext)?);
        Ok(())
    }
}

impl Model {
    pub fn check_password(&self, plaintext: &str) -> bool {
        credentials::check_password(plaintext, &self.password_hash)
    }
}

impl Authenticatable for Model {
    fn identity(&self) -> String {
        self.id.to_string()
    }
}

/// Find a user by exact username.
pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await
}

/// Find a user by exact email address.
pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, DbErr> {
    Entity::find().filter(Column::Email.eq(email)).one(db).await
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Create a user with a hashed password inside its own transaction.
///
/// A failed insert (for example a unique constraint lost to a concurrent
/// registration) is rolled back before the error is returned.
pub async fn register<C>(
    db: &C,
    username: &str,
    email: Option<&str>,
    password: &str,
) -> Result<Model, RegistrationError>
where
    C: TransactionTrait,
{
    let mut new_user = ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.map(str::to_string)),
        ..Default::default()
    };
    new_user.set_password(password)?;

    let txn = db.begin().await?;
    match new_user.insert(&txn).await {
        Ok(user) => {
            txn.commit().await?;
            tracing::debug!("Committed new user {} with ID {}", user.username, user.id);
            Ok(user)
        }
        Err(e) => {
            tracing::warn!("Insert of user '{}' failed, rolling back: {}", username, e);
            if let Err(rollback_error) = txn.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_error);
            }
            Err(e.into())
        }
    }
}
