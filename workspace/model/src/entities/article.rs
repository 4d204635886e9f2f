use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, QueryOrder, Set};

/// A research article submitted by a user.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,
    /// Link to the article (arXiv page, PDF, ...).
    pub url: Option<String>,
    /// Comma-separated tags, see [`Model::tag_list`].
    pub tags: Option<String>,
    /// Submitting user. Not enforced by the schema, so it may dangle.
    #[sea_orm(indexed)]
    pub user_id: i32,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}

impl Model {
    /// Look up the submitting user.
    ///
    /// Returns `Ok(None)` when `user_id` no longer points at a user.
    pub async fn owner<C: ConnectionTrait>(
        &self,
        db: &C,
    ) -> Result<Option<super::user::Model>, DbErr> {
        self.find_related(super::user::Entity).one(db).await
    }

    /// Split the comma-separated tag string, dropping blanks.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// All articles submitted by `user_id`, oldest first.
pub async fn articles_by_owner<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await
}
