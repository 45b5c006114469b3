//! SQLite-backed [`KvStore`] on top of sea-orm.
//!
//! The `kv_entries` table is created by the `migration` crate.

use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, sea_query::OnConflict};

use crate::{KvStore, StoreError};

mod kv_entries {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "kv_entries")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub key: String,
        pub value: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Key-value store persisted in the `kv_entries` table.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    database: DatabaseConnection,
}

impl SqliteStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entry = kv_entries::Entity::find_by_id(key.to_string())
            .one(&self.database)
            .await?;
        Ok(entry.map(|model| model.value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = kv_entries::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
        };
        kv_entries::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entries::Column::Key)
                    .update_column(kv_entries::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        kv_entries::Entity::delete_by_id(key.to_string())
            .exec(&self.database)
            .await?;
        Ok(())
    }
}
