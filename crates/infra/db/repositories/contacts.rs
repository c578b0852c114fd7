use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, delete, prelude::*};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::contacts::ContactGroupEntity, repositories::contacts::ContactRepository,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{contact_groups, contacts},
    },
};

pub struct ContactPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl ContactPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ContactRepository for ContactPostgres {
    async fn find_group(&self, group_id: Uuid) -> Result<Option<ContactGroupEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<ContactGroupEntity>> {
            let mut conn = db_pool.get()?;

            let group = contact_groups::table
                .filter(contact_groups::id.eq(group_id))
                .select(ContactGroupEntity::as_select())
                .first::<ContactGroupEntity>(&mut conn)
                .optional()?;

            Ok(group)
        })
        .await??)
    }

    async fn delete_contacts_by_phone(&self, phone_number: String) -> Result<Vec<Uuid>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Vec<Uuid>> {
            let mut conn = db_pool.get()?;

            let group_ids = delete(contacts::table.filter(contacts::phone_number.eq(phone_number)))
                .returning(contacts::group_id)
                .get_results::<Uuid>(&mut conn)?;

            Ok(group_ids)
        })
        .await??)
    }
}
