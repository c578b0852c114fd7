use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tokio::task;
use uuid::Uuid;

use crate::{
    domain::{
        entities::billing::{BillingSubscriptionEntity, UpsertBillingSubscriptionEntity},
        repositories::billing::BillingRepository,
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{billing_customers, billing_subscriptions},
    },
};

pub struct BillingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BillingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl BillingRepository for BillingPostgres {
    async fn find_customer_id(&self, user_id: Uuid) -> Result<Option<String>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<String>> {
            let mut conn = db_pool.get()?;

            let customer_id = billing_customers::table
                .filter(billing_customers::user_id.eq(user_id))
                .select(billing_customers::stripe_customer_id)
                .first::<String>(&mut conn)
                .optional()?;

            Ok(customer_id)
        })
        .await??)
    }

    async fn insert_customer(&self, user_id: Uuid, stripe_customer_id: String) -> Result<()> {
        let db_pool = Arc::clone(&self.db_pool);

        task::spawn_blocking(move || -> Result<()> {
            let mut conn = db_pool.get()?;

            insert_into(billing_customers::table)
                .values((
                    billing_customers::user_id.eq(user_id),
                    billing_customers::stripe_customer_id.eq(stripe_customer_id),
                    billing_customers::created_at.eq(Utc::now()),
                ))
                .on_conflict(billing_customers::user_id)
                .do_nothing()
                .execute(&mut conn)?;

            Ok(())
        })
        .await??;

        Ok(())
    }

    async fn find_subscription(&self, user_id: Uuid) -> Result<Option<BillingSubscriptionEntity>> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Option<BillingSubscriptionEntity>> {
            let mut conn = db_pool.get()?;

            let subscription = billing_subscriptions::table
                .filter(billing_subscriptions::user_id.eq(user_id))
                .select(BillingSubscriptionEntity::as_select())
                .first::<BillingSubscriptionEntity>(&mut conn)
                .optional()?;

            Ok(subscription)
        })
        .await??)
    }

    async fn upsert_subscription(&self, entity: UpsertBillingSubscriptionEntity) -> Result<Uuid> {
        let db_pool = Arc::clone(&self.db_pool);

        Ok(task::spawn_blocking(move || -> Result<Uuid> {
            let mut conn = db_pool.get()?;

            let id = insert_into(billing_subscriptions::table)
                .values(&entity)
                .on_conflict(billing_subscriptions::user_id)
                .do_update()
                .set(&entity)
                .returning(billing_subscriptions::id)
                .get_result::<Uuid>(&mut conn)?;

            Ok(id)
        })
        .await??)
    }

    async fn update_subscription_status(
        &self,
        stripe_subscription_id: String,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let db_pool = Arc::clone(&self.db_pool);
        let now = Utc::now();

        Ok(task::spawn_blocking(move || -> Result<bool> {
            let mut conn = db_pool.get()?;
            let target = billing_subscriptions::table
                .filter(billing_subscriptions::stripe_subscription_id.eq(stripe_subscription_id));

            let updated = match current_period_end {
                Some(period_end) => update(target)
                    .set((
                        billing_subscriptions::status.eq(status.to_string()),
                        billing_subscriptions::current_period_end.eq(Some(period_end)),
                        billing_subscriptions::updated_at.eq(now),
                    ))
                    .execute(&mut conn)?,
                None => update(target)
                    .set((
                        billing_subscriptions::status.eq(status.to_string()),
                        billing_subscriptions::updated_at.eq(now),
                    ))
                    .execute(&mut conn)?,
            };

            Ok(updated > 0)
        })
        .await??)
    }
}
