//! Seeding helpers for the `#[ignore]`d repository tests. They need `DATABASE_URL` pointing at a
//! database with the migrations applied (`diesel migration run`).

use anyhow::Result;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, delete, insert_into, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::message_logs::InsertMessageLogEntity,
        value_objects::enums::{
            campaign_statuses::CampaignStatus, processing_statuses::ProcessingStatus,
        },
    },
    infra::db::postgres::{
        postgres_connection::{PgPoolSquad, establish_connection},
        schema::{campaigns, contact_groups, contacts},
    },
};

pub fn pool_from_env() -> Result<Arc<PgPoolSquad>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")?;
    Ok(Arc::new(establish_connection(&database_url, 4)?))
}

/// A phone number no other test run will share.
pub fn unique_phone() -> String {
    format!("+1999{:07}", Uuid::new_v4().as_u128() % 10_000_000)
}

pub fn seed_group(pool: &PgPoolSquad, phones: &[&str]) -> Result<Uuid> {
    let mut conn = pool.get()?;

    let group_id = insert_into(contact_groups::table)
        .values((
            contact_groups::user_id.eq(Uuid::new_v4()),
            contact_groups::name.eq("repository test group"),
        ))
        .returning(contact_groups::id)
        .get_result::<Uuid>(&mut conn)?;

    for phone in phones {
        insert_into(contacts::table)
            .values((
                contacts::group_id.eq(group_id),
                contacts::phone_number.eq(*phone),
            ))
            .execute(&mut conn)?;
    }

    Ok(group_id)
}

pub fn seed_campaign(
    pool: &PgPoolSquad,
    group_id: Uuid,
    status: CampaignStatus,
    scheduled_for: Option<DateTime<Utc>>,
) -> Result<Uuid> {
    let mut conn = pool.get()?;

    let campaign_id = insert_into(campaigns::table)
        .values((
            campaigns::user_id.eq(Uuid::new_v4()),
            campaigns::name.eq("repository test campaign"),
            campaigns::message.eq("See you Saturday"),
            campaigns::group_id.eq(group_id),
            campaigns::scheduled_for.eq(scheduled_for),
            campaigns::status.eq(status.to_string()),
            campaigns::processing_status.eq(ProcessingStatus::Pending.to_string()),
        ))
        .returning(campaigns::id)
        .get_result::<Uuid>(&mut conn)?;

    Ok(campaign_id)
}

pub fn send_log(campaign_id: Uuid, sid: Option<&str>, status: &str) -> InsertMessageLogEntity {
    let now = Utc::now();
    InsertMessageLogEntity {
        campaign_id,
        contact_id: None,
        to_number: unique_phone(),
        message_sid: sid.map(str::to_string),
        status: status.to_string(),
        error_message: None,
        created_at: now,
        updated_at: now,
    }
}

/// Cascades to the group's contacts, campaigns, message logs and analytics.
pub fn drop_group(pool: &PgPoolSquad, group_id: Uuid) -> Result<()> {
    let mut conn = pool.get()?;
    delete(contact_groups::table.filter(contact_groups::id.eq(group_id))).execute(&mut conn)?;
    Ok(())
}
