use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::contacts::ContactGroupEntity;

#[automock]
#[async_trait]
pub trait ContactRepository {
    async fn find_group(&self, group_id: Uuid) -> Result<Option<ContactGroupEntity>>;

    /// Deletes every contact with this phone number across all groups and returns the
    /// group id of each deleted row.
    async fn delete_contacts_by_phone(&self, phone_number: String) -> Result<Vec<Uuid>>;
}
