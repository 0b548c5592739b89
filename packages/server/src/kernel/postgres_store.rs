//! Postgres-backed record store.
//!
//! Thin delegation to the model query functions; the SQL lives with the
//! models in each domain.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::BaseRecordStore;
use crate::common::{PageRequest, StoreError};
use crate::domains::campaigns::{Campaign, CampaignPatch, NewCampaign};
use crate::domains::email_events::{EmailLog, EmailLogUpdate};
use crate::domains::email_servers::{EmailServer, EmailServerPatch, NewEmailServer};
use crate::domains::leads::Lead;
use crate::domains::senders::Sender;
use crate::domains::settings::UserSettings;
use crate::domains::templates::{
    NewTemplate, Template, TemplatePatch, TemplateSequence, TemplateSummary,
};

#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRecordStore for PostgresRecordStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_campaigns(&self, owner: &str) -> Result<Vec<Campaign>, StoreError> {
        Campaign::find_by_owner(owner, &self.pool).await
    }

    async fn create_campaign(&self, owner: &str, input: NewCampaign) -> Result<Campaign, StoreError> {
        Campaign::insert(owner, &input, &self.pool).await
    }

    async fn find_campaign(&self, owner: &str, id: Uuid) -> Result<Campaign, StoreError> {
        Campaign::find_by_id(id, owner, &self.pool).await
    }

    async fn update_campaign(
        &self,
        owner: &str,
        id: Uuid,
        patch: CampaignPatch,
    ) -> Result<Campaign, StoreError> {
        Campaign::update(id, owner, &patch, &self.pool).await
    }

    async fn delete_campaign(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        Campaign::delete(id, owner, &self.pool).await
    }

    async fn list_templates(
        &self,
        owner: &str,
        page: PageRequest,
    ) -> Result<(Vec<TemplateSummary>, i64), StoreError> {
        let total = Template::count_by_owner(owner, &self.pool).await?;
        let rows = Template::find_page(owner, page, &self.pool).await?;
        Ok((rows, total))
    }

    async fn find_template(&self, owner: &str, id: Uuid) -> Result<Template, StoreError> {
        Template::find_by_id(id, owner, &self.pool).await
    }

    async fn create_template(&self, owner: &str, input: NewTemplate) -> Result<Template, StoreError> {
        Template::insert(owner, &input, &self.pool).await
    }

    async fn update_template(
        &self,
        owner: &str,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<Template, StoreError> {
        Template::update(id, owner, &patch, &self.pool).await
    }

    async fn delete_template(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        Template::delete(id, owner, &self.pool).await
    }

    async fn find_template_sequence(
        &self,
        owner: &str,
        template_id: Uuid,
    ) -> Result<Option<TemplateSequence>, StoreError> {
        TemplateSequence::find_for_template(template_id, owner, &self.pool).await
    }

    async fn save_template_sequence(
        &self,
        owner: &str,
        template_id: Uuid,
        steps: Value,
    ) -> Result<TemplateSequence, StoreError> {
        // Ownership check doubles as the existence check
        Template::find_by_id(template_id, owner, &self.pool).await?;
        TemplateSequence::upsert(template_id, &steps, &self.pool).await
    }

    async fn list_email_servers(&self, owner: &str) -> Result<Vec<EmailServer>, StoreError> {
        EmailServer::find_by_owner(owner, &self.pool).await
    }

    async fn create_email_server(
        &self,
        owner: &str,
        input: NewEmailServer,
    ) -> Result<EmailServer, StoreError> {
        EmailServer::insert(owner, &input, &self.pool).await
    }

    async fn update_email_server(
        &self,
        owner: &str,
        id: Uuid,
        patch: EmailServerPatch,
    ) -> Result<EmailServer, StoreError> {
        EmailServer::update(id, owner, &patch, &self.pool).await
    }

    async fn delete_email_server(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        EmailServer::delete(id, owner, &self.pool).await
    }

    async fn list_leads(&self, owner: &str, page: PageRequest) -> Result<(Vec<Lead>, i64), StoreError> {
        let total = Lead::count_by_owner(owner, &self.pool).await?;
        let rows = Lead::find_page(owner, page, &self.pool).await?;
        Ok((rows, total))
    }

    async fn list_senders(&self, owner: &str) -> Result<Vec<Sender>, StoreError> {
        Sender::find_by_owner(owner, &self.pool).await
    }

    async fn find_settings(&self, user_id: &str) -> Result<Option<UserSettings>, StoreError> {
        UserSettings::find_by_user(user_id, &self.pool).await
    }

    async fn update_email_log(&self, email_id: &str, update: EmailLogUpdate) -> Result<(), StoreError> {
        EmailLog::apply_update(email_id, &update, &self.pool).await
    }
}
