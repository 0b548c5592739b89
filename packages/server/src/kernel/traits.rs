// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Each one stands for an external collaborator that is built once at startup
// and shared by the authorizer, the handlers and the event workers.
//
// Naming convention: Base* for trait names (e.g., BaseRecordStore, BaseTokenVerifier)

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::common::{FallbackError, PageRequest, ProviderError, StoreError};
use crate::domains::campaigns::{Campaign, CampaignPatch, NewCampaign};
use crate::domains::email_events::{EmailEvent, EmailLogUpdate};
use crate::domains::email_servers::{EmailServer, EmailServerPatch, NewEmailServer};
use crate::domains::leads::Lead;
use crate::domains::senders::Sender;
use crate::domains::settings::UserSettings;
use crate::domains::templates::{
    NewTemplate, Template, TemplatePatch, TemplateSequence, TemplateSummary,
};

// =============================================================================
// Identity provider
// =============================================================================

#[async_trait]
pub trait BaseTokenVerifier: Send + Sync {
    /// Resolve a bearer token to the user id it was issued for.
    async fn verify(&self, token: &str) -> Result<String, ProviderError>;
}

/// Local signature check used when the identity provider cannot be asked.
pub trait BaseFallbackVerifier: Send + Sync {
    /// Resolve a bearer token to its `sub` claim.
    fn verify(&self, token: &str) -> Result<String, FallbackError>;
}

// =============================================================================
// Record store
// =============================================================================

/// Every record query is scoped by the caller's user id; rows owned by
/// someone else behave as absent (`StoreError::NotFound`).
#[async_trait]
pub trait BaseRecordStore: Send + Sync {
    /// Cheap round trip for the health check
    async fn ping(&self) -> Result<(), StoreError>;

    // Campaigns
    async fn list_campaigns(&self, owner: &str) -> Result<Vec<Campaign>, StoreError>;
    async fn create_campaign(&self, owner: &str, input: NewCampaign) -> Result<Campaign, StoreError>;
    async fn find_campaign(&self, owner: &str, id: Uuid) -> Result<Campaign, StoreError>;
    async fn update_campaign(
        &self,
        owner: &str,
        id: Uuid,
        patch: CampaignPatch,
    ) -> Result<Campaign, StoreError>;
    async fn delete_campaign(&self, owner: &str, id: Uuid) -> Result<(), StoreError>;

    // Templates
    /// One page of summaries plus the total count across all pages
    async fn list_templates(
        &self,
        owner: &str,
        page: PageRequest,
    ) -> Result<(Vec<TemplateSummary>, i64), StoreError>;
    async fn find_template(&self, owner: &str, id: Uuid) -> Result<Template, StoreError>;
    async fn create_template(&self, owner: &str, input: NewTemplate) -> Result<Template, StoreError>;
    async fn update_template(
        &self,
        owner: &str,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<Template, StoreError>;
    async fn delete_template(&self, owner: &str, id: Uuid) -> Result<(), StoreError>;
    async fn find_template_sequence(
        &self,
        owner: &str,
        template_id: Uuid,
    ) -> Result<Option<TemplateSequence>, StoreError>;
    /// Fails with `NotFound` when the template is absent or not owned
    async fn save_template_sequence(
        &self,
        owner: &str,
        template_id: Uuid,
        steps: Value,
    ) -> Result<TemplateSequence, StoreError>;

    // Email servers
    async fn list_email_servers(&self, owner: &str) -> Result<Vec<EmailServer>, StoreError>;
    /// A new default demotes the owner's other servers
    async fn create_email_server(
        &self,
        owner: &str,
        input: NewEmailServer,
    ) -> Result<EmailServer, StoreError>;
    async fn update_email_server(
        &self,
        owner: &str,
        id: Uuid,
        patch: EmailServerPatch,
    ) -> Result<EmailServer, StoreError>;
    async fn delete_email_server(&self, owner: &str, id: Uuid) -> Result<(), StoreError>;

    // Leads, senders, settings
    async fn list_leads(&self, owner: &str, page: PageRequest) -> Result<(Vec<Lead>, i64), StoreError>;
    async fn list_senders(&self, owner: &str) -> Result<Vec<Sender>, StoreError>;
    async fn find_settings(&self, user_id: &str) -> Result<Option<UserSettings>, StoreError>;

    // Email log (webhook processing, not user scoped)
    /// Fails with `NotFound` when no row has `id = email_id`
    async fn update_email_log(&self, email_id: &str, update: EmailLogUpdate) -> Result<(), StoreError>;
}

// =============================================================================
// Task runner
// =============================================================================

/// Asynchronous execution of webhook events, outside the request/response
/// cycle. `enqueue` returns once the event is handed over, never after it
/// has been processed.
#[async_trait]
pub trait BaseEventRunner: Send + Sync {
    async fn enqueue(&self, event: EmailEvent) -> Result<()>;

    /// Short label for logs and the health check
    fn name(&self) -> &'static str;
}
