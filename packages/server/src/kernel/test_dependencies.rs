// TestDependencies - in-memory implementations for testing
//
// Provides stand-ins for every Base* trait so the router, the authorizer and
// the event workers can be exercised without Postgres or a live provider.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use super::{
    BaseEventRunner, BaseFallbackVerifier, BaseRecordStore, BaseTokenVerifier, ServerDeps,
};
use crate::common::{FallbackError, PageRequest, ProviderError, StoreError};
use crate::domains::campaigns::{Campaign, CampaignPatch, NewCampaign};
use crate::domains::email_events::{EmailEvent, EmailLogUpdate, EmailStatus};
use crate::domains::email_servers::{EmailServer, EmailServerPatch, NewEmailServer};
use crate::domains::leads::Lead;
use crate::domains::senders::Sender;
use crate::domains::settings::UserSettings;
use crate::domains::templates::{
    NewTemplate, Template, TemplatePatch, TemplateSequence, TemplateSummary,
};

// =============================================================================
// In-memory record store
// =============================================================================

/// Stored state of one `email_log` row.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailLogRow {
    pub status: EmailStatus,
    pub clicked_url: Option<String>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub reply_content: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct StoreState {
    campaigns: Vec<Campaign>,
    templates: Vec<Template>,
    sequences: HashMap<Uuid, TemplateSequence>,
    email_servers: Vec<EmailServer>,
    leads: Vec<Lead>,
    senders: Vec<Sender>,
    settings: HashMap<String, UserSettings>,
    email_logs: HashMap<String, EmailLogRow>,
}

/// Record store backed by plain collections, with the same owner scoping
/// as the Postgres store.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<StoreState>,
    unavailable: AtomicBool,
    ping_delay: Option<Duration>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an `email_log` row in the `sent` state.
    pub fn with_email_log(self, email_id: &str) -> Self {
        self.state.lock().unwrap().email_logs.insert(
            email_id.to_string(),
            EmailLogRow {
                status: EmailStatus::Sent,
                clicked_url: None,
                clicked_at: None,
                reply_content: None,
                replied_at: None,
            },
        );
        self
    }

    pub fn with_lead(self, owner: &str, email: &str) -> Self {
        self.state.lock().unwrap().leads.push(Lead {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            email: email.to_string(),
            company: None,
            website: None,
            linkedin: None,
            image_path: None,
            created_at: Utc::now(),
        });
        self
    }

    pub fn with_sender(self, owner: &str, email: &str) -> Self {
        self.state.lock().unwrap().senders.push(Sender {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            email: Some(email.to_string()),
            display_name: None,
            daily_quota: None,
        });
        self
    }

    pub fn with_settings(self, user_id: &str, settings: Value) -> Self {
        self.state.lock().unwrap().settings.insert(
            user_id.to_string(),
            UserSettings {
                user_id: user_id.to_string(),
                settings,
                updated_at: Utc::now(),
            },
        );
        self
    }

    /// Make `ping` take this long, for exercising request timeouts.
    pub fn with_ping_delay(mut self, delay: Duration) -> Self {
        self.ping_delay = Some(delay);
        self
    }

    /// Current state of an `email_log` row
    pub fn email_log(&self, email_id: &str) -> Option<EmailLogRow> {
        self.state.lock().unwrap().email_logs.get(email_id).cloned()
    }

    /// Make every call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BaseRecordStore for InMemoryRecordStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if let Some(delay) = self.ping_delay {
            tokio::time::sleep(delay).await;
        }
        self.check()
    }

    async fn list_campaigns(&self, owner: &str) -> Result<Vec<Campaign>, StoreError> {
        self.check()?;
        let mut rows: Vec<Campaign> = self
            .state
            .lock()
            .unwrap()
            .campaigns
            .iter()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create_campaign(&self, owner: &str, input: NewCampaign) -> Result<Campaign, StoreError> {
        self.check()?;
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            owner: owner.to_string(),
            template_id: input.template_id,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().campaigns.push(campaign.clone());
        Ok(campaign)
    }

    async fn find_campaign(&self, owner: &str, id: Uuid) -> Result<Campaign, StoreError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .campaigns
            .iter()
            .find(|c| c.id == id && c.owner == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_campaign(
        &self,
        owner: &str,
        id: Uuid,
        patch: CampaignPatch,
    ) -> Result<Campaign, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let campaign = state
            .campaigns
            .iter_mut()
            .find(|c| c.id == id && c.owner == owner)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = patch.name {
            campaign.name = name;
        }
        if let Some(description) = patch.description {
            campaign.description = Some(description);
        }
        if let Some(template_id) = patch.template_id {
            campaign.template_id = Some(template_id);
        }
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.campaigns.len();
        state.campaigns.retain(|c| !(c.id == id && c.owner == owner));
        if state.campaigns.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_templates(
        &self,
        owner: &str,
        page: PageRequest,
    ) -> Result<(Vec<TemplateSummary>, i64), StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let mut owned: Vec<&Template> = state
            .templates
            .iter()
            .filter(|t| t.created_by == owner)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = owned.len() as i64;
        let rows = owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(TemplateSummary::from)
            .collect();
        Ok((rows, total))
    }

    async fn find_template(&self, owner: &str, id: Uuid) -> Result<Template, StoreError> {
        self.check()?;
        self.state
            .lock()
            .unwrap()
            .templates
            .iter()
            .find(|t| t.id == id && t.created_by == owner)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_template(&self, owner: &str, input: NewTemplate) -> Result<Template, StoreError> {
        self.check()?;
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            name: input.name,
            subject: input.subject,
            html: input.html,
            created_by: owner.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().templates.push(template.clone());
        Ok(template)
    }

    async fn update_template(
        &self,
        owner: &str,
        id: Uuid,
        patch: TemplatePatch,
    ) -> Result<Template, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let template = state
            .templates
            .iter_mut()
            .find(|t| t.id == id && t.created_by == owner)
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = patch.name {
            template.name = name;
        }
        if let Some(subject) = patch.subject {
            template.subject = subject;
        }
        if let Some(html) = patch.html {
            template.html = html;
        }
        template.updated_at = Utc::now();
        Ok(template.clone())
    }

    async fn delete_template(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.templates.len();
        state
            .templates
            .retain(|t| !(t.id == id && t.created_by == owner));
        if state.templates.len() == before {
            return Err(StoreError::NotFound);
        }
        state.sequences.remove(&id);
        Ok(())
    }

    async fn find_template_sequence(
        &self,
        owner: &str,
        template_id: Uuid,
    ) -> Result<Option<TemplateSequence>, StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let owned = state
            .templates
            .iter()
            .any(|t| t.id == template_id && t.created_by == owner);
        if !owned {
            return Ok(None);
        }
        Ok(state.sequences.get(&template_id).cloned())
    }

    async fn save_template_sequence(
        &self,
        owner: &str,
        template_id: Uuid,
        steps: Value,
    ) -> Result<TemplateSequence, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let owned = state
            .templates
            .iter()
            .any(|t| t.id == template_id && t.created_by == owner);
        if !owned {
            return Err(StoreError::NotFound);
        }

        let sequence = TemplateSequence {
            template_id,
            steps,
            updated_at: Utc::now(),
        };
        state.sequences.insert(template_id, sequence.clone());
        Ok(sequence)
    }

    async fn list_email_servers(&self, owner: &str) -> Result<Vec<EmailServer>, StoreError> {
        self.check()?;
        let mut rows: Vec<EmailServer> = self
            .state
            .lock()
            .unwrap()
            .email_servers
            .iter()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn create_email_server(
        &self,
        owner: &str,
        input: NewEmailServer,
    ) -> Result<EmailServer, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if input.is_default {
            for other in state.email_servers.iter_mut().filter(|s| s.owner == owner) {
                other.is_default = false;
            }
        }

        let now = Utc::now();
        let server = EmailServer {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            email_address: input.email_address,
            password: input.password,
            pop_imap_server: input.pop_imap_server,
            smtp_server: input.smtp_server,
            smtp_port: input.smtp_port,
            use_ssl: input.use_ssl,
            use_tls: input.use_tls,
            is_default: input.is_default,
            created_at: now,
            updated_at: now,
        };
        state.email_servers.push(server.clone());
        Ok(server)
    }

    async fn update_email_server(
        &self,
        owner: &str,
        id: Uuid,
        patch: EmailServerPatch,
    ) -> Result<EmailServer, StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        if !state
            .email_servers
            .iter()
            .any(|s| s.id == id && s.owner == owner)
        {
            return Err(StoreError::NotFound);
        }

        if patch.makes_default() {
            for other in state
                .email_servers
                .iter_mut()
                .filter(|s| s.owner == owner && s.id != id)
            {
                other.is_default = false;
            }
        }

        let server = state
            .email_servers
            .iter_mut()
            .find(|s| s.id == id && s.owner == owner)
            .ok_or(StoreError::NotFound)?;
        if let Some(email_address) = patch.email_address {
            server.email_address = email_address;
        }
        if let Some(password) = patch.password {
            server.password = password;
        }
        if let Some(pop_imap_server) = patch.pop_imap_server {
            server.pop_imap_server = pop_imap_server;
        }
        if let Some(smtp_server) = patch.smtp_server {
            server.smtp_server = smtp_server;
        }
        if let Some(smtp_port) = patch.smtp_port {
            server.smtp_port = smtp_port;
        }
        if let Some(use_ssl) = patch.use_ssl {
            server.use_ssl = use_ssl;
        }
        if let Some(use_tls) = patch.use_tls {
            server.use_tls = use_tls;
        }
        if let Some(is_default) = patch.is_default {
            server.is_default = is_default;
        }
        server.updated_at = Utc::now();
        Ok(server.clone())
    }

    async fn delete_email_server(&self, owner: &str, id: Uuid) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let before = state.email_servers.len();
        state
            .email_servers
            .retain(|s| !(s.id == id && s.owner == owner));
        if state.email_servers.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_leads(&self, owner: &str, page: PageRequest) -> Result<(Vec<Lead>, i64), StoreError> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let owned: Vec<&Lead> = state.leads.iter().filter(|l| l.owner == owner).collect();
        let total = owned.len() as i64;
        let rows = owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok((rows, total))
    }

    async fn list_senders(&self, owner: &str) -> Result<Vec<Sender>, StoreError> {
        self.check()?;
        let mut rows: Vec<Sender> = self
            .state
            .lock()
            .unwrap()
            .senders
            .iter()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(rows)
    }

    async fn find_settings(&self, user_id: &str) -> Result<Option<UserSettings>, StoreError> {
        self.check()?;
        Ok(self.state.lock().unwrap().settings.get(user_id).cloned())
    }

    async fn update_email_log(&self, email_id: &str, update: EmailLogUpdate) -> Result<(), StoreError> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let row = state
            .email_logs
            .get_mut(email_id)
            .ok_or(StoreError::NotFound)?;

        row.status = update.status;
        if update.clicked_url.is_some() {
            row.clicked_url = update.clicked_url;
        }
        if update.clicked_at.is_some() {
            row.clicked_at = update.clicked_at;
        }
        if update.reply_content.is_some() {
            row.reply_content = update.reply_content;
        }
        if update.replied_at.is_some() {
            row.replied_at = update.replied_at;
        }
        Ok(())
    }
}

// =============================================================================
// Mock identity provider
// =============================================================================

/// Provider stand-in: known tokens resolve to their user, anything else is
/// rejected. `unavailable()` makes every call fail as if the provider were
/// unreachable.
#[derive(Default)]
pub struct MockTokenVerifier {
    tokens: HashMap<String, String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl MockTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.tokens.insert(token.to_string(), user_id.to_string());
        self
    }

    /// Number of verification requests seen
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseTokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable {
            return Err(ProviderError::Unavailable("mock provider offline".to_string()));
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("unknown token".to_string()))
    }
}

// =============================================================================
// Mock fallback verifier
// =============================================================================

/// Local-check stand-in: known tokens map to a fixed outcome, anything else
/// gets `otherwise`.
pub struct MockFallbackVerifier {
    outcomes: HashMap<String, Result<String, FallbackError>>,
    otherwise: FallbackError,
    calls: AtomicUsize,
}

impl MockFallbackVerifier {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            otherwise: FallbackError::Invalid("bad signature".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every token fails as if the secret were unusable
    pub fn misconfigured() -> Self {
        Self {
            otherwise: FallbackError::Misconfigured("bad secret".to_string()),
            ..Self::new()
        }
    }

    pub fn with_token(mut self, token: &str, user_id: &str) -> Self {
        self.outcomes
            .insert(token.to_string(), Ok(user_id.to_string()));
        self
    }

    pub fn with_failure(mut self, token: &str, error: FallbackError) -> Self {
        self.outcomes.insert(token.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockFallbackVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseFallbackVerifier for MockFallbackVerifier {
    fn verify(&self, token: &str) -> Result<String, FallbackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .get(token)
            .cloned()
            .unwrap_or_else(|| Err(self.otherwise.clone()))
    }
}

// =============================================================================
// Spy event runner
// =============================================================================

/// Records enqueued events instead of processing them.
#[derive(Default)]
pub struct SpyEventRunner {
    events: Mutex<Vec<EmailEvent>>,
    failing: bool,
}

impl SpyEventRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every enqueue fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<EmailEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseEventRunner for SpyEventRunner {
    async fn enqueue(&self, event: EmailEvent) -> Result<()> {
        if self.failing {
            return Err(anyhow!("spy runner refuses events"));
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spy"
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of test doubles with handles kept for assertions.
pub struct TestDependencies {
    pub store: Arc<InMemoryRecordStore>,
    pub token_verifier: Arc<MockTokenVerifier>,
    pub fallback_verifier: Option<Arc<MockFallbackVerifier>>,
    pub event_runner: Arc<SpyEventRunner>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryRecordStore::new()),
            token_verifier: Arc::new(MockTokenVerifier::new()),
            fallback_verifier: None,
            event_runner: Arc::new(SpyEventRunner::new()),
        }
    }

    pub fn with_store(mut self, store: InMemoryRecordStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_token_verifier(mut self, verifier: MockTokenVerifier) -> Self {
        self.token_verifier = Arc::new(verifier);
        self
    }

    pub fn with_fallback_verifier(mut self, verifier: MockFallbackVerifier) -> Self {
        self.fallback_verifier = Some(Arc::new(verifier));
        self
    }

    pub fn with_event_runner(mut self, runner: SpyEventRunner) -> Self {
        self.event_runner = Arc::new(runner);
        self
    }

    /// Trait-object view used to build the router
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps {
            record_store: self.store.clone(),
            token_verifier: self.token_verifier.clone(),
            fallback_verifier: self
                .fallback_verifier
                .clone()
                .map(|v| v as Arc<dyn BaseFallbackVerifier>),
            event_runner: self.event_runner.clone(),
        }
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
