//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;

use genesis_bot::application::errors::{FetchError, TransportError};
use genesis_bot::application::messaging::Dispatcher;
use genesis_bot::application::services::ReadyRegistry;
use genesis_bot::commands::{self, CommandDeps};
use genesis_bot::domain::entities::{
    CommandDescriptor, CommandRegistry, InitialResponse, InteractionHandle, OwnerSet, ReplyPayload,
};
use genesis_bot::domain::traits::{CommandManifest, CommandScope, Platform, TokenMetadata, TokenMetadataSource};
use genesis_bot::infrastructure::storage::MemoryStore;

pub const OWNER: u64 = 560509387626643477;
pub const GUILD: u64 = 1000;

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Outbound call as seen by the platform
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initial(InitialResponse),
    Followup(ReplyPayload),
    Delete(u64),
    Register(CommandScope, usize),
}

/// Platform double that records every call
#[derive(Default)]
pub struct RecordingPlatform {
    calls: Mutex<Vec<Call>>,
    fail_register: bool,
}

impl RecordingPlatform {
    pub fn rejecting_registration() -> Self {
        Self {
            fail_register: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls addressed to a single interaction, in order
    pub fn initial_responses(&self) -> Vec<InitialResponse> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Initial(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn followups(&self) -> Vec<ReplyPayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Followup(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Every message payload, whether sent as initial response or followup
    pub fn messages(&self) -> Vec<ReplyPayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Initial(InitialResponse::Message(p)) | Call::Followup(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn send_initial_response(
        &self,
        _interaction: &InteractionHandle,
        response: InitialResponse,
    ) -> Result<(), TransportError> {
        self.record(Call::Initial(response));
        Ok(())
    }

    async fn send_followup(&self, _interaction: &InteractionHandle, payload: ReplyPayload) -> Result<(), TransportError> {
        self.record(Call::Followup(payload));
        Ok(())
    }

    async fn delete_original_response(&self, interaction: &InteractionHandle) -> Result<(), TransportError> {
        self.record(Call::Delete(interaction.id));
        Ok(())
    }

    async fn register_commands(&self, scope: CommandScope, commands: &[CommandManifest]) -> Result<(), TransportError> {
        if self.fail_register {
            return Err(TransportError::Rejected {
                method: "register commands",
                status: 403,
            });
        }
        self.record(Call::Register(scope, commands.len()));
        Ok(())
    }
}

/// Metadata source whose upstream is always down
pub struct FailingSource;

#[async_trait]
impl TokenMetadataSource for FailingSource {
    async fn fetch_token(&self, _token_id: u64) -> Result<Option<TokenMetadata>, FetchError> {
        Err(FetchError::Status(503))
    }
}

/// Metadata source that knows a single token
pub struct FixedSource;

#[async_trait]
impl TokenMetadataSource for FixedSource {
    async fn fetch_token(&self, token_id: u64) -> Result<Option<TokenMetadata>, FetchError> {
        Ok((token_id == 7).then(|| TokenMetadata {
            name: Some("GENE_SIS #7".to_string()),
            image_url: Some("https://img.example/7.png".to_string()),
            permalink: Some("https://opensea.io/assets/7".to_string()),
        }))
    }
}

pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub platform: Arc<RecordingPlatform>,
    pub store: Arc<MemoryStore>,
}

pub async fn publish(descriptors: Vec<CommandDescriptor>, platform: &RecordingPlatform) -> ReadyRegistry {
    CommandRegistry::build(descriptors)
        .unwrap()
        .publish(platform, CommandScope::Guild(GUILD))
        .await
        .unwrap()
}

/// The bot's real command set over an in-memory store
pub async fn bot(metadata: Option<Arc<dyn TokenMetadataSource>>) -> Harness {
    ensure_init();
    let store = Arc::new(MemoryStore::new());
    let deps = CommandDeps {
        store: store.clone(),
        owners: Arc::new(OwnerSet::new([OWNER])),
        metadata,
    };
    let platform = Arc::new(RecordingPlatform::default());
    let ready = publish(commands::all(&deps), &platform).await;

    Harness {
        dispatcher: Arc::new(Dispatcher::new(ready, platform.clone())),
        platform,
        store,
    }
}

/// Ad-hoc commands for exercising the pipeline itself
pub async fn custom(descriptors: Vec<CommandDescriptor>) -> (Arc<Dispatcher>, Arc<RecordingPlatform>) {
    ensure_init();
    let platform = Arc::new(RecordingPlatform::default());
    let ready = publish(descriptors, &platform).await;
    (Arc::new(Dispatcher::new(ready, platform.clone())), platform)
}
