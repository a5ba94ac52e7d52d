//! Mail provider abstraction.
//!
//! The scan pipeline talks to the mailbox through [`MailProvider`] only:
//! one search call, then one fetch per hit. [`gmail::GmailClient`] is the
//! production implementation.

pub mod gmail;
pub mod types;

pub use gmail::GmailClient;
pub use types::{Header, Mailbox, MessagePart, MessageRef, PartBody, RawMessage};

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::ProviderError;

/// Read-only access to a user's mailbox, authorized per call by a bearer token.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Provider name for logging (e.g. "gmail").
    fn name(&self) -> &str;

    /// Search for messages matching `query`, returning at most `max_results` ids.
    async fn search(
        &self,
        token: &SecretString,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<MessageRef>, ProviderError>;

    /// Fetch the full representation of one message.
    async fn fetch(&self, token: &SecretString, id: &str) -> Result<RawMessage, ProviderError>;
}
