//! Scan orchestration: search, concurrent fetch, extract, merge, filter.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::carrier::CarrierClassifier;
use super::dates::parse_header_date;
use super::dedup::PackageSet;
use super::rules::Extractor;
use super::types::{Package, PackageStatus, ScanQuery};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::mail::{Mailbox, MailProvider, RawMessage};

/// Runs one mailbox scan per call. Holds no per-request state.
pub struct Scanner {
    provider: Arc<dyn MailProvider>,
    extractor: Extractor,
    classifier: CarrierClassifier,
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with the default extraction and carrier rules.
    pub fn new(provider: Arc<dyn MailProvider>, config: ScanConfig) -> Self {
        Self {
            provider,
            extractor: Extractor::default_rules(),
            classifier: CarrierClassifier::default_rules(),
            config,
        }
    }

    /// Replace the rule sets.
    pub fn with_rules(mut self, extractor: Extractor, classifier: CarrierClassifier) -> Self {
        self.extractor = extractor;
        self.classifier = classifier;
        self
    }

    /// The provider search string for this scanner's window.
    pub fn query(&self) -> String {
        ScanQuery::shipping(self.config.window_days).to_query_string()
    }

    /// Scan the mailbox behind `token` for packages still in transit.
    ///
    /// Fails only on an empty token or a failed search. Messages that cannot
    /// be fetched or parsed are logged and skipped.
    pub async fn scan(&self, token: &SecretString) -> Result<Vec<Package>, ScanError> {
        if token.expose_secret().trim().is_empty() {
            return Err(ScanError::MissingToken);
        }

        let query = self.query();
        info!(
            provider = self.provider.name(),
            window_days = self.config.window_days,
            max_results = self.config.max_results,
            "Starting scan"
        );

        let mut refs = self
            .provider
            .search(token, &query, self.config.max_results)
            .await
            .map_err(ScanError::Search)?;
        refs.truncate(self.config.max_results as usize);

        let results = join_all(refs.iter().map(|r| self.scan_message(token, &r.id))).await;

        let mut packages = PackageSet::new();
        let mut skipped = 0usize;
        for (msg_ref, result) in refs.iter().zip(results) {
            match result {
                Ok(Some((package, sent_at))) => {
                    let outcome = packages.insert_sent(package, sent_at);
                    debug!(message_id = %msg_ref.id, ?outcome, "Merged package");
                }
                Ok(None) => debug!(message_id = %msg_ref.id, "No identifier, message ignored"),
                Err(e) => {
                    skipped += 1;
                    warn!(message_id = %msg_ref.id, error = %e, "Skipping message");
                }
            }
        }

        let tracked = packages.len();
        let in_transit = packages.into_in_transit();
        info!(
            messages = refs.len(),
            skipped,
            tracked,
            count = in_transit.len(),
            "Scan complete"
        );
        Ok(in_transit)
    }

    async fn scan_message(
        &self,
        token: &SecretString,
        id: &str,
    ) -> Result<Option<(Package, DateTime<Utc>)>, ScanError> {
        let message = self
            .provider
            .fetch(token, id)
            .await
            .map_err(|source| ScanError::Fetch {
                id: id.to_string(),
                source,
            })?;
        self.build(&message)
    }

    /// Turn one fetched message into a package record.
    ///
    /// `Ok(None)` means the message carries no identifier.
    pub fn build_package(&self, message: &RawMessage) -> Result<Option<Package>, ScanError> {
        Ok(self.build(message)?.map(|(package, _)| package))
    }

    /// Package record plus the message time it was read at.
    fn build(&self, message: &RawMessage) -> Result<Option<(Package, DateTime<Utc>)>, ScanError> {
        let required = |header: &'static str| {
            message.header(header).ok_or_else(|| ScanError::MissingHeader {
                id: message.id.clone(),
                header,
            })
        };
        let from = required("From")?;
        let subject = required("Subject")?.trim();
        let date_header = required("Date")?;

        let sent_at = parse_header_date(date_header)
            .or_else(|| message.internal_timestamp())
            .ok_or_else(|| ScanError::NoTimestamp {
                id: message.id.clone(),
            })?;

        let body = message.text_body().map_err(|e| ScanError::Decode {
            id: message.id.clone(),
            reason: e.to_string(),
        })?;

        let extraction = self.extractor.extract(subject, &body, sent_at);
        let Some(identifier) = extraction.identifier else {
            return Ok(None);
        };

        let carrier = self.classifier.classify(from, &identifier);
        let sender = extraction
            .shipper
            .unwrap_or_else(|| Mailbox::parse(from).display_name().to_string());
        let description = if subject.is_empty() {
            message.snippet.as_deref().unwrap_or_default().trim().to_string()
        } else {
            subject.to_string()
        };
        let status = if extraction.delivered {
            PackageStatus::Delivered
        } else {
            PackageStatus::InTransit
        };

        let package = Package {
            sender,
            carrier,
            description,
            tracking_number: identifier.value,
            date: extraction.arrival.unwrap_or(sent_at),
            status,
        };
        Ok(Some((package, sent_at)))
    }
}
