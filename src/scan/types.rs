//! Shared types for the scan pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::carrier::Carrier;

// ── Package ─────────────────────────────────────────────────────────

/// Delivery state, derived from message text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageStatus {
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
}

impl PackageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::InTransit => "In Transit",
            Self::Delivered => "Delivered",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One tracked shipment, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Shipper display name (body override, else the `From` header).
    pub sender: String,
    pub carrier: Carrier,
    /// Subject line, or the snippet when the subject is blank.
    pub description: String,
    /// Extracted identifier; unique within a response.
    pub tracking_number: String,
    /// Best-known arrival date, else the message timestamp.
    pub date: DateTime<Utc>,
    pub status: PackageStatus,
}

// ── Identifier ──────────────────────────────────────────────────────

/// What an extracted identifier is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Carrier tracking number.
    Tracking,
    /// Vendor order number.
    Order,
}

/// The deduplication key pulled out of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub value: String,
    pub kind: IdentifierKind,
}

impl Identifier {
    pub fn tracking(value: impl Into<String>) -> Self {
        Self {
            value: value.into().to_ascii_uppercase(),
            kind: IdentifierKind::Tracking,
        }
    }

    pub fn order(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: IdentifierKind::Order,
        }
    }

    pub fn is_all_digits(&self) -> bool {
        !self.value.is_empty() && self.value.bytes().all(|b| b.is_ascii_digit())
    }
}

// ── Search query ────────────────────────────────────────────────────

/// Keyword disjunction plus trailing window, rendered as a Gmail search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanQuery {
    /// Phrases matched against the subject (`subject:"..."`).
    pub subject_terms: Vec<String>,
    /// Phrases matched anywhere in the message.
    pub keywords: Vec<String>,
    /// Sender fragments (`from:...`).
    pub senders: Vec<String>,
    pub window_days: u32,
}

impl ScanQuery {
    /// The default shipping-notification query.
    pub fn shipping(window_days: u32) -> Self {
        Self {
            subject_terms: [
                "your order has shipped",
                "out for delivery",
                "shipment",
                "delivery",
                "tracking",
            ]
            .map(String::from)
            .to_vec(),
            keywords: vec!["tracking number".to_string()],
            senders: ["ups", "fedex", "usps", "amazon"].map(String::from).to_vec(),
            window_days,
        }
    }

    /// Render as a Gmail `q` parameter. `{a b c}` is Gmail's OR group.
    pub fn to_query_string(&self) -> String {
        let terms: Vec<String> = self
            .subject_terms
            .iter()
            .map(|t| format!("subject:{}", quote_term(t)))
            .chain(self.keywords.iter().map(|t| quote_term(t)))
            .chain(self.senders.iter().map(|s| format!("from:{}", quote_term(s))))
            .collect();

        format!(
            "in:anywhere {{{}}} newer_than:{}d",
            terms.join(" "),
            self.window_days
        )
    }
}

fn quote_term(term: &str) -> String {
    if term.chars().any(char::is_whitespace) {
        format!("\"{}\"", term.replace('"', ""))
    } else {
        term.to_string()
    }
}
