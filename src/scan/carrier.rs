//! Carrier classification.
//!
//! Best-effort heuristic: the sender text is checked for brand names first,
//! then the identifier's shape decides. False positives are expected. No
//! carrier API is ever consulted.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Identifier, IdentifierKind};

/// Known carriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Carrier {
    #[serde(rename = "UPS")]
    Ups,
    #[serde(rename = "FedEx")]
    FedEx,
    #[serde(rename = "USPS")]
    Usps,
    Amazon,
    Unknown,
}

impl Carrier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ups => "UPS",
            Self::FedEx => "FedEx",
            Self::Usps => "USPS",
            Self::Amazon => "Amazon",
            Self::Unknown => "Unknown",
        }
    }

    /// Public tracking page for `number`, if the carrier has one.
    ///
    /// Amazon ids are order numbers, so they link to the order history instead.
    pub fn tracking_url(&self, number: &str) -> Option<String> {
        let number = number.trim();
        if number.is_empty() {
            return None;
        }
        match self {
            Self::Ups => Some(format!("https://www.ups.com/track?tracknum={number}")),
            Self::FedEx => Some(format!("https://www.fedex.com/fedextrack/?trknbr={number}")),
            Self::Usps => Some(format!(
                "https://tools.usps.com/go/TrackConfirmAction?qtc_tLabels1={number}"
            )),
            Self::Amazon => Some("https://www.amazon.com/gp/css/order-history".to_string()),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shape test applied to an extracted identifier.
#[derive(Debug, Clone)]
pub enum IdentifierShape {
    /// Tracking number starting with this prefix (case-insensitive).
    Prefix(String),
    /// All-digit tracking number of at least this many digits.
    LongNumeric { min_digits: usize },
    /// Any tracking number.
    AnyTracking,
    /// A vendor order number.
    Order,
}

impl IdentifierShape {
    fn matches(&self, id: &Identifier) -> bool {
        match self {
            Self::Prefix(prefix) => {
                id.kind == IdentifierKind::Tracking
                    && id
                        .value
                        .get(..prefix.len())
                        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            }
            Self::LongNumeric { min_digits } => {
                id.kind == IdentifierKind::Tracking
                    && id.is_all_digits()
                    && id.value.len() >= *min_digits
            }
            Self::AnyTracking => id.kind == IdentifierKind::Tracking,
            Self::Order => id.kind == IdentifierKind::Order,
        }
    }
}

/// One classification rule. Rules are evaluated in order; first match wins.
#[derive(Debug, Clone)]
pub enum CarrierRule {
    /// Regex over the raw sender text (`From` header value).
    Sender { regex: Regex, carrier: Carrier },
    /// Shape test over the identifier.
    Identifier {
        shape: IdentifierShape,
        carrier: Carrier,
    },
}

impl CarrierRule {
    fn evaluate(&self, sender: &str, identifier: &Identifier) -> Option<Carrier> {
        match self {
            Self::Sender { regex, carrier } => regex.is_match(sender).then_some(*carrier),
            Self::Identifier { shape, carrier } => shape.matches(identifier).then_some(*carrier),
        }
    }
}

/// Ordered rule list mapping (sender, identifier) to a carrier.
#[derive(Debug, Clone)]
pub struct CarrierClassifier {
    rules: Vec<CarrierRule>,
}

impl CarrierClassifier {
    /// Brand names in the sender first, then identifier shape.
    ///
    /// `usps` is checked before `ups` since it contains it, and `ups` must
    /// stand alone as a word so "groups" or "pickups" don't count.
    pub fn default_rules() -> Self {
        let sender = |pattern: &str, carrier| CarrierRule::Sender {
            regex: Regex::new(pattern).expect("static carrier pattern"),
            carrier,
        };

        Self {
            rules: vec![
                sender(r"(?i)fedex", Carrier::FedEx),
                sender(r"(?i)usps", Carrier::Usps),
                sender(r"(?i)\bups\b", Carrier::Ups),
                sender(r"(?i)amazon", Carrier::Amazon),
                CarrierRule::Identifier {
                    shape: IdentifierShape::Prefix("1Z".into()),
                    carrier: Carrier::Ups,
                },
                CarrierRule::Identifier {
                    shape: IdentifierShape::LongNumeric { min_digits: 20 },
                    carrier: Carrier::Usps,
                },
                CarrierRule::Identifier {
                    shape: IdentifierShape::AnyTracking,
                    carrier: Carrier::FedEx,
                },
            ],
        }
    }

    /// No rules: everything classifies as `Unknown`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule at lowest priority.
    pub fn push(&mut self, rule: CarrierRule) {
        self.rules.push(rule);
    }

    /// Add a sender regex rule at lowest priority.
    pub fn add_sender_rule(&mut self, pattern: &str, carrier: Carrier) -> Result<(), regex::Error> {
        self.rules.push(CarrierRule::Sender {
            regex: Regex::new(pattern)?,
            carrier,
        });
        Ok(())
    }

    /// Classify. Deterministic: the same inputs always give the same carrier.
    pub fn classify(&self, sender: &str, identifier: &Identifier) -> Carrier {
        let carrier = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(sender, identifier))
            .unwrap_or(Carrier::Unknown);
        debug!(sender, identifier = %identifier.value, carrier = %carrier, "Classified carrier");
        carrier
    }
}

impl Default for CarrierClassifier {
    fn default() -> Self {
        Self::default_rules()
    }
}
