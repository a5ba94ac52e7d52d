//! Field extraction rules.
//!
//! Each field is an ordered list of regex rules, evaluated by priority:
//! - Identifier: tracking rules (subject, then body), then order rules
//!   (subject, then body). First hit wins.
//! - Shipper override: capture rules over the body, then the subject. A
//!   capture must look like a name: capitalised, not a date or weekday, and
//!   not matched by an exclusion rule (carrier brands by default).
//! - Arrival override: capture rules over the body; the first capture that
//!   parses as a date wins.
//! - Delivered: any phrase rule matching the body or subject.
//!
//! Only the identifier is mandatory. Everything else degrades to `None`.

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use super::dates::parse_arrival_date;
use super::types::{Identifier, IdentifierKind};

/// A rule producing an identifier from its whole match.
#[derive(Debug, Clone)]
pub struct IdentifierRule {
    /// Human-readable description.
    pub label: String,
    pub regex: Regex,
    pub kind: IdentifierKind,
}

/// A phrase rule. Capture rules read group 1; flag rules only test for a match.
#[derive(Debug, Clone)]
pub struct TextRule {
    pub label: String,
    pub regex: Regex,
}

impl TextRule {
    fn new(label: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            label: label.into(),
            regex: Regex::new(pattern)?,
        })
    }
}

/// Everything pulled out of one message's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub identifier: Option<Identifier>,
    pub shipper: Option<String>,
    pub arrival: Option<DateTime<Utc>>,
    pub delivered: bool,
}

/// Ordered extraction rules.
#[derive(Debug, Clone)]
pub struct Extractor {
    identifier_rules: Vec<IdentifierRule>,
    shipper_rules: Vec<TextRule>,
    shipper_exclusions: Vec<TextRule>,
    arrival_rules: Vec<TextRule>,
    delivered_rules: Vec<TextRule>,
}

const DAY_WORDS: [&str; 9] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "today",
    "tomorrow",
];

/// Cuts a captured shipper name at the verb that follows it.
fn shipper_tail() -> &'static Regex {
    static TAIL: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    TAIL.get_or_init(|| {
        Regex::new(r"(?i)\s+(?:has|have|is|are|was|were|will|on|via|to)\b.*$")
            .expect("static shipper tail pattern")
    })
}

impl Extractor {
    /// Create an extractor with the default shipping rules.
    pub fn default_rules() -> Self {
        let rule = |label: &str, pattern: &str| {
            TextRule::new(label, pattern).expect("static extraction pattern")
        };

        let identifier_rules = vec![
            // UPS 1Z, FedEx 12-15 digits, USPS 20-22 / 9xxxx, Amazon Logistics TBA
            IdentifierRule {
                label: "carrier tracking number".into(),
                regex: Regex::new(
                    r"(?i)\b(?:1Z[A-Z0-9]{16}|[0-9]{12,15}|[0-9]{20,22}|9[0-9]{15,21}|TBA[0-9]{12})\b",
                )
                .expect("static tracking pattern"),
                kind: IdentifierKind::Tracking,
            },
            IdentifierRule {
                label: "vendor order number".into(),
                regex: Regex::new(r"\b[0-9]{3}-[0-9]{7}-[0-9]{7}\b").expect("static order pattern"),
                kind: IdentifierKind::Order,
            },
        ];

        let shipper_rules = vec![rule(
            "shipper phrase",
            r"(?i)\b(?:shipment from|shipped by|package from|sold by)\s*:?\s*([^\s.,!?;:()<>|\[\]][^\r\n.,!?;:()<>|\[\]]{1,79})",
        )];

        // "shipped by FedEx Ground" names the carrier, not the seller.
        let shipper_exclusions = vec![rule(
            "carrier name",
            r"(?i)^(?:fedex|usps|ups|amazon|dhl|ontrac|lasership|u\.?s\.?\s*postal)\b",
        )];

        let arrival_rules = vec![rule(
            "arrival phrase",
            r"(?i)\b(?:arriving(?:\s+(?:on|by))?|arrives(?:\s+(?:on|by))?|expected(?:\s+delivery)?(?:\s+date)?(?:\s+by)?|estimated\s+(?:delivery|arrival)(?:\s+date)?|scheduled\s+delivery(?:\s+date)?|delivery\s+date|delivered\s+on)\s*:?\s*(today|tomorrow|[0-9]{4}-[0-9]{2}-[0-9]{2}|(?:[a-z]{3,9}\.?,?\s+)?(?:[a-z]{3,9}\.?\s+[0-9]{1,2}(?:st|nd|rd|th)?(?:,?\s+[0-9]{4})?|[0-9]{1,2}/[0-9]{1,2}(?:/[0-9]{2,4})?))",
        )];

        let delivered_rules = vec![
            rule("has been delivered", r"(?i)has been delivered"),
            rule("was delivered", r"(?i)was delivered"),
        ];

        Self {
            identifier_rules,
            shipper_rules,
            shipper_exclusions,
            arrival_rules,
            delivered_rules,
        }
    }

    /// Create an empty extractor (for testing).
    pub fn empty() -> Self {
        Self {
            identifier_rules: Vec::new(),
            shipper_rules: Vec::new(),
            shipper_exclusions: Vec::new(),
            arrival_rules: Vec::new(),
            delivered_rules: Vec::new(),
        }
    }

    /// Add an identifier rule at lowest priority within its kind.
    pub fn add_identifier_rule(
        &mut self,
        label: &str,
        pattern: &str,
        kind: IdentifierKind,
    ) -> Result<(), regex::Error> {
        self.identifier_rules.push(IdentifierRule {
            label: label.into(),
            regex: Regex::new(pattern)?,
            kind,
        });
        Ok(())
    }

    /// Add a shipper rule. Group 1 must capture the name.
    pub fn add_shipper_rule(&mut self, label: &str, pattern: &str) -> Result<(), regex::Error> {
        self.shipper_rules.push(TextRule::new(label, pattern)?);
        Ok(())
    }

    /// Add a pattern that disqualifies a captured shipper name.
    pub fn add_shipper_exclusion(&mut self, label: &str, pattern: &str) -> Result<(), regex::Error> {
        self.shipper_exclusions.push(TextRule::new(label, pattern)?);
        Ok(())
    }

    /// Add an arrival rule. Group 1 must capture the date text.
    pub fn add_arrival_rule(&mut self, label: &str, pattern: &str) -> Result<(), regex::Error> {
        self.arrival_rules.push(TextRule::new(label, pattern)?);
        Ok(())
    }

    /// Add a phrase that marks a package as delivered.
    pub fn add_delivered_rule(&mut self, label: &str, pattern: &str) -> Result<(), regex::Error> {
        self.delivered_rules.push(TextRule::new(label, pattern)?);
        Ok(())
    }

    /// Run every rule set over a message.
    pub fn extract(&self, subject: &str, body: &str, sent_at: DateTime<Utc>) -> Extraction {
        Extraction {
            identifier: self.identifier(subject, body),
            shipper: self.shipper(subject, body, sent_at),
            arrival: self.arrival(body, sent_at),
            delivered: self.is_delivered(subject, body),
        }
    }

    /// First identifier by priority: kind, then field, then rule order.
    pub fn identifier(&self, subject: &str, body: &str) -> Option<Identifier> {
        for kind in [IdentifierKind::Tracking, IdentifierKind::Order] {
            for text in [subject, body] {
                for rule in self.identifier_rules.iter().filter(|r| r.kind == kind) {
                    if let Some(m) = rule.regex.find(text) {
                        debug!(rule = %rule.label, value = m.as_str(), "Identifier matched");
                        return Some(match kind {
                            IdentifierKind::Tracking => Identifier::tracking(m.as_str()),
                            IdentifierKind::Order => Identifier::order(m.as_str()),
                        });
                    }
                }
            }
        }
        None
    }

    /// Alternate shipper named in the text, body first.
    pub fn shipper(&self, subject: &str, body: &str, sent_at: DateTime<Utc>) -> Option<String> {
        for text in [body, subject] {
            for rule in &self.shipper_rules {
                for caps in rule.regex.captures_iter(text) {
                    let Some(name) = caps.get(1).and_then(|m| clean_shipper_name(m.as_str())) else {
                        continue;
                    };
                    if self.is_shipper_name(&name, sent_at) {
                        debug!(rule = %rule.label, shipper = %name, "Shipper override matched");
                        return Some(name);
                    }
                    debug!(rule = %rule.label, capture = %name, "Shipper capture rejected");
                }
            }
        }
        None
    }

    fn is_shipper_name(&self, name: &str, sent_at: DateTime<Utc>) -> bool {
        if !name.starts_with(char::is_uppercase) {
            return false;
        }
        let first_word = name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if DAY_WORDS.contains(&first_word.as_str()) || parse_arrival_date(name, sent_at).is_some() {
            return false;
        }
        !self.shipper_exclusions.iter().any(|rule| rule.regex.is_match(name))
    }

    /// Explicit arrival date in the body. Unparseable candidates are skipped.
    pub fn arrival(&self, body: &str, sent_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        for rule in &self.arrival_rules {
            for caps in rule.regex.captures_iter(body) {
                let Some(raw) = caps.get(1) else { continue };
                match parse_arrival_date(raw.as_str(), sent_at) {
                    Some(date) => {
                        debug!(rule = %rule.label, raw = raw.as_str(), %date, "Arrival override matched");
                        return Some(date);
                    }
                    None => debug!(raw = raw.as_str(), "Unparseable arrival date ignored"),
                }
            }
        }
        None
    }

    /// Whether any delivered phrase appears in the body or subject.
    pub fn is_delivered(&self, subject: &str, body: &str) -> bool {
        self.delivered_rules
            .iter()
            .any(|rule| rule.regex.is_match(body) || rule.regex.is_match(subject))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::default_rules()
    }
}

/// Trim a captured shipper name down to the name itself.
fn clean_shipper_name(raw: &str) -> Option<String> {
    let name = shipper_tail().replace(raw, "");
    let name = name.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    (name.chars().count() >= 2).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sent_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn extract(subject: &str, body: &str) -> Extraction {
        Extractor::default_rules().extract(subject, body, sent_at())
    }

    // ── Identifier ──────────────────────────────────────────────

    #[test]
    fn ups_tracking_in_body() {
        let e = extract("Your order has shipped", "Tracking number: 1Z999AA10123456784");
        assert_eq!(e.identifier, Some(Identifier::tracking("1Z999AA10123456784")));
    }

    #[test]
    fn lowercase_tracking_is_normalized() {
        let e = extract("Shipped", "tracking 1z999aa10123456784");
        assert_eq!(e.identifier.unwrap().value, "1Z999AA10123456784");
    }

    #[test]
    fn subject_checked_before_body() {
        let e = extract(
            "Shipment 123456789012 is on its way",
            "Reference 1Z999AA10123456784",
        );
        assert_eq!(e.identifier.unwrap().value, "123456789012");
    }

    #[test]
    fn tracking_preferred_over_order_number() {
        let e = extract(
            "Your Amazon.com order #112-1234567-1234567 has shipped",
            "Track with TBA123456789012",
        );
        let id = e.identifier.unwrap();
        assert_eq!(id.value, "TBA123456789012");
        assert_eq!(id.kind, IdentifierKind::Tracking);
    }

    #[test]
    fn order_number_when_no_tracking() {
        let e = extract("Your order has shipped", "Order #112-1234567-1234567 is on the way.");
        assert_eq!(e.identifier, Some(Identifier::order("112-1234567-1234567")));
    }

    #[test]
    fn usps_long_numeric() {
        let e = extract("USPS Expected Delivery", "9400111899223456789012");
        assert_eq!(e.identifier.unwrap().value, "9400111899223456789012");
    }

    #[test]
    fn no_identifier() {
        let e = extract("Out for delivery", "Your package is out for delivery today.");
        assert_eq!(e.identifier, None);
    }

    #[test]
    fn short_numbers_are_not_tracking() {
        let e = extract("Order update", "Call 1-800-555-1234 or use code 12345678901.");
        assert_eq!(e.identifier, None);
    }

    // ── Shipper ─────────────────────────────────────────────────

    #[test]
    fn shipper_from_body_phrase() {
        let e = extract("Shipped", "Your shipment from Target has shipped and is on its way.");
        assert_eq!(e.shipper.as_deref(), Some("Target"));
    }

    #[test]
    fn sold_by_with_colon() {
        let e = extract("Shipped", "Item: Desk lamp\nSold by: Acme Lighting Co\nQty: 1");
        assert_eq!(e.shipper.as_deref(), Some("Acme Lighting Co"));
    }

    #[test]
    fn shipper_body_beats_subject() {
        let e = extract("Your package from Etsy", "Sold by WoodWorks Studio.");
        assert_eq!(e.shipper.as_deref(), Some("WoodWorks Studio"));
    }

    #[test]
    fn shipper_from_subject_fallback() {
        let e = extract("Your package from Best Buy is on the way", "Track it below.");
        assert_eq!(e.shipper.as_deref(), Some("Best Buy"));
    }

    #[test]
    fn no_shipper_phrase() {
        assert_eq!(extract("Shipped", "It shipped.").shipper, None);
    }

    #[test]
    fn shipped_by_date_is_not_a_shipper() {
        let e = extract("Shipped", "Your item will be shipped by October 25.");
        assert_eq!(e.shipper, None);
        let e = extract("Shipped", "It will be shipped by Friday.");
        assert_eq!(e.shipper, None);
    }

    #[test]
    fn shipped_by_carrier_is_not_a_shipper() {
        let e = extract("Shipped", "Your order was shipped by FedEx Ground.");
        assert_eq!(e.shipper, None);
        let e = extract("Shipped", "Package from UPS Mail Innovations");
        assert_eq!(e.shipper, None);
    }

    #[test]
    fn account_wording_is_not_a_shipper() {
        let e = extract("Shipped", "You can manage your order from Your Account page.");
        assert_eq!(e.shipper, None);
    }

    #[test]
    fn numeric_or_lowercase_capture_is_not_a_shipper() {
        assert_eq!(extract("Shipped", "Shipped by 10/25 at the latest.").shipper, None);
        assert_eq!(extract("Shipped", "This item is sold by the seller.").shipper, None);
    }

    #[test]
    fn rejected_capture_falls_through_to_next_candidate() {
        let e = extract(
            "Your package from Etsy is on the way",
            "Your order was shipped by FedEx Ground.",
        );
        assert_eq!(e.shipper.as_deref(), Some("Etsy"));
    }

    #[test]
    fn custom_shipper_exclusion() {
        let mut extractor = Extractor::default_rules();
        extractor
            .add_shipper_exclusion("marketplace", r"(?i)^marketplace\b")
            .unwrap();
        let e = extractor.extract("Shipped", "Sold by Marketplace Partner.", sent_at());
        assert_eq!(e.shipper, None);
    }

    // ── Arrival ─────────────────────────────────────────────────

    #[test]
    fn arriving_weekday_date() {
        let e = extract("Shipped", "Arriving Friday, October 23");
        assert_eq!(
            e.arrival,
            Some(Utc.with_ymd_and_hms(2026, 10, 23, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn expected_delivery_numeric() {
        let e = extract("Shipped", "Expected delivery date: 10/22/2026");
        assert_eq!(
            e.arrival,
            Some(Utc.with_ymd_and_hms(2026, 10, 22, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_arrival_falls_through() {
        let e = extract("Shipped", "Estimated delivery: soon-ish. Arriving tomorrow.");
        assert_eq!(
            e.arrival,
            Some(Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn malformed_arrival_is_none() {
        let e = extract("Shipped", "Arriving February 30");
        assert_eq!(e.arrival, None);
    }

    #[test]
    fn arrival_only_read_from_body() {
        let e = extract("Arriving October 23", "No date here.");
        assert_eq!(e.arrival, None);
    }

    // ── Delivered ───────────────────────────────────────────────

    #[test]
    fn delivered_phrase_case_insensitive() {
        assert!(extract("Update", "Your package HAS BEEN DELIVERED.").delivered);
        assert!(extract("Your package was delivered", "").delivered);
        assert!(!extract("Out for delivery", "Your package will be delivered today.").delivered);
    }

    // ── Custom rules ────────────────────────────────────────────

    #[test]
    fn empty_extractor_finds_nothing() {
        let e = Extractor::empty().extract(
            "Your package has been delivered",
            "1Z999AA10123456784 sold by Acme",
            sent_at(),
        );
        assert_eq!(
            e,
            Extraction {
                identifier: None,
                shipper: None,
                arrival: None,
                delivered: false,
            }
        );
    }

    #[test]
    fn custom_rules_extend_extraction() {
        let mut extractor = Extractor::empty();
        extractor
            .add_identifier_rule("dhl waybill", r"\bJD[0-9]{18}\b", IdentifierKind::Tracking)
            .unwrap();
        extractor
            .add_shipper_rule("merchant", r"(?i)merchant:\s*(\w+)")
            .unwrap();
        extractor
            .add_arrival_rule("eta", r"(?i)eta\s+([0-9]{4}-[0-9]{2}-[0-9]{2})")
            .unwrap();
        extractor
            .add_delivered_rule("zugestellt", r"(?i)zugestellt")
            .unwrap();

        let e = extractor.extract(
            "Paket zugestellt",
            "Waybill JD014600003828946018, merchant: Zalando, ETA 2026-10-21",
            sent_at(),
        );
        assert_eq!(e.identifier.unwrap().value, "JD014600003828946018");
        assert_eq!(e.shipper.as_deref(), Some("Zalando"));
        assert_eq!(
            e.arrival,
            Some(Utc.with_ymd_and_hms(2026, 10, 21, 0, 0, 0).unwrap())
        );
        assert!(e.delivered);
    }

    #[test]
    fn invalid_custom_pattern_is_rejected() {
        let mut extractor = Extractor::empty();
        assert!(extractor.add_shipper_rule("bad", r"(unclosed").is_err());
    }
}
