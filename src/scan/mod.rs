//! Shipping-notification scan pipeline.
//!
//! ```text
//! token ─▶ search ─▶ fetch × N (join_all) ─▶ extract ─▶ classify ─▶ merge ─▶ filter
//! ```
//!
//! A [`Scanner`] owns the rule sets and a shared [`crate::mail::MailProvider`].
//! Each [`Scanner::scan`] call builds its own [`PackageSet`] and drops it when
//! the call returns.

pub mod carrier;
pub mod dates;
pub mod dedup;
pub mod rules;
pub mod scanner;
pub mod types;

pub use carrier::{Carrier, CarrierClassifier, CarrierRule, IdentifierShape};
pub use dedup::{MergeOutcome, PackageSet};
pub use rules::{Extraction, Extractor};
pub use scanner::Scanner;
pub use types::{Identifier, IdentifierKind, Package, PackageStatus, ScanQuery};
