//! Merge per-message results into one record per identifier.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::types::{Package, PackageStatus};

/// What [`PackageSet::insert`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First record for this identifier.
    Inserted,
    /// Replaced an existing record with an older date.
    Replaced,
    /// An existing record was kept.
    Kept,
}

/// A record plus the time of the message it came from.
#[derive(Debug)]
struct Sighting {
    package: Package,
    sent_at: DateTime<Utc>,
}

impl Sighting {
    /// The package date is a promised arrival rather than the message time.
    fn is_predicted(&self) -> bool {
        self.package.date != self.sent_at
    }
}

/// Packages keyed by tracking number, keeping the latest-dated record.
#[derive(Debug, Default)]
pub struct PackageSet {
    packages: HashMap<String, Sighting>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a record whose date is its own message time.
    pub fn insert(&mut self, package: Package) -> MergeOutcome {
        let sent_at = package.date;
        self.insert_sent(package, sent_at)
    }

    /// Merge a record from a message sent at `sent_at`.
    ///
    /// Later dates win, and on an exact tie a delivered record replaces an
    /// in-transit one. A delivered record from a later message also replaces
    /// an in-transit record dated by a predicted arrival, whatever that
    /// prediction says.
    pub fn insert_sent(&mut self, package: Package, sent_at: DateTime<Utc>) -> MergeOutcome {
        let candidate = Sighting { package, sent_at };
        match self.packages.entry(candidate.package.tracking_number.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                MergeOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                if supersedes(&candidate, slot.get()) {
                    debug!(
                        tracking_number = %candidate.package.tracking_number,
                        date = %candidate.package.date,
                        status = %candidate.package.status,
                        "Replacing older record"
                    );
                    slot.insert(candidate);
                    MergeOutcome::Replaced
                } else {
                    MergeOutcome::Kept
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn get(&self, tracking_number: &str) -> Option<&Package> {
        self.packages.get(tracking_number).map(|s| &s.package)
    }

    /// Surviving records not yet delivered, ordered by date then tracking number.
    pub fn into_in_transit(self) -> Vec<Package> {
        let mut packages: Vec<Package> = self
            .packages
            .into_values()
            .map(|s| s.package)
            .filter(|p| p.status == PackageStatus::InTransit)
            .collect();
        packages.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.tracking_number.cmp(&b.tracking_number))
        });
        packages
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Package> for PackageSet {
    fn extend<I: IntoIterator<Item = Package>>(&mut self, iter: I) {
        for package in iter {
            self.insert(package);
        }
    }
}

fn supersedes(candidate: &Sighting, current: &Sighting) -> bool {
    if delivered_after_prediction(candidate, current) {
        return true;
    }
    if delivered_after_prediction(current, candidate) {
        return false;
    }
    let (candidate, current) = (&candidate.package, &current.package);
    candidate.date > current.date
        || (candidate.date == current.date
            && candidate.status.is_delivered()
            && !current.status.is_delivered())
}

/// `delivered` was sent after `predicted`, whose date is only a promised arrival.
fn delivered_after_prediction(delivered: &Sighting, predicted: &Sighting) -> bool {
    delivered.package.status.is_delivered()
        && !predicted.package.status.is_delivered()
        && predicted.is_predicted()
        && delivered.sent_at > predicted.sent_at
}
