use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar::{RaceCalendar, SeasonPosition};
use crate::record::MetricRecord;

pub const DEFAULT_MIN_RACES: usize = 5;

/// Ordered competitor pair identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub competitor_a: String,
    pub competitor_b: String,
}

impl PairKey {
    pub fn new(competitor_a: impl Into<String>, competitor_b: impl Into<String>) -> Self {
        Self {
            competitor_a: competitor_a.into(),
            competitor_b: competitor_b.into(),
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}", self.competitor_a, self.competitor_b)
    }
}

/// Distinct ordered pairs present in `records`, in first-seen order.
pub fn enumerate_pairs(records: &[MetricRecord]) -> Vec<PairKey> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for record in records {
        let key = record.pair_key();
        if seen.insert(key.clone()) {
            pairs.push(key);
        }
    }
    pairs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    TooFewRaces { found: usize, required: usize },
}

impl Eligibility {
    pub fn is_eligible(self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Minimum shared-race rule applied before a pair is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    pub min_races: usize,
}

impl EligibilityPolicy {
    pub const fn new(min_races: usize) -> Self {
        Self { min_races }
    }

    pub fn assess<T>(&self, pair_records: &[T]) -> Eligibility {
        let found = pair_records.len();
        if found >= self.min_races {
            Eligibility::Eligible
        } else {
            Eligibility::TooFewRaces {
                found,
                required: self.min_races,
            }
        }
    }

    pub fn is_eligible<T>(&self, pair_records: &[T]) -> bool {
        self.assess(pair_records).is_eligible()
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RACES)
    }
}

/// A record enriched with its resolved season position.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub position: SeasonPosition,
    pub record: MetricRecord,
}

/// All records for one ordered pair, sorted by season position.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonPair {
    pub key: PairKey,
    pub races: Vec<RankedRecord>,
}

impl ComparisonPair {
    /// Collect `key`'s records from `records` and order them by season
    /// position. The sort is stable, so duplicate or unscheduled races keep
    /// their encounter order.
    pub fn collect(key: PairKey, records: &[MetricRecord], calendar: &RaceCalendar) -> Self {
        let mut races: Vec<RankedRecord> = records
            .iter()
            .filter(|record| record.belongs_to(&key))
            .map(|record| RankedRecord {
                position: calendar.resolve(&record.race),
                record: record.clone(),
            })
            .collect();
        races.sort_by_key(|ranked| ranked.position);
        Self { key, races }
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    pub fn unscheduled_races(&self) -> impl Iterator<Item = &str> {
        self.races
            .iter()
            .filter(|ranked| ranked.position == SeasonPosition::Unscheduled)
            .map(|ranked| ranked.record.race.as_str())
    }
}
