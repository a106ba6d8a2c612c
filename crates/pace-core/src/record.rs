use serde::{Deserialize, Serialize};

use crate::pair::PairKey;

/// One (competitor pair, race) observation of the consistency measure.
///
/// `competitor_a` and `competitor_b` are order-significant: a row for
/// `(A, B)` is never merged with a row for `(B, A)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub race: String,
    pub competitor_a: String,
    pub competitor_b: String,
    pub a_value: f64,
    pub b_value: f64,
}

impl MetricRecord {
    pub fn new(
        race: impl Into<String>,
        competitor_a: impl Into<String>,
        competitor_b: impl Into<String>,
        a_value: f64,
        b_value: f64,
    ) -> Self {
        Self {
            race: race.into(),
            competitor_a: competitor_a.into(),
            competitor_b: competitor_b.into(),
            a_value,
            b_value,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.competitor_a, &self.competitor_b)
    }

    pub fn belongs_to(&self, key: &PairKey) -> bool {
        self.competitor_a == key.competitor_a && self.competitor_b == key.competitor_b
    }
}

#[cfg(test)]
mod tests {
    use super::MetricRecord;
    use crate::pair::PairKey;

    #[test]
    fn pair_membership_is_order_sensitive() {
        let record = MetricRecord::new("Monaco Grand Prix", "HAM", "BOT", 0.01, 0.02);
        assert!(record.belongs_to(&PairKey::new("HAM", "BOT")));
        assert!(!record.belongs_to(&PairKey::new("BOT", "HAM")));
        assert_eq!(record.pair_key(), PairKey::new("HAM", "BOT"));
    }
}
