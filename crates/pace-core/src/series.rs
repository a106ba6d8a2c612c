use crate::axis::AxisBounds;
use crate::calendar::SeasonPosition;
use crate::pair::{ComparisonPair, PairKey};

/// One race of a pair's season series, ready to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct RacePoint {
    pub race: String,
    pub position: SeasonPosition,
    pub a_value: f64,
    pub b_value: f64,
    /// `b_value - a_value`; positive when competitor A was more consistent.
    pub differential: f64,
    pub more_consistent: String,
    pub annotation: String,
}

/// Name of the competitor with the lower dispersion. Equal values favour `b`.
pub fn more_consistent<'a>(
    a_name: &'a str,
    a_value: f64,
    b_name: &'a str,
    b_value: f64,
) -> &'a str {
    if a_value < b_value { a_name } else { b_name }
}

pub fn annotation_text(differential: f64, more_consistent: &str) -> String {
    format!("{:.3}\n{}", differential.abs(), more_consistent)
}

/// Everything the chart assembler needs for one eligible pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSeries {
    pub key: PairKey,
    pub points: Vec<RacePoint>,
    pub bounds: AxisBounds,
}

impl PairSeries {
    /// Derive per-race differentials and annotations in season order.
    /// Returns `None` when the pair has no finite values to frame.
    pub fn build(pair: &ComparisonPair) -> Option<Self> {
        let key = &pair.key;
        let points: Vec<RacePoint> = pair
            .races
            .iter()
            .map(|ranked| {
                let record = &ranked.record;
                let differential = record.b_value - record.a_value;
                let winner = more_consistent(
                    &key.competitor_a,
                    record.a_value,
                    &key.competitor_b,
                    record.b_value,
                );
                RacePoint {
                    race: record.race.clone(),
                    position: ranked.position,
                    a_value: record.a_value,
                    b_value: record.b_value,
                    differential,
                    more_consistent: winner.to_string(),
                    annotation: annotation_text(differential, winner),
                }
            })
            .collect();

        let bounds =
            AxisBounds::from_values(points.iter().flat_map(|p| [p.a_value, p.b_value]))?;

        Some(Self {
            key: key.clone(),
            points,
            bounds,
        })
    }

    pub fn a_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.a_value)
    }

    pub fn b_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.b_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::RaceCalendar;
    use crate::pair::EligibilityPolicy;
    use crate::record::MetricRecord;

    #[test]
    fn two_race_scenario_produces_expected_annotations() {
        let calendar = RaceCalendar::from_races(["R1", "R2"]).expect("calendar");
        let records = vec![
            MetricRecord::new("R2", "Alpha", "Beta", 0.12, 0.09),
            MetricRecord::new("R1", "Alpha", "Beta", 0.10, 0.15),
        ];
        let pair = ComparisonPair::collect(PairKey::new("Alpha", "Beta"), &records, &calendar);
        assert!(EligibilityPolicy::new(2).is_eligible(&pair.races));

        let series = PairSeries::build(&pair).expect("series");
        let diffs: Vec<f64> = series.points.iter().map(|p| p.differential).collect();
        assert!((diffs[0] - 0.05).abs() < 1e-9);
        assert!((diffs[1] + 0.03).abs() < 1e-9);
        assert_eq!(series.points[0].annotation, "0.050\nAlpha");
        assert_eq!(series.points[1].annotation, "0.030\nBeta");
        assert_eq!(series.points[0].position, SeasonPosition::Scheduled(1));
    }

    #[test]
    fn tie_favours_second_competitor() {
        assert_eq!(more_consistent("A", 0.05, "B", 0.05), "B");
        assert_eq!(more_consistent("A", 0.04, "B", 0.05), "A");
        assert_eq!(more_consistent("A", 0.06, "B", 0.05), "B");
        assert_eq!(annotation_text(0.0, "B"), "0.000\nB");
    }

    #[test]
    fn annotation_contains_rounded_absolute_differential() {
        assert_eq!(annotation_text(-0.01234, "HAM"), "0.012\nHAM");
        assert_eq!(annotation_text(0.2, "VER"), "0.200\nVER");
    }

    #[test]
    fn bounds_cover_both_series() {
        let calendar = RaceCalendar::from_races(["R1", "R2", "R3"]).expect("calendar");
        let records = vec![
            MetricRecord::new("R1", "A", "B", 0.02, 0.03),
            MetricRecord::new("R2", "A", "B", 0.05, 0.01),
            MetricRecord::new("R3", "A", "B", 0.04, 0.04),
        ];
        let pair = ComparisonPair::collect(PairKey::new("A", "B"), &records, &calendar);
        let series = PairSeries::build(&pair).expect("series");
        assert_eq!(series.bounds.observed_min, 0.01);
        assert_eq!(series.bounds.observed_max, 0.05);
        assert!(
            series
                .a_values()
                .chain(series.b_values())
                .all(|v| v <= series.bounds.upper)
        );
        assert_eq!(series.points[2].more_consistent, "B");
    }
}
