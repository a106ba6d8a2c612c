use std::cmp::Ordering;
use std::collections::HashMap;

use thiserror::Error;

const SEASON_2021: [&str; 22] = [
    "Bahrain Grand Prix",
    "Emilia Romagna Grand Prix",
    "Portuguese Grand Prix",
    "Spanish Grand Prix",
    "Monaco Grand Prix",
    "Azerbaijan Grand Prix",
    "French Grand Prix",
    "Styrian Grand Prix",
    "Austrian Grand Prix",
    "British Grand Prix",
    "Hungarian Grand Prix",
    "Belgian Grand Prix",
    "Dutch Grand Prix",
    "Italian Grand Prix",
    "Russian Grand Prix",
    "Turkish Grand Prix",
    "United States Grand Prix",
    "Mexico City Grand Prix",
    "São Paulo Grand Prix",
    "Qatar Grand Prix",
    "Saudi Arabian Grand Prix",
    "Abu Dhabi Grand Prix",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("calendar must list at least one race")]
    Empty,
    #[error("calendar entry {index} has an empty race name")]
    BlankRace { index: usize },
    #[error("race '{0}' appears more than once in the calendar")]
    DuplicateRace(String),
}

/// Static race name -> season position lookup (positions start at 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceCalendar {
    races: Vec<String>,
    positions: HashMap<String, u32>,
}

impl RaceCalendar {
    /// Build a calendar from races listed in season order.
    pub fn from_races<I, S>(races: I) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        for (index, race) in races.into_iter().enumerate() {
            let race: String = race.into();
            if race.trim().is_empty() {
                return Err(CalendarError::BlankRace { index });
            }
            let position = ordered.len() as u32 + 1;
            if positions.insert(race.clone(), position).is_some() {
                return Err(CalendarError::DuplicateRace(race));
            }
            ordered.push(race);
        }

        if ordered.is_empty() {
            return Err(CalendarError::Empty);
        }

        Ok(Self {
            races: ordered,
            positions,
        })
    }

    /// The bundled 2021 Formula 1 calendar.
    pub fn season_2021() -> Self {
        let races: Vec<String> = SEASON_2021.iter().map(|race| race.to_string()).collect();
        let positions = races
            .iter()
            .enumerate()
            .map(|(idx, race)| (race.clone(), idx as u32 + 1))
            .collect();
        Self { races, positions }
    }

    pub fn position(&self, race: &str) -> Option<u32> {
        self.positions.get(race).copied()
    }

    pub fn resolve(&self, race: &str) -> SeasonPosition {
        match self.position(race) {
            Some(position) => SeasonPosition::Scheduled(position),
            None => SeasonPosition::Unscheduled,
        }
    }

    pub fn races(&self) -> &[String] {
        &self.races
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }
}

impl Default for RaceCalendar {
    fn default() -> Self {
        Self::season_2021()
    }
}

/// Resolved sort key for a race.
///
/// Races missing from the calendar sort after every scheduled race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonPosition {
    Scheduled(u32),
    Unscheduled,
}

impl Ord for SeasonPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SeasonPosition::Scheduled(a), SeasonPosition::Scheduled(b)) => a.cmp(b),
            (SeasonPosition::Scheduled(_), SeasonPosition::Unscheduled) => Ordering::Less,
            (SeasonPosition::Unscheduled, SeasonPosition::Scheduled(_)) => Ordering::Greater,
            (SeasonPosition::Unscheduled, SeasonPosition::Unscheduled) => Ordering::Equal,
        }
    }
}

impl PartialOrd for SeasonPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_season_maps_first_and_last_rounds() {
        let calendar = RaceCalendar::season_2021();
        assert_eq!(calendar.len(), 22);
        assert_eq!(calendar.position("Bahrain Grand Prix"), Some(1));
        assert_eq!(calendar.position("São Paulo Grand Prix"), Some(19));
        assert_eq!(calendar.position("Abu Dhabi Grand Prix"), Some(22));
        assert_eq!(calendar.position("Australian Grand Prix"), None);
    }

    #[test]
    fn custom_calendar_positions_follow_list_order() {
        let calendar = RaceCalendar::from_races(["R1", "R2", "R3"]).expect("calendar");
        assert_eq!(calendar.position("R1"), Some(1));
        assert_eq!(calendar.position("R3"), Some(3));
        assert_eq!(calendar.races(), ["R1", "R2", "R3"]);
        assert_eq!(calendar.resolve("R9"), SeasonPosition::Unscheduled);
    }

    #[test]
    fn rejects_duplicates_and_blanks() {
        assert_eq!(
            RaceCalendar::from_races(["R1", "R1"]),
            Err(CalendarError::DuplicateRace("R1".into()))
        );
        assert_eq!(
            RaceCalendar::from_races(["R1", " "]),
            Err(CalendarError::BlankRace { index: 1 })
        );
        assert_eq!(
            RaceCalendar::from_races(Vec::<String>::new()),
            Err(CalendarError::Empty)
        );
    }

    #[test]
    fn unscheduled_races_sort_last() {
        let mut keys = vec![
            SeasonPosition::Unscheduled,
            SeasonPosition::Scheduled(7),
            SeasonPosition::Scheduled(2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                SeasonPosition::Scheduled(2),
                SeasonPosition::Scheduled(7),
                SeasonPosition::Unscheduled,
            ]
        );
    }
}
