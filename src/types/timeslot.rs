use serde::{Deserialize, Serialize};
use std::fmt;

/// Teaching weekdays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "MON")]
    Mon,
    #[serde(rename = "TUE")]
    Tue,
    #[serde(rename = "WED")]
    Wed,
    #[serde(rename = "THU")]
    Thu,
    #[serde(rename = "FRI")]
    Fri,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ];

    pub fn index(&self) -> usize {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Weekday::Mon => "MON",
            Weekday::Tue => "TUE",
            Weekday::Wed => "WED",
            Weekday::Thu => "THU",
            Weekday::Fri => "FRI",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Weekday::Mon => "Monday",
            Weekday::Tue => "Tuesday",
            Weekday::Wed => "Wednesday",
            Weekday::Thu => "Thursday",
            Weekday::Fri => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// One teaching block within a day, e.g. SLOT_1 09:00-11:00
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodDef {
    pub id: String,
    /// Start time as "HH:MM"
    pub start: String,
    /// End time as "HH:MM"
    pub end: String,
    #[serde(default)]
    pub afternoon: bool,
}

impl PeriodDef {
    /// Label used in lecturer availability maps, e.g. "09:00-11:00"
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    pub fn start_minutes(&self) -> Option<u32> {
        parse_hhmm(&self.start)
    }

    pub fn end_minutes(&self) -> Option<u32> {
        parse_hhmm(&self.end)
    }
}

/// Parse "HH:MM" into minutes since midnight
pub fn parse_hhmm(value: &str) -> Option<u32> {
    let (h, m) = value.split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// A specific (weekday, period) cell of the weekly grid.
///
/// Only the period index is carried; times and labels live in the catalogue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TimeSlot {
    pub day: Weekday,
    pub period: u8,
}

impl TimeSlot {
    pub fn new(day: Weekday, period: u8) -> Self {
        Self { day, period }
    }

    /// Convert to a linear index across the week
    pub fn to_linear(&self, periods_per_day: usize) -> usize {
        self.day.index() * periods_per_day + self.period as usize
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} P{}", self.day, self.period + 1)
    }
}

/// The configured grid of teaching blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotCatalogue {
    pub periods: Vec<PeriodDef>,
    #[serde(default = "default_days")]
    pub days: Vec<Weekday>,
}

fn default_days() -> Vec<Weekday> {
    Weekday::ALL.to_vec()
}

impl Default for SlotCatalogue {
    fn default() -> Self {
        Self {
            periods: vec![
                PeriodDef {
                    id: "SLOT_1".to_string(),
                    start: "09:00".to_string(),
                    end: "11:00".to_string(),
                    afternoon: false,
                },
                PeriodDef {
                    id: "SLOT_2".to_string(),
                    start: "11:00".to_string(),
                    end: "13:00".to_string(),
                    afternoon: false,
                },
                PeriodDef {
                    id: "SLOT_3".to_string(),
                    start: "14:00".to_string(),
                    end: "16:00".to_string(),
                    afternoon: true,
                },
                PeriodDef {
                    id: "SLOT_4".to_string(),
                    start: "16:00".to_string(),
                    end: "18:00".to_string(),
                    afternoon: true,
                },
            ],
            days: default_days(),
        }
    }
}

impl SlotCatalogue {
    pub fn periods_per_day(&self) -> usize {
        self.periods.len()
    }

    pub fn slot_count(&self) -> usize {
        self.periods.len() * self.days.len()
    }

    /// All (day, period) cells in catalogue order
    pub fn slots(&self) -> Vec<TimeSlot> {
        let mut out = Vec::with_capacity(self.slot_count());
        for &day in &self.days {
            for period in 0..self.periods.len() as u8 {
                out.push(TimeSlot::new(day, period));
            }
        }
        out
    }

    pub fn contains(&self, slot: TimeSlot) -> bool {
        self.days.contains(&slot.day) && (slot.period as usize) < self.periods.len()
    }

    pub fn period(&self, slot: TimeSlot) -> Option<&PeriodDef> {
        self.periods.get(slot.period as usize)
    }

    pub fn is_afternoon(&self, slot: TimeSlot) -> bool {
        self.period(slot).map(|p| p.afternoon).unwrap_or(false)
    }

    /// Whether the slot is the final teaching block of the day
    pub fn is_last_period(&self, slot: TimeSlot) -> bool {
        slot.period as usize + 1 == self.periods.len()
    }

    /// Availability label for the slot, e.g. "09:00-11:00"
    pub fn label(&self, slot: TimeSlot) -> String {
        self.period(slot).map(|p| p.label()).unwrap_or_default()
    }

    /// Display string like "MON 09:00-11:00"
    pub fn describe(&self, slot: TimeSlot) -> String {
        format!("{} {}", slot.day, self.label(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalogue_has_twenty_slots() {
        let catalogue = SlotCatalogue::default();
        assert_eq!(catalogue.slot_count(), 20);
        assert_eq!(catalogue.slots().len(), 20);
    }

    #[test]
    fn test_afternoon_flags() {
        let catalogue = SlotCatalogue::default();
        assert!(!catalogue.is_afternoon(TimeSlot::new(Weekday::Mon, 0)));
        assert!(catalogue.is_afternoon(TimeSlot::new(Weekday::Mon, 2)));
        assert!(catalogue.is_last_period(TimeSlot::new(Weekday::Fri, 3)));
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("09:00"), Some(540));
        assert_eq!(parse_hhmm("16:30"), Some(990));
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("oops"), None);
    }

    #[test]
    fn test_linear_index_round_trip() {
        let slot = TimeSlot::new(Weekday::Wed, 3);
        assert_eq!(slot.to_linear(4), 11);
    }
}
