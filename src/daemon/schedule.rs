use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use std::collections::HashMap;

use crate::config::TriggerHours;
use crate::snooze::Tick;

/// Decides which ticks are due. Cleanup is due on every pass; each release
/// tick is due during its configured hour and fires at most once per day.
pub struct Schedule {
    hours: TriggerHours,
}

/// Last local day each release tick completed.
#[derive(Debug, Default)]
pub struct FiredState {
    last: HashMap<Tick, NaiveDate>,
}

impl FiredState {
    pub fn mark(&mut self, tick: Tick, day: NaiveDate) {
        self.last.insert(tick, day);
    }

    fn fired_on(&self, tick: Tick, day: NaiveDate) -> bool {
        self.last.get(&tick) == Some(&day)
    }
}

impl Schedule {
    pub fn new(hours: TriggerHours) -> Self {
        Self { hours }
    }

    pub fn due(&self, now: NaiveDateTime, fired: &FiredState) -> Vec<Tick> {
        Tick::ALL
            .into_iter()
            .filter(|tick| self.is_due(*tick, now, fired))
            .collect()
    }

    fn is_due(&self, tick: Tick, now: NaiveDateTime, fired: &FiredState) -> bool {
        let hour = match tick {
            Tick::Cleanup => return true,
            Tick::Evening => self.hours.evening,
            Tick::Tomorrow => self.hours.tomorrow,
            Tick::Saturday if now.weekday() != Weekday::Sat => return false,
            Tick::Saturday => self.hours.saturday,
        };
        now.hour() == hour && !fired.fired_on(tick, now.date())
    }
}
