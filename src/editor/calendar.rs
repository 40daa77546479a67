use std::collections::BTreeSet;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Resolved status of a single date. Reserved wins over blocked, blocked
/// over available; the persisted sets stay disjoint so the priority only
/// matters on the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Available,
    Blocked,
    Reserved,
}

/// Editing mode: decides what tapping a day does and what commit means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarMode {
    Available,
    Blocked,
    Reserved,
}

/// Derived cell of the rendered month grid; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_viewed_month: bool,
    pub is_past: bool,
}

/// Result of the commit action for the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAction {
    /// Selection applied to the blocked set; `changed` dates moved.
    Applied { changed: usize },
    /// Reserved mode: navigate to the external reservations view instead.
    OpenReservations,
}

/// Tri-state availability model with a selection buffer and batch commit.
///
/// `reserved` is sourced externally and never mutated here; any date in
/// neither set is implicitly available.
#[derive(Debug, Clone)]
pub struct AvailabilityCalendar {
    today: NaiveDate,
    month_offset: u32,
    mode: CalendarMode,
    blocked: BTreeSet<NaiveDate>,
    reserved: BTreeSet<NaiveDate>,
    selection: BTreeSet<NaiveDate>,
}

impl AvailabilityCalendar {
    pub fn new(
        today: NaiveDate,
        blocked: BTreeSet<NaiveDate>,
        reserved: BTreeSet<NaiveDate>,
    ) -> Self {
        // Reserved dates take priority; keep the persisted sets disjoint.
        let blocked = blocked.difference(&reserved).copied().collect();
        Self {
            today,
            month_offset: 0,
            mode: CalendarMode::Blocked,
            blocked,
            reserved,
            selection: BTreeSet::new(),
        }
    }

    pub fn mode(&self) -> CalendarMode {
        self.mode
    }

    pub fn month_offset(&self) -> u32 {
        self.month_offset
    }

    pub fn blocked(&self) -> &BTreeSet<NaiveDate> {
        &self.blocked
    }

    pub fn reserved(&self) -> &BTreeSet<NaiveDate> {
        &self.reserved
    }

    pub fn selection(&self) -> &BTreeSet<NaiveDate> {
        &self.selection
    }

    pub fn status(&self, date: NaiveDate) -> DayStatus {
        if self.reserved.contains(&date) {
            DayStatus::Reserved
        } else if self.blocked.contains(&date) {
            DayStatus::Blocked
        } else {
            DayStatus::Available
        }
    }

    /// Switching mode clears the selection buffer: its meaning (dates to
    /// block vs dates to free) is mode-relative.
    pub fn set_mode(&mut self, mode: CalendarMode) {
        if self.mode != mode {
            self.mode = mode;
            self.selection.clear();
        }
    }

    /// Toggle a day in the selection buffer. Past and reserved dates are
    /// never selectable; only days whose current status matches the mode's
    /// source state respond. Returns whether the date is now selected.
    pub fn toggle(&mut self, date: NaiveDate) -> bool {
        if date < self.today || self.status(date) == DayStatus::Reserved {
            return false;
        }

        let selectable = match self.mode {
            CalendarMode::Blocked => self.status(date) == DayStatus::Available,
            CalendarMode::Available => self.status(date) == DayStatus::Blocked,
            CalendarMode::Reserved => false,
        };
        if !selectable {
            return false;
        }

        if self.selection.contains(&date) {
            self.selection.remove(&date);
            false
        } else {
            self.selection.insert(date);
            true
        }
    }

    /// Apply the buffered selection as one batch transition and clear it.
    pub fn commit(&mut self) -> CommitAction {
        match self.mode {
            CalendarMode::Blocked => {
                let changed = self.selection.len();
                self.blocked.extend(self.selection.iter().copied());
                self.selection.clear();
                CommitAction::Applied { changed }
            }
            CalendarMode::Available => {
                let changed = self.selection.len();
                for date in &self.selection {
                    self.blocked.remove(date);
                }
                self.selection.clear();
                CommitAction::Applied { changed }
            }
            CalendarMode::Reserved => CommitAction::OpenReservations,
        }
    }

    pub fn next_month(&mut self) {
        self.month_offset += 1;
    }

    /// Clamped at zero: the calendar never shows months before the current one.
    pub fn previous_month(&mut self) {
        self.month_offset = self.month_offset.saturating_sub(1);
    }

    fn viewed_month_start(&self) -> NaiveDate {
        let current_start = self
            .today
            .with_day(1)
            .expect("first of month is always valid");
        current_start + Months::new(self.month_offset)
    }

    /// Monday-first grid covering the viewed month, padded with the
    /// surrounding days so every week row is complete.
    pub fn month_days(&self) -> Vec<CalendarDay> {
        let month_start = self.viewed_month_start();
        let next_month_start = month_start + Months::new(1);

        let leading = month_start.weekday().num_days_from_monday() as u64;
        let mut cursor = month_start - Days::new(leading);

        let mut days = Vec::new();
        while cursor < next_month_start || cursor.weekday() != Weekday::Mon {
            days.push(CalendarDay {
                date: cursor,
                in_viewed_month: cursor >= month_start && cursor < next_month_start,
                is_past: cursor < self.today,
            });
            cursor = cursor + Days::new(1);
        }
        days
    }
}
