// Interactive date selection for the booking form
//
// This layer only keeps obviously invalid picks out of the form and feeds the
// live price preview. BookingValidator::validate stays the authority at
// submission time.

use chrono::NaiveDate;
use thiserror::Error;

use crate::booking::{stay_length, stay_price, BookingForm, DATE_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    NoDatesChosen,
    StartChosen,
    BothChosen,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickError {
    #[error("Please select start date first")]
    StartNotChosen,

    #[error("End date must be after start date")]
    EndBeforeStart,
}

// What happened to the end date when a new start date was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPick {
    Kept,
    EndCleared,
}

/// Stay length and estimate shown while the customer is still picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalPreview {
    pub duration_days: i64,
    pub estimated_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DatePicker {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DatePicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PickerState {
        match (self.start, self.end) {
            (Some(_), Some(_)) => PickerState::BothChosen,
            (Some(_), None) => PickerState::StartChosen,
            (None, _) => PickerState::NoDatesChosen,
        }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Earliest start date the picker should offer.
    pub fn min_start(&self, today: NaiveDate) -> NaiveDate {
        today
    }

    /// Earliest end date the picker should offer, one day after the start.
    /// `None` means the end picker must not open yet.
    pub fn min_end(&self) -> Option<NaiveDate> {
        self.start.and_then(|start| start.succ_opt())
    }

    /// Date the end picker opens on.
    pub fn initial_end_suggestion(&self, today: NaiveDate) -> NaiveDate {
        self.start.unwrap_or(today)
    }

    pub fn is_selectable_start(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= self.min_start(today)
    }

    pub fn is_selectable_end(&self, date: NaiveDate) -> bool {
        self.min_end().map_or(false, |min| date >= min)
    }

    pub fn choose_start(&mut self, date: NaiveDate) -> StartPick {
        self.start = Some(date);
        match self.end {
            Some(end) if end < date => {
                self.end = None;
                StartPick::EndCleared
            }
            _ => StartPick::Kept,
        }
    }

    /// Accepts an end date unless no start exists or it falls before the
    /// start. The current selection is left unchanged on rejection.
    pub fn choose_end(&mut self, date: NaiveDate) -> Result<(), PickError> {
        let start = self.start.ok_or(PickError::StartNotChosen)?;
        if date < start {
            return Err(PickError::EndBeforeStart);
        }
        self.end = Some(date);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.start = None;
        self.end = None;
    }

    /// Live duration and estimate once both dates are chosen. No maximum
    /// stay is enforced here.
    pub fn preview(&self, daily_price: f64) -> Option<RentalPreview> {
        let (start, end) = (self.start?, self.end?);
        let duration_days = stay_length(start, end);
        Some(RentalPreview {
            duration_days,
            estimated_price: stay_price(duration_days, daily_price),
        })
    }

    /// Form text for the current selection, dates as `YYYY-MM-DD`.
    pub fn form(&self, customer_name: &str) -> BookingForm {
        let text = |date: Option<NaiveDate>| date.map(|d| d.format(DATE_FORMAT).to_string());
        BookingForm {
            customer_name: customer_name.to_string(),
            start_date: text(self.start),
            end_date: text(self.end),
        }
    }
}
