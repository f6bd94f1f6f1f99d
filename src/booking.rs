// Rental booking validation and pricing
//
// Turns a customer name, two picked calendar dates and a per-day price into a
// priced booking, or the first rule the input breaks.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::catalog::parse_price;

/// Wire and display format of every calendar date the client handles.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// Which of the two date fields an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateField::Start => write!(f, "start"),
            DateField::End => write!(f, "end"),
        }
    }
}

// Form field a hosting screen should highlight for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    CustomerName,
    StartDate,
    EndDate,
}

// Booking rejections, in the order the checks run. The display text is the
// message shown to the customer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Please enter customer name")]
    NameRequired,

    #[error("Name must be at least {min} characters")]
    NameTooShort { min: usize },

    #[error("Please select a start date")]
    StartDateRequired,

    #[error("Please select an end date")]
    EndDateRequired,

    #[error("Invalid {0} date format, expected YYYY-MM-DD")]
    DateFormatInvalid(DateField),

    #[error("Invalid {0} date. Please select dates using the date picker.")]
    DateUnparseable(DateField),

    #[error("Start date cannot be in the past")]
    StartDateInPast,

    #[error("End date must be after start date")]
    EndBeforeStart,

    #[error("Rental must be at least 1 day. Please select different dates.")]
    ZeroLengthStay,

    #[error("Maximum rental period is {max} days")]
    DurationTooLong { max: i64 },
}

impl BookingError {
    pub fn field(&self) -> FormField {
        match self {
            BookingError::NameRequired | BookingError::NameTooShort { .. } => {
                FormField::CustomerName
            }
            BookingError::StartDateRequired
            | BookingError::DateFormatInvalid(DateField::Start)
            | BookingError::DateUnparseable(DateField::Start)
            | BookingError::StartDateInPast => FormField::StartDate,
            BookingError::EndDateRequired
            | BookingError::DateFormatInvalid(DateField::End)
            | BookingError::DateUnparseable(DateField::End)
            | BookingError::EndBeforeStart
            | BookingError::ZeroLengthStay
            | BookingError::DurationTooLong { .. } => FormField::EndDate,
        }
    }
}

// Limits applied by the validator
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub min_name_chars: usize,
    pub max_duration_days: i64,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            min_name_chars: 3,
            max_duration_days: 30,
        }
    }
}

/// Start and end calendar dates, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whole days between the two dates.
    pub fn days(&self) -> i64 {
        stay_length(self.start, self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Raw form input as typed or picked by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub customer_name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl BookingForm {
    /// Builds a form from text fields, where an empty field means "not chosen".
    pub fn new(customer_name: &str, start_date: &str, end_date: &str) -> Self {
        let field = |text: &str| (!text.trim().is_empty()).then(|| text.to_string());
        Self {
            customer_name: customer_name.to_string(),
            start_date: field(start_date),
            end_date: field(end_date),
        }
    }
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedBooking {
    pub customer_name: String,
    pub duration_days: i64,
    pub total_price: f64,
    pub range: DateRange,
}

impl PricedBooking {
    pub fn into_draft(self, item_id: i64) -> RentalRequestDraft {
        RentalRequestDraft {
            customer_name: self.customer_name,
            item_id,
            range: self.range,
        }
    }
}

/// A validated request that has not been submitted yet. Build a fresh one
/// for every submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalRequestDraft {
    customer_name: String,
    item_id: i64,
    range: DateRange,
}

impl RentalRequestDraft {
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn item_id(&self) -> i64 {
        self.item_id
    }

    pub fn range(&self) -> DateRange {
        self.range
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingValidator {
    policy: BookingPolicy,
}

impl BookingValidator {
    pub fn new(policy: BookingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Runs every booking rule in order and prices the stay.
    ///
    /// `today` is supplied by the caller, never read from the clock, so the
    /// same inputs always give the same result. `daily_price` is the already
    /// parsed unit price; an unparseable price should be passed as `0.0`.
    pub fn validate(
        &self,
        form: &BookingForm,
        today: NaiveDate,
        daily_price: f64,
    ) -> Result<PricedBooking, BookingError> {
        let customer_name = form.customer_name.trim();
        if customer_name.is_empty() {
            return Err(BookingError::NameRequired);
        }
        if customer_name.chars().count() < self.policy.min_name_chars {
            return Err(BookingError::NameTooShort {
                min: self.policy.min_name_chars,
            });
        }

        let start_text = present(form.start_date.as_deref()).ok_or(BookingError::StartDateRequired)?;
        let end_text = present(form.end_date.as_deref()).ok_or(BookingError::EndDateRequired)?;

        if !is_iso_date_shape(start_text) {
            return Err(BookingError::DateFormatInvalid(DateField::Start));
        }
        if !is_iso_date_shape(end_text) {
            return Err(BookingError::DateFormatInvalid(DateField::End));
        }

        let start = parse_iso_date(start_text)
            .map_err(|_| BookingError::DateUnparseable(DateField::Start))?;
        let end =
            parse_iso_date(end_text).map_err(|_| BookingError::DateUnparseable(DateField::End))?;

        if start < today {
            return Err(BookingError::StartDateInPast);
        }
        if end < start {
            return Err(BookingError::EndBeforeStart);
        }
        if end == start {
            return Err(BookingError::ZeroLengthStay);
        }

        let duration_days = stay_length(start, end);
        if duration_days > self.policy.max_duration_days {
            return Err(BookingError::DurationTooLong {
                max: self.policy.max_duration_days,
            });
        }

        Ok(PricedBooking {
            customer_name: customer_name.to_string(),
            duration_days,
            total_price: stay_price(duration_days, daily_price),
            range: DateRange { start, end },
        })
    }
}

fn present(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|text| !text.is_empty())
}

/// True when `text` is literally `DDDD-DD-DD` with ASCII digits.
pub fn is_iso_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parses a strict `YYYY-MM-DD` calendar date. Month 13 or day 32 fail.
pub fn parse_iso_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
}

/// Date part of an extended timestamp such as `2025-12-23T00:00:00.000000Z`.
pub fn date_portion(text: &str) -> &str {
    match text.char_indices().nth(10) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Today's calendar date from a wall-clock reading; the time of day is dropped.
pub fn today_from(now: NaiveDateTime) -> NaiveDate {
    now.date()
}

// Whole days from start to end; not month-aware
pub fn stay_length(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

pub fn stay_price(duration_days: i64, daily_price: f64) -> f64 {
    duration_days as f64 * daily_price
}

/// Daily price for booking purposes: missing or malformed price text counts as zero.
pub fn parse_daily_price(text: Option<&str>) -> f64 {
    text.and_then(parse_price).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(text: &str) -> NaiveDate {
        parse_iso_date(text).unwrap()
    }

    fn validate(name: &str, start: &str, end: &str, today: &str) -> Result<PricedBooking, BookingError> {
        BookingValidator::default().validate(&BookingForm::new(name, start, end), date(today), 150.0)
    }

    #[test]
    fn test_valid_booking_is_priced() {
        let booking = validate("  Amina  ", "2025-06-01", "2025-06-04", "2025-06-01").unwrap();

        assert_eq!(booking.customer_name, "Amina");
        assert_eq!(booking.duration_days, 3);
        assert_eq!(booking.total_price, 450.0);
        assert_eq!(booking.range.start(), date("2025-06-01"));
        assert_eq!(booking.range.end(), date("2025-06-04"));
    }

    #[test_case("", "2025-06-01", "2025-06-02", BookingError::NameRequired; "#1 empty name")]
    #[test_case("   ", "2025-06-01", "2025-06-02", BookingError::NameRequired; "#2 blank name")]
    #[test_case(" Al ", "2025-06-01", "2025-06-02", BookingError::NameTooShort { min: 3 }; "#3 short name after trim")]
    #[test_case("Amina", "", "2025-06-02", BookingError::StartDateRequired; "#4 missing start")]
    #[test_case("Amina", "2025-06-01", "", BookingError::EndDateRequired; "#5 missing end")]
    #[test_case("Amina", "2025-6-01", "2025-06-02", BookingError::DateFormatInvalid(DateField::Start); "#6 unpadded start")]
    #[test_case("Amina", "2025-06-01", "02/06/2025", BookingError::DateFormatInvalid(DateField::End); "#7 foreign end format")]
    #[test_case("Amina", "2025-13-01", "2025-06-02", BookingError::DateUnparseable(DateField::Start); "#8 month 13")]
    #[test_case("Amina", "2025-06-01", "2025-06-32", BookingError::DateUnparseable(DateField::End); "#9 day 32")]
    #[test_case("Amina", "2025-02-30", "2025-03-02", BookingError::DateUnparseable(DateField::Start); "#10 february 30")]
    #[test_case("Amina", "2025-06-01", "2025-06-01", BookingError::ZeroLengthStay; "#11 same day")]
    #[test_case("Amina", "2025-06-05", "2025-06-03", BookingError::EndBeforeStart; "#12 end before start")]
    #[test_case("Amina", "2025-06-01", "2025-07-05", BookingError::DurationTooLong { max: 30 }; "#13 more than thirty days")]
    fn test_rejections(name: &str, start: &str, end: &str, expected: BookingError) {
        assert_eq!(validate(name, start, end, "2025-06-01"), Err(expected));
    }

    #[test]
    fn test_start_in_the_past() {
        assert_eq!(
            validate("Amina", "2025-06-01", "2025-06-05", "2025-06-10"),
            Err(BookingError::StartDateInPast)
        );
    }

    #[test]
    fn test_first_failing_check_wins() {
        // Short name and broken dates: only the name is reported
        assert_eq!(
            validate("Al", "garbage", "", "2025-06-01"),
            Err(BookingError::NameTooShort { min: 3 })
        );
        // Past start that also ends before it: the past start is reported
        assert_eq!(
            validate("Amina", "2025-05-20", "2025-05-10", "2025-06-01"),
            Err(BookingError::StartDateInPast)
        );
    }

    #[test]
    fn test_starting_today_is_allowed() {
        assert!(validate("Amina", "2025-06-10", "2025-06-11", "2025-06-10").is_ok());
    }

    #[test]
    fn test_thirty_days_is_the_longest_stay() {
        let booking = validate("Amina", "2025-06-01", "2025-07-01", "2025-06-01").unwrap();
        assert_eq!(booking.duration_days, 30);
        assert_eq!(
            validate("Amina", "2025-06-01", "2025-07-02", "2025-06-01"),
            Err(BookingError::DurationTooLong { max: 30 })
        );
    }

    #[test]
    fn test_duration_counts_midnight_boundaries() {
        // Across a month end and a leap day
        let booking = validate("Amina", "2028-02-27", "2028-03-02", "2028-02-01").unwrap();
        assert_eq!(booking.duration_days, 4);
        assert_eq!(booking.total_price, 600.0);
    }

    #[test]
    fn test_duration_and_total_over_many_ranges() {
        let validator = BookingValidator::default();
        let daily_price = 37.25;
        let starts = [
            "2023-12-20", "2024-02-20", "2024-12-31", "2025-02-27", "2025-06-15",
            "2027-12-25", "2028-02-15", "2028-02-29", "2099-12-10",
        ];

        for start_text in starts {
            let start = date(start_text);
            let mut end = start;
            for _ in 1..=30 {
                end = end.succ_opt().unwrap();
                let mut boundaries = 0;
                let mut day = start;
                while day < end {
                    day = day.succ_opt().unwrap();
                    boundaries += 1;
                }

                let form = BookingForm::new("Amina", start_text, &end.format(DATE_FORMAT).to_string());
                let booking = validator.validate(&form, start, daily_price).unwrap();

                assert_eq!(booking.duration_days, boundaries, "{} to {}", start, end);
                assert_eq!(booking.duration_days, (end - start).num_days());
                assert_eq!(booking.total_price, booking.duration_days as f64 * daily_price);
            }
        }
    }

    #[test]
    fn test_unparseable_price_still_books_at_zero() {
        let price = parse_daily_price(Some("n/a"));
        let booking = BookingValidator::default()
            .validate(
                &BookingForm::new("Amina", "2025-06-01", "2025-06-03"),
                date("2025-06-01"),
                price,
            )
            .unwrap();

        assert_eq!(price, 0.0);
        assert_eq!(booking.total_price, 0.0);
        assert_eq!(parse_daily_price(None), 0.0);
        assert_eq!(parse_daily_price(Some("249.99")), 249.99);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let first = validate("Amina", "2025-06-01", "2025-06-09", "2025-05-30");
        let second = validate("Amina", "2025-06-01", "2025-06-09", "2025-05-30");
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_policy_limits() {
        let validator = BookingValidator::new(BookingPolicy {
            min_name_chars: 5,
            max_duration_days: 7,
        });
        let form = BookingForm::new("Sara", "2025-06-01", "2025-06-03");
        assert_eq!(
            validator.validate(&form, date("2025-06-01"), 10.0),
            Err(BookingError::NameTooShort { min: 5 })
        );

        let form = BookingForm::new("Salma", "2025-06-01", "2025-06-09");
        assert_eq!(
            validator.validate(&form, date("2025-06-01"), 10.0),
            Err(BookingError::DurationTooLong { max: 7 })
        );
    }

    #[test]
    fn test_draft_carries_trimmed_name_and_range() {
        let draft = validate(" Amina ", "2025-06-01", "2025-06-04", "2025-06-01")
            .unwrap()
            .into_draft(42);

        assert_eq!(draft.customer_name(), "Amina");
        assert_eq!(draft.item_id(), 42);
        assert_eq!(draft.range().to_string(), "2025-06-01 to 2025-06-04");
    }

    #[test]
    fn test_error_fields_and_messages() {
        assert_eq!(BookingError::NameRequired.field(), FormField::CustomerName);
        assert_eq!(BookingError::StartDateInPast.field(), FormField::StartDate);
        assert_eq!(BookingError::ZeroLengthStay.field(), FormField::EndDate);
        assert_eq!(
            BookingError::DateFormatInvalid(DateField::End).to_string(),
            "Invalid end date format, expected YYYY-MM-DD"
        );
        assert_eq!(
            BookingError::DurationTooLong { max: 30 }.to_string(),
            "Maximum rental period is 30 days"
        );
    }

    #[test]
    fn test_date_helpers() {
        assert_eq!(date_portion("2025-12-23T00:00:00.000000Z"), "2025-12-23");
        assert_eq!(date_portion("2025-12"), "2025-12");
        assert!(is_iso_date_shape("2025-12-23"));
        assert!(!is_iso_date_shape("2025-12-23 "));
        assert!(!is_iso_date_shape("２０２５-12-23"));

        let now = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(today_from(now), date("2025-06-10"));

        assert!(DateRange::new(date("2025-06-02"), date("2025-06-01")).is_none());
        assert_eq!(
            DateRange::new(date("2025-06-01"), date("2025-06-01")).map(|r| r.days()),
            Some(0)
        );
    }
}
