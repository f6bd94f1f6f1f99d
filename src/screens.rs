// Screen-level state holders for the catalog, booking and rentals flows.
//
// Each screen owns its list exclusively. Locks are only held for short
// synchronous sections and never across an await.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::NaiveDate;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, RentalApi};
use crate::booking::{parse_daily_price, BookingError, BookingForm, BookingValidator};
use crate::catalog::{parse_price, CatalogView, FilterSortState, SizeFilter, SortMode};
use crate::date_picker::{DatePicker, PickError, PickerState, RentalPreview, StartPick};
use crate::display::{daily_price_label, duration_label, format_money, CatalogCard, RentalCard};
use crate::models::{CatalogItem, Rental, RentalCreated, RentalRequest};

/// Result of a list load. A response is dropped when a load started later
/// has already been applied, or a local change superseded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(usize),
    Stale,
}

struct Snapshot<T> {
    applied: u64,
    items: Vec<T>,
}

// A fetched list plus the ticket of the load that produced it. Tickets are
// handed out when a load starts; only a successful response newer than the
// applied one replaces the list.
struct LoadedList<T> {
    started: AtomicU64,
    current: Mutex<Snapshot<T>>,
}

impl<T> Default for LoadedList<T> {
    fn default() -> Self {
        Self {
            started: AtomicU64::new(0),
            current: Mutex::new(Snapshot {
                applied: 0,
                items: Vec::new(),
            }),
        }
    }
}

impl<T: Clone> LoadedList<T> {
    fn begin(&self) -> u64 {
        self.started.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(&self, ticket: u64, fetched: Vec<T>) -> LoadOutcome {
        let mut current = self.current.lock();
        if ticket <= current.applied {
            debug!(ticket, applied = current.applied, "dropping stale list response");
            return LoadOutcome::Stale;
        }
        current.applied = ticket;
        current.items = fetched;
        LoadOutcome::Applied(current.items.len())
    }

    // Local edit after a confirmed server change; loads already in flight
    // may predate it and are dropped
    fn supersede<F: FnOnce(&mut Vec<T>)>(&self, edit: F) {
        let mut current = self.current.lock();
        current.applied = self.begin();
        edit(&mut current.items);
    }

    fn read<R, F: FnOnce(&[T]) -> R>(&self, f: F) -> R {
        f(self.current.lock().items.as_slice())
    }

    fn snapshot(&self) -> Vec<T> {
        self.read(|items| items.to_vec())
    }
}

pub struct CatalogScreen {
    view: CatalogView,
    items: LoadedList<CatalogItem>,
    state: Mutex<FilterSortState>,
}

impl CatalogScreen {
    pub fn new(view: CatalogView) -> Self {
        Self {
            view,
            items: LoadedList::default(),
            state: Mutex::new(FilterSortState::default()),
        }
    }

    /// Fetches the catalog and replaces the current one wholesale. On error
    /// the previous catalog stays in place, and a failed newer refresh does
    /// not block an older one that succeeds.
    pub async fn refresh<A: RentalApi + ?Sized>(&self, api: &A) -> Result<LoadOutcome, ApiError> {
        let ticket = self.items.begin();
        let fetched = api.list_items().await?;

        let outcome = self.items.apply(ticket, fetched);
        if let LoadOutcome::Applied(count) = outcome {
            info!(count, "catalog refreshed");
        }
        Ok(outcome)
    }

    pub fn state(&self) -> FilterSortState {
        self.state.lock().clone()
    }

    pub fn set_sort(&self, sort_mode: SortMode) -> FilterSortState {
        let mut state = self.state.lock();
        *state = state.with_sort(sort_mode);
        state.clone()
    }

    pub fn set_size_filter(&self, size_filter: SizeFilter) -> FilterSortState {
        let mut state = self.state.lock();
        *state = state.with_size(size_filter);
        state.clone()
    }

    pub fn reset_filters(&self) -> FilterSortState {
        let mut state = self.state.lock();
        *state = FilterSortState::reset();
        state.clone()
    }

    pub fn items(&self) -> Vec<CatalogItem> {
        self.items.snapshot()
    }

    pub fn item(&self, id: i64) -> Option<CatalogItem> {
        self.items.read(|items| self.view.find(items, id).cloned())
    }

    pub fn visible(&self) -> Vec<CatalogItem> {
        let state = self.state();
        self.items.read(|items| self.view.apply(items, &state))
    }

    pub fn cards(&self) -> Vec<CatalogCard> {
        self.visible().iter().map(CatalogCard::from).collect()
    }

    pub fn size_options(&self) -> Vec<SizeFilter> {
        self.items.read(|items| self.view.distinct_sizes(items))
    }

    pub fn summary(&self) -> String {
        format!("Showing {} caftan(s)", self.visible().len())
    }
}

impl Default for CatalogScreen {
    fn default() -> Self {
        Self::new(CatalogView::default())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] BookingError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("A rental submission is already in progress")]
    InFlight,
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Invalid(error) => error.to_string(),
            SubmitError::Api(ApiError::Rejected(message)) => {
                format!("Failed to create rental: {}", message)
            }
            SubmitError::Api(
                error @ (ApiError::Network(_)
                | ApiError::Timeout(_)
                | ApiError::Status {
                    status_code: 400 | 422,
                    ..
                }),
            ) => error.user_message(),
            SubmitError::Api(_) => "Failed to create rental".to_string(),
            SubmitError::InFlight => self.to_string(),
        }
    }
}

// Clears the in-flight flag however the submission ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct BookingScreen {
    item_id: i64,
    item_name: String,
    price_text: String,
    daily_price: f64,
    validator: BookingValidator,
    picker: Mutex<DatePicker>,
    in_flight: AtomicBool,
}

impl BookingScreen {
    /// `price_text` is the item's daily price as sent by the server. Text
    /// that does not parse prices the stay at zero.
    pub fn new(item_id: i64, item_name: &str, price_text: Option<&str>) -> Self {
        if let Some(text) = price_text.filter(|text| parse_price(text).is_none()) {
            warn!(item_id, price = text, "daily price did not parse, estimating at zero");
        }
        let daily_price = parse_daily_price(price_text);

        Self {
            item_id,
            item_name: item_name.to_string(),
            price_text: price_text.unwrap_or_default().to_string(),
            daily_price,
            validator: BookingValidator::default(),
            picker: Mutex::new(DatePicker::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn for_item(item: &CatalogItem) -> Self {
        Self::new(item.id, &item.name, Some(&item.price))
    }

    pub fn with_validator(mut self, validator: BookingValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn item_id(&self) -> i64 {
        self.item_id
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn daily_price(&self) -> f64 {
        self.daily_price
    }

    pub fn price_label(&self) -> String {
        daily_price_label(&self.price_text)
    }

    pub fn picker_state(&self) -> PickerState {
        self.picker.lock().state()
    }

    pub fn choose_start(&self, date: NaiveDate) -> StartPick {
        self.picker.lock().choose_start(date)
    }

    pub fn choose_end(&self, date: NaiveDate) -> Result<(), PickError> {
        self.picker.lock().choose_end(date)
    }

    pub fn clear_dates(&self) {
        self.picker.lock().clear();
    }

    pub fn preview(&self) -> Option<RentalPreview> {
        self.picker.lock().preview(self.daily_price)
    }

    /// Duration and estimate lines shown under the date fields.
    pub fn preview_lines(&self) -> Option<(String, String)> {
        self.preview().map(|preview| {
            (
                format!("Duration: {}", duration_label(preview.duration_days)),
                format!("Estimated Total: {}", format_money(preview.estimated_price)),
            )
        })
    }

    pub fn form(&self, customer_name: &str) -> BookingForm {
        self.picker.lock().form(customer_name)
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Validates `form` and posts a fresh rental request.
    ///
    /// A second call while one is outstanding fails with
    /// `SubmitError::InFlight` without reaching the API.
    pub async fn submit<A: RentalApi + ?Sized>(
        &self,
        api: &A,
        form: &BookingForm,
        today: NaiveDate,
    ) -> Result<RentalCreated, SubmitError> {
        let priced = self.validator.validate(form, today, self.daily_price)?;
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::InFlight)?;

        let request = RentalRequest::from(&priced.into_draft(self.item_id));
        debug!(item_id = self.item_id, start = %request.start_date, end = %request.end_date, "rental request built");

        match api.create_rental(&request).await {
            Ok(created) => {
                info!(item_id = self.item_id, rental_id = created.rental.id, "booking confirmed");
                Ok(created)
            }
            Err(error) => {
                warn!(item_id = self.item_id, %error, "booking failed");
                Err(error.into())
            }
        }
    }

    /// Submits the dates currently held by the picker.
    pub async fn submit_selection<A: RentalApi + ?Sized>(
        &self,
        api: &A,
        customer_name: &str,
        today: NaiveDate,
    ) -> Result<RentalCreated, SubmitError> {
        let form = self.form(customer_name);
        self.submit(api, &form, today).await
    }
}

#[derive(Default)]
pub struct RentalsScreen {
    rentals: LoadedList<Rental>,
}

impl RentalsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load<A: RentalApi + ?Sized>(&self, api: &A) -> Result<LoadOutcome, ApiError> {
        let ticket = self.rentals.begin();
        let fetched = api.list_rentals().await?;
        Ok(self.rentals.apply(ticket, fetched))
    }

    pub fn rentals(&self) -> Vec<Rental> {
        self.rentals.snapshot()
    }

    pub fn is_empty(&self) -> bool {
        self.rentals.read(|rentals| rentals.is_empty())
    }

    pub fn cards(&self) -> Vec<RentalCard> {
        self.rentals.read(|rentals| rentals.iter().map(RentalCard::from).collect())
    }

    /// Cancels a rental. The local entry is removed only once the server
    /// confirms the deletion, and loads started before that point can no
    /// longer bring it back.
    pub async fn delete<A: RentalApi + ?Sized>(&self, api: &A, rental_id: i64) -> Result<(), ApiError> {
        api.delete_rental(rental_id).await?;
        self.rentals
            .supersede(|rentals| rentals.retain(|rental| rental.id != rental_id));
        info!(rental_id, "rental removed");
        Ok(())
    }
}

pub fn delete_failure_message(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) | ApiError::Timeout(_) => "Network error. Please try again.".to_string(),
        ApiError::Rejected(message) => format!("Failed to delete rental: {}", message),
        _ => "Failed to delete rental".to_string(),
    }
}
