// Client core for the caftan rental service

pub mod api;
pub mod booking;
pub mod cache;
pub mod catalog;
pub mod client;
pub mod date_picker;
pub mod display;
pub mod models;
pub mod screens;

// Re-export key types for convenience
pub use api::{ApiError, ClientConfig, ClientError, RentalApi, RetryConfig};
pub use booking::{
    BookingError, BookingForm, BookingPolicy, BookingValidator, DateRange, PricedBooking,
    RentalRequestDraft,
};
pub use cache::{CacheConfig, CacheStatsReport, DetailCache};
pub use catalog::{CatalogConfig, CatalogView, FilterSortState, SizeFilter, SortMode};
pub use client::HttpRentalClient;
pub use date_picker::{DatePicker, PickError, PickerState, RentalPreview};
pub use display::{daily_price_label, format_money, readable_date, size_label, CatalogCard, RentalCard};
pub use models::{CatalogItem, Rental, RentalCreated, RentalRequest};
pub use screens::{
    delete_failure_message, BookingScreen, CatalogScreen, LoadOutcome, RentalsScreen, SubmitError,
};
