// Text shown by the catalog, booking and rentals screens
use chrono::NaiveDate;

use crate::booking::{date_portion, parse_iso_date};
use crate::catalog::parse_price;
use crate::models::{CatalogItem, Rental};

pub const CURRENCY: &str = "DH";

pub fn format_money(amount: f64) -> String {
    format!("{:.2} {}", amount, CURRENCY)
}

pub fn daily_price_label(price_text: &str) -> String {
    format!("{} {}/day", price_text, CURRENCY)
}

pub fn size_label(size: Option<&str>) -> String {
    format!("Size: {}", size.unwrap_or("-"))
}

pub fn duration_label(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", days)
    }
}

/// `"2025-12-23T00:00:00.000000Z"` or `"2025-12-23"` become `"Dec 23, 2025"`.
///
/// Text whose date part does not parse is returned as that date part, or
/// unchanged when shorter than a date.
pub fn readable_date(text: &str) -> String {
    let portion = date_portion(text);
    match parse_iso_date(portion) {
        Ok(date) => format_readable(date),
        Err(_) => portion.to_string(),
    }
}

fn format_readable(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

/// One line of the catalog list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCard {
    pub item_id: i64,
    pub name: String,
    pub size: String,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&CatalogItem> for CatalogCard {
    fn from(item: &CatalogItem) -> Self {
        Self {
            item_id: item.id,
            name: item.name.clone(),
            size: size_label(item.size.as_deref()),
            price: daily_price_label(&item.price),
            image_url: item.image_url.clone().filter(|url| !url.is_empty()),
        }
    }
}

/// One entry of the "my rentals" list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalCard {
    pub rental_id: i64,
    pub title: String,
    pub customer: String,
    pub dates: String,
    pub total: String,
    pub image_url: Option<String>,
}

impl From<&Rental> for RentalCard {
    fn from(rental: &Rental) -> Self {
        let title = match &rental.caftan {
            Some(item) if !item.name.is_empty() => item.name.clone(),
            Some(_) => "Caftan".to_string(),
            None => format!("Caftan #{}", rental.caftan_id),
        };

        let customer = rental.customer_name.as_deref().unwrap_or("Unknown");

        let start = rental.start_date.as_deref().map(readable_date).unwrap_or_default();
        let end = rental.end_date.as_deref().map(readable_date).unwrap_or_default();
        let dates = if start.is_empty() || end.is_empty() {
            "Dates not available".to_string()
        } else {
            format!("{} to {}", start, end)
        };

        let total = match rental.total_price.as_deref().filter(|text| !text.is_empty()) {
            Some(text) => match parse_price(text) {
                Some(amount) => format!("Total: {}", format_money(amount)),
                None => format!("Total: {} {}", text, CURRENCY),
            },
            None => "Price not available".to_string(),
        };

        Self {
            rental_id: rental.id,
            title,
            customer: format!("Customer: {}", customer),
            dates,
            total,
            image_url: rental
                .caftan
                .as_ref()
                .and_then(|item| item.image_url.clone())
                .filter(|url| !url.is_empty()),
        }
    }
}
