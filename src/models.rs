use serde::{Deserialize, Deserializer, Serialize};

use crate::api::ApiError;
use crate::booking::{date_portion, parse_iso_date, DateRange, RentalRequestDraft, DATE_FORMAT};

// Data structures for the rental backend JSON responses

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CatalogItem {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<String>,
    // Decimal columns arrive as text; some backends send plain numbers
    #[serde(default, deserialize_with = "price_text")]
    pub price: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub availability: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A confirmed rental as reported by the server. Never mutated locally.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Rental {
    pub id: i64,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub caftan_id: i64,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "optional_price_text")]
    pub total_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub caftan: Option<CatalogItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Rental {
    /// Rental dates with any timestamp suffix stripped.
    ///
    /// Returns `None` when either date is missing, unparseable, or the end
    /// precedes the start.
    pub fn date_range(&self) -> Option<DateRange> {
        let start = parse_iso_date(date_portion(self.start_date.as_deref()?)).ok()?;
        let end = parse_iso_date(date_portion(self.end_date.as_deref()?)).ok()?;
        DateRange::new(start, end)
    }
}

// Payload for POST rentals
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RentalRequest {
    pub customer_name: String,
    pub caftan_id: i64,
    pub start_date: String,
    pub end_date: String,
}

impl From<&RentalRequestDraft> for RentalRequest {
    fn from(draft: &RentalRequestDraft) -> Self {
        Self {
            customer_name: draft.customer_name().to_string(),
            caftan_id: draft.item_id(),
            start_date: draft.range().start().format(DATE_FORMAT).to_string(),
            end_date: draft.range().end().format(DATE_FORMAT).to_string(),
        }
    }
}

/// Every backend response is wrapped in `{success, message, data}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    // A missing field already decodes as None
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(self.message));
        }
        self.data
            .ok_or_else(|| ApiError::Rejected(format!("response carried no data: {}", self.message)))
    }
}

// Data of a successful rental creation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RentalCreated {
    pub rental: Rental,
    #[serde(default)]
    pub caftan: Option<CatalogItem>,
}

fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_price_text(deserializer)?.unwrap_or_default())
}

fn optional_price_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_catalog_response_decoding() {
        let json = r#"{
            "success": true,
            "message": "Liste des caftans",
            "data": [
                {"id": 1, "name": "Takchita Royale", "size": "M", "price": "150.00",
                 "image_url": "https://img.example/1.jpg", "availability": true,
                 "created_at": "2025-01-01T10:00:00.000000Z"},
                {"id": 2, "name": "Caftan Fassi", "size": null, "price": 99.5,
                 "availability": false}
            ]
        }"#;

        let envelope: ApiEnvelope<Vec<CatalogItem>> = serde_json::from_str(json).unwrap();
        let items = envelope.into_data().unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, "150.00");
        assert_eq!(items[0].size.as_deref(), Some("M"));
        assert_eq!(items[1].price, "99.5");
        assert_eq!(items[1].size, None);
        assert_eq!(items[1].image_url, None);
    }

    #[test]
    fn test_unsuccessful_envelope_is_rejected() {
        let json = r#"{"success": false, "message": "Caftan non trouvé"}"#;
        let envelope: ApiEnvelope<CatalogItem> = serde_json::from_str(json).unwrap();

        match envelope.into_data() {
            Err(ApiError::Rejected(message)) => assert_eq!(message, "Caftan non trouvé"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_success_without_data_is_rejected() {
        let json = r#"{"success": true, "message": "Location créée avec succès"}"#;
        let envelope: ApiEnvelope<RentalCreated> = serde_json::from_str(json).unwrap();

        assert!(envelope.data.is_none());
        assert!(matches!(envelope.into_data(), Err(ApiError::Rejected(_))));
    }

    #[test]
    fn test_rental_date_range_strips_timestamps() {
        let json = r#"{
            "id": 7, "customer_name": "Amina", "caftan_id": 3,
            "start_date": "2025-12-23T00:00:00.000000Z",
            "end_date": "2025-12-26T00:00:00.000000Z",
            "total_price": "600.00", "duration_days": 4, "caftan": null
        }"#;

        let rental: Rental = serde_json::from_str(json).unwrap();
        let range = rental.date_range().unwrap();

        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2025, 12, 23).unwrap());
        assert_eq!(range.end(), NaiveDate::from_ymd_opt(2025, 12, 26).unwrap());
        assert_eq!(rental.total_price.as_deref(), Some("600.00"));
        assert!(rental.caftan.is_none());
    }

    #[test]
    fn test_rental_without_dates_has_no_range() {
        let json = r#"{"id": 7, "caftan_id": 3, "start_date": "soon"}"#;
        let rental: Rental = serde_json::from_str(json).unwrap();
        assert!(rental.date_range().is_none());
    }

    #[test]
    fn test_rental_created_decoding() {
        let json = r#"{
            "success": true,
            "message": "Location créée avec succès",
            "data": {
                "rental": {"id": 12, "customer_name": "Salma", "caftan_id": 1,
                           "start_date": "2025-06-01", "end_date": "2025-06-04",
                           "total_price": 600},
                "caftan": {"id": 1, "name": "Takchita Royale", "size": "M", "price": "150.00",
                           "availability": true}
            }
        }"#;

        let envelope: ApiEnvelope<RentalCreated> = serde_json::from_str(json).unwrap();
        let created = envelope.into_data().unwrap();

        assert_eq!(created.rental.id, 12);
        assert_eq!(created.rental.total_price.as_deref(), Some("600"));
        assert_eq!(created.caftan.unwrap().name, "Takchita Royale");
    }
}
