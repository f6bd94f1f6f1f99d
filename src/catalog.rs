// Client-side catalog filtering and price sorting
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::CatalogItem;

// Size restriction applied to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SizeFilter {
    #[default]
    Any,
    Size(String),
}

impl SizeFilter {
    /// Case-insensitive match; items without a size only pass `Any`.
    pub fn matches(&self, size: Option<&str>) -> bool {
        match self {
            SizeFilter::Any => true,
            SizeFilter::Size(wanted) => {
                size.map_or(false, |size| size.to_lowercase() == wanted.to_lowercase())
            }
        }
    }
}

impl fmt::Display for SizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeFilter::Any => write!(f, "All"),
            SizeFilter::Size(size) => write!(f, "{}", size),
        }
    }
}

impl FromStr for SizeFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(SizeFilter::Any)
        } else {
            Ok(SizeFilter::Size(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    None,
    PriceAscending,
    PriceDescending,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown sort mode: {0} (expected none, price-asc or price-desc)")]
pub struct UnknownSortMode(pub String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(SortMode::None),
            "price-asc" => Ok(SortMode::PriceAscending),
            "price-desc" => Ok(SortMode::PriceDescending),
            other => Err(UnknownSortMode(other.to_string())),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMode::None => write!(f, "None"),
            SortMode::PriceAscending => write!(f, "Price: Low to High"),
            SortMode::PriceDescending => write!(f, "Price: High to Low"),
        }
    }
}

/// Current catalog view settings. Each user action produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSortState {
    pub size_filter: SizeFilter,
    pub sort_mode: SortMode,
}

impl FilterSortState {
    pub fn new(size_filter: SizeFilter, sort_mode: SortMode) -> Self {
        Self {
            size_filter,
            sort_mode,
        }
    }

    pub fn with_size(&self, size_filter: SizeFilter) -> Self {
        Self {
            size_filter,
            sort_mode: self.sort_mode,
        }
    }

    pub fn with_sort(&self, sort_mode: SortMode) -> Self {
        Self {
            size_filter: self.size_filter.clone(),
            sort_mode,
        }
    }

    pub fn reset() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Collapse size options that differ only by letter case.
    pub normalize_size_case: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    config: CatalogConfig,
}

impl CatalogView {
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Produces the display sequence for `state`. The input is never modified.
    ///
    /// Sorting is stable and numeric. Items whose price text does not parse
    /// keep their relative order and are placed after every priced item.
    pub fn apply(&self, items: &[CatalogItem], state: &FilterSortState) -> Vec<CatalogItem> {
        let filtered = items
            .iter()
            .filter(|item| state.size_filter.matches(item.size.as_deref()));

        if state.sort_mode == SortMode::None {
            return filtered.cloned().collect();
        }

        let mut keyed: Vec<(Option<f64>, &CatalogItem)> = filtered
            .map(|item| (parse_price(&item.price), item))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| compare_prices(*a, *b, state.sort_mode));

        keyed.into_iter().map(|(_, item)| item.clone()).collect()
    }

    /// Size choices for the filter menu: `Any` first, then each size in
    /// first-seen order. Blank sizes and sizes reading "all" are folded into
    /// `Any`.
    ///
    /// Distinctness is case-sensitive unless `normalize_size_case` is set,
    /// while filtering itself always ignores case.
    pub fn distinct_sizes(&self, items: &[CatalogItem]) -> Vec<SizeFilter> {
        let mut sizes: Vec<&str> = Vec::new();
        for size in items.iter().filter_map(|item| item.size.as_deref()) {
            // A size spelled like the "All" marker would parse back to Any
            if size.parse::<SizeFilter>() == Ok(SizeFilter::Any) {
                continue;
            }
            let seen = sizes.iter().any(|known| {
                if self.config.normalize_size_case {
                    known.to_lowercase() == size.to_lowercase()
                } else {
                    *known == size
                }
            });
            if !seen {
                sizes.push(size);
            }
        }

        std::iter::once(SizeFilter::Any)
            .chain(sizes.into_iter().map(|size| SizeFilter::Size(size.to_string())))
            .collect()
    }

    pub fn find<'a>(&self, items: &'a [CatalogItem], id: i64) -> Option<&'a CatalogItem> {
        items.iter().find(|item| item.id == id)
    }
}

fn compare_prices(a: Option<f64>, b: Option<f64>, mode: SortMode) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match mode {
            SortMode::PriceAscending => a.total_cmp(&b),
            SortMode::PriceDescending => b.total_cmp(&a),
            SortMode::None => Ordering::Equal,
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parses decimal price text such as `"150.00"`. Blank, malformed and
/// non-finite values give `None`.
pub fn parse_price(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}
