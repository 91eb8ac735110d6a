//! Query parameter parsing, filtering and pagination for product listings.

use serde::{Deserialize, Serialize};

use crate::catalog::product::Product;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Raw query string. Every field is a string so a typo never becomes a
/// framework-level rejection; [`ListQuery::parse`] reports all problems at once.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub bypass_cache: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

/// Parsed and range-checked listing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: usize,
    pub limit: usize,
    pub bypass_cache: bool,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            bypass_cache: false,
            category: None,
            min_price: None,
            max_price: None,
        }
    }
}

impl ListQuery {
    pub fn parse(&self) -> Result<ListParams, Vec<String>> {
        let mut problems = Vec::new();
        let mut params = ListParams::default();

        if let Some(raw) = &self.page {
            match raw.parse::<usize>() {
                Ok(page) if page >= 1 => params.page = page,
                _ => problems.push(format!("page must be a positive integer, got {raw:?}")),
            }
        }

        if let Some(raw) = &self.limit {
            match raw.parse::<usize>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => params.limit = limit,
                _ => problems.push(format!("limit must be between 1 and {MAX_LIMIT}, got {raw:?}")),
            }
        }

        if let Some(raw) = &self.bypass_cache {
            match parse_flag(raw) {
                Some(flag) => params.bypass_cache = flag,
                None => problems.push(format!("bypass_cache must be true or false, got {raw:?}")),
            }
        }

        params.category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        params.min_price = parse_price_bound("min_price", self.min_price.as_deref(), &mut problems);
        params.max_price = parse_price_bound("max_price", self.max_price.as_deref(), &mut problems);

        if let (Some(min), Some(max)) = (params.min_price, params.max_price) {
            if min > max {
                problems.push(format!("min_price ({min}) exceeds max_price ({max})"));
            }
        }

        if problems.is_empty() {
            Ok(params)
        } else {
            Err(problems)
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_price_bound(name: &str, raw: Option<&str>, problems: &mut Vec<String>) -> Option<f64> {
    let raw = raw?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            problems.push(format!("{name} must be a non-negative number, got {raw:?}"));
            None
        }
    }
}

impl ListParams {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if !product
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
            {
                return false;
            }
        }
        self.min_price.map_or(true, |min| product.price >= min)
            && self.max_price.map_or(true, |max| product.price <= max)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Slice `items` into 1-based page `page` of size `limit`.
///
/// A page past the end is empty, not an error.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Page<T> {
    let limit = limit.max(1);
    let start = page.saturating_sub(1).saturating_mul(limit);

    Page {
        items: items.iter().skip(start).take(limit).cloned().collect(),
        page,
        limit,
        total_items: items.len(),
        total_pages: items.len().div_ceil(limit),
    }
}
