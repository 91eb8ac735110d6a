//! Aggregate statistics over validated products.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::integrity::ValidatedBatch;
use crate::catalog::product::Product;

const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_records: usize,
    pub valid: usize,
    pub invalid: usize,
    /// 0.0 when there are no valid products.
    pub mean_price: f64,
    pub median_price: f64,
    pub count_by_category: BTreeMap<String, usize>,
}

pub fn summarize(batch: &ValidatedBatch) -> CatalogSummary {
    let prices: Vec<f64> = batch.products.iter().map(|p| p.price).collect();

    CatalogSummary {
        total_records: batch.total_records,
        valid: batch.products.len(),
        invalid: batch.invalid(),
        mean_price: mean(&prices).unwrap_or(0.0),
        median_price: median(&prices).unwrap_or(0.0),
        count_by_category: count_by_category(&batch.products),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value, or the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn count_by_category(products: &[Product]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for product in products {
        let category = product.category.as_deref().unwrap_or(UNCATEGORIZED);
        *counts.entry(category.to_string()).or_insert(0) += 1;
    }
    counts
}
