//! Batch validation with an integrity report.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::product::{validate_record, FieldError, Product};
use crate::upstream::Record;

/// Examples kept per field; the count keeps growing past this.
const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrorSummary {
    pub count: usize,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionsTaken {
    pub accepted: usize,
    pub discarded: usize,
}

/// What validation found across one batch of upstream records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub errors_by_field: BTreeMap<String, FieldErrorSummary>,
    pub error_types: BTreeSet<&'static str>,
    pub source_url: String,
    pub actions: ActionsTaken,
}

impl IntegrityReport {
    fn new(source_url: &str) -> Self {
        Self {
            errors_by_field: BTreeMap::new(),
            error_types: BTreeSet::new(),
            source_url: source_url.to_string(),
            actions: ActionsTaken::default(),
        }
    }

    fn record_errors(&mut self, errors: &[FieldError]) {
        for error in errors {
            let summary = self.errors_by_field.entry(error.field.clone()).or_default();
            summary.count += 1;
            if summary.examples.len() < MAX_EXAMPLES {
                summary.examples.push(match &error.value {
                    Some(v) => v.to_string(),
                    None => "missing".to_string(),
                });
            }
            self.error_types.insert(error.kind.as_str());
        }
    }
}

/// Valid products plus the report on everything that was dropped.
#[derive(Debug, Clone)]
pub struct ValidatedBatch {
    pub total_records: usize,
    pub products: Vec<Product>,
    pub report: IntegrityReport,
}

impl ValidatedBatch {
    pub fn invalid(&self) -> usize {
        self.report.actions.discarded
    }
}

/// Validate every record, keeping the good ones in upstream order.
pub fn validate_batch(records: &[Record], source_url: &str) -> ValidatedBatch {
    let mut report = IntegrityReport::new(source_url);
    let mut products = Vec::with_capacity(records.len());

    for record in records {
        match validate_record(record) {
            Ok(product) => {
                report.actions.accepted += 1;
                products.push(product);
            }
            Err(errors) => {
                report.actions.discarded += 1;
                report.record_errors(&errors);
            }
        }
    }

    if report.actions.discarded > 0 {
        tracing::debug!(
            accepted = report.actions.accepted,
            discarded = report.actions.discarded,
            fields = ?report.errors_by_field.keys().collect::<Vec<_>>(),
            "Discarded invalid records"
        );
    }

    ValidatedBatch {
        total_records: records.len(),
        products,
        report,
    }
}
