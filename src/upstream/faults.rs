//! Fault injection for exercising record validation end to end.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::upstream::client::UpstreamSource;
use crate::upstream::types::{Record, UpstreamError, UpstreamPayload};

/// Wraps a source and damages a fixed set of records in every successful
/// payload. Failures from the inner source pass through untouched.
pub struct FaultInjectingUpstream<S> {
    inner: S,
}

impl<S> FaultInjectingUpstream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: UpstreamSource> UpstreamSource for FaultInjectingUpstream<S> {
    async fn fetch_records(&self, key: &str) -> Result<UpstreamPayload, UpstreamError> {
        let mut payload = self.inner.fetch_records(key).await?;
        let damaged = corrupt(&mut payload.records);
        tracing::warn!(key, damaged, "Injected faults into upstream records");
        Ok(payload)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// Apply the fixed damage pattern. Returns how many records were touched.
pub fn corrupt(records: &mut [Record]) -> usize {
    let mut damaged = 0;
    for (index, record) in records.iter_mut().enumerate() {
        let Some(obj) = record.as_object_mut() else {
            continue;
        };
        match index {
            0 => {
                obj.insert("price".into(), json!(-1));
            }
            1 => {
                if obj.remove("title").is_none() {
                    continue;
                }
            }
            2 => {
                obj.insert("price".into(), json!("expensive"));
            }
            3 => {
                obj.insert("price".into(), Value::Null);
            }
            10 => {
                obj.insert("price".into(), json!(-100));
            }
            _ => continue,
        }
        damaged += 1;
    }
    damaged
}
