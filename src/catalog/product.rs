//! Product record validation.
//!
//! Upstream records arrive as loose JSON. A record becomes a [`Product`] only
//! if every field checks out; otherwise each bad field yields a
//! [`FieldError`] for the integrity report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::upstream::Record;

/// Timestamps attached to every product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductMeta {
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A validated product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub meta: ProductMeta,
}

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    ModelType,
    Missing,
    IntParsing,
    StringType,
    FloatType,
    FloatParsing,
    GreaterThanEqual,
    DatetimeParsing,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelType => "model_type",
            Self::Missing => "missing",
            Self::IntParsing => "int_parsing",
            Self::StringType => "string_type",
            Self::FloatType => "float_type",
            Self::FloatParsing => "float_parsing",
            Self::GreaterThanEqual => "greater_than_equal",
            Self::DatetimeParsing => "datetime_parsing",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected field of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// Dotted path, e.g. `price` or `meta.createdAt`.
    pub field: String,
    pub kind: ErrorKind,
    /// The offending value, or `None` if the field was absent.
    pub value: Option<Value>,
}

impl FieldError {
    fn new(field: impl Into<String>, kind: ErrorKind, value: Option<&Value>) -> Self {
        Self {
            field: field.into(),
            kind,
            value: value.cloned(),
        }
    }
}

/// Validate one upstream record.
pub fn validate_record(record: &Record) -> Result<Product, Vec<FieldError>> {
    let Some(obj) = record.as_object() else {
        return Err(vec![FieldError::new("record", ErrorKind::ModelType, Some(record))]);
    };

    let mut errors = Vec::new();

    let id = collect(&mut errors, parse_id(obj));
    let title = collect(&mut errors, parse_title(obj));
    let price = collect(&mut errors, parse_price(obj));
    let category = collect(&mut errors, parse_category(obj));
    let meta = parse_meta(obj, &mut errors);

    match (id, title, price, category, meta) {
        (Some(id), Some(title), Some(price), Some(category), Some(meta)) if errors.is_empty() => {
            Ok(Product {
                id,
                title,
                price,
                category,
                meta,
            })
        }
        _ => Err(errors),
    }
}

fn collect<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn parse_id(obj: &Map<String, Value>) -> Result<i64, FieldError> {
    match obj.get("id") {
        None => Err(FieldError::new("id", ErrorKind::Missing, None)),
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| FieldError::new("id", ErrorKind::IntParsing, Some(v))),
    }
}

fn parse_title(obj: &Map<String, Value>) -> Result<String, FieldError> {
    match obj.get("title") {
        None => Err(FieldError::new("title", ErrorKind::Missing, None)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v) => Err(FieldError::new("title", ErrorKind::StringType, Some(v))),
    }
}

fn parse_price(obj: &Map<String, Value>) -> Result<f64, FieldError> {
    let value = obj
        .get("price")
        .ok_or_else(|| FieldError::new("price", ErrorKind::Missing, None))?;

    let price = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|p| p.is_finite()),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
            return Err(FieldError::new("price", ErrorKind::FloatType, Some(value)))
        }
    }
    .ok_or_else(|| FieldError::new("price", ErrorKind::FloatParsing, Some(value)))?;

    if price < 0.0 {
        return Err(FieldError::new("price", ErrorKind::GreaterThanEqual, Some(value)));
    }
    Ok(price)
}

fn parse_category(obj: &Map<String, Value>) -> Result<Option<String>, FieldError> {
    match obj.get("category") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v) => Err(FieldError::new("category", ErrorKind::StringType, Some(v))),
    }
}

fn parse_meta(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<ProductMeta> {
    let meta = match obj.get("meta") {
        None => {
            errors.push(FieldError::new("meta", ErrorKind::Missing, None));
            return None;
        }
        Some(Value::Object(meta)) => meta,
        Some(v) => {
            errors.push(FieldError::new("meta", ErrorKind::ModelType, Some(v)));
            return None;
        }
    };

    let created_at = collect(errors, parse_timestamp(meta, "createdAt"));
    let updated_at = collect(errors, parse_timestamp(meta, "updatedAt"));

    Some(ProductMeta {
        created_at: created_at?,
        updated_at: updated_at?,
    })
}

fn parse_timestamp(meta: &Map<String, Value>, key: &str) -> Result<DateTime<Utc>, FieldError> {
    let field = format!("meta.{key}");
    match meta.get(key) {
        None => Err(FieldError::new(field, ErrorKind::Missing, None)),
        Some(v) => v
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| FieldError::new(field, ErrorKind::DatetimeParsing, Some(v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "id": 1,
            "title": "Essence Mascara",
            "price": 9.99,
            "category": "beauty",
            "meta": {
                "createdAt": "2023-01-01T00:00:00.000Z",
                "updatedAt": "2023-01-02T00:00:00.000Z"
            }
        })
    }

    fn kinds(errors: &[FieldError]) -> Vec<(&str, ErrorKind)> {
        errors.iter().map(|e| (e.field.as_str(), e.kind)).collect()
    }

    #[test]
    fn test_valid_record() {
        let product = validate_record(&valid()).unwrap();
        assert_eq!(product.id, 1);
        assert_eq!(product.category.as_deref(), Some("beauty"));
        assert_eq!(product.meta.created_at.to_rfc3339(), "2023-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_category_is_optional() {
        let mut record = valid();
        record.as_object_mut().unwrap().remove("category");
        assert_eq!(validate_record(&record).unwrap().category, None);
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut record = valid();
        record["price"] = json!(-1);
        let errors = validate_record(&record).unwrap_err();
        assert_eq!(kinds(&errors), vec![("price", ErrorKind::GreaterThanEqual)]);
        assert_eq!(errors[0].value, Some(json!(-1)));
    }

    #[test]
    fn test_price_type_errors() {
        let mut record = valid();
        record["price"] = Value::Null;
        assert_eq!(
            kinds(&validate_record(&record).unwrap_err()),
            vec![("price", ErrorKind::FloatType)]
        );

        record["price"] = json!("expensive");
        assert_eq!(
            kinds(&validate_record(&record).unwrap_err()),
            vec![("price", ErrorKind::FloatParsing)]
        );

        record["price"] = json!("12.5");
        assert_eq!(validate_record(&record).unwrap().price, 12.5);
    }

    #[test]
    fn test_multiple_errors_collected() {
        let record = json!({
            "id": "string_id",
            "title": null,
            "price": "string_price",
            "category": "test",
            "meta": {"createdAt": null, "updatedAt": null}
        });

        let errors = validate_record(&record).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ("id", ErrorKind::IntParsing),
                ("title", ErrorKind::StringType),
                ("price", ErrorKind::FloatParsing),
                ("meta.createdAt", ErrorKind::DatetimeParsing),
                ("meta.updatedAt", ErrorKind::DatetimeParsing),
            ]
        );
    }

    #[test]
    fn test_missing_fields() {
        let errors = validate_record(&json!({"id": 3})).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ("title", ErrorKind::Missing),
                ("price", ErrorKind::Missing),
                ("meta", ErrorKind::Missing),
            ]
        );
        assert!(errors.iter().all(|e| e.value.is_none()));
    }

    #[test]
    fn test_non_object_record() {
        let errors = validate_record(&json!([1, 2])).unwrap_err();
        assert_eq!(kinds(&errors), vec![("record", ErrorKind::ModelType)]);
    }
}
