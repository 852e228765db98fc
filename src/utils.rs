use crate::error::{MarketInsightsError, Result};
use crate::schema::FieldPath;
use serde_json::Value;

/// Walks `path` through `root`. Any segment that cannot be followed reports
/// the whole path as missing.
pub fn resolve_path<'a>(root: &'a Value, path: &FieldPath) -> Result<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| MarketInsightsError::MissingField(path.to_string()))?;
    }
    Ok(current)
}

pub fn resolve_number(root: &Value, path: &FieldPath) -> Result<f64> {
    let value = resolve_path(root, path)?;
    if value.is_null() {
        return Err(MarketInsightsError::MissingField(path.to_string()));
    }
    value
        .as_f64()
        .ok_or_else(|| MarketInsightsError::NonNumericField(path.to_string()))
}

/// Reads an object of `category -> number` in document order.
pub fn resolve_category_shares(root: &Value, path: &FieldPath) -> Result<(Vec<String>, Vec<f64>)> {
    let value = resolve_path(root, path)?;
    if value.is_null() {
        return Err(MarketInsightsError::MissingField(path.to_string()));
    }
    let map = value
        .as_object()
        .ok_or_else(|| MarketInsightsError::NonNumericField(path.to_string()))?;

    let mut labels = Vec::with_capacity(map.len());
    let mut values = Vec::with_capacity(map.len());
    for (label, value) in map {
        let number = value.as_f64().ok_or_else(|| {
            MarketInsightsError::NonNumericField(format!("{}.{}", path, label))
        })?;
        labels.push(label.clone());
        values.push(number);
    }

    Ok((labels, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    #[test]
    fn test_resolve_nested_number() {
        let doc = json!({"kpis": {"sales": {"total_revenue": 1000}}});
        assert_eq!(
            resolve_number(&doc, &path("kpis.sales.total_revenue")).unwrap(),
            1000.0
        );
    }

    #[test]
    fn test_missing_segment_reports_full_path() {
        let doc = json!({"kpis": {"sales": {}}});
        let err = resolve_number(&doc, &path("kpis.sales.total_revenue")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "chart unavailable: missing field kpis.sales.total_revenue"
        );
    }

    #[test]
    fn test_traversing_through_scalar_is_missing() {
        let doc = json!({"kpis": 5});
        assert!(matches!(
            resolve_path(&doc, &path("kpis.sales")),
            Err(MarketInsightsError::MissingField(_))
        ));
    }

    #[test]
    fn test_array_index_segments() {
        let doc = json!({"history": [{"total": 3}, {"total": 7}]});
        assert_eq!(resolve_number(&doc, &path("history.1.total")).unwrap(), 7.0);
        assert!(resolve_number(&doc, &path("history.2.total")).is_err());
    }

    #[test]
    fn test_string_value_is_not_numeric() {
        let doc = json!({"kpis": {"bookings": {"total": "forty"}}});
        assert!(matches!(
            resolve_number(&doc, &path("kpis.bookings.total")),
            Err(MarketInsightsError::NonNumericField(_))
        ));
    }

    #[test]
    fn test_null_value_is_missing() {
        let doc = json!({"kpis": {"bookings": {"total": null}}});
        assert!(matches!(
            resolve_number(&doc, &path("kpis.bookings.total")),
            Err(MarketInsightsError::MissingField(_))
        ));
    }

    #[test]
    fn test_category_shares_keep_document_order() {
        let doc: Value =
            serde_json::from_str(r#"{"by_category": {"tours": 5, "hotels": 3, "cruises": 1.5}}"#)
                .unwrap();
        let (labels, values) = resolve_category_shares(&doc, &path("by_category")).unwrap();
        assert_eq!(labels, vec!["tours", "hotels", "cruises"]);
        assert_eq!(values, vec![5.0, 3.0, 1.5]);
    }

    #[test]
    fn test_null_category_object_is_missing() {
        let doc = json!({"kpis": {"products": {"by_category": null}}});
        let err = resolve_category_shares(&doc, &path("kpis.products.by_category")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "chart unavailable: missing field kpis.products.by_category"
        );
    }

    #[test]
    fn test_category_shares_reject_non_numeric_entries() {
        let doc = json!({"by_category": {"tours": "many"}});
        let err = resolve_category_shares(&doc, &path("by_category")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "chart unavailable: field by_category.tours is not numeric"
        );
    }
}
