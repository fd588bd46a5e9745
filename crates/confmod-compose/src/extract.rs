//! Label- and prefix-scoped property extraction.
//!
//! The order is fixed: pick the label's sub-object, keep only keys
//! starting with the prefix, then strip the prefix from those keys.
//! An empty label or prefix counts as absent.

use confmod_common::config::{EngineConfig, MissingLabelPolicy};
use confmod_common::error::{ConfmodError, Result};
use confmod_common::types::Properties;
use serde_json::Value;

/// Extracts the scoped sub-object, treating a missing label as empty.
#[must_use]
pub fn extract(obj: &Properties, label: Option<&str>, prefix: Option<&str>) -> Properties {
    let labeled = pick_label(obj, label).unwrap_or_default();
    strip_prefix(filter_by_prefix(labeled, prefix), prefix)
}

/// Extracts the scoped sub-object under the given engine configuration.
///
/// # Errors
///
/// Returns [`ConfmodError::MissingLabel`] if the label is absent and the
/// configuration selects [`MissingLabelPolicy::Error`].
pub fn extract_with(
    obj: &Properties,
    label: Option<&str>,
    prefix: Option<&str>,
    config: &EngineConfig,
) -> Result<Properties> {
    let labeled = match pick_label(obj, label) {
        Some(labeled) => labeled,
        None => match (label, config.missing_label) {
            (Some(label), MissingLabelPolicy::Error) => {
                return Err(ConfmodError::MissingLabel {
                    label: label.to_string(),
                });
            }
            (Some(label), MissingLabelPolicy::Empty) => {
                tracing::warn!(label, "label missing from argument, defaults alone apply");
                Properties::new()
            }
            (None, _) => Properties::new(),
        },
    };
    let scoped = strip_prefix(filter_by_prefix(labeled, prefix), prefix);
    tracing::trace!(?label, ?prefix, keys = scoped.len(), "extracted scoped properties");
    Ok(scoped)
}

/// Returns `None` only when a label is given and absent from `obj`.
/// A label bound to a non-object value yields an empty object.
fn pick_label(obj: &Properties, label: Option<&str>) -> Option<Properties> {
    match label.filter(|l| !l.is_empty()) {
        None => Some(obj.clone()),
        Some(label) => match obj.get(label) {
            None => None,
            Some(Value::Object(inner)) => Some(inner.clone()),
            Some(_) => Some(Properties::new()),
        },
    }
}

fn filter_by_prefix(obj: Properties, prefix: Option<&str>) -> Properties {
    match prefix.filter(|p| !p.is_empty()) {
        None => obj,
        Some(prefix) => obj.into_iter().filter(|(k, _)| k.starts_with(prefix)).collect(),
    }
}

fn strip_prefix(obj: Properties, prefix: Option<&str>) -> Properties {
    match prefix.filter(|p| !p.is_empty()) {
        None => obj,
        Some(prefix) => obj
            .into_iter()
            .map(|(k, v)| (k[prefix.len()..].to_string(), v))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn no_label_no_prefix_is_identity() {
        let obj = props(json!({ "a": 1, "b": 2 }));
        assert_eq!(extract(&obj, None, None), obj);
    }

    #[test]
    fn label_selects_sub_object_only() {
        let obj = props(json!({ "L": { "x": 1 }, "other": { "y": 2 } }));
        assert_eq!(extract(&obj, Some("L"), None), props(json!({ "x": 1 })));
    }

    #[test]
    fn prefix_filters_and_strips() {
        let obj = props(json!({ "prefix_a": 1, "other_b": 2 }));
        assert_eq!(extract(&obj, None, Some("prefix_")), props(json!({ "a": 1 })));
    }

    #[test]
    fn label_applies_before_prefix() {
        let obj = props(json!({
            "L": { "p_a": 1, "b": 2 },
            "p_c": 3,
        }));
        assert_eq!(extract(&obj, Some("L"), Some("p_")), props(json!({ "a": 1 })));
    }

    #[test]
    fn missing_label_is_empty() {
        let obj = props(json!({ "other": { "y": 2 } }));
        assert!(extract(&obj, Some("L"), None).is_empty());
    }

    #[test]
    fn non_object_label_is_empty() {
        let obj = props(json!({ "L": "scalar" }));
        assert!(extract(&obj, Some("L"), None).is_empty());
    }

    #[test]
    fn unmatched_prefix_is_empty() {
        let obj = props(json!({ "a": 1 }));
        assert!(extract(&obj, None, Some("zz_")).is_empty());
    }

    #[test]
    fn empty_label_and_prefix_are_ignored() {
        let obj = props(json!({ "a": 1 }));
        assert_eq!(extract(&obj, Some(""), Some("")), obj);
    }

    #[test]
    fn strict_policy_rejects_missing_label() {
        let obj = props(json!({ "other": {} }));
        let err = extract_with(&obj, Some("L"), None, &EngineConfig::strict())
            .expect_err("strict policy");
        assert!(matches!(err, ConfmodError::MissingLabel { ref label } if label == "L"));
    }

    #[test]
    fn strict_policy_accepts_present_label() {
        let obj = props(json!({ "L": { "x": 1 } }));
        let scoped =
            extract_with(&obj, Some("L"), None, &EngineConfig::strict()).expect("present label");
        assert_eq!(scoped, props(json!({ "x": 1 })));
    }
}
