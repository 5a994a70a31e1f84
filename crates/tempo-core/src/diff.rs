//! Field-level diffing between a document's current state and a proposed
//! update.
//!
//! A field makes it into the change set when it is on the document's
//! allow-list, present in the proposed update, and its new value is not
//! structurally equal to the old one. Fields outside the allow-list are
//! dropped without error. An update whose filtered change set is empty is
//! a normal rejection ([`EmptyUpdate`]), not a fault.
//!
//! Equality is structural ([`deep_eq`]), so replacing an array or object
//! with an equal-valued one produces no diff regardless of key order, and
//! integral floats compare equal to integers (`5.0 == 5`), which keeps
//! float-typed JSON clients from producing phantom diffs.

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::model::entity::Document;

/// One field-level change, old and new value included.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Normal rejection of an update with no effective changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("update contains no effective changes")]
pub struct EmptyUpdate;

/// Compute the filtered change set for a proposed update.
///
/// The result preserves the proposed map's (lexicographic) field order,
/// so a batch lands in the update trail deterministically.
pub fn changed_fields<D: Document>(
    current: &D,
    proposed: &BTreeMap<String, Value>,
) -> Result<Vec<FieldChange>, EmptyUpdate> {
    let mut changes = Vec::new();
    for (field, new_value) in proposed {
        if !D::mutable_fields().contains(&field.as_str()) {
            debug!(field = %field, "dropping field outside the mutable set");
            continue;
        }
        let old_value = current.field_value(field).unwrap_or(Value::Null);
        if !deep_eq(&old_value, new_value) {
            changes.push(FieldChange {
                field: field.clone(),
                old_value,
                new_value: new_value.clone(),
            });
        }
    }

    if changes.is_empty() {
        return Err(EmptyUpdate);
    }
    Ok(changes)
}

/// Structural equality over JSON values.
#[must_use]
pub fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_eq(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(key, x)| ym.get(key).is_some_and(|y| deep_eq(x, y)))
        }
        _ => a == b,
    }
}

fn number_eq(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if x == y {
        return true;
    }
    // Cross-representation case: 5 vs 5.0. Large integers beyond f64
    // precision only compare equal via the exact check above.
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{EmptyUpdate, changed_fields, deep_eq};
    use crate::model::issue::{Issue, IssueDraft, Kind};
    use serde_json::{Value, json};
    use std::collections::BTreeMap;

    fn issue() -> Issue {
        let mut draft = IssueDraft::new("Fix login retry", Kind::Task, "alice");
        draft.story_points = 3;
        draft.assignees = vec!["bob".to_owned()];
        Issue::from_draft("TASK-F-00001-01".to_owned(), draft)
    }

    fn fields(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn unchanged_values_produce_no_diff() {
        let issue = issue();
        let proposed = fields(&[
            ("title", json!("Fix login retry")),
            ("story_points", json!(3)),
        ]);
        assert_eq!(changed_fields(&issue, &proposed), Err(EmptyUpdate));
    }

    #[test]
    fn changed_values_are_reported_with_old_and_new() {
        let issue = issue();
        let proposed = fields(&[("story_points", json!(5))]);

        let changes = changed_fields(&issue, &proposed).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "story_points");
        assert_eq!(changes[0].old_value, json!(3));
        assert_eq!(changes[0].new_value, json!(5));
    }

    #[test]
    fn fields_outside_the_allow_list_are_silently_dropped() {
        let issue = issue();
        let proposed = fields(&[("votes", json!(12)), ("priority", json!("high"))]);

        let changes = changed_fields(&issue, &proposed).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "priority");
    }

    #[test]
    fn only_dropped_fields_means_empty_update() {
        let issue = issue();
        let proposed = fields(&[("votes", json!(12)), ("watchers", json!(4))]);
        assert_eq!(changed_fields(&issue, &proposed), Err(EmptyUpdate));
    }

    #[test]
    fn equal_valued_array_produces_no_diff() {
        let issue = issue();
        let proposed = fields(&[("assignees", json!(["bob"]))]);
        assert_eq!(changed_fields(&issue, &proposed), Err(EmptyUpdate));
    }

    #[test]
    fn derived_board_field_diffs_like_any_other() {
        let mut draft = IssueDraft::new("Fix login retry", Kind::Task, "alice");
        draft.board_id = Some("sprint-1".to_owned());
        let issue = Issue::from_draft("TASK-F-00001-01".to_owned(), draft);

        let same = fields(&[("board_id", json!("sprint-1"))]);
        assert_eq!(changed_fields(&issue, &same), Err(EmptyUpdate));

        let moved = fields(&[("board_id", json!("sprint-2"))]);
        let changes = changed_fields(&issue, &moved).unwrap();
        assert_eq!(changes[0].old_value, json!("sprint-1"));
    }

    #[test]
    fn deep_eq_ignores_object_key_order() {
        let a: Value = serde_json::from_str(r#"{"issues":["a"],"projects":[]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"projects":[],"issues":["a"]}"#).unwrap();
        assert!(deep_eq(&a, &b));
    }

    #[test]
    fn deep_eq_treats_integral_floats_as_integers() {
        assert!(deep_eq(&json!(5.0), &json!(5)));
        assert!(deep_eq(&json!({"points": 3.0}), &json!({"points": 3})));
        assert!(!deep_eq(&json!(5.5), &json!(5)));
    }

    #[test]
    fn deep_eq_is_strict_about_shape() {
        assert!(!deep_eq(&json!([1, 2]), &json!([2, 1])));
        assert!(!deep_eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_eq(&json!("5"), &json!(5)));
        assert!(deep_eq(&Value::Null, &Value::Null));
    }
}
