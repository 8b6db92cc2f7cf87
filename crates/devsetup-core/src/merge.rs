//! Pure merge algorithms on `serde_json` values.
//!
//! Nothing in this module touches the file system.  The stores in
//! [`crate::store`] load a document, hand it to one of these functions, and
//! save the result.
//!
//! # The two-tier terminal merge (for beginners)
//!
//! Windows Terminal keeps its color schemes in a top-level `schemes` array:
//!
//! ```json
//! { "schemes": [ { "name": "Campbell", "background": "#0C0C0C" } ] }
//! ```
//!
//! Replacing that array wholesale would delete every scheme the user already
//! has; appending blindly would duplicate ours on every run.  So `schemes` is
//! merged **by name**: an incoming scheme replaces the existing entry with the
//! same `name` at the same position, or is appended when the name is new.
//!
//! Every other field follows plain deep-merge rules:
//!
//! | existing value | incoming value | result                          |
//! |----------------|----------------|---------------------------------|
//! | object         | object         | merged key by key, recursively  |
//! | anything       | array          | replaced by the incoming array  |
//! | anything       | scalar         | replaced by the incoming scalar |
//! | absent         | anything       | inserted                        |
//!
//! Arrays other than `schemes` are never merged element-wise.  That asymmetry
//! is part of the contract and is pinned down by the tests below.

use serde_json::{Map, Value};
use thiserror::Error;

/// Top-level field of the terminal document that is merged by name.
pub const SCHEMES_FIELD: &str = "schemes";

/// Identity field of a terminal color scheme.
pub const SCHEME_NAME_FIELD: &str = "name";

/// Errors raised by the merge algorithms.
#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    /// An incoming record has no string value at the identity field.
    #[error("record #{index} has no string `{field}` field")]
    MissingIdentity { index: usize, field: String },

    /// The existing document holds a non-array where a list is required.
    #[error("existing `{field}` is not an array")]
    NotAnArray { field: String },
}

// ── Record identity ───────────────────────────────────────────────────────────

/// Returns `true` if `existing` is an object whose values at every identity
/// field equal the incoming record's.
///
/// A field absent from both records counts as equal.  Non-object values never
/// match.
pub fn identity_matches(existing: &Value, incoming: &Map<String, Value>, identity: &[&str]) -> bool {
    match existing.as_object() {
        Some(record) => identity
            .iter()
            .all(|field| record.get(*field) == incoming.get(*field)),
        None => false,
    }
}

/// Returns the index of the first record in `records` that matches `incoming`
/// on `identity`.
pub fn find_record(
    records: &[Value],
    incoming: &Map<String, Value>,
    identity: &[&str],
) -> Option<usize> {
    records
        .iter()
        .position(|existing| identity_matches(existing, incoming, identity))
}

// ── Name-keyed list merge ─────────────────────────────────────────────────────

/// Merges `incoming` records into `existing`, keyed by the string at `key`.
///
/// Every incoming record is validated before `existing` is touched, so an
/// error leaves the list unchanged.
///
/// Returns `true` if the list changed.
///
/// # Errors
///
/// Returns [`MergeError::MissingIdentity`] if an incoming record is not an
/// object with a string value at `key`.
pub fn merge_named(
    existing: &mut Vec<Value>,
    incoming: Vec<Value>,
    key: &str,
) -> Result<bool, MergeError> {
    for (index, record) in incoming.iter().enumerate() {
        if record.get(key).and_then(Value::as_str).is_none() {
            return Err(MergeError::MissingIdentity {
                index,
                field: key.to_string(),
            });
        }
    }

    let mut changed = false;
    for record in incoming {
        let name = record.get(key).cloned();
        let position = existing
            .iter()
            .position(|e| e.is_object() && e.get(key) == name.as_ref());
        match position {
            Some(i) => {
                if existing[i] != record {
                    existing[i] = record;
                    changed = true;
                }
            }
            None => {
                existing.push(record);
                changed = true;
            }
        }
    }
    Ok(changed)
}

// ── Recursive object merge ────────────────────────────────────────────────────

/// Recursively merges `updates` into `target`.
///
/// Objects merge key by key; every other incoming value (arrays included)
/// replaces the existing value.  Returns `true` if `target` changed.
pub fn deep_merge(target: &mut Map<String, Value>, updates: Map<String, Value>) -> bool {
    let mut changed = false;
    for (key, incoming) in updates {
        match target.get_mut(&key) {
            Some(Value::Object(existing)) if incoming.is_object() => {
                if let Value::Object(nested) = incoming {
                    changed |= deep_merge(existing, nested);
                }
            }
            Some(existing) => {
                if *existing != incoming {
                    *existing = incoming;
                    changed = true;
                }
            }
            None => {
                target.insert(key, incoming);
                changed = true;
            }
        }
    }
    changed
}

// ── Terminal document merge ───────────────────────────────────────────────────

/// Applies `updates` to a terminal configuration document.
///
/// If `updates` carries a `schemes` array it is merged by scheme name and
/// removed from `updates`; the rest is deep-merged.  A `schemes` value that is
/// not an array is not special: it replaces the existing value like any other
/// leaf.
///
/// Returns `true` if the document changed.
///
/// # Errors
///
/// - [`MergeError::MissingIdentity`] if an incoming scheme has no `name`.
/// - [`MergeError::NotAnArray`] if the document's existing `schemes` is not an
///   array while the update carries one.
///
/// On error the document is left unchanged.
pub fn apply_terminal_updates(
    document: &mut Map<String, Value>,
    mut updates: Map<String, Value>,
) -> Result<bool, MergeError> {
    let mut changed = false;

    if matches!(updates.get(SCHEMES_FIELD), Some(Value::Array(_))) {
        let incoming = match updates.remove(SCHEMES_FIELD) {
            Some(Value::Array(list)) => list,
            _ => Vec::new(),
        };

        let mut schemes = match document.get(SCHEMES_FIELD) {
            Some(Value::Array(list)) => list.clone(),
            Some(_) => {
                return Err(MergeError::NotAnArray {
                    field: SCHEMES_FIELD.to_string(),
                })
            }
            None => Vec::new(),
        };
        let had_field = document.contains_key(SCHEMES_FIELD);

        if merge_named(&mut schemes, incoming, SCHEME_NAME_FIELD)? || !had_field {
            document.insert(SCHEMES_FIELD.to_string(), Value::Array(schemes));
            changed = true;
        }
    }

    changed |= deep_merge(document, updates);
    Ok(changed)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    // ── identity ──────────────────────────────────────────────────────────────

    #[test]
    fn test_identity_matches_on_key_and_command() {
        // Arrange
        let existing = json!({"key": "ctrl+k", "command": "foo", "when": "editorFocus"});
        let incoming = obj(json!({"key": "ctrl+k", "command": "foo"}));

        // Act / Assert
        assert!(identity_matches(&existing, &incoming, &["key", "command"]));
    }

    #[test]
    fn test_identity_differs_when_command_differs() {
        let existing = json!({"key": "ctrl+k", "command": "foo"});
        let incoming = obj(json!({"key": "ctrl+k", "command": "bar"}));
        assert!(!identity_matches(&existing, &incoming, &["key", "command"]));
    }

    #[test]
    fn test_identity_ignores_non_identity_fields() {
        let existing = json!({"key": "ctrl+k", "command": "foo", "when": "a"});
        let incoming = obj(json!({"key": "ctrl+k", "command": "foo", "when": "b"}));
        assert!(identity_matches(&existing, &incoming, &["key", "command"]));
    }

    #[test]
    fn test_identity_never_matches_non_object() {
        let incoming = obj(json!({"key": "ctrl+k"}));
        assert!(!identity_matches(&json!("ctrl+k"), &incoming, &["key"]));
        assert!(!identity_matches(&json!(null), &incoming, &["key"]));
    }

    #[test]
    fn test_find_record_returns_first_match() {
        let records = vec![
            json!({"key": "a", "command": "x"}),
            json!({"key": "b", "command": "y"}),
            json!({"key": "b", "command": "y", "when": "dup"}),
        ];
        let incoming = obj(json!({"key": "b", "command": "y"}));
        assert_eq!(find_record(&records, &incoming, &["key", "command"]), Some(1));
    }

    // ── merge_named ───────────────────────────────────────────────────────────

    #[test]
    fn test_merge_named_replaces_in_place() {
        // Arrange
        let mut existing = vec![
            json!({"name": "Campbell", "background": "#0C0C0C"}),
            json!({"name": "Dark", "background": "#111"}),
            json!({"name": "One Half", "background": "#282C34"}),
        ];

        // Act
        let changed = merge_named(
            &mut existing,
            vec![json!({"name": "Dark", "background": "#000"})],
            "name",
        )
        .unwrap();

        // Assert
        assert!(changed);
        assert_eq!(existing.len(), 3);
        assert_eq!(existing[1], json!({"name": "Dark", "background": "#000"}));
        assert_eq!(existing[0]["name"], "Campbell");
        assert_eq!(existing[2]["name"], "One Half");
    }

    #[test]
    fn test_merge_named_appends_new_name() {
        let mut existing = vec![json!({"name": "Dark", "background": "#111"})];
        merge_named(
            &mut existing,
            vec![json!({"name": "Light", "background": "#fff"})],
            "name",
        )
        .unwrap();
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[1]["name"], "Light");
    }

    #[test]
    fn test_merge_named_identical_record_reports_no_change() {
        let mut existing = vec![json!({"name": "Dark", "background": "#000"})];
        let changed = merge_named(
            &mut existing,
            vec![json!({"name": "Dark", "background": "#000"})],
            "name",
        )
        .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_merge_named_rejects_record_without_name_and_leaves_list() {
        // Arrange
        let mut existing = vec![json!({"name": "Dark"})];
        let before = existing.clone();

        // Act
        let result = merge_named(
            &mut existing,
            vec![json!({"name": "Light"}), json!({"background": "#fff"})],
            "name",
        );

        // Assert: validation runs before any mutation
        assert_eq!(
            result,
            Err(MergeError::MissingIdentity {
                index: 1,
                field: "name".into()
            })
        );
        assert_eq!(existing, before);
    }

    #[test]
    fn test_merge_named_rejects_non_string_name() {
        let mut existing = Vec::new();
        let result = merge_named(&mut existing, vec![json!({"name": 7})], "name");
        assert!(result.is_err());
    }

    // ── deep_merge ────────────────────────────────────────────────────────────

    #[test]
    fn test_deep_merge_preserves_siblings() {
        // Arrange
        let mut doc = obj(json!({
            "profiles": {"defaults": {"font": {"face": "A", "size": 11}, "opacity": 90}},
            "other": "x"
        }));
        let updates = obj(json!({"profiles": {"defaults": {"font": {"face": "B"}}}}));

        // Act
        let changed = deep_merge(&mut doc, updates);

        // Assert
        assert!(changed);
        assert_eq!(
            Value::Object(doc),
            json!({
                "profiles": {"defaults": {"font": {"face": "B", "size": 11}, "opacity": 90}},
                "other": "x"
            })
        );
    }

    #[test]
    fn test_deep_merge_replaces_arrays_wholesale() {
        let mut doc = obj(json!({"profiles": {"list": [{"name": "cmd"}, {"name": "pwsh"}]}}));
        deep_merge(&mut doc, obj(json!({"profiles": {"list": [{"name": "zsh"}]}})));
        assert_eq!(doc["profiles"]["list"], json!([{"name": "zsh"}]));
    }

    #[test]
    fn test_deep_merge_object_replaces_scalar() {
        let mut doc = obj(json!({"font": "Consolas"}));
        deep_merge(&mut doc, obj(json!({"font": {"face": "Cascadia Mono NF"}})));
        assert_eq!(doc["font"], json!({"face": "Cascadia Mono NF"}));
    }

    #[test]
    fn test_deep_merge_scalar_replaces_object() {
        let mut doc = obj(json!({"font": {"face": "A"}}));
        deep_merge(&mut doc, obj(json!({"font": null})));
        assert_eq!(doc["font"], Value::Null);
    }

    #[test]
    fn test_deep_merge_same_values_reports_no_change() {
        let mut doc = obj(json!({"a": {"b": 1}}));
        assert!(!deep_merge(&mut doc, obj(json!({"a": {"b": 1}}))));
    }

    #[test]
    fn test_deep_merge_inserts_new_keys_at_end() {
        let mut doc = obj(json!({"z": 1, "a": 2}));
        deep_merge(&mut doc, obj(json!({"m": 3})));
        let keys: Vec<&String> = doc.keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    // ── apply_terminal_updates ────────────────────────────────────────────────

    #[test]
    fn test_terminal_updates_merge_schemes_and_profiles_together() {
        // Arrange
        let mut doc = obj(json!({
            "defaultProfile": "{guid}",
            "profiles": {"defaults": {}, "list": [{"name": "cmd"}]},
            "schemes": [{"name": "Dark", "background": "#111"}]
        }));
        let updates = obj(json!({
            "defaultProfile": "PowerShell",
            "profiles": {"defaults": {"font": {"face": "Cascadia Mono NF"}}},
            "schemes": [
                {"name": "Dark", "background": "#000"},
                {"name": "Light", "background": "#fff"}
            ]
        }));

        // Act
        let changed = apply_terminal_updates(&mut doc, updates).unwrap();

        // Assert
        assert!(changed);
        assert_eq!(doc["defaultProfile"], "PowerShell");
        assert_eq!(doc["profiles"]["list"], json!([{"name": "cmd"}]));
        assert_eq!(doc["profiles"]["defaults"]["font"]["face"], "Cascadia Mono NF");
        assert_eq!(
            doc["schemes"],
            json!([
                {"name": "Dark", "background": "#000"},
                {"name": "Light", "background": "#fff"}
            ])
        );
    }

    #[test]
    fn test_terminal_updates_create_schemes_when_absent() {
        let mut doc = obj(json!({"profiles": {}}));
        let changed =
            apply_terminal_updates(&mut doc, obj(json!({"schemes": [{"name": "Gruvbox"}]})))
                .unwrap();
        assert!(changed);
        assert_eq!(doc["schemes"], json!([{"name": "Gruvbox"}]));
    }

    #[test]
    fn test_terminal_updates_empty_schemes_creates_empty_list() {
        let mut doc = Map::new();
        let changed = apply_terminal_updates(&mut doc, obj(json!({"schemes": []}))).unwrap();
        assert!(changed);
        assert_eq!(doc["schemes"], json!([]));
    }

    #[test]
    fn test_terminal_updates_reject_existing_non_array_schemes() {
        // Arrange
        let mut doc = obj(json!({"schemes": {"Dark": {}}, "other": 1}));
        let before = doc.clone();

        // Act
        let result = apply_terminal_updates(
            &mut doc,
            obj(json!({"schemes": [{"name": "Dark"}], "other": 2})),
        );

        // Assert
        assert!(matches!(result, Err(MergeError::NotAnArray { .. })));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_terminal_updates_reject_nameless_scheme_without_touching_profiles() {
        let mut doc = obj(json!({"defaultProfile": "cmd", "schemes": []}));
        let before = doc.clone();
        let result = apply_terminal_updates(
            &mut doc,
            obj(json!({"defaultProfile": "pwsh", "schemes": [{"background": "#000"}]})),
        );
        assert!(result.is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_terminal_updates_second_application_is_no_change() {
        let updates = json!({
            "profiles": {"defaults": {"font": {"face": "Cascadia Mono NF"}}},
            "schemes": [{"name": "Dark", "background": "#000"}]
        });
        let mut doc = Map::new();
        assert!(apply_terminal_updates(&mut doc, obj(updates.clone())).unwrap());
        assert!(!apply_terminal_updates(&mut doc, obj(updates)).unwrap());
    }
}
