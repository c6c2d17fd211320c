//! Query filters
//!
//! Field paths use dots (`roles.actor`). When a path step lands on an array
//! the remaining path is applied to every element, and a filter on an array
//! field matches when any element matches.

use super::{Document, ID_FIELD};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document
    All,
    /// Field value equals `value`
    Eq { field: String, value: Value },
    /// Field value is one of `values`
    In { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Match the document whose `_id` is `id`
    pub fn by_id(id: &str) -> Self {
        Filter::eq(ID_FIELD, id)
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => candidates(document, field)
                .into_iter()
                .any(|candidate| equals_or_contains(candidate, value)),
            Filter::In { field, values } => candidates(document, field).into_iter().any(|candidate| {
                values
                    .iter()
                    .any(|value| equals_or_contains(candidate, value))
            }),
        }
    }

    /// Ids to fetch directly when the filter only constrains `_id`.
    ///
    /// Returns `None` when a full scan is needed.
    pub(crate) fn id_lookup(&self) -> Option<Vec<&str>> {
        match self {
            Filter::Eq { field, value } if field == ID_FIELD => {
                Some(value.as_str().into_iter().collect())
            }
            Filter::In { field, values } if field == ID_FIELD => {
                Some(values.iter().filter_map(Value::as_str).collect())
            }
            _ => None,
        }
    }
}

fn equals_or_contains(candidate: &Value, value: &Value) -> bool {
    candidate == value
        || matches!(candidate, Value::Array(items) if items.iter().any(|item| item == value))
}

/// Collect every value reachable from `document` along the dotted `path`
fn candidates<'a>(document: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut steps = path.split('.');
    let mut out = Vec::new();
    if let Some(root) = steps.next().and_then(|head| document.get(head)) {
        let rest: Vec<&str> = steps.collect();
        descend(root, &rest, &mut out);
    }
    out
}

fn descend<'a>(value: &'a Value, path: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, rest)) = path.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Value::Object(map) => {
            if let Some(child) = map.get(*head) {
                descend(child, rest, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                descend(item, path, out);
            }
        }
        _ => {}
    }
}
