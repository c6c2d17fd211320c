//! Single-document update operators

use super::{Document, ID_FIELD};
use crate::{Error, Result};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// `$set`: overwrite top-level fields
    Set(Document),
    /// `$push` with `$each`: append every element
    Push { field: String, each: Vec<Value> },
    /// Append elements not already present. With `key`, presence is decided
    /// by comparing `element[key]` instead of the whole element.
    AddToSet {
        field: String,
        each: Vec<Value>,
        key: Option<String>,
    },
    /// `$pull`: remove every element matching `condition`
    Pull {
        field: String,
        condition: PullCondition,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullCondition {
    /// Element equals one of the values (`$in`)
    In(Vec<Value>),
    /// Element is an object whose `field` equals one of the values
    FieldIn { field: String, values: Vec<Value> },
}

impl Update {
    pub fn set(fields: Document) -> Self {
        Update::Set(fields)
    }

    pub fn push(field: impl Into<String>, each: Vec<Value>) -> Self {
        Update::Push {
            field: field.into(),
            each,
        }
    }

    pub fn add_to_set(field: impl Into<String>, each: Vec<Value>) -> Self {
        Update::AddToSet {
            field: field.into(),
            each,
            key: None,
        }
    }

    pub fn add_to_set_by_key(
        field: impl Into<String>,
        key: impl Into<String>,
        each: Vec<Value>,
    ) -> Self {
        Update::AddToSet {
            field: field.into(),
            each,
            key: Some(key.into()),
        }
    }

    pub fn pull_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Update::Pull {
            field: field.into(),
            condition: PullCondition::In(values),
        }
    }

    pub fn pull_where(
        field: impl Into<String>,
        key: impl Into<String>,
        values: Vec<Value>,
    ) -> Self {
        Update::Pull {
            field: field.into(),
            condition: PullCondition::FieldIn {
                field: key.into(),
                values,
            },
        }
    }

    /// Apply the update in place. Returns whether the document changed.
    pub fn apply(&self, document: &mut Document) -> Result<bool> {
        match self {
            Update::Set(fields) => {
                let mut changed = false;
                for (name, value) in fields {
                    if name == ID_FIELD {
                        if document.get(ID_FIELD) != Some(value) {
                            return Err(Error::Store(format!("field '{ID_FIELD}' is immutable")));
                        }
                        continue;
                    }
                    if document.get(name) != Some(value) {
                        document.insert(name.clone(), value.clone());
                        changed = true;
                    }
                }
                Ok(changed)
            }
            Update::Push { field, each } => {
                let items = array_field(document, field)?;
                items.extend(each.iter().cloned());
                Ok(!each.is_empty())
            }
            Update::AddToSet { field, each, key } => {
                let items = array_field(document, field)?;
                let before = items.len();
                for value in each {
                    let present = match key {
                        Some(key) => {
                            let wanted = value.get(key);
                            items.iter().any(|item| item.get(key) == wanted)
                        }
                        None => items.contains(value),
                    };
                    if !present {
                        items.push(value.clone());
                    }
                }
                Ok(items.len() != before)
            }
            Update::Pull { field, condition } => {
                let Some(existing) = document.get_mut(field) else {
                    return Ok(false);
                };
                let Value::Array(items) = existing else {
                    return Err(Error::Store(format!("cannot pull from non-array field '{field}'")));
                };
                let before = items.len();
                items.retain(|item| !condition.matches(item));
                Ok(items.len() != before)
            }
        }
    }
}

impl PullCondition {
    fn matches(&self, item: &Value) -> bool {
        match self {
            PullCondition::In(values) => values.contains(item),
            PullCondition::FieldIn { field, values } => item
                .get(field)
                .is_some_and(|candidate| values.contains(candidate)),
        }
    }
}

/// Borrow `field` as an array, creating it when missing
fn array_field<'a>(document: &'a mut Document, field: &str) -> Result<&'a mut Vec<Value>> {
    let slot = document
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    match slot {
        Value::Array(items) => Ok(items),
        _ => Err(Error::Store(format!("field '{field}' is not an array"))),
    }
}
