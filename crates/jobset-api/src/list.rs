//! `JobSetList`: an ordered list of JobSets as returned by a list call.

use jobset_core::{FieldPath, Fields, FromValue, ValidationError, Violations};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use kube::Resource;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::construct::check_type_meta;
use crate::jobset::JobSet;

/// Kind of the list wrapper on the wire
pub const LIST_KIND: &str = "JobSetList";

/// JobSets in server order, with the list-level type and metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSetList {
    api_version: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ListMeta>,
    items: Vec<JobSet>,
}

/// An item that could not be constructed, with its position in the input list.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[error("items[{index}]: {error}")]
pub struct ItemError {
    pub index: usize,
    pub error: ValidationError,
}

/// A list item that failed validation, with every violation found in it.
#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[error("items[{index}]: {violations}")]
pub struct ItemViolations {
    pub index: usize,
    pub violations: Violations,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ListError {
    /// The list envelope itself is malformed
    #[error("{0}")]
    Envelope(ValidationError),

    /// One or more items failed construction. Items that did construct are
    /// kept, paired with their original index.
    #[error("{} of {} item(s) failed construction", .failures.len(), .failures.len() + .valid.len())]
    Items {
        failures: Vec<ItemError>,
        valid: Vec<(usize, JobSet)>,
    },
}

impl ListError {
    /// Per-item failures, empty for envelope errors
    pub fn failures(&self) -> &[ItemError] {
        match self {
            Self::Envelope(_) => &[],
            Self::Items { failures, .. } => failures,
        }
    }

    /// Items that constructed successfully, with their original index
    pub fn valid_items(&self) -> impl Iterator<Item = (usize, &JobSet)> {
        let valid: &[(usize, JobSet)] = match self {
            Self::Envelope(_) => &[],
            Self::Items { valid, .. } => valid,
        };
        valid.iter().map(|(i, js)| (*i, js))
    }
}

impl JobSetList {
    /// Wrap already-constructed JobSets, keeping their order.
    pub fn new(items: Vec<JobSet>) -> Self {
        Self {
            api_version: JobSet::api_version(&()).into_owned(),
            kind: LIST_KIND.to_string(),
            metadata: None,
            items,
        }
    }

    pub fn with_metadata(mut self, metadata: ListMeta) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Construct a list from a decoded `JobSetList` object.
    ///
    /// Every item is attempted; failures are gathered with their index rather
    /// than stopping at the first one.
    pub fn from_value(value: &Value) -> Result<Self, ListError> {
        let root = FieldPath::root();
        let fields = Fields::new(value, &root).map_err(ListError::Envelope)?;
        check_type_meta(&fields, "apiVersion", &JobSet::api_version(&()))
            .map_err(ListError::Envelope)?;
        check_type_meta(&fields, "kind", LIST_KIND).map_err(ListError::Envelope)?;
        let metadata: Option<ListMeta> = fields
            .opaque("metadata", "meta/v1 ListMeta")
            .map_err(ListError::Envelope)?;
        let raw_items = match fields.required("items") {
            Ok(Value::Array(items)) => items.as_slice(),
            Ok(other) => {
                return Err(ListError::Envelope(ValidationError::mismatch(
                    fields.field_path("items"),
                    "array",
                    jobset_core::fields::shape(other),
                )));
            }
            Err(err) => return Err(ListError::Envelope(err)),
        };

        let items_path = fields.field_path("items");
        let mut valid = Vec::with_capacity(raw_items.len());
        let mut failures = Vec::new();
        for (index, raw) in raw_items.iter().enumerate() {
            match JobSet::from_value(raw, &items_path.index(index)) {
                Ok(js) => valid.push((index, js)),
                Err(error) => {
                    tracing::warn!(index, %error, "JobSetList item failed construction");
                    failures.push(ItemError { index, error });
                }
            }
        }

        if !failures.is_empty() {
            return Err(ListError::Items { failures, valid });
        }

        let items = valid.into_iter().map(|(_, js)| js).collect();
        Ok(Self {
            metadata,
            ..Self::new(items)
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn metadata(&self) -> Option<&ListMeta> {
        self.metadata.as_ref()
    }

    /// Items in list order. Each call starts a fresh pass over the same items.
    pub fn items(&self) -> std::slice::Iter<'_, JobSet> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&JobSet> {
        self.items.get(index)
    }

    pub fn into_items(self) -> Vec<JobSet> {
        self.items
    }

    /// Validate every item, reporting violations per index.
    pub fn validate(&self) -> Result<(), Vec<ItemViolations>> {
        let failed: Vec<ItemViolations> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(index, js)| {
                js.validate()
                    .err()
                    .map(|violations| ItemViolations { index, violations })
            })
            .collect();
        if failed.is_empty() { Ok(()) } else { Err(failed) }
    }
}

impl<'a> IntoIterator for &'a JobSetList {
    type Item = &'a JobSet;
    type IntoIter = std::slice::Iter<'a, JobSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}
