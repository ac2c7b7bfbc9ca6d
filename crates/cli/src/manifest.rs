use jobset_api::{JobSet, JobSetList, ListError, ValidationError};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A decoded manifest, before construction
pub enum Manifest {
    JobSet(Value),
    List(Value),
}

/// Outcome of constructing a manifest
pub enum Built {
    JobSet(Box<JobSet>),
    List(JobSetList),
}

#[derive(Debug)]
pub enum BuildError {
    JobSet(ValidationError),
    List(ListError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::JobSet(e) => write!(f, "{}", e),
            BuildError::List(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BuildError {}

/// Read a YAML or JSON file into a structured value.
pub fn read_manifest(path: &Path) -> Result<Manifest, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_manifest(&content)
}

pub fn parse_manifest(content: &str) -> Result<Manifest, Box<dyn std::error::Error>> {
    // YAML is a superset of JSON, so one decoder covers both
    let value: Value = serde_yaml::from_str(content)?;
    let is_list = value.get("kind").and_then(Value::as_str) == Some(jobset_api::list::LIST_KIND)
        || value.get("items").is_some_and(Value::is_array);
    Ok(if is_list {
        Manifest::List(value)
    } else {
        Manifest::JobSet(value)
    })
}

impl Manifest {
    pub fn build(&self) -> Result<Built, BuildError> {
        match self {
            Manifest::JobSet(value) => JobSet::try_from(value)
                .map(|js| Built::JobSet(Box::new(js)))
                .map_err(BuildError::JobSet),
            Manifest::List(value) => JobSetList::from_value(value)
                .map(Built::List)
                .map_err(BuildError::List),
        }
    }
}
