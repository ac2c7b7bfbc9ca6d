//! Construction of JobSet values from decoded JSON/YAML.
//!
//! Each type reads its own fields through [`Fields`], so the first missing or
//! mis-shaped field is reported with its full path and nothing partially
//! built escapes.

use jobset_core::{FieldPath, Fields, FromValue, ValidationError};
use k8s_openapi::api::batch::v1::JobTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, ObjectMeta};
use kube::Resource;
use serde_json::Value;

use crate::jobset::{
    Coordinator, FailurePolicy, FailurePolicyRule, JobSet, JobSetSpec, JobSetStatus, Network,
    ReplicatedJob, ReplicatedJobStatus, StartupPolicy, SuccessPolicy,
};

/// `apiVersion`/`kind` may be omitted, but when present must name `expected`.
pub(crate) fn check_type_meta(
    fields: &Fields<'_>,
    key: &str,
    expected: &str,
) -> Result<(), ValidationError> {
    match fields.optional_string(key)? {
        Some(found) if found != expected => Err(ValidationError::mismatch(
            fields.field_path(key),
            format!("'{expected}'"),
            format!("'{found}'"),
        )),
        _ => Ok(()),
    }
}

impl FromValue for JobSet {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        check_type_meta(&fields, "apiVersion", &JobSet::api_version(&()))?;
        check_type_meta(&fields, "kind", &JobSet::kind(&()))?;

        let metadata: ObjectMeta = fields
            .opaque("metadata", "meta/v1 ObjectMeta")?
            .unwrap_or_default();
        let spec = fields.nested::<JobSetSpec>("spec")?;
        let status = fields.optional_nested::<JobSetStatus>("status")?;

        tracing::debug!(
            name = metadata.name.as_deref().unwrap_or_default(),
            replicated_jobs = spec.replicated_jobs.len(),
            "constructed JobSet"
        );

        Ok(JobSet {
            metadata,
            spec,
            status,
        })
    }
}

impl TryFrom<&Value> for JobSet {
    type Error = ValidationError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        JobSet::from_value(value, &FieldPath::root())
    }
}

impl FromValue for JobSetSpec {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            coordinator: fields.optional_nested("coordinator")?,
            failure_policy: fields.optional_nested("failurePolicy")?,
            managed_by: fields.optional_string("managedBy")?,
            network: fields.optional_nested("network")?,
            replicated_jobs: fields.non_empty_list("replicatedJobs")?,
            startup_policy: fields.optional_nested("startupPolicy")?,
            success_policy: fields.optional_nested("successPolicy")?,
            suspend: fields.optional_bool("suspend")?.unwrap_or(false),
            ttl_seconds_after_finished: fields.optional_i32("ttlSecondsAfterFinished")?,
        })
    }
}

impl FromValue for ReplicatedJob {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        let name = fields.required_string("name")?;
        let replicas = fields.optional_i32("replicas")?.unwrap_or(1);
        let template: JobTemplateSpec = fields
            .opaque("template", "batch/v1 JobTemplateSpec")?
            .ok_or_else(|| ValidationError::missing(fields.field_path("template")))?;
        Ok(Self {
            name,
            replicas,
            template,
        })
    }
}

impl FromValue for Coordinator {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            replicated_job: fields.required_string("replicatedJob")?,
            job_index: fields.optional_i32("jobIndex")?.unwrap_or(0),
            pod_index: fields.optional_i32("podIndex")?.unwrap_or(0),
        })
    }
}

impl FromValue for FailurePolicy {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            max_restarts: fields.optional_i32("maxRestarts")?.unwrap_or(0),
            rules: fields.list("rules")?,
        })
    }
}

impl FromValue for FailurePolicyRule {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            name: fields.optional_string("name")?,
            action: fields.required_enum("action")?,
            on_job_failure_reasons: fields.string_list("onJobFailureReasons")?,
            target_replicated_jobs: fields.string_list("targetReplicatedJobs")?,
        })
    }
}

impl FromValue for Network {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            enable_dns_hostnames: fields.optional_bool("enableDNSHostnames")?,
            publish_not_ready_addresses: fields.optional_bool("publishNotReadyAddresses")?,
            subdomain: fields.optional_string("subdomain")?,
        })
    }
}

impl FromValue for StartupPolicy {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            startup_policy_order: fields.required_enum("startupPolicyOrder")?,
        })
    }
}

impl FromValue for SuccessPolicy {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            operator: fields.required_enum("operator")?,
            target_replicated_jobs: fields.string_list("targetReplicatedJobs")?,
        })
    }
}

impl FromValue for JobSetStatus {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        let conditions: Vec<Condition> = fields
            .opaque("conditions", "list of meta/v1 Condition")?
            .unwrap_or_default();
        Ok(Self {
            conditions,
            replicated_jobs_status: fields.list("replicatedJobsStatus")?,
            restarts: fields.optional_i32("restarts")?.unwrap_or(0),
            restarts_count_towards_max: fields.optional_i32("restartsCountTowardsMax")?.unwrap_or(0),
            terminal_state: fields.optional_enum("terminalState")?,
        })
    }
}

impl FromValue for ReplicatedJobStatus {
    fn from_value(value: &Value, path: &FieldPath) -> Result<Self, ValidationError> {
        let fields = Fields::new(value, path)?;
        Ok(Self {
            name: fields.required_string("name")?,
            active: fields.optional_i32("active")?.unwrap_or(0),
            failed: fields.optional_i32("failed")?.unwrap_or(0),
            ready: fields.optional_i32("ready")?.unwrap_or(0),
            succeeded: fields.optional_i32("succeeded")?.unwrap_or(0),
            suspended: fields.optional_i32("suspended")?.unwrap_or(0),
        })
    }
}
