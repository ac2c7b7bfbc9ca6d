//! JobSet CRD types (`jobset.x-k8s.io/v1alpha2`)
//!
//! A JobSet groups one or more `ReplicatedJob`s, each stamping out `replicas`
//! copies of a batch/v1 Job template, together with the policies that decide
//! how the group starts, succeeds, fails and restarts.

use jobset_core::ClosedSet;
use k8s_openapi::api::batch::v1::JobTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the JobSet resource
pub const GROUP: &str = "jobset.x-k8s.io";
/// Served version of the JobSet resource
pub const VERSION: &str = "v1alpha2";

/// Implements `as_str`, `Display` and `ClosedSet` for a unit-only enum whose
/// wire spelling is the variant name.
macro_rules! wire_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant),)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ClosedSet for $ty {
            const VARIANTS: &'static [&'static str] = &[$(stringify!($variant)),+];

            fn parse(s: &str) -> Option<Self> {
                $(
                    if s == stringify!($variant) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }
    };
}

// =============================================================================
// Enumerations
// =============================================================================

/// What the controller does when a failure policy rule matches
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum FailurePolicyAction {
    /// Mark the whole JobSet failed
    FailJobSet,
    /// Recreate all child jobs, counting toward `maxRestarts`
    RestartJobSet,
    /// Recreate all child jobs without counting toward `maxRestarts`
    RestartJobSetAndIgnoreMaxRestarts,
}

wire_enum!(FailurePolicyAction {
    FailJobSet,
    RestartJobSet,
    RestartJobSetAndIgnoreMaxRestarts,
});

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum StartupPolicyOrder {
    /// Create every replicated job at once
    #[default]
    AnyOrder,
    /// Create replicated jobs in list order, each waiting for the previous to be ready
    InOrder,
}

wire_enum!(StartupPolicyOrder { AnyOrder, InOrder });

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum SuccessPolicyOperator {
    /// All targeted jobs must succeed
    #[default]
    All,
    /// Any single targeted job succeeding is enough
    Any,
}

wire_enum!(SuccessPolicyOperator { All, Any });

/// Final state of a finished JobSet
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum TerminalState {
    Completed,
    Failed,
}

wire_enum!(TerminalState { Completed, Failed });

// =============================================================================
// Spec
// =============================================================================

/// A named group of identical child jobs
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedJob {
    /// Unique within the JobSet; used to name and label child jobs
    pub name: String,

    /// Number of child jobs created from `template`
    #[serde(default = "default_one")]
    pub replicas: i32,

    /// Child job template, carried through untouched
    pub template: JobTemplateSpec,
}

fn default_one() -> i32 {
    1
}

/// Pod that other pods should treat as the coordinator (e.g. a rank-0 leader)
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinator {
    pub replicated_job: String,

    #[serde(default)]
    pub job_index: i32,

    #[serde(default)]
    pub pod_index: i32,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailurePolicy {
    /// Restarts allowed before the JobSet is marked failed
    #[serde(default)]
    pub max_restarts: i32,

    /// Evaluated in order; the first matching rule wins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<FailurePolicyRule>,
}

#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailurePolicyRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub action: FailurePolicyAction,

    /// Job failure reasons this rule matches; empty matches any reason
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_job_failure_reasons: Vec<String>,

    /// Replicated jobs this rule applies to; empty applies to all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_replicated_jobs: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    #[serde(
        rename = "enableDNSHostnames",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_dns_hostnames: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_not_ready_addresses: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartupPolicy {
    pub startup_policy_order: StartupPolicyOrder,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessPolicy {
    pub operator: SuccessPolicyOperator,

    /// Replicated jobs whose success counts; empty means all of them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_replicated_jobs: Vec<String>,
}

/// Desired state of a JobSet
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "jobset.x-k8s.io",
    version = "v1alpha2",
    kind = "JobSet",
    plural = "jobsets",
    namespaced,
    status = "JobSetStatus",
    derive = "PartialEq",
    printcolumn = r#"{"name":"TerminalState","type":"string","jsonPath":".status.terminalState"}"#,
    printcolumn = r#"{"name":"Restarts","type":"integer","jsonPath":".status.restarts"}"#,
    printcolumn = r#"{"name":"Suspended","type":"boolean","jsonPath":".spec.suspend"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct JobSetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinator: Option<Coordinator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,

    /// Controller responsible for this JobSet, when not the default one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,

    pub replicated_jobs: Vec<ReplicatedJob>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_policy: Option<StartupPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_policy: Option<SuccessPolicy>,

    #[serde(default)]
    pub suspend: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds_after_finished: Option<i32>,
}

impl JobSetSpec {
    /// Look up a replicated job by name
    pub fn replicated_job(&self, name: &str) -> Option<&ReplicatedJob> {
        self.replicated_jobs.iter().find(|rjob| rjob.name == name)
    }

    /// Total number of child jobs across all replicated jobs
    pub fn total_child_jobs(&self) -> i64 {
        self.replicated_jobs
            .iter()
            .map(|rjob| i64::from(rjob.replicas.max(0)))
            .sum()
    }
}

// =============================================================================
// Status
// =============================================================================

/// Observed child job counts for one replicated job
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplicatedJobStatus {
    pub name: String,
    #[serde(default)]
    pub active: i32,
    #[serde(default)]
    pub failed: i32,
    #[serde(default)]
    pub ready: i32,
    #[serde(default)]
    pub succeeded: i32,
    #[serde(default)]
    pub suspended: i32,
}

/// Observed state of a JobSet
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSetStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replicated_jobs_status: Vec<ReplicatedJobStatus>,

    /// Times the JobSet has been restarted
    #[serde(default)]
    pub restarts: i32,

    /// Restarts that count toward `failurePolicy.maxRestarts`
    #[serde(default)]
    pub restarts_count_towards_max: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_state: Option<TerminalState>,
}
