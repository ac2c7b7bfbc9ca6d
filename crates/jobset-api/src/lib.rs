//! Typed, validating model of the JobSet custom resource.
//!
//! - [`jobset`]: the CRD types
//! - [`construct`]: building them from decoded JSON/YAML with path-tagged errors
//! - [`validate`]: cross-field checks that report every violation at once
//! - [`list`]: the `JobSetList` wrapper
//! - [`conditions`], [`status`], [`naming`]: status bookkeeping shared with controllers
//! - [`children`]: the child Jobs a replicated job stamps out

pub mod children;
pub mod conditions;
pub mod construct;
pub mod jobset;
pub mod list;
pub mod naming;
pub mod status;
pub mod validate;

pub use jobset::{
    Coordinator, FailurePolicy, FailurePolicyAction, FailurePolicyRule, JobSet, JobSetSpec,
    JobSetStatus, Network, ReplicatedJob, ReplicatedJobStatus, StartupPolicy, StartupPolicyOrder,
    SuccessPolicy, SuccessPolicyOperator, TerminalState,
};
pub use children::construct_jobs_from_template;
pub use jobset_core::{FieldPath, FromValue, ValidationError, Violations};
pub use list::{ItemError, ItemViolations, JobSetList, ListError};
pub use validate::{validate, validate_with, ValidateOptions};
