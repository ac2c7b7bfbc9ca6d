//! JobSet status conditions.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;

use crate::jobset::{JobSet, JobSetStatus};

/// Condition types set on a JobSet
pub mod types {
    /// All required child jobs finished successfully
    pub const COMPLETED: &str = "Completed";
    /// The JobSet failed and will not be restarted
    pub const FAILED: &str = "Failed";
    /// Child jobs are suspended
    pub const SUSPENDED: &str = "Suspended";
    /// An in-order startup is still creating replicated jobs
    pub const STARTUP_POLICY_IN_PROGRESS: &str = "StartupPolicyInProgress";
    /// An in-order startup has created every replicated job
    pub const STARTUP_POLICY_COMPLETED: &str = "StartupPolicyCompleted";
}

pub const CONDITION_TRUE: &str = "True";
pub const CONDITION_FALSE: &str = "False";

impl JobSetStatus {
    /// Condition of the given type, if present
    pub fn condition(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// True when a condition of the given type is present with status "True"
    pub fn has_true_condition(&self, type_: &str) -> bool {
        self.condition(type_)
            .is_some_and(|c| c.status == CONDITION_TRUE)
    }

    /// Record `new` and report whether the status changed.
    ///
    /// An existing condition of the same type is replaced only when its
    /// status, reason or message differ. A condition type not seen before is
    /// appended only when its status is "True".
    pub fn update_condition(&mut self, new: Condition) -> bool {
        let mut found = false;
        let mut changed = false;
        for current in self.conditions.iter_mut().filter(|c| c.type_ == new.type_) {
            found = true;
            if current.status != new.status
                || current.reason != new.reason
                || current.message != new.message
            {
                *current = new.clone();
                changed = true;
            }
        }

        if !found && new.status == CONDITION_TRUE {
            self.conditions.push(new);
            changed = true;
        }
        changed
    }
}

impl JobSet {
    /// A JobSet is finished once it has a terminal state or a true
    /// Completed/Failed condition.
    pub fn is_finished(&self) -> bool {
        self.status.as_ref().is_some_and(|status| {
            status.terminal_state.is_some()
                || status.has_true_condition(types::COMPLETED)
                || status.has_true_condition(types::FAILED)
        })
    }
}
