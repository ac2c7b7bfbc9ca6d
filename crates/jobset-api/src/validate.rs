//! Cross-field validation of a constructed JobSet.
//!
//! Construction only checks shape. Everything that needs more than one field
//! at a time (name references, uniqueness, counter relationships) lives here.
//! Every violation is collected; nothing short-circuits and the input is never
//! touched.
//!
//! Report order is fixed: failure policy, replicated jobs, coordinator,
//! success policy, TTL, then status.

use std::collections::HashSet;

use jobset_core::{FieldPath, ValidationError, Violations};

use crate::jobset::{JobSet, JobSetSpec, JobSetStatus};

/// Knobs for [`validate_with`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Check the observed status as well as the spec
    pub check_status: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self { check_status: true }
    }
}

/// Validate with default options.
pub fn validate(job_set: &JobSet) -> Result<(), Violations> {
    validate_with(job_set, &ValidateOptions::default())
}

pub fn validate_with(job_set: &JobSet, options: &ValidateOptions) -> Result<(), Violations> {
    let mut checker = Checker::new(&job_set.spec);
    checker.failure_policy();
    checker.replicated_jobs();
    checker.coordinator();
    checker.success_policy();
    checker.ttl();
    if options.check_status {
        if let Some(status) = &job_set.status {
            checker.status(status);
        }
    }

    let violations = checker.finish();
    if !violations.is_empty() {
        tracing::debug!(
            name = job_set.metadata.name.as_deref().unwrap_or_default(),
            violations = violations.len(),
            "JobSet failed validation"
        );
    }
    violations.into_result()
}

impl JobSet {
    /// See [`validate`]
    pub fn validate(&self) -> Result<(), Violations> {
        validate(self)
    }
}

fn non_negative(value: i32, path: FieldPath, out: &mut Violations) {
    if value < 0 {
        out.push(ValidationError::range(
            path,
            format!("must be non-negative, got {value}"),
        ));
    }
}

struct Checker<'a> {
    spec: &'a JobSetSpec,
    names: HashSet<&'a str>,
    root: FieldPath,
    out: Violations,
}

impl<'a> Checker<'a> {
    fn new(spec: &'a JobSetSpec) -> Self {
        Self {
            spec,
            names: spec.replicated_jobs.iter().map(|r| r.name.as_str()).collect(),
            root: FieldPath::root().key("spec"),
            out: Violations::new(),
        }
    }

    fn finish(self) -> Violations {
        self.out
    }

    /// One violation per target that names no replicated job, duplicates included.
    fn targets(&mut self, targets: &[String], path: FieldPath) {
        for (i, target) in targets.iter().enumerate() {
            if !self.names.contains(target.as_str()) {
                self.out.push(ValidationError::dangling(path.index(i), target.clone()));
            }
        }
    }

    fn failure_policy(&mut self) {
        let spec = self.spec;
        let Some(policy) = &spec.failure_policy else {
            return;
        };
        let path = self.root.key("failurePolicy");
        non_negative(policy.max_restarts, path.key("maxRestarts"), &mut self.out);

        let mut rule_names = HashSet::new();
        for (i, rule) in policy.rules.iter().enumerate() {
            let rule_path = path.key("rules").index(i);
            if let Some(name) = &rule.name {
                if !rule_names.insert(name.as_str()) {
                    self.out.push(ValidationError::duplicate(rule_path.key("name"), name.clone()));
                }
            }
            self.targets(&rule.target_replicated_jobs, rule_path.key("targetReplicatedJobs"));
        }
    }

    fn replicated_jobs(&mut self) {
        let path = self.root.key("replicatedJobs");
        let mut seen = HashSet::new();
        for (i, rjob) in self.spec.replicated_jobs.iter().enumerate() {
            if !seen.insert(rjob.name.as_str()) {
                self.out.push(ValidationError::duplicate(
                    path.index(i).key("name"),
                    rjob.name.clone(),
                ));
            }
        }
        for (i, rjob) in self.spec.replicated_jobs.iter().enumerate() {
            if rjob.replicas < 1 {
                self.out.push(ValidationError::range(
                    path.index(i).key("replicas"),
                    format!("must be at least 1, got {}", rjob.replicas),
                ));
            }
        }
    }

    fn coordinator(&mut self) {
        let Some(coordinator) = &self.spec.coordinator else {
            return;
        };
        let path = self.root.key("coordinator");
        match self.spec.replicated_job(&coordinator.replicated_job) {
            None => self.out.push(ValidationError::dangling(
                path.key("replicatedJob"),
                coordinator.replicated_job.clone(),
            )),
            Some(rjob) => {
                if coordinator.job_index < 0 || coordinator.job_index >= rjob.replicas {
                    self.out.push(ValidationError::range(
                        path.key("jobIndex"),
                        format!(
                            "must be in [0, {}) for replicated job '{}', got {}",
                            rjob.replicas, rjob.name, coordinator.job_index
                        ),
                    ));
                }
            }
        }
        non_negative(coordinator.pod_index, path.key("podIndex"), &mut self.out);
    }

    fn success_policy(&mut self) {
        let spec = self.spec;
        if let Some(policy) = &spec.success_policy {
            let path = self.root.key("successPolicy").key("targetReplicatedJobs");
            self.targets(&policy.target_replicated_jobs, path);
        }
    }

    fn ttl(&mut self) {
        if let Some(ttl) = self.spec.ttl_seconds_after_finished {
            non_negative(ttl, self.root.key("ttlSecondsAfterFinished"), &mut self.out);
        }
    }

    fn status(&mut self, status: &JobSetStatus) {
        let path = FieldPath::root().key("status");
        non_negative(status.restarts, path.key("restarts"), &mut self.out);
        non_negative(
            status.restarts_count_towards_max,
            path.key("restartsCountTowardsMax"),
            &mut self.out,
        );
        if status.restarts_count_towards_max > status.restarts {
            self.out.push(ValidationError::range(
                path.key("restartsCountTowardsMax"),
                format!(
                    "must not exceed restarts ({}), got {}",
                    status.restarts, status.restarts_count_towards_max
                ),
            ));
        }

        for (i, rjs) in status.replicated_jobs_status.iter().enumerate() {
            let rjs_path = path.key("replicatedJobsStatus").index(i);
            for (field, value) in [
                ("active", rjs.active),
                ("failed", rjs.failed),
                ("ready", rjs.ready),
                ("succeeded", rjs.succeeded),
                ("suspended", rjs.suspended),
            ] {
                non_negative(value, rjs_path.key(field), &mut self.out);
            }
        }
    }
}
