//! Per-replicated-job counters derived from the child Jobs a JobSet owns.

use k8s_openapi::api::batch::v1::Job;

use crate::conditions::CONDITION_TRUE;
use crate::jobset::{JobSet, ReplicatedJobStatus};
use crate::naming::REPLICATED_JOB_NAME_KEY;

pub const JOB_COMPLETE: &str = "Complete";
pub const JOB_FAILED: &str = "Failed";

/// Snapshot of a JobSet's child Jobs, bucketed by lifecycle.
#[derive(Clone, Debug, Default)]
pub struct ChildJobs {
    pub active: Vec<Job>,
    pub successful: Vec<Job>,
    pub failed: Vec<Job>,
    /// Marked for deletion; not counted
    pub delete: Vec<Job>,
}

impl ChildJobs {
    /// Sort Jobs into buckets by their finishing condition.
    pub fn classify(jobs: impl IntoIterator<Item = Job>) -> Self {
        let mut children = Self::default();
        for job in jobs {
            if job.metadata.deletion_timestamp.is_some() {
                children.delete.push(job);
                continue;
            }
            match job_finished(&job) {
                Some(JOB_COMPLETE) => children.successful.push(job),
                Some(_) => children.failed.push(job),
                None => children.active.push(job),
            }
        }
        children
    }

    /// Whether a Job with this name exists in any bucket, including those
    /// marked for deletion.
    pub fn contains(&self, name: &str) -> bool {
        [&self.active, &self.successful, &self.failed, &self.delete]
            .into_iter()
            .flatten()
            .any(|job| job.metadata.name.as_deref() == Some(name))
    }
}

/// The finishing condition type (`Complete` or `Failed`) if the Job has one set to "True".
pub fn job_finished(job: &Job) -> Option<&'static str> {
    let conditions = job.status.as_ref()?.conditions.as_ref()?;
    conditions
        .iter()
        .filter(|c| c.status == CONDITION_TRUE)
        .find_map(|c| match c.type_.as_str() {
            JOB_COMPLETE => Some(JOB_COMPLETE),
            JOB_FAILED => Some(JOB_FAILED),
            _ => None,
        })
}

fn replicated_job_of(job: &Job) -> Option<&str> {
    job.metadata
        .labels
        .as_ref()?
        .get(REPLICATED_JOB_NAME_KEY)
        .map(String::as_str)
}

/// A Job is ready once its ready and succeeded pods cover
/// `min(parallelism, completions)`.
fn job_ready(job: &Job) -> bool {
    let spec = job.spec.as_ref();
    let parallelism = spec.and_then(|s| s.parallelism).unwrap_or(1);
    let completions = spec.and_then(|s| s.completions).unwrap_or(parallelism);
    let status = job.status.as_ref();
    let ready = status.and_then(|s| s.ready).unwrap_or(0);
    let succeeded = status.and_then(|s| s.succeeded).unwrap_or(0);
    ready + succeeded >= parallelism.min(completions)
}

/// One status entry per replicated job, in spec order. A child Job counts
/// toward the first replicated job carrying its label's name, so a repeated
/// name (which validation rejects) keeps its entry but collects no counts.
/// Jobs whose label names nothing in the spec are ignored.
pub fn calculate_replicated_job_statuses(
    job_set: &JobSet,
    children: &ChildJobs,
) -> Vec<ReplicatedJobStatus> {
    let rjobs = &job_set.spec.replicated_jobs;
    let mut statuses: Vec<ReplicatedJobStatus> = rjobs
        .iter()
        .map(|rjob| ReplicatedJobStatus {
            name: rjob.name.clone(),
            ..Default::default()
        })
        .collect();
    let position = |job: &Job| {
        let name = replicated_job_of(job)?;
        rjobs.iter().position(|rjob| rjob.name == name)
    };

    for job in &children.active {
        let Some(i) = position(job) else {
            continue;
        };
        let entry = &mut statuses[i];
        if job.spec.as_ref().and_then(|s| s.suspend).unwrap_or(false) {
            entry.suspended += 1;
            continue;
        }
        if job_ready(job) {
            entry.ready += 1;
        }
        if job.status.as_ref().and_then(|s| s.active).unwrap_or(0) > 0 {
            entry.active += 1;
        }
    }
    for i in children.successful.iter().filter_map(position) {
        statuses[i].succeeded += 1;
    }
    for i in children.failed.iter().filter_map(position) {
        statuses[i].failed += 1;
    }
    statuses
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::batch::v1::{JobCondition, JobSpec, JobStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    use super::*;

    fn job_set(suspend: bool) -> JobSet {
        JobSet::try_from(&json!({
            "metadata": {"name": "test-jobset"},
            "spec": {
                "suspend": suspend,
                "replicatedJobs": [
                    {"name": "replicated-job-1", "replicas": 1, "template": {}},
                    {"name": "replicated-job-2", "replicas": 3, "template": {}}
                ]
            }
        }))
        .unwrap()
    }

    /// Builder for child Jobs in the shape the controller would see them.
    struct JobBuilder(Job);

    impl JobBuilder {
        fn new(rjob: &str) -> Self {
            Self(Job {
                metadata: ObjectMeta {
                    labels: Some(BTreeMap::from([(
                        REPLICATED_JOB_NAME_KEY.to_string(),
                        rjob.to_string(),
                    )])),
                    ..Default::default()
                },
                spec: Some(JobSpec::default()),
                status: Some(JobStatus::default()),
            })
        }

        fn spec(mut self, f: impl FnOnce(&mut JobSpec)) -> Self {
            f(self.0.spec.as_mut().unwrap());
            self
        }

        fn status(mut self, f: impl FnOnce(&mut JobStatus)) -> Self {
            f(self.0.status.as_mut().unwrap());
            self
        }

        fn parallelism(self, n: i32) -> Self {
            self.spec(|s| s.parallelism = Some(n))
        }

        fn completions(self, n: i32) -> Self {
            self.spec(|s| s.completions = Some(n))
        }

        fn suspend(self) -> Self {
            self.spec(|s| s.suspend = Some(true))
        }

        fn ready(self, n: i32) -> Self {
            self.status(|s| s.ready = Some(n))
        }

        fn succeeded(self, n: i32) -> Self {
            self.status(|s| s.succeeded = Some(n))
        }

        fn active(self, n: i32) -> Self {
            self.status(|s| s.active = Some(n))
        }

        fn condition(self, type_: &str) -> Self {
            self.status(|s| {
                s.conditions = Some(vec![JobCondition {
                    type_: type_.to_string(),
                    status: CONDITION_TRUE.to_string(),
                    ..Default::default()
                }])
            })
        }

        fn build(self) -> Job {
            self.0
        }
    }

    fn expect(name: &str, f: impl FnOnce(&mut ReplicatedJobStatus)) -> ReplicatedJobStatus {
        let mut status = ReplicatedJobStatus {
            name: name.to_string(),
            ..Default::default()
        };
        f(&mut status);
        status
    }

    #[test]
    fn partial_jobs_ready_no_succeeded() {
        let children = ChildJobs {
            active: vec![
                JobBuilder::new("replicated-job-1").parallelism(1).completions(2).ready(1).succeeded(1).build(),
                JobBuilder::new("replicated-job-2").parallelism(5).ready(2).succeeded(3).build(),
                JobBuilder::new("replicated-job-2").parallelism(3).completions(2).ready(1).succeeded(1).build(),
                JobBuilder::new("replicated-job-2").parallelism(2).completions(3).ready(2).succeeded(1).build(),
                JobBuilder::new("replicated-job-2").parallelism(4).completions(5).ready(2).succeeded(1).build(),
            ],
            ..Default::default()
        };
        assert_eq!(
            calculate_replicated_job_statuses(&job_set(false), &children),
            [
                expect("replicated-job-1", |s| s.ready = 1),
                expect("replicated-job-2", |s| s.ready = 3),
            ]
        );
    }

    #[test]
    fn no_jobs_created() {
        assert_eq!(
            calculate_replicated_job_statuses(&job_set(false), &ChildJobs::default()),
            [expect("replicated-job-1", |_| {}), expect("replicated-job-2", |_| {})]
        );
    }

    #[test]
    fn partial_jobs_created() {
        let children = ChildJobs {
            active: vec![JobBuilder::new("replicated-job-2").parallelism(5).ready(2).succeeded(3).build()],
            ..Default::default()
        };
        assert_eq!(
            calculate_replicated_job_statuses(&job_set(false), &children),
            [expect("replicated-job-1", |_| {}), expect("replicated-job-2", |s| s.ready = 1)]
        );
    }

    #[test]
    fn repeated_names_keep_one_entry_each() {
        let js = JobSet::try_from(&json!({
            "spec": {"replicatedJobs": [
                {"name": "w", "template": {}},
                {"name": "w", "template": {}}
            ]}
        }))
        .unwrap();
        let children = ChildJobs {
            successful: vec![JobBuilder::new("w").build()],
            ..Default::default()
        };
        assert_eq!(
            calculate_replicated_job_statuses(&js, &children),
            [expect("w", |s| s.succeeded = 1), expect("w", |_| {})]
        );
    }

    #[test]
    fn contains_checks_every_bucket() {
        let named = |name: &str| {
            let mut job = JobBuilder::new("a").build();
            job.metadata.name = Some(name.to_string());
            job
        };
        let children = ChildJobs {
            active: vec![named("a-0")],
            successful: vec![named("a-1")],
            failed: vec![named("a-2")],
            delete: vec![named("a-3")],
        };
        for name in ["a-0", "a-1", "a-2", "a-3"] {
            assert!(children.contains(name), "{name}");
        }
        assert!(!children.contains("a-4"));
    }

    #[test]
    fn only_succeeded_and_failed_jobs() {
        let children = ChildJobs {
            successful: vec![
                JobBuilder::new("replicated-job-2").build(),
                JobBuilder::new("replicated-job-1").build(),
            ],
            failed: vec![
                JobBuilder::new("replicated-job-1").build(),
                JobBuilder::new("replicated-job-1").build(),
            ],
            ..Default::default()
        };
        assert_eq!(
            calculate_replicated_job_statuses(&job_set(false), &children),
            [
                expect("replicated-job-1", |s| {
                    s.succeeded = 1;
                    s.failed = 2;
                }),
                expect("replicated-job-2", |s| s.succeeded = 1),
            ]
        );
    }

    #[test]
    fn active_jobs() {
        let children = ChildJobs {
            active: vec![
                JobBuilder::new("replicated-job-1").parallelism(5).active(1).build(),
                JobBuilder::new("replicated-job-2").parallelism(5).build(),
                JobBuilder::new("replicated-job-2").parallelism(1).active(1).build(),
            ],
            ..Default::default()
        };
        assert_eq!(
            calculate_replicated_job_statuses(&job_set(false), &children),
            [
                expect("replicated-job-1", |s| s.active = 1),
                expect("replicated-job-2", |s| s.active = 1),
            ]
        );
    }

    #[test]
    fn suspended_jobs() {
        let children = ChildJobs {
            active: vec![
                JobBuilder::new("replicated-job-1").parallelism(5).suspend().build(),
                JobBuilder::new("replicated-job-2").parallelism(5).build(),
                JobBuilder::new("replicated-job-2").parallelism(1).suspend().build(),
            ],
            ..Default::default()
        };
        assert_eq!(
            calculate_replicated_job_statuses(&job_set(true), &children),
            [
                expect("replicated-job-1", |s| s.suspended = 1),
                expect("replicated-job-2", |s| s.suspended = 1),
            ]
        );
    }

    #[test]
    fn unknown_replicated_job_label_is_ignored() {
        let children = ChildJobs {
            successful: vec![JobBuilder::new("other").build()],
            ..Default::default()
        };
        let statuses = calculate_replicated_job_statuses(&job_set(false), &children);
        assert!(statuses.iter().all(|s| s.succeeded == 0));
    }

    #[test]
    fn job_finished_reads_true_conditions() {
        assert_eq!(job_finished(&JobBuilder::new("a").condition("Complete").build()), Some(JOB_COMPLETE));
        assert_eq!(job_finished(&JobBuilder::new("a").condition("Failed").build()), Some(JOB_FAILED));
        assert_eq!(job_finished(&JobBuilder::new("a").condition("Suspended").build()), None);
        assert_eq!(job_finished(&JobBuilder::new("a").condition("FailureTarget").build()), None);
        assert_eq!(job_finished(&JobBuilder::new("a").build()), None);
    }

    #[test]
    fn classify_buckets_by_condition() {
        let children = ChildJobs::classify([
            JobBuilder::new("a").condition("Complete").build(),
            JobBuilder::new("a").condition("Failed").build(),
            JobBuilder::new("a").build(),
        ]);
        assert_eq!(children.successful.len(), 1);
        assert_eq!(children.failed.len(), 1);
        assert_eq!(children.active.len(), 1);
        assert!(children.delete.is_empty());
    }
}
