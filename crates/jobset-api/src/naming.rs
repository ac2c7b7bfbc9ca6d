//! Names, labels and annotations of the child Jobs a JobSet owns.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::jobset::{JobSet, ReplicatedJob};

pub const JOBSET_NAME_KEY: &str = "jobset.sigs.k8s.io/jobset-name";
pub const REPLICATED_JOB_NAME_KEY: &str = "jobset.sigs.k8s.io/replicatedjob-name";
pub const REPLICATED_JOB_REPLICAS_KEY: &str = "jobset.sigs.k8s.io/replicatedjob-replicas";
pub const JOB_INDEX_KEY: &str = "jobset.sigs.k8s.io/job-index";
pub const RESTARTS_KEY: &str = "jobset.sigs.k8s.io/restart-attempt";
/// Hash of `<namespace>/<job name>`, stable across restarts
pub const JOB_KEY: &str = "jobset.sigs.k8s.io/job-key";

/// Topology domain each child Job must occupy exclusively
pub const EXCLUSIVE_KEY: &str = "alpha.jobset.sigs.k8s.io/exclusive-topology";
/// Enforce exclusive placement with node selectors instead of affinities
pub const NODE_SELECTOR_STRATEGY_KEY: &str = "alpha.jobset.sigs.k8s.io/node-selector";
pub const NAMESPACED_JOB_KEY: &str = "alpha.jobset.sigs.k8s.io/namespaced-job";
pub const NO_SCHEDULE_TAINT_KEY: &str = "alpha.jobset.sigs.k8s.io/no-schedule";

// Label values are capped at 63 characters
const JOB_KEY_BYTES: usize = 20;

/// `<jobset>-<replicatedJob>-<index>`
pub fn child_job_name(job_set: &str, replicated_job: &str, index: i32) -> String {
    format!("{job_set}-{replicated_job}-{index}")
}

/// Every child Job name, replicated jobs in spec order and indices ascending.
pub fn child_job_names(job_set: &JobSet) -> Vec<String> {
    let name = job_set.metadata.name.as_deref().unwrap_or_default();
    job_set
        .spec
        .replicated_jobs
        .iter()
        .flat_map(|rjob| (0..rjob.replicas.max(0)).map(|i| child_job_name(name, &rjob.name, i)))
        .collect()
}

/// Hex digest identifying a Job by namespace and name.
pub fn job_hash_key(namespace: &str, job_name: &str) -> String {
    let digest = Sha256::digest(format!("{namespace}/{job_name}").as_bytes());
    hex::encode(&digest[..JOB_KEY_BYTES])
}

/// `<namespace>_<job name>`, the node label value used for exclusive placement
pub fn namespaced_job_name(namespace: &str, job_name: &str) -> String {
    format!("{namespace}_{job_name}")
}

/// Identity of the `index`th child Job of `replicated_job`. Set as both the
/// labels and the annotations of the Job and its pod template.
pub fn child_job_labels(
    job_set: &JobSet,
    replicated_job: &ReplicatedJob,
    index: i32,
) -> BTreeMap<String, String> {
    let name = job_set.metadata.name.as_deref().unwrap_or_default();
    let namespace = job_set.metadata.namespace.as_deref().unwrap_or_default();
    let restarts = job_set.status.as_ref().map_or(0, |s| s.restarts);
    let job_name = child_job_name(name, &replicated_job.name, index);
    BTreeMap::from([
        (JOBSET_NAME_KEY.to_string(), name.to_string()),
        (REPLICATED_JOB_NAME_KEY.to_string(), replicated_job.name.clone()),
        (
            REPLICATED_JOB_REPLICAS_KEY.to_string(),
            replicated_job.replicas.to_string(),
        ),
        (JOB_INDEX_KEY.to_string(), index.to_string()),
        (RESTARTS_KEY.to_string(), restarts.to_string()),
        (JOB_KEY.to_string(), job_hash_key(namespace, &job_name)),
    ])
}

/// Pod subdomain: `network.subdomain` when set, otherwise the JobSet name.
pub fn subdomain(job_set: &JobSet) -> String {
    job_set
        .spec
        .network
        .as_ref()
        .and_then(|n| n.subdomain.as_deref())
        .filter(|s| !s.is_empty())
        .or(job_set.metadata.name.as_deref())
        .unwrap_or_default()
        .to_string()
}

pub fn dns_hostnames_enabled(job_set: &JobSet) -> bool {
    job_set
        .spec
        .network
        .as_ref()
        .and_then(|n| n.enable_dns_hostnames)
        .unwrap_or(false)
}
