//! Building the child Jobs of a replicated job from its template.

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Toleration;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::jobset::{JobSet, ReplicatedJob};
use crate::naming::{
    child_job_labels, child_job_name, dns_hostnames_enabled, namespaced_job_name, subdomain,
    EXCLUSIVE_KEY, NAMESPACED_JOB_KEY, NODE_SELECTOR_STRATEGY_KEY, NO_SCHEDULE_TAINT_KEY,
};
use crate::status::ChildJobs;

/// The Jobs of `replicated_job` that do not exist yet, by ascending index.
///
/// A Job already present in any bucket of `owned` is skipped, including one
/// that is being deleted, so a restart waits for the old Job to go away.
pub fn construct_jobs_from_template(
    job_set: &JobSet,
    replicated_job: &ReplicatedJob,
    owned: &ChildJobs,
) -> Vec<Job> {
    let name = job_set.metadata.name.as_deref().unwrap_or_default();
    (0..replicated_job.replicas.max(0))
        .filter(|&index| !owned.contains(&child_job_name(name, &replicated_job.name, index)))
        .map(|index| construct_job(job_set, replicated_job, index))
        .collect()
}

fn construct_job(job_set: &JobSet, replicated_job: &ReplicatedJob, index: i32) -> Job {
    let name = job_set.metadata.name.as_deref().unwrap_or_default();
    let namespace = job_set.metadata.namespace.clone();
    let job_name = child_job_name(name, &replicated_job.name, index);
    let template_meta = replicated_job.template.metadata.clone().unwrap_or_default();

    let mut metadata = ObjectMeta {
        name: Some(job_name.clone()),
        namespace: namespace.clone(),
        labels: template_meta.labels,
        annotations: template_meta.annotations,
        ..Default::default()
    };
    label_and_annotate(&mut metadata, job_set, replicated_job, index);

    let mut spec = replicated_job.template.spec.clone().unwrap_or_default();
    label_and_annotate(
        spec.template.metadata.get_or_insert_with(Default::default),
        job_set,
        replicated_job,
        index,
    );

    let pod_spec = spec.template.spec.get_or_insert_with(Default::default);
    if dns_hostnames_enabled(job_set) {
        pod_spec.subdomain = Some(subdomain(job_set));
    }

    let annotations = metadata.annotations.as_ref();
    let annotated = |key: &str| annotations.is_some_and(|a| a.contains_key(key));
    if annotated(EXCLUSIVE_KEY) && annotated(NODE_SELECTOR_STRATEGY_KEY) {
        pod_spec.node_selector.get_or_insert_with(BTreeMap::new).insert(
            NAMESPACED_JOB_KEY.to_string(),
            namespaced_job_name(namespace.as_deref().unwrap_or_default(), &job_name),
        );
        pod_spec.tolerations.get_or_insert_with(Vec::new).push(Toleration {
            key: Some(NO_SCHEDULE_TAINT_KEY.to_string()),
            operator: Some("Exists".to_string()),
            effect: Some("NoSchedule".to_string()),
            ..Default::default()
        });
    }

    spec.suspend = Some(job_set.spec.suspend);

    Job {
        metadata,
        spec: Some(spec),
        status: None,
    }
}

/// Merge the child identity into `meta` as labels and annotations, and carry
/// the exclusive placement annotations. Those on the JobSet take precedence
/// over those on the Job template.
fn label_and_annotate(
    meta: &mut ObjectMeta,
    job_set: &JobSet,
    replicated_job: &ReplicatedJob,
    index: i32,
) {
    let identity = child_job_labels(job_set, replicated_job, index);
    meta.labels
        .get_or_insert_with(BTreeMap::new)
        .extend(identity.clone());
    let annotations = meta.annotations.get_or_insert_with(BTreeMap::new);
    annotations.extend(identity);

    let placement = [
        job_set.metadata.annotations.as_ref(),
        replicated_job
            .template
            .metadata
            .as_ref()
            .and_then(|m| m.annotations.as_ref()),
    ]
    .into_iter()
    .flatten()
    .find(|a| a.contains_key(EXCLUSIVE_KEY));

    if let Some(source) = placement {
        for key in [EXCLUSIVE_KEY, NODE_SELECTOR_STRATEGY_KEY] {
            if let Some(value) = source.get(key) {
                annotations.insert(key.to_string(), value.clone());
            }
        }
    }
}
