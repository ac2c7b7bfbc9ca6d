//! Property tests over construction and validation of JobSets.

use std::collections::HashSet;

use jobset_api::{JobSet, ValidationError};
use proptest::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Short names from a small alphabet so collisions are common.
fn arb_name() -> impl Strategy<Value = String> {
    "[a-d]{1,2}"
}

fn arb_replicated_job() -> impl Strategy<Value = Value> {
    (arb_name(), 1i32..8).prop_map(|(name, replicas)| {
        json!({"name": name, "replicas": replicas, "template": {}})
    })
}

fn arb_rule() -> impl Strategy<Value = Value> {
    (
        prop_oneof![
            Just("FailJobSet"),
            Just("RestartJobSet"),
            Just("RestartJobSetAndIgnoreMaxRestarts"),
        ],
        prop::collection::vec(arb_name(), 0..4),
        prop::collection::vec("[A-Za-z]{3,12}", 0..3),
    )
        .prop_map(|(action, targets, reasons)| {
            json!({
                "action": action,
                "targetReplicatedJobs": targets,
                "onJobFailureReasons": reasons
            })
        })
}

fn arb_network() -> impl Strategy<Value = Value> {
    (
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(dns, publish, subdomain)| {
            let mut network = json!({});
            if let Some(dns) = dns {
                network["enableDNSHostnames"] = json!(dns);
            }
            if let Some(publish) = publish {
                network["publishNotReadyAddresses"] = json!(publish);
            }
            if let Some(subdomain) = subdomain {
                network["subdomain"] = json!(subdomain);
            }
            network
        })
}

fn arb_condition() -> impl Strategy<Value = Value> {
    (
        prop_oneof![Just("Completed"), Just("Failed"), Just("Suspended")],
        prop_oneof![Just("True"), Just("False")],
        "[A-Z][a-zA-Z]{2,10}",
        "[a-z ]{0,20}",
    )
        .prop_map(|(type_, status, reason, message)| {
            json!({
                "type": type_,
                "status": status,
                "reason": reason,
                "message": message,
                "lastTransitionTime": "2024-01-01T00:00:00Z"
            })
        })
}

fn arb_status(names: Vec<String>) -> impl Strategy<Value = Value> {
    (
        (0i32..10, 0i32..10),
        prop::collection::vec(arb_condition(), 0..3),
        prop::collection::vec((0i32..4, 0i32..4, 0i32..4, 0i32..4, 0i32..4), names.len()),
        prop::option::of(prop_oneof![Just("Completed"), Just("Failed")]),
    )
        .prop_map(move |((a, b), conditions, counts, terminal)| {
            let replicated_jobs_status: Vec<_> = names
                .iter()
                .zip(counts)
                .map(|(name, (active, failed, ready, succeeded, suspended))| {
                    json!({
                        "name": name,
                        "active": active,
                        "failed": failed,
                        "ready": ready,
                        "succeeded": succeeded,
                        "suspended": suspended
                    })
                })
                .collect();
            let mut status = json!({
                "restarts": a.max(b),
                "restartsCountTowardsMax": a.min(b),
                "conditions": conditions,
                "replicatedJobsStatus": replicated_jobs_status
            });
            if let Some(terminal) = terminal {
                status["terminalState"] = json!(terminal);
            }
            status
        })
}

/// A replicated-job list plus everything that refers back into it.
fn arb_manifest() -> impl Strategy<Value = Value> {
    prop::collection::vec(arb_replicated_job(), 1..6).prop_flat_map(|rjobs| {
        let names: Vec<String> = rjobs
            .iter()
            .map(|r| r["name"].as_str().unwrap_or_default().to_string())
            .collect();
        (
            Just(rjobs),
            prop::option::of((0i32..5, prop::collection::vec(arb_rule(), 0..4), any::<bool>())),
            prop::option::of(prop_oneof![Just("AnyOrder"), Just("InOrder")]),
            prop::option::of((
                prop_oneof![Just("All"), Just("Any")],
                prop::collection::vec(arb_name(), 0..3),
            )),
            any::<bool>(),
            prop::option::of(0i32..86_400),
            prop::option::of(arb_status(names)),
            (
                prop::option::of((any::<prop::sample::Index>(), 0i32..8, 0i32..4)),
                prop::option::of(arb_network()),
                prop::option::of("[a-z.]{3,20}/[a-z]{3,10}"),
            ),
        )
    })
    .prop_map(
        |(rjobs, failure, startup, success, suspend, ttl, status, (coordinator, network, managed_by))| {
            let mut spec = json!({"replicatedJobs": rjobs, "suspend": suspend});
            if let Some((max_restarts, mut rules, named)) = failure {
                if named {
                    for (i, rule) in rules.iter_mut().enumerate() {
                        rule["name"] = json!(format!("rule-{i}"));
                    }
                }
                spec["failurePolicy"] = json!({"maxRestarts": max_restarts, "rules": rules});
            }
            if let Some(order) = startup {
                spec["startupPolicy"] = json!({"startupPolicyOrder": order});
            }
            if let Some((operator, targets)) = success {
                spec["successPolicy"] = json!({"operator": operator, "targetReplicatedJobs": targets});
            }
            if let Some(ttl) = ttl {
                spec["ttlSecondsAfterFinished"] = json!(ttl);
            }
            if let Some((pick, job_index, pod_index)) = coordinator {
                // Point at an existing replicated job and stay inside the
                // replica count of the first job with that name
                let name = &rjobs[pick.index(rjobs.len())]["name"];
                let replicas = rjobs
                    .iter()
                    .find(|r| &r["name"] == name)
                    .and_then(|r| r["replicas"].as_i64())
                    .unwrap_or(1) as i32;
                spec["coordinator"] = json!({
                    "replicatedJob": name,
                    "jobIndex": job_index % replicas,
                    "podIndex": pod_index
                });
            }
            if let Some(network) = network {
                spec["network"] = network;
            }
            if let Some(managed_by) = managed_by {
                spec["managedBy"] = json!(managed_by);
            }
            let mut manifest = json!({
                "apiVersion": "jobset.x-k8s.io/v1alpha2",
                "kind": "JobSet",
                "metadata": {"name": "prop", "namespace": "default"},
                "spec": spec
            });
            if let Some(status) = status {
                manifest["status"] = status;
            }
            manifest
        },
    )
}

fn rjob_names(js: &JobSet) -> Vec<&str> {
    js.spec.replicated_jobs.iter().map(|r| r.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// Construct, serialize, construct again: the two values are equal.
    #[test]
    fn round_trip_is_idempotent(manifest in arb_manifest()) {
        let js = JobSet::try_from(&manifest).unwrap();
        let wire = serde_json::to_value(&js).unwrap();
        let again = JobSet::try_from(&wire).unwrap();
        prop_assert_eq!(js, again);
    }

    /// No uniqueness violation exactly when replicated job names are distinct.
    #[test]
    fn uniqueness_iff_distinct_names(manifest in arb_manifest()) {
        let js = JobSet::try_from(&manifest).unwrap();
        let names = rjob_names(&js);
        let distinct = names.iter().collect::<HashSet<_>>().len() == names.len();
        let duplicates = js
            .validate()
            .err()
            .map(|v| {
                v.iter()
                    .filter(|e| {
                        matches!(e, ValidationError::UniquenessViolation { path, .. }
                            if path.as_str().starts_with("spec.replicatedJobs"))
                    })
                    .count()
            })
            .unwrap_or(0);
        prop_assert_eq!(duplicates == 0, distinct);
    }

    /// Exactly one referential violation per failure-rule or success-policy
    /// target occurrence that names no replicated job. Coordinators always
    /// point at an existing replicated job.
    #[test]
    fn one_referential_violation_per_dangling_target(manifest in arb_manifest()) {
        let js = JobSet::try_from(&manifest).unwrap();
        let names: HashSet<&str> = rjob_names(&js).into_iter().collect();
        let rule_targets = js
            .spec
            .failure_policy
            .iter()
            .flat_map(|p| p.rules.iter())
            .flat_map(|r| r.target_replicated_jobs.iter());
        let success_targets = js
            .spec
            .success_policy
            .iter()
            .flat_map(|p| p.target_replicated_jobs.iter());
        let expected = rule_targets
            .chain(success_targets)
            .filter(|t| !names.contains(t.as_str()))
            .count();
        let found = js
            .validate()
            .err()
            .map(|v| {
                v.iter()
                    .filter(|e| matches!(e, ValidationError::ReferentialIntegrityViolation { .. }))
                    .count()
            })
            .unwrap_or(0);
        prop_assert_eq!(found, expected);
    }

    /// Validation never changes its input.
    #[test]
    fn validation_is_pure(manifest in arb_manifest()) {
        let js = JobSet::try_from(&manifest).unwrap();
        let before = js.clone();
        let first = js.validate();
        let second = js.validate();
        prop_assert_eq!(&js, &before);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn restarts_towards_max_above_restarts_is_a_range_violation() {
    let js = JobSet::try_from(&json!({
        "spec": {"replicatedJobs": [{"name": "w", "template": {}}]},
        "status": {"restarts": 5, "restartsCountTowardsMax": 7}
    }))
    .unwrap();
    let violations = js.validate().unwrap_err();
    assert!(violations
        .iter()
        .any(|e| matches!(e, ValidationError::RangeViolation { .. })));
}

#[test]
fn empty_replicated_jobs_fails_construction() {
    let err = JobSet::try_from(&json!({"spec": {"replicatedJobs": []}})).unwrap_err();
    assert!(matches!(err, ValidationError::MissingRequiredField { .. }));
}
