use jobset_api::naming::child_job_names;
use jobset_api::status::ChildJobs;
use jobset_api::{construct_jobs_from_template, JobSet};
use std::path::Path;

use crate::manifest::{read_manifest, Built};

fn load_job_sets(file: &Path) -> Result<Vec<JobSet>, Box<dyn std::error::Error>> {
    let built = read_manifest(file)?.build().map_err(|e| {
        format!(
            "{} does not hold a valid JobSet: {}; run `jobsetctl validate` for details",
            file.display(),
            e
        )
    })?;
    Ok(match built {
        Built::JobSet(js) => vec![*js],
        Built::List(list) => list.into_items(),
    })
}

/// Print the child Job names each JobSet in the file would own.
pub fn handle_names(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    for js in load_job_sets(file)? {
        for name in child_job_names(&js) {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Print, as a YAML stream, the child Jobs a fresh JobSet would create.
pub fn handle_jobs(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let none = ChildJobs::default();
    for js in load_job_sets(file)? {
        for rjob in &js.spec.replicated_jobs {
            for job in construct_jobs_from_template(&js, rjob, &none) {
                print!("---\n{}", serde_yaml::to_string(&job)?);
            }
        }
    }
    Ok(())
}
