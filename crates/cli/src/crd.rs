use jobset_api::JobSet;
use kube::CustomResourceExt;
use std::path::Path;

/// Print the JobSet CRD manifest, or write it to `output`.
pub fn handle_crd(output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let yaml = serde_yaml::to_string(&JobSet::crd())?;
    match output {
        Some(path) => {
            std::fs::write(path, yaml)?;
            tracing::info!(path = %path.display(), "wrote CRD manifest");
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
