use jobset_api::JobSet;
use kube::CustomResourceExt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let yaml = serde_yaml::to_string(&JobSet::crd())?;
    std::fs::write("jobset_crd.yaml", yaml)?;
    Ok(())
}
