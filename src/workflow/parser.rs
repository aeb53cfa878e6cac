use crate::workflow::WorkflowDescriptor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    workflows: Vec<WorkflowDescriptor>,
}

/// Load a YAML workflow catalog. `{{ NAME }}` placeholders in endpoint ids are
/// substituted from `vars`, so endpoint ids can live in the environment.
pub fn load_catalog(
    path: &Path,
    vars: &HashMap<String, String>,
) -> anyhow::Result<Vec<WorkflowDescriptor>> {
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content, vars)
}

pub fn parse_catalog(
    content: &str,
    vars: &HashMap<String, String>,
) -> anyhow::Result<Vec<WorkflowDescriptor>> {
    let file: CatalogFile = serde_yaml::from_str(content)?;
    let mut workflows = file.workflows;

    for wf in &mut workflows {
        for (key, value) in vars {
            let placeholder = format!("{{{{ {} }}}}", key);
            wf.upstream_endpoint_id = wf.upstream_endpoint_id.replace(&placeholder, value);
        }
        if wf.upstream_endpoint_id.contains("{{") {
            anyhow::bail!(
                "workflow '{}' has an unresolved endpoint placeholder: {}",
                wf.id,
                wf.upstream_endpoint_id
            );
        }
    }

    Ok(workflows)
}
