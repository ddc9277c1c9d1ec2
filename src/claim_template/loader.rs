//! Claim template loading from YAML files and directories.

use std::path::Path;

use tracing::{debug, warn};

use super::{ClaimTemplate, TemplateError};

/// Parse a claim template from YAML text.
///
/// `origin` names the document in error messages.
pub fn parse_claim_template(text: &str, origin: &str) -> Result<ClaimTemplate, TemplateError> {
    let mut template: ClaimTemplate =
        serde_yaml::from_str(text).map_err(|e| TemplateError::Parse {
            path: origin.to_string(),
            source: e,
        })?;
    template.validate(origin)?;
    Ok(template)
}

/// Read and parse a single claim template file.
pub fn load_claim_template(path: impl AsRef<Path>) -> Result<ClaimTemplate, TemplateError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| TemplateError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_claim_template(&content, &path.display().to_string())
}

/// Load all claim templates from a directory (non-recursive).
///
/// Files must match `*.yaml` or `*.yml`. An entry that cannot be inspected,
/// read or parsed is logged and skipped; only a failure to open the
/// directory itself is returned.
pub fn load_all_templates(dir: impl AsRef<Path>) -> std::io::Result<Vec<ClaimTemplate>> {
    let dir = dir.as_ref();

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            }
        };
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => continue,
            Ok(_) => {}
            Err(e) => {
                warn!("Skipping {:?}: {}", entry.path(), e);
                continue;
            }
        }
        let path = entry.path();
        if is_yaml_file(&path) {
            paths.push(path);
        }
    }
    // Sort by file name for deterministic ordering.
    paths.sort();

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        match load_claim_template(&path) {
            Ok(template) => {
                debug!("Loaded template '{}' from {:?}", template.name(), path);
                templates.push(template);
            }
            Err(e) => warn!("Skipping template {:?}: {}", path, e),
        }
    }

    Ok(templates)
}

pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim_template::ParamType;
    use serde_json::json;

    const VOLUMECLAIM: &str = r#"
apiVersion: resources.stuttgart-things.com/v1alpha1
kind: ClaimTemplate
metadata:
  name: volumeclaim
  title: Volume Claim
  description: Persistent volume claim via Crossplane
  tags: [storage, crossplane]
spec:
  type: kcl
  source: oci://ghcr.io/stuttgart-things/claim-xplane-volumeclaim
  tag: 0.1.1
  parameters:
    - name: templateName
      title: Template
      type: string
      default: simple
      enum: [simple, advanced]
    - name: namespace
      title: Namespace
      type: string
      required: true
    - name: storage
      title: Storage Size
      type: string
      default: 1Gi
      pattern: "^[0-9]+(Mi|Gi)$"
    - name: encrypted
      title: Encrypted
      type: boolean
      default: true
      hidden: true
"#;

    #[test]
    fn parses_full_template() {
        let t = parse_claim_template(VOLUMECLAIM, "<inline>").unwrap();
        assert_eq!(t.kind, "ClaimTemplate");
        assert_eq!(t.name(), "volumeclaim");
        assert_eq!(t.metadata.tags, vec!["storage", "crossplane"]);
        assert_eq!(
            t.spec.source,
            "oci://ghcr.io/stuttgart-things/claim-xplane-volumeclaim"
        );
        assert_eq!(t.spec.tag.as_deref(), Some("0.1.1"));
        assert_eq!(t.spec.parameters.len(), 4);

        let first = &t.spec.parameters[0];
        assert_eq!(first.name, "templateName");
        assert_eq!(first.param_type, ParamType::String);
        assert!(first.enum_values.contains(&"simple".to_string()));

        let encrypted = t.parameter("encrypted").unwrap();
        assert!(encrypted.hidden);
        assert_eq!(encrypted.default, Some(json!(true)));
    }

    #[test]
    fn parse_error_names_origin() {
        let err = parse_claim_template("metadata: [", "broken.yaml").unwrap_err();
        assert!(matches!(err, TemplateError::Parse { ref path, .. } if path == "broken.yaml"));
    }

    #[test]
    fn omitted_envelope_fields_default_to_empty() {
        let t = parse_claim_template("metadata: {name: bare}\nspec: {tag: '1.0'}\n", "bare.yaml")
            .unwrap();
        assert_eq!(t.name(), "bare");
        assert!(t.api_version.is_empty());
        assert!(t.kind.is_empty());
        assert!(t.spec.source.is_empty());
        assert_eq!(t.spec.tag.as_deref(), Some("1.0"));
        assert!(t.spec.parameters.is_empty());

        // only the name is structurally required
        let err = parse_claim_template("kind: ClaimTemplate\nspec: {source: oci://a}\n", "anon.yaml")
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidTemplate { .. }));
    }

    #[test]
    fn yaml_extension_filter() {
        assert!(is_yaml_file(Path::new("a/b.yaml")));
        assert!(is_yaml_file(Path::new("b.yml")));
        assert!(!is_yaml_file(Path::new("b.json")));
        assert!(!is_yaml_file(Path::new("yaml")));
    }

    #[test]
    fn directory_scan_skips_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("volumeclaim.yaml"), VOLUMECLAIM).unwrap();
        std::fs::write(dir.path().join("broken.yml"), "kind: [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a template").unwrap();
        std::fs::create_dir(dir.path().join("nested.yaml")).unwrap();

        let templates = load_all_templates(dir.path()).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name(), "volumeclaim");
    }

    #[cfg(unix)]
    #[test]
    fn dangling_entries_do_not_abort_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("volumeclaim.yaml"), VOLUMECLAIM).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.yaml"), dir.path().join("dangling.yaml"))
            .unwrap();

        let templates = load_all_templates(dir.path()).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name(), "volumeclaim");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_all_templates(dir.path().join("absent")).is_err());
    }
}
