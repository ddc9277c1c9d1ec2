//! Plain-text summaries for terminal output.

use std::fmt::Write;

use crate::claim_template::ClaimTemplate;
use crate::params::value_to_string;

/// Multi-line summary of a template and its parameters.
pub fn template_summary(t: &ClaimTemplate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "---- Loaded ClaimTemplate ----");
    let _ = writeln!(out, "Name:        {}", t.metadata.name);
    let _ = writeln!(out, "Title:       {}", t.metadata.title);
    let _ = writeln!(out, "Source:      {}", t.spec.source);
    let _ = writeln!(out, "Tag:         {}", t.spec.tag.as_deref().unwrap_or(""));
    let _ = writeln!(out, "Parameters:  {}", t.spec.parameters.len());

    for p in &t.spec.parameters {
        let default = p
            .default
            .as_ref()
            .map(value_to_string)
            .unwrap_or_else(|| "<none>".to_string());
        let _ = write!(
            out,
            "  - {} ({}) required={} default={}",
            p.name, p.param_type, p.required, default
        );
        if !p.enum_values.is_empty() {
            let _ = write!(out, " enum=[{}]", p.enum_values.join(", "));
        }
        if p.hidden {
            let _ = write!(out, " hidden");
        }
        out.push('\n');
    }
    out
}

/// Header line plus the rendered document.
pub fn rendered_output(template_name: &str, yaml: &str) -> String {
    format!("\n---- Rendered YAML for {} ----\n{}", template_name, yaml)
}
