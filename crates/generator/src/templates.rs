//! Template loading and management

use kubemodel_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("doc", doc_filter);

    // Added together so the macro file is known when the others import it
    tera.add_raw_templates(vec![
        ("macros.rs", include_str!("../templates/macros.rs.tera")),
        ("unit.rs", include_str!("../templates/unit.rs.tera")),
        ("queries.rs", include_str!("../templates/queries.rs.tera")),
        ("mod.rs", include_str!("../templates/mod.rs.tera")),
    ])
    .map_err(|e| GeneratorError::Generation(format!("Failed to load templates: {}", e)))?;

    Ok(tera)
}

/// Filter continuing a `/// ` doc comment over every line of a description
///
/// The template writes the first `/// `; `indent` is the indentation of
/// the continuation lines.
fn doc_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("doc filter expects a string"))?;
    let indent = args.get("indent").and_then(Value::as_str).unwrap_or("");

    let mut lines = text.trim().lines().map(str::trim_end);
    let mut rendered = lines.next().unwrap_or_default().to_string();
    for line in lines {
        rendered.push('\n');
        rendered.push_str(indent);
        rendered.push_str("///");
        if !line.is_empty() {
            rendered.push(' ');
            rendered.push_str(line);
        }
    }

    Ok(Value::String(rendered))
}
