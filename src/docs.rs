use crate::field::FieldDescriptor;
use std::{fs, path::Path};

/// Render a markdown table documenting every described field
pub fn render_docs(fields: &[FieldDescriptor]) -> String {
    let mut md = String::new();

    md.push_str("## Configuration Fields\n\n");
    md.push_str("| Field | Type | Document Key | Environment | Default | Required | Description |\n");
    md.push_str("|-------|------|--------------|-------------|---------|----------|-------------|\n");
    for field in fields {
        let required_str = if field.is_required() { "Yes" } else { "No" };
        md.push_str(&format!(
            "| {} | `{}` | {} | {} | {} | {} | {} |\n",
            field.name,
            field.type_name,
            field.key,
            field.env_var().unwrap_or("-"),
            field.default_literal().unwrap_or("-"),
            required_str,
            field.description
        ));
    }

    md
}

/// Write configuration documentation to a markdown file
///
/// # Example
/// ```no_run
/// use configurate::{Configurable, write_docs};
///
/// #[derive(Configurable)]
/// struct Settings {
///     /// Port the server listens on
///     #[config(env = "PORT", default = 8080)]
///     port: u16,
/// }
///
/// write_docs(Settings::schema(), "CONFIG.md").unwrap();
/// ```
pub fn write_docs(fields: &[FieldDescriptor], path: impl AsRef<Path>) -> std::io::Result<()> {
    fs::write(path, render_docs(fields))
}
