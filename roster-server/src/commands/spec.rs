//! Command to generate the OpenAPI specification and write it to a file.

use crate::openapi::ApiDoc;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;
use utoipa::OpenApi;

/// Generates the OpenAPI specification and writes it to the specified output path or streams it to stdout.
///
/// The format follows the file extension: `.json` writes JSON, anything else
/// YAML. With no path YAML goes to stdout; the bare words `json` and `yaml`
/// pick the stdout format.
///
/// # Errors
/// Returns an error if rendering fails or the file cannot be written.
pub fn generate_spec(output_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let openapi = ApiDoc::openapi();

    match output_path {
        Some("json") => io::stdout().write_all(openapi.to_pretty_json()?.as_bytes())?,
        Some("yaml") | None => io::stdout().write_all(openapi.to_yaml()?.as_bytes())?,
        Some(path) => {
            let path = Path::new(path);
            let rendered = match path.extension().and_then(|ext| ext.to_str()) {
                Some("json") => openapi.to_pretty_json()?,
                _ => openapi.to_yaml()?,
            };
            fs::write(path, rendered)?;
            info!(path = %path.display(), "OpenAPI spec written");
        }
    }

    Ok(())
}
