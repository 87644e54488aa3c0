use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::roles::{Role, RoleSet};

/// Output a success message in the appropriate format. Object `data` is
/// merged into the JSON response; anything else lands under `data`.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            match data {
                Some(Value::Object(fields)) => {
                    if let Some(obj) = response.as_object_mut() {
                        obj.extend(fields);
                    }
                }
                Some(other) => response["data"] = other,
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print `label: value` lines in text mode
pub fn output_fields(output_format: &OutputFormat, fields: &[(&str, String)]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, Value> = fields
                .iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
                .collect();
            println!("{}", serde_json::to_string_pretty(&Value::Object(map))?);
        }
        OutputFormat::Text => {
            for (label, value) in fields {
                println!("{}: {}", label, value);
            }
        }
    }
    Ok(())
}

/// Parse a comma separated role list. Unknown names are an error here,
/// unlike stored role rows which are silently dropped.
pub fn parse_roles(raw: &str) -> anyhow::Result<Vec<Role>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Role>().with_context(|| format!("invalid role list '{}'", raw)))
        .collect()
}

pub fn parse_role_set(raw: &str) -> anyhow::Result<RoleSet> {
    Ok(parse_roles(raw)?.into_iter().collect())
}
