use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data_value) = data {
                response["data"] = data_value;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(data_value) = data {
                print_text(&data_value);
            }
        }
    }
    Ok(())
}

/// Rows as one JSON array, or one `key=value` block per row
pub fn output_rows(output_format: &OutputFormat, rows: &[Value], meta: Option<&Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "data": rows });
            if let Some(meta) = meta {
                response["meta"] = meta.clone();
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No records found");
            }
            for row in rows {
                print_text(row);
                println!();
            }
            if let Some(meta) = meta {
                println!(
                    "Page {} of {} ({} total)",
                    meta["page"], meta["last_page"], meta["total"]
                );
            }
        }
    }
    Ok(())
}

fn print_text(value: &Value) {
    match value {
        Value::Object(fields) => {
            for (key, value) in fields {
                match value {
                    Value::String(s) => println!("{}: {}", key, s),
                    Value::Null => println!("{}: -", key),
                    other => println!("{}: {}", key, other),
                }
            }
        }
        other => println!("{}", other),
    }
}

/// Error message carried by an API error envelope
pub fn envelope_error(body: &Value) -> String {
    let message = body.get("message").and_then(Value::as_str).unwrap_or("request failed");
    match body.get("errors").and_then(Value::as_object) {
        Some(errors) if !errors.is_empty() => {
            let details: Vec<String> = errors.iter().map(|(field, msg)| format!("  {}: {}", field, msg)).collect();
            format!("{}\n{}", message, details.join("\n"))
        }
        _ => message.to_string(),
    }
}
