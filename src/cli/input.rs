//! Argument parsing helpers shared by commands

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;

/// Read an argument that is either inline text or `@path` to a file
pub fn read_text_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path))?;
            Ok(content.trim().to_string())
        }
        None => Ok(arg.to_string()),
    }
}

/// Parse a JSON argument, inline or from `@path`
pub fn read_json_arg(arg: &str) -> Result<Value> {
    let text = read_text_arg(arg)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON payload: {}", text))
}

/// Parse `Name: value` into a header pair
pub fn parse_header(arg: &str) -> Result<(String, String)> {
    let (name, value) = arg
        .split_once(':')
        .with_context(|| format!("Header must look like 'Name: value', got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name is empty in '{}'", arg);
    }
    Ok((name.to_string(), value.trim().to_string()))
}
