use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let value = read_json_value(path)?;
    serde_json::from_value(value)
        .map_err(|e| format!("Invalid contents in '{}': {}", path, e).into())
}

/// Read a JSON file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_existing(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Write a rendered artifact (an SVG chart) next to the caller.
pub fn write_artifact(path: &str, contents: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let target = absolute(path)?;
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(format!("Directory not found: {}", parent.display()).into());
        }
    }
    fs::write(&target, contents)
        .map_err(|e| format!("Failed to write '{}': {}", target.display(), e))?;
    Ok(target)
}

fn absolute(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    Ok(if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    })
}

fn resolve_existing(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let canonical = absolute(path)?;
    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("optstrat-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_file() {
        let err = read_json_value("/nonexistent/request.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_artifact_round_trip() {
        let path = scratch("chart.svg");
        let written = write_artifact(path.to_str().unwrap(), "<svg></svg>").unwrap();
        assert_eq!(fs::read_to_string(&written).unwrap(), "<svg></svg>");
        let _ = fs::remove_file(written);
    }

    #[test]
    fn test_invalid_json_reported() {
        let path = scratch("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_json_value(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
        let _ = fs::remove_file(path);
    }
}
