use anyhow::{Context, Result, anyhow};
use apilevels::v1::{Registry, Snapshot};
use std::path::PathBuf;

pub fn run(input: PathBuf) -> Result<()> {
    let content =
        std::fs::read_to_string(&input).with_context(|| format!("Failed to read {:?}", input))?;
    println!("{}", validate_content(&content)?);
    Ok(())
}

fn validate_content(content: &str) -> Result<String> {
    let snapshots = Snapshot::parse_jsonl(content).map_err(|e| anyhow!("Invalid: {}", e))?;
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return Err(anyhow!("Invalid: no snapshots"));
    };

    let mut registry = Registry::new();
    for snapshot in &snapshots {
        registry
            .ingest(snapshot)
            .map_err(|e| anyhow!("Invalid: {}", e))?;
    }

    let hidden = registry.iter().filter(|c| c.always_hidden()).count();
    Ok(format!(
        "Valid: {} snapshots (versions {}..{}), {} classes, {} never public",
        snapshots.len(),
        first.version,
        last.version,
        registry.len(),
        hidden
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_valid() {
        let jsonl = r#"{"version":1,"classes":[{"name":"A"},{"name":"B","hidden":true}]}
{"version":2,"classes":[{"name":"A"}]}"#;
        let summary = validate_content(jsonl).unwrap();
        assert_eq!(
            summary,
            "Valid: 2 snapshots (versions 1..2), 2 classes, 1 never public"
        );
    }

    #[test]
    fn test_validate_invalid_json() {
        assert!(validate_content("not json").is_err());
    }

    #[test]
    fn test_validate_empty() {
        assert!(validate_content("\n\n").is_err());
    }

    #[test]
    fn test_validate_out_of_order() {
        let err = validate_content("{\"version\":4}\n{\"version\":1}\n").unwrap_err();
        assert!(err.to_string().contains("version 1 arrived after version 4"));
    }

    #[test]
    fn test_run_with_temp_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"version":1,"classes":[{{"name":"A"}}]}}"#).unwrap();
        f.flush().unwrap();
        assert!(run(f.path().to_path_buf()).is_ok());
    }

    #[test]
    fn test_run_nonexistent_file() {
        assert!(run(PathBuf::from("/nonexistent/file.jsonl")).is_err());
    }
}
