use anyhow::{Context, Result};
use apilevels::v1::{CleanOptions, Registry};
use apilevels_xml::RenderOptions;
use std::path::PathBuf;
use tracing::info;

pub fn run(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    compact: bool,
    api_version: u32,
    sequential: bool,
) -> Result<()> {
    let mut registry = load_registry(input.as_ref())?;
    registry
        .clean_with(&CleanOptions {
            parallel: !sequential,
        })
        .context("Failed to clean class hierarchy")?;

    let options = RenderOptions {
        api_version,
        elide_inherited_since: compact,
    };
    let xml = apilevels_xml::render(&registry, &options);

    if let Some(path) = &output {
        std::fs::write(path, &xml).with_context(|| format!("Failed to write {:?}", path))?;
        info!(path = ?path, bytes = xml.len(), "wrote manifest");
    } else {
        print!("{}", xml);
    }

    Ok(())
}

/// Read a file, or stdin when no path is given.
pub(crate) fn read_input(input: Option<&PathBuf>) -> Result<String> {
    if let Some(path) = input {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
    } else {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    }
}

/// Ingest every snapshot from a JSON Lines observation file.
pub(crate) fn load_registry(input: Option<&PathBuf>) -> Result<Registry> {
    let content = read_input(input)?;
    let mut registry = Registry::new();
    let snapshots = registry
        .ingest_jsonl(&content)
        .context("Failed to ingest observations")?;
    info!(snapshots, classes = registry.len(), "loaded observations");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const OBSERVATIONS: &str = r#"{"version":1,"classes":[{"name":"p/Base","hidden":true,"fields":[{"name":"x"}]},{"name":"p/Sub","superclasses":["p/Base"],"methods":[{"name":"<init>()V"}]}]}
{"version":2,"classes":[{"name":"p/Sub","superclasses":["p/Base"],"methods":[{"name":"<init>()V"},{"name":"go()V"}]}]}
"#;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", content).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_load_registry() {
        let f = write_temp(OBSERVATIONS);
        let registry = load_registry(Some(&f.path().to_path_buf())).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.last_version(), Some(2));
    }

    #[test]
    fn test_run_with_output_file() {
        let f = write_temp(OBSERVATIONS);
        let out = tempfile::NamedTempFile::new().unwrap();
        let result = run(
            Some(f.path().to_path_buf()),
            Some(out.path().to_path_buf()),
            false,
            2,
            false,
        );
        assert!(result.is_ok());

        let xml = std::fs::read_to_string(out.path()).unwrap();
        assert!(xml.contains("<class name=\"p/Sub\" since=\"1\">"));
        assert!(xml.contains("<field name=\"x\" since=\"1\"/>"));
        assert!(xml.contains("<method name=\"go()V\" since=\"2\"/>"));
        assert!(!xml.contains("p/Base"));
    }

    #[test]
    fn test_run_compact() {
        let f = write_temp(OBSERVATIONS);
        let out = tempfile::NamedTempFile::new().unwrap();
        run(
            Some(f.path().to_path_buf()),
            Some(out.path().to_path_buf()),
            true,
            3,
            true,
        )
        .unwrap();

        let xml = std::fs::read_to_string(out.path()).unwrap();
        assert!(xml.contains("<api version=\"3\">"));
        assert!(xml.contains("<field name=\"x\"/>"));
    }

    #[test]
    fn test_run_nonexistent_input() {
        let result = run(
            Some(PathBuf::from("/nonexistent/observations.jsonl")),
            None,
            false,
            2,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_run_invalid_json() {
        let f = write_temp("not valid json\n");
        let result = run(Some(f.path().to_path_buf()), None, false, 2, false);
        assert!(result.is_err());
    }
}
