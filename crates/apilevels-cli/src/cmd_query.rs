use anyhow::{Context, Result, anyhow};
use apilevels::v1::{Registry, query};
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

use crate::cmd_generate::load_registry;

#[derive(Subcommand, Debug)]
pub enum QueryOp {
    /// List every class and interface a class inherits from
    Ancestors {
        /// Observations file (JSON Lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Class name, e.g. java/util/ArrayList
        #[arg(long)]
        class: String,
    },
    /// Show when a class, or a member visible on it, was introduced
    Since {
        /// Observations file (JSON Lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Class name, e.g. java/util/ArrayList
        #[arg(long)]
        class: String,

        /// Method key, e.g. "add(Ljava/lang/Object;)Z"
        #[arg(long, conflicts_with = "field")]
        method: Option<String>,

        /// Field key
        #[arg(long)]
        field: Option<String>,
    },
}

pub fn run(op: QueryOp, pretty: bool) -> Result<()> {
    match op {
        QueryOp::Ancestors { input, class } => run_ancestors(input, class, pretty),
        QueryOp::Since {
            input,
            class,
            method,
            field,
        } => run_since(input, class, method, field, pretty),
    }
}

fn read_cleaned(input: &PathBuf) -> Result<Registry> {
    let mut registry = load_registry(Some(input))?;
    registry
        .clean()
        .with_context(|| format!("Failed to clean {:?}", input))?;
    Ok(registry)
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn ancestors_of(registry: &Registry, class: &str) -> Result<Vec<String>> {
    if !registry.contains(class) {
        return Err(anyhow!("Unknown class: {}", class));
    }
    Ok(query::ancestors(registry, class).into_iter().collect())
}

fn run_ancestors(input: PathBuf, class: String, pretty: bool) -> Result<()> {
    let registry = read_cleaned(&input)?;
    let names = ancestors_of(&registry, &class)?;
    print_json(&names, pretty)
}

fn since_of<'a>(
    registry: &'a Registry,
    class: &str,
    method: Option<&str>,
    field: Option<&str>,
) -> Result<query::Resolved<'a>> {
    let record = registry
        .get(class)
        .ok_or_else(|| anyhow!("Unknown class: {}", class))?;
    match (method, field) {
        (Some(key), _) => query::resolve_method(registry, class, key)
            .ok_or_else(|| anyhow!("Method {} not found on {}", key, class)),
        (None, Some(key)) => query::resolve_field(registry, class, key)
            .ok_or_else(|| anyhow!("Field {} not found on {}", key, class)),
        (None, None) => Ok(query::Resolved {
            owner: record.name(),
            element: record.element(),
        }),
    }
}

fn run_since(
    input: PathBuf,
    class: String,
    method: Option<String>,
    field: Option<String>,
    pretty: bool,
) -> Result<()> {
    let registry = read_cleaned(&input)?;
    let resolved = since_of(&registry, &class, method.as_deref(), field.as_deref())?;
    print_json(&resolved, pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apilevels::v1::{ClassObservation, Snapshot};
    use std::io::Write;

    fn make_registry() -> Registry {
        let mut registry = Registry::new();
        registry
            .ingest(
                &Snapshot::new(1)
                    .with_class(ClassObservation::new("Dog").with_method("bark()V"))
                    .with_class(ClassObservation::new("Puppy").with_superclass("Dog")),
            )
            .unwrap();
        registry
            .ingest(
                &Snapshot::new(3).with_class(
                    ClassObservation::new("Puppy")
                        .with_superclass("Dog")
                        .with_method("bark()V")
                        .with_field("age"),
                ),
            )
            .unwrap();
        registry.clean().unwrap();
        registry
    }

    fn write_temp_observations() -> tempfile::NamedTempFile {
        let snapshots = vec![
            Snapshot::new(1).with_class(ClassObservation::new("Dog").with_method("bark()V")),
            Snapshot::new(2).with_class(
                ClassObservation::new("Puppy")
                    .with_superclass("Dog")
                    .with_method("bark()V"),
            ),
        ];
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", Snapshot::to_jsonl(&snapshots).unwrap()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_ancestors_of() {
        let registry = make_registry();
        assert_eq!(ancestors_of(&registry, "Puppy").unwrap(), vec!["Dog"]);
        assert!(ancestors_of(&registry, "Cat").is_err());
    }

    #[test]
    fn test_since_of_inherited_method() {
        let registry = make_registry();
        let resolved = since_of(&registry, "Puppy", Some("bark()V"), None).unwrap();
        assert_eq!(resolved.owner, "Dog");
        assert_eq!(resolved.element.since, 1);
    }

    #[test]
    fn test_since_of_field_and_class() {
        let registry = make_registry();
        let field = since_of(&registry, "Puppy", None, Some("age")).unwrap();
        assert_eq!(field.element.since, 3);
        let class = since_of(&registry, "Puppy", None, None).unwrap();
        assert_eq!(class.element.since, 1);
    }

    #[test]
    fn test_since_of_missing() {
        let registry = make_registry();
        assert!(since_of(&registry, "Puppy", Some("meow()V"), None).is_err());
        assert!(since_of(&registry, "Cat", None, None).is_err());
    }

    #[test]
    fn test_run_ancestors_with_file() {
        let f = write_temp_observations();
        let op = QueryOp::Ancestors {
            input: f.path().to_path_buf(),
            class: "Puppy".into(),
        };
        assert!(run(op, false).is_ok());
    }

    #[test]
    fn test_run_since_with_file() {
        let f = write_temp_observations();
        let op = QueryOp::Since {
            input: f.path().to_path_buf(),
            class: "Puppy".into(),
            method: Some("bark()V".into()),
            field: None,
        };
        assert!(run(op, true).is_ok());
    }

    #[test]
    fn test_run_nonexistent_file() {
        let op = QueryOp::Ancestors {
            input: PathBuf::from("/nonexistent/file.jsonl"),
            class: "Puppy".into(),
        };
        assert!(run(op, false).is_err());
    }
}
