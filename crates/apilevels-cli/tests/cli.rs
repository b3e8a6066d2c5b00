use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const OBSERVATIONS: &str = r#"{"version":1,"classes":[{"name":"Animal","superclasses":["java/lang/Object"]},{"name":"Dog","superclasses":["Animal"],"methods":[{"name":"bark()V"}]},{"name":"DogBase","hidden":true,"fields":[{"name":"legs"}]}]}
{"version":5,"classes":[{"name":"Puppy","superclasses":["Dog","DogBase"],"methods":[{"name":"bark()V"},{"name":"<init>()V"}]}]}
"#;

fn observations_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{}", OBSERVATIONS).unwrap();
    f.flush().unwrap();
    f
}

fn apilevels() -> Command {
    Command::cargo_bin("apilevels").unwrap()
}

#[test]
fn generate_from_stdin() {
    apilevels()
        .arg("generate")
        .write_stdin(OBSERVATIONS)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<api version=\"2\">\n",
        ))
        .stdout(predicate::str::contains(
            "\t<class name=\"Puppy\" since=\"5\">\n\t\t<extends name=\"Dog\" since=\"5\"/>\n",
        ))
        .stdout(predicate::str::contains("<field name=\"legs\" since=\"1\"/>"))
        .stdout(predicate::str::contains("&lt;init&gt;()V"))
        .stdout(predicate::str::contains("DogBase").not())
        .stdout(predicate::str::contains("<method name=\"bark()V\" since=\"5\"/>").not());
}

#[test]
fn generate_to_file() {
    let f = observations_file();
    let out = tempfile::NamedTempFile::new().unwrap();
    apilevels()
        .args(["generate", "--sequential", "--compact", "-i"])
        .arg(f.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let xml = std::fs::read_to_string(out.path()).unwrap();
    assert!(xml.contains("\t\t<extends name=\"Dog\"/>\n"));
    assert!(xml.ends_with("</api>\n"));
}

#[test]
fn query_since_inherited_method() {
    let f = observations_file();
    apilevels()
        .args(["query", "since", "--class", "Puppy", "--method", "bark()V", "-i"])
        .arg(f.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"owner\":\"Dog\""))
        .stdout(predicate::str::contains("\"since\":1"));
}

#[test]
fn query_ancestors_pretty() {
    let f = observations_file();
    apilevels()
        .args(["--pretty", "query", "ancestors", "--class", "Puppy", "-i"])
        .arg(f.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Animal\""))
        .stdout(predicate::str::contains("\"java/lang/Object\""))
        .stdout(predicate::str::contains("DogBase").not());
}

#[test]
fn validate_reports_summary() {
    let f = observations_file();
    apilevels()
        .args(["validate", "-i"])
        .arg(f.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid: 2 snapshots (versions 1..5)"));
}

#[test]
fn validate_rejects_out_of_order() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, "{{\"version\":3}}\n{{\"version\":2}}\n").unwrap();
    f.flush().unwrap();
    apilevels()
        .args(["validate", "-i"])
        .arg(f.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("arrived after version 3"));
}

#[test]
fn logs_go_to_stderr() {
    apilevels()
        .args(["-vv", "generate"])
        .write_stdin(OBSERVATIONS)
        .assert()
        .success()
        .stdout(predicate::str::contains("registry cleaned").not())
        .stderr(predicate::str::contains("registry cleaned"));
}
