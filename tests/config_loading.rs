mod common;
use crate::common::{init_tracing, ConfigFileBuilder};

use std::error::Error;
use std::fs;

use cloudwork::config::{load_and_validate, Worker};
use cloudwork::errors::CloudworkError;
use cloudwork::fs::RealFileSystem;
use cloudwork::layout::{bootstrap, WorkerLayout};
use cloudwork::script::ScriptSource;
use cloudwork::types::FailurePolicy;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn loads_a_full_config_from_disk() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Cloudwork.toml");
    fs::write(
        &path,
        r#"
remoteInputDir = "/data/in"
failure_policy = "fail-fast"
setup = "apt-get install -y rsync"

[[workers]]
host = "gpu-1"

[[workers]]
host = "gpu-2"

[scripts]
run = """
upload-input
python train.py
download-output
"""

[transport]
shell_args = []
"#,
    )?;

    let cfg = load_and_validate(&RealFileSystem, &path)?;

    assert_eq!(cfg.workers, vec![Worker::new("gpu-1"), Worker::new("gpu-2")]);
    assert_eq!(cfg.remote_input_dir, "/data/in");
    assert_eq!(cfg.remote_output_dir, "/tmp/worker/output");
    assert_eq!(cfg.failure_policy, FailurePolicy::FailFast);
    assert_eq!(cfg.script("setup"), Some("apt-get install -y rsync"));
    assert!(cfg.script("run").unwrap().contains("python train.py"));
    assert!(cfg.transport.shell_args.is_empty());
    assert_eq!(cfg.transport.sync, "rsync");
    Ok(())
}

#[test]
fn missing_config_is_a_config_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let err = load_and_validate(&RealFileSystem, dir.path().join("nope.toml")).unwrap_err();

    assert!(matches!(err, CloudworkError::ConfigError(_)), "{err:?}");
}

#[test]
fn unparsable_config_is_a_toml_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Cloudwork.toml");
    fs::write(&path, "[[workers]\nhost = ")?;

    let err = load_and_validate(&RealFileSystem, &path).unwrap_err();

    assert!(matches!(err, CloudworkError::TomlError(_)), "{err:?}");
    Ok(())
}

#[test]
fn unknown_failure_policy_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Cloudwork.toml");
    fs::write(
        &path,
        "failure_policy = \"sometimes\"\n[[workers]]\nhost = \"a\"\n",
    )?;

    assert!(load_and_validate(&RealFileSystem, &path).is_err());
    Ok(())
}

#[test]
fn file_scripts_are_read_at_resolve_time() -> TestResult {
    let dir = tempfile::tempdir()?;
    let script_path = dir.path().join("job.sh");
    fs::write(&script_path, "upload ./a /b\necho from-file\n")?;

    let cfg = ConfigFileBuilder::new()
        .with_worker("a")
        .remote_dirs("/in", "/out")
        .build();

    let source = ScriptSource::from_run_arg(script_path.to_str().unwrap());
    assert!(source.is_file());

    let op = source.resolve(&cfg, &RealFileSystem)?;
    assert_eq!(op.script, "upload ./a /b\necho from-file\n");
    assert_eq!(op.remote_input_dir, "/in");
    assert_eq!(op.remote_output_dir, "/out");

    let missing = ScriptSource::from_run_arg("./definitely-missing.sh").resolve(&cfg, &RealFileSystem);
    assert!(matches!(missing, Err(CloudworkError::UnknownScript(_))));
    Ok(())
}

#[test]
fn named_scripts_resolve_against_the_config() {
    let cfg = ConfigFileBuilder::new()
        .with_worker("a")
        .with_script("run", "echo run")
        .build();

    let op = ScriptSource::from_run_arg("run").resolve(&cfg, &RealFileSystem).unwrap();
    assert_eq!(op.name, "run");
    assert_eq!(op.script, "echo run");

    let err = ScriptSource::from_run_arg("deploy")
        .resolve(&cfg, &RealFileSystem)
        .unwrap_err();
    assert!(matches!(err, CloudworkError::UnknownScript(name) if name == "deploy"));
}

#[test]
fn bootstrap_lays_out_every_worker_on_disk() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = ConfigFileBuilder::new()
        .with_workers(&["a", "b"])
        .work_root(dir.path().join("workers"))
        .build();
    let layout = WorkerLayout::new(cfg.work_root.clone());

    bootstrap(&RealFileSystem, &layout, &cfg.workers)?;
    // Running it again leaves existing directories alone.
    bootstrap(&RealFileSystem, &layout, &cfg.workers)?;

    for host in ["a", "b"] {
        assert!(dir.path().join("workers").join(host).join("input").is_dir());
        assert!(dir.path().join("workers").join(host).join("output").is_dir());
    }
    Ok(())
}
