//! End-to-end batch compile tests
//!
//! Drive `Pipeline::execute` against a fake `slangc` shell script so the
//! real process path (probe, spawn, timeout, cleanup) is exercised.
//! The script writes its arguments into the output file, which lets the
//! tests check what the compiler was actually given.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use slang_batch::summary::{FailureKind, EXIT_FAILURE, EXIT_SUCCESS};
use slang_batch::{
    EnvironmentError, PathContext, Pipeline, PipelineConfig, PipelineError, RunSummary,
    TimeoutConfig,
};
use tempfile::TempDir;

const FAKE_SLANGC: &str = r#"#!/bin/sh
if [ "$1" = "-v" ]; then
    echo "slangc 2025.6 (fake)"
    exit 0
fi
out=""
prev=""
for arg in "$@"; do
    if [ "$prev" = "-o" ]; then out="$arg"; fi
    prev="$arg"
done
input="$prev"
case "$input" in
    *broken*)
        echo "partial" > "$out"
        echo "$input(3): error 30015: undefined identifier" >&2
        exit 1
        ;;
    *hang*)
        exec sleep 30
        ;;
esac
echo "$@" > "$out"
"#;

const BROKEN_SLANGC: &str = r#"#!/bin/sh
echo "license check failed" >&2
exit 3
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("tool")).unwrap();
        fs::create_dir_all(dir.path().join("project/shaders")).unwrap();
        Fixture { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn install_compiler(&self, script: &str) -> PathBuf {
        let path = self.root().join("tool/slangc");
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn add_shader(&self, name: &str) {
        let path = self.root().join("project/shaders").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[shader(\"compute\")] void main() {}").unwrap();
    }

    fn write_manifest(&self, json: &str) {
        fs::write(self.root().join("project/shaders.json"), json).unwrap();
    }

    fn output(&self, name: &str) -> PathBuf {
        self.root().join("out").join(name)
    }

    fn pipeline(&self, configure: impl FnOnce(&mut PipelineConfig)) -> Pipeline {
        let ctx = PathContext {
            tool_dir: self.root().join("tool"),
            working_dir: self.root().to_path_buf(),
        };
        let mut config = PipelineConfig {
            compiler: PathBuf::from("slangc"),
            output_dir: PathBuf::from("out"),
            manifest: PathBuf::from("project/shaders.json"),
            workers: 2,
            quiet: true,
            ..PipelineConfig::default()
        };
        configure(&mut config);
        Pipeline::new(config, ctx)
    }
}

// =============================================================================
// Successful batches
// =============================================================================

#[test]
fn test_all_shaders_compile() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fx.add_shader("post/bloom.slang");
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "common_options": ["-target", "spirv"],
            "shaders": [
                {"file": "a.slang"},
                {"file": "post/bloom.slang", "options": ["-entry", "main"]}
            ]
        }"#,
    );

    let summary = fx.pipeline(|_| {}).execute().expect("batch should run");

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.exit_code(), EXIT_SUCCESS);

    let args = fs::read_to_string(fx.output("post.bloom.spv")).unwrap();
    assert!(args.starts_with("-target spirv -entry main -o "), "got: {}", args);
    assert!(args.trim_end().ends_with("bloom.slang"));
    assert!(fx.output("a.spv").exists());
}

#[test]
fn test_include_dirs_forwarded_with_default_flag() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fs::create_dir_all(fx.root().join("project/shaders/common")).unwrap();
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "include_dir": ["common"],
            "common_options": [],
            "shaders": [{"file": "a.slang"}]
        }"#,
    );

    let summary = fx.pipeline(|_| {}).execute().unwrap();
    assert!(summary.is_success());

    let include = fx.root().join("project/shaders").canonicalize().unwrap().join("common");
    let args = fs::read_to_string(fx.output("a.spv")).unwrap();
    assert!(
        args.starts_with(&format!("-I{}\\ ", include.display())),
        "got: {}",
        args
    );
}

#[test]
fn test_alias_names_the_artifact() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("src/lighting.slang");
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "common_options": [],
            "shaders": [{"file": "src/lighting.slang", "alias": "passes/lighting.slang"}]
        }"#,
    );

    fx.pipeline(|_| {}).execute().unwrap();

    assert!(fx.output("passes.lighting.spv").exists());
    assert!(!fx.output("src.lighting.spv").exists());
}

#[test]
fn test_shader_root_with_parent_segments_gives_clean_include_flag() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fs::create_dir_all(fx.root().join("project/shaders/common")).unwrap();
    fs::create_dir_all(fx.root().join("project/cfg")).unwrap();
    fs::write(
        fx.root().join("project/cfg/shaders.json"),
        r#"{
            "shader_root": "../shaders",
            "include_dir": ["common"],
            "common_options": [],
            "shaders": [{"file": "a.slang"}]
        }"#,
    )
    .unwrap();

    let summary = fx
        .pipeline(|c| c.manifest = PathBuf::from("project/cfg/shaders.json"))
        .execute()
        .unwrap();
    assert!(summary.is_success());

    let args = fs::read_to_string(fx.output("a.spv")).unwrap();
    let include_flag = args.split(' ').next().unwrap();
    assert!(include_flag.ends_with("common\\"), "got: {}", include_flag);
    assert!(!include_flag.contains(".."), "got: {}", include_flag);
}

#[test]
fn test_summary_json_written() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fx.write_manifest(
        r#"{"shader_root": "shaders", "common_options": [], "shaders": [{"file": "a.slang"}]}"#,
    );

    let summary = fx
        .pipeline(|c| c.summary_path = Some(PathBuf::from("out/run_summary.json")))
        .execute()
        .unwrap();

    let json = fs::read_to_string(fx.output("run_summary.json")).unwrap();
    let reloaded = RunSummary::from_json(&json).unwrap();
    assert_eq!(reloaded.run_id, summary.run_id);
    assert_eq!(reloaded.success_count, 1);
    assert_eq!(reloaded.manifest_sha256.as_deref().map(str::len), Some(64));
}

// =============================================================================
// Failing jobs
// =============================================================================

#[test]
fn test_missing_source_and_success_mix() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "common_options": [],
            "shaders": [{"file": "a.slang"}, {"file": "missing.slang"}]
        }"#,
    );

    let summary = fx.pipeline(|_| {}).execute().unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.submitted_count, 1);
    assert_eq!(summary.exit_code(), EXIT_FAILURE);
    assert_eq!(summary.failures[0].alias, "missing.slang");
    assert_eq!(summary.failures[0].kind, FailureKind::InputMissing);
    assert!(fx.output("a.spv").exists());
    assert!(!fx.output("missing.spv").exists());
}

#[test]
fn test_failed_compile_removes_partial_artifact() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("good.slang");
    fx.add_shader("broken.slang");
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "common_options": [],
            "shaders": [{"file": "good.slang"}, {"file": "broken.slang"}]
        }"#,
    );

    let summary = fx.pipeline(|_| {}).execute().unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.failures[0].kind, FailureKind::CompileFailed);
    assert!(summary.failures[0].message.contains("undefined identifier"));
    assert!(fx.output("good.spv").exists());
    assert!(!fx.output("broken.spv").exists());
}

#[test]
fn test_alias_without_file_name_fails_that_job_only() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fx.add_shader("b.slang");
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "common_options": [],
            "shaders": [{"file": "a.slang"}, {"file": "b.slang", "alias": ".."}]
        }"#,
    );

    let summary = fx.pipeline(|_| {}).execute().unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.failures[0].kind, FailureKind::InvalidOutputName);
    assert!(fx.root().join("out").is_dir());
    assert!(fx.output("a.spv").exists());
}

#[test]
fn test_hung_compile_times_out() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("hang.slang");
    fx.add_shader("quick.slang");
    fx.write_manifest(
        r#"{
            "shader_root": "shaders",
            "common_options": [],
            "shaders": [{"file": "hang.slang"}, {"file": "quick.slang"}]
        }"#,
    );

    let summary = fx
        .pipeline(|c| c.timeouts = TimeoutConfig::from_overrides(None, Some(1)))
        .execute()
        .unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.failure_count, 1);
    assert_eq!(summary.failures[0].alias, "hang.slang");
    assert_eq!(summary.failures[0].kind, FailureKind::TimedOut);
    assert!(!fx.output("hang.spv").exists());
}

// =============================================================================
// Batch-level failures
// =============================================================================

#[test]
fn test_broken_compiler_aborts_before_any_job() {
    let fx = Fixture::new();
    fx.install_compiler(BROKEN_SLANGC);
    fx.add_shader("a.slang");
    fx.write_manifest(
        r#"{"shader_root": "shaders", "common_options": [], "shaders": [{"file": "a.slang"}]}"#,
    );

    let err = fx.pipeline(|_| {}).execute().unwrap_err();

    match err {
        PipelineError::Environment(EnvironmentError::NonZeroExit { code, ref stderr }) => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("license check failed"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.exit_code(), EXIT_FAILURE);
    assert!(!fx.root().join("out").exists());
}

#[test]
fn test_invalid_manifest_aborts() {
    let fx = Fixture::new();
    fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fx.write_manifest(r#"{"common_options": [], "shaders": [{"alias": "x.slang"}]}"#);

    let err = fx.pipeline(|_| {}).execute().unwrap_err();

    assert!(matches!(err, PipelineError::Manifest(_)), "got: {:?}", err);
    assert!(!fx.output("a.spv").exists());
}

#[test]
fn test_absolute_compiler_path() {
    let fx = Fixture::new();
    let compiler = fx.install_compiler(FAKE_SLANGC);
    fx.add_shader("a.slang");
    fx.write_manifest(
        r#"{"shader_root": "shaders", "common_options": [], "shaders": [{"file": "a.slang"}]}"#,
    );

    let summary = fx.pipeline(|c| c.compiler = compiler).execute().unwrap();
    assert!(summary.is_success());
}
