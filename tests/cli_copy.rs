//! Integration tests for the `copyko` binary.
//!
//! Module files in these trees contain modinfo-style text and `cat` is used
//! as the metadata program, so no real kernel modules are needed.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Fixture {
    _tmp: tempfile::TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let root = tmp.path().to_path_buf();
        fs::create_dir_all(root.join("sys/lib/modules/6.0/kernel"))
            .expect("Failed to create module tree");
        fs::create_dir_all(root.join("sys/lib/firmware")).expect("Failed to create firmware dir");
        Self { _tmp: tmp, root }
    }

    fn source(&self) -> PathBuf {
        self.root.join("sys/lib/modules/6.0")
    }

    fn dest(&self) -> PathBuf {
        self.root.join("stage/lib/modules/6.0")
    }

    fn fw_dest(&self) -> PathBuf {
        self.root.join("stage/lib/firmware")
    }

    fn module(&self, rel: &str, depends: &str, firmware: &str) -> &Self {
        let path = self.source().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut text = format!("filename: {}\n", path.display());
        if !firmware.is_empty() {
            text.push_str(&format!("firmware: {firmware}\n"));
        }
        text.push_str(&format!("depends: {depends}\n"));
        fs::write(path, text).expect("Failed to write module");
        self
    }

    fn firmware(&self, name: &str) -> &Self {
        let path = self.root.join("sys/lib/firmware").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, name).expect("Failed to write firmware");
        self
    }

    fn run(&self, args: &[&str]) -> Output {
        let source = self.source();
        let dest = self.dest();
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_copyko"));
        cmd.arg("--from")
            .arg(&source)
            .arg("--modinfo")
            .arg("cat")
            .args(args)
            .arg(&dest)
            .env_remove("COPYKO_FROM")
            .env_remove("COPYKO_FWSRC")
            .env_remove("COPYKO_FWDST")
            .env_remove("COPYKO_MODINFO")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd.output().expect("Failed to execute copyko")
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn exists(path: &Path) -> bool {
    path.is_file()
}

#[test]
fn test_copies_dependency_closure_and_firmware() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "b", "")
        .module("kernel/sub/b.ko", "", "fw1.bin")
        .module("kernel/unrelated.ko", "", "")
        .firmware("fw1.bin");

    let out = fx.run(&["a"]);

    assert!(out.status.success(), "copyko failed: {}", stderr(&out));
    assert!(exists(&fx.dest().join("kernel/a.ko")));
    assert!(exists(&fx.dest().join("kernel/sub/b.ko")));
    assert!(!fx.dest().join("kernel/unrelated.ko").exists());
    assert!(exists(&fx.fw_dest().join("fw1.bin")));
}

#[test]
fn test_missing_module_is_reported_and_others_continue() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "", "");

    let out = fx.run(&["ghost", "a"]);

    assert!(out.status.success());
    assert!(stderr(&out).contains("ghost not found"));
    assert!(exists(&fx.dest().join("kernel/a.ko")));
}

#[test]
fn test_duplicate_module_names_keep_first() {
    let fx = Fixture::new();
    fx.module("kernel/a/net.ko", "", "")
        .module("kernel/b/net.ko", "", "");

    let out = fx.run(&["net"]);

    assert!(out.status.success());
    assert!(stderr(&out).contains("more than one module with name net"));
    assert!(exists(&fx.dest().join("kernel/a/net.ko")));
    assert!(!fx.dest().join("kernel/b/net.ko").exists());
}

#[test]
fn test_verbose_reports_attribution() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "c", "")
        .module("kernel/b.ko", "c", "")
        .module("kernel/c.ko", "", "");

    let out = fx.run(&["-v", "b", "a"]);

    assert!(out.status.success(), "copyko failed: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.contains("Module c is pulled in by a b"), "stdout: {text}");
    assert!(text.contains("=>"));
    assert!(!text.contains("You can omit"));
}

#[test]
fn test_verbose_reports_redundant_request() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "b", "")
        .module("kernel/b.ko", "", "");

    let out = fx.run(&["-v", "a", "b"]);

    let text = stdout(&out);
    assert!(text.contains("Module b is dependency for a"), "stdout: {text}");
    assert!(text.contains("You can omit dependency modules"));
}

#[test]
fn test_dry_run_does_not_touch_destination() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "b", "")
        .module("kernel/b.ko", "", "fw1.bin");

    let out = fx.run(&["--dry-run", "a"]);

    assert!(out.status.success());
    assert!(!fx.dest().exists());
    let text = stdout(&out);
    assert!(text.contains("kernel/b.ko"));
    assert!(text.contains("fw1.bin"));
}

#[test]
fn test_link_mode_creates_hard_links() {
    use std::os::unix::fs::MetadataExt;

    let fx = Fixture::new();
    fx.module("kernel/a.ko", "", "");

    let out = fx.run(&["--link", "a"]);

    assert!(out.status.success());
    let src = fs::metadata(fx.source().join("kernel/a.ko")).unwrap();
    let dst = fs::metadata(fx.dest().join("kernel/a.ko")).unwrap();
    assert_eq!(src.ino(), dst.ino());
    assert!(!stderr(&out).contains("hard link"));
}

#[test]
fn test_existing_destination_file_is_kept() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "", "");
    fs::create_dir_all(fx.dest().join("kernel")).unwrap();
    fs::write(fx.dest().join("kernel/a.ko"), "old").unwrap();

    let out = fx.run(&["a"]);

    assert!(out.status.success());
    assert_eq!(fs::read_to_string(fx.dest().join("kernel/a.ko")).unwrap(), "old");
    assert!(stdout(&out).contains("already present 1"));
}

#[test]
fn test_missing_firmware_is_not_fatal() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "", "nowhere.bin");

    let out = fx.run(&["a"]);

    assert!(out.status.success());
    assert!(stderr(&out).contains("firmware nowhere.bin not found"));
    assert!(exists(&fx.dest().join("kernel/a.ko")));
}

#[test]
fn test_too_few_arguments_is_usage_error() {
    let out = Command::new(env!("CARGO_BIN_EXE_copyko"))
        .args(["--from", "/nonexistent", "only-dest"])
        .env_remove("COPYKO_FROM")
        .output()
        .expect("Failed to execute copyko");

    assert!(!out.status.success());
    assert!(stderr(&out).contains("Usage"));
}

#[test]
fn test_options_may_follow_module_names() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "", "").module("kernel/b.ko", "", "");

    let out = fx.run(&["a", "-v", "b", "--link"]);

    assert!(out.status.success(), "copyko failed: {}", stderr(&out));
    assert!(stdout(&out).contains("Destination directory is"));
    assert!(exists(&fx.dest().join("kernel/a.ko")));
    assert!(exists(&fx.dest().join("kernel/b.ko")));
}

#[test]
fn test_single_positional_is_usage_error() {
    let fx = Fixture::new();
    fx.module("kernel/a.ko", "", "");

    let out = fx.run(&["-v"]);

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Usage"));
    assert!(!fx.dest().exists());
}

#[test]
fn test_missing_source_root_is_fatal() {
    let fx = Fixture::new();
    let out = Command::new(env!("CARGO_BIN_EXE_copyko"))
        .arg("--from")
        .arg(fx.root.join("nope"))
        .arg("a")
        .arg(fx.dest())
        .env_remove("COPYKO_FROM")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute copyko");

    assert!(!out.status.success());
    assert!(stderr(&out).contains("is not a directory"));
}
