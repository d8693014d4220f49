#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Isolated install home; every command skips host checks so tests run
/// without docker or root.
pub struct TestContext {
    pub cmd: Command,
    pub home: PathBuf,
    _temp_dir: TempDir,
}

impl TestContext {
    pub fn new_cmd(&self) -> Command {
        new_cmd(&self.home)
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::create_dir_all(&self.home).expect("Failed to create home");
        std::fs::write(self.home.join("config.json"), contents).expect("Failed to write config");
    }
}

fn new_cmd(home: &Path) -> Command {
    let bin_path = env!("CARGO_BIN_EXE_ambar");
    let mut cmd = Command::new(bin_path);
    cmd.timeout(Duration::from_secs(30));
    cmd.env_remove("AMBAR_HOME");
    cmd.env_remove("AMBAR_COMPOSE");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--home").arg(home).arg("--skip-checks");
    cmd
}

pub fn ambar() -> TestContext {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let home = temp_dir.path().join("home");
    TestContext {
        cmd: new_cmd(&home),
        home,
        _temp_dir: temp_dir,
    }
}
