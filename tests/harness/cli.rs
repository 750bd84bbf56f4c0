//! Runs the `permtree` binary built for this test run

use std::process::Command;

/// Captured result of one CLI invocation
#[derive(Debug)]
pub struct CliOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `permtree` with the given arguments and a clean environment
pub fn permtree(args: &[&str]) -> CliOutput {
    permtree_with_env(args, &[])
}

/// Run `permtree` with extra environment variables
pub fn permtree_with_env(args: &[&str], vars: &[(&str, &str)]) -> CliOutput {
    let output = Command::new(env!("CARGO_BIN_EXE_permtree"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("PERMTREE_DATABASE")
        .env("PERMTREE_LOG_FILTER", "permtree=warn")
        .envs(vars.iter().copied())
        .output()
        .expect("Failed to spawn permtree binary");

    CliOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
