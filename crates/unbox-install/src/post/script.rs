use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::HookError;
use crate::hooks::{HookContext, InstallHook};

#[cfg(not(windows))]
const SCRIPT_EXTENSION: &str = "sh";
#[cfg(windows)]
const SCRIPT_EXTENSION: &str = "bat";

/// Runs `pre-install` and `post-install` scripts from a hooks directory.
///
/// A script receives the install directory as its first argument. Missing
/// scripts are skipped; a script exiting non-zero fails the install.
#[derive(Clone, Debug)]
pub struct ScriptHook {
    dir: PathBuf,
}

impl ScriptHook {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn script_path(&self, stage: &str) -> PathBuf { self.dir.join(format!("{stage}.{SCRIPT_EXTENSION}")) }

    fn run(&self, stage: &str, target_dir: &Path) -> Result<(), HookError> {
        let script = self.script_path(stage);
        if !script.is_file() {
            tracing::debug!("no {} script at {}", stage, script.display());
            return Ok(());
        }

        #[cfg(unix)]
        if let Err(e) = unbox_fs::FileMode::from(0o755).apply_to_path(&script) {
            tracing::debug!("{}", e);
        }

        let output = shell_command(&script)
            .arg(target_dir)
            .output()
            .map_err(|e| HookError::Spawn {
                script: script.clone(),
                source: e,
            })?;

        tracing::info!(
            "{} hook output:\n{}{}",
            stage,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(HookError::ScriptFailed {
                script,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(not(windows))]
fn shell_command(script: &Path) -> Command {
    let mut command = Command::new("/bin/sh");
    command.arg(script);
    command
}

#[cfg(windows)]
fn shell_command(script: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(script);
    command
}

impl InstallHook for ScriptHook {
    fn name(&self) -> &'static str { "script" }

    fn required(&self) -> bool { true }

    fn pre_install(&self, ctx: &mut HookContext) -> Result<(), HookError> { self.run("pre-install", &ctx.target_dir) }

    fn post_install(&self, ctx: &mut HookContext) -> Result<(), HookError> { self.run("post-install", &ctx.target_dir) }
}
