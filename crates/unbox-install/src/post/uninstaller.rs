use std::path::Path;

use crate::error::HookError;
use crate::hooks::{HookContext, InstallHook};

const DEFAULT_UNINSTALLER_NAME: &str = "uninstall";

/// Writes a shell script into the install directory that removes the
/// installed files again.
///
/// Unix only. Run after hooks that add artifacts so they are removed too.
#[derive(Clone, Copy, Debug, Default)]
pub struct UninstallerHook;

/// Single-quote `path` for `/bin/sh`.
fn shell_quote(path: &Path) -> String { format!("'{}'", path.to_string_lossy().replace('\'', r"'\''")) }

/// Script body removing every installed item, the artifacts and itself.
pub fn uninstall_script(ctx: &HookContext, script_path: &Path) -> String {
    let mut script = String::from("#!/bin/sh\n");
    let product = ctx.variable("product");
    if !product.is_empty() {
        script.push_str(&format!("# Removes {} from {}\n", product, ctx.target_dir.display()));
    }

    // reverse install order: contents before their directory
    for item in &ctx.installed {
        if item.is_dir {
            script.push_str(&format!("rmdir {} 2>/dev/null\n", shell_quote(&item.path)));
        } else {
            script.push_str(&format!("rm -f {}\n", shell_quote(&item.path)));
        }
    }
    for artifact in &ctx.artifacts {
        script.push_str(&format!("rm -f {}\n", shell_quote(artifact)));
    }
    script.push_str(&format!("rm -f {}\n", shell_quote(script_path)));
    script
}

impl InstallHook for UninstallerHook {
    fn name(&self) -> &'static str { "uninstaller" }

    #[cfg(unix)]
    fn post_install(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        let name = match ctx.variable("uninstaller_name") {
            "" => DEFAULT_UNINSTALLER_NAME,
            name => name,
        };
        let path = ctx.target_dir.join(format!("{name}.sh"));
        let content = uninstall_script(ctx, &path);

        unbox_fs::write_file(&mut content.as_bytes(), &path, unbox_fs::FileMode::from(0o755))?;
        tracing::info!("created uninstaller {}", path.display());
        ctx.artifacts.push(path);
        Ok(())
    }

    #[cfg(not(unix))]
    fn post_install(&self, _ctx: &mut HookContext) -> Result<(), HookError> { Ok(()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::InstalledItem;
    use std::path::PathBuf;

    #[test]
    fn quoting_survives_single_quotes() {
        assert_eq!(shell_quote(Path::new("/opt/it's")), r"'/opt/it'\''s'");
    }

    #[test]
    fn script_lists_items_then_artifacts_then_itself() {
        let ctx = HookContext {
            target_dir: PathBuf::from("/opt/app"),
            installed: vec![
                InstalledItem {
                    path:   PathBuf::from("/opt/app/bin/tool"),
                    is_dir: false,
                },
                InstalledItem {
                    path:   PathBuf::from("/opt/app/bin"),
                    is_dir: true,
                },
            ],
            artifacts: vec![PathBuf::from("/home/u/.local/share/applications/app.desktop")],
            ..Default::default()
        };

        let script = uninstall_script(&ctx, Path::new("/opt/app/uninstall.sh"));
        let lines: Vec<_> = script.lines().collect();

        assert_eq!(
            lines,
            [
                "#!/bin/sh",
                "rm -f '/opt/app/bin/tool'",
                "rmdir '/opt/app/bin' 2>/dev/null",
                "rm -f '/home/u/.local/share/applications/app.desktop'",
                "rm -f '/opt/app/uninstall.sh'",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn written_script_removes_install() {
        let target = tempfile::tempdir().unwrap();
        let bin = target.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        std::fs::write(bin.join("tool"), "x").unwrap();

        let mut ctx = HookContext {
            target_dir: target.path().to_path_buf(),
            installed: vec![
                InstalledItem {
                    path:   bin.join("tool"),
                    is_dir: false,
                },
                InstalledItem {
                    path:   bin.clone(),
                    is_dir: true,
                },
            ],
            ..Default::default()
        };
        ctx.variables.insert("uninstaller_name".into(), "remove-app".into());

        UninstallerHook.post_install(&mut ctx).unwrap();
        let script = target.path().join("remove-app.sh");
        assert_eq!(ctx.artifacts, vec![script.clone()]);

        let status = std::process::Command::new("/bin/sh").arg(&script).status().unwrap();
        assert!(status.success());
        assert_eq!(std::fs::read_dir(target.path()).unwrap().count(), 0);
    }
}
