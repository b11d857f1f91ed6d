use std::path::PathBuf;

use crate::error::HookError;
use crate::hooks::{HookContext, InstallHook};

const USER_APPLICATIONS_DIR: &str = ".local/share/applications";
const SYSTEM_APPLICATIONS_DIR: &str = "/usr/share/applications";

/// Creates a desktop launcher entry for the installed application.
///
/// On Linux this writes a freedesktop `.desktop` file into the user's
/// applications directory, or the system-wide one when running as root.
/// Elsewhere it does nothing.
#[derive(Clone, Debug, Default)]
pub struct LauncherHook {
    applications_dir: Option<PathBuf>,
}

impl LauncherHook {
    pub fn new() -> Self { Self::default() }

    /// Write entries into `dir` instead of the platform default.
    pub fn with_applications_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.applications_dir = Some(dir.into());
        self
    }

    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    fn applications_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.applications_dir {
            return Some(dir.clone());
        }
        if unbox_fs::is_privileged() {
            return Some(PathBuf::from(SYSTEM_APPLICATIONS_DIR));
        }
        home::home_dir().map(|home| home.join(USER_APPLICATIONS_DIR))
    }
}

/// `<company>-<product>.desktop`, lower case without spaces.
pub fn desktop_file_name(ctx: &HookContext) -> String {
    let squash = |s: &str| s.to_lowercase().replace(' ', "");
    let company = squash(ctx.variable("company_short"));
    let product = squash(ctx.variable("product"));
    if company.is_empty() {
        format!("{product}.desktop")
    } else {
        format!("{company}-{product}.desktop")
    }
}

pub fn desktop_entry(ctx: &HookContext) -> String {
    let install_dir = ctx.target_dir.display();
    format!(
        "[Desktop Entry]\n\
         Name={product}\n\
         Version={version}\n\
         Type=Application\n\
         Icon={install_dir}/{icon}\n\
         Exec={install_dir}/{exec}\n\
         Comment={tagline}\n\
         Terminal={terminal}\n",
        product = ctx.variable("product"),
        version = ctx.variable("version"),
        icon = ctx.variable("icon_file"),
        exec = ctx.variable("start_command"),
        tagline = ctx.variable("tagline"),
        terminal = ctx.variable("show_terminal_during_app_run"),
    )
}

impl InstallHook for LauncherHook {
    fn name(&self) -> &'static str { "launcher" }

    #[cfg(target_os = "linux")]
    fn post_install(&self, ctx: &mut HookContext) -> Result<(), HookError> {
        if !ctx.create_launcher {
            tracing::debug!("launcher entry disabled");
            return Ok(());
        }
        let dir = self.applications_dir().ok_or(HookError::NoHome {
            what: "launcher entry",
        })?;
        std::fs::create_dir_all(&dir).map_err(|e| HookError::Write {
            path: dir.clone(),
            source: e,
        })?;

        let path = dir.join(desktop_file_name(ctx));
        let content = desktop_entry(ctx);
        unbox_fs::write_file(&mut content.as_bytes(), &path, unbox_fs::FileMode::from(0o755))?;
        tracing::info!("created launcher entry {}", path.display());
        ctx.artifacts.push(path);
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn post_install(&self, _ctx: &mut HookContext) -> Result<(), HookError> {
        Ok(()) // No-op on non-Linux
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> HookContext {
        let mut ctx = HookContext {
            target_dir: PathBuf::from("/opt/acme-studio"),
            create_launcher: true,
            ..Default::default()
        };
        for (k, v) in [
            ("product", "Acme Studio"),
            ("company_short", "Acme Corp"),
            ("version", "2.1"),
            ("icon_file", "icon.png"),
            ("start_command", "bin/studio"),
            ("tagline", "Make things"),
            ("show_terminal_during_app_run", "false"),
        ] {
            ctx.variables.insert(k.to_string(), v.to_string());
        }
        ctx
    }

    #[test]
    fn file_name_is_squashed() {
        assert_eq!(desktop_file_name(&context()), "acmecorp-acmestudio.desktop");

        let mut ctx = context();
        ctx.variables.remove("company_short");
        assert_eq!(desktop_file_name(&ctx), "acmestudio.desktop");
    }

    #[test]
    fn entry_points_into_install_dir() {
        let entry = desktop_entry(&context());
        assert!(entry.starts_with("[Desktop Entry]\nName=Acme Studio\n"));
        assert!(entry.contains("Exec=/opt/acme-studio/bin/studio\n"));
        assert!(entry.contains("Icon=/opt/acme-studio/icon.png\n"));
        assert!(entry.ends_with("Terminal=false\n"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn writes_entry_and_records_artifact() {
        let apps = tempfile::tempdir().unwrap();
        let hook = LauncherHook::new().with_applications_dir(apps.path().join("applications"));
        let mut ctx = context();

        hook.post_install(&mut ctx).unwrap();

        let expected = apps.path().join("applications/acmecorp-acmestudio.desktop");
        assert_eq!(ctx.artifacts, vec![expected.clone()]);
        assert!(std::fs::read_to_string(expected).unwrap().contains("Version=2.1"));
    }

    #[test]
    fn disabled_launcher_writes_nothing() {
        let apps = tempfile::tempdir().unwrap();
        let hook = LauncherHook::new().with_applications_dir(apps.path());
        let mut ctx = context();
        ctx.create_launcher = false;

        hook.post_install(&mut ctx).unwrap();

        assert!(ctx.artifacts.is_empty());
        assert_eq!(std::fs::read_dir(apps.path()).unwrap().count(), 0);
    }
}
