use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

pub const DEFAULT_LANG: &str = "en";
const PAYLOAD_ARCHIVE: &str = "payload.zip";
const PAYLOAD_DIR: &str = "payload";
const RESOURCES_DIR: &str = "resources";

/// Read the payload from standard input.
pub const STDIN_PAYLOAD: &str = "-";

#[derive(Clone, Debug, Parser)]
#[command(name = "unbox", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    #[arg(long, value_name = "DIR", help = "Install into DIR without a graphical frontend")]
    pub target: Option<PathBuf>,

    #[arg(long, help = "Accept the license agreement")]
    pub accept: bool,

    #[arg(long, help = "Print the license agreement and exit")]
    pub license: bool,

    #[arg(long = "no-launcher", help = "Do not create a desktop launcher entry")]
    pub no_launcher: bool,

    #[arg(long, help = "Run the installed application after a successful install")]
    pub run: bool,

    #[arg(long, value_name = "LANG", default_value = DEFAULT_LANG, help = "Language of the license text")]
    pub lang: String,

    #[arg(
        long,
        value_name = "PATH",
        help = "Zip archive or directory to install, '-' to read an archive from stdin"
    )]
    pub payload: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Directory holding config.toml, licenses/ and hooks/")]
    pub resources: Option<PathBuf>,
}

impl App {
    pub fn resources_dir(&self) -> Result<PathBuf> {
        match &self.resources {
            Some(dir) => Ok(dir.clone()),
            None => Ok(exe_dir()?.join(RESOURCES_DIR)),
        }
    }

    /// The payload given on the command line, or the first of
    /// `payload.zip` and `payload/` found next to the executable.
    pub fn payload_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.payload {
            return Ok(path.clone());
        }
        let dir = exe_dir()?;
        let archive = dir.join(PAYLOAD_ARCHIVE);
        if archive.exists() {
            return Ok(archive);
        }
        Ok(dir.join(PAYLOAD_DIR))
    }

    pub fn reads_stdin(&self) -> bool { self.payload.as_deref() == Some(Path::new(STDIN_PAYLOAD)) }
}

/// `<resources>/licenses/license_<lang>.txt`, falling back to English.
pub fn license_path(resources: &Path, lang: &str) -> PathBuf {
    let licenses = resources.join("licenses");
    let localized = licenses.join(format!("license_{lang}.txt"));
    if localized.exists() || lang == DEFAULT_LANG {
        return localized;
    }
    log::debug!("no license for '{}', using {}", lang, DEFAULT_LANG);
    licenses.join(format!("license_{DEFAULT_LANG}.txt"))
}

fn exe_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the installer executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .context("Installer executable has no parent directory")
}
