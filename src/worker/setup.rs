//! The wizard's step chains: automatic setup, interactive setup (which
//! starts from an empty build cache) and uninstall.
//!
//! Paths and source URLs come from the `[setup]` section of the config and
//! are captured when the chain is built.

use super::{Step, StepChain, StepContext, run_commands, run_command, shell_quote};
use crate::config::Config;
use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use walkdir::WalkDir;

const SECTION: &str = "setup";
const ARCHIVE_SUFFIXES: [&str; 2] = [".tar.gz", ".tgz"];

#[derive(Clone, Debug)]
struct Layout {
    root: PathBuf,
    download: PathBuf,
    build: PathBuf,
}

impl Layout {
    fn from_config(config: &Config) -> Self {
        let path = |key| config.get_path(SECTION, key).unwrap_or_default();
        Self {
            root: path("install-root"),
            download: path("download"),
            build: path("build"),
        }
    }

    fn root_dir(&self, sub: &str) -> String {
        self.root.join(sub).display().to_string()
    }
}

fn source_url(config: &Config, key: &str) -> String {
    config.get_or(SECTION, key, "").to_string()
}

/// First path component of the archive's first entry.
fn archive_top_dir(archive: &Path) -> Result<String> {
    let listing = Command::new("tar")
        .arg("-tzf")
        .arg(archive)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()?;
    let list_error = |reason: String| Error::Worker {
        name: archive.display().to_string(),
        reason,
    };
    if !listing.status.success() {
        return Err(list_error(format!("listing returned {}", listing.status)));
    }
    String::from_utf8_lossy(&listing.stdout)
        .lines()
        .find_map(|entry| {
            Path::new(entry).components().find_map(|part| match part {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
        })
        .ok_or_else(|| list_error("archive is empty".to_string()))
}

/// Download `url` into `download_dir` unless it is already there, then
/// unpack it into `build_dir` unless that was already done. Returns the
/// unpacked source directory: the archive's top-level directory, which
/// need not match the file name.
///
/// # Errors
///
/// [`Error::Worker`] when the URL does not name a gzipped tarball, the
/// download, listing or unpack command fails, or the archive has no
/// top-level directory.
pub fn fetch_archive(url: &str, download_dir: &Path, build_dir: &Path, ctx: &StepContext<'_>) -> Result<PathBuf> {
    let fetch_error = |reason: String| Error::Worker {
        name: url.to_string(),
        reason,
    };
    let file_name = url
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| fetch_error("URL has no file name".to_string()))?;
    let stem = ARCHIVE_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .ok_or_else(|| fetch_error(format!("'{file_name}' is not a gzipped tarball")))?;

    fs::create_dir_all(download_dir)?;
    fs::create_dir_all(build_dir)?;
    let archive = download_dir.join(file_name);

    ctx.output.line(&format!("Please wait while we download {url}"));
    if archive.exists() {
        tracing::debug!(archive = %archive.display(), "using cached download");
    } else {
        let download = format!("curl -fL -o {} {}", shell_quote(&archive.to_string_lossy()), shell_quote(url));
        let code = run_command(&download, None, ctx.output, ctx.control)?;
        if code != 0 {
            // A partial file would be taken for a cached download next time.
            let _ = fs::remove_file(&archive);
            return Err(fetch_error(format!("download returned {code}")));
        }
    }
    ctx.output.line(&format!("Finished downloading {url}"));

    // Archives named after their directory are recognised without listing.
    let named = build_dir.join(stem);
    let source = if named.is_dir() { named } else { build_dir.join(archive_top_dir(&archive)?) };
    if !source.exists() {
        let unpack = format!(
            "tar -xzf {} -C {}",
            shell_quote(&archive.to_string_lossy()),
            shell_quote(&build_dir.to_string_lossy())
        );
        let code = run_command(&unpack, None, ctx.output, ctx.control)?;
        if code != 0 {
            return Err(fetch_error(format!("unpacking returned {code}")));
        }
        if !source.is_dir() {
            return Err(fetch_error(format!("archive did not unpack to {}", source.display())));
        }
    }
    Ok(source)
}

fn build_step(name: &str, url: String, layout: &Layout, commands: Vec<String>) -> Step {
    let layout = layout.clone();
    let step = name.to_string();
    Step::new(name, move |ctx| {
        let source = fetch_archive(&url, &layout.download, &layout.build, ctx)?;
        run_commands(&step, Some(&source), &commands, ctx)
    })
}

fn make_install() -> [String; 2] {
    ["make".to_string(), "make install".to_string()]
}

/// Download, build and install OpenSSL, libevent, the resources and
/// Shadow into the configured install root. Archives already unpacked in
/// the build cache are reused.
#[must_use]
pub fn auto_setup(config: &Config) -> StepChain {
    install_steps(StepChain::new("Auto Setup"), config)
}

/// [`auto_setup`] after removing the build cache. The download cache is
/// kept.
#[must_use]
pub fn interactive_setup(config: &Config) -> StepChain {
    let build = vec![Layout::from_config(config).build];
    let chain = StepChain::new("Interactive Setup")
        .with(Step::new("clear build cache", move |ctx| remove_dirs(&build, ctx)));
    install_steps(chain, config)
}

fn install_steps(chain: StepChain, config: &Config) -> StepChain {
    let layout = Layout::from_config(config);
    let root = layout.root.display().to_string();
    let prefix = shell_quote(&format!("--prefix={root}"));

    let mut openssl = vec![format!("./config {prefix} -fPIC shared")];
    openssl.extend(make_install());

    let mut libevent = vec![format!(
        "./configure {prefix} {} {}",
        shell_quote(&format!("CFLAGS=-fPIC -I{}", layout.root_dir("include"))),
        shell_quote(&format!("LDFLAGS=-L{}", layout.root_dir("lib"))),
    )];
    libevent.extend(make_install());

    let shadow_url = source_url(config, "shadow");
    let shadow_layout = layout.clone();
    let shadow = Step::new("shadow", move |ctx| {
        let layout = shadow_layout;
        let source = fetch_archive(&shadow_url, &layout.download, &layout.build, ctx)?;
        let build = source.join("build");
        fs::create_dir_all(&build)?;
        let mut commands = vec![format!(
            "cmake {} {} {} {} {}",
            shell_quote(&source.to_string_lossy()),
            shell_quote(&format!("-DCMAKE_BUILD_PREFIX={}", build.display())),
            shell_quote(&format!("-DCMAKE_INSTALL_PREFIX={}", layout.root.display())),
            shell_quote(&format!("-DCMAKE_EXTRA_INCLUDES={}", layout.root_dir("include"))),
            shell_quote(&format!("-DCMAKE_EXTRA_LIBRARIES={}", layout.root_dir("lib"))),
        )];
        commands.extend(make_install());
        run_commands("shadow", Some(&build), &commands, ctx)
    });

    chain
        .with(build_step("openssl", source_url(config, "openssl"), &layout, openssl))
        .with(build_step("libevent", source_url(config, "libevent"), &layout, libevent))
        .with(build_step("resources", source_url(config, "resources"), &layout, Vec::new()))
        .with(shadow)
}

fn remove_dirs(dirs: &[PathBuf], ctx: &StepContext<'_>) -> Result<()> {
    for dir in dirs {
        match fs::remove_dir_all(dir) {
            Ok(()) => ctx.output.line(&format!("Removed {}", dir.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Remove files under `dir` whose name contains `pattern`.
fn remove_matching(dir: &Path, pattern: &str, ctx: &StepContext<'_>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(dir).contents_first(true) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() || !entry.file_name().to_string_lossy().contains(pattern) {
            continue;
        }
        fs::remove_file(entry.path())?;
        ctx.output.line(&format!("Removed {}", entry.path().display()));
    }
    Ok(())
}

/// Remove the caches and everything Shadow installed. The config file is
/// left alone.
#[must_use]
pub fn uninstall(config: &Config) -> StepChain {
    let layout = Layout::from_config(config);
    let config_path = config
        .path()
        .map_or_else(|| "memory".to_string(), |path| path.display().to_string());

    let caches = vec![layout.build.clone(), layout.download.clone()];
    let shared = vec![layout.root.join("share").join("shadow")];
    let lib = layout.root.join("lib");
    let bin = layout.root.join("bin");

    StepChain::new("Uninstall")
        .with(Step::new("remove caches", move |ctx| remove_dirs(&caches, ctx)))
        .with(Step::new("remove shared files", move |ctx| remove_dirs(&shared, ctx)))
        .with(Step::new("remove libraries", move |ctx| remove_matching(&lib, "libshadow", ctx)))
        .with(Step::new("remove programs", move |ctx| remove_matching(&bin, "shadow", ctx)))
        .with(Step::new("report", move |ctx| {
            ctx.output.line(&format!(
                "Uninstall complete! Configuration options left in {config_path}"
            ));
            Ok(())
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::AsyncBridge;
    use crate::context::UiContext;
    use crate::log::{LogLevel, LogPanel};
    use crate::worker::{ChainOutcome, WorkerControl};

    fn config_in(root: &Path) -> Config {
        let mut config = Config::default();
        config.set(SECTION, "install-root", root.join("install").to_string_lossy());
        config.set(SECTION, "download", root.join("download").to_string_lossy());
        config.set(SECTION, "build", root.join("build").to_string_lossy());
        config
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_auto_setup_steps() {
        let chain = auto_setup(&Config::default());
        assert_eq!(chain.name(), "Auto Setup");
        assert_eq!(
            chain.step_names().collect::<Vec<_>>(),
            ["openssl", "libevent", "resources", "shadow"]
        );
    }

    #[test]
    fn test_interactive_setup_clears_build_cache_first() {
        let chain = interactive_setup(&Config::default());
        assert_eq!(chain.name(), "Interactive Setup");
        assert_eq!(
            chain.step_names().collect::<Vec<_>>(),
            ["clear build cache", "openssl", "libevent", "resources", "shadow"]
        );

        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("build/openssl-1.0/Makefile"));
        touch(&dir.path().join("download/openssl-1.0.tar.gz"));
        let mut config = config_in(dir.path());
        // No source URLs, so the chain stops at the first download.
        config.set(SECTION, "openssl", "");

        let log = LogPanel::new(UiContext::headless(40, 5), 0, LogLevel::Info, 50);
        let output = AsyncBridge::new();
        let outcome = interactive_setup(&config).run(&StepContext {
            log: &log.sender(),
            output: &output.sender(),
            control: &WorkerControl::new(),
        });
        assert_eq!(outcome, ChainOutcome::Failed { step: "openssl".into() });
        assert!(!dir.path().join("build").exists());
        assert!(dir.path().join("download/openssl-1.0.tar.gz").exists());
    }

    #[test]
    fn test_uninstall_removes_installed_files() {
        let dir = tempfile::tempdir().unwrap();
        let install = dir.path().join("install");
        touch(&dir.path().join("build/shadow-release/CMakeLists.txt"));
        touch(&dir.path().join("download/shadow-release.tar.gz"));
        touch(&install.join("share/shadow/plugin.xml"));
        touch(&install.join("lib/libshadow-util.so"));
        touch(&install.join("lib/nested/libshadow-x.so"));
        touch(&install.join("lib/libevent.so"));
        touch(&install.join("bin/shadow"));
        touch(&install.join("bin/scallion-shadow"));
        touch(&install.join("bin/other"));

        let log = LogPanel::new(UiContext::headless(40, 5), 0, LogLevel::Info, 50);
        let output = AsyncBridge::new();
        let outcome = uninstall(&config_in(dir.path())).run(&StepContext {
            log: &log.sender(),
            output: &output.sender(),
            control: &WorkerControl::new(),
        });
        assert_eq!(outcome, ChainOutcome::Completed);

        assert!(!dir.path().join("build").exists());
        assert!(!dir.path().join("download").exists());
        assert!(!install.join("share/shadow").exists());
        assert!(!install.join("lib/libshadow-util.so").exists());
        assert!(!install.join("lib/nested/libshadow-x.so").exists());
        assert!(install.join("lib/libevent.so").exists());
        assert!(!install.join("bin/shadow").exists());
        assert!(!install.join("bin/scallion-shadow").exists());
        assert!(install.join("bin/other").exists());

        let lines = output.drain();
        assert!(lines.last().unwrap().starts_with("Uninstall complete!"));
    }

    #[test]
    fn test_uninstall_tolerates_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogPanel::new(UiContext::headless(40, 5), 0, LogLevel::Info, 50);
        let output = AsyncBridge::new();
        let outcome = uninstall(&config_in(dir.path())).run(&StepContext {
            log: &log.sender(),
            output: &output.sender(),
            control: &WorkerControl::new(),
        });
        assert_eq!(outcome, ChainOutcome::Completed);
        assert_eq!(output.drain().len(), 1);
    }

    #[test]
    fn test_fetch_uses_cached_archive_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let (download, build) = (dir.path().join("dl"), dir.path().join("build"));
        touch(&download.join("libevent-2.0.tar.gz"));
        fs::create_dir_all(build.join("libevent-2.0")).unwrap();

        let log = LogPanel::new(UiContext::headless(40, 5), 0, LogLevel::Info, 50);
        let output = AsyncBridge::new();
        let ctx = StepContext {
            log: &log.sender(),
            output: &output.sender(),
            control: &WorkerControl::new(),
        };
        let source = fetch_archive("http://example.invalid/libevent-2.0.tar.gz", &download, &build, &ctx).unwrap();
        assert_eq!(source, build.join("libevent-2.0"));
        let lines = output.drain();
        assert_eq!(
            lines,
            [
                "Please wait while we download http://example.invalid/libevent-2.0.tar.gz",
                "Finished downloading http://example.invalid/libevent-2.0.tar.gz",
            ]
        );
    }

    #[test]
    fn test_fetch_returns_archive_top_dir() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("staging");
        touch(&staging.join("shadow-shadow-abc123/CMakeLists.txt"));
        let served = dir.path().join("served");
        fs::create_dir_all(&served).unwrap();
        let tarball = served.join("shadow-release.tar.gz");
        let status = Command::new("tar")
            .arg("-czf")
            .arg(&tarball)
            .arg("-C")
            .arg(&staging)
            .arg("shadow-shadow-abc123")
            .status()
            .unwrap();
        assert!(status.success());

        let (download, build) = (dir.path().join("dl"), dir.path().join("build"));
        let log = LogPanel::new(UiContext::headless(40, 5), 0, LogLevel::Info, 50);
        let output = AsyncBridge::new();
        let ctx = StepContext {
            log: &log.sender(),
            output: &output.sender(),
            control: &WorkerControl::new(),
        };
        let url = format!("file://{}", tarball.display());
        let source = fetch_archive(&url, &download, &build, &ctx).unwrap();
        assert_eq!(source, build.join("shadow-shadow-abc123"));
        assert!(source.join("CMakeLists.txt").is_file());
        assert!(download.join("shadow-release.tar.gz").is_file());

        // A second fetch reuses both the download and the unpacked tree.
        let _ = output.drain();
        let again = fetch_archive(&url, &download, &build, &ctx).unwrap();
        assert_eq!(again, source);
        assert!(!output.drain().iter().any(|line| line.starts_with("Executing command")));
    }

    #[test]
    fn test_fetch_rejects_non_tarball() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogPanel::new(UiContext::headless(40, 5), 0, LogLevel::Info, 50);
        let output = AsyncBridge::new();
        let ctx = StepContext {
            log: &log.sender(),
            output: &output.sender(),
            control: &WorkerControl::new(),
        };
        let err = fetch_archive("http://example.invalid/tool.zip", dir.path(), dir.path(), &ctx).unwrap_err();
        assert!(matches!(err, Error::Worker { .. }));
        assert!(output.drain().is_empty());
    }
}
