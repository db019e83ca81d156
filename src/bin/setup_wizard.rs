//! `setup-tui` - interactive setup wizard
//!
//! Downloads, builds and installs Shadow and its dependencies, or removes a
//! previous installation, while streaming command output and a log into the
//! terminal.
//!
//! # Usage
//!
//! ```bash
//! setup-tui
//! setup-tui --config ./setup.toml --level debug
//! RUST_LOG=setup_tui=debug setup-tui --log-file /tmp/setup-tui.log
//! ```
//!
//! Press `h` for help, `r` to restart and `q` to quit.

#![allow(unsafe_code)]

use setup_tui::ansi::ColorMode;
use setup_tui::bridge::BridgeSender;
use setup_tui::config::{CONFIG_DIR_NAME, Config};
use setup_tui::context::UiContext;
use setup_tui::controller::Controller;
use setup_tui::input::StdinInput;
use setup_tui::log::{LogLevel, LogPanel, LogSender};
use setup_tui::panel::{
    BackgroundWorker, Control, ControlPanel, Extent, OptionItem, OptionPanel, OutputPanel, Panel, PanelAction,
    PanelHandle, share,
};
use setup_tui::renderer::Surface;
use setup_tui::terminal::{Capabilities, Terminal, is_tty, terminal_size, watch_resize};
use setup_tui::worker::{
    ChainOutcome, StepChain, StepContext, WorkerControl, WorkerThread, auto_setup, interactive_setup, uninstall,
};
use setup_tui::{Error, Result};
use std::ffi::{CStr, OsString};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::EnvFilter;

// ============================================================================
// CLI Parsing
// ============================================================================

const HELP_TEXT: &str = "setup-tui - interactive setup wizard

USAGE:
    setup-tui [OPTIONS]

OPTIONS:
    -h, --help              Print this help message and exit
    -V, --version           Print the version and exit
    --config <PATH>         Config file (default: $CONFIG_DIR/setup-tui/setup.toml)
    --log-file <PATH>       Diagnostics file (default: $CACHE_DIR/setup-tui/setup-tui.log)
    --level <LEVEL>         Initial log level: error, info, debug (default: info)
    --ascii                 Draw lines with ASCII characters

ENVIRONMENT:
    RUST_LOG                Diagnostics filter (default: setup_tui=info)
    NO_COLOR                Disable colors
";

const LOG_CAPACITY: usize = 1000;
const OUTPUT_BACKLOG: usize = 2000;
const OUTPUT_HEIGHT: u32 = 12;

const AUTO_SETUP: &str = "Auto Setup";
const INTERACTIVE_SETUP: &str = "Interactive Setup";
const UNINSTALL: &str = "Uninstall";
const QUIT: &str = "Quit";
const RESTART: &str = "restart";
const CUSTOM_SOURCES: &str = "Custom sources";

/// Option labels and the `[setup]` keys they edit.
const PATH_OPTIONS: [(&str, &str, &str); 3] = [
    ("Install root", "install-root", "Where Shadow, its plug-ins and dependencies are installed."),
    ("Download cache", "download", "Where downloaded archives are kept. Cached archives are not downloaded again."),
    ("Build cache", "build", "Where archives are unpacked and built."),
];
const SOURCE_OPTIONS: [(&str, &str); 4] = [
    ("OpenSSL", "openssl"),
    ("libevent", "libevent"),
    ("Shadow", "shadow"),
    ("Resources", "resources"),
];

/// Pages, in order.
const CONTROL_PAGE: usize = 0;
const OPTIONS_PAGE: usize = 1;
const PROGRESS_PAGE: usize = 2;

#[derive(Debug)]
struct Args {
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
    level: LogLevel,
    ascii: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            log_file: None,
            level: LogLevel::Info,
            ascii: false,
        }
    }
}

/// Result of CLI parsing.
enum ParseResult {
    Args(Args),
    Help,
    Version,
    Error(String),
}

impl Args {
    fn from_args<I>(args: I) -> ParseResult
    where
        I: IntoIterator<Item = OsString>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        // Skip program name
        args.next();

        while let Some(arg) = args.next() {
            let arg_str = arg.to_string_lossy();
            match arg_str.as_ref() {
                "-h" | "--help" => return ParseResult::Help,
                "-V" | "--version" => return ParseResult::Version,
                "--ascii" => parsed.ascii = true,
                "--config" => match args.next() {
                    Some(path) => parsed.config = Some(PathBuf::from(path)),
                    None => return ParseResult::Error("--config requires a path".to_string()),
                },
                "--log-file" => match args.next() {
                    Some(path) => parsed.log_file = Some(PathBuf::from(path)),
                    None => return ParseResult::Error("--log-file requires a path".to_string()),
                },
                "--level" => {
                    let value = match args.next() {
                        Some(v) => v.to_string_lossy().to_string(),
                        None => return ParseResult::Error("--level requires a value".to_string()),
                    };
                    match value.parse() {
                        Ok(level) => parsed.level = level,
                        Err(err) => return ParseResult::Error(format!("{err} (valid: error, info, debug)")),
                    }
                }
                other => return ParseResult::Error(format!("Unknown argument: {other}")),
            }
        }
        ParseResult::Args(parsed)
    }
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() -> ExitCode {
    let args = match Args::from_args(std::env::args_os()) {
        ParseResult::Args(args) => args,
        ParseResult::Help => {
            print!("{HELP_TEXT}");
            return ExitCode::SUCCESS;
        }
        ParseResult::Version => {
            println!("setup-tui {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        ParseResult::Error(msg) => {
            eprintln!("Error: {msg}");
            eprintln!("Run with --help for usage information.");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_tracing(args.log_file.clone()) {
        eprintln!("Error: unable to open the diagnostics file: {err}");
        return ExitCode::FAILURE;
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "wizard failed");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Send diagnostics to a file; the terminal belongs to the UI.
fn init_tracing(log_file: Option<PathBuf>) -> io::Result<()> {
    let path = log_file
        .or_else(|| dirs::cache_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("setup-tui.log")))
        .unwrap_or_else(|| PathBuf::from("setup-tui.log"));
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("setup_tui=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .init();
    Ok(())
}

/// `setup-tui <version> on <host> (<system> <release>)`.
fn header_text() -> String {
    // SAFETY: utsname is plain old data; all zeroes is a valid value
    let mut name: libc::utsname = unsafe { std::mem::zeroed() };
    // SAFETY: uname only writes into the struct it is given
    let host = if unsafe { libc::uname(&mut name) } == 0 {
        // SAFETY: uname NUL-terminates each field on success
        let field = |raw: &[libc::c_char]| unsafe { CStr::from_ptr(raw.as_ptr()) }.to_string_lossy().into_owned();
        format!(
            " on {} ({} {})",
            field(&name.nodename),
            field(&name.sysname),
            field(&name.release)
        )
    } else {
        String::new()
    };
    format!("setup-tui {}{host}", env!("CARGO_PKG_VERSION"))
}

// ============================================================================
// Wizard
// ============================================================================

fn control_panel(ctx: &UiContext, config: &Config) -> ControlPanel {
    let mut panel = ControlPanel::new(ctx.clone(), 0);
    panel.set_message("Welcome to the Shadow setup wizard. Choose what to do:");
    let build = config.get_or("setup", "build", "the build cache");
    panel.set_controls(vec![
        Control::new(
            AUTO_SETUP,
            format!(
                "Configure a Shadow installation by downloading, building, and installing Shadow and any \
                 missing dependencies with the current options. Archives unpacked in {build} are reused."
            ),
        ),
        Control::new(
            INTERACTIVE_SETUP,
            format!(
                "Review and change the options, then set up Shadow as above. This first clears the build \
                 cache in {build}; downloads are kept."
            ),
        ),
        Control::new(
            UNINSTALL,
            format!(
                "Remove the build and download caches and every Shadow file under {}. Configuration \
                 options are kept.",
                config.get_or("setup", "install-root", "the install root")
            ),
        ),
        Control::new(QUIT, "Exit the setup wizard."),
    ]);
    panel
}

fn not_empty(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        Err("A value is required.".to_string())
    } else {
        Ok(())
    }
}

fn tarball_url(value: &str) -> std::result::Result<(), String> {
    if value.ends_with(".tar.gz") || value.ends_with(".tgz") {
        Ok(())
    } else {
        Err("The URL must name a .tar.gz archive.".to_string())
    }
}

fn option_panel(ctx: &UiContext, config: &Config) -> OptionPanel {
    let mut panel = OptionPanel::new(
        ctx.clone(),
        0,
        "Review the setup options, then choose Next to clear the build cache and begin. Press enter to \
         change an option.",
    );
    for (label, key, description) in PATH_OPTIONS {
        panel.add_option(
            OptionItem::text(label, description, config.get_or("setup", key, "")).with_validator(not_empty),
        );
    }
    let sources = SOURCE_OPTIONS
        .iter()
        .map(|(label, key)| {
            OptionItem::text(
                *label,
                format!("Archive URL for {label}."),
                config.get_or("setup", key, ""),
            )
            .with_validator(tarball_url)
        })
        .collect();
    panel.add_option(
        OptionItem::toggle(
            CUSTOM_SOURCES,
            "Download dependencies from custom URLs instead of the defaults.",
            "yes",
            "no",
            config.get_bool("setup", "custom-sources"),
        )
        .with_suboptions(sources),
    );
    panel
}

/// Copy the reviewed options into the config.
fn apply_options(options: &OptionPanel, config: &mut Config) {
    for (label, key, _) in PATH_OPTIONS {
        if let Some(option) = options.find(label) {
            config.set("setup", key, option.value());
        }
    }
    let Some(custom) = options.find(CUSTOM_SOURCES) else {
        return;
    };
    let on = custom.is_on().unwrap_or(false);
    config.set("setup", "custom-sources", on.to_string());
    if on {
        for option in custom.suboptions() {
            if let Some((_, key)) = SOURCE_OPTIONS.iter().find(|(label, _)| *label == option.label()) {
                config.set("setup", key, option.value());
            }
        }
    }
}

struct Wizard<'a> {
    config: &'a mut Config,
    options: Arc<Mutex<OptionPanel>>,
    log: LogSender,
    output: BridgeSender<String>,
    control: WorkerControl,
    worker: Option<WorkerThread>,
    restart: bool,
}

impl Wizard<'_> {
    fn start(&mut self, chain: StepChain) -> Result<()> {
        if self.worker.as_ref().is_some_and(WorkerThread::is_running) {
            self.log.error("A setup task is already running.");
            return Ok(());
        }
        // A finished worker is replaced; stopping it would set the stop flag
        // the next worker shares.
        let log = self.log.clone();
        let output = self.output.clone();
        let name = chain.name().to_string();
        let worker = WorkerThread::spawn(&name, self.control.clone(), move |control| {
            let outcome = chain.run(&StepContext {
                log: &log,
                output: &output,
                control: &control,
            });
            tracing::info!(?outcome, "step chain finished");
            if outcome == ChainOutcome::Completed {
                output.put("Done.".to_string());
            }
        })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn on_action(&mut self, ctl: &mut Controller, action: PanelAction) -> Result<()> {
        match action {
            PanelAction::Select(name) if name == AUTO_SETUP => {
                self.start(auto_setup(self.config))?;
                ctl.set_page(PROGRESS_PAGE)
            }
            PanelAction::Select(name) if name == INTERACTIVE_SETUP => ctl.set_page(OPTIONS_PAGE),
            PanelAction::Select(name) if name == UNINSTALL => {
                self.start(uninstall(self.config))?;
                ctl.set_page(PROGRESS_PAGE)
            }
            PanelAction::Select(name) if name == QUIT => {
                ctl.quit();
                Ok(())
            }
            PanelAction::Select(name) if name == RESTART => {
                self.restart = true;
                ctl.quit();
                Ok(())
            }
            PanelAction::Select(name) => {
                tracing::warn!(control = %name, "unknown control");
                Ok(())
            }
            PanelAction::Back => ctl.set_page(CONTROL_PAGE),
            PanelAction::Next => {
                {
                    let options = self.options.lock().unwrap_or_else(PoisonError::into_inner);
                    apply_options(&options, self.config);
                }
                self.start(interactive_setup(self.config))?;
                ctl.set_page(PROGRESS_PAGE)
            }
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if !is_tty(&io::stdout()) {
        return Err(Error::Io(io::Error::other("stdout is not a terminal")));
    }
    let capabilities = Capabilities::detect();
    let mut terminal = Terminal::new(io::stdout());
    terminal.start()?;
    watch_resize()?;

    // Each restart gets fresh panels and a fresh controller; the config
    // carries over.
    let result = loop {
        match session(args, &capabilities, &mut config) {
            Ok(true) => tracing::info!("wizard restarted"),
            other => break other.map(|_| ()),
        }
    };
    terminal.restore()?;

    if config.path().is_some() {
        config.save()?;
    }
    result
}

/// One run of the wizard. Returns whether the user asked for a restart.
fn session(args: &Args, capabilities: &Capabilities, config: &mut Config) -> Result<bool> {
    let (width, height) = terminal_size().unwrap_or((80, 24));
    let mut surface = Surface::new(
        u32::from(width),
        u32::from(height),
        Box::new(io::stdout()),
        ColorMode::from(capabilities.color),
    );
    surface.set_sync_output(capabilities.sync_output);
    surface.set_ascii_lines(args.ascii || !capabilities.unicode);
    let ctx = UiContext::new(surface);

    let log = LogPanel::shared(ctx.clone(), 0, args.level, LOG_CAPACITY);
    let log_sender = log.lock().unwrap_or_else(PoisonError::into_inner).sender();
    let mut output = OutputPanel::new(ctx.clone(), "Output", 0, OUTPUT_BACKLOG);
    output.base_mut().set_height(Extent::Fixed(OUTPUT_HEIGHT));
    let output_sender = output.sender();
    let options = share(option_panel(&ctx, config));

    let mut ctl = Controller::new(ctx.clone());
    ctl.add_header(&header_text());
    ctl.add_toolbar("h: help, r: restart, q: quit");
    ctl.add_page(vec![share(control_panel(&ctx, config)) as PanelHandle]);
    ctl.add_page(vec![Arc::clone(&options) as PanelHandle]);
    ctl.add_page(vec![share(output) as PanelHandle, Arc::clone(&log) as PanelHandle]);
    ctl.bind_key('r', "restart the wizard", PanelAction::Select(RESTART.to_string()));

    let control = WorkerControl::new();
    let pause_control = control.clone();
    ctl.add_pause_hook(move |paused| pause_control.set_paused(paused));

    log.lock().unwrap_or_else(PoisonError::into_inner).start()?;
    let source = config
        .path()
        .map_or_else(|| "built-in defaults".to_string(), |path| path.display().to_string());
    log_sender.info(&format!("Using config from {source}"));

    let mut wizard = Wizard {
        config,
        options,
        log: log_sender.clone(),
        output: output_sender,
        control,
        worker: None,
        restart: false,
    };
    let mut input = StdinInput::new();
    let result = ctl.run(&mut input, |ctl, action| wizard.on_action(ctl, action));

    log_sender.info("cli finished, waiting for threads...");
    let shutdown = ctl.shutdown();
    let worker_stop = wizard.worker.take().map_or(Ok(()), |mut worker| worker.stop());
    result.and(shutdown).and(worker_stop).map(|()| wizard.restart)
}
