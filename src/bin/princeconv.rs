//! CLI binary for prince-driver.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PrinceConfig`, picks the conversion mode from the input/output
//! arguments, and prints the engine's diagnostics.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use prince_driver::{Diagnostic, InputType, Permissions, Prince, PrinceConfig, PrinceEvents, Severity};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer ─────────────────────────────────────────────────────────────

/// Prints engine diagnostics above the spinner (or straight to stderr when
/// there is no spinner) and counts errors/warnings for the summary line.
struct CliEvents {
    bar: Option<ProgressBar>,
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl CliEvents {
    fn new(bar: Option<ProgressBar>) -> Arc<Self> {
        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
            warnings: AtomicUsize::new(0),
        })
    }

    fn print(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl PrinceEvents for CliEvents {
    fn on_message(&self, msg: &Diagnostic) {
        let text = msg.text.strip_prefix('|').unwrap_or(&msg.text);
        let label = match msg.severity {
            Severity::Error => {
                self.errors.fetch_add(1, Ordering::SeqCst);
                red("error")
            }
            Severity::Warning => {
                self.warnings.fetch_add(1, Ordering::SeqCst);
                yellow("warning")
            }
            ref other => dim(other.as_str()),
        };
        if msg.location.is_empty() {
            self.print(format!("  {label}: {text}"));
        } else {
            self.print(format!("  {label}: {}: {text}", dim(&msg.location)));
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Prince");
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the input (report.pdf)
  princeconv report.html

  # Convert to a named file with a print style sheet
  princeconv -s print.css report.html -o out/report.pdf

  # Merge several documents into one PDF
  princeconv ch1.html ch2.html ch3.html -o book.pdf

  # Pipe a document through the engine
  curl -s https://example.com/ | princeconv --input html --baseurl https://example.com/ - -o - > page.pdf

  # Encrypted output, printing disabled
  princeconv --key-bits 128 --owner-password s3cret --disallow-print doc.html -o doc.pdf

  # Start from a saved JSON config, override one option
  princeconv --config prince.json --no-network doc.html

EXIT STATUS:
  0  the engine reported success
  1  the driver failed (engine not found, broken pipe, bad option)
  2  the engine ran but reported failure (see the printed diagnostics)

ENVIRONMENT VARIABLES:
  PRINCE_EXE            Path to the Prince executable (default: prince)
  PRINCE_CONFIG         JSON config file loaded before the flags
  PRINCE_HTTP_PASSWORD  HTTP basic-auth password
  RUST_LOG              Override the log filter (e.g. prince_driver=debug)
"#;

/// Convert HTML/XML documents to PDF with the Prince engine.
#[derive(Parser, Debug)]
#[command(
    name = "princeconv",
    version,
    about = "Convert HTML/XML documents to PDF with the Prince engine",
    long_about = "Run the Prince engine in server mode, relay documents and PDF bytes over \
pipes when '-' is given, and report the engine's warnings and errors.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input documents, or '-' to read one document from stdin.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF file, or '-' for stdout. Default: input name with .pdf.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to the Prince executable.
    #[arg(long, env = "PRINCE_EXE", default_value = "prince")]
    prince: PathBuf,

    /// JSON file with a saved PrinceConfig; flags override it.
    #[arg(long, env = "PRINCE_CONFIG")]
    config: Option<PathBuf>,

    // ── Input ────────────────────────────────────────────────────────────
    /// CSS style sheet to apply (repeatable).
    #[arg(short = 's', long = "style", value_name = "CSS")]
    style_sheets: Vec<String>,

    /// JavaScript file to run before conversion (repeatable).
    #[arg(long = "script", value_name = "JS")]
    scripts: Vec<String>,

    /// Input type: auto, html, xml.
    #[arg(long = "input", value_enum)]
    input_type: Option<InputArg>,

    /// Base URL of the input document.
    #[arg(long)]
    baseurl: Option<String>,

    /// Root directory for absolute filenames.
    #[arg(long)]
    fileroot: Option<String>,

    /// Run scripts in the document.
    #[arg(long)]
    javascript: bool,

    /// Disable XInclude processing.
    #[arg(long)]
    no_xinclude: bool,

    // ── Network ──────────────────────────────────────────────────────────
    /// Disable network access.
    #[arg(long)]
    no_network: bool,

    /// Username for HTTP basic authentication.
    #[arg(long)]
    http_user: Option<String>,

    /// Password for HTTP basic authentication.
    #[arg(long, env = "PRINCE_HTTP_PASSWORD", hide_env_values = true)]
    http_password: Option<String>,

    /// HTTP proxy URL.
    #[arg(long)]
    http_proxy: Option<String>,

    // ── Engine log ───────────────────────────────────────────────────────
    /// File the engine writes its own log to.
    #[arg(long)]
    log: Option<PathBuf>,

    /// Ask the engine for informative messages.
    #[arg(long)]
    engine_verbose: bool,

    /// Ask the engine for debug messages.
    #[arg(long)]
    engine_debug: bool,

    // ── PDF output ───────────────────────────────────────────────────────
    /// Do not embed fonts.
    #[arg(long)]
    no_embed_fonts: bool,

    /// Do not subset embedded fonts.
    #[arg(long)]
    no_subset_fonts: bool,

    /// Do not compress the PDF.
    #[arg(long)]
    no_compress: bool,

    // ── Encryption ───────────────────────────────────────────────────────
    /// Encrypt the PDF.
    #[arg(long)]
    encrypt: bool,

    /// Encryption key size: 40 or 128. Implies --encrypt.
    #[arg(long)]
    key_bits: Option<u32>,

    /// User password. Implies --encrypt.
    #[arg(long)]
    user_password: Option<String>,

    /// Owner password. Implies --encrypt.
    #[arg(long)]
    owner_password: Option<String>,

    /// Disallow printing. Implies --encrypt.
    #[arg(long)]
    disallow_print: bool,

    /// Disallow modification. Implies --encrypt.
    #[arg(long)]
    disallow_modify: bool,

    /// Disallow copying. Implies --encrypt.
    #[arg(long)]
    disallow_copy: bool,

    /// Disallow annotation. Implies --encrypt.
    #[arg(long)]
    disallow_annotate: bool,

    // ── Misc ─────────────────────────────────────────────────────────────
    /// Extra engine options, passed as one final argument.
    #[arg(long, allow_hyphen_values = true)]
    options: Option<String>,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum InputArg {
    Auto,
    Html,
    Xml,
}

impl From<InputArg> for InputType {
    fn from(v: InputArg) -> Self {
        match v {
            InputArg::Auto => InputType::Auto,
            InputArg::Html => InputType::Html,
            InputArg::Xml => InputType::Xml,
        }
    }
}

/// What the input/output arguments ask for.
#[derive(Debug, PartialEq)]
enum Mode {
    DefaultName(PathBuf),
    ToFile(PathBuf, PathBuf),
    Multiple(Vec<PathBuf>, PathBuf),
    ToStdout(PathBuf),
    Stream(Option<PathBuf>),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;
    let mode = select_mode(&cli.inputs, cli.output.as_deref())?;

    let to_stdout = matches!(mode, Mode::ToStdout(_) | Mode::Stream(None));
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose && !to_stdout;
    let bar = show_progress.then(|| spinner(describe(&mode)));
    let events = CliEvents::new(bar.clone());

    let prince = Prince::with_events(&cli.prince, events.clone()).with_config(config);

    // ── Run conversion ───────────────────────────────────────────────────
    let start = Instant::now();
    let result = run(&prince, &mode).await;
    if let Some(ref bar) = bar {
        bar.finish_and_clear();
    }
    let ok = result.context("Conversion failed")?;

    if !cli.quiet {
        let errors = events.errors.load(Ordering::SeqCst);
        let warnings = events.warnings.load(Ordering::SeqCst);
        eprintln!(
            "{} {}  {}  {}",
            if ok { green("✔") } else { red("✘") },
            bold(&describe(&mode)),
            dim(&format!("{errors} errors, {warnings} warnings")),
            dim(&format!("{:.1}s", start.elapsed().as_secs_f64())),
        );
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

async fn run(prince: &Prince, mode: &Mode) -> Result<bool> {
    let ok = match mode {
        Mode::DefaultName(input) => prince.convert(input).await?,
        Mode::ToFile(input, output) => prince.convert_to_file(input, output).await?,
        Mode::Multiple(inputs, output) => prince.convert_multiple(inputs.as_slice(), output).await?,
        Mode::ToStdout(input) => {
            let mut stdout = tokio::io::stdout();
            prince.convert_to_writer(input, &mut stdout).await?
        }
        Mode::Stream(output) => {
            let mut stdin = tokio::io::stdin();
            match output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    prince.convert_stream(&mut stdin, &mut file).await?
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    prince.convert_stream(&mut stdin, &mut stdout).await?
                }
            }
        }
    };
    Ok(ok)
}

fn describe(mode: &Mode) -> String {
    match mode {
        Mode::DefaultName(input) => format!("{}", input.display()),
        Mode::ToFile(input, output) => format!("{} → {}", input.display(), output.display()),
        Mode::Multiple(inputs, output) => {
            format!("{} documents → {}", inputs.len(), output.display())
        }
        Mode::ToStdout(input) => format!("{} → stdout", input.display()),
        Mode::Stream(Some(output)) => format!("stdin → {}", output.display()),
        Mode::Stream(None) => "stdin → stdout".to_string(),
    }
}

/// Map the input/output arguments to a conversion mode.
fn select_mode(inputs: &[PathBuf], output: Option<&std::path::Path>) -> Result<Mode> {
    fn is_dash(p: &std::path::Path) -> bool {
        p.as_os_str() == "-"
    }
    let output = output.map(|p| p.to_path_buf());

    match inputs {
        [] => bail!("No input documents given"),
        [input] if is_dash(input) => Ok(Mode::Stream(output.filter(|o| !is_dash(o)))),
        [input] => Ok(match output {
            None => Mode::DefaultName(input.clone()),
            Some(o) if is_dash(&o) => Mode::ToStdout(input.clone()),
            Some(o) => Mode::ToFile(input.clone(), o),
        }),
        many => {
            if many.iter().any(|p| is_dash(p)) {
                bail!("'-' (stdin) cannot be combined with other inputs");
            }
            match output {
                Some(o) if !is_dash(&o) => Ok(Mode::Multiple(many.to_vec(), o)),
                _ => bail!("Merging several documents needs an output file (-o FILE)"),
            }
        }
    }
}

/// Map CLI args to `PrinceConfig`, starting from `--config` if given.
async fn build_config(cli: &Cli) -> Result<PrinceConfig> {
    let mut config = match cli.config {
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            PrinceConfig::from_json(&json)
                .with_context(|| format!("Invalid config file {:?}", path))?
        }
        None => PrinceConfig::default(),
    };

    for css in &cli.style_sheets {
        config.add_style_sheet(css.as_str());
    }
    for js in &cli.scripts {
        config.add_script(js.as_str());
    }
    if let Some(t) = cli.input_type {
        config.set_input_type(t.into());
    }
    if let Some(ref url) = cli.baseurl {
        config.set_base_url(url.as_str());
    }
    if let Some(ref root) = cli.fileroot {
        config.set_file_root(root.as_str());
    }
    if cli.javascript {
        config.set_javascript(true);
    }
    if cli.no_xinclude {
        config.set_xinclude(false);
    }

    if cli.no_network {
        config.set_network(false);
    }
    if let Some(ref user) = cli.http_user {
        config.set_http_username(user.as_str());
    }
    if let Some(ref password) = cli.http_password {
        config.set_http_password(password.as_str());
    }
    if let Some(ref proxy) = cli.http_proxy {
        config.set_http_proxy(proxy.as_str());
    }

    if let Some(ref log) = cli.log {
        config.set_log(Some(log.clone()));
    }
    if cli.engine_verbose {
        config.set_verbose(true);
    }
    if cli.engine_debug {
        config.set_debug(true);
    }

    if cli.no_embed_fonts {
        config.set_embed_fonts(false);
    }
    if cli.no_subset_fonts {
        config.set_subset_fonts(false);
    }
    if cli.no_compress {
        config.set_compress(false);
    }

    let encrypt_details = cli.key_bits.is_some()
        || cli.user_password.is_some()
        || cli.owner_password.is_some()
        || cli.disallow_print
        || cli.disallow_modify
        || cli.disallow_copy
        || cli.disallow_annotate;
    if encrypt_details {
        // Flags add to what the config file set; they never clear it.
        let current = config.encryption.clone();
        let permissions = Permissions {
            disallow_print: cli.disallow_print || current.permissions.disallow_print,
            disallow_modify: cli.disallow_modify || current.permissions.disallow_modify,
            disallow_copy: cli.disallow_copy || current.permissions.disallow_copy,
            disallow_annotate: cli.disallow_annotate || current.permissions.disallow_annotate,
        };
        config
            .set_encrypt_info(
                cli.key_bits.unwrap_or(current.key_bits.bits()),
                cli.user_password.clone().unwrap_or(current.user_password),
                cli.owner_password.clone().unwrap_or(current.owner_password),
                permissions,
            )
            .context("Invalid encryption options")?;
    } else if cli.encrypt {
        config.set_encrypt(true);
    }

    if let Some(ref options) = cli.options {
        config.set_options(Some(options.clone()));
    }

    Ok(config)
}
