//! Purpose: `liveparam` CLI entry point for inspecting and editing params files.
//! Role: Binary crate root; parses args, runs commands, emits JSON or tables on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Every file mutation goes through `Document::write_atomic`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

use liveparam::api::{
    Document, Error, ErrorKind, Kind, NotifyWatch, WatchService, decode_as, infer_kind,
    to_exit_code,
};
use liveparam::notice::{Notice, NoticeKind, notice_json};
use liveparam::params_paths::params_path_from_env;
use render::{entries_table, value_text};

const WATCH_TIMEOUT_EXIT: i32 = 124;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let path = cli.file.unwrap_or_else(params_path_from_env);
    let color_mode = cli.color;

    dispatch(cli.command, &path, color_mode)
        .map_err(with_default_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "liveparam",
    version,
    about = "Inspect and edit live parameter files",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"A params file holds named, typed values that running applications reload on change.

Mental model:
  - `show` lists every entry with its inferred kind
  - `set` rewrites one entry atomically (watching apps pick it up)
  - `watch` streams entry changes as JSON lines
"#,
    after_help = r#"EXAMPLES
  $ liveparam show
  $ liveparam set friction 0.5
  $ liveparam set disk_color '{"r": "1", "g": "0.5", "b": "0"}'
  $ liveparam watch                   # prints {"name":"friction",...} per change

NOTES
  - Default file: $LIVEPARAM_PATH, else $LIVEPARAM_DIR/live_params.json,
    else assets/live_params.json

  $ liveparam <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Params file (default: $LIVEPARAM_PATH or assets/live_params.json)",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and human output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Bool,
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Color,
}

impl From<KindArg> for Kind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Bool => Kind::Bool,
            KindArg::Int => Kind::Int,
            KindArg::Float => Kind::Float,
            KindArg::Vec2 => Kind::Vec2,
            KindArg::Vec3 => Kind::Vec3,
            KindArg::Vec4 => Kind::Vec4,
            KindArg::Quat => Kind::Quat,
            KindArg::Color => Kind::Color,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "List every entry in the params file",
        after_help = r#"EXAMPLES
  $ liveparam show
  $ liveparam show --json
  $ liveparam --file demo/live_params.json show"#
    )]
    Show {
        #[arg(long, help = "Print the document as JSON instead of a table")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Print one entry's value",
        after_help = r#"EXAMPLES
  $ liveparam get friction            # 0.9
  $ liveparam get disk_color          # r=1 g=0 b=0
  $ liveparam get disk_color --json"#
    )]
    Get {
        #[arg(help = "Param name")]
        name: String,
        #[arg(long, help = "Print name, kind, and value as JSON")]
        json: bool,
    },
    #[command(
        arg_required_else_help = true,
        about = "Write one entry, replacing the file atomically",
        long_about = r#"Write one entry, replacing the file atomically.

The value is checked against a kind before writing: --kind if given, else the
kind of the entry already in the file, else the kind inferred from the value.
Values are stored in canonical form (decimal strings; compounds as objects)."#,
        after_help = r#"EXAMPLES
  $ liveparam set friction 0.5
  $ liveparam set show_grid true
  $ liveparam set gravity -- -9.8
  $ liveparam set offset '{"x": "1", "y": "2"}'
  $ liveparam set spin '[1, 0, 0, 0]' --kind quat"#
    )]
    Set {
        #[arg(help = "Param name")]
        name: String,
        #[arg(
            help = "Value: a scalar (0.5, 3, true) or JSON object/array for compounds",
            allow_hyphen_values = true
        )]
        value: String,
        #[arg(long, value_enum, help = "Kind to validate against")]
        kind: Option<KindArg>,
    },
    #[command(
        about = "Validate the params file",
        long_about = r#"Validate the params file.

Exit 0 when every entry decodes as the kind its shape suggests. Unparseable files
fail with the corrupt exit code; entries of unknown shape, or that do not decode
as their kind, fail with the mismatch exit code."#
    )]
    Check,
    #[command(
        about = "Stream entry changes as JSON lines",
        after_help = r#"EXAMPLES
  $ liveparam watch
  $ liveparam watch --timeout-ms 5000   # exit 124 if nothing changes in 5s

NOTES
  - Removed entries print with "value": null"#
    )]
    Watch {
        #[arg(long, help = "Stop after this long without a change")]
        timeout_ms: Option<u64>,
    },
}

fn dispatch(command: Command, path: &Path, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Show { json } => show(path, json, color_mode),
        Command::Get { name, json } => get(path, &name, json, color_mode),
        Command::Set { name, value, kind } => {
            set(path, &name, &value, kind.map(Kind::from), color_mode)
        }
        Command::Check => check(path, color_mode),
        Command::Watch { timeout_ms } => watch(path, timeout_ms.map(Duration::from_millis)),
    }
}

#[derive(Serialize)]
struct EntryRow<'a> {
    name: &'a str,
    kind: Option<&'static str>,
    value: &'a Value,
}

#[derive(Serialize)]
struct SetRow<'a> {
    name: &'a str,
    kind: &'static str,
    value: &'a Value,
    previous: Option<&'a Value>,
}

#[derive(Serialize)]
struct ChangeRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<&'a str>,
    name: &'a str,
    kind: Option<&'static str>,
    value: Option<&'a Value>,
    previous: Option<&'a Value>,
}

#[derive(Serialize)]
struct CheckReport {
    path: String,
    status: &'static str,
    entries: usize,
    problems: Vec<Problem>,
}

#[derive(Serialize)]
struct Problem {
    name: String,
    message: String,
}

fn show(path: &Path, as_json: bool, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let doc = read_existing(path)?;
    if as_json {
        emit_json(doc.to_json(), color_mode);
        return Ok(RunOutcome::ok());
    }
    if doc.is_empty() {
        if io::stderr().is_terminal() {
            eprintln!("No params in {}.", path.display());
        }
        return Ok(RunOutcome::ok());
    }
    let use_color = color_mode.use_color(io::stdout().is_terminal());
    print!("{}", entries_table(&doc, use_color));
    Ok(RunOutcome::ok())
}

fn get(path: &Path, name: &str, as_json: bool, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let doc = read_existing(path)?;
    let entry = doc.get(name).ok_or_else(|| {
        Error::new(ErrorKind::NotFound)
            .with_message("no entry with that name")
            .with_param(name)
            .with_path(path)
            .with_hint("List entries with `liveparam show`.")
    })?;
    if as_json {
        let row = EntryRow {
            name,
            kind: infer_kind(entry).map(Kind::as_str),
            value: entry,
        };
        emit_json(to_json_value(&row)?, color_mode);
    } else {
        println!("{}", value_text(entry));
    }
    Ok(RunOutcome::ok())
}

fn set(
    path: &Path,
    name: &str,
    raw: &str,
    kind: Option<Kind>,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    if name.trim().is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("param name must not be empty"));
    }
    let mut doc = Document::read(path)?.unwrap_or_default();
    let node = parse_value_arg(raw)?;
    let explicit = kind.is_some();
    let kind = kind
        .or_else(|| doc.get(name).and_then(infer_kind))
        .or_else(|| infer_kind(&node))
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("cannot infer a kind for '{raw}'"))
                .with_param(name)
                .with_hint("Pass --kind, for example: `liveparam set spin '[1, 0, 0, 0]' --kind quat`.")
        })?;
    let value = decode_as(kind, &node).map_err(|err| {
        let err = err.with_param(name);
        if explicit {
            err
        } else {
            err.with_hint(format!(
                "Checked as {kind}; pass --kind to write a different kind."
            ))
        }
    })?;

    let canonical = value.to_json();
    let previous = doc.insert(name, canonical.clone());
    doc.write_atomic(path)?;
    debug!(param = name, kind = kind.as_str(), path = %path.display(), "entry written");

    let row = SetRow {
        name,
        kind: kind.as_str(),
        value: &canonical,
        previous: previous.as_ref(),
    };
    emit_json(to_json_value(&row)?, color_mode);
    Ok(RunOutcome::ok())
}

fn check(path: &Path, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let doc = read_existing(path)?;
    let problems: Vec<Problem> = doc
        .entries()
        .filter_map(|(name, entry)| {
            entry_problem(entry).map(|message| Problem {
                name: name.to_string(),
                message,
            })
        })
        .collect();
    let ok = problems.is_empty();

    if io::stdout().is_terminal() {
        if ok {
            println!("OK: {} ({} params)", path.display(), doc.len());
        } else {
            println!("PROBLEMS: {}", path.display());
            for problem in &problems {
                let notice = Notice::new(NoticeKind::Mismatch, problem.message.clone())
                    .with_param(problem.name.clone());
                emit_notice(&notice, color_mode);
            }
        }
    } else {
        let report = CheckReport {
            path: path.display().to_string(),
            status: if ok { "ok" } else { "problems" },
            entries: doc.len(),
            problems,
        };
        emit_json(to_json_value(&report)?, color_mode);
    }

    if ok {
        Ok(RunOutcome::ok())
    } else {
        Ok(RunOutcome::with_code(to_exit_code(ErrorKind::Mismatch)))
    }
}

/// Why `entry` would not load into a parameter of its inferred kind.
fn entry_problem(entry: &Value) -> Option<String> {
    let Some(kind) = infer_kind(entry) else {
        return Some(format!("entry has no recognized kind: {entry}"));
    };
    decode_as(kind, entry).err().map(|err| {
        format!(
            "entry looks like {kind} but does not decode: {}",
            err.message().unwrap_or("invalid value")
        )
    })
}

enum Wake {
    Changed,
    TimedOut,
    Closed,
}

fn next_wake(rx: &mpsc::Receiver<()>, timeout: Option<Duration>) -> Wake {
    let received = match timeout {
        Some(timeout) => rx.recv_timeout(timeout),
        None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
    };
    match received {
        Ok(()) => {
            // Coalesce bursts from a single write.
            while rx.try_recv().is_ok() {}
            Wake::Changed
        }
        Err(RecvTimeoutError::Timeout) => Wake::TimedOut,
        Err(RecvTimeoutError::Disconnected) => Wake::Closed,
    }
}

fn watch(path: &Path, timeout: Option<Duration>) -> Result<RunOutcome, Error> {
    let mut last = Document::read(path)?.unwrap_or_default();
    let (tx, rx) = mpsc::channel::<()>();
    let _subscription = NotifyWatch.watch(
        path,
        Box::new(move |_: &Path| {
            let _ = tx.send(());
        }),
    )?;
    debug!(path = %path.display(), "watching params file");

    let mut emitted = 0usize;
    loop {
        match next_wake(&rx, timeout) {
            Wake::Changed => {}
            Wake::TimedOut => {
                if emitted > 0 {
                    return Ok(RunOutcome::ok());
                }
                if io::stderr().is_terminal() {
                    eprintln!("No changes observed (timed out).");
                }
                return Ok(RunOutcome::with_code(WATCH_TIMEOUT_EXIT));
            }
            Wake::Closed => {
                return Err(Error::new(ErrorKind::Internal)
                    .with_message("file watcher stopped")
                    .with_path(path));
            }
        }

        let next = match Document::read(path) {
            Ok(Some(next)) => next,
            Ok(None) => {
                debug!(path = %path.display(), "params file missing; keeping last contents");
                continue;
            }
            Err(err) => {
                emit_error(&err, ColorMode::Auto);
                continue;
            }
        };
        let time = notice_time_now();
        for row in document_changes(&last, &next, time.as_deref()) {
            let line = serde_json::to_string(&row)
                .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
            println!("{line}");
            emitted += 1;
        }
        last = next;
    }
}

fn document_changes<'a>(
    prev: &'a Document,
    next: &'a Document,
    time: Option<&'a str>,
) -> Vec<ChangeRow<'a>> {
    let mut rows = Vec::new();
    for (name, entry) in next.entries() {
        let previous = prev.get(name);
        if previous != Some(entry) {
            rows.push(ChangeRow {
                time,
                name,
                kind: infer_kind(entry).map(Kind::as_str),
                value: Some(entry),
                previous,
            });
        }
    }
    for (name, entry) in prev.entries() {
        if next.get(name).is_none() {
            rows.push(ChangeRow {
                time,
                name,
                kind: infer_kind(entry).map(Kind::as_str),
                value: None,
                previous: Some(entry),
            });
        }
    }
    rows
}

fn read_existing(path: &Path) -> Result<Document, Error> {
    Document::read(path)?.ok_or_else(|| {
        Error::new(ErrorKind::NotFound)
            .with_message("params file does not exist")
            .with_path(path)
            .with_hint(
                "Run the application once to create it, or write an entry with `liveparam set <name> <value>`.",
            )
    })
}

fn parse_value_arg(raw: &str) -> Result<Value, Error> {
    let trimmed = raw.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return Ok(Value::String(raw.to_string()));
    }
    serde_json::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid json")
            .with_hint("Provide a JSON object (e.g. '{\"x\": \"1\", \"y\": \"2\"}') or a bare scalar.")
            .with_source(err)
    })
}

fn to_json_value(value: &impl Serialize) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let pretty = is_tty || color_mode.use_color(is_tty);
    let json = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

const ANSI_RED: &str = "31";
const ANSI_YELLOW: &str = "33";

fn paint(label: &str, enabled: bool, code: &str) -> String {
    if enabled {
        format!("\u{1b}[{code}m{label}\u{1b}[0m")
    } else {
        label.to_string()
    }
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn eprint_json(value: &Value) {
    let json = serde_json::to_string(value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
    } else {
        eprint_json(&error_json(err));
    }
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if !is_tty {
        eprint_json(&notice_json(notice, notice_time_now().as_deref()));
        return;
    }
    let label = paint("notice:", color_mode.use_color(is_tty), ANSI_YELLOW);
    match &notice.param {
        Some(param) => eprintln!("{label} {} (param: {param})", notice.message),
        None => eprintln!("{label} {}", notice.message),
    }
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?} error", err.kind()).to_lowercase())
}

/// Optional error context in display order; `cause` is the direct source only.
fn error_fields(err: &Error) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(hint) = err.hint() {
        fields.push(("hint", hint.to_string()));
    }
    if let Some(param) = err.param() {
        fields.push(("param", param.to_string()));
    }
    if let Some(path) = err.path() {
        fields.push(("path", path.display().to_string()));
    }
    if let Some(cause) = err.source() {
        fields.push(("cause", cause.to_string()));
    }
    fields
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    for (key, value) in error_fields(err) {
        inner.insert(key.to_string(), json!(value));
    }
    json!({ "error": inner })
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut text = format!("{} {}", paint("error:", use_color, ANSI_RED), error_message(err));
    for (key, value) in error_fields(err) {
        text.push('\n');
        text.push_str(&paint(&format!("{key}:"), use_color, ANSI_YELLOW));
        text.push(' ');
        text.push_str(&value);
    }
    text
}

/// Fills in a kind-level hint when the failing call site left none.
fn with_default_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    let hint = match err.kind() {
        ErrorKind::Corrupt => {
            "Params file is unreadable. Fix it by hand; it must look like {\"params\": {...}}."
        }
        ErrorKind::Permission => {
            "Permission denied. Check file permissions or use --file to a writable location."
        }
        ErrorKind::Io => "I/O error. Check the path, filesystem, and disk space.",
        ErrorKind::Internal => "Unexpected internal failure. Retry with RUST_LOG=debug.",
        _ => return err,
    };
    err.with_hint(hint)
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let sub = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: liveparam "))
        .and_then(|rest| {
            rest.split_whitespace()
                .find(|token| !token.starts_with(['-', '<', '[']))
        });
    match sub {
        Some(sub) => format!("Try `liveparam {sub} --help`."),
        None => "Try `liveparam --help`.".to_string(),
    }
}
