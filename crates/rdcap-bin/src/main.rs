//! rdcap entrypoint: serve one capture session, or diff two captures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use core_daemon::{spawn_server, DaemonState, ServerConfig};
use core_diff::{
    build_draw_records, diff_draws, diff_resources, diff_stats, query_both, DiffSession,
    DiffStatus, PassRow, ResourceRecord,
};
use core_replay::fixture::FixtureOpener;
use core_replay::{CaptureOpener, ReplayControl};
use core_rpc::{generate_token, SessionFile};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "rdcap", version, about = "Capture inspection daemon")]
struct Args {
    /// Optional configuration file path (overrides discovery of `rdcap.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a capture and serve queries until shutdown.
    Serve {
        capture: PathBuf,
        #[arg(long, default_value_t = 0)]
        port: u16,
        /// Seconds without a request before the session exits (0 disables).
        #[arg(long = "idle-timeout")]
        idle_timeout: Option<u64>,
        /// Where to persist the session descriptor.
        #[arg(long = "session-file")]
        session_file: Option<PathBuf>,
    },
    /// Run two sessions and compare draws, resources and per-pass stats.
    Diff {
        capture_a: PathBuf,
        capture_b: PathBuf,
        /// Restrict the report to one domain.
        #[arg(long, value_parser = ["draws", "resources", "stats"])]
        focus: Option<String>,
    },
}

fn configure_logging(level: Option<&str>) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(".", "rdcap.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.unwrap_or("info")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(nb_writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Fixture captures are the only backend compiled into this binary; real
/// replay backends implement `CaptureOpener` out of tree.
fn open_capture(path: &Path) -> Result<Box<dyn ReplayControl + Send>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => FixtureOpener
            .open_capture(path)
            .map_err(|e| anyhow::anyhow!("{e}")),
        other => bail!(
            "no replay backend for {:?} captures in this build (fixture .json only)",
            other.unwrap_or("?")
        ),
    }
}

fn serve(
    config: core_config::Config,
    capture: &Path,
    port: u16,
    idle_timeout: Option<u64>,
    session_file: Option<&Path>,
) -> Result<()> {
    let replay = open_capture(capture)?;
    let token = generate_token();

    let mut state = DaemonState::new(&capture.display().to_string(), &token);
    state.subtree_capacity = config.effective_subtree_capacity();
    state.opener = Some(Box::new(FixtureOpener));
    state
        .attach_replay(replay)
        .map_err(|e| anyhow::anyhow!("open {}: {e}", capture.display()))?;

    let idle = idle_timeout.unwrap_or(config.file.daemon.idle_timeout_secs);
    let server_config = ServerConfig {
        host: config.file.daemon.host.clone(),
        port,
        idle_timeout: (idle > 0).then(|| Duration::from_secs(idle)),
    };
    let handle = spawn_server(state, server_config).context("start server")?;

    let session = SessionFile {
        host: config.file.daemon.host.clone(),
        port: handle.addr.port(),
        token,
        pid: std::process::id(),
        capture: capture.display().to_string(),
    };
    if let Some(path) = session_file {
        session.save(path).context("write session file")?;
    }
    println!("{}", serde_json::to_string(&session)?);
    info!(target: "runtime", port = session.port, "session_ready");

    handle.join();
    Ok(())
}

fn fetch_pair(
    session: &DiffSession,
    method: &str,
) -> (Option<Value>, Option<Value>, bool) {
    let (ra, rb, err) = query_both(&session.ctx, method, &Map::new());
    let both_failed = ra.is_none() && rb.is_none();
    if let Some(err) = err {
        eprintln!("warning: {method}: {err}");
    }
    (ra, rb, both_failed)
}

fn diff(a: &Path, b: &Path, focus: Option<&str>) -> Result<i32> {
    let session = DiffSession::launch(
        open_capture(a)?,
        &a.display().to_string(),
        open_capture(b)?,
        &b.display().to_string(),
    )?;

    let mut report = Map::new();
    let mut any_differences = false;
    let mut fatal = false;

    if focus.is_none() || focus == Some("draws") {
        let (ra, rb, both_failed) = fetch_pair(&session, "draws");
        fatal |= both_failed;
        let rows_a = ra
            .map(|v| v["draws"].as_array().cloned().unwrap_or_default())
            .unwrap_or_default();
        let rows_b = rb
            .map(|v| v["draws"].as_array().cloned().unwrap_or_default())
            .unwrap_or_default();
        let rows = diff_draws(&build_draw_records(&rows_a), &build_draw_records(&rows_b));
        any_differences |= rows.iter().any(|r| r.status != DiffStatus::Equal);
        report.insert(
            "draws".into(),
            Value::Array(rows.iter().map(|r| r.to_json()).collect()),
        );
    }

    if focus.is_none() || focus == Some("resources") {
        let (ra, rb, both_failed) = fetch_pair(&session, "resources");
        fatal |= both_failed;
        let parse = |v: Option<Value>| -> Vec<ResourceRecord> {
            v.and_then(|v| v["rows"].as_array().cloned())
                .unwrap_or_default()
                .iter()
                .map(|r| ResourceRecord {
                    id: r["id"].as_u64().unwrap_or(0),
                    ty: r["type"].as_str().unwrap_or("").to_owned(),
                    name: r["name"].as_str().unwrap_or("").to_owned(),
                })
                .collect()
        };
        let rows = diff_resources(&parse(ra), &parse(rb));
        any_differences |= rows.iter().any(|r| r.status != DiffStatus::Equal);
        report.insert(
            "resources".into(),
            Value::Array(rows.iter().map(|r| r.to_json()).collect()),
        );
    }

    if focus.is_none() || focus == Some("stats") {
        let (ra, rb, both_failed) = fetch_pair(&session, "stats");
        fatal |= both_failed;
        let parse = |v: Option<Value>| -> Vec<PassRow> {
            v.and_then(|v| v["per_pass"].as_array().cloned())
                .unwrap_or_default()
                .iter()
                .map(PassRow::from_json)
                .collect()
        };
        let rows = diff_stats(&parse(ra), &parse(rb));
        any_differences |= rows.iter().any(|r| r.status != DiffStatus::Equal);
        report.insert(
            "stats".into(),
            Value::Array(rows.iter().map(|r| r.to_json()).collect()),
        );
    }

    session.stop();

    report.insert("session".into(), json!({"a": a.display().to_string(), "b": b.display().to_string()}));
    println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);
    Ok(core_diff::exit_code(fatal, any_differences))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = core_config::load_from(args.config.clone())?;
    let _log_guard = configure_logging(config.file.log.level.as_deref())?;

    match args.command {
        Command::Serve {
            capture,
            port,
            idle_timeout,
            session_file,
        } => serve(config, &capture, port, idle_timeout, session_file.as_deref()),
        Command::Diff {
            capture_a,
            capture_b,
            focus,
        } => {
            let code = diff(&capture_a, &capture_b, focus.as_deref())?;
            std::process::exit(code);
        }
    }
}
