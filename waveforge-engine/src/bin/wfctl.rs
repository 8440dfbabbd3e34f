//! Waveforge engine client CLI
//!
//! Thin HTTP/SSE client for a running engine: probe files, submit
//! EDLs, render windows, and follow the event stream.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{BufRead, BufReader, Read};
use waveforge_common::events::EngineEvent;
use waveforge_common::model::Edl;
use waveforge_common::time::seconds_to_samples;

#[derive(Parser, Debug)]
#[command(author, version, about = "Waveforge engine client", long_about = None)]
struct Cli {
    /// Engine base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:5740")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the engine is reachable
    Ping,

    /// Probe a media file and report its parameters
    Load {
        /// Path to the media file (as seen by the engine)
        #[arg(long)]
        path: String,
    },

    /// One-shot render of a file window to a float-32 WAV
    Render {
        /// Source media file
        #[arg(long)]
        path: String,
        /// Output WAV path
        #[arg(long)]
        out: String,
        /// Window start in seconds (default 0)
        #[arg(long)]
        start: Option<f64>,
        /// Window length in seconds (default: to end of file)
        #[arg(long)]
        dur: Option<f64>,
    },

    /// Submit an EDL document (JSON file, or '-' for stdin)
    EdlUpdate {
        /// Path to the EDL JSON file
        #[arg(long)]
        edl: String,
        /// Request replace semantics (reserved; no effect today)
        #[arg(long)]
        replace: bool,
    },

    /// Render a window of the active EDL to WAV
    EdlRender {
        /// Id the active EDL must carry
        #[arg(long)]
        edl_id: String,
        /// Window start in seconds
        #[arg(long)]
        start: f64,
        /// Window length in seconds
        #[arg(long)]
        dur: f64,
        /// Output WAV path
        #[arg(long)]
        out: String,
        /// Output bit depth
        #[arg(long, default_value_t = 16)]
        bit_depth: u32,
        /// Timeline sample rate used to convert seconds to samples
        #[arg(long, default_value_t = 48000)]
        sample_rate: u32,
    },

    /// Follow the engine event stream
    Subscribe {
        /// Session label passed to the engine (logged only)
        #[arg(long)]
        edl_id: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let server = cli.server.trim_end_matches('/');

    match cli.command {
        Command::Ping => {
            let resp = client
                .get(format!("{}/health", server))
                .send()
                .context("engine unreachable")?;
            if !resp.status().is_success() {
                bail!("engine unhealthy: {}", resp.status());
            }
            println!("ok");
        }

        Command::Load { path } => {
            let resp: serde_json::Value = client
                .post(format!("{}/file/load", server))
                .json(&json!({ "path": path }))
                .send()
                .context("engine unreachable")?
                .json()
                .context("malformed response")?;
            if resp["success"].as_bool() != Some(true) {
                bail!("load failed: {}", resp["message"].as_str().unwrap_or("unknown"));
            }
            println!("{}", serde_json::to_string_pretty(&resp["file_info"])?);
        }

        Command::Render { path, out, start, dur } => {
            let resp = client
                .post(format!("{}/file/render", server))
                .json(&json!({
                    "path": path,
                    "start_sec": start,
                    "duration_sec": dur,
                    "out_path": out,
                }))
                .send()
                .context("engine unreachable")?;
            follow_render_stream(resp)?;
        }

        Command::EdlUpdate { edl, replace } => {
            let text = read_document(&edl)?;
            let edl: Edl = Edl::from_json(&text).context("invalid EDL JSON")?;
            let resp = client
                .post(format!("{}/edl", server))
                .json(&json!({ "edl": edl, "replace": replace }))
                .send()
                .context("engine unreachable")?;
            let status = resp.status();
            let body: serde_json::Value = resp.json().context("malformed response")?;
            if !status.is_success() {
                bail!(
                    "update rejected: {}",
                    body["error"].as_str().unwrap_or("unknown error")
                );
            }
            println!(
                "accepted: edl_id={} revision={} tracks={} clips={}",
                body["edl_id"].as_str().unwrap_or("?"),
                body["revision"].as_str().unwrap_or("?"),
                body["track_count"],
                body["clip_count"],
            );
        }

        Command::EdlRender { edl_id, start, dur, out, bit_depth, sample_rate } => {
            if ![16, 24, 32].contains(&bit_depth) {
                bail!("unsupported bit depth {} (expected 16, 24, or 32)", bit_depth);
            }
            let resp = client
                .post(format!("{}/edl/render", server))
                .json(&json!({
                    "edl_id": edl_id,
                    "range": {
                        "start_samples": seconds_to_samples(start, sample_rate),
                        "duration_samples": seconds_to_samples(dur, sample_rate),
                    },
                    "out_path": out,
                    "bit_depth": bit_depth,
                }))
                .send()
                .context("engine unreachable")?;
            follow_render_stream(resp)?;
        }

        Command::Subscribe { edl_id } => {
            let mut req = client.get(format!("{}/events", server));
            if let Some(session) = edl_id {
                req = req.query(&[("session", session)]);
            }
            let resp = req.send().context("engine unreachable")?;
            for event in EventLines::new(resp) {
                println!("{}", serde_json::to_string(&event?)?);
            }
        }
    }

    Ok(())
}

/// Read a document from a path, or stdin when the path is `-`.
fn read_document(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path))
    }
}

/// Follow a render SSE stream, printing progress, until the terminal
/// event arrives.
fn follow_render_stream(resp: reqwest::blocking::Response) -> Result<()> {
    for event in EventLines::new(resp) {
        match event? {
            EngineEvent::Progress { fraction, eta_seconds } => match eta_seconds {
                Some(eta) => eprintln!("rendering... {:3.0}% (eta {:.1}s)", fraction * 100.0, eta),
                None => eprintln!("rendering... {:3.0}%", fraction * 100.0),
            },
            EngineEvent::Complete { out_path, duration_sec, sha256 } => {
                println!("complete: {} ({:.3}s) sha256={}", out_path, duration_sec, sha256);
                return Ok(());
            }
            EngineEvent::EdlError { reason, .. } => bail!("render failed: {}", reason),
            EngineEvent::Error { code, message } => bail!("render failed [{}]: {}", code, message),
            _ => {}
        }
    }
    bail!("stream ended without a completion event")
}

/// Iterator over `EngineEvent`s in an SSE byte stream.
struct EventLines<R: Read> {
    lines: std::io::Lines<BufReader<R>>,
}

impl<R: Read> EventLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

impl<R: Read> Iterator for EventLines<R> {
    type Item = Result<EngineEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let data = line
                .strip_prefix("data: ")
                .or_else(|| line.strip_prefix("data:"));
            let Some(data) = data else {
                // Comments, event names, blank keep-alive separators
                continue;
            };
            return Some(
                serde_json::from_str(data)
                    .with_context(|| format!("malformed event: {}", data)),
            );
        }
        None
    }
}
