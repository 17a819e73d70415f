//! status_replay - recompute proctoring statuses from recorded detector output
//!
//! Reads one JSON `DetectionResult` per line (file or stdin) and prints the
//! status each would have produced. Used to audit recorded sessions and to
//! check threshold changes offline.

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use gaze_proctor::gaze::DEFAULT_GAZE_THRESHOLD;
use gaze_proctor::status::evaluate;
use gaze_proctor::{DetectionResult, GazeClassifier};

#[derive(Parser, Debug)]
#[command(
    name = "status_replay",
    about = "Print the proctoring status for each recorded detection result"
)]
struct Args {
    /// JSON-lines file of detection results (stdin when omitted)
    #[arg(value_name = "PATH")]
    input: Option<PathBuf>,

    /// Gaze deadband in normalized frame units
    #[arg(long, default_value_t = DEFAULT_GAZE_THRESHOLD, value_name = "T")]
    threshold: f32,

    /// Only print flagged statuses
    #[arg(long)]
    flagged_only: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let classifier = GazeClassifier::new(args.threshold);
    let mut totals: BTreeMap<&'static str, u64> = BTreeMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let result: DetectionResult = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no}: invalid detection result"))?;
        let status = evaluate(&result, &classifier);
        *totals.entry(status.as_str()).or_default() += 1;
        if args.flagged_only && !status.is_flagged() {
            continue;
        }
        println!("{line_no}\t{status}");
    }

    for (status, count) in totals {
        eprintln!("{count:>6}  {status}");
    }
    Ok(())
}
