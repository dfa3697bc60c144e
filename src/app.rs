//! Wires the CLI onto the feed: one subscriber that prints each tick as a
//! JSON line, plus a channel to know when a tick has been delivered.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use crate::cli::{Cli, Command, RandomArgs, StreamArgs};
use crate::data::WorkbookSource;
use crate::domain::TickPayload;
use crate::error::FeedError;
use crate::stream::{Bindings, RandomStreamOptions, Subscriber, TelemetryFeed};

pub fn run() -> Result<(), FeedError> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Stream(args) => handle_stream(args),
        Command::Random(args) => handle_random(args),
    }
}

fn print_payload(tx: mpsc::Sender<()>) -> Subscriber {
    Arc::new(move |payload: &TickPayload| {
        match serde_json::to_string(payload) {
            Ok(line) => println!("{line}"),
            Err(err) => log::error!("failed to serialize tick {}: {err}", payload.tick),
        }
        let _ = tx.send(());
    })
}

fn handle_stream(args: StreamArgs) -> Result<(), FeedError> {
    let mut feed = TelemetryFeed::new(WorkbookSource::from_arg(&args.workbook));
    let (tx, rx) = mpsc::channel();
    let _sub = feed.subscribe(print_payload(tx));

    feed.start_workbook_stream(Duration::from_millis(args.interval_ms))?;
    match args.ticks {
        Some(n) => {
            for _ in 0..n {
                if rx.recv().is_err() {
                    break;
                }
            }
        }
        None => while rx.recv().is_ok() {},
    }
    feed.stop();
    Ok(())
}

fn handle_random(args: RandomArgs) -> Result<(), FeedError> {
    let mut feed = TelemetryFeed::new(WorkbookSource::default());
    let (tx, rx) = mpsc::channel();
    let _sub = feed.subscribe(print_payload(tx));

    feed.start_random_stream(
        Duration::from_millis(args.interval_ms),
        Bindings::default(),
        RandomStreamOptions {
            max_ticks: args.max_ticks,
            start_date: args.start_date,
            seed: args.seed,
        },
    );
    for _ in 0..args.max_ticks {
        if rx.recv().is_err() {
            break;
        }
    }
    feed.stop();
    Ok(())
}
