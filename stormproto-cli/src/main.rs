//! Command-line dumper for Heroes of the Storm replays.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;
use serde_json::to_string as to_json;
use stormproto::{Replay, Value};

#[derive(Parser)]
#[command(name = "stormproto", about = "Decode Heroes of the Storm replay files")]
struct Args {
    /// .StormReplay file to load
    replay_file: PathBuf,

    /// print protocol header
    #[arg(long)]
    header: bool,

    /// print protocol details
    #[arg(long)]
    details: bool,

    /// print protocol initdata
    #[arg(long)]
    initdata: bool,

    /// print game events
    #[arg(long)]
    gameevents: bool,

    /// print message events
    #[arg(long)]
    messageevents: bool,

    /// print tracker events
    #[arg(long)]
    trackerevents: bool,

    /// print attributes events
    #[arg(long)]
    attributeevents: bool,

    /// print per-event-type stats
    #[arg(long)]
    stats: bool,

    /// print output as json
    #[arg(long)]
    json: bool,
}

/// Prints decoded values and tallies per-event-type counts and sizes.
struct EventLogger {
    json: bool,
    stats: HashMap<String, (u64, u64)>,
}

impl EventLogger {
    fn new(json: bool) -> Self {
        Self {
            json,
            stats: HashMap::new(),
        }
    }

    fn log_value(&self, value: &Value) {
        if self.json {
            match to_json(value) {
                Ok(json) => println!("{}", json),
                Err(error) => eprintln!("error: {}", error),
            }
        } else {
            println!("{}", value);
        }
    }

    fn log_event(&mut self, event: &Value) {
        if let (Some(Value::Str(name)), Some(bits)) = (
            event.field("_event"),
            event.field("_bits").and_then(Value::as_int),
        ) {
            let stat = self.stats.entry(name.clone()).or_insert((0, 0));
            stat.0 += 1;
            stat.1 += bits as u64;
        }
        self.log_value(event);
    }

    fn log_stats(&self) {
        let mut stats: Vec<_> = self.stats.iter().collect();
        stats.sort_by_key(|(_, (_, bits))| *bits);
        for (name, (count, bits)) in stats {
            eprintln!("\"{}\", {}, {},", name, count, bits / 8);
        }
    }
}

fn with_file<T>(name: &str, result: stormproto::Result<T>) -> Result<T, String> {
    result.map_err(|error| format!("{}: {}", name, error))
}

fn run(args: &Args) -> Result<(), String> {
    let mut replay = with_file("replay", Replay::open(&args.replay_file))?;
    debug!(
        "opened {} with base build {}",
        args.replay_file.display(),
        replay.base_build()
    );
    let mut logger = EventLogger::new(args.json);

    if args.header {
        let header = with_file("header", replay.decode_header())?;
        logger.log_value(&header);
    }

    if args.details {
        let details = with_file("replay.details", replay.decode_replay_details())?;
        logger.log_value(&details);
    }

    if args.initdata {
        let initdata = with_file("replay.initData", replay.decode_replay_initdata())?;
        if let Some(handles) = initdata.at_path(&[
            "m_syncLobbyState",
            "m_gameDescription",
            "m_cacheHandles",
        ]) {
            logger.log_value(handles);
        }
        logger.log_value(&initdata);
    }

    if args.gameevents {
        for event in with_file("replay.game.events", replay.decode_replay_game_events())? {
            logger.log_event(&with_file("replay.game.events", event)?);
        }
    }

    if args.messageevents {
        let events = with_file(
            "replay.message.events",
            replay.decode_replay_message_events(),
        )?;
        for event in events {
            logger.log_event(&with_file("replay.message.events", event)?);
        }
    }

    if args.trackerevents {
        let events = with_file(
            "replay.tracker.events",
            replay.decode_replay_tracker_events(),
        )?;
        for event in events {
            logger.log_event(&with_file("replay.tracker.events", event)?);
        }
    }

    if args.attributeevents {
        let attributes = with_file(
            "replay.attributes.events",
            replay.decode_replay_attributes_events(),
        )?;
        if args.json {
            match to_json(&attributes) {
                Ok(json) => println!("{}", json),
                Err(error) => eprintln!("error: {}", error),
            }
        } else {
            println!("{}", attributes);
        }
    }

    if args.stats {
        logger.log_stats();
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}
