//! portscope entrypoint: one-shot listing or a live, line-driven table.
//! Interactive commands: `/PATTERN`, `kill PID`, `details PID`, `refresh`, `help`, `quit`.

use clap::Parser;
use portscope::{
    collectors::SnapshotCollector,
    config::MonitorConfig,
    filter::{filter, FilterFields, FilterPattern},
    logging::StructuredLogger,
    scheduler::{CoreEvent, Monitor},
    snapshot::ProcessRecord,
    view::ProcessView,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::info;

const EVENT_WAIT: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "portscope", version, about = "List processes with their listening ports")]
struct Args {
    /// Config file (default: $PORTSCOPE_CONFIG_PATH or the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Initial filter pattern; `*` matches any run of characters
    #[arg(long, short)]
    filter: Option<String>,
    /// Print one snapshot and exit
    #[arg(long)]
    once: bool,
    /// With --once: one JSON object per row
    #[arg(long)]
    json: bool,
    /// Poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Filter(String),
    Kill(u32),
    Details(u32),
    Refresh,
    Help,
    Quit,
    Unknown(String),
}

enum Input {
    Line(String),
    Quit,
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if let Some(pattern) = line.strip_prefix('/') {
        return Command::Filter(pattern.to_string());
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let pid = words.next().and_then(|w| w.parse::<u32>().ok());
    match (verb, pid) {
        ("kill", Some(pid)) => Command::Kill(pid),
        ("details", Some(pid)) => Command::Details(pid),
        ("refresh", _) | ("r", _) => Command::Refresh,
        ("help", _) | ("?", _) => Command::Help,
        ("quit", _) | ("q", _) | ("exit", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

fn filter_fields(config: &MonitorConfig) -> FilterFields {
    FilterFields {
        owner: config.filter.match_owner,
        ..FilterFields::default()
    }
}

fn print_table(
    out: &mut impl Write,
    rows: &[ProcessRecord],
    view: Option<&ProcessView>,
) -> std::io::Result<()> {
    writeln!(out, "  {:>8}  {:<32} {:<20} PORTS", "PID", "NAME", "USER")?;
    for row in rows {
        let mark = match view {
            Some(v) if v.is_highlighted(row.pid) => '*',
            _ => ' ',
        };
        writeln!(
            out,
            "{} {:>8}  {:<32} {:<20} {}",
            mark,
            row.pid,
            row.name,
            row.owner,
            row.ports_label()
        )?;
    }
    Ok(())
}

fn print_view(out: &mut impl Write, view: &ProcessView) -> std::io::Result<()> {
    print_table(out, view.rows(), Some(view))?;
    writeln!(
        out,
        "-- snapshot {} | {} of {} processes | filter: {:?}",
        view.sequence().unwrap_or_default(),
        view.rows().len(),
        view.total(),
        view.pattern()
    )
}

fn run_once(
    config: &MonitorConfig,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut collector = SnapshotCollector::system(&config.sockets);
    let snapshot = collector.collect(1)?;
    let pattern = FilterPattern::new(args.filter.clone().unwrap_or_default())
        .with_fields(filter_fields(config));
    let rows = filter(&snapshot, &pattern);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        for row in &rows {
            StructuredLogger::emit_json(row, &mut out)?;
        }
    } else {
        print_table(&mut out, &rows, None)?;
    }
    info!(shown = rows.len(), total = snapshot.process_count(), "listing complete");
    Ok(())
}

fn run_interactive(
    config: &MonitorConfig,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut monitor = Monitor::system(config)?;
    let events = monitor.subscribe();
    let mut view = ProcessView::new(filter_fields(config));
    if let Some(pattern) = &args.filter {
        view.set_pattern(pattern);
    }

    let (input_tx, input_rx) = mpsc::channel();
    let ctrlc_tx = input_tx.clone();
    let _ = ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Input::Quit);
    });
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(Input::Quit);
    });

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "type `help` for commands")?;

    'ui: loop {
        match events.recv_timeout(EVENT_WAIT) {
            Ok(CoreEvent::SnapshotPublished { snapshot, changes }) => {
                let first = view.sequence().is_none();
                if view.accept(snapshot, &changes) && (first || !changes.is_empty()) {
                    print_view(&mut out, &view)?;
                }
            }
            Ok(CoreEvent::TerminationFinished(result)) => {
                writeln!(out, "{}", result.describe())?;
            }
            Ok(CoreEvent::CollectionFailed { .. }) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        while let Ok(input) = input_rx.try_recv() {
            let line = match input {
                Input::Quit => break 'ui,
                Input::Line(line) => line,
            };
            match parse_command(&line) {
                Command::Filter(pattern) => {
                    view.set_pattern(&pattern);
                    print_view(&mut out, &view)?;
                }
                Command::Kill(pid) => {
                    let name = view.find(pid).map(|p| p.name.clone()).unwrap_or_default();
                    writeln!(out, "terminating {} ({})", pid, name)?;
                    monitor.request_termination(pid);
                }
                Command::Details(pid) => match view.find(pid) {
                    Some(p) if !p.cmdline.is_empty() => writeln!(out, "{}: {}", pid, p.cmdline)?,
                    Some(_) => writeln!(out, "{}: no command line available", pid)?,
                    None => writeln!(out, "{}: not in the current snapshot", pid)?,
                },
                Command::Refresh => monitor.request_manual_refresh(),
                Command::Help => writeln!(
                    out,
                    "/PATTERN  filter by name, pid or port (`*` wildcard, `/` clears)\n\
                     kill PID  terminate a process\n\
                     details PID  show its command line\n\
                     refresh  collect now\n\
                     quit"
                )?,
                Command::Quit => break 'ui,
                Command::Unknown(text) if text.is_empty() => {}
                Command::Unknown(text) => writeln!(out, "unknown command: {}", text)?,
            }
        }
    }

    monitor.shutdown();
    info!("portscope stopping");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let config_path = MonitorConfig::resolve_path(args.config.as_deref());
    let mut config = MonitorConfig::load(&config_path);
    if let Some(secs) = args.interval {
        config.poll.interval_secs = secs;
    }

    StructuredLogger::init(&config.log);
    info!(config = %config_path.display(), "portscope starting");

    if args.once {
        run_once(&config, &args)
    } else {
        run_interactive(&config, &args)
    }
}
