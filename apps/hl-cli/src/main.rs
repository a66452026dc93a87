use clap::{Parser, Subcommand, ValueEnum};
use hl_app::{AppError, AppResult, Config, ExportFormat, Runtime, Session, load_config};
use hl_bus::Broker;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "hl-cli")]
#[command(about = "hydroloop - coupled boiler and building heating simulator", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both loops in real time. Reads `<topic> <payload>` lines from stdin
    /// and publishes them; `status` prints both loops, `quit` or EOF stops.
    Run {
        /// Path to the config YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many seconds
        #[arg(long)]
        duration_s: Option<u64>,
    },
    /// Run an accelerated lockstep simulation and export every tick
    Simulate {
        /// Path to the config YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of ticks to run
        #[arg(long)]
        ticks: usize,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
    /// Print the effective configuration
    Config {
        /// Path to the config YAML file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Only validate, print nothing on success
        #[arg(long)]
        check: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ExportFormat::Csv,
            Format::Json => ExportFormat::JsonLines,
        }
    }
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, duration_s } => cmd_run(config.as_deref(), duration_s),
        Commands::Simulate {
            config,
            ticks,
            output,
            format,
        } => cmd_simulate(config.as_deref(), ticks, output.as_deref(), format.into()),
        Commands::Config { config, check } => cmd_config(config.as_deref(), check),
    }
}

fn load_valid(path: Option<&Path>) -> AppResult<Config> {
    let config = load_config(path)?;
    config.validate()?;
    Ok(config)
}

fn cmd_config(path: Option<&Path>, check: bool) -> AppResult<()> {
    let config = load_valid(path)?;
    if check {
        eprintln!("✓ Config is valid");
    } else {
        print!("{}", config.to_yaml()?);
    }
    Ok(())
}

fn cmd_simulate(
    path: Option<&Path>,
    ticks: usize,
    output: Option<&Path>,
    format: ExportFormat,
) -> AppResult<()> {
    let config = load_valid(path)?;
    let mut session = Session::new(&config)?;
    let rows = session.run(ticks);
    session.shutdown();

    match output {
        Some(path) => {
            let mut file = io::BufWriter::new(std::fs::File::create(path)?);
            hl_app::write_rows(&rows, format, &mut file)?;
            file.flush()?;
            eprintln!("✓ Exported {} ticks to {}", rows.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            hl_app::write_rows(&rows, format, &mut out)?;
        }
    }
    Ok(())
}

enum Input {
    Line(String),
    Eof,
}

fn cmd_run(path: Option<&Path>, duration_s: Option<u64>) -> AppResult<()> {
    let config = load_valid(path)?;
    let runtime = Runtime::start(&config, Broker::new())?;

    let (tx, rx) = mpsc::channel();
    // Detached: a blocked stdin read must not hold up shutdown.
    thread::Builder::new().name("stdin".to_string()).spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(Input::Eof);
    })?;

    let deadline = duration_s.map(|s| Instant::now() + Duration::from_secs(s));
    loop {
        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    info!("run duration reached");
                    break;
                }
                deadline - now
            }
            None => Duration::from_secs(3600),
        };
        match rx.recv_timeout(wait) {
            Ok(Input::Line(line)) => {
                if !handle_line(&runtime, line.trim())? {
                    break;
                }
            }
            // Without a duration, end of input ends the run.
            Ok(Input::Eof) | Err(RecvTimeoutError::Disconnected) => match deadline {
                Some(deadline) => thread::sleep(deadline.saturating_duration_since(Instant::now())),
                None => break,
            },
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    runtime.shutdown()
}

/// Returns `false` when the operator asked to stop.
fn handle_line(runtime: &Runtime, line: &str) -> AppResult<bool> {
    match line {
        "" => {}
        "quit" | "exit" => return Ok(false),
        "status" => {
            let b = runtime.boiler();
            let t = runtime.thermal();
            println!(
                "boiler: water {:.1}°C return {:.1}°C setpoint {:.1}°C modulation {:.0}% flame {} pressure {:.2} bar",
                b.boiler_temp,
                b.return_temp,
                b.setpoint,
                b.modulation,
                if b.flame { "ON" } else { "OFF" },
                b.pressure
            );
            println!(
                "house:  indoor {:.1}°C outdoor {:.1}°C target {:.1}°C demand {:.0}% windows open {}",
                t.indoor_temp, t.outdoor_temp, t.target_temp, t.heating_demand, t.windows_open
            );
        }
        _ => match line.split_once(char::is_whitespace) {
            Some((topic, payload)) => match runtime.inject(topic, payload.trim()) {
                Ok(()) => info!(topic, payload = payload.trim(), "published"),
                Err(AppError::Bus(message)) => warn!(topic, %message, "publish rejected"),
                Err(e) => return Err(e),
            },
            None => warn!(line, "expected `<topic> <payload>`"),
        },
    }
    Ok(true)
}
