mod commands;

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use aarrow_core::{host, load_preset, ArpHost, Config, HostOptions, ParamStore};

use commands::Outcome;

const USAGE: &str = "usage: aarrow [--list] [--in <idx|name>] [--out <idx|name>] \
                     [--config <path>] [--preset <path>] [-v|--verbose]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    list: bool,
    input: Option<String>,
    output: Option<String>,
    config: Option<PathBuf>,
    preset: Option<PathBuf>,
    verbose: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--list" => parsed.list = true,
            "-v" | "--verbose" => parsed.verbose = true,
            "-h" | "--help" => parsed.help = true,
            "--in" => parsed.input = Some(value("--in")?),
            "--out" => parsed.output = Some(value("--out")?),
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--preset" => parsed.preset = Some(PathBuf::from(value("--preset")?)),
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(parsed)
}

fn init_logging(verbose: bool) {
    use simplelog::{
        ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode,
        WriteLogger,
    };

    let file_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aarrow")
        .join("aarrow.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        LevelFilter::Warn,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    match File::create(&log_path) {
        Ok(file) => loggers.push(WriteLogger::new(file_level, simplelog::Config::default(), file)),
        Err(e) => eprintln!("cannot write {}: {}", log_path.display(), e),
    }
    let _ = CombinedLogger::init(loggers);

    log::info!("aarrow starting (file log level: {:?})", file_level);
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return;
    }

    init_logging(args.verbose);
    if let Err(e) = run(args) {
        log::error!("{}", e);
        eprintln!("aarrow: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    if args.list {
        let (inputs, outputs) = host::list_ports(config.client_name());
        println!("MIDI inputs:");
        inputs.iter().for_each(|p| println!("  {}", p));
        println!("MIDI outputs:");
        outputs.iter().for_each(|p| println!("  {}", p));
        return Ok(());
    }

    let mut store = ParamStore::new(config.params(), config.transport());
    if let Some(path) = &args.preset {
        store.replace(load_preset(path)?);
    }

    let mut options = HostOptions::from_config(&config);
    if args.input.is_some() {
        options.input_port = args.input.clone();
    }
    if args.output.is_some() {
        options.output_port = args.output.clone();
    }

    let host = ArpHost::start(options, &mut store)?;
    println!(
        "aarrow running at {} Hz  in: {}  out: {}",
        host.sample_rate(),
        host.input_port().unwrap_or("-"),
        host.output_port().unwrap_or("-"),
    );
    store.describe().iter().for_each(|line| println!("  {}", line));
    println!("type 'help' for commands");

    command_loop(&host, &mut store)?;
    Ok(())
}

fn command_loop(host: &ArpHost, store: &mut ParamStore) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        match commands::parse(&line) {
            Ok(None) => {}
            Ok(Some(command)) => match commands::apply(command, store) {
                Outcome::Print(lines) => lines.iter().for_each(|l| println!("{}", l)),
                Outcome::Reset => {
                    host.request_reset();
                    println!("reset");
                }
                Outcome::Quit => break,
            },
            Err(e) => println!("{}", e),
        }
        write!(stdout, "> ")?;
        stdout.flush()?;
    }
    log::info!("command loop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_and_values() {
        let parsed = parse_args(&args(&["--in", "KeyStep", "--out", "1", "-v", "--preset", "p.json"])).unwrap();
        assert_eq!(parsed.input.as_deref(), Some("KeyStep"));
        assert_eq!(parsed.output.as_deref(), Some("1"));
        assert_eq!(parsed.preset, Some(PathBuf::from("p.json")));
        assert!(parsed.verbose);
        assert!(!parsed.list);
    }

    #[test]
    fn no_args_is_default() {
        assert_eq!(parse_args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn missing_value_and_unknown_flag_fail() {
        assert_eq!(parse_args(&args(&["--config"])), Err("--config needs a value".to_string()));
        assert!(parse_args(&args(&["--fast"])).is_err());
    }
}
