use std::env;
use std::io;
use std::process::ExitCode;

use levelmap_cli::{run, CommandKind, CommonOptions};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let mut options = CommonOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--pixels-per-unit" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --pixels-per-unit".to_string())?;
                options.pixels_per_unit = value.parse::<i32>().map_err(|_| {
                    format!("invalid --pixels-per-unit value '{value}' (expected an integer)")
                })?;
                index += 2;
            }
            _ => break,
        }
    }

    let command = args
        .get(index)
        .ok_or_else(|| "missing subcommand".to_string())?
        .as_str();
    let command_args = &args[(index + 1)..];

    let kind = match command {
        "summary" => CommandKind::Summary {
            map: single_map_arg(command, command_args)?,
        },
        "tiles" => CommandKind::Tiles {
            map: single_map_arg(command, command_args)?,
        },
        "spawns" => CommandKind::Spawns {
            map: single_map_arg(command, command_args)?,
        },
        "check-atlas" => CommandKind::CheckAtlas {
            map: single_map_arg(command, command_args)?,
        },
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    run(kind, options, &mut io::stdout())
}

fn single_map_arg(command: &str, args: &[String]) -> Result<String, String> {
    match args {
        [map] => Ok(map.clone()),
        [] => Err(format!("{command} requires a map file argument")),
        _ => Err(format!("{command} takes a single map file argument")),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "levelmap_cli - tile-map inspection client",
        "",
        "Usage:",
        "  levelmap_cli [--pixels-per-unit <i32>] summary <map>",
        "  levelmap_cli [--pixels-per-unit <i32>] tiles <map>",
        "  levelmap_cli [--pixels-per-unit <i32>] spawns <map>",
        "  levelmap_cli [--pixels-per-unit <i32>] check-atlas <map>",
        "",
        "Maps name either a file on disk or an entry under <root>/data/maps;",
        "set LEVELMAP_ROOT to pick the root explicitly.",
        "",
        "Defaults:",
        "  --pixels-per-unit 32",
    ]
    .join("\n")
}
