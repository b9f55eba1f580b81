use anyhow::Result;
use clap::{App, Arg};
use sitegen::build::build_site;
use sitegen::config::{BuildKind, Config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("sitegen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static personal site from posts, projects and pages")
        .arg(
            Arg::with_name("test")
                .long("test")
                .help("Build with the project's `test` profile"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Log every file as it is written"),
        )
        .arg(
            Arg::with_name("project")
                .long("project")
                .takes_value(true)
                .value_name("DIR")
                .help("Directory to search for sitegen.yaml (default: current directory)"),
        )
        .get_matches();

    init_tracing(matches.is_present("verbose"));

    let kind = match matches.is_present("test") {
        true => BuildKind::Test,
        false => BuildKind::Production,
    };
    let project = matches.value_of("project").map(PathBuf::from);

    if let Err(e) = run(project, kind) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(project: Option<PathBuf>, kind: BuildKind) -> Result<()> {
    let dir = match project {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = Config::from_directory(&dir, kind)?;
    build_site(&config)?;
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = match verbose {
        true => "debug",
        false => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
