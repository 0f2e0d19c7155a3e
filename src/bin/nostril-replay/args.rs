use std::path::Path;

use anyhow::Result;
use clap::value_t_or_exit;
use nasal_thermal::{arg, args_parser, opt, PipelineConfig};

pub struct Args {
    pub paths: Vec<String>,
    pub config: PipelineConfig,
    pub verbose: bool,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("nostril-replay")
            .about("Replay recorded sessions and report nostril temperatures.")
            .arg(
                opt!("config")
                    .short("c")
                    .help("Pipeline config json (default: built-in FLIR ONE setup)"),
            )
            .arg(
                opt!("capacity")
                    .short("n")
                    .help("History counter cycle length.  Overrides the config"),
            )
            .arg(
                opt!("parallel_blocks")
                    .short("p")
                    .takes_value(false)
                    .help("Measure the four blocks on the rayon pool"),
            )
            .arg(
                opt!("verbose")
                    .short("v")
                    .takes_value(false)
                    .help("Log every frame"),
            )
            .arg(
                arg!("paths")
                    .required(true)
                    .multiple(true)
                    .help("Session json paths (`-` for stdin)"),
            )
            .get_matches();

        let mut config = match matches.value_of("config") {
            Some(path) => PipelineConfig::from_path(Path::new(path))?,
            None => PipelineConfig::default(),
        };
        if matches.is_present("capacity") {
            config.history_capacity = value_t_or_exit!(matches.value_of("capacity"), usize);
        }
        if matches.is_present("parallel_blocks") {
            config.parallel_blocks = true;
        }
        config.validate()?;

        let paths = matches
            .values_of("paths")
            .map(|v| v.map(|f| f.into()).collect())
            .unwrap_or_default();
        let verbose = matches.is_present("verbose");

        Ok(Args {
            paths,
            config,
            verbose,
        })
    }
}
