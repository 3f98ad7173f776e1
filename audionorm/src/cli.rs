pub mod peak;

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{builder::ValueParser, value_parser, Arg, ArgAction, Command};

use crate::cli::peak::parse_peak;

pub const DEFAULT_EXTENSIONS_ARG: &str = "wav,flac,ogg,aiff,mp3";

pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about("Normalize the peak level of audio files in a directory")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("input_dir")
                .value_name("INPUT_DIR")
                .help("Directory containing the audio files to process")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output_dir")
                .value_name("OUTPUT_DIR")
                .help("Directory where the normalized copies will be written")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("target_peak")
                .value_name("TARGET_PEAK")
                .help("Peak magnitude to normalize to (default 1.0)")
                .value_parser(ValueParser::new(parse_peak)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .help("Number of worker threads")
                .default_value("4")
                .value_parser(value_parser!(NonZeroUsize)),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILE")
                .help("Path of the shared batch log (default: <OUTPUT_DIR>/log.txt)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("extensions")
                .long("extensions")
                .value_name("LIST")
                .help("Comma-separated list of file extensions to accept")
                .default_value(DEFAULT_EXTENSIONS_ARG),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Preview the output files without processing")
                .action(ArgAction::SetTrue),
        )
}
