use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use agro_cli::commands::{run_crop, run_yield, RunOptions};
use agro_cli::input::{load_model_config, read_records};
use agro_models::config::ModelConfig;
use agro_models::data_handling::{CropInput, YieldInput};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("AGRO_LOG", "error,agro=info"))
        .init();

    let matches = Command::new("agro")
        .version(clap::crate_version!())
        .about("\u{1F33E} Agro CLI - crop recommendation and yield prediction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(with_shared_args(
            Command::new("crop")
                .about("Recommend the three most likely crops for soil and climate readings")
                .arg(number_arg("nitrogen", "Soil nitrogen (kg/ha)"))
                .arg(number_arg("phosphorus", "Soil phosphorus (kg/ha)"))
                .arg(number_arg("potassium", "Soil potassium (kg/ha)"))
                .arg(number_arg("temperature", "Mean temperature (\u{00B0}C)"))
                .arg(number_arg("humidity", "Relative humidity (%)"))
                .arg(number_arg("ph", "Soil pH"))
                .arg(number_arg("rainfall", "Rainfall (mm)")),
        ))
        .subcommand(with_shared_args(
            Command::new("yield")
                .about("Predict harvest for a farm")
                .arg(number_arg("area", "Cultivated area (hectares)"))
                .arg(number_arg("rainfall", "Annual rainfall (mm)"))
                .arg(number_arg("fertilizer", "Fertilizer (kg/ha)"))
                .arg(number_arg("pesticides", "Pesticides (kg/ha)"))
                .arg(text_arg("season", "Growing season (kharif, rabi or summer)"))
                .arg(text_arg("state", "State, used for the regional productivity factor"))
                .arg(text_arg("crop_year", "Crop year, carried through to the output")),
        ))
        .get_matches();

    match matches.subcommand() {
        Some(("crop", sub_m)) => handle_crop(sub_m),
        Some(("yield", sub_m)) => handle_yield(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn with_shared_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("input")
            .short('i')
            .long("input")
            .help("CSV or TSV file with one record per row. Replaces the per-field flags.")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
    .arg(
        Arg::new("config")
            .short('c')
            .long("config")
            .help("Path to a JSON training configuration. Defaults are used when omitted.")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
    .arg(
        Arg::new("seed")
            .short('s')
            .long("seed")
            .help("Seed for training and scoring randomness")
            .value_parser(clap::value_parser!(u64)),
    )
    .arg(
        Arg::new("output_file")
            .short('o')
            .long("output")
            .help("Path to write predictions (JSON). Defaults to stdout.")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
    )
}

fn number_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_parser(clap::value_parser!(f32))
        .allow_negative_numbers(true)
        .required_unless_present("input")
        .conflicts_with("input")
}

fn text_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .conflicts_with("input")
}

fn run_options(matches: &ArgMatches) -> Result<RunOptions> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[Agro] Using config: {:?}", path);
            load_model_config(path)?
        }
        None => {
            let config = ModelConfig::default();
            log::debug!(
                "[Agro] No config provided; using defaults:\n{}",
                serde_json::to_string_pretty(&config).unwrap_or_default()
            );
            config
        }
    };

    Ok(RunOptions {
        config,
        seed: matches.get_one::<u64>("seed").copied(),
        output: matches.get_one::<PathBuf>("output_file").cloned(),
    })
}

fn number(matches: &ArgMatches, name: &str) -> f32 {
    matches.get_one::<f32>(name).copied().unwrap_or_default()
}

fn text(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn handle_crop(matches: &ArgMatches) -> Result<()> {
    let opts = run_options(matches)?;
    let inputs: Vec<CropInput> = match matches.get_one::<PathBuf>("input") {
        Some(path) => read_records(path)?,
        None => vec![CropInput {
            nitrogen: number(matches, "nitrogen"),
            phosphorus: number(matches, "phosphorus"),
            potassium: number(matches, "potassium"),
            temperature: number(matches, "temperature"),
            humidity: number(matches, "humidity"),
            ph: number(matches, "ph"),
            rainfall: number(matches, "rainfall"),
        }],
    };

    match run_crop(&inputs, &opts) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Crop recommendation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_yield(matches: &ArgMatches) -> Result<()> {
    let opts = run_options(matches)?;
    let inputs: Vec<YieldInput> = match matches.get_one::<PathBuf>("input") {
        Some(path) => read_records(path)?,
        None => vec![YieldInput {
            crop_year: text(matches, "crop_year"),
            season: text(matches, "season"),
            state: text(matches, "state"),
            area: number(matches, "area"),
            annual_rainfall: number(matches, "rainfall"),
            fertilizer: number(matches, "fertilizer"),
            pesticides: number(matches, "pesticides"),
        }],
    };

    match run_yield(&inputs, &opts) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("Yield prediction failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
