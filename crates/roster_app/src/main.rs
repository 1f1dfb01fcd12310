mod config;
mod console;
mod logging;
mod render;
mod report;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use roster_logging::roster_warn;

struct Args {
    input: String,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut input = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            _ if input.is_none() => input = Some(arg),
            _ => bail!("unexpected argument {arg}"),
        }
    }
    let input = input.context("usage: roster_app <input-file|-> [--config <path>]")?;
    Ok(Args { input, config })
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("reading stdin")?;
        return Ok(content);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {input}"))
}

fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(config::CONFIG_FILENAME));
    let loaded = config::load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        Ok(None) | Err(_) => config::ConsoleConfig::default(),
    };
    logging::initialize(config.log_destination);
    if let Err(err) = &loaded {
        roster_warn!("Ignoring config {:?}: {:#}", config_path, err);
    }

    let content = read_input(&args.input)?;
    match console::run_import(&config, content) {
        Some(outcome) if outcome.is_finished() => Ok(()),
        Some(outcome) => bail!("import did not finish cleanly: {outcome:?}"),
        None => bail!("nothing was imported"),
    }
}
