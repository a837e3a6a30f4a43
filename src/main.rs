use std::{
    io::{self, BufRead, IsTerminal},
    path::PathBuf,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use inquire::Text;

use crate::{
    config::Config,
    geocoder::{Geocoded, Geocoder, YANDEX_GEOCODER_URL},
    map::CoffeeMap,
    ranking::{RankedShop, NEAREST_SHOPS},
};

mod config;
mod coords;
mod geocoder;
mod map;
mod ranking;
mod shops;

const PROMPT: &str = "Где вы находитесь?";

/// Finds the coffee shops nearest to an address and plots them on a map.
#[derive(Debug, Parser)]
pub struct Cli {
    /// Yandex Geocoder API key
    #[arg(long, env = "apikey", hide_env_values = true)]
    apikey: String,
    /// Skip the prompt and geocode this address
    #[arg(long)]
    address: Option<String>,
    #[arg(long, default_value = "coffee.json")]
    data: PathBuf,
    /// Text encoding of the data file
    #[arg(long, default_value = "windows-1251")]
    encoding: String,
    #[arg(long, default_value = "coffee_map.html")]
    output: PathBuf,
    #[arg(long, default_value = YANDEX_GEOCODER_URL)]
    geocoder_url: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config = Config::try_from(Cli::parse())?;
    run(config)?;

    Ok(())
}

fn run(config: Config) -> Result<Vec<RankedShop>> {
    let geocoder =
        Geocoder::new(config.geocoder.api_key).with_base_url(config.geocoder.url);

    let address = match config.address {
        Some(x) => x,
        None => read_address()?,
    };
    let user = match geocoder.locate(&address)? {
        Geocoded::Found(x) => x,
        Geocoded::NotFound => bail!("address not found: {address:?}"),
    };
    log::info!("{address:?} is at {user}");

    let shops = shops::load(&config.shops.path, config.shops.encoding)?;
    let nearest = ranking::nearest(&user, &shops, NEAREST_SHOPS);
    for shop in &nearest {
        println!("{}", shop.name);
    }

    CoffeeMap::new(&user, &nearest).save(&config.output)?;

    Ok(nearest)
}

fn read_address() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(Text::new(PROMPT).prompt()?);
    }

    eprint!("{PROMPT} ");
    read_line(stdin.lock())
}

// one line, verbatim apart from its line ending
fn read_line(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line).context("failed to read address")? == 0 {
        bail!("no address given");
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}
