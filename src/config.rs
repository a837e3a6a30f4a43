use std::path::PathBuf;

use anyhow::{anyhow, Result};
use encoding_rs::Encoding;

use crate::Cli;

pub struct Config {
    pub geocoder: Geocoding,
    pub shops: Shops,
    pub address: Option<String>,
    pub output: PathBuf,
}

pub struct Geocoding {
    pub api_key: String,
    pub url: String,
}

pub struct Shops {
    pub path: PathBuf,
    pub encoding: &'static Encoding,
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(from: Cli) -> Result<Self> {
        let Cli {
            apikey,
            address,
            data,
            encoding,
            output,
            geocoder_url,
        } = from;

        if apikey.trim().is_empty() {
            return Err(anyhow!("the geocoder API key is empty"));
        }
        let encoding = Encoding::for_label(encoding.as_bytes())
            .ok_or_else(|| anyhow!("unknown encoding: {encoding}"))?;

        Ok(Self {
            geocoder: Geocoding {
                api_key: apikey,
                url: geocoder_url,
            },
            shops: Shops {
                path: data,
                encoding,
            },
            address,
            output,
        })
    }
}
