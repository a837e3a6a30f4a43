use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use encoding_rs::Encoding;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::coords::Coordinate;

#[derive(Clone, Debug, PartialEq)]
pub struct ShopRecord {
    pub name: String,
    pub coordinate: Coordinate,
}

// the open data exports carry many more columns, only these are needed
#[serde_as]
#[derive(Deserialize)]
struct RawShop {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Latitude_WGS84")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    lat: f64,
    #[serde(rename = "Longitude_WGS84")]
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    lon: f64,
}

impl RawShop {
    fn refine(self) -> ShopRecord {
        ShopRecord {
            name: self.name,
            coordinate: Coordinate::new(self.lat, self.lon),
        }
    }
}

pub fn load(path: &Path, encoding: &'static Encoding) -> Result<Vec<ShopRecord>> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let shops = parse(&bytes, encoding)
        .with_context(|| format!("failed to load shops from {}", path.display()))?;
    log::info!("Loaded {} shops from {}", shops.len(), path.display());
    Ok(shops)
}

/// Decodes `bytes` and parses them as a JSON array of shops, keeping file order.
pub fn parse(bytes: &[u8], encoding: &'static Encoding) -> Result<Vec<ShopRecord>> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        bail!("invalid {} data", encoding.name());
    }

    let raw: Vec<RawShop> = serde_json::from_str(&text)?;
    Ok(raw.into_iter().map(RawShop::refine).collect())
}
