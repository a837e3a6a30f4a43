use std::{fs, path::Path};

use anyhow::{Context, Result};
use askama::Template;
use serde::Serialize;

use crate::{coords::Coordinate, ranking::RankedShop};

pub const DEFAULT_ZOOM: u8 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    User,
    Shop,
}

#[derive(Debug, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub location: [f64; 2],
    pub tooltip: String,
    pub popup: String,
    pub color: &'static str,
    pub icon: &'static str,
}

impl Marker {
    fn user(at: &Coordinate) -> Self {
        Self {
            kind: MarkerKind::User,
            location: [at.lat, at.lon],
            tooltip: "Вы здесь".to_string(),
            popup: "Ваше местоположение".to_string(),
            color: "red",
            icon: "home",
        }
    }

    fn shop(shop: &RankedShop) -> Self {
        Self {
            kind: MarkerKind::Shop,
            location: [shop.coordinate.lat, shop.coordinate.lon],
            tooltip: format!("{} - {:.2} км", shop.name, shop.distance),
            popup: shop.name.clone(),
            color: "blue",
            icon: "coffee",
        }
    }
}

pub struct CoffeeMap {
    pub center: Coordinate,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

#[derive(Template)]
#[template(path = "coffee_map.html")]
struct MapPage<'a> {
    center: &'a Coordinate,
    zoom: u8,
    markers: &'a str,
}

impl CoffeeMap {
    pub fn new(user: &Coordinate, shops: &[RankedShop]) -> Self {
        let mut markers = vec![Marker::user(user)];
        markers.extend(shops.iter().map(Marker::shop));
        Self {
            center: *user,
            zoom: DEFAULT_ZOOM,
            markers,
        }
    }

    /// Renders a standalone HTML page.
    pub fn render(&self) -> Result<String> {
        // keep names like "</script>" from closing the script element
        let markers = serde_json::to_string(&self.markers)?.replace('<', "\\u003c");
        let page = MapPage {
            center: &self.center,
            zoom: self.zoom,
            markers: &markers,
        };
        Ok(page.render()?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let html = self.render()?;
        fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved map to {}", path.display());
        Ok(())
    }
}
