use itertools::Itertools;

use crate::{coords::Coordinate, shops::ShopRecord};

pub const NEAREST_SHOPS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct RankedShop {
    pub name: String,
    pub coordinate: Coordinate,
    /// kilometres
    pub distance: f64,
}

/// Returns up to `limit` shops closest to `user`, nearest first.
///
/// Equal distances keep their dataset order.
pub fn nearest(user: &Coordinate, shops: &[ShopRecord], limit: usize) -> Vec<RankedShop> {
    shops
        .iter()
        .map(|shop| RankedShop {
            name: shop.name.clone(),
            coordinate: shop.coordinate,
            distance: user.distance_km(&shop.coordinate),
        })
        .sorted_by(|a, b| a.distance.total_cmp(&b.distance))
        .take(limit)
        .collect()
}
