//! Typed Records
//!
//! Record types for the standard ipdb products. Each one is a plain struct
//! with a static binding table; [`Database<R>`](crate::Database) does the rest.
//!
//! | Product      | Record              | Alias                 |
//! |--------------|---------------------|-----------------------|
//! | City         | [`CityInfo`]        | [`CityDatabase`]      |
//! | District     | [`DistrictInfo`]    | [`DistrictDatabase`]  |
//! | IDC          | [`IdcInfo`]         | [`IdcDatabase`]       |
//! | Base station | [`BaseStationInfo`] | [`BaseStationDatabase`] |
//! | Risk         | [`RiskInfo`]        | [`RiskDatabase`]      |

mod base_station;
mod city;
mod district;
mod idc;
mod risk;

pub use base_station::BaseStationInfo;
pub use city::{AsnInfo, CityInfo};
pub use district::DistrictInfo;
pub use idc::IdcInfo;
pub use risk::{RiskInfo, RISK_LANGUAGE};

use crate::database::Database;
use serde::de::DeserializeOwned;
use tracing::trace;

/// City database handle
pub type CityDatabase = Database<CityInfo>;
/// District database handle
pub type DistrictDatabase = Database<DistrictInfo>;
/// IDC database handle
pub type IdcDatabase = Database<IdcInfo>;
/// Base-station database handle
pub type BaseStationDatabase = Database<BaseStationInfo>;
/// Risk database handle
pub type RiskDatabase = Database<RiskInfo>;

/// Records that name a place
pub trait Locality {
    /// Country name
    fn country_name(&self) -> &str;
    /// Region (province or state) name
    fn region_name(&self) -> &str;
    /// City name
    fn city_name(&self) -> &str;
}

/// Binding that copies the value into a `String` field named like the key
macro_rules! text_binding {
    ($record:ty, $field:ident) => {
        $crate::schema::FieldBinding::new(stringify!($field), |r: &mut $record, v: &str| {
            r.$field = v.to_owned()
        })
    };
}
pub(crate) use text_binding;

/// Implement [`Locality`] from `country_name`/`region_name`/`city_name` fields
macro_rules! impl_locality {
    ($record:ty) => {
        impl $crate::records::Locality for $record {
            fn country_name(&self) -> &str {
                &self.country_name
            }
            fn region_name(&self) -> &str {
                &self.region_name
            }
            fn city_name(&self) -> &str {
                &self.city_name
            }
        }
    };
}
pub(crate) use impl_locality;

/// Decode a JSON-valued field, falling back to the default on bad input
pub(crate) fn nested_json<T: DeserializeOwned + Default>(field: &str, value: &str) -> T {
    if value.is_empty() {
        return T::default();
    }
    serde_json::from_str(value).unwrap_or_else(|e| {
        trace!(field, error = %e, "unparsable nested value, using default");
        T::default()
    })
}
