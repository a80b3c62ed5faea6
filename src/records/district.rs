use super::{impl_locality, text_binding};
use crate::schema::{FieldBinding, Record};
use serde::{Deserialize, Serialize};

/// District-level record
///
/// Also embedded, as JSON, in the `district_info` field of city records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistrictInfo {
    /// Country name
    pub country_name: String,
    /// Province or state
    pub region_name: String,
    /// City name
    pub city_name: String,
    /// District or county
    pub district_name: String,
    /// Chinese administrative division code
    pub china_admin_code: String,
    /// Radius covered by the network, in kilometres
    pub covering_radius: String,
    /// Latitude of the district centre
    pub latitude: String,
    /// Longitude of the district centre
    pub longitude: String,
}

impl Record for DistrictInfo {
    fn bindings() -> &'static [FieldBinding<Self>] {
        const BINDINGS: &[FieldBinding<DistrictInfo>] = &[
            text_binding!(DistrictInfo, country_name),
            text_binding!(DistrictInfo, region_name),
            text_binding!(DistrictInfo, city_name),
            text_binding!(DistrictInfo, district_name),
            text_binding!(DistrictInfo, china_admin_code),
            text_binding!(DistrictInfo, covering_radius),
            text_binding!(DistrictInfo, latitude),
            text_binding!(DistrictInfo, longitude),
        ];
        BINDINGS
    }
}

impl_locality!(DistrictInfo);
