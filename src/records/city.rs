use super::{impl_locality, nested_json, text_binding, DistrictInfo};
use crate::schema::{FieldBinding, Record};
use serde::{Deserialize, Serialize};

/// City-level record
///
/// `district_info` and `asn_info` are stored as JSON text inside the record
/// and decoded here; a value that does not parse leaves the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityInfo {
    /// Country name
    pub country_name: String,
    /// Province or state
    pub region_name: String,
    /// City name
    pub city_name: String,
    /// District or county
    pub district_name: String,
    /// Domain of the address owner
    pub owner_domain: String,
    /// Carrier or ISP
    pub isp_domain: String,
    /// Latitude of the city centre
    pub latitude: String,
    /// Longitude of the city centre
    pub longitude: String,
    /// IANA time zone
    pub timezone: String,
    /// Offset from UTC
    pub utc_offset: String,
    /// Chinese administrative region code
    pub china_region_code: String,
    /// Chinese administrative city code
    pub china_city_code: String,
    /// Chinese administrative district code
    pub china_district_code: String,
    /// Chinese administrative division code
    pub china_admin_code: String,
    /// International dialling code
    pub idd_code: String,
    /// ISO 3166-1 alpha-2 code
    pub country_code: String,
    /// Continent code
    pub continent_code: String,
    /// `IDC` when the network is a data centre
    pub idc: String,
    /// Base-station type when the network is mobile
    pub base_station: String,
    /// ISO 3166-1 alpha-3 code
    pub country_code3: String,
    /// `1` for EU member states
    pub european_union: String,
    /// Currency code
    pub currency_code: String,
    /// Currency name
    pub currency_name: String,
    /// `ANYCAST` for anycast networks
    pub anycast: String,
    /// Carrier line
    pub line: String,
    /// District detail, decoded from JSON
    pub district_info: DistrictInfo,
    /// Announced route
    pub route: String,
    /// Origin AS number
    pub asn: String,
    /// AS detail, decoded from JSON
    pub asn_info: Vec<AsnInfo>,
    /// Area code
    pub area_code: String,
    /// Usage type
    pub usage_type: String,
}

/// One autonomous system announcing the network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsnInfo {
    /// AS number
    pub asn: i64,
    /// Regional registry
    #[serde(rename = "reg")]
    pub registry: String,
    /// Registration country
    #[serde(rename = "cc")]
    pub country: String,
    /// Network name
    pub net: String,
    /// Organization
    pub org: String,
    /// Network type
    #[serde(rename = "type")]
    pub kind: String,
    /// Organization domain
    pub domain: String,
}

const BINDINGS: &[FieldBinding<CityInfo>] = &[
    text_binding!(CityInfo, country_name),
    text_binding!(CityInfo, region_name),
    text_binding!(CityInfo, city_name),
    text_binding!(CityInfo, district_name),
    text_binding!(CityInfo, owner_domain),
    text_binding!(CityInfo, isp_domain),
    text_binding!(CityInfo, latitude),
    text_binding!(CityInfo, longitude),
    text_binding!(CityInfo, timezone),
    text_binding!(CityInfo, utc_offset),
    text_binding!(CityInfo, china_region_code),
    text_binding!(CityInfo, china_city_code),
    text_binding!(CityInfo, china_district_code),
    text_binding!(CityInfo, china_admin_code),
    text_binding!(CityInfo, idd_code),
    text_binding!(CityInfo, country_code),
    text_binding!(CityInfo, continent_code),
    text_binding!(CityInfo, idc),
    text_binding!(CityInfo, base_station),
    text_binding!(CityInfo, country_code3),
    text_binding!(CityInfo, european_union),
    text_binding!(CityInfo, currency_code),
    text_binding!(CityInfo, currency_name),
    text_binding!(CityInfo, anycast),
    text_binding!(CityInfo, line),
    FieldBinding::new("district_info", |r, v| {
        r.district_info = nested_json("district_info", v)
    }),
    text_binding!(CityInfo, route),
    text_binding!(CityInfo, asn),
    FieldBinding::new("asn_info", |r, v| r.asn_info = nested_json("asn_info", v)),
    text_binding!(CityInfo, area_code),
    text_binding!(CityInfo, usage_type),
];

impl Record for CityInfo {
    fn bindings() -> &'static [FieldBinding<Self>] {
        BINDINGS
    }
}

impl_locality!(CityInfo);
