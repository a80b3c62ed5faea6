use super::{impl_locality, text_binding};
use crate::schema::{FieldBinding, Record};
use serde::{Deserialize, Serialize};

/// Mobile base-station record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStationInfo {
    /// Country name
    pub country_name: String,
    /// Province or state
    pub region_name: String,
    /// City name
    pub city_name: String,
    /// Domain of the address owner
    pub owner_domain: String,
    /// Carrier or ISP
    pub isp_domain: String,
    /// Base-station type
    pub base_station: String,
}

impl Record for BaseStationInfo {
    fn bindings() -> &'static [FieldBinding<Self>] {
        const BINDINGS: &[FieldBinding<BaseStationInfo>] = &[
            text_binding!(BaseStationInfo, country_name),
            text_binding!(BaseStationInfo, region_name),
            text_binding!(BaseStationInfo, city_name),
            text_binding!(BaseStationInfo, owner_domain),
            text_binding!(BaseStationInfo, isp_domain),
            text_binding!(BaseStationInfo, base_station),
        ];
        BINDINGS
    }
}

impl_locality!(BaseStationInfo);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Locality;
    use crate::schema::{ColumnMap, Row};

    #[test]
    fn test_locality_accessors() {
        let fields: Vec<String> = ["city_name", "base_station", "country_name"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values: Vec<String> = ["深圳", "4G", "中国"].iter().map(|s| s.to_string()).collect();
        let columns = ColumnMap::<BaseStationInfo>::new(&fields);
        let info = BaseStationInfo::from_row(&Row::new(&fields, &values, &columns));

        let place: &dyn Locality = &info;
        assert_eq!(place.country_name(), "中国");
        assert_eq!(place.city_name(), "深圳");
        assert_eq!(place.region_name(), "");
        assert_eq!(info.base_station, "4G");
    }
}
