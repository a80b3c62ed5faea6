use super::{impl_locality, text_binding};
use crate::schema::{FieldBinding, Record};
use serde::{Deserialize, Serialize};

/// Data-centre record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdcInfo {
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
    /// `IDC` when the network is a data centre
    pub idc: String,
}

impl Record for IdcInfo {
    fn bindings() -> &'static [FieldBinding<Self>] {
        const BINDINGS: &[FieldBinding<IdcInfo>] = &[
            text_binding!(IdcInfo, country_name),
            text_binding!(IdcInfo, region_name),
            text_binding!(IdcInfo, city_name),
            text_binding!(IdcInfo, owner_domain),
            text_binding!(IdcInfo, isp_domain),
            text_binding!(IdcInfo, idc),
        ];
        BINDINGS
    }
}

impl_locality!(IdcInfo);
