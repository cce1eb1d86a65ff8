//! Derived grouping parts for provinces and counties.
//!
//! Statistics are grouped at a slightly different grain than the raw area
//! catalog: the five Lappmark provinces form one group, and Kalmar county is
//! split into Öland and the mainland.

/// County feature ids (SCB county codes)
pub mod county_ids {
    pub const STOCKHOLM: &str = "1";
    pub const KALMAR: &str = "8";
    pub const GOTLAND: &str = "9";
    pub const NORRBOTTEN: &str = "25";
}

/// Province (landskap) feature ids
pub mod province_ids {
    pub const SMALAND: &str = "4";
    pub const OLAND: &str = "5";
    pub const ASELE_LAPPMARK: &str = "25";
    pub const LYCKSELE_LAPPMARK: &str = "26";
    pub const PITE_LAPPMARK: &str = "27";
    pub const LULE_LAPPMARK: &str = "28";
    pub const TORNE_LAPPMARK: &str = "29";
}

/// Ids of the derived groups
pub mod special_ids {
    /// Province part covering all five Lappmark provinces
    pub const LAPPLAND: &str = "100";
    /// County part for Kalmar county outside Öland
    pub const KALMAR_MAINLAND: &str = "100";
    /// County part for the Öland portion of Kalmar county
    pub const OLAND: &str = "101";
}

const LAPPMARK_PROVINCES: [&str; 5] = [
    province_ids::LULE_LAPPMARK,
    province_ids::LYCKSELE_LAPPMARK,
    province_ids::PITE_LAPPMARK,
    province_ids::TORNE_LAPPMARK,
    province_ids::ASELE_LAPPMARK,
];

/// Province part for a resolved province.
///
/// Lappmark provinces map to [`special_ids::LAPPLAND`]; anything else,
/// including an absent province, is returned unchanged.
pub fn province_part(province_feature_id: Option<&str>) -> Option<&str> {
    match province_feature_id {
        Some(id) if LAPPMARK_PROVINCES.contains(&id) => Some(special_ids::LAPPLAND),
        other => other,
    }
}

/// County part for a resolved county and province.
///
/// Kalmar county is split on the province: Öland yields [`special_ids::OLAND`],
/// any other or absent province yields [`special_ids::KALMAR_MAINLAND`]. Other
/// counties are returned unchanged.
pub fn county_part<'a>(
    county_feature_id: Option<&'a str>,
    province_feature_id: Option<&str>,
) -> Option<&'a str> {
    match county_feature_id {
        Some(county_ids::KALMAR) => {
            if province_feature_id == Some(province_ids::OLAND) {
                Some(special_ids::OLAND)
            } else {
                Some(special_ids::KALMAR_MAINLAND)
            }
        }
        other => other,
    }
}
