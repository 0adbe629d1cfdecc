// src/domain/property_type.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of home categories the model was trained on. Anything the
/// source invents later lands in `Other` instead of growing the one-hot space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Flat,
    Penthouse,
    Duplex,
    Studio,
    Chalet,
    CountryHouse,
    Other,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        PropertyType::Flat,
        PropertyType::Penthouse,
        PropertyType::Duplex,
        PropertyType::Studio,
        PropertyType::Chalet,
        PropertyType::CountryHouse,
        PropertyType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Flat => "flat",
            PropertyType::Penthouse => "penthouse",
            PropertyType::Duplex => "duplex",
            PropertyType::Studio => "studio",
            PropertyType::Chalet => "chalet",
            PropertyType::CountryHouse => "countryHouse",
            PropertyType::Other => "other",
        }
    }

    /// Case- and whitespace-insensitive; never fails.
    pub fn normalize(raw: &str) -> Self {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match cleaned.as_str() {
            "flat" | "apartment" => PropertyType::Flat,
            "penthouse" => PropertyType::Penthouse,
            "duplex" => PropertyType::Duplex,
            "studio" => PropertyType::Studio,
            "chalet" => PropertyType::Chalet,
            "countryhouse" => PropertyType::CountryHouse,
            _ => PropertyType::Other,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
