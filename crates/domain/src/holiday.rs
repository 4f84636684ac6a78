use serde::{Deserialize, Serialize};

/// A public holiday as reported by the holiday lookup API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicHoliday {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub local_name: String,
    pub name: String,
    pub country_code: String,
    pub fixed: bool,
    pub global: bool,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolidayType {
    Unspecified,
    Public,
    Bank,
    School,
    Authorities,
    Optional,
    Observance,
}

impl PublicHoliday {
    /// Maps the upstream type strings onto the wire enum, preferring
    /// `Public` when present.
    pub fn holiday_type(&self) -> HolidayType {
        if self.types.iter().any(|t| t == "Public") {
            return HolidayType::Public;
        }

        for t in &self.types {
            match t.as_str() {
                "Bank" => return HolidayType::Bank,
                "School" => return HolidayType::School,
                "Authorities" => return HolidayType::Authorities,
                "Optional" => return HolidayType::Optional,
                "Observance" => return HolidayType::Observance,
                _ => continue,
            }
        }

        HolidayType::Unspecified
    }
}
