use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::services::Coordinates;

/// Stable identifier of a destination. The backend hands these out as
/// numbers, the planner as `destination-<n>` strings; both end up here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct DestinationId(String);

impl DestinationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DestinationId {
    fn from(id: &str) -> Self {
        DestinationId(id.to_string())
    }
}

impl From<DestinationId> for String {
    fn from(id: DestinationId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for DestinationId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => DestinationId(n.to_string()),
            RawId::Text(s) => DestinationId(s),
        }
    }
}

/// A budget as the backend and the planner forms supply it: either a plain
/// amount or free text such as `"₱1,500 low"` or `"mid-range"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Budget {
    Amount(f64),
    Label(String),
}

impl Budget {
    /// Zero amounts and blank labels carry no information.
    pub fn is_blank(&self) -> bool {
        match self {
            Budget::Amount(amount) => *amount == 0.0,
            Budget::Label(label) => label.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DestinationId>,
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Destination {
    pub fn new(name: impl Into<String>, city: impl Into<String>, category: impl Into<String>) -> Self {
        Destination {
            id: None,
            name: name.into(),
            city: city.into(),
            province: None,
            category: category.into(),
            budget: None,
            rating: None,
            latitude: None,
            longitude: None,
            description: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<DestinationId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.latitude = Some(lat);
        self.longitude = Some(lng);
        self
    }

    /// Position, when known. The backend sends `0` for places it has no
    /// coordinates for, so a zero on either axis counts as missing.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0 => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.latitude = Some(coords.lat);
        self.longitude = Some(coords.lng);
    }

    /// Duplicate contract shared by every place that adds destinations:
    /// ids decide when both sides have one, otherwise name and city do.
    pub fn same_as(&self, other: &Destination) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                eq_ignore_case(&self.name, &other.name) && eq_ignore_case(&self.city, &other.city)
            }
        }
    }

    /// Search text used when the destination needs geocoding.
    pub fn geocode_query(&self, fallback_city: &str) -> String {
        let city = if self.city.trim().is_empty() {
            fallback_city
        } else {
            &self.city
        };
        if city.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, city)
        }
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
