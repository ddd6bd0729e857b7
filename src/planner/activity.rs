use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::services::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        ActivityId(id.to_string())
    }
}

/// Something the traveller plans to do on a given day. Not tied to a
/// destination beyond the day number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Form input for a new activity.
#[derive(Debug, Clone, Default)]
pub struct NewActivity {
    pub day: u32,
    pub name: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub category: String,
    pub notes: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Activity {
    pub(super) fn from_form(id: ActivityId, form: NewActivity) -> Self {
        Activity {
            id,
            name: form.name.trim().to_string(),
            time: non_blank(form.time),
            location: non_blank(form.location),
            category: form.category,
            notes: non_blank(form.notes),
            day: form.day,
            coordinates: None,
        }
    }

    pub fn display_time(&self) -> &str {
        self.time.as_deref().unwrap_or("Any time")
    }

    pub fn display_location(&self) -> &str {
        self.location.as_deref().unwrap_or("No location specified")
    }
}
