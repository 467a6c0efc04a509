//! Sensor reading - the typed payload unit
//!
//! A `Reading` is what data-intake adapters hand to the gateway: one sample
//! from one device. Intake lines arriving as JSON parse directly into this
//! shape; the `created_at` field defaults to "now" when the producer did
//! not stamp one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Result};

/// One sensor sample from one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Originating device identifier (guid-style string)
    pub device_id: String,

    /// Human-readable device display name
    pub display_name: String,

    /// Owning organization (free-form, used by dashboards)
    #[serde(default)]
    pub organization: String,

    /// Physical location of the device
    #[serde(default)]
    pub location: String,

    /// What is being measured (e.g. "temperature")
    pub measure_name: String,

    /// Unit for `value` (e.g. "C")
    #[serde(default)]
    pub unit_of_measure: String,

    /// The measured value
    pub value: f64,

    /// When the sample was taken; stamped on parse if absent
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Reading {
    /// Create a reading with the required fields; the rest default to empty
    pub fn new(
        device_id: impl Into<String>,
        measure_name: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            display_name: String::new(),
            organization: String::new(),
            location: String::new(),
            measure_name: measure_name.into(),
            unit_of_measure: String::new(),
            value,
            created_at: Utc::now(),
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Set the organization
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = org.into();
        self
    }

    /// Set the location
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the unit of measure
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measure = unit.into();
        self
    }

    /// Set the creation timestamp
    #[must_use]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Parse a reading from a raw JSON intake line
    ///
    /// Missing optional fields default; `created_at` is stamped with the
    /// current time when the line does not carry one.
    pub fn from_json(raw: &str) -> Result<Self> {
        let reading: Self = serde_json::from_str(raw)?;
        if reading.device_id.is_empty() {
            return Err(ProtocolError::InvalidReading("empty device_id".into()));
        }
        Ok(reading)
    }
}
