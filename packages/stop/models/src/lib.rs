#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Stop-record taxonomy types for the traffic log.
//!
//! This crate defines the enumerated choice sets used by the submission
//! form and stored as text in the stop tables. The string form of each
//! variant (via `Display`/`EnumString`) is exactly what lands in the
//! database, so renaming a variant label is a data migration.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The reason a stop was initiated.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum IncidentType {
    /// Traffic accident response
    Accident,
    /// Stop based on probable cause
    #[serde(rename = "Probable Cause")]
    #[strum(serialize = "Probable Cause")]
    ProbableCause,
    /// Investigative stop
    Investigation,
    /// Observed traffic violation
    Violation,
    /// Anything else
    Other,
}

impl IncidentType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Accident,
            Self::ProbableCause,
            Self::Investigation,
            Self::Violation,
            Self::Other,
        ]
    }
}

/// The kind of vehicle involved in a stop.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum VehicleType {
    /// Passenger car
    Car,
    /// Motorcycle or bicycle
    Bike,
    /// Truck or lorry
    Truck,
    /// Anything else
    Other,
}

impl VehicleType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Car, Self::Bike, Self::Truck, Self::Other]
    }
}

/// Self-reported gender of the stopped driver.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DriverGender {
    /// Male
    Male,
    /// Female
    Female,
    /// Other or undisclosed
    Other,
}

impl DriverGender {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Male, Self::Female, Self::Other]
    }
}

/// Coarse duration bucket for a stop, as recorded by the officer.
///
/// The buckets match the historical dataset's labels. Each bucket has a
/// representative midpoint in minutes used by duration-averaging insights.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum StopDuration {
    /// Quick stop, resolved within 15 minutes
    #[serde(rename = "0-15 Min")]
    #[strum(serialize = "0-15 Min")]
    Short,
    /// Typical stop
    #[serde(rename = "16-30 Min")]
    #[strum(serialize = "16-30 Min")]
    Medium,
    /// Extended stop (searches, arrests)
    #[serde(rename = "30+ Min")]
    #[strum(serialize = "30+ Min")]
    Long,
}

impl StopDuration {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Short, Self::Medium, Self::Long]
    }

    /// Representative midpoint of this bucket, in minutes.
    #[must_use]
    pub const fn midpoint_minutes(self) -> f64 {
        match self {
            Self::Short => 8.0,
            Self::Medium => 23.0,
            Self::Long => 45.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_type_label_roundtrip() {
        for incident in IncidentType::all() {
            let label = incident.to_string();
            assert_eq!(label.parse::<IncidentType>().unwrap(), *incident);
        }
        assert_eq!(IncidentType::ProbableCause.to_string(), "Probable Cause");
    }

    #[test]
    fn duration_labels_match_dataset() {
        let labels: Vec<String> = StopDuration::all()
            .iter()
            .map(StopDuration::to_string)
            .collect();
        assert_eq!(labels, vec!["0-15 Min", "16-30 Min", "30+ Min"]);
    }

    #[test]
    fn duration_midpoints_are_ordered() {
        let mut last = 0.0;
        for duration in StopDuration::all() {
            assert!(duration.midpoint_minutes() > last);
            last = duration.midpoint_minutes();
        }
    }
}
