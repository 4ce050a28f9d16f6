//! Building domain model.
//!
//! A building has a unique street address and a fixed-precision
//! coordinate (7 fractional digits). Organizations reference exactly
//! one building; a building cannot be deleted while referenced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DirectoryError, DirectoryResult};
use crate::geo;

/// Maximum length of a street address, in characters.
pub const MAX_ADDRESS_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: Uuid,
    /// Unique street address.
    pub address: String,
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBuilding {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Fields that can be updated on an existing building.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateBuilding {
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CreateBuilding {
    /// Check field bounds and round the coordinate to storage precision.
    pub fn normalized(self) -> DirectoryResult<Self> {
        check_address(&self.address)?;
        Ok(Self {
            address: self.address,
            latitude: check_latitude(self.latitude)?,
            longitude: check_longitude(self.longitude)?,
        })
    }
}

impl UpdateBuilding {
    /// Same checks as [`CreateBuilding::normalized`], applied to present fields only.
    pub fn normalized(self) -> DirectoryResult<Self> {
        if let Some(address) = &self.address {
            check_address(address)?;
        }
        Ok(Self {
            address: self.address,
            latitude: self.latitude.map(check_latitude).transpose()?,
            longitude: self.longitude.map(check_longitude).transpose()?,
        })
    }
}

fn check_address(address: &str) -> DirectoryResult<()> {
    let len = address.trim().chars().count();
    if len == 0 || len > MAX_ADDRESS_LEN {
        return Err(DirectoryError::validation(format!(
            "address must contain 1 to {MAX_ADDRESS_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a latitude and round it to storage precision.
pub fn check_latitude(latitude: f64) -> DirectoryResult<f64> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(DirectoryError::validation(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    Ok(geo::round_coordinate(latitude))
}

/// Validate a longitude and round it to storage precision.
pub fn check_longitude(longitude: f64) -> DirectoryResult<f64> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(DirectoryError::validation(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(geo::round_coordinate(longitude))
}
