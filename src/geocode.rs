use tracing::debug;

use crate::error::Result;

/// Resolves a free-text location and persists structured coordinates for a
/// record. Callers treat it as fire-and-forget.
pub trait Geocoder {
    fn generate_location_data(&self, job_id: u64, location: &str) -> Result<()>;
}

/// Geocoder used when no geocoding backend is configured. Records are left
/// for the job board to geocode on next save.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGeocoder;

impl Geocoder for DisabledGeocoder {
    fn generate_location_data(&self, job_id: u64, location: &str) -> Result<()> {
        debug!(job_id, location, "geocoding disabled, skipping");
        Ok(())
    }
}
