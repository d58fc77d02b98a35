use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::config::parse_utc_offset;
use crate::contact::extract_application_contact;
use crate::error::Result;
use crate::geocode::Geocoder;
use crate::model::{
    JOB_POST_TYPE, LegacyJobFields, PUBLISHED_STATUS, TargetJobFields, legacy_keys, target_keys,
};
use crate::output::{Notice, Reporter};
use crate::store::JobStore;

/// Site option holding the WordPress UTC offset in decimal hours.
pub const GMT_OFFSET_OPTION: &str = "gmt_offset";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub converted: usize,
    pub skipped: usize,
}

/// Rewrites JobRoller job meta into WP Job Manager meta.
pub struct Converter<'a> {
    store: &'a dyn JobStore,
    geocoder: &'a dyn Geocoder,
    offset: FixedOffset,
}

impl<'a> Converter<'a> {
    pub fn new(store: &'a dyn JobStore, geocoder: &'a dyn Geocoder, offset: FixedOffset) -> Self {
        Self {
            store,
            geocoder,
            offset,
        }
    }

    /// Convert every published job. Safe to re-run: converted records are skipped.
    pub fn convert_all_jobs(&self, reporter: &mut Reporter<'_>) -> Result<ConversionSummary> {
        let _span = info_span!("convert_jobs").entered();
        let mut summary = ConversionSummary::default();

        for id in self.store.list_job_ids(JOB_POST_TYPE, PUBLISHED_STATUS)? {
            let legacy = self.load_legacy(id)?;
            if !self.needs_conversion(id, &legacy)? {
                debug!(job_id = id, "already converted or nothing to convert");
                summary.skipped += 1;
                continue;
            }

            self.convert_job(id, &legacy)?;
            reporter.notice(&Notice::JobConverted {
                id,
                title: self.store.title(id)?,
            })?;
            summary.converted += 1;
        }

        info!(
            converted = summary.converted,
            skipped = summary.skipped,
            "job conversion finished"
        );
        reporter.notice(&Notice::Summary {
            converted: summary.converted,
            skipped: summary.skipped,
        })?;
        Ok(summary)
    }

    /// A record needs converting when it has a JobRoller company name and no
    /// WP Job Manager location yet.
    pub fn needs_conversion(&self, id: u64, legacy: &LegacyJobFields) -> Result<bool> {
        if legacy.company.is_empty() {
            return Ok(false);
        }
        Ok(self.store.meta_or_empty(id, target_keys::JOB_LOCATION)?.is_empty())
    }

    pub fn load_legacy(&self, id: u64) -> Result<LegacyJobFields> {
        Ok(LegacyJobFields {
            company: self.store.meta_or_empty(id, legacy_keys::COMPANY)?,
            company_url: self.store.meta_or_empty(id, legacy_keys::COMPANY_URL)?,
            expires: self.store.meta_or_empty(id, legacy_keys::EXPIRES)?,
            how_to_apply: self.store.meta_or_empty(id, legacy_keys::HOW_TO_APPLY)?,
            geo_address: self.store.meta_or_empty(id, legacy_keys::GEO_ADDRESS)?,
        })
    }

    /// Pure field mapping for one record.
    pub fn map_fields(&self, id: u64, legacy: &LegacyJobFields, logo: Option<String>) -> TargetJobFields {
        let job_expires = if legacy.has_expiry() {
            match legacy.expiry_timestamp() {
                Some(ts) => {
                    let date = format_expiry(ts, self.offset);
                    if date.is_none() {
                        warn!(job_id = id, expires = ts, "expiry timestamp out of range, skipping");
                    }
                    date
                }
                None => {
                    warn!(job_id = id, expires = %legacy.expires, "expiry is not a timestamp, skipping");
                    None
                }
            }
        } else {
            None
        };

        TargetJobFields {
            company_name: legacy.company.clone(),
            company_website: legacy.company_url.clone(),
            company_logo: logo.unwrap_or_default(),
            featured: false,
            filled: false,
            company_tagline: String::new(),
            company_twitter: String::new(),
            job_location: legacy.geo_address.clone(),
            application: extract_application_contact(&legacy.how_to_apply),
            job_expires,
        }
    }

    fn convert_job(&self, id: u64, legacy: &LegacyJobFields) -> Result<()> {
        let logo = self.store.primary_image_url(id)?;
        let target = self.map_fields(id, legacy, logo);

        for write in target.writes() {
            self.store.apply_write(id, &write)?;
        }

        if !target.job_location.is_empty()
            && let Err(err) = self
                .geocoder
                .generate_location_data(id, &target.job_location)
        {
            warn!(job_id = id, error = %err, "geocoding failed, continuing");
        }

        debug!(job_id = id, application = %target.application, "job converted");
        Ok(())
    }
}

/// `YYYY-MM-DD` for an epoch-seconds value seen from `offset`.
pub fn format_expiry(timestamp: i64, offset: FixedOffset) -> Option<String> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|utc| utc.with_timezone(&offset).format("%Y-%m-%d").to_string())
}

/// Offset used for expiry dates: the configured one, else the site's
/// `gmt_offset` option, else UTC.
pub fn resolve_offset(configured: Option<FixedOffset>, store: &dyn JobStore) -> Result<FixedOffset> {
    if let Some(offset) = configured {
        return Ok(offset);
    }
    let utc = Utc.fix();
    match store.option(GMT_OFFSET_OPTION)? {
        Some(raw) if !raw.trim().is_empty() => Ok(parse_utc_offset(&raw).unwrap_or_else(|err| {
            warn!(gmt_offset = %raw, error = %err, "ignoring unparseable site offset, using UTC");
            utc
        })),
        _ => Ok(utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    #[test]
    fn expiry_is_formatted_in_the_given_offset() {
        // 2024-03-05T00:00:00Z
        let ts = 1_709_596_800;
        assert_eq!(format_expiry(ts, utc()).as_deref(), Some("2024-03-05"));
        assert_eq!(
            format_expiry(ts, FixedOffset::west_opt(3600).unwrap()).as_deref(),
            Some("2024-03-04")
        );
        assert_eq!(format_expiry(i64::MAX, utc()), None);
    }
}
