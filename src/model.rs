pub const JOB_POST_TYPE: &str = "job_listing";
pub const PUBLISHED_STATUS: &str = "publish";

/// Meta keys written by JobRoller.
pub mod legacy_keys {
    pub const COMPANY: &str = "_Company";
    pub const COMPANY_URL: &str = "_CompanyURL";
    pub const EXPIRES: &str = "_expires";
    pub const HOW_TO_APPLY: &str = "_how_to_apply";
    pub const GEO_ADDRESS: &str = "geo_address";
}

/// Meta keys read by WP Job Manager.
pub mod target_keys {
    pub const COMPANY_NAME: &str = "_company_name";
    pub const COMPANY_WEBSITE: &str = "_company_website";
    pub const COMPANY_LOGO: &str = "_company_logo";
    pub const FEATURED: &str = "_featured";
    pub const FILLED: &str = "_filled";
    pub const COMPANY_TAGLINE: &str = "_company_tagline";
    pub const COMPANY_TWITTER: &str = "_company_twitter";
    pub const JOB_LOCATION: &str = "_job_location";
    pub const APPLICATION: &str = "_application";
    pub const JOB_EXPIRES: &str = "_job_expires";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Leave an existing value alone.
    SetIfAbsent,
    /// Replace whatever is there.
    Overwrite,
}

/// The JobRoller attributes the converter consumes. Absent meta reads as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyJobFields {
    pub company: String,
    pub company_url: String,
    /// Raw epoch-seconds value as stored; parsed lazily.
    pub expires: String,
    pub how_to_apply: String,
    pub geo_address: String,
}

impl LegacyJobFields {
    /// Truthiness of the raw expiry value: only `""` and `"0"` disable the write.
    pub fn has_expiry(&self) -> bool {
        !self.expires.is_empty() && self.expires != "0"
    }

    /// Expiry as epoch seconds, `None` when absent or not numeric.
    pub fn expiry_timestamp(&self) -> Option<i64> {
        let raw = self.expires.trim();
        if let Ok(secs) = raw.parse::<i64>() {
            return Some(secs);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    }
}

/// The WP Job Manager attributes produced for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetJobFields {
    pub company_name: String,
    pub company_website: String,
    pub company_logo: String,
    pub featured: bool,
    pub filled: bool,
    pub company_tagline: String,
    pub company_twitter: String,
    pub job_location: String,
    pub application: String,
    pub job_expires: Option<String>,
}

/// One attribute write, resolved from the mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaWrite {
    pub key: &'static str,
    pub value: String,
    pub mode: WriteMode,
}

struct FieldMapping {
    key: &'static str,
    mode: WriteMode,
    value: fn(&TargetJobFields) -> Option<String>,
}

fn flag(v: bool) -> String {
    let flag = if v { "1" } else { "0" };
    flag.to_string()
}

/// Write order and semantics for every target attribute. `_job_location` is
/// the converted marker and must stay last, so a record whose writes were cut
/// short is picked up again on the next run.
const FIELD_MAP: &[FieldMapping] = &[
    FieldMapping {
        key: target_keys::COMPANY_NAME,
        mode: WriteMode::SetIfAbsent,
        value: |t| Some(t.company_name.clone()),
    },
    FieldMapping {
        key: target_keys::COMPANY_WEBSITE,
        mode: WriteMode::Overwrite,
        value: |t| Some(t.company_website.clone()),
    },
    FieldMapping {
        key: target_keys::COMPANY_LOGO,
        mode: WriteMode::SetIfAbsent,
        value: |t| Some(t.company_logo.clone()),
    },
    FieldMapping {
        key: target_keys::FEATURED,
        mode: WriteMode::SetIfAbsent,
        value: |t| Some(flag(t.featured)),
    },
    FieldMapping {
        key: target_keys::FILLED,
        mode: WriteMode::SetIfAbsent,
        value: |t| Some(flag(t.filled)),
    },
    FieldMapping {
        key: target_keys::COMPANY_TAGLINE,
        mode: WriteMode::SetIfAbsent,
        value: |t| Some(t.company_tagline.clone()),
    },
    FieldMapping {
        key: target_keys::COMPANY_TWITTER,
        mode: WriteMode::SetIfAbsent,
        value: |t| Some(t.company_twitter.clone()),
    },
    FieldMapping {
        key: target_keys::APPLICATION,
        mode: WriteMode::Overwrite,
        value: |t| Some(t.application.clone()),
    },
    FieldMapping {
        key: target_keys::JOB_EXPIRES,
        mode: WriteMode::SetIfAbsent,
        value: |t| t.job_expires.clone(),
    },
    FieldMapping {
        key: target_keys::JOB_LOCATION,
        mode: WriteMode::Overwrite,
        value: |t| Some(t.job_location.clone()),
    },
];

impl TargetJobFields {
    /// Resolve the mapping table into concrete writes. Mappings whose value is
    /// `None` (no expiry) produce no write at all.
    pub fn writes(&self) -> Vec<MetaWrite> {
        FIELD_MAP
            .iter()
            .filter_map(|m| {
                (m.value)(self).map(|value| MetaWrite {
                    key: m.key,
                    value,
                    mode: m.mode,
                })
            })
            .collect()
    }
}

/// Fixed JobRoller -> WP Job Manager taxonomy renames.
pub const TAXONOMY_RENAMES: [(&str, &str); 3] = [
    ("job_cat", "job_listing_category"),
    ("job_tag", "job_listing_tag"),
    ("job_type", "job_listing_type"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn target(job_expires: Option<&str>) -> TargetJobFields {
        TargetJobFields {
            company_name: "Acme".into(),
            company_website: "https://acme.test".into(),
            company_logo: String::new(),
            featured: false,
            filled: false,
            company_tagline: String::new(),
            company_twitter: String::new(),
            job_location: "Leeds".into(),
            application: "jobs@acme.test".into(),
            job_expires: job_expires.map(str::to_string),
        }
    }

    #[test]
    fn overwrite_applies_to_website_location_and_application_only() {
        let overwritten: Vec<&str> = target(Some("2024-03-05"))
            .writes()
            .into_iter()
            .filter(|w| w.mode == WriteMode::Overwrite)
            .map(|w| w.key)
            .collect();
        assert_eq!(
            overwritten,
            vec![
                target_keys::COMPANY_WEBSITE,
                target_keys::APPLICATION,
                target_keys::JOB_LOCATION
            ]
        );
    }

    #[test]
    fn expiry_write_is_omitted_without_a_date() {
        let keys: Vec<&str> = target(None).writes().into_iter().map(|w| w.key).collect();
        assert_eq!(keys.len(), 9);
        assert!(!keys.contains(&target_keys::JOB_EXPIRES));

        let with = target(Some("2024-03-05")).writes();
        let expiry = with.iter().find(|w| w.key == target_keys::JOB_EXPIRES).unwrap();
        assert_eq!(expiry.key, target_keys::JOB_EXPIRES);
        assert_eq!(expiry.mode, WriteMode::SetIfAbsent);
        assert_eq!(expiry.value, "2024-03-05");
    }

    #[test]
    fn location_marker_is_written_last() {
        for t in [target(None), target(Some("2024-03-05"))] {
            let writes = t.writes();
            assert_eq!(writes.last().unwrap().key, target_keys::JOB_LOCATION);
        }
    }

    #[test]
    fn flags_are_written_as_zero_or_one() {
        let mut t = target(None);
        t.featured = true;
        let writes = t.writes();
        let value = |key: &str| writes.iter().find(|w| w.key == key).unwrap().value.clone();
        assert_eq!(value(target_keys::FEATURED), "1");
        assert_eq!(value(target_keys::FILLED), "0");
    }

    #[test]
    fn expiry_truthiness_follows_raw_value() {
        let with = |raw: &str| LegacyJobFields {
            expires: raw.into(),
            ..LegacyJobFields::default()
        };
        assert!(!with("").has_expiry());
        assert!(!with("0").has_expiry());
        assert!(with("0.0").has_expiry());
        assert!(with("1709596800").has_expiry());
        assert!(with("soon").has_expiry());

        assert_eq!(with("1709596800").expiry_timestamp(), Some(1_709_596_800));
        assert_eq!(with(" 1709596800.9 ").expiry_timestamp(), Some(1_709_596_800));
        assert_eq!(with("soon").expiry_timestamp(), None);
    }
}
