use chrono::FixedOffset;
use serde::Serialize;
use tracing::info_span;
use uuid::Uuid;

use crate::convert::{Converter, resolve_offset};
use crate::error::{ImportError, Result};
use crate::geocode::Geocoder;
use crate::output::{Notice, Reporter};
use crate::store::{CacheSuspension, ContentStore};
use crate::taxonomy::rename_taxonomies;

pub const JOBROLLER_IMPORTER_ID: &str = "wp-job-manager-jobroller-import";
pub const JOBROLLER_IMPORTER_NAME: &str = "JobRoller to WP Job Manager Importer";
pub const JOBROLLER_IMPORTER_DESCRIPTION: &str =
    "Convert Jobroller meta data to WP Job Manager format. BACKUP your data first!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub importer: String,
    pub converted: usize,
    pub skipped: usize,
}

pub trait Importer {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn dispatch(&self, store: &dyn ContentStore, reporter: &mut Reporter<'_>) -> Result<RunReport>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImporterInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Importers known to this process. Populated by the composition root.
#[derive(Default)]
pub struct Registry {
    importers: Vec<Box<dyn Importer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an importer, replacing any earlier one with the same id.
    pub fn register(&mut self, importer: Box<dyn Importer>) {
        self.importers.retain(|existing| existing.id() != importer.id());
        self.importers.push(importer);
    }

    pub fn get(&self, id: &str) -> Result<&dyn Importer> {
        self.importers
            .iter()
            .find(|i| i.id() == id)
            .map(|i| &**i)
            .ok_or_else(|| ImportError::UnknownImporter(id.to_string()))
    }

    pub fn list(&self) -> Vec<ImporterInfo> {
        self.importers
            .iter()
            .map(|i| ImporterInfo {
                id: i.id().to_string(),
                name: i.name().to_string(),
                description: i.description().to_string(),
            })
            .collect()
    }
}

/// Converts JobRoller jobs and taxonomies, with cache invalidation suspended
/// for the whole run.
pub struct JobrollerImporter {
    geocoder: Box<dyn Geocoder>,
    timezone: Option<FixedOffset>,
}

impl JobrollerImporter {
    pub fn new(geocoder: Box<dyn Geocoder>, timezone: Option<FixedOffset>) -> Self {
        Self { geocoder, timezone }
    }
}

impl Importer for JobrollerImporter {
    fn id(&self) -> &str {
        JOBROLLER_IMPORTER_ID
    }

    fn name(&self) -> &str {
        JOBROLLER_IMPORTER_NAME
    }

    fn description(&self) -> &str {
        JOBROLLER_IMPORTER_DESCRIPTION
    }

    fn dispatch(&self, store: &dyn ContentStore, reporter: &mut Reporter<'_>) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let _span = info_span!("import", %run_id, importer = JOBROLLER_IMPORTER_ID).entered();

        reporter.notice(&Notice::Header {
            importer: self.name().to_string(),
        })?;
        let offset = resolve_offset(self.timezone, store.as_job_store())?;

        let summary = {
            let _suspension = CacheSuspension::new(store.as_cache());
            let summary = Converter::new(store.as_job_store(), self.geocoder.as_ref(), offset)
                .convert_all_jobs(reporter)?;
            rename_taxonomies(store.as_job_store(), reporter)?;
            summary
        };

        Ok(RunReport {
            run_id,
            importer: JOBROLLER_IMPORTER_ID.to_string(),
            converted: summary.converted,
            skipped: summary.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::DisabledGeocoder;

    struct Named(&'static str, &'static str);

    impl Importer for Named {
        fn id(&self) -> &str {
            self.0
        }
        fn name(&self) -> &str {
            self.1
        }
        fn description(&self) -> &str {
            ""
        }
        fn dispatch(&self, _: &dyn ContentStore, _: &mut Reporter<'_>) -> Result<RunReport> {
            unimplemented!()
        }
    }

    #[test]
    fn registry_looks_up_by_id() {
        let mut registry = Registry::new();
        registry.register(Box::new(JobrollerImporter::new(Box::new(DisabledGeocoder), None)));

        let importer = registry.get(JOBROLLER_IMPORTER_ID).unwrap();
        assert_eq!(importer.name(), JOBROLLER_IMPORTER_NAME);

        let err = registry.get("wordpress").err().unwrap();
        assert!(matches!(err, ImportError::UnknownImporter(id) if id == "wordpress"));
    }

    #[test]
    fn registering_same_id_replaces_previous() {
        let mut registry = Registry::new();
        registry.register(Box::new(Named("csv", "first")));
        registry.register(Box::new(Named("rss", "feed")));
        registry.register(Box::new(Named("csv", "second")));

        let names: Vec<String> = registry.list().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["feed", "second"]);
    }
}
