use tracing::info;

use crate::error::Result;
use crate::model::TAXONOMY_RENAMES;
use crate::output::{Notice, Reporter};
use crate::store::{BulkUpdate, JobStore};

/// Rename the JobRoller taxonomies in place. Term associations are untouched.
pub fn rename_taxonomies(store: &dyn JobStore, reporter: &mut Reporter<'_>) -> Result<()> {
    reporter.notice(&Notice::TaxonomiesStarted)?;
    for (from, to) in TAXONOMY_RENAMES {
        let rows = store.bulk_update(&BulkUpdate::rename_taxonomy(from, to))?;
        info!(taxonomy = from, renamed_to = to, rows, "taxonomy renamed");
    }
    reporter.notice(&Notice::TaxonomiesFinished)?;
    Ok(())
}
