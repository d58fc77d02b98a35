use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::importer::{JOBROLLER_IMPORTER_ID, Registry, RunReport};
use crate::output::{Format, Reporter};
use crate::store::sqlite::SqliteStore;

/// Run the JobRoller importer against the configured site database.
pub fn run(registry: &Registry, config: &Config, format: Format) -> Result<RunReport> {
    let store = SqliteStore::open(config.database_path()?, &config.table_prefix)?
        .with_uploads_url(config.uploads_url.clone());
    let importer = registry.get(JOBROLLER_IMPORTER_ID)?;

    let mut reporter = Reporter::stdout(format);
    let report = importer.dispatch(&store, &mut reporter)?;

    info!(
        run_id = %report.run_id,
        converted = report.converted,
        skipped = report.skipped,
        "import complete"
    );
    Ok(report)
}
