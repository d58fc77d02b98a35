use colored::Colorize;

use crate::error::Result;
use crate::importer::Registry;
use crate::output::Format;

pub fn run(registry: &Registry, format: Format) -> Result<()> {
    let importers = registry.list();
    match format {
        Format::Json => println!("{}", serde_json::to_string(&importers)?),
        Format::Pretty => {
            for info in &importers {
                println!("{} ({})", info.name.bold(), info.id);
                println!("  {}", info.description);
            }
        }
        Format::Minimal => {
            for info in &importers {
                println!("{}", info.id);
            }
        }
    }
    Ok(())
}
