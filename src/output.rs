use std::io::Write;

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// Progress text emitted while an import runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notice {
    Header { importer: String },
    JobConverted { id: u64, title: String },
    Summary { converted: usize, skipped: usize },
    TaxonomiesStarted,
    TaxonomiesFinished,
}

/// Writes notices to any sink in the chosen format.
pub struct Reporter<'a> {
    out: Box<dyn Write + 'a>,
    format: Format,
}

impl<'a> Reporter<'a> {
    pub fn new(out: impl Write + 'a, format: Format) -> Self {
        Self {
            out: Box::new(out),
            format,
        }
    }

    pub fn stdout(format: Format) -> Reporter<'static> {
        Reporter::new(std::io::stdout(), format)
    }

    pub fn notice(&mut self, notice: &Notice) -> Result<()> {
        match self.format {
            Format::Json => writeln!(self.out, "{}", serde_json::to_string(notice)?)?,
            Format::Pretty => writeln!(self.out, "{}", pretty(notice))?,
            Format::Minimal => writeln!(self.out, "{}", minimal(notice))?,
        }
        Ok(())
    }
}

fn pretty(notice: &Notice) -> String {
    match notice {
        Notice::Header { importer } => importer.bold().underline().to_string(),
        Notice::JobConverted { title, .. } => {
            format!("{} job was converted", title.bold())
        }
        Notice::Summary { converted, skipped } => format!(
            "{}. Converted {} jobs and skipped {}.",
            "Done".green().bold(),
            converted,
            skipped
        ),
        Notice::TaxonomiesStarted => "Converting taxonomies".to_string(),
        Notice::TaxonomiesFinished => "Finished converting taxonomies. Have fun!".to_string(),
    }
}

fn minimal(notice: &Notice) -> String {
    match notice {
        Notice::Header { importer } => format!("# {importer}"),
        Notice::JobConverted { id, title } => format!("converted {id:>6} {title}"),
        Notice::Summary { converted, skipped } => {
            format!("done converted={converted} skipped={skipped}")
        }
        Notice::TaxonomiesStarted => "taxonomies start".to_string(),
        Notice::TaxonomiesFinished => "taxonomies done".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(format: Format, notices: &[Notice]) -> String {
        let mut buf = Vec::new();
        {
            let mut reporter = Reporter::new(&mut buf, format);
            for n in notices {
                reporter.notice(n).unwrap();
            }
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn json_notices_are_one_object_per_line() {
        let out = render(
            Format::Json,
            &[
                Notice::JobConverted {
                    id: 7,
                    title: "Welder".into(),
                },
                Notice::Summary {
                    converted: 1,
                    skipped: 2,
                },
                Notice::TaxonomiesStarted,
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"event":"job_converted","id":7,"title":"Welder"}"#,
                r#"{"event":"summary","converted":1,"skipped":2}"#,
                r#"{"event":"taxonomies_started"}"#,
            ]
        );
    }

    #[test]
    fn pretty_notices_name_the_job_and_counts() {
        let out = render(
            Format::Pretty,
            &[
                Notice::JobConverted {
                    id: 7,
                    title: "Welder".into(),
                },
                Notice::Summary {
                    converted: 3,
                    skipped: 4,
                },
            ],
        );
        assert!(out.contains("Welder"));
        assert!(out.contains("job was converted"));
        assert!(out.contains("Converted 3 jobs and skipped 4."));
    }

    #[test]
    fn minimal_summary_is_key_value() {
        let out = render(
            Format::Minimal,
            &[Notice::Summary {
                converted: 0,
                skipped: 5,
            }],
        );
        assert_eq!(out, "done converted=0 skipped=5\n");
    }
}
