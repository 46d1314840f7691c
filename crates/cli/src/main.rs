use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use report_core::config::font_size_bounds_from_env_values;
use report_core::constants::DEFAULT_REPORT_DATA_DIR;
use report_core::{
    build_document, codec, reduce_to_first_table, render_form_data, CoreConfig, EditMode,
    EditOutcome, EditorSurface, RecordKey, ReportService, ResultForm, ResultFormData, SplitKind,
    SurfacePoint,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Structured report template CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build template markup from a JSON field list
    Build {
        /// JSON file: `[{"label": .., "parts": ..}]` or `{"fields": [..]}`
        fields: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the field definition embedded in a template
    Decode {
        /// Template markup file
        doc: PathBuf,
    },
    /// Print the starting form data for result entry
    Seed {
        /// Template markup file
        doc: PathBuf,
        /// Previously saved form data (JSON)
        #[arg(long)]
        prior: Option<PathBuf>,
    },
    /// Render form data (JSON) to print-ready markup
    Render {
        /// Form data file
        form: PathBuf,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply one structural edit to the table cell at block/row/col
    Edit {
        /// Template markup file
        doc: PathBuf,
        /// Edit to apply
        #[arg(value_enum)]
        op: EditOp,
        /// Top-level block index of the table
        #[arg(long, default_value_t = 0)]
        block: usize,
        /// Row index within the table
        #[arg(long, default_value_t = 0)]
        row: usize,
        /// Cell index within the row
        #[arg(long, default_value_t = 0)]
        col: usize,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List templates stored under REPORT_DATA_DIR
    Templates,
    /// List results stored for a test under REPORT_DATA_DIR
    Results {
        /// Test identifier
        test_id: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EditOp {
    InsertRowBelow,
    InsertColumnRight,
    DeleteRow,
    DeleteColumn,
    DeleteTable,
    ToggleHeader,
    SplitVertical,
    SplitHorizontal,
    ReduceTableOnly,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("report_core=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Build { fields, output }) => {
            let payload = read(&fields)?;
            let definition = codec::decode_payload(&payload)
                .with_context(|| format!("{} is not a field list", fields.display()))?;
            write_out(output.as_deref(), &build_document(&definition))?;
        }
        Some(Commands::Decode { doc }) => match codec::decode(&read(&doc)?) {
            Some(definition) => println!("{}", serde_json::to_string_pretty(definition.fields())?),
            None => println!("No field template found."),
        },
        Some(Commands::Seed { doc, prior }) => {
            let prior = match prior {
                Some(path) => Some(
                    serde_json::from_str::<ResultFormData>(&read(&path)?)
                        .with_context(|| format!("invalid form data in {}", path.display()))?,
                ),
                None => None,
            };
            let form = ResultForm::start(&read(&doc)?, prior);
            println!("{}", serde_json::to_string_pretty(&form.into_form_data())?);
        }
        Some(Commands::Render { form, output }) => {
            let data: ResultFormData = serde_json::from_str(&read(&form)?)
                .with_context(|| format!("invalid form data in {}", form.display()))?;
            write_out(output.as_deref(), &render_form_data(&data))?;
        }
        Some(Commands::Edit {
            doc,
            op,
            block,
            row,
            col,
            output,
        }) => {
            let markup = read(&doc)?;
            let edited = apply_edit(&markup, op, SurfacePoint::cell(block, row, col))?;
            write_out(output.as_deref(), &edited)?;
        }
        Some(Commands::Templates) => {
            let keys = service()?.list_templates()?;
            if keys.is_empty() {
                println!("No templates found.");
            }
            for key in keys {
                println!("{}", key);
            }
        }
        Some(Commands::Results { test_id }) => {
            let test_id = RecordKey::parse(&test_id)?;
            let records = service()?.list_results(&test_id)?;
            if records.is_empty() {
                println!("No results found.");
            }
            for record in records {
                println!("Token: {}, Saved: {}", record.token, record.saved_at);
            }
        }
        None => {
            println!("Use 'report --help' for commands");
        }
    }

    Ok(())
}

fn apply_edit(markup: &str, op: EditOp, point: SurfacePoint) -> anyhow::Result<String> {
    if let EditOp::ReduceTableOnly = op {
        return reduce_to_first_table(markup).context("document contains no table");
    }

    let mut surface = EditorSurface::open(markup, EditMode::Free);
    if !surface.focus(point) {
        anyhow::bail!("no table cell at {:?}", point);
    }
    let outcome = match op {
        EditOp::InsertRowBelow => surface.insert_row_below(),
        EditOp::InsertColumnRight => surface.insert_column_right(),
        EditOp::DeleteRow => surface.delete_row(),
        EditOp::DeleteColumn => surface.delete_column(),
        EditOp::DeleteTable => surface.delete_table(),
        EditOp::ToggleHeader => surface.toggle_header_row(),
        EditOp::SplitVertical => surface.split_cell(SplitKind::Vertical),
        EditOp::SplitHorizontal => surface.split_cell(SplitKind::Horizontal),
        EditOp::ReduceTableOnly => EditOutcome::Unchanged,
    };
    if outcome == EditOutcome::Unchanged {
        eprintln!("{:?} left the document unchanged", op);
    }
    Ok(surface.markup())
}

fn service() -> anyhow::Result<ReportService> {
    let data_dir =
        std::env::var("REPORT_DATA_DIR").unwrap_or_else(|_| DEFAULT_REPORT_DATA_DIR.into());
    let font_sizes = font_size_bounds_from_env_values(
        std::env::var("REPORT_FONT_SIZE_MIN").ok(),
        std::env::var("REPORT_FONT_SIZE_MAX").ok(),
    )?;
    let cfg = CoreConfig::new(PathBuf::from(data_dir), font_sizes)?;
    Ok(ReportService::with_fs_store(Arc::new(cfg)))
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_out(output: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{}", contents);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::{FieldDefinition, TemplateDefinition};

    fn template() -> String {
        build_document(&TemplateDefinition::new(vec![
            FieldDefinition::new("Findings", 1),
            FieldDefinition::new("Impression", 2),
        ]))
    }

    #[test]
    fn test_edit_insert_row_keeps_marker() {
        let edited = apply_edit(
            &template(),
            EditOp::InsertRowBelow,
            SurfacePoint::cell(0, 0, 0),
        )
        .unwrap();
        assert!(codec::has_marker(&edited));
        assert_eq!(edited.matches("<tr").count(), template().matches("<tr").count() + 1);
    }

    #[test]
    fn test_edit_without_cell_fails() {
        assert!(apply_edit("<p>x</p>", EditOp::DeleteRow, SurfacePoint::cell(0, 0, 0)).is_err());
    }

    #[test]
    fn test_reduce_table_only_drops_marker() {
        let reduced = apply_edit(
            &format!("<p>intro</p>{}", template()),
            EditOp::ReduceTableOnly,
            SurfacePoint::cell(0, 0, 0),
        )
        .unwrap();
        assert!(reduced.starts_with("<table"));
        assert!(!codec::has_marker(&reduced));
    }
}
