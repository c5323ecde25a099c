use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use moviedb_config::Config;
use moviedb_core::{Catalog, DedupeReport, MongoStore, NO_DUPLICATES};
use std::sync::Arc;
use tracing::info;

/// One-shot version of `DELETE /deleteDups` against the configured database.
pub async fn run_dedupe(config: &Config, output: &Output) -> Result<()> {
    let store = MongoStore::connect(&config.database)
        .await
        .map_err(|e| eyre!("Failed to connect to MongoDB: {}", e))?;
    let catalog = Catalog::new(Arc::new(store));

    info!(namespace = %config.database.namespace, "Looking for duplicate movies");
    let report = catalog
        .delete_duplicates()
        .await
        .map_err(|e| eyre!("Dedupe failed: {}", e))?;

    print_report(&report, output)?;

    if !report.all_deleted() {
        return Err(eyre!("{} duplicate copies could not be deleted", report.failed.len()));
    }
    Ok(())
}

fn print_report(report: &DedupeReport, output: &Output) -> Result<()> {
    match output.format() {
        OutputFormat::Human => {
            if report.nothing_to_delete() {
                output.success(NO_DUPLICATES);
                return Ok(());
            }

            if !output.is_quiet() {
                let mut table = Table::new();
                table.set_header(vec![
                    Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
                    Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
                    Cell::new("Kept").add_attribute(comfy_table::Attribute::Bold),
                    Cell::new("Removed").add_attribute(comfy_table::Attribute::Bold),
                ]);
                for set in &report.sets {
                    table.add_row(vec![
                        Cell::new(&set.title),
                        Cell::new(set.year),
                        Cell::new(set.keep.to_hex()),
                        Cell::new(set.extra.len()),
                    ]);
                }
                table.load_preset(comfy_table::presets::UTF8_FULL);
                table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
                println!("{}", table);
            }

            if report.all_deleted() {
                output.success(format!("Deleted {} duplicate copies", report.deleted));
            } else {
                output.error(format!(
                    "Deleted {} duplicate copies, {} failed",
                    report.deleted,
                    report.failed.len()
                ));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let value = moviedb_models::to_api_json(report).map_err(|e| eyre!("{}", e))?;
            output.json(&value);
        }
    }
    Ok(())
}
