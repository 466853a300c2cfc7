//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use lumina_api_models::{ImageRecord, ImageStats};
use lumina_client::UploadReport;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn render_image_list(items: &[&ImageRecord], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(items)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!(
                "{:<8} {:>10} {:<18} {:<20} NAME",
                "ID", "SIZE", "FLAGS", "UPLOADED"
            );
            for record in items {
                println!(
                    "{:<8} {:>10} {:<18} {:<20} {}",
                    record.id,
                    format_bytes(record.file_size),
                    flag_summary(record),
                    record.upload_date,
                    record.original_filename
                );
            }
            println!("{} image(s)", items.len());
        }
    }
    Ok(())
}

pub(crate) fn render_image_detail(record: &ImageRecord, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(record)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("id: {}", record.id);
            println!("name: {}", record.original_filename);
            println!("stored as: {}", record.stored_filename);
            println!("path: {}", record.file_path);
            println!("size: {}", format_bytes(record.file_size));
            println!("type: {}", record.content_type);
            println!("uploaded: {}", record.upload_date);
            println!("flags: {}", flag_summary(record));
        }
    }
    Ok(())
}

pub(crate) fn render_stats(stats: &ImageStats, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(stats)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("images: {}", stats.total_images);
            println!("favorites: {}", stats.favorites);
            println!("archived: {}", stats.archived);
            println!("trash: {}", stats.trash);
        }
    }
    Ok(())
}

pub(crate) fn render_upload_report(report: &UploadReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&report.outcomes)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            let mut uploaded = 0usize;
            for outcome in &report.outcomes {
                if outcome.success {
                    uploaded += 1;
                    println!("uploaded {}", outcome.filename);
                } else {
                    println!("failed {}: {}", outcome.filename, outcome.message);
                }
            }
            println!(
                "{} uploaded, {} failed; collection now holds {} image(s)",
                uploaded,
                report.outcomes.len() - uploaded,
                report.refreshed
            );
        }
    }
    Ok(())
}

pub(crate) fn flag_summary(record: &ImageRecord) -> String {
    let mut flags = Vec::new();
    if record.is_favorite {
        flags.push("favorite");
    }
    if record.is_archived {
        flags.push("archived");
    }
    if record.is_deleted {
        flags.push("trash");
    }
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join(",")
    }
}

#[must_use]
pub(crate) fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;
    let value = bytes_to_f64(bytes);
    if value >= GIB {
        format!("{:.2} GiB", value / GIB)
    } else if value >= MIB {
        format!("{:.2} MiB", value / MIB)
    } else if value >= KIB {
        format!("{:.2} KiB", value / KIB)
    } else {
        format!("{bytes} B")
    }
}

fn bytes_to_f64(value: u64) -> f64 {
    let high = u32::try_from(value >> 32).unwrap_or(u32::MAX);
    let low = u32::try_from(value & 0xFFFF_FFFF).unwrap_or(u32::MAX);
    f64::from(high) * 4_294_967_296.0 + f64::from(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, favorite: bool, archived: bool, deleted: bool) -> ImageRecord {
        ImageRecord {
            id,
            filename: format!("img-{id}.jpg"),
            stored_filename: format!("{id}-stored.jpg"),
            original_filename: format!("holiday-{id}.jpg"),
            file_path: format!("/data/{id}-stored.jpg"),
            file_size: 2_048,
            content_type: "image/jpeg".to_string(),
            upload_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
                .expect("valid date")
                .and_hms_opt(9, 30, 0)
                .expect("valid time"),
            is_favorite: favorite,
            is_archived: archived,
            is_deleted: deleted,
        }
    }

    #[test]
    fn format_bytes_displays_expected_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.00 GiB");
    }

    #[test]
    fn flag_summary_lists_set_flags_in_order() {
        assert_eq!(flag_summary(&record(1, false, false, false)), "-");
        assert_eq!(flag_summary(&record(1, true, false, true)), "favorite,trash");
        assert_eq!(
            flag_summary(&record(1, true, true, true)),
            "favorite,archived,trash"
        );
    }

    #[test]
    fn renderers_accept_both_formats() {
        let records = [record(1, true, false, false)];
        let refs: Vec<&ImageRecord> = records.iter().collect();
        render_image_list(&refs, OutputFormat::Table).expect("table render");
        render_image_list(&refs, OutputFormat::Json).expect("json render");
        render_image_detail(&records[0], OutputFormat::Table).expect("detail render");
    }
}
