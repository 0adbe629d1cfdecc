use crate::domain::columns::{PROCESSED_COLUMNS, PROPERTY_CODE};
use crate::domain::ProcessedListing;
use crate::errors::{EtlError, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

/// Writes warehouse rows to an `.xlsx` workbook: `propertyCode` first, then
/// the processed columns in canonical order.
pub fn export_warehouse_xlsx(listings: &[ProcessedListing], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("warehouse")?;

    let bold = Format::new().set_bold();

    // Headers
    worksheet.write_string_with_format(0, 0, PROPERTY_CODE, &bold)?;
    for (i, header) in PROCESSED_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, (i + 1) as u16, *header, &bold)?;
    }

    // Rows
    for (i, listing) in listings.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &listing.property_code)?;

        for (j, column) in PROCESSED_COLUMNS.iter().enumerate() {
            let c = (j + 1) as u16;
            if let Some(value) = listing.numeric(column) {
                worksheet.write_number(r, c, value)?;
            } else if let Some(value) = listing.flag(column) {
                worksheet.write_boolean(r, c, value)?;
            } else if let Some(value) = listing.category(column) {
                worksheet.write_string(r, c, value)?;
            } else {
                return Err(EtlError::Schema {
                    column: column.to_string(),
                });
            }
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    workbook.save(path)?;

    info!("Exported {} rows to {}", listings.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::processed;

    #[test]
    fn writes_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/warehouse.xlsx");

        export_warehouse_xlsx(
            &[processed("1", 800.0, "north"), processed("2", 950.0, "south")],
            &path,
        )
        .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }
}
