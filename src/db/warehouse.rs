use crate::db::connection::Database;
use crate::domain::{ProcessedListing, PropertyType};
use crate::errors::{EtlError, Result};
use rusqlite::{params, Row};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::info;

const INSERT_ROW: &str = r#"
    INSERT OR IGNORE INTO warehouse (
        property_code, row_hash,
        price, num_photos, floor, rooms, bathrooms, size, parking_space_price,
        exterior, renew, new_development, has_parking_space,
        is_parking_space_included_in_price, is_finished, has_lift, has_plan,
        has_360, has_3d_tour, has_video, property_type, direction
    ) VALUES (
        ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
        ?16, ?17, ?18, ?19, ?20, ?21, ?22
    )
"#;

const SELECT_ROWS: &str = r#"
    SELECT
        property_code,
        price, num_photos, floor, rooms, bathrooms, size, parking_space_price,
        exterior, renew, new_development, has_parking_space,
        is_parking_space_included_in_price, is_finished, has_lift, has_plan,
        has_360, has_3d_tour, has_video, property_type, direction
    FROM warehouse
    ORDER BY id
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeSummary {
    pub previous_rows: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Hash of the full processed row, property code included. Two rows with the
/// same hash are the same observation.
pub fn row_hash(listing: &ProcessedListing) -> Result<Vec<u8>> {
    // serde_json writes NaN as null, which would collide
    for value in [listing.price, listing.size, listing.parking_space_price] {
        if !value.is_finite() {
            return Err(EtlError::Domain(format!(
                "listing {} has non-finite value {value}",
                listing.property_code
            )));
        }
    }

    let bytes = serde_json::to_vec(listing)?;
    Ok(Sha256::digest(&bytes).to_vec())
}

/// Appends a batch to the warehouse, skipping rows already stored.
///
/// The whole batch goes in one transaction: on error nothing is written.
/// Rows keep arrival order, and the first copy of a duplicate wins.
pub fn merge_batch(db: &Database, batch: &[ProcessedListing]) -> Result<MergeSummary> {
    db.with_conn(|conn| {
        let tx = conn.transaction()?;

        let previous_rows: i64 = tx.query_row("SELECT COUNT(*) FROM warehouse", [], |r| r.get(0))?;
        if previous_rows == 0 {
            info!("Creating warehouse dataset from {} rows", batch.len());
        } else {
            info!(
                "Updating warehouse dataset ({} rows) with {} rows",
                previous_rows,
                batch.len()
            );
        }

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(INSERT_ROW)?;
            for l in batch {
                inserted += stmt.execute(params![
                    l.property_code,
                    row_hash(l)?,
                    l.price,
                    l.num_photos,
                    l.floor,
                    l.rooms,
                    l.bathrooms,
                    l.size,
                    l.parking_space_price,
                    l.exterior,
                    l.renew,
                    l.new_development,
                    l.has_parking_space,
                    l.is_parking_space_included_in_price,
                    l.is_finished,
                    l.has_lift,
                    l.has_plan,
                    l.has_360,
                    l.has_3d_tour,
                    l.has_video,
                    l.property_type.as_str(),
                    l.direction,
                ])?;
            }
        }

        tx.commit()?;

        let summary = MergeSummary {
            previous_rows: previous_rows as usize,
            inserted,
            duplicates: batch.len() - inserted,
        };
        info!(
            "Merged {} new rows, {} duplicates skipped",
            summary.inserted, summary.duplicates
        );
        Ok(summary)
    })
}

fn listing_from_row(row: &Row) -> rusqlite::Result<ProcessedListing> {
    let property_type: String = row.get(19)?;
    Ok(ProcessedListing {
        property_code: row.get(0)?,
        price: row.get(1)?,
        num_photos: row.get(2)?,
        floor: row.get(3)?,
        rooms: row.get(4)?,
        bathrooms: row.get(5)?,
        size: row.get(6)?,
        parking_space_price: row.get(7)?,
        exterior: row.get(8)?,
        renew: row.get(9)?,
        new_development: row.get(10)?,
        has_parking_space: row.get(11)?,
        is_parking_space_included_in_price: row.get(12)?,
        is_finished: row.get(13)?,
        has_lift: row.get(14)?,
        has_plan: row.get(15)?,
        has_360: row.get(16)?,
        has_3d_tour: row.get(17)?,
        has_video: row.get(18)?,
        property_type: PropertyType::normalize(&property_type),
        direction: row.get(20)?,
    })
}

/// Every stored row in insertion order. A warehouse that was never written
/// reads as empty.
pub fn load_all(db: &Database) -> Result<Vec<ProcessedListing>> {
    if !db.exists() {
        return Ok(Vec::new());
    }

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(SELECT_ROWS)?;
        let rows = stmt.query_map([], listing_from_row)?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    })
}

pub fn count_rows(db: &Database) -> Result<usize> {
    if !db.exists() {
        return Ok(0);
    }
    db.with_conn(|conn| {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM warehouse", [], |r| r.get(0))?;
        Ok(n as usize)
    })
}

/// Row count per zone label.
pub fn zone_counts(db: &Database) -> Result<BTreeMap<String, usize>> {
    if !db.exists() {
        return Ok(BTreeMap::new());
    }

    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT direction, COUNT(*) FROM warehouse GROUP BY direction")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;

        let mut out = BTreeMap::new();
        for r in rows {
            let (zone, n) = r?;
            out.insert(zone, n);
        }
        Ok(out)
    })
}
