/// PostgreSQL-backed weather archive
use tokio::runtime::Handle;
use tokio_postgres::{Client, Row};

use crate::error::{Result, WxNowError};
use crate::models::Record;
use crate::rain::Archive;
use crate::units::UnitSystem;

/// Columns read for the archive binding, as stored by the station software.
///
/// Archive rows only hold the per-interval `rain` depth, so an observation
/// built from them never carries rain totals; those come from `rain_sum`.
const RECORD_COLUMNS: [&str; 7] = [
    "usUnits",
    "windDir",
    "windSpeed",
    "windGust",
    "outTemp",
    "outHumidity",
    "barometer",
];

/// Weather archive table in PostgreSQL.
///
/// `rain_sum` blocks on the async client, so it must be called from a
/// blocking worker (`tokio::task::spawn_blocking`), never from async code.
pub struct PostgresArchive {
    client: Client,
    handle: Handle,
    table: String,
    units: UnitSystem,
}

impl PostgresArchive {
    /// Must be created inside the tokio runtime that drives `client`
    pub fn new(client: Client, table: &str, units: UnitSystem) -> Self {
        PostgresArchive {
            client,
            handle: Handle::current(),
            table: table.to_string(),
            units,
        }
    }

    /// Newest archive row as a station record, or `None` for an empty table
    pub async fn latest_record(&self) -> Result<Option<Record>> {
        let row = self
            .client
            .query_opt(latest_record_sql(&self.table).as_str(), &[])
            .await
            .map_err(|e| WxNowError::ArchiveQuery(e.to_string()))?;

        row.map(|row| row_to_record(&row)).transpose()
    }
}

fn rain_sum_sql(table: &str) -> String {
    format!(
        "SELECT SUM(rain)::float8 FROM {} \
         WHERE \"dateTime\" > $1::int8 AND \"dateTime\" <= $2::int8",
        table
    )
}

fn latest_record_sql(table: &str) -> String {
    let columns = RECORD_COLUMNS
        .iter()
        .map(|c| format!("\"{}\"::float8", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT \"dateTime\"::int8, {} FROM {} ORDER BY \"dateTime\" DESC LIMIT 1",
        columns, table
    )
}

fn row_to_record(row: &Row) -> Result<Record> {
    let mut record = Record::new();

    let timestamp: Option<i64> = row
        .try_get(0)
        .map_err(|e| WxNowError::ArchiveQuery(e.to_string()))?;
    record.insert("dateTime".to_string(), timestamp.map(|t| t as f64));

    for (i, column) in RECORD_COLUMNS.iter().enumerate() {
        let value: Option<f64> = row
            .try_get(i + 1)
            .map_err(|e| WxNowError::ArchiveQuery(e.to_string()))?;
        record.insert(column.to_string(), value);
    }

    Ok(record)
}

impl Archive for PostgresArchive {
    fn rain_sum(&self, after: i64, up_to: i64) -> Result<Option<f64>> {
        let sql = rain_sum_sql(&self.table);
        let row = self
            .handle
            .block_on(self.client.query_one(sql.as_str(), &[&after, &up_to]))
            .map_err(|e| WxNowError::ArchiveQuery(e.to_string()))?;

        row.try_get::<_, Option<f64>>(0)
            .map_err(|e| WxNowError::ArchiveQuery(e.to_string()))
    }

    fn unit_system(&self) -> UnitSystem {
        self.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;

    #[test]
    fn rain_window_is_open_closed() {
        assert_eq!(
            rain_sum_sql("archive"),
            "SELECT SUM(rain)::float8 FROM archive \
             WHERE \"dateTime\" > $1::int8 AND \"dateTime\" <= $2::int8"
        );
    }

    #[test]
    fn latest_record_reads_newest_row() {
        let sql = latest_record_sql("wx_archive");
        assert!(sql.starts_with(
            "SELECT \"dateTime\"::int8, \"usUnits\"::float8, \"windDir\"::float8"
        ));
        assert!(sql.ends_with("FROM wx_archive ORDER BY \"dateTime\" DESC LIMIT 1"));
    }

    #[test]
    fn archive_rows_leave_rain_totals_to_the_aggregator() {
        let sql = latest_record_sql("archive");
        for total in ["hourRain", "rain24", "dayRain"] {
            assert!(!sql.contains(total), "{}", total);
        }

        let mut record: Record = RECORD_COLUMNS
            .iter()
            .map(|column| (column.to_string(), Some(1.0)))
            .collect();
        record.insert("dateTime".to_string(), Some(1_700_000_000.0));
        let observation = Observation::from_record(&record).unwrap();
        assert_eq!(observation.rain_last_hour, None);
        assert_eq!(observation.rain_last_24h, None);
        assert_eq!(observation.rain_day_to_date, None);
    }
}
