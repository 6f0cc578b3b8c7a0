//! SQLite-backed security store.

use super::SecurityStore;
use super::import::{DailySecurityRow, FundamentalRow};
use crate::error::{DataError, Result};
use crate::model::{DailyQuote, FundamentalRecord, SecurityId};
use chrono::{Days, NaiveDate};
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;

/// SQLite store of daily security records and annual fundamentals.
///
/// The connection is owned by the store and closed when it is dropped, so a
/// store opened at the start of a run is released on every exit path.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

/// Store statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of daily records
    pub daily_records: usize,
    /// Number of distinct instruments
    pub instruments: usize,
    /// Number of distinct trading dates
    pub trading_days: usize,
    /// Number of fundamental records
    pub fundamental_records: usize,
    /// Earliest trading date
    pub first_date: Option<NaiveDate>,
    /// Latest trading date
    pub last_date: Option<NaiveDate>,
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DataError::Parse(format!("Invalid date '{}': {}", s, e)))
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(DataError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        });
    }
    Ok(())
}

type QuoteTuple = (
    String,
    String,
    String,
    Option<String>,
    f64,
    Option<f64>,
    Option<f64>,
);

fn quote_from_tuple(row: QuoteTuple) -> Result<DailyQuote> {
    let (gvkey, iid, date, name, price, adjustment, shares) = row;
    Ok(DailyQuote {
        id: SecurityId::new(gvkey, iid),
        date: parse_date(&date)?,
        name,
        price,
        adjustment,
        shares,
    })
}

impl SqliteStore {
    /// Open (or create) a store.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS security_daily (
                gvkey TEXT NOT NULL,
                iid TEXT NOT NULL,
                datadate TEXT NOT NULL,
                fic TEXT NOT NULL,
                conm TEXT,
                prccd REAL,
                ajexdi REAL,
                cshoc REAL,
                PRIMARY KEY (gvkey, iid, datadate)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_security_daily_fic_date
             ON security_daily(fic, datadate)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS fundamentals_annual (
                gvkey TEXT NOT NULL,
                datadate TEXT NOT NULL,
                fic TEXT NOT NULL,
                ceq REAL,
                at REAL,
                PRIMARY KEY (gvkey, datadate)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_fundamentals_fic_date
             ON fundamentals_annual(fic, datadate)",
            [],
        )?;

        Ok(())
    }

    /// Store raw daily rows in one transaction. Existing rows with the same key
    /// are replaced.
    pub fn put_daily_rows(&self, rows: &[DailySecurityRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO security_daily
                 (gvkey, iid, datadate, fic, conm, prccd, ajexdi, cshoc)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.gvkey,
                    row.iid,
                    row.datadate.to_string(),
                    row.fic,
                    row.conm,
                    row.prccd,
                    row.ajexdi,
                    row.cshoc
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Store quotes for one market.
    pub fn put_daily_quotes(&self, market: &str, quotes: &[DailyQuote]) -> Result<usize> {
        let rows: Vec<_> = quotes
            .iter()
            .map(|q| DailySecurityRow::from_quote(market, q))
            .collect();
        self.put_daily_rows(&rows)
    }

    /// Store raw fundamental rows in one transaction.
    pub fn put_fundamental_rows(&self, rows: &[FundamentalRow]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO fundamentals_annual
                 (gvkey, datadate, fic, ceq, at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.gvkey,
                    row.datadate.to_string(),
                    row.fic,
                    row.ceq,
                    row.total_assets
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Store fundamental records for one market.
    pub fn put_fundamentals(&self, market: &str, records: &[FundamentalRecord]) -> Result<usize> {
        let rows: Vec<_> = records
            .iter()
            .map(|r| FundamentalRow::from_record(market, r))
            .collect();
        self.put_fundamental_rows(&rows)
    }

    /// Delete everything.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM security_daily", [])?;
        self.conn.execute("DELETE FROM fundamentals_annual", [])?;
        Ok(())
    }

    /// Get store statistics.
    pub fn get_stats(&self) -> Result<StoreStats> {
        let daily_records: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM security_daily", [], |row| row.get(0))?;

        let instruments: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM (SELECT DISTINCT gvkey, iid FROM security_daily)",
            [],
            |row| row.get(0),
        )?;

        let trading_days: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT datadate) FROM security_daily",
            [],
            |row| row.get(0),
        )?;

        let fundamental_records: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM fundamentals_annual", [], |row| {
                    row.get(0)
                })?;

        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(datadate), MAX(datadate) FROM security_daily",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(StoreStats {
            daily_records: daily_records as usize,
            instruments: instruments as usize,
            trading_days: trading_days as usize,
            fundamental_records: fundamental_records as usize,
            first_date: first.as_deref().map(parse_date).transpose()?,
            last_date: last.as_deref().map(parse_date).transpose()?,
        })
    }
}

impl SecurityStore for SqliteStore {
    fn latest_trading_day(
        &self,
        market: &str,
        target: NaiveDate,
        max_days_back: u32,
    ) -> Result<Option<NaiveDate>> {
        let earliest = target - Days::new(u64::from(max_days_back));
        let found: Option<String> = self.conn.query_row(
            "SELECT MAX(datadate) FROM security_daily
             WHERE fic = ?1 AND datadate <= ?2 AND datadate >= ?3
             AND prccd IS NOT NULL",
            params![market, target.to_string(), earliest.to_string()],
            |row| row.get(0),
        )?;

        found.as_deref().map(parse_date).transpose()
    }

    fn securities_on(&self, market: &str, date: NaiveDate) -> Result<Vec<DailyQuote>> {
        let mut stmt = self.conn.prepare(
            "SELECT gvkey, iid, datadate, conm, prccd, ajexdi, cshoc
             FROM security_daily
             WHERE fic = ?1 AND datadate = ?2
             AND prccd IS NOT NULL
             AND cshoc IS NOT NULL AND cshoc > 0
             ORDER BY gvkey, iid",
        )?;

        let rows = stmt.query_map(params![market, date.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<f64>>(6)?,
            ))
        })?;

        let mut quotes = Vec::new();
        for row in rows {
            quotes.push(quote_from_tuple(row?)?);
        }
        Ok(quotes)
    }

    fn price_series(
        &self,
        gvkeys: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>> {
        check_range(start, end)?;
        if gvkeys.is_empty() {
            return Ok(Vec::new());
        }

        // SQLite caps bound parameters per statement, so query in chunks.
        const CHUNK: usize = 500;
        let mut quotes = Vec::new();

        for chunk in gvkeys.chunks(CHUNK) {
            let placeholders = (0..chunk.len())
                .map(|i| format!("?{}", i + 3))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT gvkey, iid, datadate, conm, prccd, ajexdi, cshoc
                 FROM security_daily
                 WHERE datadate >= ?1 AND datadate <= ?2
                 AND prccd IS NOT NULL
                 AND gvkey IN ({})",
                placeholders
            );

            let mut values: Vec<String> = Vec::with_capacity(chunk.len() + 2);
            values.push(start.to_string());
            values.push(end.to_string());
            values.extend(chunk.iter().cloned());

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                ))
            })?;

            for row in rows {
                quotes.push(quote_from_tuple(row?)?);
            }
        }

        quotes.sort_by(|a, b| a.id.cmp(&b.id).then(a.date.cmp(&b.date)));
        Ok(quotes)
    }

    fn fundamentals(
        &self,
        market: &str,
        since: NaiveDate,
        cutoff: NaiveDate,
    ) -> Result<Vec<FundamentalRecord>> {
        check_range(since, cutoff)?;

        let mut stmt = self.conn.prepare(
            "SELECT gvkey, datadate, ceq, at
             FROM fundamentals_annual
             WHERE fic = ?1 AND datadate <= ?2 AND datadate >= ?3
             AND ceq IS NOT NULL AND ceq > 0",
        )?;

        let rows = stmt.query_map(
            params![market, cutoff.to_string(), since.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                ))
            },
        )?;

        let mut records = Vec::new();
        for row in rows {
            let (gvkey, date, book_equity, total_assets) = row?;
            records.push(FundamentalRecord {
                gvkey,
                date: parse_date(&date)?,
                book_equity,
                total_assets,
            });
        }
        Ok(records)
    }
}
