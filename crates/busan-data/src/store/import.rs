//! CSV import of raw security and fundamental extracts.
//!
//! Column names follow the upstream extract layout: `gvkey, iid, datadate,
//! fic, conm, prccd, ajexdi, cshoc` for daily securities and `gvkey,
//! datadate, fic, ceq, at` for annual fundamentals.

use crate::error::Result;
use crate::model::{DailyQuote, FundamentalRecord, SecurityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One raw daily security record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySecurityRow {
    /// Entity identifier
    pub gvkey: String,
    /// Issue identifier
    pub iid: String,
    /// Trading date
    pub datadate: NaiveDate,
    /// Country of incorporation code (market)
    pub fic: String,
    /// Company name
    #[serde(default)]
    pub conm: Option<String>,
    /// Closing price
    pub prccd: Option<f64>,
    /// Cumulative adjustment factor
    pub ajexdi: Option<f64>,
    /// Shares outstanding
    pub cshoc: Option<f64>,
}

impl DailySecurityRow {
    /// Tag a quote with its market.
    pub fn from_quote(market: &str, quote: &DailyQuote) -> Self {
        Self {
            gvkey: quote.id.gvkey.clone(),
            iid: quote.id.iid.clone(),
            datadate: quote.date,
            fic: market.to_string(),
            conm: quote.name.clone(),
            prccd: Some(quote.price),
            ajexdi: quote.adjustment,
            cshoc: quote.shares,
        }
    }

    /// Convert to a quote. `None` when the row has no price.
    pub fn into_quote(self) -> Option<DailyQuote> {
        let price = self.prccd?;
        Some(DailyQuote {
            id: SecurityId::new(self.gvkey, self.iid),
            date: self.datadate,
            name: self.conm,
            price,
            adjustment: self.ajexdi,
            shares: self.cshoc,
        })
    }
}

/// One raw annual fundamentals record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalRow {
    /// Entity identifier
    pub gvkey: String,
    /// Fiscal period end
    pub datadate: NaiveDate,
    /// Country of incorporation code (market)
    pub fic: String,
    /// Common equity
    pub ceq: Option<f64>,
    /// Total assets
    #[serde(rename = "at")]
    pub total_assets: Option<f64>,
}

impl FundamentalRow {
    /// Tag a fundamental record with its market.
    pub fn from_record(market: &str, record: &FundamentalRecord) -> Self {
        Self {
            gvkey: record.gvkey.clone(),
            datadate: record.date,
            fic: market.to_string(),
            ceq: Some(record.book_equity),
            total_assets: record.total_assets,
        }
    }
}

fn read_rows<T, R>(reader: R) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Read daily security rows from a CSV file.
pub fn import_daily_csv<P: AsRef<Path>>(path: P) -> Result<Vec<DailySecurityRow>> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

/// Read annual fundamental rows from a CSV file.
pub fn import_fundamentals_csv<P: AsRef<Path>>(path: P) -> Result<Vec<FundamentalRow>> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_daily_rows_with_nulls() {
        let data = "\
gvkey,iid,datadate,fic,conm,prccd,ajexdi,cshoc
100001,01W,2020-10-30,KOR,SAMSUNG ELECTRONICS,56600,1,5969782550
100002,01W,2020-10-30,KOR,,,1,
";
        let rows: Vec<DailySecurityRow> = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].prccd, Some(56600.0));
        assert_eq!(rows[0].conm.as_deref(), Some("SAMSUNG ELECTRONICS"));
        assert_eq!(rows[1].prccd, None);
        assert_eq!(rows[1].cshoc, None);

        assert!(rows[0].clone().into_quote().is_some());
        assert!(rows[1].clone().into_quote().is_none());
    }

    #[test]
    fn test_read_fundamental_rows() {
        let data = "\
gvkey,datadate,fic,ceq,at
100001,2019-12-31,KOR,262880421000000,352564497000000
100002,2019-12-31,KOR,,
";
        let rows: Vec<FundamentalRow> = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_assets, Some(352_564_497_000_000.0));
        assert_eq!(rows[1].ceq, None);
    }

    #[test]
    fn test_malformed_row_is_error() {
        let data = "gvkey,iid,datadate,fic,conm,prccd,ajexdi,cshoc\n100001,01W,not-a-date,KOR,,1,1,1\n";
        let rows: Result<Vec<DailySecurityRow>> = read_rows(data.as_bytes());
        assert!(rows.is_err());
    }
}
