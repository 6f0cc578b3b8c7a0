//! End-to-end tests for monthly factor synthesis

use approx::assert_abs_diff_eq;
use busan_data::store::{DailySecurityRow, FundamentalRow};
use busan_data::{
    DailyQuote, DataError, FundamentalRecord, SecurityDataGateway, SecurityId, SecurityObservation,
    SecurityStore, SqliteStore, YearMonth,
};
use busan_factors::{
    FactorSynthesizer, HoldingReturn, MonthOutcome, RiskFreeSchedule, RunStats, SkipReason,
    SynthesizerConfig,
};
use chrono::NaiveDate;
use std::collections::HashMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn synthesizer(min_universe: usize, monthly_rf: f64) -> FactorSynthesizer {
    let config = SynthesizerConfig {
        min_universe,
        ..Default::default()
    };
    FactorSynthesizer::new(config, RiskFreeSchedule::constant(monthly_rf)).unwrap()
}

#[test]
fn test_six_security_scenario() {
    let caps = [50.0, 60.0, 500.0, 600.0, 70.0, 550.0];
    let ratios = [0.1, 0.5, 0.2, 0.9, 1.0, 0.6];
    let rets = [0.05, -0.03, 0.02, 0.01, 0.04, -0.01];

    let universe: Vec<SecurityObservation> = (0..6)
        .map(|i| SecurityObservation {
            id: SecurityId::new(format!("{i}"), "01W"),
            date: date(2020, 9, 1),
            name: None,
            price: caps[i],
            adjustment: 1.0,
            shares: 1.0,
            market_cap: caps[i],
            book_equity: ratios[i] * caps[i],
            book_to_market: ratios[i],
        })
        .collect();
    let returns: HashMap<SecurityId, HoldingReturn> = universe
        .iter()
        .zip(rets)
        .map(|(o, ret)| {
            (
                o.id.clone(),
                HoldingReturn {
                    ret,
                    market_cap: Some(o.market_cap),
                },
            )
        })
        .collect();

    let mut stats = RunStats::new();
    let outcome = synthesizer(6, 0.0).synthesize(month(2020, 10), &universe, &returns, &mut stats);
    let MonthOutcome::Computed(record) = outcome else {
        panic!("expected a computed month, got {outcome:?}");
    };

    // Small: 0 (growth), 1 (neutral), 4 (value). Big: 2 (growth), 5 (neutral), 3 (value).
    let (s_g, s_n, s_v) = (0.05, -0.03, 0.04);
    let (b_g, b_n, b_v) = (0.02, -0.01, 0.01);
    let smb = (s_v + s_n + s_g) / 3.0 - (b_v + b_n + b_g) / 3.0;
    let hml = (s_v + b_v) / 2.0 - (s_g + b_g) / 2.0;
    let market: f64 = caps.iter().zip(rets).map(|(c, r)| c * r).sum::<f64>() / caps.iter().sum::<f64>();

    assert_abs_diff_eq!(record.smb, smb * 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(record.hml, hml * 100.0, epsilon = 1e-9);
    assert_abs_diff_eq!(record.mkt, market * 100.0, epsilon = 1e-9);
    assert_eq!(record.rf, 0.0);
    assert_eq!(record.date, date(2020, 10, 31));
    assert_eq!(stats.degenerate_aggregates, 0);
}

fn row(i: usize, day: NaiveDate, price: f64, shares: f64) -> DailySecurityRow {
    DailySecurityRow {
        gvkey: format!("{:06}", 100_000 + i),
        iid: "01W".to_string(),
        datadate: day,
        fic: "KOR".to_string(),
        conm: None,
        prccd: Some(price),
        ajexdi: Some(1.0),
        cshoc: Some(shares),
    }
}

/// Twelve securities priced on Aug 31, Sep 29, Oct 30 and Nov 27 2020.
fn seeded_store() -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    let mut rows = Vec::new();
    let mut fundamentals = Vec::new();

    for i in 0..12 {
        let shares = 100.0 + 10.0 * i as f64;
        let base = 1_000.0 + 37.0 * ((i * 5) % 12) as f64;
        let oct = base * (1.0 + ((i % 5) as f64 - 2.0) / 100.0);
        let nov = oct * (1.0 + ((i % 3) as f64 - 1.0) / 50.0);

        rows.push(row(i, date(2020, 8, 31), base, shares));
        rows.push(row(i, date(2020, 9, 29), base, shares));
        rows.push(row(i, date(2020, 10, 30), oct, shares));
        rows.push(row(i, date(2020, 11, 27), nov, shares));

        fundamentals.push(FundamentalRow {
            gvkey: format!("{:06}", 100_000 + i),
            datadate: date(2019, 12, 31),
            fic: "KOR".to_string(),
            ceq: Some(((i * 7) % 12 + 1) as f64 * 10_000.0),
            total_assets: None,
        });
    }

    store.put_daily_rows(&rows).unwrap();
    store.put_fundamental_rows(&fundamentals).unwrap();
    store
}

#[test]
fn test_range_over_store() {
    let store = seeded_store();
    let gateway = SecurityDataGateway::new(&store, "KOR");
    let synthesizer = synthesizer(6, 0.001);

    let mut stats = RunStats::new();
    let history = synthesizer
        .compute_range(&gateway, month(2020, 10), month(2021, 2), &mut stats)
        .unwrap();

    assert_eq!(stats.requested, 5);
    assert_eq!(stats.computed, 2);
    assert_eq!(stats.skipped, 3);
    assert_eq!(stats.failed, 0);
    // December and January have a universe but no prices; February has neither.
    assert_eq!(stats.missed_months, vec![month(2020, 12), month(2021, 1), month(2021, 2)]);
    assert_eq!(stats.degenerate_aggregates, 0);

    let dates: Vec<_> = history.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(2020, 10, 31), date(2020, 11, 30)]);
    assert!(history.get(month(2020, 12)).is_none());

    let october = history.get(month(2020, 10)).unwrap();
    assert!(october.mkt.abs() > 0.0);
    assert_abs_diff_eq!(october.rf, 0.1, epsilon = 1e-12);
}

#[test]
fn test_month_without_prices_is_skipped() {
    let store = seeded_store();
    let gateway = SecurityDataGateway::new(&store, "KOR");
    let synthesizer = synthesizer(6, 0.001);

    let mut stats = RunStats::new();
    let outcome = synthesizer
        .compute_month(&gateway, month(2020, 12), &mut stats)
        .unwrap();
    assert_eq!(outcome, MonthOutcome::Skipped(SkipReason::NoHoldingReturns { universe: 12 }));
    assert_eq!(stats.degenerate_aggregates, 0);
}

#[test]
fn test_recomputation_is_idempotent() {
    let store = seeded_store();
    let gateway = SecurityDataGateway::new(&store, "KOR");
    let synthesizer = synthesizer(6, 0.001);

    let first = synthesizer
        .compute_range(&gateway, month(2020, 10), month(2020, 11), &mut RunStats::new())
        .unwrap();
    let second = synthesizer
        .compute_range(&gateway, month(2020, 10), month(2020, 11), &mut RunStats::new())
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_no_look_ahead_into_holding_month() {
    let store = seeded_store();
    let gateway = SecurityDataGateway::new(&store, "KOR");
    let synthesizer = synthesizer(6, 0.0);

    let before = synthesizer
        .compute_month(&gateway, month(2020, 10), &mut RunStats::new())
        .unwrap();

    // Book equity reported after the October formation date must not change
    // October's portfolios.
    let late: Vec<FundamentalRow> = (0..12)
        .map(|i| FundamentalRow {
            gvkey: format!("{:06}", 100_000 + i),
            datadate: date(2020, 9, 15),
            fic: "KOR".to_string(),
            ceq: Some(((12 - i) * 50_000) as f64),
            total_assets: None,
        })
        .collect();
    store.put_fundamental_rows(&late).unwrap();

    let after = synthesizer
        .compute_month(&gateway, month(2020, 10), &mut RunStats::new())
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_invalid_range() {
    let store = seeded_store();
    let gateway = SecurityDataGateway::new(&store, "KOR");
    let result = synthesizer(6, 0.0).compute_range(&gateway, month(2021, 1), month(2020, 1), &mut RunStats::new());
    assert!(result.is_err());
}

struct UnavailableStore;

impl SecurityStore for UnavailableStore {
    fn latest_trading_day(&self, _: &str, _: NaiveDate, _: u32) -> busan_data::Result<Option<NaiveDate>> {
        Err(DataError::Http("upstream unavailable".to_string()))
    }

    fn securities_on(&self, _: &str, _: NaiveDate) -> busan_data::Result<Vec<DailyQuote>> {
        Err(DataError::Http("upstream unavailable".to_string()))
    }

    fn price_series(&self, _: &[String], _: NaiveDate, _: NaiveDate) -> busan_data::Result<Vec<DailyQuote>> {
        Err(DataError::Http("upstream unavailable".to_string()))
    }

    fn fundamentals(&self, _: &str, _: NaiveDate, _: NaiveDate) -> busan_data::Result<Vec<FundamentalRecord>> {
        Err(DataError::Http("upstream unavailable".to_string()))
    }
}

#[test]
fn test_retrieval_failures_do_not_abort() {
    let gateway = SecurityDataGateway::new(UnavailableStore, "KOR");
    let mut stats = RunStats::new();
    let history = synthesizer(6, 0.0)
        .compute_range(&gateway, month(2020, 10), month(2020, 12), &mut stats)
        .unwrap();

    assert!(history.is_empty());
    assert_eq!(stats.requested, 3);
    assert_eq!(stats.failed, 3);
}
