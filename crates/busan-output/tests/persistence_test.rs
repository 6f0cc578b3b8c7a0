//! Integration tests for the factor file update cycle and result exports.

use busan_data::ecos::MonthlyRate;
use busan_data::{SecurityId, YearMonth};
use busan_factors::{FactorHistory, MonthlyFactorRecord};
use busan_output::{
    load_factor_history, load_risk_free, save_factor_history, save_risk_free, write_premia,
};
use busan_premia::{DailyFactorPanel, DailyFactors, FamaMacBeth, FamaMacBethConfig, ReturnSeries};
use chrono::{Days, NaiveDate};
use std::path::PathBuf;

fn month(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn record(month: YearMonth, mkt: f64) -> MonthlyFactorRecord {
    MonthlyFactorRecord {
        date: month.last_day(),
        mkt,
        smb: mkt / 2.0,
        hml: -mkt,
        rf: 0.0833,
    }
}

fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(name);
    std::fs::remove_file(&path).ok();
    path
}

#[test]
fn test_update_cycle() {
    let path = temp_path("busan_output_update_cycle.csv");

    // Existing file covers 2020-10..2021-03 without 2021-01.
    let existing: FactorHistory = [(2020, 10), (2020, 11), (2020, 12), (2021, 2), (2021, 3)]
        .into_iter()
        .map(|(y, m)| record(month(y, m), 1.0))
        .collect();
    save_factor_history(&existing, &path).unwrap();

    let mut loaded = load_factor_history(&path).unwrap();
    assert_eq!(loaded, existing);

    let missing = loaded.missing_months(month(2020, 10), month(2021, 4));
    assert_eq!(missing, vec![month(2021, 1), month(2021, 4)]);

    let computed: FactorHistory = missing.iter().map(|m| record(*m, 2.0)).collect();
    let stats = loaded.merge(computed);
    assert_eq!(stats.added, 2);
    assert_eq!(stats.replaced, 0);
    save_factor_history(&loaded, &path).unwrap();

    let reloaded = load_factor_history(&path).unwrap();
    assert_eq!(reloaded.len(), 7);
    let dates: Vec<NaiveDate> = reloaded.iter().map(|r| r.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(dates, sorted);
    assert!(reloaded.missing_months(month(2020, 10), month(2021, 4)).is_empty());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_json_history_round_trip() {
    let path = temp_path("busan_output_history.json");
    let history: FactorHistory = [record(month(2021, 5), -0.75)].into_iter().collect();
    save_factor_history(&history, &path).unwrap();
    assert_eq!(load_factor_history(&path).unwrap(), history);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_risk_free_file_sorted() {
    let path = temp_path("busan_output_rf.csv");
    let rates = [
        MonthlyRate {
            date: NaiveDate::from_ymd_opt(2021, 2, 28).unwrap(),
            rf_percent: 0.06,
        },
        MonthlyRate {
            date: NaiveDate::from_ymd_opt(2021, 1, 31).unwrap(),
            rf_percent: 0.05,
        },
    ];
    save_risk_free(&rates, &path).unwrap();

    let loaded = load_risk_free(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].date, NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
    assert_eq!(loaded[1].rf_percent, 0.06);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_write_premia_results() {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let days: Vec<NaiveDate> = (0..30).map(|i| start + Days::new(i)).collect();
    let panel = DailyFactorPanel::from_rows(days.iter().enumerate().map(|(i, d)| {
        let x = i as f64;
        (
            *d,
            DailyFactors {
                mkt: (x * 0.7).sin() / 100.0,
                smb: (x * 1.3).cos() / 100.0,
                hml: (x * 0.4).sin() / 200.0,
                rf: 0.0,
            },
        )
    }));

    let mut returns = ReturnSeries::new();
    for k in 0..6 {
        let x = k as f64;
        let b = [0.5 + 0.2 * x, 1.0 - 0.05 * x * x, x.sin()];
        let series = panel
            .iter()
            .enumerate()
            .map(|(i, (d, f))| {
                let wobble = ((i * (k + 3)) as f64).sin() / 10_000.0;
                (d, b[0] * f.mkt + b[1] * f.smb + b[2] * f.hml + wobble)
            })
            .collect();
        returns.insert(SecurityId::new(format!("{:06}", 300_000 + k), "01W"), series);
    }

    let estimator = FamaMacBeth::new(FamaMacBethConfig {
        min_observations: 20,
        min_cross_section: 5,
        ..Default::default()
    });
    let result = estimator.run(&returns, &panel).unwrap();

    let dir = std::env::temp_dir().join("busan_output_premia");
    let artifacts = write_premia(&result, start, days[days.len() - 1], &dir).unwrap();

    let betas = std::fs::read_to_string(&artifacts.betas).unwrap();
    assert_eq!(betas.lines().count(), 7);
    let gammas = std::fs::read_to_string(&artifacts.gammas).unwrap();
    assert!(gammas.starts_with("date,gamma_0,gamma_market,gamma_smb,gamma_hml,securities"));
    assert_eq!(gammas.lines().count(), 31);
    let summary = std::fs::read_to_string(&artifacts.summary).unwrap();
    assert!(summary.contains("Value (HML)"));

    std::fs::remove_dir_all(dir).ok();
}
