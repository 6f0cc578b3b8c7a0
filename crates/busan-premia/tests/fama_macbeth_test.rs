//! Fama-MacBeth estimation on synthetic panels with known loadings

use approx::assert_abs_diff_eq;
use busan_data::SecurityId;
use busan_factors::{FactorHistory, MonthlyFactorRecord};
use busan_premia::{
    DailyFactorPanel, DailyFactors, FamaMacBeth, FamaMacBethConfig, PremiaError, PricedFactor,
    ReturnSeries,
};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

const DAYS: usize = 250;
const SECURITIES: usize = 40;

struct Synthetic {
    panel: DailyFactorPanel,
    returns: ReturnSeries,
    loadings: BTreeMap<SecurityId, [f64; 3]>,
}

fn trading_days(n: usize) -> Vec<NaiveDate> {
    let mut day = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day = day + Days::new(1);
    }
    out
}

fn synthetic(seed: u64, securities: usize) -> Synthetic {
    let mut rng = StdRng::seed_from_u64(seed);
    let days = trading_days(DAYS);

    let panel = DailyFactorPanel::from_rows(days.iter().map(|d| {
        (
            *d,
            DailyFactors {
                mkt: rng.gen_range(-0.01..0.012),
                smb: rng.gen_range(-0.008..0.008),
                hml: rng.gen_range(-0.006..0.007),
                rf: 0.00004,
            },
        )
    }));

    let mut returns = ReturnSeries::new();
    let mut loadings = BTreeMap::new();
    for i in 0..securities {
        let id = SecurityId::new(format!("{:06}", 200_000 + i), "01W");
        let beta = [
            rng.gen_range(0.5..1.5),
            rng.gen_range(-0.5..1.0),
            rng.gen_range(-0.5..0.8),
        ];
        let series = panel
            .iter()
            .map(|(date, f)| {
                let noise: f64 = rng.gen_range(-0.0005..0.0005);
                let r = f.rf + beta[0] * f.mkt + beta[1] * f.smb + beta[2] * f.hml + noise;
                (date, r)
            })
            .collect();
        returns.insert(id.clone(), series);
        loadings.insert(id, beta);
    }

    Synthetic {
        panel,
        returns,
        loadings,
    }
}

#[test]
fn test_recovers_loadings() {
    let data = synthetic(7, SECURITIES);
    let betas = FamaMacBeth::default().estimate_betas(&data.returns, &data.panel);

    assert_eq!(betas.len(), SECURITIES);
    for beta in &betas {
        let truth = data.loadings[&beta.id];
        assert_abs_diff_eq!(beta.beta_market, truth[0], epsilon = 0.02);
        assert_abs_diff_eq!(beta.beta_smb, truth[1], epsilon = 0.02);
        assert_abs_diff_eq!(beta.beta_hml, truth[2], epsilon = 0.02);
        assert_abs_diff_eq!(beta.alpha, 0.0, epsilon = 1e-3);
        assert!(beta.r_squared > 0.9);
        assert_eq!(beta.observations, DAYS);
    }
}

#[test]
fn test_premia_track_realized_factors() {
    let data = synthetic(11, SECURITIES);
    let result = FamaMacBeth::default().run(&data.returns, &data.panel).unwrap();

    assert_eq!(result.gammas.len(), DAYS);
    assert!(result.gammas.iter().all(|g| g.securities == SECURITIES));
    assert_eq!(result.premia.len(), 3);

    let realized = |pick: fn(&DailyFactors) -> f64| {
        data.panel.iter().map(|(_, f)| pick(f)).sum::<f64>() / data.panel.len() as f64
    };
    let expected = [
        realized(|f| f.mkt),
        realized(|f| f.smb),
        realized(|f| f.hml),
    ];

    for (premium, mean) in result.premia.iter().zip(expected) {
        assert_abs_diff_eq!(premium.mean, mean, epsilon = 5e-4);
        assert_abs_diff_eq!(premium.annualized, premium.mean * 252.0, epsilon = 1e-12);
        assert!(premium.test.p_value >= 0.0 && premium.test.p_value <= 1.0);
        assert_eq!(premium.test.n, DAYS);
    }
    assert_eq!(result.premia[0].factor, PricedFactor::Market);
}

#[test]
fn test_short_history_excluded() {
    let mut data = synthetic(3, SECURITIES);
    let (short_id, series) = data.returns.iter_mut().next().unwrap();
    let short_id = short_id.clone();
    series.truncate(50);

    let betas = FamaMacBeth::default().estimate_betas(&data.returns, &data.panel);
    assert_eq!(betas.len(), SECURITIES - 1);
    assert!(betas.iter().all(|b| b.id != short_id));
}

#[test]
fn test_thin_cross_section_rejected() {
    let data = synthetic(5, 9);
    let result = FamaMacBeth::default().run(&data.returns, &data.panel);
    assert!(matches!(
        result,
        Err(PremiaError::InsufficientData { actual: 0, .. })
    ));

    let relaxed = FamaMacBeth::new(FamaMacBethConfig {
        min_cross_section: 9,
        ..Default::default()
    });
    assert!(relaxed.run(&data.returns, &data.panel).is_ok());
}

#[test]
fn test_panel_from_monthly_history() {
    let history: FactorHistory = [(1, 2.1, 0.42, -0.21), (2, -4.2, 0.0, 1.05)]
        .into_iter()
        .map(|(m, mkt, smb, hml)| MonthlyFactorRecord {
            date: NaiveDate::from_ymd_opt(2021, m + 1, 1).unwrap().pred_opt().unwrap(),
            mkt,
            smb,
            hml,
            rf: 0.0525,
        })
        .collect();

    let days = trading_days(60);
    let panel = DailyFactorPanel::from_monthly(&history, days.iter().copied());

    let in_history = days.iter().filter(|d| d.month() <= 2).count();
    assert_eq!(panel.len(), in_history);

    let jan = panel.get(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()).unwrap();
    assert_abs_diff_eq!(jan.mkt, 0.001, epsilon = 1e-15);
    assert_abs_diff_eq!(jan.rf, 0.000025, epsilon = 1e-15);
    let feb = panel.get(NaiveDate::from_ymd_opt(2021, 2, 1).unwrap()).unwrap();
    assert_abs_diff_eq!(feb.mkt, -0.002, epsilon = 1e-15);
    assert_abs_diff_eq!(feb.hml, 0.0005, epsilon = 1e-15);
}

#[test]
fn test_empty_inputs() {
    let result = FamaMacBeth::default().run(&ReturnSeries::new(), &DailyFactorPanel::default());
    assert!(matches!(result, Err(PremiaError::EmptyData)));
}
