//! Korean risk-free rates from the Bank of Korea ECOS statistics API.
//!
//! The risk-free proxy is the 1-year Korea Treasury bond yield. Daily
//! annualized yields are averaged per month and divided by 12.
//!
//! # Example
//!
//! ```no_run
//! use busan_data::ecos::{EcosClient, monthly_risk_free};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EcosClient::new(std::env::var("ECOS_API_KEY")?)?;
//!     let start = NaiveDate::from_ymd_opt(2020, 10, 1).unwrap();
//!     let end = NaiveDate::from_ymd_opt(2021, 9, 30).unwrap();
//!     let daily = client.fetch_treasury_1y(start, end).await?;
//!     for rate in monthly_risk_free(&daily) {
//!         println!("{} {:.4}", rate.date, rate.rf_percent);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod rates;

pub use client::EcosClient;
pub use rates::{DailyRate, MonthlyRate, monthly_risk_free};
