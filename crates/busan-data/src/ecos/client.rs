//! Bank of Korea ECOS statistics API client.

use super::rates::DailyRate;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// ECOS API base URL
const ECOS_BASE_URL: &str = "https://ecos.bok.or.kr/api";

/// Treasury bond yield statistics table
const TREASURY_STAT_CODE: &str = "817Y002";

/// 1-year Korea Treasury bond item within the table
const TREASURY_1Y_ITEM_CODE: &str = "010190000";

/// Maximum rows returned by a single request
const MAX_ROWS: u32 = 10_000;

const USER_AGENT: &str = "Busan-FactorEngine/0.1";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "StatisticSearch")]
    statistic_search: Option<StatisticSearch>,
    #[serde(rename = "RESULT")]
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct StatisticSearch {
    #[serde(default)]
    row: Vec<StatisticRow>,
}

#[derive(Debug, Deserialize)]
struct StatisticRow {
    #[serde(rename = "TIME")]
    time: String,
    #[serde(rename = "DATA_VALUE")]
    data_value: String,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(rename = "CODE")]
    code: String,
    #[serde(rename = "MESSAGE")]
    message: String,
}

/// Client for the ECOS `StatisticSearch` endpoint.
#[derive(Debug, Clone)]
pub struct EcosClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl EcosClient {
    /// Create a client for the given API key.
    ///
    /// # Errors
    /// Returns `DataError::Config` if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DataError::Config(
                "ECOS API key is empty; request one at https://ecos.bok.or.kr/api/".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url: ECOS_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn treasury_url(&self, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/StatisticSearch/{}/json/kr/1/{}/{}/D/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_key,
            MAX_ROWS,
            TREASURY_STAT_CODE,
            start.format("%Y%m%d"),
            end.format("%Y%m%d"),
            TREASURY_1Y_ITEM_CODE
        )
    }

    /// Fetch daily 1-year Korea Treasury yields (annual percent) between
    /// `start` and `end` inclusive, sorted by date.
    ///
    /// # Example
    /// ```no_run
    /// use busan_data::ecos::EcosClient;
    /// use chrono::NaiveDate;
    ///
    /// # async fn example() -> busan_data::Result<()> {
    /// let client = EcosClient::new("MY_KEY")?;
    /// let start = NaiveDate::from_ymd_opt(2020, 10, 1).unwrap();
    /// let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
    /// let rates = client.fetch_treasury_1y(start, end).await?;
    /// println!("{} daily observations", rates.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_treasury_1y(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyRate>> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        tracing::info!(%start, %end, "fetching 1-year treasury yields from ECOS");

        let response = self
            .client
            .get(self.treasury_url(start, end))
            .send()
            .await
            .map_err(DataError::Network)?;

        if !response.status().is_success() {
            return Err(DataError::Http(format!(
                "ECOS request failed: HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(DataError::Network)?;
        let rates = parse_search_response(&body)?;

        tracing::info!(observations = rates.len(), "retrieved daily treasury yields");
        Ok(rates)
    }
}

/// Parse a `StatisticSearch` JSON payload into daily rates.
///
/// Payloads without a `StatisticSearch` object are API errors (bad key, no
/// data, quota).
pub(crate) fn parse_search_response(body: &str) -> Result<Vec<DailyRate>> {
    let response: SearchResponse = serde_json::from_str(body)?;

    let Some(search) = response.statistic_search else {
        let detail = response
            .result
            .map(|r| format!("{}: {}", r.code, r.message))
            .unwrap_or_else(|| "response has no StatisticSearch payload".to_string());
        return Err(DataError::EcosApi(detail));
    };

    let mut rates = Vec::with_capacity(search.row.len());
    for row in search.row {
        let date = NaiveDate::parse_from_str(&row.time, "%Y%m%d")
            .map_err(|e| DataError::Parse(format!("Invalid ECOS date '{}': {}", row.time, e)))?;
        let annual_percent: f64 = row.data_value.trim().parse().map_err(|e| {
            DataError::Parse(format!("Invalid ECOS value '{}': {}", row.data_value, e))
        })?;
        rates.push(DailyRate {
            date,
            annual_percent,
        });
    }

    rates.sort_by_key(|r| r.date);
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(EcosClient::new("  "), Err(DataError::Config(_))));
    }

    #[test]
    fn test_treasury_url() {
        let client = EcosClient::new("KEY").unwrap();
        let url = client.treasury_url(
            NaiveDate::from_ymd_opt(2020, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 10, 31).unwrap(),
        );
        assert_eq!(
            url,
            "https://ecos.bok.or.kr/api/StatisticSearch/KEY/json/kr/1/10000/817Y002/D/20201001/20201031/010190000"
        );
    }

    #[test]
    fn test_base_url_override() {
        let client = EcosClient::new("KEY").unwrap().with_base_url("http://127.0.0.1:8080/api/");
        let day = NaiveDate::from_ymd_opt(2021, 3, 2).unwrap();
        assert_eq!(
            client.treasury_url(day, day),
            "http://127.0.0.1:8080/api/StatisticSearch/KEY/json/kr/1/10000/817Y002/D/20210302/20210302/010190000"
        );
    }

    #[test]
    fn test_parse_rows_sorted() {
        let body = r#"{"StatisticSearch":{"list_total_count":2,"row":[
            {"STAT_CODE":"817Y002","TIME":"20201005","DATA_VALUE":"0.650"},
            {"STAT_CODE":"817Y002","TIME":"20201002","DATA_VALUE":"0.640"}
        ]}}"#;
        let rates = parse_search_response(body).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].date, NaiveDate::from_ymd_opt(2020, 10, 2).unwrap());
        assert_eq!(rates[0].annual_percent, 0.64);
    }

    #[test]
    fn test_parse_api_error() {
        let body = r#"{"RESULT":{"CODE":"INFO-100","MESSAGE":"인증키가 유효하지 않습니다."}}"#;
        let err = parse_search_response(body).unwrap_err();
        match err {
            DataError::EcosApi(msg) => assert!(msg.starts_with("INFO-100")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_bad_value() {
        let body = r#"{"StatisticSearch":{"row":[{"TIME":"20201005","DATA_VALUE":"n/a"}]}}"#;
        assert!(matches!(
            parse_search_response(body),
            Err(DataError::Parse(_))
        ));
    }
}
