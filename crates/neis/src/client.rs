// ABOUTME: The NeisClient for the open.neis.go.kr hub endpoints.
// ABOUTME: Handles the [head, {row}] envelope, the INFO-200 no-data code, and paging params.

use chrono::NaiveDate;

use crate::error::NeisError;
use crate::meal::MealDay;
use crate::schedule::{month_range, ScheduleEvent};

/// Production API root.
pub const NEIS_BASE_URL: &str = "https://open.neis.go.kr/hub";

/// The API's "no data found" code; not an error, just an empty month.
const NO_DATA_CODE: &str = "INFO-200";

/// Client for one school's NEIS data.
#[derive(Debug, Clone)]
pub struct NeisClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Education-office code, e.g. "J10" for Gyeonggi-do.
    office_code: String,
    school_code: String,
}

/// Builder for [`NeisClient`].
#[derive(Debug, Clone, Default)]
pub struct NeisClientBuilder {
    base_url: Option<String>,
    api_key: String,
    office_code: String,
    school_code: String,
    http: Option<reqwest::Client>,
}

impl NeisClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn office_code(mut self, code: impl Into<String>) -> Self {
        self.office_code = code.into();
        self
    }

    pub fn school_code(mut self, code: impl Into<String>) -> Self {
        self.school_code = code.into();
        self
    }

    /// Override the API root (tests point this at a local mock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn build(self) -> NeisClient {
        NeisClient {
            http: self.http.unwrap_or_default(),
            base_url: self.base_url.unwrap_or_else(|| NEIS_BASE_URL.to_string()),
            api_key: self.api_key,
            office_code: self.office_code,
            school_code: self.school_code,
        }
    }
}

impl NeisClient {
    pub fn builder() -> NeisClientBuilder {
        NeisClientBuilder::default()
    }

    /// Fetches meal service rows for an inclusive date range.
    pub async fn meals(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<MealDay>, NeisError> {
        let rows = self
            .get_rows(
                "mealServiceDietInfo",
                &[
                    ("MLSV_FROM_YMD", from.format("%Y%m%d").to_string()),
                    ("MLSV_TO_YMD", to.format("%Y%m%d").to_string()),
                ],
            )
            .await?;

        rows.iter().map(MealDay::from_row).collect()
    }

    /// Fetches the academic calendar for one month.
    pub async fn monthly_schedule(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<ScheduleEvent>, NeisError> {
        let (from, to) = month_range(year, month)
            .ok_or_else(|| NeisError::envelope(format!("invalid month {}-{}", year, month)))?;

        let rows = self
            .get_rows(
                "SchoolSchedule",
                &[
                    ("AA_FROM_YMD", from.format("%Y%m%d").to_string()),
                    ("AA_TO_YMD", to.format("%Y%m%d").to_string()),
                    ("pIndex", "1".to_string()),
                    ("pSize", "100".to_string()),
                ],
            )
            .await?;

        rows.iter().map(ScheduleEvent::from_row).collect()
    }

    /// Runs one hub query and unwraps the `[{head}, {row}]` envelope.
    ///
    /// A missing top-level key with an INFO-200 result means "no rows";
    /// any other result code is surfaced as an API error.
    async fn get_rows(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<serde_json::Value>, NeisError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query: Vec<(&str, String)> = vec![
            ("KEY", self.api_key.clone()),
            ("Type", "json".to_string()),
            ("ATPT_OFCDC_SC_CODE", self.office_code.clone()),
            ("SD_SCHUL_CODE", self.school_code.clone()),
        ];
        query.extend(params.iter().map(|(k, v)| (*k, v.clone())));

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(NeisError::http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NeisError::Http(format!("HTTP status {}", status.as_u16())));
        }

        let data: serde_json::Value = response.json().await.map_err(NeisError::http)?;

        let envelope = match data.get(endpoint) {
            Some(envelope) => envelope,
            None => {
                // The hub omits the endpoint key entirely when there is
                // nothing to return, putting a RESULT block in its place.
                if let Some(result) = data.get("RESULT") {
                    let code = result
                        .get("CODE")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    if code == NO_DATA_CODE {
                        tracing::debug!(endpoint, "no rows for query");
                        return Ok(Vec::new());
                    }
                    return Err(NeisError::Api {
                        code: code.to_string(),
                        message: result
                            .get("MESSAGE")
                            .and_then(|v| v.as_str())
                            .unwrap_or_default()
                            .to_string(),
                    });
                }
                return Err(NeisError::envelope(format!("missing {} key", endpoint)));
            }
        };

        let rows = envelope
            .as_array()
            .and_then(|parts| parts.get(1))
            .and_then(|part| part.get("row"))
            .and_then(|rows| rows.as_array())
            .ok_or_else(|| NeisError::envelope("missing row array"))?;

        Ok(rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    fn client_for(server: &MockServer) -> NeisClient {
        NeisClient::builder()
            .base_url(server.base_url())
            .api_key("test-key")
            .office_code("J10")
            .school_code("7569032")
            .build()
    }

    #[tokio::test]
    async fn meals_parse_the_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/mealServiceDietInfo")
                .query_param("KEY", "test-key")
                .query_param("Type", "json")
                .query_param("ATPT_OFCDC_SC_CODE", "J10")
                .query_param("SD_SCHUL_CODE", "7569032")
                .query_param("MLSV_FROM_YMD", "20250714")
                .query_param("MLSV_TO_YMD", "20250718");
            then.status(200).json_body(serde_json::json!({
                "mealServiceDietInfo": [
                    { "head": [{ "list_total_count": 1 }] },
                    { "row": [{
                        "MLSV_YMD": "20250714",
                        "MMEAL_SC_NM": "중식",
                        "DDISH_NM": "백미밥<br/>미역국(5)(6)"
                    }] }
                ]
            }));
        });

        let client = client_for(&server);
        let days = client
            .meals(
                NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            )
            .await
            .unwrap();
        mock.assert();

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].meal_name, "중식");
        assert_eq!(days[0].dishes[1].allergens, vec![5, 6]);
    }

    #[tokio::test]
    async fn no_data_code_means_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/SchoolSchedule");
            then.status(200).json_body(serde_json::json!({
                "RESULT": { "CODE": "INFO-200", "MESSAGE": "해당하는 데이터가 없습니다." }
            }));
        });

        let client = client_for(&server);
        let events = client.monthly_schedule(2025, 8).await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn api_error_code_is_typed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/SchoolSchedule");
            then.status(200).json_body(serde_json::json!({
                "RESULT": { "CODE": "INFO-300", "MESSAGE": "인증키가 유효하지 않습니다." }
            }));
        });

        let client = client_for(&server);
        let err = client.monthly_schedule(2025, 8).await.unwrap_err();
        match err {
            NeisError::Api { code, .. } => assert_eq!(code, "INFO-300"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_failure_is_typed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/mealServiceDietInfo");
            then.status(503).body("maintenance");
        });

        let client = client_for(&server);
        let err = client
            .meals(
                NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NeisError::Http(_)));
    }

    #[tokio::test]
    async fn malformed_envelope_is_typed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/mealServiceDietInfo");
            then.status(200).json_body(serde_json::json!({
                "mealServiceDietInfo": "surprise"
            }));
        });

        let client = client_for(&server);
        let err = client
            .meals(
                NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
                NaiveDate::from_ymd_opt(2025, 7, 18).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NeisError::Envelope(_)));
    }
}
