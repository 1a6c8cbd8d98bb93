use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use shiftgrid_core::{DerivedCounters, ScheduleGrid, ScheduleMode, Scope, ShiftValue};

use crate::error::RemoteError;
use crate::{MonthOption, RemoteScheduleStore, wire};

const PLACEHOLDER: &str = "YOUR_DEPLOYMENT_ID";

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub api_url: String,
    pub timeout: Duration,
    /// Extra attempts for read actions after a network failure. Writes are
    /// never retried.
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            timeout: Duration::from_secs(30),
            retry_attempts: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Client for the action-style backend: reads are `GET ?action=...`, writes
/// are `POST` with a JSON body carrying the action name.
#[derive(Clone)]
pub struct HttpScheduleStore {
    http: reqwest::Client,
    options: HttpOptions,
}

impl HttpScheduleStore {
    pub fn new(options: HttpOptions) -> Result<Self, RemoteError> {
        let url = options.api_url.trim();
        if url.is_empty() || url.contains(PLACEHOLDER) {
            return Err(RemoteError::Unconfigured(
                "API URL is empty or still the deployment placeholder".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .user_agent(format!("shiftgrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .build()
            .map_err(|e| RemoteError::Unconfigured(e.to_string()))?;

        Ok(Self { http, options })
    }

    async fn get_once(&self, action: &str, params: &[(&str, String)]) -> Result<Value, RemoteError> {
        let mut query: Vec<(&str, &str)> = vec![("action", action)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));

        let resp = self
            .http
            .get(&self.options.api_url)
            .query(&query)
            .send()
            .await?;
        Self::read_json(action, resp).await
    }

    async fn get(&self, action: &str, params: &[(&str, String)]) -> Result<Value, RemoteError> {
        let mut attempt = 0;
        loop {
            match self.get_once(action, params).await {
                Err(RemoteError::Network(msg)) if attempt < self.options.retry_attempts => {
                    attempt += 1;
                    tracing::warn!(action, attempt, error = %msg, "read failed, retrying");
                    tokio::time::sleep(self.options.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    async fn post(&self, action: &str, mut body: Value) -> Result<Value, RemoteError> {
        if let Value::Object(map) = &mut body {
            map.insert("action".to_string(), Value::String(action.to_string()));
        }
        let resp = self
            .http
            .post(&self.options.api_url)
            .json(&body)
            .send()
            .await?;
        Self::read_json(action, resp).await
    }

    async fn read_json(action: &str, resp: reqwest::Response) -> Result<Value, RemoteError> {
        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(action, status = status.as_u16(), "backend returned error status");
            return Err(RemoteError::Network(format!("HTTP {}", status.as_u16())));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| RemoteError::Network(format!("invalid {action} response: {e}")))
    }

    fn scope_params(scope: &Scope) -> Vec<(&'static str, String)> {
        vec![
            ("mode", scope.mode.as_str().to_string()),
            ("bulan", scope.month.to_string()),
            ("unit", scope.unit.clone()),
        ]
    }

    fn scope_body(scope: &Scope) -> Value {
        json!({
            "mode": scope.mode.as_str(),
            "bulan": scope.month,
            "unit": scope.unit,
        })
    }
}

fn extend(mut body: Value, extra: Value) -> Value {
    if let (Value::Object(base), Value::Object(extra)) = (&mut body, extra) {
        base.extend(extra);
    }
    body
}

#[async_trait]
impl RemoteScheduleStore for HttpScheduleStore {
    async fn list_months(&self, mode: ScheduleMode) -> Result<Vec<MonthOption>, RemoteError> {
        let value = self
            .get("getAvailableMonths", &[("mode", mode.as_str().to_string())])
            .await?;
        wire::parse_months(value)
    }

    async fn list_units(&self) -> Result<Vec<String>, RemoteError> {
        let value = self.get("getUnits", &[]).await?;
        wire::parse_units(value)
    }

    async fn fetch_grid(&self, scope: &Scope) -> Result<ScheduleGrid, RemoteError> {
        let value = self.get("getJadwal", &Self::scope_params(scope)).await?;
        wire::parse_grid(value)
    }

    async fn fetch_derived_counters(
        &self,
        scope: &Scope,
    ) -> Result<BTreeMap<usize, DerivedCounters>, RemoteError> {
        let value = self.get("getHariKerja", &Self::scope_params(scope)).await?;
        wire::parse_counters(value)
    }

    async fn save_cell(
        &self,
        scope: &Scope,
        row: usize,
        day: usize,
        value: &ShiftValue,
    ) -> Result<(), RemoteError> {
        let body = extend(
            Self::scope_body(scope),
            json!({ "pIdx": row, "jIdx": day, "value": value.as_str() }),
        );
        let resp = self.post("saveSingleCell", body).await?;
        wire::parse_ack(resp)
    }

    async fn save_grid(&self, scope: &Scope, rows: &[Vec<ShiftValue>]) -> Result<(), RemoteError> {
        let data: Vec<Value> = rows
            .iter()
            .map(|days| json!({ "jadwal": days.iter().map(ShiftValue::as_str).collect::<Vec<_>>() }))
            .collect();
        let body = extend(Self::scope_body(scope), json!({ "jadwalData": data }));
        let resp = self.post("saveJadwal", body).await?;
        wire::parse_ack(resp)
    }

    async fn rename_row(
        &self,
        scope: &Scope,
        row: usize,
        new_name: &str,
    ) -> Result<(), RemoteError> {
        let body = extend(
            Self::scope_body(scope),
            json!({ "personilIndex": row, "newNama": new_name }),
        );
        let resp = self.post("updatePersonilNama", body).await?;
        wire::parse_ack(resp)
    }

    async fn swap_rows(&self, scope: &Scope, from: usize, to: usize) -> Result<(), RemoteError> {
        let body = extend(
            Self::scope_body(scope),
            json!({ "fromIndex": from, "toIndex": to }),
        );
        let resp = self.post("swapPersonilPosition", body).await?;
        wire::parse_ack(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn store(server: &MockServer, retry_attempts: u32) -> Result<HttpScheduleStore, RemoteError> {
        HttpScheduleStore::new(HttpOptions {
            api_url: server.url("/exec"),
            timeout: Duration::from_secs(5),
            retry_attempts,
            retry_delay: Duration::from_millis(10),
        })
    }

    fn scope() -> Scope {
        Scope::new(ScheduleMode::Execution, 3, "GUDANG")
    }

    #[test]
    fn placeholder_url_is_rejected() {
        let result = HttpScheduleStore::new(HttpOptions {
            api_url: "https://script.google.com/macros/s/YOUR_DEPLOYMENT_ID/exec".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(RemoteError::Unconfigured(_))));
        assert!(HttpScheduleStore::new(HttpOptions::default()).is_err());
    }

    #[tokio::test]
    async fn fetch_grid_sends_scope_as_query() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/exec")
                    .query_param("action", "getJadwal")
                    .query_param("mode", "PEL")
                    .query_param("bulan", "3")
                    .query_param("unit", "GUDANG");
                then.status(200).json_body(serde_json::json!({
                    "judul": "JADWAL",
                    "unitName": "GUDANG",
                    "headerHari": ["SEN"],
                    "headerTanggal": ["1"],
                    "personil": [{"no": 1, "nama": "Ani", "jadwal": ["P"]}]
                }));
            })
            .await;

        let grid = store(&server, 0)?.fetch_grid(&scope()).await?;
        mock.assert_async().await;
        assert_eq!(grid.rows[0].name, "Ani");
        assert_eq!(grid.rows[0].days, vec![ShiftValue::from("P")]);
        Ok(())
    }

    #[tokio::test]
    async fn save_cell_posts_action_body() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/exec").json_body(serde_json::json!({
                    "action": "saveSingleCell",
                    "mode": "PEL",
                    "bulan": 3,
                    "unit": "GUDANG",
                    "pIdx": 1,
                    "jIdx": 4,
                    "value": "SM"
                }));
                then.status(200).json_body(serde_json::json!({"success": true}));
            })
            .await;

        store(&server, 0)?
            .save_cell(&scope(), 1, 4, &ShiftValue::from("SM"))
            .await?;
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn save_grid_sends_every_row() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/exec").json_body(serde_json::json!({
                    "action": "saveJadwal",
                    "mode": "PEL",
                    "bulan": 3,
                    "unit": "GUDANG",
                    "jadwalData": [{"jadwal": ["P", "S"]}, {"jadwal": ["M", ""]}]
                }));
                then.status(200).json_body(serde_json::json!({"success": true}));
            })
            .await;

        let rows = vec![
            vec![ShiftValue::from("P"), ShiftValue::from("S")],
            vec![ShiftValue::from("M"), ShiftValue::Empty],
        ];
        store(&server, 0)?.save_grid(&scope(), &rows).await?;
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn rejected_rename_is_application_error() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/exec");
                then.status(200)
                    .json_body(serde_json::json!({"success": false, "message": "Nama sudah dipakai"}));
            })
            .await;

        let err = store(&server, 0)?
            .rename_row(&scope(), 0, "Budi")
            .await
            .err()
            .ok_or("rename should fail")?;
        assert!(matches!(err, RemoteError::Application { ref message } if message == "Nama sudah dipakai"));
        Ok(())
    }

    #[tokio::test]
    async fn reads_retry_on_server_error_writes_do_not() -> Result<(), Box<dyn std::error::Error>> {
        let server = MockServer::start_async().await;
        let units = server
            .mock_async(|when, then| {
                when.method(GET).path("/exec").query_param("action", "getUnits");
                then.status(503);
            })
            .await;
        let save = server
            .mock_async(|when, then| {
                when.method(POST).path("/exec");
                then.status(503);
            })
            .await;

        let store = store(&server, 2)?;
        assert!(store.list_units().await.is_err_and(|e| e.is_network()));
        units.assert_hits_async(3).await;

        assert!(store
            .save_cell(&scope(), 0, 0, &ShiftValue::from("P"))
            .await
            .is_err_and(|e| e.is_network()));
        save.assert_hits_async(1).await;
        Ok(())
    }
}
