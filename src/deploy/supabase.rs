use super::{DeployError, SqlExecutor};
use crate::config::SupabaseConfig;
use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use serde_json::{json, Value};

/// Runs statements through the project's `execute_sql` RPC function
pub struct SupabaseExecutor {
    endpoint: String,
    anon_key: String,
    access_token: String,
    client: Client,
}

impl SupabaseExecutor {
    /// Validate credentials; no request is made here
    pub fn new(config: &SupabaseConfig) -> Result<Self, DeployError> {
        let url = non_empty(&config.url)
            .ok_or_else(|| DeployError::MissingCredentials("SUPABASE_URL".to_string()))?;
        let anon_key = non_empty(&config.anon_key)
            .ok_or_else(|| DeployError::MissingCredentials("SUPABASE_ANON_KEY".to_string()))?;
        let access_token = non_empty(&config.access_token).ok_or(DeployError::NoSession)?;

        let client = Client::builder()
            .build()
            .map_err(|e| DeployError::Backend(e.to_string()))?;

        Ok(Self {
            endpoint: format!("{}/rest/v1/rpc/execute_sql", url.trim_end_matches('/')),
            anon_key: anon_key.to_string(),
            access_token: access_token.to_string(),
            client,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SqlExecutor for SupabaseExecutor {
    fn describe(&self) -> String {
        format!("Supabase RPC {}", self.endpoint)
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .json(&json!({ "sql_command": statement }))
            .send()
            .map_err(|e| anyhow!("failed to reach Supabase at {}: {}", self.endpoint, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().unwrap_or_default();
        // PostgREST errors carry a `message` field
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(text);
        Err(anyhow!("HTTP {}: {}", status.as_u16(), message))
    }
}
