use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

const ARM_RESOURCE: &str = "https://management.azure.com/";
const ARM_SCOPE: &str = "https://management.azure.com/.default";
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/";
const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const JWT_BEARER: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

// tokens are refreshed this long before they expire
const REFRESH_MARGIN_SECS: i64 = 300;

/// One way of obtaining an ARM access token.
#[derive(Debug)]
enum CredentialSource {
    ClientSecret {
        authority: String,
        tenant_id: String,
        client_id: String,
        client_secret: SecretString,
    },
    WorkloadIdentity {
        authority: String,
        tenant_id: String,
        client_id: String,
        token_file: PathBuf,
    },
    AppServiceIdentity {
        endpoint: String,
        header: SecretString,
        client_id: Option<String>,
    },
    Imds {
        client_id: Option<String>,
    },
    AzureCli,
}

impl CredentialSource {
    fn name(&self) -> &'static str {
        match self {
            CredentialSource::ClientSecret { .. } => "client secret",
            CredentialSource::WorkloadIdentity { .. } => "workload identity",
            CredentialSource::AppServiceIdentity { .. } => "managed identity (app service)",
            CredentialSource::Imds { .. } => "managed identity (imds)",
            CredentialSource::AzureCli => "azure cli",
        }
    }
}

#[derive(Debug)]
struct AccessToken {
    token: SecretString,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_on - chrono::Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
    #[serde(default)]
    expires_on: Option<Value>,
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        let now = Utc::now();
        let expires_on = self
            .expires_on
            .as_ref()
            .and_then(value_as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .or_else(|| {
                self.expires_in
                    .as_ref()
                    .and_then(value_as_i64)
                    .map(|secs| now + chrono::Duration::seconds(secs))
            })
            .unwrap_or_else(|| now + chrono::Duration::seconds(REFRESH_MARGIN_SECS));
        AccessToken {
            token: SecretString::from(self.access_token),
            expires_on,
        }
    }
}

// `az account get-access-token` output
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<i64>,
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Credential chain for Azure Resource Manager, tried in order: client secret,
/// workload identity, managed identity, Azure CLI. The first source that
/// returns a token is kept for later calls.
#[derive(Debug)]
pub struct AzureCredential {
    http: reqwest::Client,
    sources: Vec<CredentialSource>,
    state: Mutex<CredentialState>,
}

#[derive(Debug, Default)]
struct CredentialState {
    selected: Option<usize>,
    token: Option<AccessToken>,
}

impl AzureCredential {
    /// Build the chain from the standard `AZURE_*` / `IDENTITY_*` variables.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let authority = var("AZURE_AUTHORITY_HOST").unwrap_or_else(|| DEFAULT_AUTHORITY.to_string());
        let tenant_id = var("AZURE_TENANT_ID");
        let client_id = var("AZURE_CLIENT_ID");

        let mut sources = Vec::new();
        if let (Some(tenant_id), Some(client_id), Some(secret)) =
            (&tenant_id, &client_id, var("AZURE_CLIENT_SECRET"))
        {
            sources.push(CredentialSource::ClientSecret {
                authority: authority.clone(),
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                client_secret: SecretString::from(secret),
            });
        }
        if let (Some(tenant_id), Some(client_id), Some(file)) =
            (&tenant_id, &client_id, var("AZURE_FEDERATED_TOKEN_FILE"))
        {
            sources.push(CredentialSource::WorkloadIdentity {
                authority: authority.clone(),
                tenant_id: tenant_id.clone(),
                client_id: client_id.clone(),
                token_file: PathBuf::from(file),
            });
        }
        if let (Some(endpoint), Some(header)) = (var("IDENTITY_ENDPOINT"), var("IDENTITY_HEADER")) {
            sources.push(CredentialSource::AppServiceIdentity {
                endpoint,
                header: SecretString::from(header),
                client_id: client_id.clone(),
            });
        } else {
            sources.push(CredentialSource::Imds {
                client_id: client_id.clone(),
            });
        }
        sources.push(CredentialSource::AzureCli);

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            http,
            sources,
            state: Mutex::new(CredentialState::default()),
        })
    }

    /// Bearer token for management.azure.com, refreshed when close to expiry.
    pub async fn token(&self) -> Result<SecretString> {
        let mut state = self.state.lock().await;
        if let Some(token) = state.token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(SecretString::from(token.token.expose_secret().to_owned()));
        }

        let candidates: Vec<usize> = match state.selected {
            Some(index) => vec![index],
            None => (0..self.sources.len()).collect(),
        };

        let mut failures = Vec::new();
        for index in candidates {
            let source = &self.sources[index];
            match self.fetch(source).await {
                Ok(token) => {
                    if state.selected.is_none() {
                        tracing::debug!(source = source.name(), "Using Azure credential");
                    }
                    let secret = SecretString::from(token.token.expose_secret().to_owned());
                    state.selected = Some(index);
                    state.token = Some(token);
                    return Ok(secret);
                }
                Err(e) => {
                    tracing::debug!(source = source.name(), error = %e, "Azure credential unavailable");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }

        Err(anyhow!(
            "no Azure credential could provide a token ({})",
            failures.join("; ")
        ))
    }

    async fn fetch(&self, source: &CredentialSource) -> Result<AccessToken> {
        match source {
            CredentialSource::ClientSecret {
                authority,
                tenant_id,
                client_id,
                client_secret,
            } => {
                let form = [
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.expose_secret()),
                    ("scope", ARM_SCOPE),
                ];
                self.request_token(authority, tenant_id, &form).await
            }
            CredentialSource::WorkloadIdentity {
                authority,
                tenant_id,
                client_id,
                token_file,
            } => {
                let assertion = tokio::fs::read_to_string(token_file)
                    .await
                    .with_context(|| format!("failed to read {}", token_file.display()))?;
                let form = [
                    ("grant_type", "client_credentials"),
                    ("client_id", client_id.as_str()),
                    ("client_assertion_type", JWT_BEARER),
                    ("client_assertion", assertion.trim()),
                    ("scope", ARM_SCOPE),
                ];
                self.request_token(authority, tenant_id, &form).await
            }
            CredentialSource::AppServiceIdentity {
                endpoint,
                header,
                client_id,
            } => {
                let mut query = vec![("resource", ARM_RESOURCE), ("api-version", "2019-08-01")];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                let resp = self
                    .http
                    .get(endpoint)
                    .query(&query)
                    .header("X-IDENTITY-HEADER", header.expose_secret())
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<TokenResponse>()
                    .await?;
                Ok(resp.into_access_token())
            }
            CredentialSource::Imds { client_id } => {
                let mut query = vec![("resource", ARM_RESOURCE), ("api-version", "2018-02-01")];
                if let Some(client_id) = client_id {
                    query.push(("client_id", client_id.as_str()));
                }
                let resp = self
                    .http
                    .get(IMDS_ENDPOINT)
                    .query(&query)
                    .header("Metadata", "true")
                    .timeout(Duration::from_secs(2))
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<TokenResponse>()
                    .await?;
                Ok(resp.into_access_token())
            }
            CredentialSource::AzureCli => cli_token().await,
        }
    }

    async fn request_token(
        &self,
        authority: &str,
        tenant_id: &str,
        form: &[(&str, &str)],
    ) -> Result<AccessToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            authority.trim_end_matches('/'),
            tenant_id
        );
        let resp = self
            .http
            .post(url)
            .form(form)
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;
        Ok(resp.into_access_token())
    }
}

async fn cli_token() -> Result<AccessToken> {
    let output = tokio::process::Command::new("az")
        .args(["account", "get-access-token", "--resource", ARM_RESOURCE, "--output", "json"])
        .output()
        .await
        .context("failed to run az")?;
    if !output.status.success() {
        bail!(
            "az account get-access-token failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let token: CliToken =
        serde_json::from_slice(&output.stdout).context("failed to parse az output")?;
    Ok(cli_access_token(token))
}

fn cli_access_token(token: CliToken) -> AccessToken {
    let expires_on = token
        .expires_on_epoch
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .or_else(|| {
            // older CLIs only report local time
            let local = token.expires_on.as_deref()?;
            let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S%.f").ok()?;
            Local
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(REFRESH_MARGIN_SECS));
    AccessToken {
        token: SecretString::from(token.access_token),
        expires_on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expiry_from_expires_on() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"abc","expires_on":"4102444800","resource":"https://management.azure.com/"}"#,
        )
        .unwrap();
        let token = resp.into_access_token();
        assert_eq!(token.expires_on.timestamp(), 4102444800);
        assert!(token.is_fresh());
    }

    #[test]
    fn token_expiry_from_expires_in() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3599,"token_type":"Bearer"}"#)
                .unwrap();
        let token = resp.into_access_token();
        assert!(token.expires_on > Utc::now() + chrono::Duration::seconds(3500));
        assert_eq!(token.token.expose_secret(), "abc");
    }

    #[test]
    fn near_expiry_tokens_are_stale() {
        let token = AccessToken {
            token: SecretString::from("abc".to_string()),
            expires_on: Utc::now() + chrono::Duration::seconds(60),
        };
        assert!(!token.is_fresh());
    }

    #[test]
    fn cli_token_prefers_epoch() {
        let token: CliToken = serde_json::from_str(
            r#"{"accessToken":"abc","expiresOn":"2100-01-01 00:00:00.000000","expires_on":4102444800,"tokenType":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(cli_access_token(token).expires_on.timestamp(), 4102444800);

        let token: CliToken =
            serde_json::from_str(r#"{"accessToken":"abc","expiresOn":"2100-01-01 00:00:00.000000"}"#)
                .unwrap();
        assert!(cli_access_token(token).is_fresh());
    }
}
