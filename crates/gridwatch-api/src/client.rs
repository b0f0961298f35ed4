// Hand-crafted async HTTP client for the gridwatch fleet gateway.
//
// Base path: /v1/
// Auth: X-API-Token header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::types::{CounterRecord, DeviceRecord, InterfaceRecord, SettingRecord};

// ── Error response shape from the gateway ─────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the fleet gateway.
///
/// Cheap to clone — the underlying `reqwest::Client` is an `Arc` handle,
/// so poll tasks and the UI can share one instance.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GatewayClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and an API token.
    ///
    /// Injects `X-API-Token` as a default header on every request. The
    /// header value is marked sensitive so it never appears in logs.
    pub fn from_token(base_url: &str, token: &secrecy::SecretString) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token_value =
            HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid API token header value: {e}"),
            })?;
        token_value.set_sensitive(true);
        headers.insert("X-API-Token", token_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base URL ends with a single trailing slash so relative
    /// joins of `v1/…` paths behave.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/devices"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/`, so joining `v1/…` works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    async fn put_no_response<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = self.url(path);
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = &body[..body.len().min(200)];
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Error::Authentication {
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
            };
        }

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message)
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                }
            });

        Error::Gateway {
            status: status.as_u16(),
            message,
        }
    }

    // ── Device registry ──────────────────────────────────────────────

    /// List every managed device with identity, host/port, and online flag.
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        self.get("v1/devices").await
    }

    /// List the interfaces one device exposes.
    pub async fn list_interfaces(&self, device_id: &str) -> Result<Vec<InterfaceRecord>, Error> {
        self.get(&format!("v1/devices/{device_id}/interfaces")).await
    }

    // ── Counter fetch ────────────────────────────────────────────────

    /// Fetch current byte counters for a set of interfaces on one device.
    ///
    /// Interfaces the device does not know are silently absent from the
    /// response; callers must key the result by name, not by position.
    pub async fn fetch_counters(
        &self,
        device_id: &str,
        interfaces: &[String],
    ) -> Result<Vec<CounterRecord>, Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct CounterQuery<'a> {
            interfaces: &'a [String],
        }

        self.post(
            &format!("v1/devices/{device_id}/counters"),
            &CounterQuery { interfaces },
        )
        .await
    }

    // ── Settings store ───────────────────────────────────────────────

    /// Read one value from the settings store. `None` if the key is unset.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, Error> {
        match self.get::<SettingRecord>(&format!("v1/settings/{key}")).await {
            Ok(record) => Ok(Some(record.value)),
            Err(Error::Gateway { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write one value to the settings store.
    pub async fn put_setting(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<(), Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SettingBody<'a> {
            value: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<&'a str>,
        }

        self.put_no_response(
            &format!("v1/settings/{key}"),
            &SettingBody { value, description },
        )
        .await
    }
}
