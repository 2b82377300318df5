//! Client for the Western Australian mining tenements feature service.
//!
//! The DMIRS-003 dataset is published as an ArcGIS REST `MapServer` layer.
//! Records are paged with `resultOffset`/`resultRecordCount` in `OBJECTID`
//! order after a `returnCountOnly` query has reported the total.
//!
//! ArcGIS reference: <https://developers.arcgis.com/rest/services-reference/enterprise/query-map-service-layer/>

use chrono::{DateTime, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tenement_core::config::WA_MAX_PAGE_SIZE;
use tenement_core::error::AppError;
use tenement_core::traits::TenementSource;
use tenement_core::{HttpConfig, Jurisdiction, NewTenement, SourcePage};

/// Error object ArcGIS embeds in an HTTP 200 body when a query fails.
#[derive(Deserialize, Debug)]
struct ArcGisError {
    code: Option<i64>,
    message: Option<String>,
    #[serde(default)]
    details: Vec<String>,
}

impl ArcGisError {
    fn into_app_error(self) -> AppError {
        let mut message = self
            .message
            .unwrap_or_else(|| "unknown ArcGIS error".to_string());
        if let Some(code) = self.code {
            message = format!("{} (code {})", message, code);
        }
        if !self.details.is_empty() {
            message = format!("{}: {}", message, self.details.join("; "));
        }
        AppError::UpstreamError(message)
    }
}

/// Response to a `returnCountOnly=true` query.
#[derive(Deserialize, Debug)]
struct CountResponse {
    count: Option<u64>,
    error: Option<ArcGisError>,
}

/// Response to a feature query.
#[derive(Deserialize, Debug)]
struct QueryResponse {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default, rename = "exceededTransferLimit")]
    exceeded_transfer_limit: bool,
    error: Option<ArcGisError>,
}

/// One feature from the query response. Only attributes are requested.
#[derive(Deserialize, Debug, Clone)]
pub struct Feature {
    pub attributes: Map<String, Value>,
}

/// HTTP client for the WA tenement layer.
///
/// # Examples
///
/// ```no_run
/// use tenement_client::WaClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WaClient::new(tenement_core::config::DEFAULT_WA_ENDPOINT)?;
/// let total = client.count().await?;
/// let first = client.fetch_page(0, 100).await?;
/// println!("{} tenements, first is {}", total, first.records[0].number);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WaClient {
    client: Client,
    query_url: Url,
    page_size: usize,
    timeout_secs: u64,
}

impl WaClient {
    /// Creates a client for the given layer URL with default HTTP settings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidUrl` if the URL is malformed.
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(layer_url: &str) -> Result<Self, AppError> {
        Self::with_config(layer_url, &HttpConfig::default(), WA_MAX_PAGE_SIZE)
    }

    /// Creates a client for the given layer URL.
    ///
    /// `page_size` is clamped to the service maximum.
    pub fn with_config(
        layer_url: &str,
        http_config: &HttpConfig,
        page_size: usize,
    ) -> Result<Self, AppError> {
        let query_url = Url::parse(&format!("{}/query", layer_url.trim_end_matches('/')))
            .map_err(|_| AppError::InvalidUrl(layer_url.to_string()))?;

        let client = Client::builder()
            .user_agent(&http_config.user_agent)
            .timeout(http_config.timeout)
            .build()
            .map_err(|e| AppError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            query_url,
            page_size: page_size.clamp(1, WA_MAX_PAGE_SIZE),
            timeout_secs: http_config.timeout.as_secs(),
        })
    }

    /// The query endpoint requests are sent to.
    pub fn query_url(&self) -> &str {
        self.query_url.as_str()
    }

    /// Asks the layer how many features match `1=1`.
    pub async fn count(&self) -> Result<u64, AppError> {
        let resp: CountResponse = self
            .get_json(&[
                ("where", "1=1".to_string()),
                ("returnCountOnly", "true".to_string()),
                ("f", "json".to_string()),
            ])
            .await?;

        if let Some(error) = resp.error {
            return Err(error.into_app_error());
        }
        resp.count.ok_or(AppError::EmptyResponse)
    }

    /// Fetches one page of features and normalizes them.
    ///
    /// Features without a tenement number are dropped with a warning but
    /// still counted in [`SourcePage::fetched`], so the caller's next
    /// `resultOffset` skips past them.
    pub async fn fetch_page(&self, offset: u64, limit: usize) -> Result<SourcePage, AppError> {
        let limit = limit.clamp(1, self.page_size);
        let resp: QueryResponse = self
            .get_json(&[
                ("where", "1=1".to_string()),
                ("outFields", "*".to_string()),
                ("returnGeometry", "false".to_string()),
                ("orderByFields", "OBJECTID ASC".to_string()),
                ("resultOffset", offset.to_string()),
                ("resultRecordCount", limit.to_string()),
                ("f", "json".to_string()),
            ])
            .await?;

        if let Some(error) = resp.error {
            return Err(error.into_app_error());
        }

        tracing::debug!(
            offset,
            features = resp.features.len(),
            exceeded_transfer_limit = resp.exceeded_transfer_limit,
            "WA page received"
        );

        let page = SourcePage {
            records: resp
                .features
                .iter()
                .filter_map(|f| Self::into_new_tenement(&f.attributes))
                .collect(),
            fetched: resp.features.len(),
        };

        if page.dropped() > 0 {
            tracing::warn!(
                offset,
                dropped = page.dropped(),
                "Dropped WA features without a tenement number"
            );
        }

        Ok(page)
    }

    /// Sends one GET to the query endpoint and decodes the JSON body.
    ///
    /// Retries are left to the caller's retry policy; this maps failures to
    /// retryable or permanent `AppError` variants.
    async fn get_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, AppError> {
        let mut url = self.query_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }

        let resp = match self.client.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return Err(AppError::Timeout(self.timeout_secs)),
            Err(e) if e.is_connect() => {
                return Err(AppError::NetworkError(format!("Connection failed: {}", e)));
            }
            Err(e) => return Err(AppError::NetworkError(e.to_string())),
        };

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimitExceeded);
        }
        if status.is_server_error() {
            return Err(AppError::ClientError(format!(
                "Server error: HTTP {}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(AppError::ClientError(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.query_url
            )));
        }

        resp.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::ClientError(format!("Invalid response body: {}", e))
            }
        })
    }

    /// Converts ArcGIS feature attributes into a [`NewTenement`].
    ///
    /// Attribute names are matched case-insensitively. Returns `None` when
    /// neither `fmt_tenid` nor `tenid` is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenement_client::WaClient;
    ///
    /// let attrs = serde_json::json!({
    ///     "TENID": "M  1501789",
    ///     "FMT_TENID": "M 15/1789",
    ///     "TYPE": "MINING LEASE",
    ///     "TENSTATUS": "LIVE",
    ///     "HOLDER1": "EXAMPLE MINING PTY LTD",
    ///     "LEGAL_AREA": 971.35,
    ///     "GRANTDATE": 1104537600000i64
    /// });
    /// let tenement = WaClient::into_new_tenement(attrs.as_object().unwrap()).unwrap();
    /// assert_eq!(tenement.number, "M 15/1789");
    /// assert_eq!(tenement.source_wfs_ref.as_deref(), Some("DMIRS-003:M  1501789"));
    /// ```
    pub fn into_new_tenement(attributes: &Map<String, Value>) -> Option<NewTenement> {
        let tenid = attr_string(attributes, "tenid");
        let number = attr_string(attributes, "fmt_tenid").or_else(|| tenid.clone())?;

        let mut tenement = NewTenement::new(Jurisdiction::Wa, number.clone());
        tenement.tenement_type = attr_string(attributes, "type");
        tenement.status = attr_string(attributes, "tenstatus");
        tenement.holder_name = attr_string(attributes, "holder1");
        tenement.area_ha = attr_f64(attributes, "legal_area");
        tenement.grant_date = attr_epoch_date(attributes, "grantdate");
        tenement.application_date = attr_epoch_date(attributes, "startdate");
        tenement.expiry_date = attr_epoch_date(attributes, "enddate");
        tenement.source_wfs_ref = Some(format!("DMIRS-003:{}", tenid.unwrap_or(number)));
        Some(tenement)
    }
}

fn attr<'a>(attributes: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
        .filter(|v| !v.is_null())
}

fn attr_string(attributes: &Map<String, Value>, key: &str) -> Option<String> {
    match attr(attributes, key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn attr_f64(attributes: &Map<String, Value>, key: &str) -> Option<f64> {
    match attr(attributes, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn attr_epoch_date(attributes: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let millis = match attr(attributes, key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

// =============================================================================
// Trait Implementation: TenementSource
// =============================================================================

impl TenementSource for WaClient {
    fn jurisdiction(&self) -> Jurisdiction {
        Jurisdiction::Wa
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn count(&self) -> Result<u64, AppError> {
        WaClient::count(self).await
    }

    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<SourcePage, AppError> {
        WaClient::fetch_page(self, offset, limit).await
    }
}
