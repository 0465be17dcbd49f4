//! Device communication — trait + HTTP backend.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;

use crate::protocol::*;
use crate::state::Channels;

// ── Error type ──

/// Device communication errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// is the request path and *details* describes what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Connection refused, DNS failure, reset, or any other I/O failure.
    Unreachable(String),
    /// The request did not complete within the endpoint's timeout.
    Timeout(String),
    /// The device answered with a non-2xx status.
    HttpStatus { path: &'static str, status: u16 },
    /// The HTTP client could not be built.
    Client(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Unreachable(e) => write!(f, "Device unreachable: {e}"),
            DeviceError::Timeout(e) => write!(f, "Device request timed out: {e}"),
            DeviceError::HttpStatus { path, status } => {
                write!(f, "Device returned HTTP {status} for {path}")
            }
            DeviceError::Client(e) => write!(f, "HTTP client error: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Endpoint ──

/// Where and how to reach one SmartControl unit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
    #[serde(serialize_with = "serialize_millis")]
    pub request_timeout: Duration,
}

fn serialize_millis<S: serde::Serializer>(
    d: &Duration,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl DeviceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        DeviceEndpoint {
            host: host.into(),
            port,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `http://host:port`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

impl fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── Trait ──

/// The three operations a SmartControl unit supports.
///
/// Each call is a single independent round trip: no retries, no state kept
/// between calls.
pub trait SmartControl {
    fn endpoint(&self) -> &DeviceEndpoint;

    /// Fetch the raw status payload.
    fn query_state(&self) -> Result<String>;

    /// Suspend the programmed profile for `duration` so direct channel
    /// writes are honoured.
    fn enable_manual_override(&self, duration: Duration) -> Result<()>;

    /// Push all four channel values.
    fn set_channels(&self, channels: Channels) -> Result<()>;
}

impl<D: SmartControl + ?Sized> SmartControl for &D {
    fn endpoint(&self) -> &DeviceEndpoint {
        (**self).endpoint()
    }
    fn query_state(&self) -> Result<String> {
        (**self).query_state()
    }
    fn enable_manual_override(&self, duration: Duration) -> Result<()> {
        (**self).enable_manual_override(duration)
    }
    fn set_channels(&self, channels: Channels) -> Result<()> {
        (**self).set_channels(channels)
    }
}

// ── HTTP backend ──

/// SmartControl unit reached over plaintext HTTP.
pub struct HttpDevice {
    endpoint: DeviceEndpoint,
    client: Client,
}

impl HttpDevice {
    pub fn new(endpoint: DeviceEndpoint) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(FORM_CONTENT_TYPE),
        );
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(endpoint.request_timeout)
            .build()
            .map_err(|e| DeviceError::Client(e.to_string()))?;
        Ok(HttpDevice { endpoint, client })
    }

    fn post(&self, path: &'static str, body: String) -> Result<Response> {
        log::debug!("POST {path} {body}");
        let response = self
            .client
            .post(self.endpoint.url(path))
            .body(body)
            .send()
            .map_err(|e| transport_error(path, e))?;
        check_status(path, response)
    }
}

fn transport_error(path: &'static str, e: reqwest::Error) -> DeviceError {
    if e.is_timeout() {
        DeviceError::Timeout(format!("{path}: {e}"))
    } else if let Some(status) = e.status() {
        DeviceError::HttpStatus {
            path,
            status: status.as_u16(),
        }
    } else {
        DeviceError::Unreachable(format!("{path}: {e}"))
    }
}

fn check_status(path: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(DeviceError::HttpStatus {
            path,
            status: status.as_u16(),
        })
    }
}

impl SmartControl for HttpDevice {
    fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    fn query_state(&self) -> Result<String> {
        log::debug!("GET {PATH_STATUS}");
        let response = self
            .client
            .get(self.endpoint.url(PATH_STATUS))
            .send()
            .map_err(|e| transport_error(PATH_STATUS, e))?;
        check_status(PATH_STATUS, response)?
            .text()
            .map_err(|e| transport_error(PATH_STATUS, e))
    }

    fn enable_manual_override(&self, duration: Duration) -> Result<()> {
        self.post(PATH_STAT, manual_override_body(duration))?;
        Ok(())
    }

    fn set_channels(&self, channels: Channels) -> Result<()> {
        let response = self.post(PATH_COLOR, set_channels_body(channels))?;
        if log::log_enabled!(log::Level::Trace) {
            let echo = response.text().unwrap_or_default();
            log::trace!("{PATH_COLOR} echo: {echo}");
        }
        Ok(())
    }
}

// ── Mock device for testing ──

/// In-memory mock device for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// One recorded call against the mock, in issue order.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        QueryState,
        EnableManualOverride(Duration),
        SetChannels(Channels),
    }

    /// Scripted stand-in for a SmartControl unit.
    ///
    /// `query_state` pops scripted responses in order and falls back to
    /// `status_body` once the script is exhausted. Every call is recorded.
    /// Thread-safe so resolver concurrency can be exercised.
    pub struct MockDevice {
        endpoint: DeviceEndpoint,
        /// Body returned when no scripted response is queued.
        pub status_body: Mutex<String>,
        /// Scripted query responses, consumed front to back.
        pub query_responses: Mutex<VecDeque<Result<String>>>,
        /// Every call made, in order.
        pub calls: Mutex<Vec<Call>>,
        /// Number of `query_state` calls that have started.
        pub queries_started: AtomicUsize,
        /// Sleep inside `query_state` to hold a refresh in flight.
        pub query_delay: Mutex<Duration>,
        /// If true, `enable_manual_override` fails.
        pub fail_override: AtomicBool,
        /// If true, `set_channels` fails.
        pub fail_set_channels: AtomicBool,
    }

    impl Default for MockDevice {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockDevice {
        pub fn new() -> Self {
            MockDevice {
                endpoint: DeviceEndpoint::new("mock.helialux", 80),
                status_body: Mutex::new(r#"{"C":{"no":4,"ch":[0,0,0,0]}}"#.into()),
                query_responses: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
                queries_started: AtomicUsize::new(0),
                query_delay: Mutex::new(Duration::ZERO),
                fail_override: AtomicBool::new(false),
                fail_set_channels: AtomicBool::new(false),
            }
        }

        /// Mock whose default status reports `channels` in the JSON encoding.
        pub fn with_channels(channels: Channels) -> Self {
            let dev = Self::new();
            dev.set_status_channels(channels);
            dev
        }

        pub fn set_status_channels(&self, channels: Channels) {
            let [w, b, g, r] = channels.to_array();
            *self.status_body.lock().unwrap() =
                format!(r#"{{"C":{{"no":4,"ch":[{w},{b},{g},{r}]}}}}"#);
        }

        pub fn set_status_body(&self, body: impl Into<String>) {
            *self.status_body.lock().unwrap() = body.into();
        }

        /// Queue a response for the next `query_state` call.
        pub fn push_query_response(&self, response: Result<String>) {
            self.query_responses.lock().unwrap().push_back(response);
        }

        pub fn set_query_delay(&self, delay: Duration) {
            *self.query_delay.lock().unwrap() = delay;
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn query_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::QueryState))
                .count()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl SmartControl for MockDevice {
        fn endpoint(&self) -> &DeviceEndpoint {
            &self.endpoint
        }

        fn query_state(&self) -> Result<String> {
            self.record(Call::QueryState);
            self.queries_started.fetch_add(1, Ordering::SeqCst);
            let delay = *self.query_delay.lock().unwrap();
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            if let Some(scripted) = self.query_responses.lock().unwrap().pop_front() {
                return scripted;
            }
            Ok(self.status_body.lock().unwrap().clone())
        }

        fn enable_manual_override(&self, duration: Duration) -> Result<()> {
            self.record(Call::EnableManualOverride(duration));
            if self.fail_override.load(Ordering::SeqCst) {
                return Err(DeviceError::Unreachable(format!(
                    "{PATH_STAT}: connection refused"
                )));
            }
            Ok(())
        }

        fn set_channels(&self, channels: Channels) -> Result<()> {
            self.record(Call::SetChannels(channels));
            if self.fail_set_channels.load(Ordering::SeqCst) {
                return Err(DeviceError::HttpStatus {
                    path: PATH_COLOR,
                    status: 500,
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{Call, MockDevice};
    use super::*;

    #[test]
    fn endpoint_urls() {
        let ep = DeviceEndpoint::new("192.168.1.50", 8080);
        assert_eq!(ep.base_url(), "http://192.168.1.50:8080");
        assert_eq!(ep.url(PATH_STATUS), "http://192.168.1.50:8080/statusvars.js");
        assert_eq!(ep.to_string(), "192.168.1.50:8080");
    }

    #[test]
    fn endpoint_default_timeout() {
        let ep = DeviceEndpoint::new("h", 80);
        assert_eq!(ep.request_timeout, Duration::from_millis(1000));
        let ep = ep.with_timeout(Duration::from_millis(250));
        assert_eq!(ep.request_timeout, Duration::from_millis(250));
    }

    #[test]
    fn endpoint_serializes_timeout_as_millis() {
        let ep = DeviceEndpoint::new("h", 80);
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(json["request_timeout"], 1000);
    }

    #[test]
    fn display_errors() {
        assert_eq!(
            DeviceError::Timeout("/stat: deadline".into()).to_string(),
            "Device request timed out: /stat: deadline"
        );
        assert_eq!(
            DeviceError::HttpStatus {
                path: PATH_STATUS,
                status: 404
            }
            .to_string(),
            "Device returned HTTP 404 for /statusvars.js"
        );
    }

    #[test]
    fn http_device_unreachable_port_is_transport_error() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let ep = DeviceEndpoint::new("127.0.0.1", port).with_timeout(Duration::from_millis(500));
        let dev = HttpDevice::new(ep).unwrap();
        let err = dev.query_state().unwrap_err();
        assert!(
            matches!(err, DeviceError::Unreachable(_) | DeviceError::Timeout(_)),
            "got {err:?}"
        );
    }

    #[test]
    fn mock_records_calls_in_order() {
        let dev = MockDevice::new();
        dev.query_state().unwrap();
        dev.enable_manual_override(DEFAULT_OVERRIDE_DURATION).unwrap();
        dev.set_channels(Channels::FULL).unwrap();
        assert_eq!(
            dev.calls(),
            vec![
                Call::QueryState,
                Call::EnableManualOverride(DEFAULT_OVERRIDE_DURATION),
                Call::SetChannels(Channels::FULL),
            ]
        );
    }

    #[test]
    fn mock_scripted_responses_then_default() {
        let dev = MockDevice::with_channels(Channels::new(1, 2, 3, 4));
        dev.push_query_response(Err(DeviceError::Timeout("x".into())));
        assert!(dev.query_state().is_err());
        let body = dev.query_state().unwrap();
        assert!(body.contains("[1,2,3,4]"), "got {body}");
    }
}
