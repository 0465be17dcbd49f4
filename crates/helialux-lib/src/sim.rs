//! Simulated SmartControl unit for tests and offline use.
//!
//! Serves the device's HTTP API on `127.0.0.1` from a background thread.
//! Like the real controller, channel writes only stick while manual mode is
//! on; without it the programmed profile wins and the write is dropped.

use std::collections::{HashMap, VecDeque};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::error::{HelialuxError, Result};
use crate::protocol::*;
use crate::state::Channels;

/// Requests kept in the log; older entries are dropped first.
pub const REQUEST_LOG_CAPACITY: usize = 1024;

/// Which status encoding the simulated firmware answers with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFormat {
    /// JSON object with `C.ch`.
    #[default]
    Json,
    /// `statusvars.js` script with `brightness=[..]`.
    Flat,
}

impl std::fmt::Display for StatusFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StatusFormat::Json => "json",
            StatusFormat::Flat => "flat",
        })
    }
}

impl std::str::FromStr for StatusFormat {
    type Err = HelialuxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(StatusFormat::Json),
            "flat" => Ok(StatusFormat::Flat),
            other => Err(HelialuxError::Config(format!(
                "unknown status format: {other} (use json or flat)"
            ))),
        }
    }
}

/// A request the simulator received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct SimState {
    format: StatusFormat,
    manual: bool,
    ctime: String,
    channels: Channels,
    requests: VecDeque<RecordedRequest>,
    failures: HashMap<String, u16>,
    raw_status: Option<String>,
}

impl SimState {
    fn record(&mut self, request: RecordedRequest) {
        if self.requests.len() >= REQUEST_LOG_CAPACITY {
            self.requests.pop_front();
        }
        self.requests.push_back(request);
    }
}

/// A running simulated device. Stops its server thread when dropped.
pub struct SimulatedDevice {
    server: Arc<Server>,
    addr: SocketAddr,
    state: Arc<Mutex<SimState>>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedDevice {
    /// Start on an ephemeral port.
    pub fn start(format: StatusFormat) -> Result<Self> {
        Self::bind(0, format)
    }

    /// Start on `port` (0 = ephemeral).
    pub fn bind(port: u16, format: StatusFormat) -> Result<Self> {
        let server = Server::http(("127.0.0.1", port)).map_err(|e| {
            HelialuxError::Io(std::io::Error::other(format!(
                "failed to bind 127.0.0.1:{port}: {e}"
            )))
        })?;
        let addr = server.server_addr().to_ip().ok_or_else(|| {
            HelialuxError::Io(std::io::Error::other("simulator is not on an IP socket"))
        })?;
        let server = Arc::new(server);
        let state = Arc::new(Mutex::new(SimState {
            format,
            ctime: "00:00".into(),
            ..SimState::default()
        }));

        let worker = {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle(&state, request);
                }
            })
        };

        log::info!("simulated SmartControl listening on {addr}");
        Ok(SimulatedDevice {
            server,
            addr,
            state,
            worker: Some(worker),
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        lock(&self.state)
    }

    pub fn channels(&self) -> Channels {
        self.lock().channels
    }

    /// Change the light as if the programmed profile had moved on.
    pub fn set_channels(&self, channels: Channels) {
        self.lock().channels = channels;
    }

    pub fn manual(&self) -> bool {
        self.lock().manual
    }

    pub fn set_manual(&self, manual: bool) {
        self.lock().manual = manual;
    }

    /// Last `ctime` the override was requested with.
    pub fn ctime(&self) -> String {
        self.lock().ctime.clone()
    }

    pub fn set_format(&self, format: StatusFormat) {
        self.lock().format = format;
    }

    /// Answer status queries with `body` verbatim (`None` restores normal output).
    pub fn set_raw_status(&self, body: Option<String>) {
        self.lock().raw_status = body;
    }

    /// Answer every request for `path` with `status` until cleared.
    pub fn fail_path(&self, path: &str, status: u16) {
        self.lock().failures.insert(path.to_string(), status);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Logged requests, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.iter().cloned().collect()
    }

    /// Remove and return the logged requests, oldest first.
    pub fn take_requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.drain(..).collect()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn content_type(value: &str) -> Option<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).ok()
}

fn reply(request: Request, status: u16, mime: &str, body: String) {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Some(header) = content_type(mime) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        log::debug!("simulator: failed to respond: {e}");
    }
}

fn status_json(state: &SimState, action: &str) -> String {
    json!({
        "A": { "action": action },
        "S": {
            "dtime": "14:10",
            "stime": 850,
            "tswi": "",
            "cswi": state.manual,
            "ttime": "01:00",
            "ctime": state.ctime,
        },
        "C": { "no": CHANNEL_COUNT, "ch": state.channels.to_array() },
    })
    .to_string()
}

fn status_flat(state: &SimState) -> String {
    let [w, b, g, r] = state.channels.to_array();
    format!(
        "lang=0;lamp='4Ch';profNum=0;profile='Profile 1';tsimtime=0;tsimact=0;\
         csimact={};csimtime='{}';brightness=[{w},{b},{g},{r}];times=[0,480,1200,1320];",
        u8::from(state.manual),
        state.ctime
    )
}

fn color_json(state: &SimState) -> String {
    json!({
        "A": { "action": "01" },
        "C": { "no": CHANNEL_COUNT, "ch": state.channels.to_array() },
    })
    .to_string()
}

fn parse_channel(form: &HashMap<String, String>, key: &str) -> Option<u8> {
    let v: f64 = form.get(key)?.trim().parse().ok()?;
    v.is_finite().then(|| v.round().clamp(0.0, 100.0) as u8)
}

fn handle(state: &Mutex<SimState>, mut request: Request) {
    let method = request.method().clone();
    let url = request.url().to_string();
    let path = url.split_once('?').map_or(url.as_str(), |(p, _)| p).to_string();

    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        log::debug!("simulator: unreadable body: {e}");
    }

    let mut st = lock(state);
    st.record(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        body: body.clone(),
    });

    if let Some(&status) = st.failures.get(&path) {
        drop(st);
        reply(request, status, "text/html", "Simulated failure".into());
        return;
    }

    let form: HashMap<String, String> = parse_form(&body).into_iter().collect();
    let action = form.get("action").map(String::as_str);

    let (status, mime, text) = match (&method, path.as_str(), action) {
        (Method::Get, PATH_STATUS, _) => match (&st.raw_status, st.format) {
            (Some(raw), _) => (200, "application/javascript", raw.clone()),
            (None, StatusFormat::Json) => (200, "application/json", status_json(&st, "10")),
            (None, StatusFormat::Flat) => (200, "application/javascript", status_flat(&st)),
        },
        (Method::Post, PATH_STAT, Some(ACTION_QUERY_STATE)) => {
            (200, "application/json", status_json(&st, ACTION_QUERY_STATE))
        }
        (Method::Post, PATH_STAT, Some(ACTION_MANUAL_OVERRIDE))
            if form.contains_key("cswi") && form.contains_key("ctime") =>
        {
            st.manual = form.get("cswi").is_some_and(|v| v == "true");
            st.ctime = form.get("ctime").cloned().unwrap_or_default();
            log::debug!("simulator: manual={} ctime={}", st.manual, st.ctime);
            (200, "application/json", status_json(&st, ACTION_MANUAL_OVERRIDE))
        }
        (Method::Post, PATH_COLOR, Some(ACTION_SET_CHANNELS)) => {
            let values = ["ch1", "ch2", "ch3", "ch4"].map(|k| parse_channel(&form, k));
            match values {
                [Some(w), Some(b), Some(g), Some(r)] => {
                    if st.manual {
                        st.channels = Channels::new(w, b, g, r);
                        log::debug!("simulator: channels={}", st.channels);
                    } else {
                        log::debug!("simulator: not in manual mode, write dropped");
                    }
                    (200, "application/json", color_json(&st))
                }
                _ => (405, "text/html", "Invalid request".to_string()),
            }
        }
        _ => (405, "text/html", "Invalid request".to_string()),
    };
    drop(st);
    reply(request, status, mime, text);
}
