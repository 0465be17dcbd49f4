//! Protocol constants for the HeliaLux SmartControl HTTP API.
//!
//! The controller speaks plaintext HTTP on the LAN with no authentication.
//! Writes are `application/x-www-form-urlencoded` POSTs whose `action` field
//! selects the operation; reads fetch a status script.
//!
//! Channel order everywhere on the wire is `[white, blue, green, red]`
//! (`ch1..ch4` in form bodies, `C.ch` in JSON replies, `brightness=[..]` in
//! the status script).

use std::time::Duration;

use crate::state::Channels;

// ── Endpoints ──

/// Status script (GET). Returns either JSON with `C.ch` or a
/// `key=value;...` script containing `brightness=[w,b,g,r]`.
pub const PATH_STATUS: &str = "/statusvars.js";

/// Schedule/manual-mode control (POST).
pub const PATH_STAT: &str = "/stat";

/// Direct channel control (POST).
pub const PATH_COLOR: &str = "/color";

// ── Action codes ──

/// Legacy JSON state query on `/stat`.
pub const ACTION_QUERY_STATE: &str = "10";

/// Switch manual ("color simulation") mode on `/stat`.
pub const ACTION_MANUAL_OVERRIDE: &str = "14";

/// Set channel values on `/color`.
pub const ACTION_SET_CHANNELS: &str = "1";

// ── Headers ──

pub const USER_AGENT: &str = concat!("helialux/", env!("CARGO_PKG_VERSION"));
pub const ACCEPT: &str = "*/*";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ── Defaults ──

/// Manual override duration the device is asked for before channel writes.
pub const DEFAULT_OVERRIDE_DURATION: Duration = Duration::from_secs(60 * 60);

/// Per-request timeout for device calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1000);

/// Minimum age before cached state is re-queried.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

/// Longest override the `HH:MM` field can express.
pub const MAX_OVERRIDE_MINUTES: u64 = 23 * 60 + 59;

/// Number of physical channels.
pub const CHANNEL_COUNT: usize = 4;

// ── Form bodies ──

/// Format an override duration as the device's `ctime` field (`HH:MM`).
///
/// Sub-minute remainders are dropped; the value saturates at `23:59`.
pub fn format_ctime(duration: Duration) -> String {
    let minutes = (duration.as_secs() / 60).min(MAX_OVERRIDE_MINUTES);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Body for `POST /stat` enabling manual override for `duration`.
pub fn manual_override_body(duration: Duration) -> String {
    format!(
        "action={ACTION_MANUAL_OVERRIDE}&cswi=true&ctime={}",
        format_ctime(duration)
    )
}

/// Body for `POST /color` setting all four channels.
pub fn set_channels_body(channels: Channels) -> String {
    format!(
        "action={ACTION_SET_CHANNELS}&ch1={}&ch2={}&ch3={}&ch4={}",
        channels.white, channels.blue, channels.green, channels.red
    )
}

/// Decode an `application/x-www-form-urlencoded` body into key/value pairs.
///
/// Values produced by this crate never need percent-decoding; `+` is mapped
/// to a space and anything else is taken literally.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k.replace('+', " "), v.replace('+', " "))
        })
        .collect()
}
