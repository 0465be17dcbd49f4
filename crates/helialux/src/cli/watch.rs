//! `watch` subcommand — poll the light and print state transitions.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use helialux_lib::device::SmartControl;

use super::{
    GlobalOpts, LightState, RUNNING, Result, WatchEvent, effective_config, open_light,
    power_label,
};

/// Sleep granularity, so Ctrl+C is noticed promptly.
const TICK: Duration = Duration::from_millis(50);

/// Whether `next` should be reported given the last reported state.
fn is_transition(last: Option<&LightState>, next: &LightState) -> bool {
    last != Some(next)
}

fn print_event(start: Instant, state: &LightState, json: bool) {
    if json {
        let event = WatchEvent {
            elapsed_ms: start.elapsed().as_millis() as u64,
            on: state.on,
            channels: state.channels,
        };
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => log::warn!("failed to serialize event: {e}"),
        }
    } else {
        println!("  {:<4} {}", power_label(state.on), state.channels);
    }
}

fn sleep_while_running(total: Duration) {
    let deadline = Instant::now() + total;
    while RUNNING.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep(TICK.min(deadline - now));
    }
}

pub(super) fn cmd_watch(opts: &GlobalOpts, interval_ms: u64) -> Result<()> {
    let config = effective_config(opts);
    let light = open_light(&config)?;
    let interval = Duration::from_millis(interval_ms.max(1));

    if !opts.json {
        println!(
            "Watching {} every {} ms (Ctrl+C to stop)",
            light.device().endpoint(),
            interval.as_millis()
        );
    }

    let start = Instant::now();
    let mut last: Option<LightState> = None;
    let mut failing = false;

    while RUNNING.load(Ordering::SeqCst) {
        match light.state() {
            Ok(state) => {
                if failing {
                    log::info!("device reachable again");
                    failing = false;
                }
                if is_transition(last.as_ref(), &state) {
                    print_event(start, &state, opts.json);
                    last = Some(state);
                }
            }
            Err(e) => {
                // The next poll retries; only the first failure in a row is loud.
                if !failing {
                    log::warn!("{e}");
                    failing = true;
                } else {
                    log::debug!("{e}");
                }
            }
        }
        sleep_while_running(interval);
    }

    if !opts.json {
        println!("Stopped.");
    }
    Ok(())
}
