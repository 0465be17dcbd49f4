//! `simulate` subcommand — serve a simulated SmartControl device until Ctrl+C.

use std::sync::atomic::Ordering;
use std::time::Duration;

use helialux_lib::sim::{RecordedRequest, SimulatedDevice};

use super::{RUNNING, Result, StatusFormat};

fn format_request(r: &RecordedRequest) -> String {
    if r.body.is_empty() {
        format!("  {} {}", r.method, r.path)
    } else {
        format!("  {} {} {}", r.method, r.path, r.body)
    }
}

pub(super) fn cmd_simulate(port: u16, format: StatusFormat) -> Result<()> {
    let sim = SimulatedDevice::bind(port, format)?;
    println!(
        "Simulated SmartControl on http://{} ({format} status, Ctrl+C to stop)",
        sim.addr()
    );
    println!("Try: helialux-cli --host 127.0.0.1 --port {} status", sim.port());

    while RUNNING.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
        for r in sim.take_requests() {
            println!("{}", format_request(&r));
        }
    }

    println!("Stopped.");
    Ok(())
}
