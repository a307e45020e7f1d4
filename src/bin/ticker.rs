//! Merge-cycle clock.
//!
//! Sends the literal `"tick"` control datagram to a mixer at a fixed
//! interval. The transport is UDP, so there is no guarantee the mixer sees
//! ticks at regular spacing, or at all.
//!
//! # Usage
//!
//! ```sh
//! gridmix-ticker <host> <port> [--interval-secs S]
//! ```

use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;

use gridmix::proto::TICK;

/// Default seconds between ticks.
const DEFAULT_INTERVAL_SECS: u64 = 2;

fn main() {
    gridmix::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let (host, port, interval) = match args.as_slice() {
        [_, host, port] => (host, port, Duration::from_secs(DEFAULT_INTERVAL_SECS)),
        [_, host, port, flag, secs] if flag == "--interval-secs" => match secs.parse::<u64>() {
            Ok(s) => (host, port, Duration::from_secs(s)),
            Err(_) => {
                eprintln!("gridmix-ticker: invalid interval {secs:?}");
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("Syntax: gridmix-ticker <host> <port> [--interval-secs S]");
            std::process::exit(1);
        }
    };

    let port = match port.parse::<u16>() {
        Ok(p) => p,
        Err(_) => {
            eprintln!("gridmix-ticker: invalid port {port:?}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(host, port, interval) {
        eprintln!("gridmix-ticker: {e}");
        std::process::exit(1);
    }
}

fn run(host: &str, port: u16, interval: Duration) -> std::io::Result<()> {
    let dest = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::other(format!("no address for {host}")))?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;

    eprintln!("gridmix-ticker: ticking {dest} every {interval:?}");
    loop {
        socket.send_to(TICK, dest)?;
        std::thread::sleep(interval);
    }
}
