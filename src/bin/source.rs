//! Grid source client.
//!
//! Generates a random grid of live and dead cells, then periodically
//! mutates roughly 10% of it and ships a bit-packed snapshot to the mixer.
//! With `--count N` the source stops after N snapshots and sends the
//! departure message; without it, it runs until killed.
//!
//! # Usage
//!
//! ```sh
//! gridmix-source <rows> <cols> <host> <port> [--count N] [--interval-secs S]
//! ```

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use gridmix::codec;
use gridmix::grid::LogicalGrid;
use gridmix::proto::DEPART;
use gridmix::time::Timestamp;

/// Default seconds between snapshots.
const DEFAULT_INTERVAL_SECS: u64 = 2;

struct Config {
    rows: usize,
    cols: usize,
    dest: SocketAddr,
    count: Option<u64>,
    interval: Duration,
}

fn main() {
    gridmix::init_tracing();

    let config = match parse_args() {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!(
                "Syntax: gridmix-source <rows> <cols> <host> <port> [--count N] [--interval-secs S]"
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("gridmix-source: {e}");
        std::process::exit(1);
    }
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        return Err("gridmix-source: missing arguments".into());
    }

    let rows = args[1]
        .parse::<usize>()
        .map_err(|_| format!("gridmix-source: invalid rows {:?}", args[1]))?;
    let cols = args[2]
        .parse::<usize>()
        .map_err(|_| format!("gridmix-source: invalid cols {:?}", args[2]))?;
    let port = args[4]
        .parse::<u16>()
        .map_err(|_| format!("gridmix-source: invalid port {:?}", args[4]))?;
    let dest = (args[3].as_str(), port)
        .to_socket_addrs()
        .map_err(|e| format!("gridmix-source: cannot resolve {}: {e}", args[3]))?
        .next()
        .ok_or_else(|| format!("gridmix-source: no address for {}", args[3]))?;

    let mut count = None;
    let mut interval = Duration::from_secs(DEFAULT_INTERVAL_SECS);
    let mut rest = args[5..].iter();
    while let Some(flag) = rest.next() {
        let value = rest
            .next()
            .ok_or_else(|| format!("gridmix-source: {flag} needs a value"))?;
        match flag.as_str() {
            "--count" => {
                count = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("gridmix-source: invalid count {value:?}"))?,
                );
            }
            "--interval-secs" => {
                interval = Duration::from_secs(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("gridmix-source: invalid interval {value:?}"))?,
                );
            }
            other => return Err(format!("gridmix-source: unknown flag {other:?}")),
        }
    }

    Ok(Config {
        rows,
        cols,
        dest,
        count,
        interval,
    })
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    let mut rng = rand::thread_rng();

    let mut grid = LogicalGrid::random(config.rows, config.cols, &mut rng)?;
    eprintln!(
        "gridmix-source: sending {}x{} grid to {} every {:?}",
        grid.rows(),
        grid.cols(),
        config.dest,
        config.interval
    );

    let mut seq = 0u32;
    loop {
        seq += 1;
        grid.set_seq(seq);
        grid.set_stamp(Timestamp::now());

        let frame = codec::encode_bits(&grid)?;
        socket.send_to(&frame, config.dest)?;

        if config.count.is_some_and(|count| u64::from(seq) >= count) {
            socket.send_to(DEPART, config.dest)?;
            eprintln!("gridmix-source: sent {seq} snapshots, departing");
            return Ok(());
        }

        std::thread::sleep(config.interval);
        grid.mutate(&mut rng);
    }
}
