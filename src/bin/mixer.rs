//! Grid mixing service.
//!
//! Binds a UDP port and serves three kinds of datagrams: packed grid frames
//! (fed to the per-source registry), `"tick"` (run one merge cycle and print
//! the composite), and `"end"` (drop the sender; exit once the last source
//! departs).
//!
//! # Usage
//!
//! ```sh
//! gridmix-mixer <port>
//! ```
//!
//! Source identity is the sender's IP address, like the reference system;
//! two sources behind one address share a registry entry. The core registry
//! takes any key, so a finer identity only needs a change here.

use std::io;
use std::net::{IpAddr, SocketAddr};

use mio::{Events, Interest, Poll, Token};

use gridmix::codec;
use gridmix::mixer::{MergeError, Mixer, SourceRegistry, UpdateOutcome};
use gridmix::net::UdpSocket;
use gridmix::proto::Datagram;
use gridmix::time::Timestamp;

/// Largest datagram we accept: a 255x255 bit-mode frame plus header.
const MAX_DATAGRAM: usize = 8192;

/// Kernel receive buffer request; bursts from many sources arrive at once.
const RECV_BUFFER: usize = 1 << 20;

const RX: Token = Token(0);

fn main() {
    gridmix::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let port = match args.as_slice() {
        [_, port] => match port.parse::<u16>() {
            Ok(p) => p,
            Err(_) => {
                eprintln!("gridmix-mixer: invalid port {port:?}");
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("Syntax: gridmix-mixer <port>");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(port) {
        eprintln!("gridmix-mixer: {e}");
        std::process::exit(1);
    }
}

fn run(port: u16) -> io::Result<()> {
    let mut socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
    if socket.set_recv_buffer_size(RECV_BUFFER).is_err() {
        eprintln!("gridmix-mixer: could not widen receive buffer, continuing");
    }

    let mut poll = Poll::new()?;
    poll.registry()
        .register(&mut socket, RX, Interest::READABLE)?;
    let mut events = Events::with_capacity(64);

    eprintln!("gridmix-mixer: listening on port {port}");

    let mut registry: SourceRegistry<IpAddr> = SourceRegistry::new();
    let mut mixer = Mixer::new();
    let mut composite_seq = 0u32;
    let mut buf = [0u8; MAX_DATAGRAM];

    loop {
        poll.poll(&mut events, None)?;
        for event in events.iter() {
            if event.token() != RX {
                continue;
            }
            while let Some((len, sender)) = socket.try_recv_from(&mut buf)? {
                let done = handle_datagram(
                    &buf[..len],
                    sender,
                    &mut registry,
                    &mut mixer,
                    &mut composite_seq,
                );
                if done {
                    eprintln!("gridmix-mixer: last source departed, exiting");
                    return Ok(());
                }
            }
        }
    }
}

/// Serves one datagram. Returns true when the last source has departed and
/// the mixing loop should stop.
fn handle_datagram(
    payload: &[u8],
    sender: SocketAddr,
    registry: &mut SourceRegistry<IpAddr>,
    mixer: &mut Mixer,
    composite_seq: &mut u32,
) -> bool {
    match Datagram::classify(payload) {
        Datagram::Depart => {
            if registry.remove(&sender.ip()) {
                eprintln!("gridmix-mixer: source {} departed", sender.ip());
            }
            registry.is_empty()
        }
        Datagram::Tick => {
            match mixer.merge(registry) {
                Ok(mut composite) => {
                    *composite_seq += 1;
                    composite.set_seq(*composite_seq);
                    composite.set_stamp(Timestamp::now());
                    print_composite(&composite);
                }
                // Nothing to mix yet; skip the cycle.
                Err(MergeError::Empty) => {}
                Err(e) => eprintln!("gridmix-mixer: merge failed: {e}"),
            }
            false
        }
        Datagram::Frame(bytes) => {
            match codec::decode_bits_to_buffer(bytes) {
                Ok(buffer) => match registry.update(sender.ip(), buffer) {
                    UpdateOutcome::Inserted => {
                        eprintln!("gridmix-mixer: new source {}", sender.ip());
                    }
                    UpdateOutcome::Replaced => {}
                    UpdateOutcome::Stale { held, offered } => {
                        eprintln!(
                            "gridmix-mixer: stale frame from {} (held {held}, offered {offered})",
                            sender.ip()
                        );
                    }
                },
                // One malformed datagram never disrupts the other sources.
                Err(e) => eprintln!("gridmix-mixer: dropping frame from {sender}: {e}"),
            }
            false
        }
    }
}

fn print_composite(composite: &gridmix::grid::LogicalGrid) {
    println!("{} by {} composite", composite.rows(), composite.cols());
    for row in 0..usize::from(composite.rows()) {
        println!("{}", String::from_utf8_lossy(composite.row(row)));
    }
    println!(
        "seq {} at {}.{:06}",
        composite.seq(),
        composite.stamp().secs,
        composite.stamp().micros
    );
}
