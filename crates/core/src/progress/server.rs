//! Telemetry listener translating engine progress records into events.

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::diagnostics::parse_clock_time;
use crate::shutdown::Shutdown;

use super::ProgressEvent;

const READ_BUFFER_SIZE: usize = 4096;

/// Ephemeral local listener for the engine's `-progress` stream.
///
/// Bound on a random port. The advertised address goes into the engine
/// invocation; the spawned process connects back and streams
/// newline-delimited `key=value` records, which are translated into
/// [`ProgressEvent`]s on the channel given to [`bind`].
///
/// [`bind`]: ProgressServer::bind
pub struct ProgressServer {
    address: String,
    stop: Shutdown,
    accept_task: JoinHandle<()>,
}

impl ProgressServer {
    /// Binds a listener and starts accepting engine connections.
    pub async fn bind(events_tx: mpsc::Sender<ProgressEvent>) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = format!("tcp://{}", listener.local_addr()?);
        let stop = Shutdown::new();

        let accept_stop = stop.clone();
        let accept_task = tokio::spawn(accept_loop(listener, events_tx, accept_stop));

        Ok(Self {
            address,
            stop,
            accept_task,
        })
    }

    /// The address to hand to the engine's `-progress` switch.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Stops the listener and waits for every connection task to finish.
    pub async fn stop(self) {
        self.stop.trigger();
        let _ = self.accept_task.await;
    }
}

async fn accept_loop(listener: TcpListener, events_tx: mpsc::Sender<ProgressEvent>, stop: Shutdown) {
    let mut connections = Vec::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!("Engine progress connection from {}", peer);
                        let tx = events_tx.clone();
                        let conn_stop = stop.clone();
                        connections.push(tokio::spawn(handle_connection(stream, tx, conn_stop)));
                    }
                    Err(e) => {
                        warn!("Progress listener accept failed: {}", e);
                        break;
                    }
                }
            }
            _ = stop.wait() => break,
        }
    }
    futures::future::join_all(connections).await;
}

/// Reads one engine connection until it completes or closes.
///
/// Records are batched between newline boundaries; a trailing partial line
/// is carried over to the next read. Lines are handled in wire order, so an
/// elapsed-time record arriving in the same batch as the end marker is
/// still delivered first.
async fn handle_connection(
    mut stream: TcpStream,
    events_tx: mpsc::Sender<ProgressEvent>,
    stop: Shutdown,
) {
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut carry = String::new();

    loop {
        let read = tokio::select! {
            read = stream.read(&mut buffer) => read,
            _ = stop.wait() => return,
        };
        let count = match read {
            Ok(0) => return,
            Ok(count) => count,
            Err(e) => {
                warn!("Progress connection read failed: {}", e);
                return;
            }
        };

        carry.push_str(&String::from_utf8_lossy(&buffer[..count]));
        while let Some(newline) = carry.find('\n') {
            let record = carry[..newline].trim_end().to_string();
            carry.drain(..=newline);
            if record.is_empty() {
                continue;
            }
            match translate_record(&record) {
                Some(ProgressEvent::Completed) => {
                    // The end marker closes event production for this
                    // connection regardless of what follows.
                    let _ = events_tx.send(ProgressEvent::Completed).await;
                    return;
                }
                Some(event) => {
                    let _ = events_tx.send(event).await;
                }
                None => {}
            }
        }
    }
}

/// Maps one `key=value` record to an event, if it carries one.
///
/// Unknown keys are dropped without error; only a record that is not in
/// `key=value` form, or a recognized key whose value fails to parse, is
/// reported as unparseable.
fn translate_record(record: &str) -> Option<ProgressEvent> {
    match record.split_once('=') {
        Some(("progress", "end")) => Some(ProgressEvent::Completed),
        Some(("out_time", value)) => Some(match parse_clock_time(value) {
            Some(seconds) => ProgressEvent::ElapsedTime(seconds),
            None => ProgressEvent::Unparseable(record.to_string()),
        }),
        Some(_) => None,
        None => Some(ProgressEvent::Unparseable(record.to_string())),
    }
}
