//! A length-framed simulator stand-in served on a loopback TCP port.
//!
//! Each request frame is decoded as JSON and handed to a handler, whose
//! [`SimReply`] decides what goes back on the wire.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What the fake simulator does with one request.
#[derive(Debug, Clone)]
pub enum SimReply {
    /// Send this JSON document as a complete frame.
    Json(Value),
    /// Send these bytes as a complete frame body.
    Raw(Vec<u8>),
    /// Send a length prefix announcing `announced` bytes, then only `body`,
    /// then close the connection.
    Truncated { announced: u32, body: Vec<u8> },
    /// Do not answer; keep the connection open.
    Silent,
    /// Close the connection without answering.
    Close,
}

type Handler = Box<dyn FnMut(&Value) -> SimReply + Send>;

/// Fake simulator running on a background thread.
///
/// Accepts connections one at a time, so a client may disconnect and
/// reconnect. Shut down on drop.
pub struct FakeSimulator {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FakeSimulator {
    /// Serve with a custom handler.
    pub fn spawn(handler: impl FnMut(&Value) -> SimReply + Send + 'static) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        let received = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let received = Arc::clone(&received);
            let stop = Arc::clone(&stop);
            let mut handler: Handler = Box::new(handler);
            std::thread::spawn(move || serve(&listener, &mut handler, &received, &stop))
        };

        Ok(Self {
            addr,
            received,
            stop,
            thread: Some(thread),
        })
    }

    /// Reply with `replies` in order regardless of the command, then close.
    pub fn scripted(replies: Vec<SimReply>) -> io::Result<Self> {
        let mut replies = replies.into_iter();
        Self::spawn(move |_| replies.next().unwrap_or(SimReply::Close))
    }

    /// A minimal reaching task.
    ///
    /// `RESET` puts the TCP at the origin, 0.5 m from a target on +x.
    /// Every `STEP` moves the TCP 0.1 m towards the target; `CONFIG` echoes
    /// the current state.
    pub fn reaching() -> io::Result<Self> {
        let mut x = 0.0_f32;
        Self::spawn(move |cmd| {
            match cmd.get("Type").and_then(Value::as_str) {
                Some("RESET") => x = 0.0,
                Some("STEP") => x += 0.1,
                _ => {}
            }
            SimReply::Json(serde_json::json!({
                "JointAngles": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "ToolCenterPointPosition": [x, 0.0, 0.0],
                "DirectionToTarget": [1.0, 0.0, 0.0],
                "DistanceToTarget": (0.5 - x).abs(),
                "IsResetFrame": cmd.get("Type").and_then(Value::as_str) == Some("RESET"),
            }))
        })
    }

    /// `tcp://127.0.0.1:<port>`.
    pub fn address(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    pub const fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every command received so far, in order.
    pub fn received(&self) -> Vec<Value> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Drop for FakeSimulator {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn serve(
    listener: &TcpListener,
    handler: &mut Handler,
    received: &Mutex<Vec<Value>>,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "fake simulator accepted connection");
                if let Err(e) = serve_connection(stream, handler, received, stop) {
                    debug!(error = %e, "fake simulator connection ended");
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::sleep(POLL_INTERVAL),
            Err(_) => return,
        }
    }
}

fn serve_connection(
    mut stream: TcpStream,
    handler: &mut Handler,
    received: &Mutex<Vec<Value>>,
    stop: &AtomicBool,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(POLL_INTERVAL))?;

    loop {
        let Some(body) = read_frame(&mut stream, stop)? else {
            return Ok(());
        };
        let command: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        if let Ok(mut r) = received.lock() {
            r.push(command.clone());
        }

        match handler(&command) {
            SimReply::Json(value) => write_frame(&mut stream, value.to_string().as_bytes())?,
            SimReply::Raw(bytes) => write_frame(&mut stream, &bytes)?,
            SimReply::Truncated { announced, body } => {
                stream.write_all(&announced.to_be_bytes())?;
                stream.write_all(&body)?;
                return Ok(());
            }
            SimReply::Silent => {}
            SimReply::Close => return Ok(()),
        }
    }
}

/// `None` on clean EOF or shutdown.
fn read_frame(stream: &mut TcpStream, stop: &AtomicBool) -> io::Result<Option<Vec<u8>>> {
    let mut len = [0u8; 4];
    if !read_exact_polling(stream, &mut len, stop)? {
        return Ok(None);
    }
    let mut body = vec![0u8; u32::from_be_bytes(len) as usize];
    if !read_exact_polling(stream, &mut body, stop)? {
        return Ok(None);
    }
    Ok(Some(body))
}

fn read_exact_polling(stream: &mut TcpStream, buf: &mut [u8], stop: &AtomicBool) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        if stop.load(Ordering::SeqCst) {
            return Ok(false);
        }
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

fn write_frame(stream: &mut TcpStream, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len()).map_err(|_| io::Error::other("frame too large"))?;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(body)?;
    stream.flush()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
