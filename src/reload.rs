//! Hot-reload notifier.
//!
//! Provides WebSocket-based live reload for development.
//!
//! ```text
//! Indexer ──► BlogStore ──StoreEvent──► forwarder thread ──► ReloadHub ──► Browser
//!                                       (coalesce burst)     (broadcast)
//! ```
//!
//! Every change to the index is announced to connected clients as a single
//! [`RELOAD_MESSAGE`]; the injected client script reloads the page on it.

use crate::{data::StoreEvent, log};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    net::{IpAddr, SocketAddr, TcpListener, TcpStream},
    sync::{Arc, mpsc::Receiver},
    thread,
};
use tungstenite::{Message, WebSocket};

/// Message sent to clients after the index changes.
pub const RELOAD_MESSAGE: &str = r#"{"type":"custom","event":"store-update"}"#;

/// Client script injected into served pages (`__RELOAD_PORT__` is replaced).
const CLIENT_SCRIPT: &str = r#"<script>
(function connect() {
  const ws = new WebSocket(`ws://${location.hostname}:__RELOAD_PORT__`);
  ws.onmessage = (msg) => {
    const data = JSON.parse(msg.data);
    if (data.type === "custom" && data.event === "store-update") location.reload();
  };
  ws.onclose = () => setTimeout(connect, 1000);
})();
</script>"#;

/// Connected reload clients.
pub struct ReloadHub {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
    addr: SocketAddr,
}

impl ReloadHub {
    /// Bind the WebSocket endpoint and start accepting clients.
    pub fn bind(interface: IpAddr, port: u16) -> Result<Arc<Self>> {
        let listener = TcpListener::bind((interface, port))
            .with_context(|| format!("Failed to bind reload socket on {interface}:{port}"))?;
        let addr = listener.local_addr()?;

        let hub = Arc::new(Self {
            clients: Mutex::new(Vec::new()),
            addr,
        });

        let acceptor = Arc::clone(&hub);
        thread::spawn(move || acceptor.accept_loop(&listener));

        Ok(hub)
    }

    fn accept_loop(&self, listener: &TcpListener) {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    log!("reload"; "accept failed: {e}");
                    continue;
                }
            };
            match tungstenite::accept(stream) {
                Ok(ws) => self.clients.lock().push(ws),
                Err(e) => log!("reload"; "handshake failed: {e}"),
            }
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send `msg` to every client, dropping the ones that fail.
    ///
    /// Returns the number of clients reached.
    pub fn broadcast(&self, msg: &str) -> usize {
        let mut clients = self.clients.lock();
        clients.retain_mut(|ws| ws.send(Message::text(msg)).is_ok());
        clients.len()
    }

    /// Forward store events to clients on a background thread.
    ///
    /// Events arriving together (one debounced batch) produce one message.
    pub fn forward(self: &Arc<Self>, events: Receiver<StoreEvent>) {
        let hub = Arc::clone(self);
        thread::spawn(move || {
            while let Ok(event) = events.recv() {
                let extra = events.try_iter().count();
                if hub.client_count() == 0 {
                    continue;
                }
                let reached = hub.broadcast(RELOAD_MESSAGE);
                if reached > 0 {
                    log!("reload"; "{} (+{extra}) -> {reached} client(s)", describe(&event));
                }
            }
        });
    }

    /// Script tag connecting a page to this hub.
    pub fn client_script(&self) -> String {
        CLIENT_SCRIPT.replace("__RELOAD_PORT__", &self.addr.port().to_string())
    }
}

fn describe(event: &StoreEvent) -> String {
    match event {
        StoreEvent::Entry { url } => format!("entry /{url}"),
        StoreEvent::Page { url } => format!("page /{url}"),
        StoreEvent::Removed { url } => format!("removed /{url}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BlogStore;
    use crate::data::archive::tests::entry;
    use std::{
        net::Ipv4Addr,
        time::{Duration, Instant},
    };

    fn wait_for(cond: impl Fn() -> bool) {
        let start = Instant::now();
        while !cond() {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out");
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn connect(hub: &ReloadHub) -> WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>> {
        let (ws, _) = tungstenite::connect(format!("ws://{}", hub.addr())).unwrap();
        ws
    }

    #[test]
    fn test_broadcast_reaches_clients() {
        let hub = ReloadHub::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let mut client = connect(&hub);
        wait_for(|| hub.client_count() == 1);

        assert_eq!(hub.broadcast(RELOAD_MESSAGE), 1);
        let msg = client.read().unwrap();
        assert_eq!(msg.to_text().unwrap(), RELOAD_MESSAGE);
    }

    #[test]
    fn test_dead_clients_dropped() {
        let hub = ReloadHub::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let client = connect(&hub);
        wait_for(|| hub.client_count() == 1);
        drop(client);

        wait_for(|| hub.broadcast(RELOAD_MESSAGE) == 0);
        assert_eq!(hub.client_count(), 0);
    }

    #[test]
    fn test_store_events_forwarded() {
        let hub = ReloadHub::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let store = BlogStore::new();
        hub.forward(store.subscribe());

        let mut client = connect(&hub);
        wait_for(|| hub.client_count() == 1);

        store.upsert_entry(entry("post", "2021-06-03", false));
        let msg = client.read().unwrap();
        assert_eq!(msg.to_text().unwrap(), RELOAD_MESSAGE);
    }

    #[test]
    fn test_client_script() {
        let hub = ReloadHub::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
        let script = hub.client_script();
        assert!(script.contains(&format!("}}:{}`", hub.addr().port())));
        assert!(script.contains("store-update"));
    }
}
