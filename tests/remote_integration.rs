//! Purpose: End-to-end tests for the cart document server/client.
//! Exports: None (integration test module).
//! Role: Validate fetch/put round-trips and sync flows across TCP.
//! Invariants: Uses loopback-only server with temp store files.
//! Invariants: Bounded waits avoid test flakiness.
//! Invariants: Server processes are cleaned up on drop.

use cartlite::api::{
    CartState, NotificationStatus, RemoteClient, Storefront, add_item, find_product,
};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::{Duration, Instant};

type TestResult<T> = Result<T, Box<dyn std::error::Error>>;

static SERVER_LOCK: Mutex<()> = Mutex::new(());

struct TestServer {
    child: Child,
    base_url: String,
    _server_guard: MutexGuard<'static, ()>,
}

impl TestServer {
    fn start() -> TestResult<Self> {
        Self::start_with_store(None)
    }

    fn start_with_store(store: Option<&Path>) -> TestResult<Self> {
        let guard = SERVER_LOCK
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());
        let mut last_err: Option<Box<dyn std::error::Error>> = None;
        for _attempt in 0..3 {
            let port = pick_port()?;
            let bind = format!("127.0.0.1:{port}");
            let base_url = format!("http://{bind}");

            let mut command = Command::new(env!("CARGO_BIN_EXE_cartlite"));
            command
                .arg("serve")
                .arg("--bind")
                .arg(&bind)
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            if let Some(store) = store {
                command.arg("--store").arg(store);
            }
            let mut child = command.spawn()?;

            match wait_for_server(&mut child, bind.parse()?) {
                Ok(()) => {
                    return Ok(Self {
                        child,
                        base_url,
                        _server_guard: guard,
                    });
                }
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    last_err = Some(err);
                    sleep(Duration::from_millis(30));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "server failed to start".into()))
    }

    fn client(&self) -> TestResult<RemoteClient> {
        Ok(RemoteClient::new(self.base_url.clone())?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn pick_port() -> TestResult<u16> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

fn wait_for_server(child: &mut Child, addr: SocketAddr) -> TestResult<()> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(status) = child.try_wait()? {
            return Err(format!("server exited early with {status}").into());
        }
        if TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err("server did not accept connections in time".into());
        }
        sleep(Duration::from_millis(20));
    }
}

#[test]
fn fresh_server_serves_the_empty_document() -> TestResult<()> {
    let server = TestServer::start()?;
    let client = server.client()?;
    let doc = client.fetch_cart()?;
    assert!(doc.items.is_none());
    assert!(doc.total_quantity.is_none());
    let cart = CartState::from_document(doc);
    assert!(cart.is_empty());
    assert_eq!(cart.total_quantity, 0);
    Ok(())
}

#[test]
fn put_then_fetch_roundtrips_the_cart() -> TestResult<()> {
    let server = TestServer::start()?;
    let client = server.client()?;

    let product = find_product("p1")?;
    let cart = add_item(&CartState::default(), &product);
    let cart = add_item(&cart, &product);
    client.put_cart(&cart)?;

    let fetched = CartState::from_document(client.fetch_cart()?);
    assert_eq!(fetched, cart);
    Ok(())
}

#[test]
fn initial_load_leaves_the_document_untouched() -> TestResult<()> {
    let server = TestServer::start()?;
    let mut session = Storefront::new(server.client()?);
    session.load();
    assert!(session.notification().is_none());

    let probe = server.client()?;
    let doc = probe.fetch_cart()?;
    assert!(doc.items.is_none());
    Ok(())
}

#[test]
fn session_mutations_sync_across_processes() -> TestResult<()> {
    let server = TestServer::start()?;

    let mut session = Storefront::new(server.client()?);
    session.load();
    let product = find_product("p1")?;
    session.add_to_cart(&product);
    session.add_to_cart(&product);
    session.remove_from_cart("p1")?;
    let notification = session.notification().expect("notification");
    assert_eq!(notification.status, NotificationStatus::Success);

    let mut next = Storefront::new(server.client()?);
    next.load();
    assert_eq!(next.cart().total_quantity, 1);
    assert_eq!(next.cart().items[0].quantity, 1);
    assert_eq!(next.cart().items[0].total_price, product.price);
    Ok(())
}

#[test]
fn unreachable_remote_surfaces_notifications_only() -> TestResult<()> {
    // Hold the server lock so no test server can claim the picked port.
    let _guard = SERVER_LOCK
        .lock()
        .unwrap_or_else(|poison| poison.into_inner());
    let port = pick_port()?;
    let client = RemoteClient::new(format!("http://127.0.0.1:{port}"))?;
    let mut session = Storefront::new(client);

    session.load();
    let notification = session.notification().expect("notification");
    assert_eq!(notification.status, NotificationStatus::Error);
    assert_eq!(notification.message, "Fetching cart data failed.");
    assert!(session.cart().is_empty());

    let product = find_product("p2")?;
    session.add_to_cart(&product);
    let notification = session.notification().expect("notification");
    assert_eq!(notification.status, NotificationStatus::Error);
    assert_eq!(notification.message, "Sending cart data failed.");
    // The local cart still advanced; only the sync failed.
    assert_eq!(session.cart().total_quantity, 1);
    Ok(())
}

#[test]
fn store_file_survives_a_server_restart() -> TestResult<()> {
    let temp = tempfile::tempdir()?;
    let store = temp.path().join("cart.json");

    let cart = {
        let server = TestServer::start_with_store(Some(&store))?;
        let mut session = Storefront::new(server.client()?);
        session.load();
        let product = find_product("p3")?;
        session.add_to_cart(&product);
        session.cart().clone()
    };

    let server = TestServer::start_with_store(Some(&store))?;
    let fetched = CartState::from_document(server.client()?.fetch_cart()?);
    assert_eq!(fetched, cart);
    Ok(())
}
