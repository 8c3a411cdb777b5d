use std::collections::BTreeSet;
use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use mc_server_pinger::address::ServerAddress;
use mc_server_pinger::config::Settings;
use mc_server_pinger::error::PingError;
use mc_server_pinger::source::{Fetched, StatusSource};
use mc_server_pinger::state::AggregatedState;
use mc_server_pinger::status::{Players, StatusResponse};
use mc_server_pinger::watcher::{WatchExit, Watcher};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Answers every ping with `online = port - 25560` and remembers which ports were asked for.
#[derive(Default)]
struct FakeSource {
    ports: Mutex<BTreeSet<u16>>,
}

impl StatusSource for FakeSource {
    async fn fetch(&self, address: &ServerAddress, _: Option<SocketAddr>) -> Result<Fetched, PingError> {
        self.ports.lock().insert(address.port());
        Ok(Fetched {
            status: StatusResponse {
                players: Players {
                    max: Some(20),
                    online: Some(address.port() as i32 - 25560),
                    sample: Vec::new(),
                },
                ..StatusResponse::default()
            },
            connected: SocketAddr::from(([192, 0, 2, 1], address.port())),
        })
    }
}

fn write_list(path: &Path, contents: &str, modified: SystemTime) {
    std::fs::write(path, contents).unwrap();
    File::options().write(true).open(path).unwrap().set_modified(modified).unwrap();
}

async fn wait_for(state: &AggregatedState, slots: &[usize]) -> Vec<(usize, String)> {
    for _ in 0..200 {
        let snapshot = state.snapshot();
        if snapshot.iter().map(|(slot, _)| *slot).eq(slots.iter().copied()) {
            return snapshot.into_iter().map(|(slot, record)| (slot, record.address)).collect();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("slots never became {slots:?}: {:?}", state.snapshot());
}

fn settings(path: &Path) -> Settings {
    Settings {
        servers: path.to_path_buf(),
        poll_interval: Duration::from_millis(20),
        watch_interval: Duration::from_millis(20),
        ..Settings::default()
    }
}

#[tokio::test]
async fn reload_adds_and_removes_pollers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.txt");
    let start = SystemTime::now() - Duration::from_secs(60);
    write_list(&path, "a.example.com\n\nb.example.com:25566\n", start);

    let source = Arc::new(FakeSource::default());
    let state = Arc::new(AggregatedState::new());
    let shutdown = CancellationToken::new();
    let mut watcher = Watcher::new(source.clone(), state.clone(), settings(&path), shutdown.clone());

    assert_eq!(watcher.check().await.unwrap(), Some(2));
    assert_eq!(
        wait_for(&state, &[0, 1]).await,
        vec![(0, "a.example.com:25565".to_string()), (1, "b.example.com:25566".to_string())]
    );
    assert_eq!(*source.ports.lock(), BTreeSet::from([25565, 25566]));
    assert_eq!(watcher.check().await.unwrap(), None);

    write_list(&path, "a.example.com\n", start + Duration::from_secs(5));
    assert_eq!(watcher.check().await.unwrap(), Some(1));
    assert_eq!(wait_for(&state, &[0]).await, vec![(0, "a.example.com:25565".to_string())]);

    // nothing from the previous generation reaches the board
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.snapshot().len(), 1);

    shutdown.cancel();
}

#[tokio::test]
async fn empty_list_ends_the_watch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.txt");
    write_list(&path, "\n   \n", SystemTime::now());

    let watcher = Watcher::new(
        Arc::new(FakeSource::default()),
        Arc::new(AggregatedState::new()),
        settings(&path),
        CancellationToken::new(),
    );
    assert_eq!(watcher.run().await.unwrap(), WatchExit::Empty);
}

#[tokio::test]
async fn shutdown_token_stops_the_watch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("servers.txt");
    write_list(&path, "a.example.com\n", SystemTime::now());

    let shutdown = CancellationToken::new();
    let state = Arc::new(AggregatedState::new());
    let watcher = Watcher::new(Arc::new(FakeSource::default()), state.clone(), settings(&path), shutdown.clone());
    let handle = tokio::spawn(watcher.run());
    wait_for(&state, &[0]).await;
    shutdown.cancel();
    assert_eq!(handle.await.unwrap().unwrap(), WatchExit::Shutdown);
}

#[tokio::test]
async fn missing_list_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let watcher = Watcher::new(
        Arc::new(FakeSource::default()),
        Arc::new(AggregatedState::new()),
        settings(&dir.path().join("absent.txt")),
        CancellationToken::new(),
    );
    assert!(watcher.run().await.is_err());
}
