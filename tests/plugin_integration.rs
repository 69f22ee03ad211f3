//! End-to-end scenarios for the directory mirror and the statistics queue.

use std::fs;
use std::path::MAIN_SEPARATOR;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use cfgplugin::monitor::{Classification, FileMonitor, NotifyMonitor};
use cfgplugin::plugin::{ClientIdentity, ServerCore};
use cfgplugin::stats::{StatisticsHandler, ThreadedStatistics};
use cfgplugin::tree::{DirectoryMirror, EntryFactory, FileBacked, KeyValueIndex, TreeEntry};
use cfgplugin::{Config, Result};

struct TestCore {
    config: Config,
    token: CancellationToken,
}

impl TestCore {
    fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            config,
            token: CancellationToken::new(),
        })
    }
}

impl ServerCore for TestCore {
    fn termination(&self) -> &CancellationToken {
        &self.token
    }

    fn build_identity(&self, hostname: &str) -> Result<ClientIdentity> {
        Ok(ClientIdentity::new(hostname))
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

struct CollectingHandler {
    seen: Mutex<Vec<(String, Value)>>,
}

impl StatisticsHandler for CollectingHandler {
    fn handle_statistic(&self, client: &ClientIdentity, payload: &Value) -> Result<()> {
        self.seen
            .lock()
            .push((client.hostname().to_string(), payload.clone()));
        Ok(())
    }
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

fn key_value_factory() -> EntryFactory {
    Box::new(|path, monitor| Box::new(FileBacked::<KeyValueIndex>::new(path, monitor)))
}

/// Drain monitor events into the mirror until the channel goes quiet.
fn pump(mirror: &mut DirectoryMirror, monitor: &NotifyMonitor) {
    let rx = monitor.events();
    while let Ok(event) = rx.try_recv() {
        mirror.handle_event(&event);
    }
}

#[test]
fn mirror_builds_tree_from_initial_scan() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("foo")).unwrap();
    fs::write(tmp.path().join("foo/bar.cfg"), "owner = root").unwrap();
    fs::write(tmp.path().join("top.cfg"), "group = wheel").unwrap();

    let monitor = Arc::new(NotifyMonitor::new().unwrap());
    let mut mirror =
        DirectoryMirror::new(tmp.path(), monitor.clone(), key_value_factory()).unwrap();

    // The root registration synthesized Exists events for "foo" and
    // "top.cfg"; dispatching "foo" registers a monitor which synthesizes
    // events for its children in turn. Two passes settle the tree.
    pump(&mut mirror, &monitor);
    pump(&mut mirror, &monitor);

    let bar_key = format!("foo{MAIN_SEPARATOR}bar.cfg");
    let mut paths: Vec<&str> = mirror.iter().map(|(p, _)| p).collect();
    paths.sort_unstable();
    assert_eq!(paths, vec![bar_key.as_str(), "top.cfg"]);

    // Content was loaded on first sight, not deferred to a later change.
    assert!(mirror.get(&bar_key).is_some());
}

#[test]
fn mirror_directory_event_never_creates_entry() {
    let tmp = TempDir::new().unwrap();
    let monitor = Arc::new(NotifyMonitor::new().unwrap());
    let mut mirror =
        DirectoryMirror::new(tmp.path(), monitor.clone(), key_value_factory()).unwrap();
    pump(&mut mirror, &monitor);
    assert!(mirror.is_empty());

    // "foo" appears as a directory: a monitor is registered, no entry.
    fs::create_dir(tmp.path().join("foo")).unwrap();
    let rx = monitor.events();
    assert!(wait_until(Duration::from_secs(10), || !rx.is_empty()));
    pump(&mut mirror, &monitor);
    assert!(mirror.is_empty());

    // A file under "foo" then becomes exactly one entry.
    fs::write(tmp.path().join("foo/bar.cfg"), "owner = root").unwrap();
    let bar_key = format!("foo{MAIN_SEPARATOR}bar.cfg");
    assert!(wait_until(Duration::from_secs(10), || {
        pump(&mut mirror, &monitor);
        mirror.get(&bar_key).is_some()
    }));
    assert_eq!(mirror.len(), 1);
}

#[test]
fn deleted_directory_evicts_prefixed_entries() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("quux")).unwrap();
    fs::write(tmp.path().join("quux/a.cfg"), "a = 1").unwrap();
    fs::write(tmp.path().join("quux/b.cfg"), "b = 2").unwrap();
    fs::write(tmp.path().join("keep.cfg"), "k = 3").unwrap();

    let monitor = Arc::new(NotifyMonitor::new().unwrap());
    let mut mirror =
        DirectoryMirror::new(tmp.path(), monitor.clone(), key_value_factory()).unwrap();
    pump(&mut mirror, &monitor);
    pump(&mut mirror, &monitor);
    assert_eq!(mirror.len(), 3);

    fs::remove_dir_all(tmp.path().join("quux")).unwrap();
    assert!(wait_until(Duration::from_secs(10), || {
        pump(&mut mirror, &monitor);
        mirror.iter().all(|(path, _)| !path.starts_with("quux"))
            && mirror.len() == 1
    }));
    assert!(mirror.get("keep.cfg").is_some());
}

/// Handler that parks the worker until the test releases it, making the
/// moment of termination deterministic.
struct GateHandler {
    entered: crossbeam_channel::Sender<()>,
    release: crossbeam_channel::Receiver<()>,
}

impl StatisticsHandler for GateHandler {
    fn handle_statistic(&self, _client: &ClientIdentity, _payload: &Value) -> Result<()> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        Ok(())
    }
}

#[test]
fn statistics_survive_restart() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        dequeue_timeout: Duration::from_millis(10),
        ..Config::new(tmp.path())
    };
    let pending = config.pending_path("Statistics");

    // First instance: park the worker inside the handler, queue two real
    // records behind the gate, then terminate. The queued records land in
    // the snapshot.
    let first_core = TestCore::new(config.clone());
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (release_tx, release_rx) = crossbeam_channel::bounded(1);
    let gate = Arc::new(GateHandler {
        entered: entered_tx,
        release: release_rx,
    });
    let stats = ThreadedStatistics::new("Statistics", first_core.clone(), gate).unwrap();

    let a = ClientIdentity::new("a.example.com");
    let b = ClientIdentity::new("b.example.com");
    stats.process_statistics(&ClientIdentity::new("gate.example.com"), &json!({}));
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    stats.process_statistics(&a, &json!({ "state": "clean" }));
    stats.process_statistics(&b, &json!({ "state": "dirty" }));

    first_core.token.cancel();
    release_tx.send(()).unwrap();
    stats.join();

    assert!(pending.exists());

    // Second instance: the snapshot is replayed into the handler and the
    // pending file is deleted after the fully successful pass.
    let second_core = TestCore::new(config);
    let replay = Arc::new(CollectingHandler {
        seen: Mutex::new(Vec::new()),
    });
    let restarted =
        ThreadedStatistics::new("Statistics", second_core.clone(), replay.clone()).unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        replay.seen.lock().len() == 2
    }));
    assert!(!pending.exists());

    second_core.token.cancel();
    restarted.join();

    let mut hosts: Vec<String> = replay.seen.lock().iter().map(|(h, _)| h.clone()).collect();
    hosts.sort();
    assert_eq!(hosts, vec!["a.example.com", "b.example.com"]);
}

#[test]
fn entry_factory_receives_monitor_reference() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("node.cfg"), "owner = root").unwrap();

    let monitor = Arc::new(NotifyMonitor::new().unwrap());
    let captured: Arc<Mutex<Vec<Arc<dyn FileMonitor>>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&captured);
    let factory: EntryFactory = Box::new(move |path, service| {
        log.lock().push(Arc::clone(&service));
        Box::new(FileBacked::<KeyValueIndex>::new(path, service)) as Box<dyn TreeEntry>
    });

    let mut mirror = DirectoryMirror::new(tmp.path(), monitor.clone(), factory).unwrap();
    pump(&mut mirror, &monitor);

    assert_eq!(captured.lock().len(), 1);
    assert_eq!(mirror.len(), 1);
}

/// `EndExist` markers flow through without side effects.
#[test]
fn scan_markers_are_inert() {
    let tmp = TempDir::new().unwrap();
    let monitor = Arc::new(NotifyMonitor::new().unwrap());
    let rx = monitor.events();
    let mut mirror =
        DirectoryMirror::new(tmp.path(), monitor.clone(), key_value_factory()).unwrap();

    let mut saw_marker = false;
    while let Ok(event) = rx.try_recv() {
        if event.kind == Classification::EndExist {
            saw_marker = true;
        }
        mirror.handle_event(&event);
    }

    assert!(saw_marker);
    assert!(mirror.is_empty());
}
