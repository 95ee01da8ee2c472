#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use profile_gate::profile::{ColumnSummary, ProfileView};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

pub struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = BufferWriter;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriter(Arc::clone(&self.0))
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    /// Parsed JSON log lines captured so far.
    pub fn events(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().expect("lock output").clone();
        let text = String::from_utf8(bytes).expect("utf8 log output");
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("json log line"))
            .collect()
    }

    pub fn levels(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.get("level").and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| {
                e.get("fields")
                    .and_then(|f| f.get("message"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .collect()
    }
}

/// Installs a JSON subscriber for the current thread. Works with the default
/// single-threaded `#[tokio::test]` runtime.
pub fn capture_logs() -> (SharedBuffer, DefaultGuard) {
    let sink = SharedBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .json()
        .with_max_level(Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (sink, guard)
}

pub fn sample_profile() -> ProfileView {
    ProfileView::new("transformed")
        .with_column(
            "a",
            ColumnSummary::numeric(200, 0, 48.2, 1.0, 99.0).with_stddev(28.1),
        )
        .with_column(
            "b",
            ColumnSummary::numeric(200, 4, 61.7, -3.0, 120.0).with_stddev(30.4),
        )
}

pub fn drifted_profile() -> ProfileView {
    ProfileView::new("transformed-next")
        .with_column(
            "a",
            ColumnSummary::numeric(210, 0, 49.0, 1.0, 99.0).with_stddev(28.5),
        )
        .with_column(
            "b",
            ColumnSummary::numeric(210, 40, 90.3, -3.0, 240.0).with_stddev(55.0),
        )
        .with_column("c", ColumnSummary::numeric(210, 0, 1.0, 0.0, 2.0))
}

pub fn write_profile(dir: &Path, name: &str, profile: &ProfileView) -> String {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(profile).expect("serialize profile");
    std::fs::write(&path, json).expect("write profile");
    path.to_string_lossy().to_string()
}
