use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Thread-safe `.tlog` writer: each record is an 8-byte big-endian Unix
/// timestamp in microseconds followed by the raw frame.
#[derive(Clone)]
pub struct TlogRecorder {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl TlogRecorder {
    /// Create a recorder that writes to the provided path, truncating any existing file.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Record a frame with the current system timestamp.
    pub fn record(&self, frame: &[u8]) -> io::Result<()> {
        self.record_at(SystemTime::now(), frame)
    }

    fn record_at(&self, timestamp: SystemTime, frame: &[u8]) -> io::Result<()> {
        let micros = timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros();
        let micros = u64::try_from(micros).unwrap_or(u64::MAX);
        let mut writer = self.inner.lock();
        writer.write_all(&micros.to_be_bytes())?;
        writer.write_all(frame)?;
        writer.flush()
    }
}

impl std::fmt::Debug for TlogRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlogRecorder").finish_non_exhaustive()
    }
}
