//! Metric sink backends.

use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Destination for scalar series.
pub trait MetricsSink: Send {
    fn record(&mut self, name: &str, value: f64, index: usize);

    /// Flush any buffered output.
    fn flush(&mut self);
}

/// Writes each point as an `info!` line under the `metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn record(&mut self, name: &str, value: f64, index: usize) {
        log::info!(target: "metrics", "{} [{}] = {:.6}", name, index, value);
    }

    fn flush(&mut self) {}
}

/// CSV file sink.
pub struct CsvSink {
    writer: BufWriter<File>,
}

impl CsvSink {
    /// Create the file and write the header.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "name,index,value")?;
        Ok(Self { writer })
    }
}

impl MetricsSink for CsvSink {
    fn record(&mut self, name: &str, value: f64, index: usize) {
        if let Err(e) = writeln!(self.writer, "{},{},{}", name, index, value) {
            log::warn!("failed to write metric {}: {}", name, e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("failed to flush metrics: {}", e);
        }
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        self.flush();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: String,
    pub value: f64,
    pub index: usize,
}

/// In-memory sink. Clones share the same store.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<MetricRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MetricRecord> {
        self.records.lock().clone()
    }

    /// Values of one series in emission order.
    pub fn series(&self, name: &str) -> Vec<(usize, f64)> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.name == name)
            .map(|r| (r.index, r.value))
            .collect()
    }
}

impl MetricsSink for MemorySink {
    fn record(&mut self, name: &str, value: f64, index: usize) {
        self.records.lock().push(MetricRecord {
            name: name.to_string(),
            value,
            index,
        });
    }

    fn flush(&mut self) {}
}

/// Fan-out to several sinks.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn MetricsSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: MetricsSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn MetricsSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for MultiSink {
    fn record(&mut self, name: &str, value: f64, index: usize) {
        for sink in &mut self.sinks {
            sink.record(name, value, index);
        }
    }

    fn flush(&mut self) {
        for sink in &mut self.sinks {
            sink.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_sink_shares_store() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        handle.record("data/reward", 3.5, 1);
        handle.record("data/step", 120.0, 1);
        handle.record("data/reward", -1.0, 2);

        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.series("data/reward"), vec![(1, 3.5), (2, -1.0)]);
    }

    #[test]
    fn test_csv_sink_writes_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        {
            let mut sink = CsvSink::new(&path).unwrap();
            sink.record("data/lr", 0.0001, 0);
            sink.record("data/max_prob", 0.5, 1);
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["name,index,value", "data/lr,0,0.0001", "data/max_prob,1,0.5"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_csv_sink_survives_flush_error() {
        let path = Path::new("/dev/full");
        if !path.exists() {
            return;
        }
        let mut sink = match CsvSink::new(path) {
            Ok(sink) => sink,
            Err(_) => return,
        };
        sink.record("data/reward", 1.0, 1);
        // Writing to a full device fails on flush; the error is logged and swallowed.
        sink.flush();
        sink.record("data/reward", 2.0, 2);
        sink.flush();
    }

    #[test]
    fn test_multi_sink_fans_out() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut multi = MultiSink::new().add(a.clone()).add(b.clone()).add(LogSink);
        multi.record("data/step", 7.0, 3);
        multi.flush();

        assert_eq!(multi.len(), 3);
        assert_eq!(a.series("data/step"), vec![(3, 7.0)]);
        assert_eq!(b.series("data/step"), vec![(3, 7.0)]);
    }
}
