//! Resource profiler: background CPU/RAM/I/O sampling around a benchmark
//!
//! The sampler thread owns its sample vector for its whole lifetime. Stopping
//! the profiler signals the thread over a channel, joins it and receives the
//! frozen vector back, so nothing ever observes a partially collected series.

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Default number of points in a downsampled curve
pub const DEFAULT_CURVE_POINTS: usize = 50;

/// One reading from a probe, before timestamps are attached
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceReading {
    pub cpu_percent: f64,
    pub ram_mb: f64,
    /// Cumulative bytes read since boot, in MB
    pub io_read_mb: f64,
    /// Cumulative bytes written since boot, in MB
    pub io_write_mb: f64,
    pub gpu_percent: f64,
}

/// Timestamped resource sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// Milliseconds since the profiler started
    pub elapsed_ms: f64,
    pub cpu_percent: f64,
    pub ram_mb: f64,
    pub io_read_mb: f64,
    pub io_write_mb: f64,
    pub gpu_percent: f64,
}

/// Source of resource readings
pub trait ResourceProbe: Send + 'static {
    fn sample(&mut self) -> ResourceReading;
}

/// Aggregate figures over a profiling window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub cpu_avg: f64,
    pub cpu_max: f64,
    pub ram_avg_mb: f64,
    pub ram_max_mb: f64,
    pub io_total_mb: f64,
    pub gpu_avg: f64,
    pub duration_ms: f64,
    pub sample_count: usize,
}

/// Downsampled series for plotting; timestamps are normalised to 0..100
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileCurve {
    pub timestamps: Vec<f64>,
    pub cpu: Vec<f64>,
    pub ram: Vec<f64>,
    pub io: Vec<f64>,
    pub gpu: Vec<f64>,
}

/// Summary plus curve, as embedded in summaries and reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub summary: ResourceSummary,
    pub curve: ProfileCurve,
}

/// Frozen samples handed back by `RunningProfiler::stop`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSamples {
    samples: Vec<ResourceSample>,
}

impl ProfileSamples {
    pub fn new(samples: Vec<ResourceSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[ResourceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Averages and peaks over the window; all zero when nothing was sampled
    pub fn summary(&self) -> ResourceSummary {
        let (first, last) = match (self.samples.first(), self.samples.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return ResourceSummary::default(),
        };
        let n = self.samples.len() as f64;

        let io_total_mb = if self.samples.len() > 1 {
            let read = last.io_read_mb - first.io_read_mb;
            let write = last.io_write_mb - first.io_write_mb;
            (read + write).max(0.0)
        } else {
            0.0
        };

        ResourceSummary {
            cpu_avg: self.samples.iter().map(|s| s.cpu_percent).sum::<f64>() / n,
            cpu_max: self
                .samples
                .iter()
                .map(|s| s.cpu_percent)
                .fold(f64::MIN, f64::max),
            ram_avg_mb: self.samples.iter().map(|s| s.ram_mb).sum::<f64>() / n,
            ram_max_mb: self
                .samples
                .iter()
                .map(|s| s.ram_mb)
                .fold(f64::MIN, f64::max),
            io_total_mb,
            gpu_avg: self.samples.iter().map(|s| s.gpu_percent).sum::<f64>() / n,
            duration_ms: last.elapsed_ms,
            sample_count: self.samples.len(),
        }
    }

    /// Downsample to at most `points` entries
    pub fn curve(&self, points: usize) -> ProfileCurve {
        if self.samples.is_empty() || points == 0 {
            return ProfileCurve::default();
        }

        let downsampled: Vec<&ResourceSample> = if self.samples.len() > points {
            let step = self.samples.len() / points;
            self.samples.iter().step_by(step).take(points).collect()
        } else {
            self.samples.iter().collect()
        };

        let start = downsampled[0].elapsed_ms;
        let end = downsampled[downsampled.len() - 1].elapsed_ms;
        let span = if end > start { end - start } else { 1.0 };

        ProfileCurve {
            timestamps: downsampled
                .iter()
                .map(|s| (s.elapsed_ms - start) / span * 100.0)
                .collect(),
            cpu: downsampled.iter().map(|s| s.cpu_percent).collect(),
            ram: downsampled.iter().map(|s| s.ram_mb).collect(),
            io: downsampled
                .iter()
                .map(|s| s.io_read_mb + s.io_write_mb)
                .collect(),
            gpu: downsampled.iter().map(|s| s.gpu_percent).collect(),
        }
    }

    pub fn profile(&self) -> ResourceProfile {
        ResourceProfile {
            summary: self.summary(),
            curve: self.curve(DEFAULT_CURVE_POINTS),
        }
    }
}

/// Entry point for starting a sampler thread
pub struct ResourceProfiler;

impl ResourceProfiler {
    /// Spawn the sampler; the first reading is taken immediately
    pub fn start<P: ResourceProbe>(mut probe: P, interval: Duration) -> RunningProfiler {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        let handle = std::thread::spawn(move || {
            let started = Instant::now();
            let mut samples = Vec::new();
            loop {
                let reading = probe.sample();
                samples.push(ResourceSample {
                    timestamp: unix_seconds(),
                    elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
                    cpu_percent: reading.cpu_percent,
                    ram_mb: reading.ram_mb,
                    io_read_mb: reading.io_read_mb,
                    io_write_mb: reading.io_write_mb,
                    gpu_percent: reading.gpu_percent,
                });
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            samples
        });

        debug!("Resource profiler started (interval {:?})", interval);
        RunningProfiler { stop_tx, handle }
    }

    /// Profile a closure, returning its result and the collected profile
    pub fn profile<P, T, F>(probe: P, interval: Duration, f: F) -> (T, ProfileSamples)
    where
        P: ResourceProbe,
        F: FnOnce() -> T,
    {
        let running = Self::start(probe, interval);
        let result = f();
        (result, running.stop())
    }
}

/// Handle to an active sampler thread
pub struct RunningProfiler {
    stop_tx: Sender<()>,
    handle: JoinHandle<Vec<ResourceSample>>,
}

impl RunningProfiler {
    /// Stop sampling and take ownership of everything collected
    pub fn stop(self) -> ProfileSamples {
        // A full channel or a gone receiver both mean the thread is ending
        let _ = self.stop_tx.try_send(());
        match self.handle.join() {
            Ok(samples) => {
                debug!("Resource profiler stopped with {} samples", samples.len());
                ProfileSamples::new(samples)
            }
            Err(_) => {
                warn!("Resource profiler thread panicked; discarding samples");
                ProfileSamples::default()
            }
        }
    }
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Linux system-wide probe backed by procfs
///
/// Any figure that cannot be read reports 0.
#[derive(Debug, Default)]
pub struct ProcfsProbe {
    last_cpu: Option<(u64, u64)>,
}

impl ProcfsProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// (busy, total) jiffies from the aggregate `cpu` line of /proc/stat
    fn read_cpu_times() -> Option<(u64, u64)> {
        let stat = std::fs::read_to_string("/proc/stat").ok()?;
        parse_cpu_times(stat.lines().next()?)
    }

    fn cpu_percent(&mut self) -> f64 {
        let Some(now) = Self::read_cpu_times() else {
            return 0.0;
        };
        let pct = match self.last_cpu {
            Some((busy, total)) if now.1 > total => {
                (now.0.saturating_sub(busy)) as f64 / (now.1 - total) as f64 * 100.0
            }
            _ => 0.0,
        };
        self.last_cpu = Some(now);
        pct
    }
}

impl ResourceProbe for ProcfsProbe {
    fn sample(&mut self) -> ResourceReading {
        let (io_read_mb, io_write_mb) = std::fs::read_to_string("/proc/diskstats")
            .map(|s| parse_diskstats(&s))
            .unwrap_or((0.0, 0.0));

        ResourceReading {
            cpu_percent: self.cpu_percent(),
            ram_mb: std::fs::read_to_string("/proc/meminfo")
                .ok()
                .and_then(|s| parse_used_ram_mb(&s))
                .unwrap_or(0.0),
            io_read_mb,
            io_write_mb,
            gpu_percent: 0.0,
        }
    }
}

fn parse_cpu_times(line: &str) -> Option<(u64, u64)> {
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let values: Vec<u64> = fields.filter_map(|f| f.parse().ok()).collect();
    if values.len() < 4 {
        return None;
    }
    let total: u64 = values.iter().sum();
    // idle + iowait
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Some((total - idle, total))
}

fn parse_used_ram_mb(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<f64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse::<f64>()
            .ok()
    };
    let total_kb = field("MemTotal:")?;
    let available_kb = field("MemAvailable:")?;
    Some((total_kb - available_kb).max(0.0) / 1024.0)
}

fn parse_diskstats(diskstats: &str) -> (f64, f64) {
    let mut read_sectors = 0u64;
    let mut write_sectors = 0u64;
    for line in diskstats.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let name = fields[2];
        if name.starts_with("loop") || name.starts_with("ram") {
            continue;
        }
        read_sectors += fields[5].parse::<u64>().unwrap_or(0);
        write_sectors += fields[9].parse::<u64>().unwrap_or(0);
    }
    (
        (read_sectors * 512) as f64 / BYTES_PER_MB,
        (write_sectors * 512) as f64 / BYTES_PER_MB,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Probe returning a scripted sequence, repeating the last reading
    struct ScriptedProbe {
        readings: Vec<ResourceReading>,
        idx: usize,
    }

    impl ResourceProbe for ScriptedProbe {
        fn sample(&mut self) -> ResourceReading {
            let r = self.readings[self.idx.min(self.readings.len() - 1)];
            self.idx += 1;
            r
        }
    }

    fn sample(elapsed_ms: f64, cpu: f64, ram: f64, io_read: f64) -> ResourceSample {
        ResourceSample {
            timestamp: 0.0,
            elapsed_ms,
            cpu_percent: cpu,
            ram_mb: ram,
            io_read_mb: io_read,
            io_write_mb: 0.0,
            gpu_percent: 0.0,
        }
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let samples = ProfileSamples::default();
        assert_eq!(samples.summary(), ResourceSummary::default());
        assert_eq!(samples.curve(50), ProfileCurve::default());
    }

    #[test]
    fn test_summary_aggregates() {
        let samples = ProfileSamples::new(vec![
            sample(0.0, 10.0, 100.0, 5.0),
            sample(100.0, 30.0, 300.0, 7.5),
        ]);
        let summary = samples.summary();
        assert_eq!(summary.cpu_avg, 20.0);
        assert_eq!(summary.cpu_max, 30.0);
        assert_eq!(summary.ram_avg_mb, 200.0);
        assert_eq!(summary.ram_max_mb, 300.0);
        assert_eq!(summary.io_total_mb, 2.5);
        assert_eq!(summary.duration_ms, 100.0);
        assert_eq!(summary.sample_count, 2);
    }

    #[test]
    fn test_io_total_never_negative() {
        let samples = ProfileSamples::new(vec![
            sample(0.0, 0.0, 0.0, 10.0),
            sample(1.0, 0.0, 0.0, 4.0),
        ]);
        assert_eq!(samples.summary().io_total_mb, 0.0);
    }

    #[test]
    fn test_curve_downsamples_and_normalises() {
        let samples = ProfileSamples::new(
            (0..200)
                .map(|i| sample(i as f64 * 10.0, i as f64, 0.0, 0.0))
                .collect(),
        );
        let curve = samples.curve(50);
        assert_eq!(curve.timestamps.len(), 50);
        assert_eq!(curve.cpu[1], 4.0); // step = 200 / 50
        assert_eq!(curve.timestamps[0], 0.0);
        assert_eq!(curve.timestamps[49], 100.0);
    }

    #[test]
    fn test_curve_short_series_kept_whole() {
        let samples = ProfileSamples::new(vec![sample(5.0, 1.0, 2.0, 0.0)]);
        let curve = samples.curve(50);
        assert_eq!(curve.timestamps, vec![0.0]);
        assert_eq!(curve.ram, vec![2.0]);
    }

    #[test]
    fn test_profiler_collects_until_stopped() {
        let probe = ScriptedProbe {
            readings: vec![ResourceReading {
                cpu_percent: 50.0,
                ram_mb: 64.0,
                ..ResourceReading::default()
            }],
            idx: 0,
        };
        let (value, samples) =
            ResourceProfiler::profile(probe, Duration::from_millis(1), || {
                std::thread::sleep(Duration::from_millis(20));
                7
            });
        assert_eq!(value, 7);
        assert!(!samples.is_empty());
        assert!(samples.samples().iter().all(|s| s.cpu_percent == 50.0));
        assert_eq!(samples.summary().sample_count, samples.len());
    }

    #[test]
    fn test_parse_cpu_times() {
        let (busy, total) = parse_cpu_times("cpu  100 0 50 800 50 0 0 0 0 0").unwrap();
        assert_eq!(total, 1000);
        assert_eq!(busy, 150);
        assert!(parse_cpu_times("intr 1 2 3").is_none());
    }

    #[test]
    fn test_parse_meminfo() {
        let meminfo = "MemTotal:       2048000 kB\nMemFree:  100 kB\nMemAvailable:   1024000 kB\n";
        assert_eq!(parse_used_ram_mb(meminfo), Some(1000.0));
        assert_eq!(parse_used_ram_mb("MemTotal: 1 kB\n"), None);
    }

    #[test]
    fn test_parse_diskstats_skips_loop_devices() {
        let stats = concat!(
            "   8       0 sda 10 0 2048 0 5 0 4096 0 0 0 0\n",
            "   7       0 loop0 1 0 999999 0 1 0 999999 0 0 0 0\n",
        );
        let (read, write) = parse_diskstats(stats);
        assert_eq!(read, 1.0);
        assert_eq!(write, 2.0);
    }
}
