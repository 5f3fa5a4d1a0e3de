//! Human-readable progress stream for long unattended runs.
//!
//! Each line is written to an interactive stream and to a plain-text log
//! file. The stream is purely observational: write failures are ignored.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use sysinfo::{Pid, System};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MIB: u64 = 1024 * 1024;

/// Memory snapshot in MiB: this process, the machine in use, the machine total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub process_mb: u64,
    pub used_mb: u64,
    pub total_mb: u64,
}

impl fmt::Display for MemorySample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}Mb", self.process_mb, self.used_mb, self.total_mb)
    }
}

/// Samples resident memory through `sysinfo`.
pub struct MemoryGauge {
    sys: System,
    pid: Option<Pid>,
}

impl MemoryGauge {
    pub fn new() -> Self {
        Self {
            sys: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn sample(&mut self) -> MemorySample {
        self.sys.refresh_memory();
        let process = match self.pid {
            Some(pid) => {
                self.sys.refresh_process(pid);
                self.sys.process(pid).map(|p| p.memory()).unwrap_or(0)
            }
            None => 0,
        };
        MemorySample {
            process_mb: process / MIB,
            used_mb: self.sys.used_memory() / MIB,
            total_mb: self.sys.total_memory() / MIB,
        }
    }
}

impl Default for MemoryGauge {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress lines of the form
/// `<timestamp> <index>/<total> (<percent>%) <variant> <path> [<memory>|<elapsed>]`.
///
/// The memory column appears on `measuring` lines once a gauge is attached.
pub struct ProgressLog {
    console: Box<dyn Write + Send>,
    log: Box<dyn Write + Send>,
    memory: Option<MemoryGauge>,
}

impl ProgressLog {
    pub fn new(console: Box<dyn Write + Send>, log: Box<dyn Write + Send>) -> Self {
        Self {
            console,
            log,
            memory: None,
        }
    }

    /// Progress to stdout and to a freshly created log file at `path`, with
    /// memory usage on every `measuring` line.
    pub fn stdout_and_file(path: &Path) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(Self::new(Box::new(io::stdout()), Box::new(file)).with_memory())
    }

    /// Append a memory column to `measuring` lines.
    pub fn with_memory(mut self) -> Self {
        self.memory = Some(MemoryGauge::new());
        self
    }

    /// Progress that goes nowhere.
    pub fn sink() -> Self {
        Self::new(Box::new(io::sink()), Box::new(io::sink()))
    }

    /// A measurement is about to start.
    pub fn measuring(&mut self, index: usize, total: usize, variant: &str, path: &str) {
        let head = prefix(Local::now(), index, total, variant);
        let line = match self.memory.as_mut() {
            Some(gauge) => format!("{} {} {}", head, pad(path), gauge.sample()),
            None => format!("{} {}", head, pad(path)),
        };
        self.emit(line.trim_end());
    }

    /// A measurement finished; `duration` is `None` when no trial completed.
    pub fn measured(
        &mut self,
        index: usize,
        total: usize,
        variant: &str,
        path: &str,
        duration: Option<Duration>,
    ) {
        let ms = duration.map(|d| d.as_secs_f64() * 1_000.0).unwrap_or(-1.0);
        let line = format!(
            "{} {} {:.2}ms",
            prefix(Local::now(), index, total, variant),
            pad(path),
            ms
        );
        self.emit(&line);
    }

    /// A free-form line, e.g. run start and end markers.
    pub fn note(&mut self, message: &str) {
        self.emit(message);
    }

    pub fn started_at(&mut self, at: DateTime<Local>) {
        self.note(&format!("started at {}", at.format("%Y-%m-%dT%H:%M:%S")));
    }

    pub fn ended_at(&mut self, started: DateTime<Local>, ended: DateTime<Local>) {
        self.note(&format!("ended at {}", ended.format("%Y-%m-%dT%H:%M:%S")));
        let took = (ended - started).to_std().unwrap_or_default();
        self.note(&format!("took {}", format_elapsed(took)));
    }

    fn emit(&mut self, line: &str) {
        let _ = writeln!(self.console, "{}", line);
        let _ = writeln!(self.log, "{}", line);
        let _ = self.console.flush();
        let _ = self.log.flush();
    }
}

fn prefix(now: DateTime<Local>, index: usize, total: usize, variant: &str) -> String {
    let percent = if total == 0 {
        0.0
    } else {
        index as f64 * 100.0 / total as f64
    };
    format!(
        "{} {:5}/{} ({:.1}%) {:<4}",
        now.format(TIMESTAMP_FORMAT),
        index,
        total,
        percent,
        variant
    )
}

fn pad(path: &str) -> String {
    format!("{:<50}", path)
}

/// `HHhMMmSSs` rendering of an elapsed time.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_prefix_layout() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(prefix(at, 7, 28, "lcs"), "2024-03-09 14:05:07     7/28 (25.0%) lcs ");
    }

    #[test]
    fn test_prefix_with_zero_total() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert!(prefix(at, 0, 0, "seed").contains("(0.0%)"));
    }

    #[test]
    fn test_lines_reach_both_streams() {
        let console = Shared::default();
        let log = Shared::default();
        let mut progress = ProgressLog::new(Box::new(console.clone()), Box::new(log.clone()));

        progress.measuring(1, 2, "seed", "org/repo/1");
        progress.measured(1, 2, "seed", "org/repo/1", Some(Duration::from_micros(1_500)));
        progress.measured(1, 2, "lcs", "org/repo/1", None);

        let text = log.text();
        assert_eq!(console.text(), text);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("org/repo/1"));
        assert!(lines[1].ends_with("1.50ms"));
        assert!(lines[2].ends_with("-1.00ms"));
    }

    #[test]
    fn test_memory_sample_layout() {
        let sample = MemorySample {
            process_mb: 42,
            used_mb: 3_100,
            total_mb: 16_000,
        };
        assert_eq!(sample.to_string(), "42/3100/16000Mb");
    }

    #[test]
    fn test_measuring_lines_carry_memory_column() {
        let log = Shared::default();
        let mut progress =
            ProgressLog::new(Box::new(io::sink()), Box::new(log.clone())).with_memory();

        progress.measuring(3, 10, "seed", "org/repo/3");
        progress.measured(3, 10, "seed", "org/repo/3", Some(Duration::from_millis(2)));

        let text = log.text();
        let lines: Vec<&str> = text.lines().collect();
        let column = lines[0].rsplit(' ').next().unwrap();
        let numbers: Vec<u64> = column
            .strip_suffix("Mb")
            .unwrap()
            .split('/')
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(numbers.len(), 3);
        assert!(numbers[2] > 0);
        assert!(numbers[1] <= numbers[2]);
        assert!(lines[0].contains("org/repo/3"));
        assert!(lines[1].ends_with("2.00ms"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 62)), "03h01m02s");
    }
}
