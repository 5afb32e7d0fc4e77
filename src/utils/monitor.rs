use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

/// 單一階段的耗時
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTiming {
    pub phase: String,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

/// 每次報告產生各自建立一個 monitor，不跨請求共用
pub struct SystemMonitor {
    #[cfg(feature = "cli")]
    system: Option<(System, Pid)>,
    #[cfg(feature = "cli")]
    peak_memory: u64,
    start_time: Instant,
    last_mark: Instant,
    timings: Vec<PhaseTiming>,
    enabled: bool,
}

impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            #[cfg(feature = "cli")]
            system: if enabled { Self::current_process() } else { None },
            #[cfg(feature = "cli")]
            peak_memory: 0,
            start_time: now,
            last_mark: now,
            timings: Vec::new(),
            enabled,
        }
    }

    #[cfg(feature = "cli")]
    fn current_process() -> Option<(System, Pid)> {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("System stats unavailable: {}", e);
                return None;
            }
        };
        let mut system = System::new();
        system.refresh_all();
        Some((system, pid))
    }

    #[cfg(feature = "cli")]
    pub fn get_stats(&mut self) -> Option<SystemStats> {
        if !self.enabled {
            return None;
        }

        let (system, pid) = self.system.as_mut()?;
        system.refresh_all();

        let process = system.process(*pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_memory = system.total_memory() / 1024 / 1024;
        let memory_percent = if total_memory > 0 {
            (memory_mb as f32 / total_memory as f32) * 100.0
        } else {
            0.0
        };
        let cpu_usage = process.cpu_usage();

        self.peak_memory = self.peak_memory.max(memory_mb);

        Some(SystemStats {
            cpu_usage,
            memory_usage_mb: memory_mb,
            memory_usage_percent: memory_percent,
            peak_memory_mb: self.peak_memory,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    /// 記錄自上一個標記以來的耗時，並輸出系統狀態
    pub fn mark(&mut self, phase: &str) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_mark);
        self.last_mark = now;

        if !self.enabled {
            return;
        }

        self.timings.push(PhaseTiming {
            phase: phase.to_string(),
            elapsed,
        });

        #[cfg(feature = "cli")]
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - {:?} (CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB)",
                phase,
                elapsed,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.memory_usage_percent,
                stats.peak_memory_mb
            );
            return;
        }

        tracing::info!("📊 {} - {:?}", phase, elapsed);
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let breakdown = self
            .timings
            .iter()
            .map(|t| format!("{}={:?}", t.phase, t.elapsed))
            .collect::<Vec<_>>()
            .join(", ");
        tracing::info!(
            "📊 Final Stats - Total Time: {:?} [{}]",
            self.start_time.elapsed(),
            breakdown
        );
    }

    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let mut monitor = SystemMonitor::new(false);
        monitor.mark("business analysis");
        assert!(!monitor.is_enabled());
        assert!(monitor.timings().is_empty());
    }

    #[test]
    fn test_enabled_monitor_records_phases_in_order() {
        let mut monitor = SystemMonitor::new(true);
        monitor.mark("business analysis");
        monitor.mark("strategy development");
        let phases: Vec<&str> = monitor.timings().iter().map(|t| t.phase.as_str()).collect();
        assert_eq!(phases, vec!["business analysis", "strategy development"]);
    }
}
