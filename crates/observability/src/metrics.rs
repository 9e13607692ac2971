//! Periodic sensor 指标收集模块
//!
//! Prometheus 计数器 + 进程内的采样间隔统计。

use std::collections::BTreeMap;

use contracts::Timestamp;
use metrics::{counter, gauge, histogram};

/// 记录一次成功发布的样本
pub fn record_sample(sensor: &str) {
    counter!(
        "psensor_samples_total",
        "sensor" => sensor.to_string()
    )
    .increment(1);
}

/// 记录分发到存活传感器的控制事件 (enable / period / trigger)
pub fn record_control_event(kind: &str) {
    counter!(
        "psensor_control_events_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录发给已销毁传感器的事件
pub fn record_stale_event(kind: &str) {
    counter!(
        "psensor_stale_events_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录超出范围的采样周期
pub fn record_period_rejected(sensor: &str) {
    counter!(
        "psensor_period_rejected_total",
        "sensor" => sensor.to_string()
    )
    .increment(1);
}

/// 记录发布失败
pub fn record_publish_failure(sensor: &str) {
    counter!(
        "psensor_publish_failures_total",
        "sensor" => sensor.to_string()
    )
    .increment(1);
}

/// 当前存活的传感器数量
pub fn set_active_sensors(count: usize) {
    gauge!("psensor_sensors_active").set(count as f64);
}

/// 记录相邻两个样本之间的间隔 (秒)
pub fn record_sample_interval(path: &str, secs: f64) {
    histogram!(
        "psensor_sample_interval_seconds",
        "path" => path.to_string()
    )
    .record(secs);
}

/// 采样统计聚合器
///
/// 按资源路径统计样本数量和相邻样本的时间间隔，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct SampleStatsAggregator {
    paths: BTreeMap<String, PathStats>,
}

#[derive(Debug, Clone, Default)]
struct PathStats {
    samples: u64,
    last: Option<f64>,
    interval: RunningStats,
}

impl SampleStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, path: &str, timestamp: Timestamp) {
        let entry = self.paths.entry(path.to_string()).or_default();
        entry.samples += 1;

        let now = timestamp.as_secs_f64();
        if let Some(last) = entry.last {
            let gap = now - last;
            // Out-of-order timestamps say nothing about the period
            if gap >= 0.0 {
                entry.interval.push(gap);
                record_sample_interval(path, gap);
            }
        }
        entry.last = Some(now);
    }

    /// 总样本数
    pub fn total_samples(&self) -> u64 {
        self.paths.values().map(|p| p.samples).sum()
    }

    /// 生成摘要报告
    pub fn summary(&self) -> Vec<PathSummary> {
        self.paths
            .iter()
            .map(|(path, stats)| PathSummary {
                path: path.clone(),
                samples: stats.samples,
                interval_secs: StatsSummary::from(&stats.interval),
            })
            .collect()
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 单个资源路径的摘要
#[derive(Debug, Clone, Default)]
pub struct PathSummary {
    pub path: String,
    pub samples: u64,
    pub interval_secs: StatsSummary,
}

impl std::fmt::Display for PathSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} samples, interval {}",
            self.path, self.samples, self.interval_secs
        )
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_intervals() {
        let mut aggregator = SampleStatsAggregator::new();
        aggregator.update("temp/value", Timestamp(10.0));
        aggregator.update("temp/value", Timestamp(12.5));
        aggregator.update("temp/value", Timestamp(15.0));
        aggregator.update("door/value", Timestamp(11.0));

        assert_eq!(aggregator.total_samples(), 4);

        let summary = aggregator.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].path, "door/value");
        assert_eq!(summary[0].interval_secs.count, 0);

        let temp = &summary[1];
        assert_eq!(temp.samples, 3);
        assert_eq!(temp.interval_secs.count, 2);
        assert!((temp.interval_secs.mean - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_out_of_order_ignored() {
        let mut aggregator = SampleStatsAggregator::new();
        aggregator.update("v", Timestamp(5.0));
        aggregator.update("v", Timestamp(4.0));
        assert_eq!(aggregator.summary()[0].interval_secs.count, 0);
        assert_eq!(aggregator.summary()[0].samples, 2);
    }

    #[test]
    fn test_summary_display() {
        let summary = PathSummary {
            path: "temp/value".into(),
            samples: 0,
            interval_secs: StatsSummary::default(),
        };
        assert_eq!(summary.to_string(), "temp/value: 0 samples, interval N/A");
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: calls are no-ops
        record_sample("temp");
        record_control_event("enable");
        set_active_sensors(3);
    }
}
