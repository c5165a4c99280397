use std::collections::{HashMap, HashSet, VecDeque};

pub const DEFAULT_TIMELINE_CAPACITY: usize = 60;
const SPARKLINE_WIDTH: usize = 12;
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: u64,
}

/// Bounded per-process metric history (for trend sparklines)
#[derive(Debug, Clone)]
pub struct TimelineLedger {
    capacity: usize,
    entries: HashMap<u32, VecDeque<Sample>>,
}

impl TimelineLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TIMELINE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn record(&mut self, pid: u32, timestamp_ms: i64, value: u64) {
        let capacity = self.capacity;
        let queue = self
            .entries
            .entry(pid)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        if queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(Sample {
            timestamp_ms,
            value,
        });
    }

    /// Drop every process that is not in `live_pids`
    pub fn evict(&mut self, live_pids: &HashSet<u32>) {
        self.entries.retain(|pid, _| live_pids.contains(pid));
    }

    pub fn samples(&self, pid: u32) -> Option<&VecDeque<Sample>> {
        self.entries.get(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.contains_key(&pid)
    }

    /// Trend glyphs for the last samples of a process.
    ///
    /// Values are scaled between the min and max of that window; a flat window
    /// renders as the lowest glyph. Fewer than two samples render nothing.
    pub fn sparkline(&self, pid: u32) -> String {
        let Some(samples) = self.entries.get(&pid) else {
            return String::new();
        };
        if samples.len() < 2 {
            return String::new();
        }

        let skip = samples.len().saturating_sub(SPARKLINE_WIDTH);
        let window: Vec<u64> = samples.iter().skip(skip).map(|s| s.value).collect();
        let min = window.iter().copied().min().unwrap_or(0);
        let max = window.iter().copied().max().unwrap_or(0);

        if min == max {
            return SPARKLINE_CHARS[0].to_string().repeat(window.len());
        }

        let range = (max - min) as f64;
        let top = (SPARKLINE_CHARS.len() - 1) as f64;
        window
            .iter()
            .map(|&v| {
                let idx = (((v - min) as f64 / range) * top).round() as usize;
                SPARKLINE_CHARS[idx.min(SPARKLINE_CHARS.len() - 1)]
            })
            .collect()
    }
}

impl Default for TimelineLedger {
    fn default() -> Self {
        Self::new()
    }
}
