use crate::sim::smoothstep;

/// Per-node station markers.
///
/// A node with `station_start` and a positive `station_length` opens a
/// station of that length on its own. A `station_start` node followed by a
/// `station_end` node spans the two.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct NodeMeta {
    pub station_start: bool,
    pub station_end: bool,
    pub station_length: f32,
}

impl NodeMeta {
    pub fn is_station(&self) -> bool {
        self.station_start || self.station_end
    }
}

/// Closed arc-length range `[start, end]` where the normal is forced to the
/// up reference.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StationInterval {
    pub start: f32,
    pub end: f32,
}

impl StationInterval {
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, s: f32) -> bool {
        s >= self.start && s <= self.end
    }

    /// Smoothstep weight inside the feather band just outside the interval,
    /// 0 elsewhere.
    ///
    /// `loop_length` is the length of a closed path; distances to the
    /// interval edges are then measured around the seam.
    pub fn fade_weight(&self, s: f32, feather: f32, loop_length: Option<f32>) -> f32 {
        if self.contains(s) {
            return 0.0;
        }
        let mut before = self.start - s;
        let mut after = s - self.end;
        if let Some(length) = loop_length.filter(|&l| l > 0.0) {
            before = before.rem_euclid(length);
            after = after.rem_euclid(length);
        }
        let ramp = |d: f32| {
            if d > 0.0 && d <= feather {
                smoothstep(1.0 - d / feather)
            } else {
                0.0
            }
        };
        ramp(before).max(ramp(after))
    }
}

/// Appends `[a, b]`; when `a > b` on a path of `length` the range wraps and
/// is split into `[a, length]` and `[0, b]`.
pub fn push_interval(out: &mut Vec<StationInterval>, a: f32, b: f32, length: f32) {
    if a <= b {
        out.push(StationInterval::new(a, b));
    } else {
        out.push(StationInterval::new(a, length));
        out.push(StationInterval::new(0.0, b));
    }
}

/// Sorts by start and merges intervals whose gap is at most `gap`.
pub fn merge_intervals(mut intervals: Vec<StationInterval>, gap: f32) -> Vec<StationInterval> {
    intervals.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

    let mut merged: Vec<StationInterval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end + gap => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

pub fn is_in_station(intervals: &[StationInterval], s: f32) -> bool {
    intervals.iter().any(|interval| interval.contains(s))
}

/// Strongest fade weight over all feather bands holding `s`; 0 inside a
/// station. Pass the path length as `loop_length` for closed paths.
pub fn station_fade_weight(
    intervals: &[StationInterval],
    s: f32,
    feather: f32,
    loop_length: Option<f32>,
) -> f32 {
    if feather <= 0.0 || is_in_station(intervals, s) {
        return 0.0;
    }
    intervals
        .iter()
        .map(|interval| interval.fade_weight(s, feather, loop_length))
        .fold(0.0, f32::max)
}
