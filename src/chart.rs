//! Scales and ticks of the loss chart.

/// Maps a `[d0, d1]` domain linearly onto a `[r0, r1]` range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f32, f32),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    /// A collapsed domain maps everything to the middle of the range.
    pub fn apply(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }

        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f32> {
        linear_ticks(self.domain.0, self.domain.1, count)
    }
}

/// Maps a positive domain onto a range through `log10`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogScale {
    domain: (f32, f32),
    inner: LinearScale,
}

impl LogScale {
    /// Creates a new `LogScale`.
    ///
    /// # Arguments
    /// * `domain` - Both ends must be positive, callers clamp beforehand.
    /// * `range` - The output interval.
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self {
            domain,
            inner: LinearScale::new((domain.0.log10(), domain.1.log10()), range),
        }
    }

    pub fn apply(&self, value: f32) -> f32 {
        self.inner.apply(value.log10())
    }

    /// The powers of ten inside the domain, or linear ticks if fewer than two fit.
    pub fn ticks(&self, count: usize) -> Vec<f32> {
        let (lo, hi) = (self.domain.0.min(self.domain.1), self.domain.0.max(self.domain.1));
        let (first, last) = (lo.log10().ceil() as i32, hi.log10().floor() as i32);

        if last > first {
            let stride = ((last - first + 1) as usize).div_ceil(count.max(1)).max(1);
            return (first..=last)
                .step_by(stride)
                .map(|e| 10f32.powi(e))
                .collect();
        }

        linear_ticks(lo, hi, count)
            .into_iter()
            .filter(|t| *t > 0.0)
            .collect()
    }
}

/// Roughly `count` evenly spaced round values covering `[start, stop]`.
///
/// The spacing is 1, 2 or 5 times a power of ten.
pub fn linear_ticks(start: f32, stop: f32, count: usize) -> Vec<f32> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let (lo, hi) = (start.min(stop) as f64, start.max(stop) as f64);
    let step = tick_step(lo, hi, count);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| (i as f64 * step) as f32).collect()
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count as f64;
    let power = raw.log10().floor();
    let base = 10f64.powf(power);
    let error = raw / base;

    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };

    factor * base
}

/// Short text for a tick value.
pub fn format_tick(value: f32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }

    let abs = value.abs();
    if !(1e-2..1e4).contains(&abs) {
        return format!("{value:.0e}");
    }

    let text = format!("{value:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
