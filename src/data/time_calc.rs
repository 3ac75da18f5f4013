use std::time::Duration;

/// Accumulated per-stage durations. Stage `i` is summed into slot `i`.
#[derive(Debug, Default, Clone)]
pub struct TimeCalc {
    n: usize,
    duration: Vec<Duration>,
}

impl TimeCalc {
    pub fn total(&self) -> Duration {
        self.duration.iter().sum::<Duration>()
    }

    /// Number of completed rounds, one sample per stage each.
    pub fn n(&self) -> usize {
        match self.duration.len() {
            0 => 0,
            stages => self.n / stages,
        }
    }

    pub fn avg(&self) -> Duration {
        match self.n() {
            0 => Duration::ZERO,
            n => self.total() / n as u32,
        }
    }

    pub fn avg_i(&self, i: usize) -> Option<Duration> {
        let n = self.n().max(1);
        self.duration.get(i).map(|d| *d / n as u32)
    }

    pub fn ts(&self) -> &[Duration] {
        &self.duration
    }

    pub fn add_or_push(&mut self, i: usize, x: Duration) {
        match self.duration.get_mut(i) {
            Some(elem) => *elem += x,
            None => self.duration.push(x),
        }
        self.n += 1;
    }

    pub fn clear(&mut self) {
        self.n = Default::default();
        self.duration = Default::default();
    }
}
