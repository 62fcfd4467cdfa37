use crate::config::params::RangefinderConfig;
use crate::domain::ports::AnalogInput;

const WINDOW_SIZE: usize = 21;
const SAMPLE_INTERVAL: u32 = 5;

/// An ultrasonic range finder on an analog channel.
///
/// The filtered read keeps a window of recent samples (taking only every
/// fifth reading as a time delay, and ignoring readings closer than a foot)
/// and reports a high-percentile value of the sorted window to reject
/// spurious echoes.
pub struct RangeFinder {
    channel: Box<dyn AnalogInput>,
    volts_per_inch: f64,
    ranges: Vec<f64>,
    reads_since_sample: u32,
}

impl RangeFinder {
    pub fn new(config: RangefinderConfig, channel: Box<dyn AnalogInput>) -> Self {
        Self {
            channel,
            volts_per_inch: config.volts_per_inch,
            ranges: Vec::with_capacity(WINDOW_SIZE),
            reads_since_sample: 0,
        }
    }

    pub fn voltage(&mut self) -> f64 {
        self.channel.voltage()
    }

    pub fn range_in_inches(&mut self) -> f64 {
        self.voltage() / self.volts_per_inch
    }

    pub fn range_in_feet(&mut self) -> f64 {
        self.range_in_inches() / 12.0
    }

    /// The filtered range in feet. Falls back to the raw reading until the
    /// sample window has filled.
    pub fn filtered_range_in_feet(&mut self) -> f64 {
        self.reads_since_sample += 1;
        let current_range = self.range_in_feet();

        if current_range > 1.0 && self.reads_since_sample >= SAMPLE_INTERVAL {
            if self.ranges.len() >= WINDOW_SIZE {
                self.ranges.remove(0);
            }
            self.ranges.push(current_range);
            self.reads_since_sample = 0;
        }

        if self.ranges.len() > WINDOW_SIZE - 1 {
            let mut sorted = self.ranges.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            sorted[18]
        } else {
            current_range
        }
    }
}
