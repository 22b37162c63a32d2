//! Precision timestamps
//!
//! Every pushed packet carries a `PrecisionTime` describing the time of its
//! first sample. The timestamp is split into whole and fractional seconds so
//! that offsets of a few microseconds survive on epoch-scale values.

use std::fmt;
use std::ops::{Add, Sub};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time code mode: host CPU clock
pub const TCM_CPU: i16 = 1;

/// Time code status: timestamp is not valid
pub const TCS_INVALID: i16 = 0;
/// Time code status: timestamp is valid
pub const TCS_VALID: i16 = 1;

/// Timestamp of the first sample in a packet
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrecisionTime {
    /// Time code mode
    pub tcmode: i16,
    /// Time code status
    pub tcstatus: i16,
    /// Fractional sample offset
    pub toff: f64,
    /// Whole seconds since the epoch
    pub twsec: f64,
    /// Fractional seconds, always in `[0, 1)` once normalized
    pub tfsec: f64,
}

impl PrecisionTime {
    /// Create a valid CPU timestamp from whole and fractional seconds
    pub fn create(whole: f64, fractional: f64) -> Self {
        let mut time = Self {
            tcmode: TCM_CPU,
            tcstatus: TCS_VALID,
            toff: 0.0,
            twsec: whole,
            tfsec: fractional,
        };
        time.normalize();
        time
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self::create(
            elapsed.as_secs() as f64,
            f64::from(elapsed.subsec_nanos()) / 1e9,
        )
    }

    /// Timestamp explicitly marked as not set
    pub fn not_set() -> Self {
        Self {
            tcmode: TCM_CPU,
            tcstatus: TCS_INVALID,
            ..Default::default()
        }
    }

    /// Whether the time code status is valid
    pub fn is_valid(&self) -> bool {
        self.tcstatus == TCS_VALID
    }

    fn normalize(&mut self) {
        let carry = self.tfsec.floor();
        self.twsec += carry;
        self.tfsec -= carry;
    }
}

impl Add<f64> for PrecisionTime {
    type Output = PrecisionTime;

    fn add(mut self, seconds: f64) -> Self::Output {
        let whole = seconds.trunc();
        self.twsec += whole;
        self.tfsec += seconds - whole;
        self.normalize();
        self
    }
}

impl Sub<f64> for PrecisionTime {
    type Output = PrecisionTime;

    fn sub(self, seconds: f64) -> Self::Output {
        self + (-seconds)
    }
}

impl fmt::Display for PrecisionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "<not set>");
        }
        write!(f, "{}+{:.9}", self.twsec, self.tfsec)
    }
}
