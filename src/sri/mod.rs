//! Stream-related information (SRI)
//!
//! An SRI describes one logical stream: its identifier, sample spacing,
//! real/complex mode, blocking policy and a free-form keyword list. The port
//! never interprets most of these fields; they only matter for change
//! detection, which compares descriptors through an [`SriComparator`].

pub mod time;

use std::sync::Arc;

pub use time::PrecisionTime;

/// X-axis units: time in seconds
pub const UNITS_TIME: i16 = 1;
/// Axis units: none
pub const UNITS_NONE: i16 = 0;

/// Comparator deciding whether two descriptors are equivalent
pub type SriComparator = Arc<dyn Fn(&StreamSri, &StreamSri) -> bool + Send + Sync>;

/// Field-wise equality of two descriptors, keywords compared in order
pub fn default_comparator(a: &StreamSri, b: &StreamSri) -> bool {
    a == b
}

/// Value of an SRI keyword
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Bool(bool),
    Long(i32),
    LongLong(i64),
    Double(f64),
    String(String),
}

impl From<bool> for KeywordValue {
    fn from(value: bool) -> Self {
        KeywordValue::Bool(value)
    }
}

impl From<i32> for KeywordValue {
    fn from(value: i32) -> Self {
        KeywordValue::Long(value)
    }
}

impl From<i64> for KeywordValue {
    fn from(value: i64) -> Self {
        KeywordValue::LongLong(value)
    }
}

impl From<f64> for KeywordValue {
    fn from(value: f64) -> Self {
        KeywordValue::Double(value)
    }
}

impl From<&str> for KeywordValue {
    fn from(value: &str) -> Self {
        KeywordValue::String(value.to_string())
    }
}

impl From<String> for KeywordValue {
    fn from(value: String) -> Self {
        KeywordValue::String(value)
    }
}

/// A named SRI keyword
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub id: String,
    pub value: KeywordValue,
}

/// Metadata descriptor for a single stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSri {
    /// Header version
    pub hversion: i32,
    /// Start of the X axis
    pub xstart: f64,
    /// Interval between samples on the X axis
    pub xdelta: f64,
    /// X axis units
    pub xunits: i16,
    /// Frame length for two-dimensional data (0 = contiguous)
    pub subsize: i32,
    /// Start of the Y axis
    pub ystart: f64,
    /// Interval between frames on the Y axis
    pub ydelta: f64,
    /// Y axis units
    pub yunits: i16,
    /// 0 for real samples, 1 for complex
    pub mode: i16,
    /// Unique stream identifier
    pub stream_id: String,
    /// Whether producers should wait rather than drop when the queue is full
    pub blocking: bool,
    /// Auxiliary keywords
    pub keywords: Vec<Keyword>,
}

impl StreamSri {
    /// Create the default descriptor for a stream
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            hversion: 1,
            xstart: 0.0,
            xdelta: 1.0,
            xunits: UNITS_TIME,
            subsize: 0,
            ystart: 0.0,
            ydelta: 0.0,
            yunits: UNITS_NONE,
            mode: 0,
            stream_id: stream_id.into(),
            blocking: false,
            keywords: Vec::new(),
        }
    }

    /// Set the sample interval
    pub fn xdelta(mut self, xdelta: f64) -> Self {
        self.xdelta = xdelta;
        self
    }

    /// Mark the stream as complex (or real)
    pub fn complex(mut self, complex: bool) -> Self {
        self.mode = i16::from(complex);
        self
    }

    /// Set the blocking policy
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Check if the samples are complex
    pub fn is_complex(&self) -> bool {
        self.mode != 0
    }

    /// Look up a keyword by id
    pub fn keyword(&self, id: &str) -> Option<&KeywordValue> {
        self.keywords.iter().find(|k| k.id == id).map(|k| &k.value)
    }

    /// Insert or replace a keyword, keeping the original position on replace
    pub fn set_keyword(&mut self, id: impl Into<String>, value: impl Into<KeywordValue>) {
        let id = id.into();
        let value = value.into();
        match self.keywords.iter_mut().find(|k| k.id == id) {
            Some(existing) => existing.value = value,
            None => self.keywords.push(Keyword { id, value }),
        }
    }

    /// Remove a keyword, returning its value if present
    pub fn remove_keyword(&mut self, id: &str) -> Option<KeywordValue> {
        let index = self.keywords.iter().position(|k| k.id == id)?;
        Some(self.keywords.remove(index).value)
    }
}
