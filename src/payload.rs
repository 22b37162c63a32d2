//! Packet payload types
//!
//! A port is instantiated over one payload type, which fixes the element width
//! used by link statistics. Numeric ports carry `Vec<T>`, the octet port
//! carries reference-counted `Bytes`, the bit port a packed [`BitBuffer`], and
//! the XML/file ports carry strings measured in 8-bit characters.

use bytes::{BufMut, Bytes, BytesMut};

/// Data carried by a single pushed packet
pub trait Payload: Send + 'static {
    /// Width of a single element in bits
    const BITS_PER_ELEMENT: usize;

    /// Number of elements in this payload
    fn element_count(&self) -> usize;

    /// Whether the payload holds no elements
    fn is_empty(&self) -> bool {
        self.element_count() == 0
    }
}

/// Fixed-width numeric sample type
pub trait Sample: Copy + Send + 'static {
    const BITS: usize;
}

macro_rules! impl_sample {
    ($($ty:ty => $bits:expr),* $(,)?) => {
        $(impl Sample for $ty {
            const BITS: usize = $bits;
        })*
    };
}

impl_sample! {
    i8 => 8,
    u8 => 8,
    i16 => 16,
    u16 => 16,
    i32 => 32,
    u32 => 32,
    i64 => 64,
    u64 => 64,
    f32 => 32,
    f64 => 64,
}

impl<T: Sample> Payload for Vec<T> {
    const BITS_PER_ELEMENT: usize = T::BITS;

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl Payload for Bytes {
    const BITS_PER_ELEMENT: usize = 8;

    fn element_count(&self) -> usize {
        self.len()
    }
}

impl Payload for String {
    const BITS_PER_ELEMENT: usize = 8;

    fn element_count(&self) -> usize {
        self.len()
    }
}

/// Packed bit data, most significant bit first
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitBuffer {
    data: Bytes,
    bits: usize,
}

impl BitBuffer {
    /// Wrap packed bytes holding `bits` valid bits
    ///
    /// The bit count is clamped to the number of bits actually available.
    pub fn new(data: Bytes, bits: usize) -> Self {
        let bits = bits.min(data.len() * 8);
        Self { data, bits }
    }

    /// Pack a slice of booleans
    pub fn from_bools(values: &[bool]) -> Self {
        let mut packed = BytesMut::with_capacity(values.len().div_ceil(8));
        for chunk in values.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << (7 - i)));
            packed.put_u8(byte);
        }
        Self {
            data: packed.freeze(),
            bits: values.len(),
        }
    }

    /// Number of valid bits
    pub fn len(&self) -> usize {
        self.bits
    }

    /// Check if no bits are held
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Read a single bit
    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.bits {
            return None;
        }
        let byte = self.data[index / 8];
        Some(byte & (0x80 >> (index % 8)) != 0)
    }

    /// The packed backing bytes
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }
}

impl Payload for BitBuffer {
    const BITS_PER_ELEMENT: usize = 1;

    fn element_count(&self) -> usize {
        self.bits
    }
}
