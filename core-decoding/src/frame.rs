//! Decoded PCM output.

/// One frame of decoded audio in planar 16-bit PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// Left (or only) channel
    pub left: Vec<i16>,
    /// Right channel, `None` for mono streams
    pub right: Option<Vec<i16>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Absolute byte offset of the compressed frame
    pub offset: u64,
}

impl DecodedFrame {
    pub fn mono(left: Vec<i16>, sample_rate: u32, offset: u64) -> Self {
        Self {
            left,
            right: None,
            sample_rate,
            offset,
        }
    }

    pub fn stereo(left: Vec<i16>, right: Vec<i16>, sample_rate: u32, offset: u64) -> Self {
        Self {
            left,
            right: Some(right),
            sample_rate,
            offset,
        }
    }

    /// Samples per channel.
    pub fn samples(&self) -> usize {
        self.left.len()
    }

    pub fn channels(&self) -> u16 {
        if self.right.is_some() {
            2
        } else {
            1
        }
    }

    /// Interleave into `L R L R ...` order (mono is returned as-is).
    pub fn interleaved(&self) -> Vec<i16> {
        match &self.right {
            None => self.left.clone(),
            Some(right) => self
                .left
                .iter()
                .zip(right.iter())
                .flat_map(|(l, r)| [*l, *r])
                .collect(),
        }
    }

    /// Playing time of this frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples() as f64 / self.sample_rate as f64
    }
}
