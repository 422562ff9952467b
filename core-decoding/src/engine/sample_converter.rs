//! # Sample Format Converter
//!
//! Converts symphonia's decoded buffers to planar 16-bit PCM.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Left plane plus an optional right plane.
pub type Planes = (Vec<i16>, Option<Vec<i16>>);

/// Sample converter that normalizes audio to planar i16.
///
/// The MPEG decoder produces `f32` planes; other sample formats are accepted
/// so the converter does not depend on that detail. Channels beyond the
/// second are ignored.
pub struct SampleConverter;

impl SampleConverter {
    /// Convert a decoded buffer to one or two i16 planes.
    pub fn to_planar_i16(buffer: &AudioBufferRef<'_>) -> Planes {
        match buffer {
            AudioBufferRef::F32(buf) => Self::convert_planes(buf),
            AudioBufferRef::F64(buf) => Self::convert_planes(buf),
            AudioBufferRef::S32(buf) => Self::convert_planes(buf),
            AudioBufferRef::S24(buf) => Self::convert_planes(buf),
            AudioBufferRef::S16(buf) => Self::copy_planes(buf),
            AudioBufferRef::S8(buf) => Self::convert_planes(buf),
            AudioBufferRef::U32(buf) => Self::convert_planes(buf),
            AudioBufferRef::U24(buf) => Self::convert_planes(buf),
            AudioBufferRef::U16(buf) => Self::convert_planes(buf),
            AudioBufferRef::U8(buf) => Self::convert_planes(buf),
        }
    }

    /// Already i16, copy the planes out.
    fn copy_planes(buf: &AudioBuffer<i16>) -> Planes {
        match buf.spec().channels.count() {
            0 => (Vec::new(), None),
            1 => (buf.chan(0).to_vec(), None),
            _ => (buf.chan(0).to_vec(), Some(buf.chan(1).to_vec())),
        }
    }

    fn convert_planes<T>(buf: &AudioBuffer<T>) -> Planes
    where
        T: Sample + IntoSample<i16>,
    {
        let convert = |chan: usize| -> Vec<i16> {
            buf.chan(chan).iter().map(|s| (*s).into_sample()).collect()
        };

        match buf.spec().channels.count() {
            0 => (Vec::new(), None),
            1 => (convert(0), None),
            _ => (convert(0), Some(convert(1))),
        }
    }
}
