//! Audio buffers, WAV codec and per-chunk slicing.
//!
//! Everything here is synchronous and CPU-bound except
//! [`slice_material_audio`], which only adds yield points between chunks.

pub mod pcm;
pub mod slicer;
pub mod wav;

pub use pcm::PcmBuffer;
pub use slicer::{SliceError, extract_segment, slice_material_audio};
pub use wav::{WAV_HEADER_LEN, WavDecoder, WavEncodeError, encode_wav, sample_to_i16};
