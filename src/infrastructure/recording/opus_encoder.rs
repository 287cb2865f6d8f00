//! Ogg Opus encoder for short speech clips
//!
//! - Sample rate: 16 kHz mono
//! - Application: VOIP
//! - Frames: 20 ms
//! - Bitrate: caller-supplied hint, hard CBR off

use ogg::writing::PacketWriteEndInfo;

/// Encoder input sample rate
pub const OPUS_SAMPLE_RATE: u32 = 16_000;

/// Opus frame size in samples (20ms at 16kHz)
pub const FRAME_SIZE: usize = 320;

/// Granule positions are always counted at 48 kHz
const GRANULE_SCALE: u64 = 48_000 / OPUS_SAMPLE_RATE as u64;

/// Encoder lookahead at 48 kHz, written as pre-skip
const PRE_SKIP: u16 = 312;

/// Largest packet libopus will emit
const MAX_PACKET_SIZE: usize = 4000;

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("Opus encoder setup failed: {0}")]
    Setup(String),

    #[error("Opus encoding failed: {0}")]
    OpusEncode(String),

    #[error("Failed to write OGG packet: {0}")]
    OggWrite(String),

    #[error("No samples to encode")]
    Empty,
}

pub struct OpusEncoder {
    encoder: opus::Encoder,
    serial: u32,
}

impl OpusEncoder {
    /// Create a VOIP encoder targeting `bitrate` bits per second
    pub fn new(bitrate: u32) -> Result<Self, EncodingError> {
        let mut encoder = opus::Encoder::new(
            OPUS_SAMPLE_RATE,
            opus::Channels::Mono,
            opus::Application::Voip,
        )
        .map_err(|e| EncodingError::Setup(e.to_string()))?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(bitrate as i32))
            .map_err(|e| EncodingError::Setup(e.to_string()))?;
        encoder
            .set_vbr(true)
            .map_err(|e| EncodingError::Setup(e.to_string()))?;

        Ok(Self {
            encoder,
            serial: rand_serial(),
        })
    }

    /// Whether libopus can be initialised on this host
    pub fn probe() -> bool {
        opus::Encoder::new(
            OPUS_SAMPLE_RATE,
            opus::Channels::Mono,
            opus::Application::Voip,
        )
        .is_ok()
    }

    /// Encode mono 16 kHz samples into a complete Ogg Opus file
    pub fn encode_to_ogg(&mut self, pcm_samples: &[i16]) -> Result<Vec<u8>, EncodingError> {
        if pcm_samples.is_empty() {
            return Err(EncodingError::Empty);
        }

        let mut ogg_data = Vec::new();
        let mut packet_writer =
            ogg::writing::PacketWriter::new(std::io::Cursor::new(&mut ogg_data));

        self.write_opus_header(&mut packet_writer)?;

        let frame_count = pcm_samples.len().div_ceil(FRAME_SIZE);
        let mut granule_pos = PRE_SKIP as u64;
        for (index, chunk) in pcm_samples.chunks(FRAME_SIZE).enumerate() {
            let mut frame = [0i16; FRAME_SIZE];
            frame[..chunk.len()].copy_from_slice(chunk);

            let mut opus_packet = vec![0u8; MAX_PACKET_SIZE];
            let len = self
                .encoder
                .encode(&frame, &mut opus_packet)
                .map_err(|e| EncodingError::OpusEncode(e.to_string()))?;
            opus_packet.truncate(len);

            granule_pos += chunk.len() as u64 * GRANULE_SCALE;
            let end_info = if index + 1 == frame_count {
                PacketWriteEndInfo::EndStream
            } else {
                PacketWriteEndInfo::NormalPacket
            };

            packet_writer
                .write_packet(opus_packet, self.serial, end_info, granule_pos)
                .map_err(|e| EncodingError::OggWrite(e.to_string()))?;
        }

        drop(packet_writer);
        Ok(ogg_data)
    }

    /// OpusHead and OpusTags, each on its own page
    fn write_opus_header<W: std::io::Write>(
        &self,
        writer: &mut ogg::writing::PacketWriter<W>,
    ) -> Result<(), EncodingError> {
        let mut id_header = Vec::with_capacity(19);
        id_header.extend_from_slice(b"OpusHead");
        id_header.push(1); // Version
        id_header.push(1); // Mono
        id_header.extend_from_slice(&PRE_SKIP.to_le_bytes());
        id_header.extend_from_slice(&OPUS_SAMPLE_RATE.to_le_bytes());
        id_header.extend_from_slice(&0i16.to_le_bytes()); // Output gain
        id_header.push(0); // Channel mapping family

        writer
            .write_packet(id_header, self.serial, PacketWriteEndInfo::EndPage, 0)
            .map_err(|e| EncodingError::OggWrite(e.to_string()))?;

        let vendor = b"audio-qr";
        let mut comment_header = Vec::with_capacity(16 + vendor.len());
        comment_header.extend_from_slice(b"OpusTags");
        comment_header.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        comment_header.extend_from_slice(vendor);
        comment_header.extend_from_slice(&0u32.to_le_bytes());

        writer
            .write_packet(comment_header, self.serial, PacketWriteEndInfo::EndPage, 0)
            .map_err(|e| EncodingError::OggWrite(e.to_string()))?;

        Ok(())
    }
}

/// Pseudo-random Ogg stream serial
fn rand_serial() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (duration.as_secs() as u32) ^ duration.subsec_nanos()
}
