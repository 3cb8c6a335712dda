//! Playable duration of an uploaded audio payload.
//!
//! Container metadata is read with `lofty`; nothing is decoded beyond what
//! the properties parser needs.

use crate::errors::{ServiceError, ServiceResult};
use bytes::Bytes;
use lofty::{config::ParseOptions, file::AudioFile, probe::Probe};
use std::{io::Cursor, time::Duration};

/// Parse the container of `audio` and return its playable duration.
pub fn extract_duration(audio: &[u8]) -> ServiceResult<Duration> {
    let tagged_file = Probe::new(Cursor::new(audio))
        .options(ParseOptions::new())
        .guess_file_type()
        .map_err(|e| ServiceError::Decode(format!("failed to probe payload: {}", e)))?
        .read()
        .map_err(|e| ServiceError::Decode(format!("failed to parse payload: {}", e)))?;

    let duration = tagged_file.properties().duration();
    if duration.is_zero() {
        return Err(ServiceError::Decode("payload has no playable duration".into()));
    }
    Ok(duration)
}

/// Run [`extract_duration`] off the async executor.
pub async fn extract_duration_blocking(audio: Bytes) -> ServiceResult<Duration> {
    tokio::task::spawn_blocking(move || extract_duration(&audio))
        .await
        .map_err(|e| ServiceError::Decode(format!("duration task failed: {}", e)))?
}

/// Format whole seconds as `M:SS`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Minimal 16-bit PCM WAV of `secs` seconds of silence at 8 kHz, for tests.
#[doc(hidden)]
pub fn wav_fixture(secs: u32) -> Vec<u8> {
    const SAMPLE_RATE: u32 = 8_000;
    let data_len = SAMPLE_RATE * 2 * secs;
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}
