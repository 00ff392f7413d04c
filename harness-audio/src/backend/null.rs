//! Backend for targets without audio
//!
//! Accepts every call and does nothing. Streams cannot be opened, nothing
//! ever reports as playing.

use super::{AudioBackend, SampleHandle, StreamHandle};
use crate::error::Result;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NullBackend {
    next_sample: u32,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn init_cda(&mut self) -> Result<()> {
        debug!("null audio: init_cda");
        Ok(())
    }

    fn uninit_cda(&mut self) -> Result<()> {
        debug!("null audio: uninit_cda");
        Ok(())
    }

    fn shutdown(&mut self) {
        debug!("null audio: shutdown");
    }

    fn play_cda(&mut self, track: i32) -> Result<()> {
        debug!("null audio: play_cda({})", track);
        Ok(())
    }

    fn stop_cda(&mut self) -> Result<()> {
        debug!("null audio: stop_cda");
        Ok(())
    }

    fn cda_is_playing(&self) -> bool {
        false
    }

    fn set_cda_volume(&mut self, volume: i32) -> Result<()> {
        debug!("null audio: set_cda_volume({})", volume);
        Ok(())
    }

    fn allocate_sample(&mut self) -> SampleHandle {
        self.next_sample = self.next_sample.wrapping_add(1).max(1);
        SampleHandle(self.next_sample)
    }

    fn release_sample(&mut self, handle: SampleHandle) -> Result<()> {
        debug!("null audio: release_sample({})", handle);
        Ok(())
    }

    fn play_sample(
        &mut self,
        handle: SampleHandle,
        channels: i32,
        data: &[u8],
        rate: i32,
        looping: bool,
    ) -> Result<()> {
        debug!(
            "null audio: play_sample({}, {} channels, {} bytes, {}Hz, loop={})",
            handle,
            channels,
            data.len(),
            rate,
            looping
        );
        Ok(())
    }

    fn sound_is_playing(&self, _handle: SampleHandle) -> bool {
        false
    }

    fn set_volume(&mut self, handle: SampleHandle, volume: i32) -> Result<()> {
        debug!("null audio: set_volume({}, {})", handle, volume);
        Ok(())
    }

    fn set_pan(&mut self, handle: SampleHandle, pan: i32) -> Result<()> {
        debug!("null audio: set_pan({}, {})", handle, pan);
        Ok(())
    }

    fn set_frequency(
        &mut self,
        handle: SampleHandle,
        original_rate: i32,
        new_rate: i32,
    ) -> Result<()> {
        debug!(
            "null audio: set_frequency({}, {} -> {})",
            handle, original_rate, new_rate
        );
        Ok(())
    }

    fn stop_sample(&mut self, handle: SampleHandle) -> Result<()> {
        debug!("null audio: stop_sample({})", handle);
        Ok(())
    }

    fn stream_open(
        &mut self,
        bit_depth: i32,
        channels: i32,
        sample_rate: u32,
    ) -> Option<StreamHandle> {
        debug!(
            "null audio: stream_open({}-bit, {} channels, {}Hz)",
            bit_depth, channels, sample_rate
        );
        None
    }

    fn stream_write(&mut self, handle: StreamHandle, data: &[u8]) -> Result<()> {
        debug!("null audio: stream_write({}, {} bytes)", handle, data.len());
        Ok(())
    }

    fn stream_close(&mut self, handle: StreamHandle) -> Result<()> {
        debug!("null audio: stream_close({})", handle);
        Ok(())
    }
}
