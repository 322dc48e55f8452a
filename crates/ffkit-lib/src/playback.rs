//! Effect upload and playback on an open device.
//!
//! Every request is validated before any I/O, then issued as exactly one
//! transport call. Nothing is retried.

use log::{debug, warn};

use crate::codec;
use crate::device::OpenDevice;
use crate::effect::Effect;
use crate::error::Result;
use crate::protocol::percent_to_level;
use crate::transport::{FfEvent, FfHandle};

impl<H: FfHandle> OpenDevice<'_, H> {
    /// Upload `effect`, or update it in place if it already holds a slot.
    ///
    /// On success the kernel's slot id is stored in `effect.id` and
    /// returned.
    pub fn upload(&self, effect: &mut Effect) -> Result<i16> {
        let mut raw = codec::encode(effect)?;
        let handle = self.handle()?;
        if !self.info().supports_effect(effect.kind()) {
            debug!(
                "{}: {} effects not advertised, uploading anyway",
                self.info().name(),
                effect.kind()
            );
        }
        handle.upload(&mut raw)?;
        effect.id = raw.id;
        debug!("uploaded {} effect to slot {}", effect.kind(), raw.id);
        Ok(raw.id)
    }

    /// Free an uploaded effect's slot.
    pub fn erase(&self, id: i16) -> Result<()> {
        codec::validate_slot(id)?;
        self.handle()?.remove(id)?;
        debug!("erased slot {id}");
        Ok(())
    }

    pub fn play(&self, id: i16) -> Result<()> {
        codec::validate_slot(id)?;
        self.handle()?.write_event(FfEvent::play(id))?;
        Ok(())
    }

    pub fn stop(&self, id: i16) -> Result<()> {
        codec::validate_slot(id)?;
        self.handle()?.write_event(FfEvent::stop(id))?;
        Ok(())
    }

    /// Set the device gain in percent (clamped to 0-100).
    pub fn set_gain(&self, gain: i32) -> Result<()> {
        let handle = self.handle()?;
        if !self.info().supports_gain() {
            warn!("{}: device does not advertise gain control", self.info().name());
        }
        handle.write_event(FfEvent::gain(percent_to_level(gain)))?;
        Ok(())
    }

    /// Set the autocenter strength in percent (clamped to 0-100).
    pub fn set_autocenter(&self, autocenter: i32) -> Result<()> {
        let handle = self.handle()?;
        if !self.info().supports_autocenter() {
            warn!("{}: device does not advertise autocenter", self.info().name());
        }
        handle.write_event(FfEvent::autocenter(percent_to_level(autocenter)))?;
        Ok(())
    }
}
