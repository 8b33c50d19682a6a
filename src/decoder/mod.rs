//! # Frame Decoder Module
//!
//! Converts raw wire frames into control updates.
//!
//! The decoder owns the set of *assigned* controls for the active scene:
//! placements the presentation adapter bound to visual handles through the
//! [`ControlSink`] interface. Each call to [`FrameDecoder::decode`] extracts
//! every assigned control's value from the frame with the family's
//! bit-unpacking rule, post-processes it, and pushes it into the handle.
//!
//! Wire conventions:
//! - Buttons occupy a single byte: zero is released, nonzero is pressed.
//! - Stick axes and analog magnitudes occupy 8 consecutive bytes, one bit
//!   per byte, most significant first.

use tracing::debug;

use crate::error::{PadViewError, Result};
use crate::mapping::{ControllerFamily, FIELD_BYTES};
use crate::scene::{
    AnalogControl, ButtonControl, ControlSink, DrawRegion, StickControl,
};
use crate::skin::{AnalogDirection, AnalogPlacement, ButtonPlacement, StickPlacement};

/// Normalization divisor for stick ranges: a full-scale deflection of 128
/// travels exactly the placement's declared range
const STICK_DIVISOR: f32 = 128.0;

/// Maximum analog accumulator value, mapping to 100%
const ANALOG_MAX: f32 = 255.0;

/// A button placement bound to its visual handle
struct AssignedButton {
    offset: usize,
    handle: Box<dyn ButtonControl>,
}

/// A stick placement bound to its visual handle, ranges pre-divided
struct AssignedStick {
    x_offset: usize,
    y_offset: usize,
    x_scale: f32,
    y_scale: f32,
    handle: Box<dyn StickControl>,
}

/// An analog placement bound to its visual handle
struct AssignedAnalog {
    offset: usize,
    direction: AnalogDirection,
    reversed: bool,
    base: DrawRegion,
    handle: Box<dyn AnalogControl>,
}

/// Decodes frames for one controller family and fans the values out to the
/// assigned control handles.
///
/// Decoding one frame is O(number of assigned controls). A frame that is
/// structurally too short for any assigned field is rejected whole; no
/// handle sees a partial update.
pub struct FrameDecoder {
    family: ControllerFamily,
    /// Bytes a frame must have before any update is applied
    required_len: usize,
    buttons: Vec<AssignedButton>,
    sticks: Vec<AssignedStick>,
    analogs: Vec<AssignedAnalog>,
}

impl FrameDecoder {
    /// Create an empty decoder for `family`
    pub fn new(family: ControllerFamily) -> Self {
        Self {
            family,
            required_len: 0,
            buttons: Vec::new(),
            sticks: Vec::new(),
            analogs: Vec::new(),
        }
    }

    /// Controller family this decoder was built for
    pub fn family(&self) -> ControllerFamily {
        self.family
    }

    /// Expected wire frame length for the active family
    pub fn frame_length(&self) -> usize {
        self.family.frame_length()
    }

    /// Number of assigned controls across all kinds
    pub fn assigned_count(&self) -> usize {
        self.buttons.len() + self.sticks.len() + self.analogs.len()
    }

    /// Decode one frame and push updates into every assigned handle.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the frame is shorter than any assigned
    /// control's field requires; in that case no handle is updated.
    pub fn decode(&mut self, frame: &[u8]) -> Result<()> {
        if frame.len() < self.required_len {
            return Err(PadViewError::MalformedFrame {
                got: frame.len(),
                needed: self.required_len,
            });
        }

        for button in &mut self.buttons {
            button.handle.update(frame[button.offset] != 0);
        }

        for stick in &mut self.sticks {
            let x = unpack_field(frame, stick.x_offset);
            let y = unpack_field(frame, stick.y_offset);
            let dx = f32::from(i16::from(x) - 128) * stick.x_scale;
            // Screen-space: positive controller Y moves the visual up
            let dy = -f32::from(i16::from(y) - 128) * stick.y_scale;
            stick.handle.update(dx, dy);
        }

        for analog in &mut self.analogs {
            let magnitude = unpack_field(frame, analog.offset);
            let mut percentage = f32::from(magnitude) / ANALOG_MAX;
            if analog.reversed {
                percentage = (1.0 - percentage).abs();
            }
            analog
                .handle
                .update(fill_region(analog.base, analog.direction, percentage));
        }

        Ok(())
    }

    /// Record that a field ending at `end` must fit in every frame
    fn require(&mut self, end: usize) {
        if end > self.required_len {
            self.required_len = end;
        }
    }
}

impl ControlSink for FrameDecoder {
    fn assign_button(
        &mut self,
        placement: &ButtonPlacement,
        handle: Box<dyn ButtonControl>,
    ) -> bool {
        let offset = placement.control_index;
        if offset >= self.family.frame_length() {
            debug!("rejecting button at offset {offset}");
            return false;
        }
        self.require(offset + 1);
        self.buttons.push(AssignedButton { offset, handle });
        true
    }

    fn assign_stick(&mut self, placement: &StickPlacement, handle: Box<dyn StickControl>) -> bool {
        let frame_length = self.family.frame_length();
        if placement.x_index + FIELD_BYTES > frame_length
            || placement.y_index + FIELD_BYTES > frame_length
        {
            debug!(
                "rejecting stick at offsets {}/{}",
                placement.x_index, placement.y_index
            );
            return false;
        }
        self.require(placement.x_index + FIELD_BYTES);
        self.require(placement.y_index + FIELD_BYTES);
        self.sticks.push(AssignedStick {
            x_offset: placement.x_index,
            y_offset: placement.y_index,
            x_scale: placement.x_range as f32 / STICK_DIVISOR,
            y_scale: placement.y_range as f32 / STICK_DIVISOR,
            handle,
        });
        true
    }

    fn assign_analog(
        &mut self,
        placement: &AnalogPlacement,
        handle: Box<dyn AnalogControl>,
    ) -> bool {
        let offset = placement.control_index;
        if offset + FIELD_BYTES > self.family.frame_length() {
            debug!("rejecting analog at offset {offset}");
            return false;
        }
        self.require(offset + FIELD_BYTES);
        self.analogs.push(AssignedAnalog {
            offset,
            direction: placement.direction,
            reversed: placement.reversed,
            base: DrawRegion::full(placement.geometry.width, placement.geometry.height),
            handle,
        });
        true
    }
}

/// Unpack an 8-byte bit-per-byte field into its accumulator.
///
/// Byte `i` (0 = most significant) contributes bit `7 - i` when nonzero.
fn unpack_field(frame: &[u8], offset: usize) -> u8 {
    let mut accumulator = 0u8;
    for (i, &byte) in frame[offset..offset + FIELD_BYTES].iter().enumerate() {
        if byte != 0 {
            accumulator |= 0x80 >> i;
        }
    }
    accumulator
}

/// Clip a placement's base region by `percentage` along `direction`.
///
/// "left"/"up" shrink the region from the far edge (the offset moves),
/// "right"/"down" grow it from the origin.
fn fill_region(base: DrawRegion, direction: AnalogDirection, percentage: f32) -> DrawRegion {
    let width = base.width as f32;
    let height = base.height as f32;
    let mut region = base;
    match direction {
        AnalogDirection::Left => region.x = (width - width * percentage) as u32,
        AnalogDirection::Right => region.width = (width * percentage) as u32,
        AnalogDirection::Up => region.y = (height - height * percentage) as u32,
        AnalogDirection::Down => region.height = (height * percentage) as u32,
    }
    region
}
