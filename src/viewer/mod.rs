//! # Input Viewer Module
//!
//! Wires one loaded skin, one serial session, and one presentation adapter
//! into a running viewer.
//!
//! Construction builds the frame decoder, hands the adapter a control sink
//! to register its visual handles against the skin's resolved placements,
//! and prepares the serial session. After that the host shell owns the
//! cadence: it calls [`InputViewer::tick`] from its own timer or loop, and
//! the viewer performs one read-decode-repaint cycle per call.

use tracing::{debug, warn};

use crate::config::SerialConfig;
use crate::decoder::FrameDecoder;
use crate::error::Result;
use crate::mapping::ControllerFamily;
use crate::scene::PresentationAdapter;
use crate::serial::SerialSession;
use crate::skin::SkinDescriptor;

/// A running input viewer: serial session, frame decoder, and the host's
/// presentation adapter.
pub struct InputViewer<A: PresentationAdapter> {
    session: SerialSession,
    decoder: FrameDecoder,
    adapter: A,
}

impl<A: PresentationAdapter> InputViewer<A> {
    /// Build a viewer for a loaded skin.
    ///
    /// The adapter's scene is set up immediately; the serial device is
    /// opened immediately as well, but an unavailable device is not fatal —
    /// the session reconnects from `tick()` and the scene simply stays
    /// static until frames arrive.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - Skin loaded for `family`
    /// * `family` - Active controller family
    /// * `serial` - Serial device parameters
    /// * `adapter` - Host shell presentation adapter
    ///
    /// # Errors
    ///
    /// Returns an error when the adapter fails to set up the scene.
    pub fn new(
        descriptor: &SkinDescriptor,
        family: ControllerFamily,
        serial: SerialConfig,
        mut adapter: A,
    ) -> Result<Self> {
        let mut decoder = FrameDecoder::new(family);
        adapter.setup_scene(descriptor, &mut decoder)?;
        debug!(
            controls = decoder.assigned_count(),
            "scene set up for skin '{}'", descriptor.name()
        );

        let mut session = SerialSession::new(serial, family.frame_length());
        if let Err(e) = session.connect() {
            warn!("serial device not available yet: {e}");
        }

        Ok(Self {
            session,
            decoder,
            adapter,
        })
    }

    /// Whether the serial device is currently usable
    pub fn valid(&self) -> bool {
        self.session.valid()
    }

    /// Scene width in scene units
    pub fn width(&self) -> u32 {
        self.adapter.width()
    }

    /// Scene height in scene units
    pub fn height(&self) -> u32 {
        self.adapter.height()
    }

    /// Run one read-decode-repaint cycle.
    ///
    /// Decode and repaint happen synchronously for a delivered frame, so a
    /// consumer never observes two frames' updates interleaved. A malformed
    /// frame is dropped with a log line; session-level failures are
    /// absorbed into the session's reconnect path.
    ///
    /// # Returns
    ///
    /// `true` when a frame was decoded and the scene repainted.
    pub async fn tick(&mut self) -> bool {
        let decoder = &mut self.decoder;
        let adapter = &mut self.adapter;

        let mut painted = false;
        self.session
            .tick(|frame| match decoder.decode(frame) {
                Ok(()) => {
                    adapter.update();
                    painted = true;
                }
                Err(e) => warn!("dropping frame: {e}"),
            })
            .await;
        painted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::scene::{ButtonControl, ControlSink, StickControl};
    use crate::skin::descriptor::DESCRIPTOR_FILE;
    use tempfile::TempDir;

    /// Adapter that registers handles for every placement and counts
    /// repaints
    struct RecordingAdapter {
        repaints: Arc<Mutex<u32>>,
        pressed: Arc<Mutex<Option<bool>>>,
        stick: Arc<Mutex<Option<(f32, f32)>>>,
    }

    struct RecordingButton(Arc<Mutex<Option<bool>>>);

    impl ButtonControl for RecordingButton {
        fn update(&mut self, value: bool) {
            *self.0.lock().unwrap() = Some(value);
        }
    }

    struct RecordingStick(Arc<Mutex<Option<(f32, f32)>>>);

    impl StickControl for RecordingStick {
        fn update(&mut self, dx: f32, dy: f32) {
            *self.0.lock().unwrap() = Some((dx, dy));
        }
    }

    impl PresentationAdapter for RecordingAdapter {
        fn setup_scene(
            &mut self,
            descriptor: &SkinDescriptor,
            sink: &mut dyn ControlSink,
        ) -> Result<()> {
            for button in descriptor.buttons() {
                sink.assign_button(button, Box::new(RecordingButton(self.pressed.clone())));
            }
            for stick in descriptor.sticks() {
                sink.assign_stick(stick, Box::new(RecordingStick(self.stick.clone())));
            }
            Ok(())
        }

        fn update(&mut self) {
            *self.repaints.lock().unwrap() += 1;
        }

        fn width(&self) -> u32 {
            640
        }

        fn height(&self) -> u32 {
            480
        }
    }

    fn test_skin() -> (TempDir, SkinDescriptor) {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DESCRIPTOR_FILE),
            r#"<skin type="n64" name="Test">
                <background name="bg" image="bg.png"/>
                <button x="1" y="2" width="3" height="4" image="start.png" name="start"/>
                <stick x="5" y="6" width="7" height="8" image="stick.png"
                       xname="stick_x" yname="stick_y" xrange="128" yrange="128"/>
            </skin>"#,
        )
        .unwrap();
        let descriptor = SkinDescriptor::load(dir.path(), ControllerFamily::N64).unwrap();
        (dir, descriptor)
    }

    fn offline_serial() -> SerialConfig {
        SerialConfig {
            port: "/dev/nonexistent_pad_device".to_string(),
            baud_rate: 115200,
            timeout_ms: 20,
            reconnect_backoff_ms: 1000,
        }
    }

    #[tokio::test]
    async fn test_viewer_survives_missing_device() {
        let (_dir, descriptor) = test_skin();
        let adapter = RecordingAdapter {
            repaints: Arc::new(Mutex::new(0)),
            pressed: Arc::new(Mutex::new(None)),
            stick: Arc::new(Mutex::new(None)),
        };
        let repaints = adapter.repaints.clone();

        let mut viewer = InputViewer::new(
            &descriptor,
            ControllerFamily::N64,
            offline_serial(),
            adapter,
        )
        .unwrap();

        assert!(!viewer.valid());
        assert_eq!(viewer.width(), 640);
        assert_eq!(viewer.height(), 480);

        // Ticking without a device is a no-op, not a crash
        assert!(!viewer.tick().await);
        assert_eq!(*repaints.lock().unwrap(), 0);
    }
}
