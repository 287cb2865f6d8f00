//! Capability probing

use crate::domain::audio::CompressedEncoding;
use crate::domain::capability::CaptureProfile;

use super::ports::{NativeRecorder, PlatformSignals};

/// Reads environment signals into a [`CaptureProfile`]. Never fails.
pub struct CapabilityProber<'a, P: ?Sized, N: ?Sized> {
    platform: &'a P,
    recorder: &'a N,
}

impl<'a, P, N> CapabilityProber<'a, P, N>
where
    P: PlatformSignals + ?Sized,
    N: NativeRecorder + ?Sized,
{
    pub fn new(platform: &'a P, recorder: &'a N) -> Self {
        Self { platform, recorder }
    }

    /// Take a fresh snapshot of the environment
    pub fn probe(&self) -> CaptureProfile {
        let recorder_available = self.recorder.is_available();
        let encodings = if recorder_available {
            CompressedEncoding::supported_by(|e| self.recorder.is_encoding_supported(e))
        } else {
            Vec::new()
        };

        let profile = CaptureProfile::new(
            self.platform.is_isolated(),
            self.platform.shared_memory_available(),
            recorder_available,
            encodings,
        );

        log::info!(
            "Capability probe: isolated={}, shared_memory={}, encodings={:?}",
            profile.isolated_context_available(),
            profile.shared_memory_available(),
            profile.supported_compressed_encodings()
        );

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakePlatform, FakeRecorder};
    use crate::domain::capability::CapturePath;

    #[test]
    fn full_capabilities_select_primary() {
        let platform = FakePlatform::isolated();
        let recorder = FakeRecorder::supporting(&[CompressedEncoding::OggOpus]);

        let profile = CapabilityProber::new(&platform, &recorder).probe();
        assert!(profile.isolated_context_available());
        assert!(profile.shared_memory_available());
        assert!(profile.direct_capture_viable());
        assert_eq!(profile.select_path(true), CapturePath::Primary);
    }

    #[test]
    fn encodings_reported_in_preference_order() {
        let platform = FakePlatform::isolated();
        let recorder = FakeRecorder::supporting(&[
            CompressedEncoding::Mp4,
            CompressedEncoding::WebmOpus,
        ]);

        let profile = CapabilityProber::new(&platform, &recorder).probe();
        assert_eq!(
            profile.supported_compressed_encodings(),
            &[CompressedEncoding::WebmOpus, CompressedEncoding::Mp4]
        );
    }

    #[test]
    fn missing_recorder_is_not_an_error() {
        let platform = FakePlatform::not_isolated();
        let recorder = FakeRecorder::unavailable();

        let profile = CapabilityProber::new(&platform, &recorder).probe();
        assert!(!profile.isolated_context_available());
        assert!(profile.supported_compressed_encodings().is_empty());
        assert!(!profile.direct_capture_viable());
    }

    #[test]
    fn probe_reflects_environment_changes() {
        let platform = FakePlatform::not_isolated();
        let recorder = FakeRecorder::supporting(&[CompressedEncoding::OggOpus]);
        let prober = CapabilityProber::new(&platform, &recorder);

        assert_eq!(prober.probe().select_path(true), CapturePath::Secondary);
        platform.set_isolated(true);
        assert_eq!(prober.probe().select_path(true), CapturePath::Primary);
    }
}
