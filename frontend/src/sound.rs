use log::debug;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired, AudioStatus};
use sdl2::AudioSubsystem;

use vip8_core::{PortError, SoundPort};

const SAMPLE_RATE: i32 = 44_100;
const VOLUME: f32 = 0.2;

/// A square wave generator fed to the audio device on its own thread
struct SquareWave {
    sample_rate: f32,
    phase_inc: f32,
    phase: f32,
}

impl AudioCallback for SquareWave {
    type Channel = f32;

    fn callback(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = if self.phase < 0.5 { VOLUME } else { -VOLUME };
            self.phase = (self.phase + self.phase_inc) % 1.0;
        }
    }
}

/// # Beeper
/// The buzzer, played through the default audio output while the sound timer runs.
pub struct SdlBeeper {
    device: AudioDevice<SquareWave>,
}

impl SdlBeeper {
    /// Opens the default playback device, paused
    pub fn new(audio: &AudioSubsystem) -> Result<Self, PortError> {
        let desired = AudioSpecDesired {
            freq: Some(SAMPLE_RATE),
            channels: Some(1),
            samples: None,
        };
        let device = audio.open_playback(None, &desired, |spec| SquareWave {
            sample_rate: spec.freq as f32,
            phase_inc: 0.0,
            phase: 0.0,
        })?;
        let spec = device.spec();
        debug!(
            "audio device opened: {}Hz, {} channel(s), {} samples",
            spec.freq, spec.channels, spec.samples
        );

        Ok(SdlBeeper { device })
    }
}

impl SoundPort for SdlBeeper {
    fn start(&mut self, frequency_hz: u32) -> Result<(), PortError> {
        {
            let mut wave = self.device.lock();
            wave.phase_inc = frequency_hz as f32 / wave.sample_rate;
        }
        self.device.resume();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PortError> {
        self.device.pause();
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.device.status() == AudioStatus::Playing
    }
}
