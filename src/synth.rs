//! Procedural sound: oscillator voices mixed into a mono buffer and wrapped as 16-bit PCM WAV.
//!
//! Every sound effect and music loop in the game is described here as a list of `Voice`s, so the
//! binary ships without audio files.

use std::f32::consts::TAU;

use rand::Rng;

pub const SAMPLE_RATE: u32 = 22_050;
/// Decaying envelopes end at this fraction of their starting gain.
const DECAY_FLOOR: f32 = 0.01;
/// Attack and release of sustained notes, to avoid clicks.
const EDGE_SECS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
    Noise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sweep {
    Hold,
    /// Jumps to `to` after `after` seconds.
    Step { after: f32, to: f32 },
    Linear { to: f32 },
    Exponential { to: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    /// Exponential fall to `DECAY_FLOOR` over the voice's duration.
    Decay,
    /// Constant level with short fades at both ends.
    Sustain,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub frequency: f32,
    pub sweep: Sweep,
    pub envelope: Envelope,
    pub start: f32,
    pub duration: f32,
    pub gain: f32,
}

impl Voice {
    pub fn new(waveform: Waveform, frequency: f32, start: f32, duration: f32, gain: f32) -> Self {
        Self {
            waveform,
            frequency,
            sweep: Sweep::Hold,
            envelope: Envelope::Decay,
            start,
            duration,
            gain,
        }
    }

    pub fn sweep(mut self, sweep: Sweep) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn sustained(mut self) -> Self {
        self.envelope = Envelope::Sustain;
        self
    }

    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    fn frequency_at(&self, t: f32) -> f32 {
        let progress = (t / self.duration).clamp(0.0, 1.0);
        match self.sweep {
            Sweep::Hold => self.frequency,
            Sweep::Step { after, to } => {
                if t >= after {
                    to
                } else {
                    self.frequency
                }
            }
            Sweep::Linear { to } => self.frequency + (to - self.frequency) * progress,
            Sweep::Exponential { to } => self.frequency * (to / self.frequency).powf(progress),
        }
    }

    fn level_at(&self, t: f32) -> f32 {
        match self.envelope {
            Envelope::Decay => self.gain * DECAY_FLOOR.powf((t / self.duration).clamp(0.0, 1.0)),
            Envelope::Sustain => {
                let edge = EDGE_SECS.min(self.duration * 0.5);
                let fade_in = (t / edge).min(1.0);
                let fade_out = ((self.duration - t) / edge).min(1.0);
                self.gain * fade_in.min(fade_out).max(0.0)
            }
        }
    }
}

fn oscillator(waveform: Waveform, phase: f32, rng: &mut impl Rng) -> f32 {
    match waveform {
        Waveform::Sine => (phase * TAU).sin(),
        Waveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        Waveform::Sawtooth => 2.0 * phase - 1.0,
        Waveform::Noise => rng.gen_range(-1.0..=1.0),
    }
}

/// Mixes `voices` into a buffer long enough for the last one to finish, or `min_secs`, whichever
/// is longer. Output is clamped to [-1, 1].
pub fn render(voices: &[Voice], min_secs: f32, rng: &mut impl Rng) -> Vec<f32> {
    let rate = SAMPLE_RATE as f32;
    let length = voices
        .iter()
        .map(Voice::end)
        .fold(min_secs, f32::max);
    let mut buffer = vec![0.0f32; (length * rate).ceil() as usize];

    for voice in voices {
        let first = (voice.start * rate).round() as usize;
        let count = (voice.duration * rate).round() as usize;
        let mut phase = 0.0f32;
        for (i, sample) in buffer.iter_mut().skip(first).take(count).enumerate() {
            let t = i as f32 / rate;
            *sample += oscillator(voice.waveform, phase, rng) * voice.level_at(t);
            phase = (phase + voice.frequency_at(t) / rate).fract();
        }
    }

    for sample in &mut buffer {
        *sample = sample.clamp(-1.0, 1.0);
    }
    buffer
}

/// Wraps samples as a 16-bit mono PCM WAV file.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut wav = Vec::with_capacity(44 + data_len as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        wav.extend_from_slice(&value.to_le_bytes());
    }
    wav
}

/// One repeating line of a music loop. A frequency of 0 is a rest.
#[derive(Debug, Clone, Copy)]
pub struct Part {
    pub waveform: Waveform,
    pub notes: &'static [f32],
    pub beats_per_note: f32,
    pub gain: f32,
    pub sustained: bool,
}

/// A music loop: every part cycles through its notes until `beats` have passed.
#[derive(Debug, Clone, Copy)]
pub struct Score {
    pub bpm: f32,
    pub beats: f32,
    pub parts: &'static [Part],
}

impl Score {
    pub fn loop_secs(&self) -> f32 {
        self.beats * 60.0 / self.bpm
    }

    pub fn voices(&self) -> Vec<Voice> {
        let beat = 60.0 / self.bpm;
        let mut voices = Vec::new();
        for part in self.parts {
            if part.notes.is_empty() {
                continue;
            }
            let steps = (self.beats / part.beats_per_note).floor() as usize;
            let duration = part.beats_per_note * beat;
            for step in 0..steps {
                let frequency = part.notes[step % part.notes.len()];
                if frequency <= 0.0 {
                    continue;
                }
                let voice = Voice::new(
                    part.waveform,
                    frequency,
                    step as f32 * duration,
                    duration,
                    part.gain,
                );
                voices.push(if part.sustained { voice.sustained() } else { voice });
            }
        }
        voices
    }

    /// Renders exactly one loop, so playback can repeat it seamlessly.
    pub fn render(&self, rng: &mut impl Rng) -> Vec<f32> {
        let mut samples = render(&self.voices(), self.loop_secs(), rng);
        samples.truncate((self.loop_secs() * SAMPLE_RATE as f32).ceil() as usize);
        samples
    }
}
