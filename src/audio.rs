//! Sound effects and background music. Every clip is synthesized once while booting, stored as an
//! `AudioSource` asset, and kept alive by the `SoundBank` resource for the rest of the run.
//!
//! Gameplay asks for sounds through the `SoundCue` event. Music follows the game state: each
//! screen (and each level) maps to one looping track, and asking for the track that is already
//! playing leaves it alone.

use std::collections::HashMap;

use bevy::audio::{PlaybackMode, Volume};
use bevy::prelude::*;
use rand::Rng;

use crate::level::ActiveLevel;
use crate::state::GameState;
use crate::synth::{encode_wav, render, Part, Score, Sweep, Voice, Waveform, SAMPLE_RATE};

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioSettings>()
            .init_resource::<SoundBank>()
            .init_resource::<NowPlaying>()
            .add_event::<SoundCue>()
            .add_systems(OnEnter(GameState::Boot), synthesize_sounds)
            .add_systems(Update, (play_sound_cues, follow_music).chain());
    }
}

/// Playback levels, 0.0 to 1.0.
#[derive(Resource, Debug, Clone)]
pub struct AudioSettings {
    pub sfx_volume: f32,
    pub music_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sfx_volume: 0.6,
            music_volume: 0.3,
        }
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Collect,
    Jump,
    Hit,
    Death,
    Victory,
    LevelComplete,
    BossHit,
    BossDefeat,
    Click,
    /// Arpeggio for a combo multiplier; three and above share the longer one.
    Combo(u32),
    GameStart,
}

impl SoundCue {
    pub const ALL: [SoundCue; 12] = [
        SoundCue::Collect,
        SoundCue::Jump,
        SoundCue::Hit,
        SoundCue::Death,
        SoundCue::Victory,
        SoundCue::LevelComplete,
        SoundCue::BossHit,
        SoundCue::BossDefeat,
        SoundCue::Click,
        SoundCue::Combo(2),
        SoundCue::Combo(3),
        SoundCue::GameStart,
    ];

    /// The bank key for this cue.
    fn canonical(self) -> SoundCue {
        match self {
            SoundCue::Combo(multiplier) => SoundCue::Combo(multiplier.clamp(2, 3)),
            cue => cue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    Intro,
    Menu,
    Level1,
    Level2,
    Boss,
    Victory,
    GameOver,
}

impl MusicTrack {
    pub const ALL: [MusicTrack; 7] = [
        MusicTrack::Intro,
        MusicTrack::Menu,
        MusicTrack::Level1,
        MusicTrack::Level2,
        MusicTrack::Boss,
        MusicTrack::Victory,
        MusicTrack::GameOver,
    ];
}

/// Track for a screen. `None` keeps whatever is playing (boot, loading and the pause overlay).
pub fn track_for(state: GameState, level: u8) -> Option<MusicTrack> {
    match state {
        GameState::Intro => Some(MusicTrack::Intro),
        GameState::Menu => Some(MusicTrack::Menu),
        GameState::Playing => Some(match level {
            1 => MusicTrack::Level1,
            2 => MusicTrack::Level2,
            _ => MusicTrack::Boss,
        }),
        GameState::Victory => Some(MusicTrack::Victory),
        GameState::GameOver => Some(MusicTrack::GameOver),
        GameState::Boot | GameState::Loading | GameState::Paused => None,
    }
}

#[derive(Resource, Default)]
pub struct SoundBank {
    cues: HashMap<SoundCue, Handle<AudioSource>>,
    music: HashMap<MusicTrack, Handle<AudioSource>>,
}

#[derive(Resource, Default)]
struct NowPlaying {
    track: Option<MusicTrack>,
    entity: Option<Entity>,
}

#[derive(Component)]
struct Music;

fn tone(waveform: Waveform, frequency: f32, start: f32, duration: f32, gain: f32) -> Voice {
    Voice::new(waveform, frequency, start, duration, gain)
}

/// Notes played one after another, each `spacing` seconds apart.
fn arpeggio(
    waveform: Waveform,
    notes: &[f32],
    spacing: f32,
    duration: f32,
    gain: f32,
) -> Vec<Voice> {
    notes
        .iter()
        .enumerate()
        .map(|(i, &frequency)| tone(waveform, frequency, i as f32 * spacing, duration, gain))
        .collect()
}

fn victory_fanfare(offset: f32) -> Vec<Voice> {
    let mut voices = arpeggio(Waveform::Square, &[523.0, 659.0, 784.0, 1047.0], 0.15, 0.225, 0.2);
    voices.push(tone(Waveform::Sine, 1047.0, 0.6, 0.5, 0.3));
    for voice in &mut voices {
        voice.start += offset;
    }
    voices
}

pub fn cue_voices(cue: SoundCue) -> Vec<Voice> {
    use Waveform::*;

    match cue.canonical() {
        SoundCue::Collect => vec![
            tone(Sine, 587.0, 0.0, 0.2, 0.4).sweep(Sweep::Step {
                after: 0.08,
                to: 880.0,
            }),
            tone(Sine, 784.0, 0.05, 0.1, 0.2),
        ],
        SoundCue::Jump => {
            vec![tone(Sine, 150.0, 0.0, 0.15, 0.3).sweep(Sweep::Exponential { to: 400.0 })]
        }
        SoundCue::Hit => vec![
            tone(Noise, 0.0, 0.0, 0.1, 0.3),
            tone(Sine, 100.0, 0.0, 0.2, 0.4).sweep(Sweep::Exponential { to: 50.0 }),
        ],
        SoundCue::Death => arpeggio(Triangle, &[392.0, 349.0, 311.0, 261.0], 0.2, 0.2, 0.3),
        SoundCue::Victory => victory_fanfare(0.0),
        SoundCue::LevelComplete => arpeggio(Sine, &[392.0, 523.0, 659.0], 0.1, 0.3, 0.3),
        SoundCue::BossHit => vec![
            tone(Sawtooth, 200.0, 0.0, 0.15, 0.4).sweep(Sweep::Exponential { to: 50.0 }),
            tone(Noise, 0.0, 0.05, 0.05, 0.3),
        ],
        SoundCue::BossDefeat => {
            let mut voices = vec![
                tone(Noise, 0.0, 0.0, 0.5, 0.5),
                tone(Sine, 90.0, 0.0, 0.5, 0.4).sweep(Sweep::Exponential { to: 30.0 }),
            ];
            voices.extend(victory_fanfare(0.6));
            voices
        }
        SoundCue::Click => vec![tone(Sine, 600.0, 0.0, 0.05, 0.2)],
        SoundCue::Combo(3) => arpeggio(Sine, &[523.0, 659.0, 784.0, 1047.0], 0.05, 0.1, 0.25),
        SoundCue::Combo(_) => arpeggio(Sine, &[523.0, 659.0, 784.0], 0.05, 0.1, 0.25),
        SoundCue::GameStart => arpeggio(Triangle, &[262.0, 330.0, 392.0, 523.0], 0.08, 0.2, 0.3),
    }
}

const fn part(
    waveform: Waveform,
    notes: &'static [f32],
    beats_per_note: f32,
    gain: f32,
    sustained: bool,
) -> Part {
    Part {
        waveform,
        notes,
        beats_per_note,
        gain,
        sustained,
    }
}

static INTRO_PARTS: [Part; 3] = [
    part(Waveform::Sine, &[196.0, 175.0, 165.0, 147.0], 4.0, 0.15, true),
    part(Waveform::Sine, &[233.0, 220.0, 196.0, 175.0], 4.0, 0.12, true),
    part(Waveform::Sine, &[294.0, 262.0, 247.0, 220.0], 4.0, 0.12, true),
];

static MENU_PARTS: [Part; 2] = [
    part(
        Waveform::Square,
        &[
            523.0, 587.0, 659.0, 587.0, 523.0, 494.0, 440.0, 494.0, 523.0, 587.0, 659.0, 784.0,
            659.0, 587.0, 523.0, 494.0, 440.0, 494.0, 523.0, 587.0, 659.0, 587.0, 523.0, 440.0,
            392.0, 440.0, 494.0, 523.0, 587.0, 523.0, 494.0, 440.0,
        ],
        1.0,
        0.12,
        false,
    ),
    part(
        Waveform::Triangle,
        &[131.0, 147.0, 165.0, 147.0, 131.0, 123.0, 110.0, 123.0],
        4.0,
        0.3,
        true,
    ),
];

static LEVEL1_PARTS: [Part; 2] = [
    part(
        Waveform::Sawtooth,
        &[
            392.0, 440.0, 494.0, 523.0, 587.0, 523.0, 494.0, 440.0, 392.0, 494.0, 587.0, 659.0,
            587.0, 494.0, 392.0, 330.0, 349.0, 392.0, 440.0, 494.0, 523.0, 494.0, 440.0, 392.0,
            330.0, 392.0, 440.0, 523.0, 494.0, 440.0, 392.0, 349.0,
        ],
        1.0,
        0.1,
        false,
    ),
    part(
        Waveform::Square,
        &[196.0, 196.0, 220.0, 220.0, 175.0, 175.0, 165.0, 165.0],
        4.0,
        0.08,
        true,
    ),
];

static LEVEL2_PARTS: [Part; 3] = [
    part(
        Waveform::Sawtooth,
        &[
            523.0, 587.0, 659.0, 698.0, 784.0, 698.0, 659.0, 587.0, 523.0, 659.0, 784.0, 880.0,
            784.0, 659.0, 523.0, 440.0, 494.0, 587.0, 659.0, 784.0, 880.0, 784.0, 659.0, 587.0,
            523.0, 587.0, 659.0, 784.0, 698.0, 659.0, 587.0, 523.0,
        ],
        1.0,
        0.1,
        false,
    ),
    part(
        Waveform::Square,
        &[220.0, 220.0, 247.0, 247.0, 196.0, 196.0, 185.0, 185.0],
        4.0,
        0.08,
        true,
    ),
    part(
        Waveform::Triangle,
        &[523.0, 659.0, 784.0, 880.0, 784.0, 659.0],
        0.5,
        0.06,
        false,
    ),
];

static BOSS_PARTS: [Part; 2] = [
    part(
        Waveform::Sawtooth,
        &[82.0, 82.0, 87.0, 82.0, 77.0, 82.0, 73.0, 77.0],
        0.5,
        0.2,
        false,
    ),
    part(
        Waveform::Square,
        &[
            659.0, 698.0, 784.0, 880.0, 784.0, 698.0, 659.0, 587.0, 523.0, 587.0, 659.0, 784.0,
            880.0, 784.0, 659.0, 587.0,
        ],
        1.0,
        0.1,
        false,
    ),
];

static VICTORY_PARTS: [Part; 2] = [
    part(
        Waveform::Sine,
        &[523.0, 659.0, 784.0, 1047.0, 784.0, 659.0],
        0.5,
        0.15,
        false,
    ),
    part(
        Waveform::Triangle,
        &[131.0, 175.0, 196.0, 131.0],
        2.0,
        0.3,
        true,
    ),
];

static GAME_OVER_PARTS: [Part; 4] = [
    part(Waveform::Sine, &[220.0, 196.0, 175.0, 165.0], 4.0, 0.12, true),
    part(Waveform::Sine, &[262.0, 247.0, 220.0, 196.0], 4.0, 0.1, true),
    part(Waveform::Sine, &[330.0, 294.0, 262.0, 247.0], 4.0, 0.1, true),
    part(
        Waveform::Triangle,
        &[659.0, 587.0, 523.0, 494.0, 440.0, 392.0, 349.0, 330.0],
        2.0,
        0.15,
        false,
    ),
];

pub fn score_for(track: MusicTrack) -> Score {
    let (bpm, beats, parts): (f32, f32, &'static [Part]) = match track {
        MusicTrack::Intro => (70.0, 16.0, &INTRO_PARTS),
        MusicTrack::Menu => (130.0, 32.0, &MENU_PARTS),
        MusicTrack::Level1 => (120.0, 32.0, &LEVEL1_PARTS),
        MusicTrack::Level2 => (135.0, 32.0, &LEVEL2_PARTS),
        MusicTrack::Boss => (140.0, 16.0, &BOSS_PARTS),
        MusicTrack::Victory => (110.0, 8.0, &VICTORY_PARTS),
        MusicTrack::GameOver => (60.0, 16.0, &GAME_OVER_PARTS),
    };
    Score { bpm, beats, parts }
}

fn wav_source(samples: &[f32]) -> AudioSource {
    AudioSource {
        bytes: encode_wav(samples, SAMPLE_RATE).into(),
    }
}

/// Renders every clip, then leaves the boot screen.
fn synthesize_sounds(
    mut sources: ResMut<Assets<AudioSource>>,
    mut bank: ResMut<SoundBank>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let mut rng = rand::thread_rng();
    build_bank(&mut bank, &mut sources, &mut rng);
    info!(
        "Synthesized {} sound cues and {} music loops",
        bank.cues.len(),
        bank.music.len()
    );
    next_state.set(GameState::Intro);
}

fn build_bank(bank: &mut SoundBank, sources: &mut Assets<AudioSource>, rng: &mut impl Rng) {
    for cue in SoundCue::ALL {
        let samples = render(&cue_voices(cue), 0.0, rng);
        bank.cues.insert(cue, sources.add(wav_source(&samples)));
    }
    for track in MusicTrack::ALL {
        let samples = score_for(track).render(rng);
        bank.music.insert(track, sources.add(wav_source(&samples)));
    }
}

fn play_sound_cues(
    mut commands: Commands,
    mut cues: EventReader<SoundCue>,
    bank: Res<SoundBank>,
    settings: Res<AudioSettings>,
) {
    for cue in cues.read() {
        let Some(source) = bank.cues.get(&cue.canonical()) else {
            continue;
        };
        commands.spawn(AudioBundle {
            source: source.clone(),
            settings: PlaybackSettings {
                mode: PlaybackMode::Despawn,
                volume: Volume::new(settings.sfx_volume),
                ..default()
            },
        });
    }
}

fn follow_music(
    mut commands: Commands,
    state: Res<State<GameState>>,
    level: Res<ActiveLevel>,
    bank: Res<SoundBank>,
    settings: Res<AudioSettings>,
    mut now_playing: ResMut<NowPlaying>,
) {
    let Some(track) = track_for(*state.get(), level.number) else {
        return;
    };
    if now_playing.track == Some(track) {
        return;
    }
    let Some(source) = bank.music.get(&track) else {
        return;
    };

    if let Some(entity) = now_playing.entity.take() {
        if let Some(mut old) = commands.get_entity(entity) {
            old.despawn();
        }
    }

    debug!("Music: {:?}", track);
    let entity = commands
        .spawn((
            Name::new("Music"),
            Music,
            AudioBundle {
                source: source.clone(),
                settings: PlaybackSettings {
                    mode: PlaybackMode::Loop,
                    volume: Volume::new(settings.music_volume),
                    ..default()
                },
            },
        ))
        .id();
    now_playing.track = Some(track);
    now_playing.entity = Some(entity);
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn every_state_maps_to_the_right_track() {
        assert_eq!(track_for(GameState::Intro, 1), Some(MusicTrack::Intro));
        assert_eq!(track_for(GameState::Menu, 2), Some(MusicTrack::Menu));
        assert_eq!(track_for(GameState::Playing, 1), Some(MusicTrack::Level1));
        assert_eq!(track_for(GameState::Playing, 2), Some(MusicTrack::Level2));
        assert_eq!(track_for(GameState::Playing, 3), Some(MusicTrack::Boss));
        assert_eq!(track_for(GameState::GameOver, 3), Some(MusicTrack::GameOver));
        assert_eq!(track_for(GameState::Victory, 3), Some(MusicTrack::Victory));
        assert_eq!(track_for(GameState::Paused, 2), None);
        assert_eq!(track_for(GameState::Loading, 2), None);
    }

    #[test]
    fn combo_cues_share_two_clips() {
        assert_eq!(SoundCue::Combo(5).canonical(), SoundCue::Combo(3));
        assert_eq!(SoundCue::Combo(1).canonical(), SoundCue::Combo(2));
        assert_eq!(cue_voices(SoundCue::Combo(3)).len(), 4);
        assert_eq!(cue_voices(SoundCue::Combo(2)).len(), 3);
    }

    #[test]
    fn boss_defeat_ends_with_the_fanfare() {
        let last = cue_voices(SoundCue::BossDefeat)
            .iter()
            .map(Voice::end)
            .fold(0.0, f32::max);
        assert!((last - 1.7).abs() < 1e-4);
    }

    #[test]
    fn every_clip_is_synthesized() {
        let mut bank = SoundBank::default();
        let mut sources = Assets::<AudioSource>::default();
        build_bank(&mut bank, &mut sources, &mut StdRng::seed_from_u64(3));

        for cue in SoundCue::ALL {
            let handle = &bank.cues[&cue];
            let clip = sources.get(handle).unwrap();
            assert!(clip.bytes.len() > 44, "{cue:?} is empty");
        }
        for track in MusicTrack::ALL {
            assert!(sources.get(&bank.music[&track]).is_some(), "{track:?}");
        }
    }

    #[test]
    fn music_only_restarts_on_a_new_track() {
        let mut app = App::new();
        app.add_plugins(bevy::state::app::StatesPlugin)
            .insert_state(GameState::Menu)
            .init_resource::<ActiveLevel>()
            .init_resource::<AudioSettings>()
            .init_resource::<NowPlaying>()
            .insert_resource(SoundBank {
                cues: HashMap::new(),
                music: MusicTrack::ALL
                    .into_iter()
                    .map(|track| (track, Handle::default()))
                    .collect(),
            })
            .add_systems(Update, follow_music);

        app.update();
        let first = app.world().resource::<NowPlaying>().entity;
        assert_eq!(
            app.world().resource::<NowPlaying>().track,
            Some(MusicTrack::Menu)
        );

        app.update();
        assert_eq!(app.world().resource::<NowPlaying>().entity, first);

        app.world_mut()
            .resource_mut::<NextState<GameState>>()
            .set(GameState::Playing);
        app.update();
        let now = app.world().resource::<NowPlaying>();
        assert_eq!(now.track, Some(MusicTrack::Level1));
        assert_ne!(now.entity, first);
        let world = app.world_mut();
        assert_eq!(world.query::<&Music>().iter(world).count(), 1);
    }
}
