/// Procedural chiptune-style sound effects via rodio.
///
/// Every effect is synthesized once at init into an in-memory WAV buffer;
/// playback is fire-and-forget through a detached Sink. Build without the
/// "sound" feature and the stub SoundEngine swallows every call.

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::session::event::SessionEvent;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = 2.0 * std::f32::consts::PI;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_place: Arc<Vec<u8>>,
        sfx_remove: Arc<Vec<u8>>,
        sfx_wrong: Arc<Vec<u8>>,
        sfx_solved: Arc<Vec<u8>>,
        sfx_hint: Arc<Vec<u8>>,
        sfx_coins: Arc<Vec<u8>>,
        sfx_denied: Arc<Vec<u8>>,
        sfx_finale: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_place: Arc::new(encode_wav(&gen_place())),
                sfx_remove: Arc::new(encode_wav(&gen_remove())),
                sfx_wrong: Arc::new(encode_wav(&gen_wrong())),
                sfx_solved: Arc::new(encode_wav(&gen_solved())),
                sfx_hint: Arc::new(encode_wav(&gen_hint())),
                sfx_coins: Arc::new(encode_wav(&gen_coins())),
                sfx_denied: Arc::new(encode_wav(&gen_denied())),
                sfx_finale: Arc::new(encode_wav(&gen_finale())),
            })
        }

        /// Route a session event to its effect. Unmapped events are silent.
        pub fn play_event(&self, event: SessionEvent) {
            let buf = match event {
                SessionEvent::LetterPlaced => &self.sfx_place,
                SessionEvent::LetterRemoved => &self.sfx_remove,
                SessionEvent::GuessIncorrect => &self.sfx_wrong,
                SessionEvent::LevelSolved => &self.sfx_solved,
                SessionEvent::HintUsed => &self.sfx_hint,
                SessionEvent::CoinsExchanged | SessionEvent::CoinsPurchased => &self.sfx_coins,
                SessionEvent::ActionDenied => &self.sfx_denied,
                SessionEvent::GameCompleted => &self.sfx_finale,
                SessionEvent::SaveFailed => return,
            };
            self.play(buf);
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform synthesis — mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// One sine note with a linear fade-out, appended to `out`.
    fn push_note(out: &mut Vec<f32>, freq: f32, duration: f32, volume: f32) {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - i as f32 / n as f32;
            out.push((t * freq * TAU).sin() * env * volume);
        }
    }

    /// Letter placed: single bright tick.
    fn gen_place() -> Vec<f32> {
        let mut s = Vec::new();
        push_note(&mut s, 880.0, 0.04, 0.25);
        s
    }

    /// Letter removed: the same tick an octave down.
    fn gen_remove() -> Vec<f32> {
        let mut s = Vec::new();
        push_note(&mut s, 440.0, 0.05, 0.2);
        s
    }

    /// Wrong word: flat two-note buzz, square-ish for bite.
    fn gen_wrong() -> Vec<f32> {
        let notes = [220.0_f32, 185.0];
        let note_dur = 0.11;
        let mut s = Vec::new();
        for &freq in &notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                let wave = (t * freq * TAU).sin() * 0.6 + (t * freq * 3.0 * TAU).sin() * 0.4;
                s.push(wave * env * 0.28);
            }
        }
        s
    }

    /// Level solved: ascending major fanfare with a sustained top note.
    fn gen_solved() -> Vec<f32> {
        let notes = [523.0_f32, 659.0, 784.0]; // C5 E5 G5
        let mut s = Vec::new();
        for &freq in &notes {
            push_note(&mut s, freq, 0.09, 0.3);
        }
        push_note(&mut s, 1047.0, 0.3, 0.3); // C6
        s
    }

    /// Hint reveal: gentle descending two-note chime.
    fn gen_hint() -> Vec<f32> {
        let mut s = Vec::new();
        push_note(&mut s, 1319.0, 0.07, 0.22); // E6
        push_note(&mut s, 1047.0, 0.12, 0.22); // C6
        s
    }

    /// Coins moved: quick ascending arpeggio.
    fn gen_coins() -> Vec<f32> {
        let notes = [1047.0_f32, 1319.0, 1568.0]; // C6 E6 G6
        let mut s = Vec::new();
        for &freq in &notes {
            push_note(&mut s, freq, 0.045, 0.25);
        }
        s
    }

    /// Action denied: dull single thunk.
    fn gen_denied() -> Vec<f32> {
        let mut s = Vec::new();
        push_note(&mut s, 147.0, 0.09, 0.3);
        s
    }

    /// Whole catalog cleared: long rising run over an octave.
    fn gen_finale() -> Vec<f32> {
        let notes = [523.0_f32, 587.0, 659.0, 784.0, 880.0, 1047.0];
        let mut s = Vec::new();
        for &freq in &notes {
            push_note(&mut s, freq, 0.08, 0.28);
        }
        push_note(&mut s, 1047.0, 0.4, 0.3);
        s
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder — 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    fn encode_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let channels: u16 = 1;
        let byte_rate = SAMPLE_RATE * channels as u32 * bits_per_sample as u32 / 8;
        let block_align = channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API — compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_event(&self, _event: crate::session::event::SessionEvent) {}
}
