//! Dedicated audio thread: keeps `!Send` rodio resources off the async runtime.
//!
//! `rodio::OutputStream` is `!Send` on some platforms. It is created on and
//! confined to a single OS thread; [`RodioSink`] is the `Send + Sync` proxy
//! the playback engine holds, and every call becomes an [`AudioCommand`].

use std::sync::{Arc, mpsc};
use std::thread;

use parrot_core::PcmBuffer;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use crate::error::VoiceError;
use crate::sink::AudioSink;

// ── Commands ───────────────────────────────────────────────────────

enum AudioCommand {
    /// Replace the current clip.
    Play {
        clip: Arc<PcmBuffer>,
        rate: f32,
        reply: mpsc::Sender<Result<(), VoiceError>>,
    },

    /// Stop the current clip (fire-and-forget).
    Stop,

    IsPlaying { reply: mpsc::Sender<bool> },

    /// Play a cue on its own sink.
    PlayCue {
        cue: PcmBuffer,
        reply: mpsc::Sender<Result<(), VoiceError>>,
    },

    /// Start the looping noise bed.
    StartNoise {
        noise: PcmBuffer,
        gain: f32,
        reply: mpsc::Sender<Result<(), VoiceError>>,
    },

    StopNoise,

    Shutdown,
}

// ── Device state (audio thread only) ───────────────────────────────

struct DeviceOutput {
    /// Must stay alive for the handle to work.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    clip: Option<Sink>,
    cue: Option<Sink>,
    noise: Option<Sink>,
}

impl DeviceOutput {
    fn open() -> Result<Self, VoiceError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;
        tracing::info!("Audio output initialized on default device");
        Ok(Self {
            _stream: stream,
            handle,
            clip: None,
            cue: None,
            noise: None,
        })
    }

    fn new_sink(&self) -> Result<Sink, VoiceError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| VoiceError::OutputStreamError(e.to_string()))?;
        // Resume before use; a sink left paused by the device would stay silent.
        sink.play();
        Ok(sink)
    }

    fn play(&mut self, clip: &PcmBuffer, rate: f32) -> Result<(), VoiceError> {
        self.stop();
        let sink = self.new_sink()?;
        sink.set_speed(rate.max(0.1));
        sink.append(SamplesBuffer::new(clip.channels, clip.sample_rate, clip.samples.clone()));
        self.clip = Some(sink);
        tracing::debug!(sample_rate = clip.sample_rate, rate, "Clip playback started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.clip.take() {
            sink.stop();
        }
        if let Some(sink) = self.cue.take() {
            sink.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.clip.as_ref().is_some_and(|sink| !sink.empty())
    }

    fn play_cue(&mut self, cue: PcmBuffer) -> Result<(), VoiceError> {
        let sink = self.new_sink()?;
        sink.append(SamplesBuffer::new(cue.channels, cue.sample_rate, cue.samples));
        if let Some(old) = self.cue.replace(sink) {
            old.stop();
        }
        Ok(())
    }

    fn start_noise(&mut self, noise: PcmBuffer, gain: f32) -> Result<(), VoiceError> {
        self.stop_noise();
        let sink = self.new_sink()?;
        sink.set_volume(gain.clamp(0.0, 1.0));
        sink.append(
            SamplesBuffer::new(noise.channels, noise.sample_rate, noise.samples).repeat_infinite(),
        );
        self.noise = Some(sink);
        tracing::debug!(gain, "Background noise started");
        Ok(())
    }

    fn stop_noise(&mut self) {
        if let Some(sink) = self.noise.take() {
            sink.stop();
        }
    }
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// [`AudioSink`] backed by the default output device.
///
/// Request–reply calls block the caller until the audio thread answers; that
/// is local channel I/O plus the rodio call itself.
pub struct RodioSink {
    cmd_tx: mpsc::Sender<AudioCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioSink {
    /// Spawn the audio thread and open the default output device.
    ///
    /// Device errors are reported back through a one-shot init channel.
    pub fn spawn() -> Result<Self, VoiceError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), VoiceError>>();

        let thread = thread::Builder::new()
            .name("parrot-audio".into())
            .spawn(move || Self::run(cmd_rx, init_tx))
            .map_err(|e| {
                VoiceError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        init_rx.recv().map_err(|_| VoiceError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn send_and_recv<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<Result<T, VoiceError>>) -> AudioCommand,
    ) -> Result<T, VoiceError> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| VoiceError::AudioThreadDied)?;
        rx.recv().map_err(|_| VoiceError::AudioThreadDied)?
    }

    fn query<T>(&self, build: impl FnOnce(mpsc::Sender<T>) -> AudioCommand) -> Option<T> {
        let (tx, rx) = mpsc::channel();
        self.cmd_tx.send(build(tx)).ok()?;
        rx.recv().ok()
    }

    // ── Audio thread event loop ────────────────────────────────────

    fn run(cmd_rx: mpsc::Receiver<AudioCommand>, init_tx: mpsc::Sender<Result<(), VoiceError>>) {
        let mut output = match DeviceOutput::open() {
            Ok(output) => output,
            Err(e) => {
                let _ = init_tx.send(Err(e));
                return;
            }
        };

        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Play { clip, rate, reply } => {
                    let _ = reply.send(output.play(&clip, rate));
                }
                AudioCommand::Stop => output.stop(),
                AudioCommand::IsPlaying { reply } => {
                    let _ = reply.send(output.is_playing());
                }
                AudioCommand::PlayCue { cue, reply } => {
                    let _ = reply.send(output.play_cue(cue));
                }
                AudioCommand::StartNoise { noise, gain, reply } => {
                    let _ = reply.send(output.start_noise(noise, gain));
                }
                AudioCommand::StopNoise => output.stop_noise(),
                AudioCommand::Shutdown => break,
            }
        }

        // `output` is dropped here, on the audio thread.
        tracing::debug!("Audio thread shutting down");
    }
}

impl AudioSink for RodioSink {
    fn play(&self, clip: Arc<PcmBuffer>, rate: f32) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| AudioCommand::Play { clip, rate, reply })
    }

    fn is_playing(&self) -> bool {
        self.query(|reply| AudioCommand::IsPlaying { reply })
            .unwrap_or(false)
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(AudioCommand::Stop);
    }

    fn play_cue(&self, cue: PcmBuffer) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| AudioCommand::PlayCue { cue, reply })
    }

    fn start_noise(&self, noise: PcmBuffer, gain: f32) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| AudioCommand::StartNoise { noise, gain, reply })
    }

    fn stop_noise(&self) {
        let _ = self.cmd_tx.send(AudioCommand::StopNoise);
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
