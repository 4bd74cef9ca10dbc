#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(u64);

impl SoundHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayOptions {
    pub volume: f32,
    pub looped: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            looped: false,
        }
    }
}

impl PlayOptions {
    pub fn volume(volume: f32) -> Self {
        Self {
            volume,
            ..Self::default()
        }
    }

    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Play {
        handle: SoundHandle,
        cue: &'static str,
        options: PlayOptions,
    },
    Stop {
        handle: SoundHandle,
    },
}

/// Fire-and-forget audio commands, drained once per frame by the loop.
///
/// Only looped sounds are tracked as playing; one-shot cues are forgotten
/// as soon as they are queued.
#[derive(Debug, Default)]
pub struct AudioBus {
    next_handle: u64,
    pending: Vec<AudioCommand>,
    looping: Vec<(SoundHandle, &'static str)>,
}

impl AudioBus {
    pub fn play(&mut self, cue: &'static str, options: PlayOptions) -> SoundHandle {
        let handle = SoundHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        if options.looped {
            self.looping.push((handle, cue));
        }
        self.pending.push(AudioCommand::Play {
            handle,
            cue,
            options: PlayOptions {
                volume: options.volume.clamp(0.0, 1.0),
                ..options
            },
        });
        handle
    }

    pub fn stop(&mut self, handle: SoundHandle) -> bool {
        let before = self.looping.len();
        self.looping.retain(|(playing, _)| *playing != handle);
        if self.looping.len() == before {
            return false;
        }
        self.pending.push(AudioCommand::Stop { handle });
        true
    }

    pub fn is_playing(&self, handle: SoundHandle) -> bool {
        self.looping.iter().any(|(playing, _)| *playing == handle)
    }

    pub fn pending(&self) -> &[AudioCommand] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<AudioCommand> {
        std::mem::take(&mut self.pending)
    }

    /// Stops everything that is still looping; used when a world is torn down.
    pub fn stop_all(&mut self) {
        for (handle, _) in self.looping.drain(..) {
            self.pending.push(AudioCommand::Stop { handle });
        }
    }
}
