use serde::Serialize;

use super::domain::VolumePreset;

/// Where a preview originates; gallery videos and library tracks share the
/// single audible slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewSource {
    GalleryVideo,
    MusicTrack,
}

/// Instructions for the external player; the controller never touches audio
/// hardware itself.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewCommand {
    Stop { id: String },
    Start { id: String, source: PreviewSource, gain: f32 },
    SetVolume { id: String, gain: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivePreview {
    pub id: String,
    pub source: PreviewSource,
}

/// Arbitrates the one externally-audible preview slot shared by the media
/// gallery and the music library.
#[derive(Debug)]
pub struct PreviewController {
    playing: Option<ActivePreview>,
    volume: VolumePreset,
}

impl PreviewController {
    pub fn new(volume: VolumePreset) -> Self {
        Self {
            playing: None,
            volume,
        }
    }

    pub fn playing(&self) -> Option<&ActivePreview> {
        self.playing.as_ref()
    }

    pub fn volume(&self) -> VolumePreset {
        self.volume
    }

    /// Toggle a preview: the same id stops it, a different one stops the
    /// current preview before the new one starts.
    pub fn toggle(&mut self, id: &str, source: PreviewSource) -> Vec<PreviewCommand> {
        let mut commands = Vec::new();

        if let Some(active) = self.playing.take() {
            commands.push(PreviewCommand::Stop {
                id: active.id.clone(),
            });
            if active.id == id {
                return commands;
            }
        }

        self.playing = Some(ActivePreview {
            id: id.to_string(),
            source,
        });
        commands.push(PreviewCommand::Start {
            id: id.to_string(),
            source,
            gain: self.volume.gain(),
        });
        commands
    }

    /// Stop and release any active preview; called on navigation-away and
    /// backgrounding.
    pub fn stop_all(&mut self) -> Vec<PreviewCommand> {
        match self.playing.take() {
            Some(active) => vec![PreviewCommand::Stop { id: active.id }],
            None => Vec::new(),
        }
    }

    /// Change the volume preset, reapplied live to the playing preview.
    pub fn set_volume(&mut self, volume: VolumePreset) -> Vec<PreviewCommand> {
        self.volume = volume;
        match &self.playing {
            Some(active) => vec![PreviewCommand::SetVolume {
                id: active.id.clone(),
                gain: volume.gain(),
            }],
            None => Vec::new(),
        }
    }
}
