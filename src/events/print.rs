//! Text printing and voice playback notifications.
//!
//! The stage does not print text or play audio itself. Whatever does
//! triggers these events, and every ready actor whose id matches `author`
//! animates its mouth accordingly:
//! - [`PrintStartedEvent`] starts talking
//! - [`PrintFinishedEvent`] stops talking unless the line is voiced
//! - [`VoiceStoppedEvent`] stops talking

use bevy_ecs::prelude::*;

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct PrintStartedEvent {
    /// Actor id of the speaker.
    pub author: String,
    /// The line has voice audio.
    pub voiced: bool,
}

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct PrintFinishedEvent {
    pub author: String,
}

#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct VoiceStoppedEvent {
    pub author: String,
}
