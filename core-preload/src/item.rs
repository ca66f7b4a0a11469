//! # Preload Item State
//!
//! Per-item bookkeeping for the three sub-resources of a content item: the
//! video head, the quote audio and the full audio. Each progresses on its own
//! and readiness never goes backwards while the item stays registered.

use crate::prefetch::HeadPrefetch;
use serde::{Deserialize, Serialize};

/// A catalog entry supplied by the UI.
///
/// Empty audio URLs mean the item has no such sub-resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: u64,
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub audio_url: String,
    #[serde(default)]
    pub quote_audio_url: String,
}

impl ContentItem {
    pub fn new(id: u64, title: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            video_url: video_url.into(),
            audio_url: String::new(),
            quote_audio_url: String::new(),
        }
    }

    pub fn with_audio(mut self, url: impl Into<String>) -> Self {
        self.audio_url = url.into();
        self
    }

    pub fn with_quote_audio(mut self, url: impl Into<String>) -> Self {
        self.quote_audio_url = url.into();
        self
    }
}

/// State of one sub-resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ResourceState {
    Pending,
    Fetching,
    Ready,
    /// The item has no such sub-resource.
    NotRequired,
    Failed { reason: String },
}

impl ResourceState {
    /// `Ready` and `NotRequired` both count as ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceState::Ready | ResourceState::NotRequired)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResourceState::Failed { .. })
    }
}

/// Outcome of the video head prefetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PrefetchOutcome {
    NotAttempted,
    Completed(HeadPrefetch),
    Failed { reason: String },
}

/// Audio sub-resources, which share one fetch-and-publish path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AudioSlot {
    Quote,
    Full,
}

impl AudioSlot {
    pub(crate) fn label(self) -> &'static str {
        match self {
            AudioSlot::Quote => "quote_audio",
            AudioSlot::Full => "audio",
        }
    }
}

/// Registered item and its readiness.
#[derive(Debug, Clone)]
pub struct PreloadItem {
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) video_url: String,
    pub(crate) audio_url: String,
    pub(crate) quote_audio_url: String,
    pub(crate) audio_object_url: Option<String>,
    pub(crate) quote_audio_object_url: Option<String>,
    pub(crate) video: ResourceState,
    pub(crate) audio: ResourceState,
    pub(crate) quote_audio: ResourceState,
    pub(crate) video_prefetch: PrefetchOutcome,
    /// Distinguishes a re-registered id from the item a running preload started on.
    pub(crate) generation: u64,
    pub(crate) in_flight: bool,
}

impl PreloadItem {
    pub(crate) fn new(content: ContentItem, generation: u64) -> Self {
        Self {
            id: content.id,
            title: content.title,
            video_url: content.video_url,
            audio_url: content.audio_url,
            quote_audio_url: content.quote_audio_url,
            audio_object_url: None,
            quote_audio_object_url: None,
            video: ResourceState::Pending,
            audio: ResourceState::Pending,
            quote_audio: ResourceState::Pending,
            video_prefetch: PrefetchOutcome::NotAttempted,
            generation,
            in_flight: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }

    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    pub fn quote_audio_url(&self) -> &str {
        &self.quote_audio_url
    }

    pub fn audio_object_url(&self) -> Option<&str> {
        self.audio_object_url.as_deref()
    }

    pub fn quote_audio_object_url(&self) -> Option<&str> {
        self.quote_audio_object_url.as_deref()
    }

    pub fn video_state(&self) -> &ResourceState {
        &self.video
    }

    pub fn audio_state(&self) -> &ResourceState {
        &self.audio
    }

    pub fn quote_audio_state(&self) -> &ResourceState {
        &self.quote_audio
    }

    pub fn video_prefetch(&self) -> &PrefetchOutcome {
        &self.video_prefetch
    }

    /// Observed head-prefetch byte count, once a read has completed.
    pub fn video_prefetched_bytes(&self) -> Option<u64> {
        match &self.video_prefetch {
            PrefetchOutcome::Completed(head) => Some(head.bytes),
            _ => None,
        }
    }

    /// All three sub-resources are ready.
    pub fn is_loaded(&self) -> bool {
        self.video.is_ready() && self.audio.is_ready() && self.quote_audio.is_ready()
    }

    pub(crate) fn audio_url_for(&self, slot: AudioSlot) -> &str {
        match slot {
            AudioSlot::Quote => &self.quote_audio_url,
            AudioSlot::Full => &self.audio_url,
        }
    }

    pub(crate) fn audio_state_mut(&mut self, slot: AudioSlot) -> &mut ResourceState {
        match slot {
            AudioSlot::Quote => &mut self.quote_audio,
            AudioSlot::Full => &mut self.audio,
        }
    }

    pub(crate) fn object_url_mut(&mut self, slot: AudioSlot) -> &mut Option<String> {
        match slot {
            AudioSlot::Quote => &mut self.quote_audio_object_url,
            AudioSlot::Full => &mut self.audio_object_url,
        }
    }

    /// Return sub-resources left mid-fetch by an interrupted run to pending.
    pub(crate) fn reset_interrupted(&mut self) {
        for state in [&mut self.video, &mut self.quote_audio, &mut self.audio] {
            if *state == ResourceState::Fetching {
                *state = ResourceState::Pending;
            }
        }
    }

    /// Take every object URL this item owns.
    pub(crate) fn take_object_urls(&mut self) -> Vec<String> {
        self.quote_audio_object_url
            .take()
            .into_iter()
            .chain(self.audio_object_url.take())
            .collect()
    }
}

/// Playable handles for a loaded item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadedMedia {
    /// Always `None`: only the head of a video is warmed, so the player streams
    /// it from its original URL.
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub quote_audio_url: Option<String>,
    pub ready: bool,
}

impl PreloadedMedia {
    pub(crate) fn from_item(item: &PreloadItem) -> Option<Self> {
        if !item.is_loaded() {
            return None;
        }
        Some(Self {
            video_url: None,
            audio_url: item.audio_object_url.clone(),
            quote_audio_url: item.quote_audio_object_url.clone(),
            ready: item.is_loaded(),
        })
    }
}

/// Aggregate progress across registered items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreloadProgress {
    pub loaded: usize,
    pub total: usize,
    /// Rounded to the nearest integer; 0 when nothing is registered.
    pub percentage: u32,
}

impl PreloadProgress {
    pub fn from_counts(loaded: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            ((loaded as f64 / total as f64) * 100.0).round() as u32
        };
        Self {
            loaded,
            total,
            percentage,
        }
    }
}

/// Diagnostic snapshot of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub id: u64,
    pub title: String,
    pub video: ResourceState,
    pub quote_audio: ResourceState,
    pub audio: ResourceState,
    pub video_prefetch: PrefetchOutcome,
    pub loaded: bool,
    pub in_flight: bool,
}

impl From<&PreloadItem> for ItemReport {
    fn from(item: &PreloadItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            video: item.video.clone(),
            quote_audio: item.quote_audio.clone(),
            audio: item.audio.clone(),
            video_prefetch: item.video_prefetch.clone(),
            loaded: item.is_loaded(),
            in_flight: item.in_flight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> PreloadItem {
        PreloadItem::new(
            ContentItem::new(7, "Walden", "https://cdn.example.com/videos/7.mp4")
                .with_audio("https://cdn.example.com/audio/7.mp3")
                .with_quote_audio("https://cdn.example.com/audio/7-quote.mp3"),
            1,
        )
    }

    #[test]
    fn test_content_item_deserializes_camel_case() {
        let json = r#"{"id": 1, "title": "Walden", "videoUrl": "/videos/1.mp4", "quoteAudioUrl": "/audio/q1.mp3"}"#;
        let content: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(content.video_url, "/videos/1.mp4");
        assert_eq!(content.quote_audio_url, "/audio/q1.mp3");
        assert!(content.audio_url.is_empty());
    }

    #[test]
    fn test_loaded_requires_all_three() {
        let mut item = item();
        assert!(!item.is_loaded());

        item.video = ResourceState::Ready;
        item.quote_audio = ResourceState::NotRequired;
        assert!(!item.is_loaded());

        item.audio = ResourceState::Failed {
            reason: "404".into(),
        };
        assert!(!item.is_loaded());

        item.audio = ResourceState::Ready;
        assert!(item.is_loaded());
    }

    #[test]
    fn test_preloaded_media_only_for_loaded_items() {
        let mut item = item();
        assert!(PreloadedMedia::from_item(&item).is_none());

        item.video = ResourceState::Ready;
        item.audio = ResourceState::Ready;
        item.quote_audio = ResourceState::Ready;
        item.audio_object_url = Some("blob:a".into());
        item.quote_audio_object_url = Some("blob:q".into());

        let media = PreloadedMedia::from_item(&item).unwrap();
        assert_eq!(media.video_url, None);
        assert_eq!(media.audio_url.as_deref(), Some("blob:a"));
        assert_eq!(media.quote_audio_url.as_deref(), Some("blob:q"));
        assert!(media.ready);
    }

    #[test]
    fn test_take_object_urls_empties_slots() {
        let mut item = item();
        *item.object_url_mut(AudioSlot::Quote) = Some("blob:q".into());
        *item.object_url_mut(AudioSlot::Full) = Some("blob:a".into());

        assert_eq!(item.take_object_urls(), vec!["blob:q", "blob:a"]);
        assert!(item.take_object_urls().is_empty());
    }

    #[test]
    fn test_prefetched_bytes_follow_outcome() {
        let mut item = item();
        assert_eq!(item.video_prefetched_bytes(), None);

        item.video_prefetch = PrefetchOutcome::Completed(HeadPrefetch {
            bytes: 2_097_152,
            cancelled: true,
        });
        assert_eq!(item.video_prefetched_bytes(), Some(2_097_152));
    }

    #[test]
    fn test_progress_rounding() {
        assert_eq!(PreloadProgress::from_counts(0, 0).percentage, 0);
        assert_eq!(PreloadProgress::from_counts(1, 3).percentage, 33);
        assert_eq!(PreloadProgress::from_counts(2, 3).percentage, 67);
        assert_eq!(PreloadProgress::from_counts(3, 3).percentage, 100);
    }
}
