//! Format-choice payloads carried by inline buttons.
//!
//! The payload is the whole pending selection, so nothing is stored server-side
//! between "Select format" and the button press. Payloads are `"{choice}|{url}"`;
//! when that exceeds the messenger's callback-data limit the URL is left out and
//! recovered from the message the keyboard replied to.

use crate::{
    media::MediaFormat,
    messaging::types::{InlineButton, InlineKeyboard},
};

const SEP: char = '|';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSelection {
    pub url: String,
    pub format: MediaFormat,
}

fn choice_tag(format: MediaFormat) -> &'static str {
    match format {
        MediaFormat::Audio => "audio",
        MediaFormat::Best => "video",
    }
}

pub fn encode(format: MediaFormat, url: &str, max_len: usize) -> String {
    let full = format!("{}{SEP}{url}", choice_tag(format));
    if full.len() <= max_len {
        full
    } else {
        format!("{}{SEP}", choice_tag(format))
    }
}

/// Decode a payload; `reply_to_text` is the fallback source for the URL.
pub fn decode(data: &str, reply_to_text: Option<&str>) -> Option<PendingSelection> {
    let (choice, url) = match data.split_once(SEP) {
        Some((choice, url)) => (choice, url.trim()),
        None => (data, ""),
    };

    let url = if url.is_empty() {
        reply_to_text.map(str::trim).filter(|s| !s.is_empty())?
    } else {
        url
    };

    Some(PendingSelection {
        url: url.to_string(),
        format: MediaFormat::from_choice(choice.trim()),
    })
}

/// The two mutually exclusive format buttons bound to `url`.
pub fn format_keyboard(url: &str, max_len: usize) -> InlineKeyboard {
    InlineKeyboard::single_row(vec![
        InlineButton {
            label: "🎥 Video".to_string(),
            callback_data: encode(MediaFormat::Best, url, max_len),
        },
        InlineButton {
            label: "🎵 Audio".to_string(),
            callback_data: encode(MediaFormat::Audio, url, max_len),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_urls_travel_in_the_payload() {
        let data = encode(MediaFormat::Audio, "https://example.com/video123", 64);
        assert_eq!(data, "audio|https://example.com/video123");
        assert_eq!(
            decode(&data, None),
            Some(PendingSelection {
                url: "https://example.com/video123".to_string(),
                format: MediaFormat::Audio,
            })
        );
    }

    #[test]
    fn long_urls_fall_back_to_reply_text() {
        let url = format!("https://example.com/{}", "x".repeat(80));
        let data = encode(MediaFormat::Best, &url, 64);
        assert_eq!(data, "video|");
        assert!(data.len() <= 64);

        let sel = decode(&data, Some(&url)).unwrap();
        assert_eq!(sel.url, url);
        assert_eq!(sel.format, MediaFormat::Best);
    }

    #[test]
    fn unrecoverable_payload_is_none() {
        assert_eq!(decode("video|", None), None);
        assert_eq!(decode("video|", Some("   ")), None);
        assert_eq!(decode("", None), None);
    }

    #[test]
    fn only_first_separator_splits() {
        let sel = decode("video|https://e.com/a|b", None).unwrap();
        assert_eq!(sel.url, "https://e.com/a|b");
    }

    #[test]
    fn unknown_choice_means_best() {
        let sel = decode("hd|https://e.com/a", None).unwrap();
        assert_eq!(sel.format, MediaFormat::Best);
    }

    #[test]
    fn keyboard_has_video_then_audio_in_one_row() {
        let kb = format_keyboard("https://e.com/v", 64);
        assert_eq!(kb.rows.len(), 1);
        let data: Vec<&str> = kb.buttons().map(|b| b.callback_data.as_str()).collect();
        assert_eq!(data, vec!["video|https://e.com/v", "audio|https://e.com/v"]);
    }
}
