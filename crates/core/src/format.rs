use crate::types::{SuggestedClip, TranscriptEntry};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// One line per entry: `<text> (start: <start>, duration: <duration>)`.
pub fn format_transcript_block(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|entry| {
            format!(
                "{} (start: {}, duration: {})",
                entry.text, entry.start, entry.duration
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable clip list, e.g. `1. (12.5, 22.5)  [00:12–00:22]`
pub fn format_clip_list(clips: &[SuggestedClip]) -> String {
    clips
        .iter()
        .enumerate()
        .map(|(i, clip)| {
            format!(
                "{}. {}  [{}–{}]",
                i + 1,
                clip,
                format_timestamp(clip.start),
                format_timestamp(clip.end)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str, start: f64, duration: f64) -> TranscriptEntry {
        TranscriptEntry {
            text: text.to_string(),
            start,
            duration,
        }
    }

    #[test]
    fn transcript_block_has_one_line_per_entry() {
        let transcript = vec![
            entry("hello", 0.0, 2.0),
            entry("world", 5.0, 2.0),
            entry("Hall of Science, everyone", 12.34, 3.5),
        ];
        let block = format_transcript_block(&transcript);
        let lines: Vec<&str> = block.lines().collect();

        assert_eq!(lines.len(), transcript.len());
        assert_eq!(lines[0], "hello (start: 0, duration: 2)");
        assert_eq!(lines[1], "world (start: 5, duration: 2)");
        assert_eq!(lines[2], "Hall of Science, everyone (start: 12.34, duration: 3.5)");
    }

    #[test]
    fn empty_transcript_formats_to_empty_block() {
        assert_eq!(format_transcript_block(&[]), "");
    }

    #[test]
    fn timestamps_are_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.9), "01:05");
        assert_eq!(format_timestamp(600.0), "10:00");
    }

    #[test]
    fn clip_list_is_numbered_from_one() {
        let list = format_clip_list(&[SuggestedClip::new(0.0, 10.0), SuggestedClip::new(75.0, 85.0)]);
        assert_eq!(list, "1. (0, 10)  [00:00–00:10]\n2. (75, 85)  [01:15–01:25]");
    }
}
