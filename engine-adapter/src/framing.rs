//! Pure buffer-to-frame splitting, kept free of any I/O so the framing rules
//! can be exercised directly in tests.
//!
//! A GTP frame is terminated by a blank line. In JSON transport mode a frame
//! is instead "the whole buffer parses as JSON" — checked on every arrival
//! since there's no terminator to scan for.

/// The classified shape of one completed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameClass {
    /// Leading `=`; payload is the trimmed remainder.
    Success(String),
    /// Leading `?`; payload is the trimmed remainder.
    Failure(String),
    /// Neither `=` nor `?`; the engine violated the protocol.
    Violation(String),
}

fn ends_with_blank_line(buffer: &str) -> bool {
    buffer.ends_with("\n\n") || buffer.ends_with("\r\n\r\n")
}

/// Drains every complete frame out of `buffer`, leaving any trailing partial
/// frame in place for the next read. Returns an empty `Vec` until the buffer
/// ends on a blank line.
pub fn extract_frames(buffer: &mut String) -> Vec<String> {
    if !ends_with_blank_line(buffer) {
        return Vec::new();
    }
    let normalized = buffer.replace("\r\n", "\n");
    let mut pieces: Vec<String> = normalized.split("\n\n").map(str::to_string).collect();
    // splitting on the separator that the buffer ends with always leaves one
    // trailing empty piece.
    pieces.pop();
    buffer.clear();
    pieces.into_iter().filter(|p| !p.is_empty()).collect()
}

/// Classifies a single completed frame's body by its leading byte.
pub fn classify_frame(frame: &str) -> FrameClass {
    let trimmed = frame.trim_start();
    if let Some(rest) = trimmed.strip_prefix('=') {
        FrameClass::Success(rest.trim().to_string())
    } else if let Some(rest) = trimmed.strip_prefix('?') {
        FrameClass::Failure(rest.trim().to_string())
    } else {
        FrameClass::Violation(trimmed.trim().to_string())
    }
}

/// Attempts to parse the accumulated buffer as one JSON frame. Returns the
/// decoded value and clears the buffer on success; leaves the buffer
/// untouched on failure so the caller keeps accumulating.
pub fn try_extract_json_frame(buffer: &mut String) -> Option<serde_json::Value> {
    match serde_json::from_str::<serde_json::Value>(buffer) {
        Ok(value) => {
            buffer.clear();
            Some(value)
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frame_until_blank_line_terminates_the_buffer() {
        let mut buffer = String::from("= hello\n");
        assert!(extract_frames(&mut buffer).is_empty());
        assert_eq!(buffer, "= hello\n");
    }

    #[test]
    fn single_frame_is_extracted_and_buffer_drained() {
        let mut buffer = String::from("= hello\n\n");
        let frames = extract_frames(&mut buffer);
        assert_eq!(frames, vec!["= hello".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn multiple_frames_arriving_in_one_read_are_all_extracted_in_order() {
        let mut buffer = String::from("= first\n\n? second reason\n\n");
        let frames = extract_frames(&mut buffer);
        assert_eq!(
            frames,
            vec!["= first".to_string(), "? second reason".to_string()]
        );
    }

    #[test]
    fn crlf_line_endings_are_normalized() {
        let mut buffer = String::from("= ok\r\n\r\n");
        let frames = extract_frames(&mut buffer);
        assert_eq!(frames, vec!["= ok".to_string()]);
    }

    #[test]
    fn classify_reads_the_leading_marker() {
        assert_eq!(
            classify_frame("= D4"),
            FrameClass::Success("D4".to_string())
        );
        assert_eq!(
            classify_frame("? unacceptable move"),
            FrameClass::Failure("unacceptable move".to_string())
        );
        assert_eq!(
            classify_frame("garbage"),
            FrameClass::Violation("garbage".to_string())
        );
    }

    #[test]
    fn json_frame_extraction_waits_for_a_complete_value() {
        let mut buffer = String::from("{\"result\":");
        assert!(try_extract_json_frame(&mut buffer).is_none());
        buffer.push_str("\"= D4\"}");
        let value = try_extract_json_frame(&mut buffer).expect("complete json value");
        assert_eq!(value["result"], "= D4");
        assert!(buffer.is_empty());
    }
}
