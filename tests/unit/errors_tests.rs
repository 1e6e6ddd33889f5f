/*!
 * Tests for error types
 */

use subkit::errors::{AppError, SubtitleError};

/// Test that subtitle errors render their position
#[test]
fn test_subtitleError_display_shouldNameEventAndLine() {
    let error = SubtitleError::TimecodeParse {
        event_index: 4,
        value: "00:xx".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains('4'));
    assert!(message.contains("00:xx"));

    let error = SubtitleError::HeaderParse {
        line: 2,
        message: "missing FORMAT line".to_string(),
    };
    assert!(error.to_string().contains("missing FORMAT line"));
}

/// Test that positional errors expose their event index
#[test]
fn test_subtitleError_eventIndex_shouldOnlyExistForEventErrors() {
    assert_eq!(SubtitleError::InvalidTimeRange { event_index: 7 }.event_index(), Some(7));
    assert_eq!(
        SubtitleError::EventSchema {
            event_index: 1,
            expected: 10,
            found: 3
        }
        .event_index(),
        Some(1)
    );
    assert_eq!(SubtitleError::UnknownFormat.event_index(), None);
    assert_eq!(SubtitleError::UnknownScript("x".to_string()).event_index(), None);
}

/// Test conversion from lower-level errors into AppError
#[test]
fn test_appError_from_shouldWrapSources() {
    let app_error: AppError = SubtitleError::UnknownFormat.into();
    assert!(matches!(app_error, AppError::Subtitle(SubtitleError::UnknownFormat)));

    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let app_error: AppError = io_error.into();
    assert!(matches!(app_error, AppError::File(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let app_error: AppError = json_error.into();
    assert!(matches!(app_error, AppError::Config(_)));
    assert!(app_error.to_string().starts_with("Configuration error"));
}
