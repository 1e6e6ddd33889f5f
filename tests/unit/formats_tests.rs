/*!
 * Tests for format identification, parsing and writing
 */

use std::time::Duration;

use subkit::formats::{descriptors, mpsub};
use subkit::{
    identify_format, parse, parse_auto, write, FormatKind, MalformedPolicy, Mode, ParseOptions, Position,
    SubtitleDocument, SubtitleError, TextField, WriteOptions,
};
use crate::common;

fn options() -> ParseOptions {
    ParseOptions::default()
}

/// Parse what was written and compare the parts a format carries
fn assert_round_trip(document: &SubtitleDocument, format: FormatKind) {
    let written = write(document, format, &WriteOptions::default()).unwrap();
    let reparsed = parse(&written, format, &options()).unwrap().document;
    assert_eq!(reparsed.mode, document.mode, "{}", format);
    assert_eq!(reparsed.events, document.events, "{}", format);
    assert_eq!(write(&reparsed, format, &WriteOptions::default()).unwrap(), written, "{}", format);
}

/// Every sample is identified as its own format
#[test]
fn test_identifyFormat_withSamples_shouldPickMatchingFormat() {
    let cases = [
        (common::SRT_SAMPLE, FormatKind::SubRip),
        (common::ASS_SAMPLE, FormatKind::AdvSubStationAlpha),
        (common::SSA_SAMPLE, FormatKind::SubStationAlpha),
        (common::MPSUB_FRAME_SAMPLE, FormatKind::MPsub),
        (common::MICRODVD_SAMPLE, FormatKind::MicroDvd),
        (common::VTT_SAMPLE, FormatKind::WebVtt),
    ];
    for (content, expected) in cases {
        assert_eq!(identify_format(content).unwrap().kind, expected);
    }
}

/// Identification ignores descriptor iteration beyond the priority order
#[test]
fn test_identifyFormat_repeated_shouldBeStable() {
    let first = identify_format(common::ASS_SAMPLE).unwrap().kind;
    for _ in 0..10 {
        assert_eq!(identify_format(common::ASS_SAMPLE).unwrap().kind, first);
    }
    let ass = descriptors().iter().position(|d| d.kind == FormatKind::AdvSubStationAlpha);
    let ssa = descriptors().iter().position(|d| d.kind == FormatKind::SubStationAlpha);
    assert!(ass < ssa);
}

/// Descriptors carry the fixed event schemas
#[test]
fn test_descriptor_eventFields_shouldDifferByLayer() {
    let ass = FormatKind::AdvSubStationAlpha.descriptor().event_fields;
    let ssa = FormatKind::SubStationAlpha.descriptor().event_fields;
    assert_eq!(
        ass,
        &["Layer", "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text"]
    );
    assert_eq!(&ass[1..], ssa);
    assert!(FormatKind::MPsub.descriptor().supports_mode(Mode::Frame));
    assert!(!FormatKind::WebVtt.descriptor().supports_mode(Mode::Frame));
}

/// MPsub header literal contract
#[test]
fn test_mpsubParseHeader_withSpecifiedInputs_shouldSelectMode() {
    assert_eq!(mpsub::parse_header("FORMAT=TIME\n").unwrap().0, Mode::Time);
    let (mode, rate) = mpsub::parse_header("FORMAT=23.98\n").unwrap();
    assert_eq!(mode, Mode::Frame);
    assert_eq!(rate.unwrap().to_string(), "23.98");
    assert!(matches!(mpsub::parse_header(""), Err(SubtitleError::HeaderParse { .. })));
}

/// Time documents survive every time-capable format
#[test]
fn test_roundTrip_withTimeDocument_shouldPreserveEvents() {
    let document = common::sample_time_document();
    for format in [FormatKind::SubRip, FormatKind::MPsub, FormatKind::WebVtt] {
        assert_round_trip(&document, format);
    }
}

/// SubStation-Alpha formats store their auxiliary fields on every event
#[test]
fn test_roundTrip_withSubStationDocuments_shouldPreserveEvents() {
    let mut ssa = common::sample_time_document();
    for event in &mut ssa.events {
        for (key, value) in [("Style", "Default"), ("Name", ""), ("Effect", "")] {
            event.extra.insert(key.to_string(), value.to_string());
        }
        for key in ["MarginL", "MarginR", "MarginV"] {
            event.extra.insert(key.to_string(), "0000".to_string());
        }
    }
    assert_round_trip(&ssa, FormatKind::SubStationAlpha);

    let mut ass = ssa.clone();
    for event in &mut ass.events {
        event.extra.insert("Layer".to_string(), "0".to_string());
    }
    assert_round_trip(&ass, FormatKind::AdvSubStationAlpha);
}

/// Frame documents survive both frame-capable formats
#[test]
fn test_roundTrip_withFrameDocument_shouldPreserveEventsAndRate() {
    let document = common::sample_frame_document();
    for format in [FormatKind::MPsub, FormatKind::MicroDvd] {
        assert_round_trip(&document, format);
        let written = write(&document, format, &WriteOptions::default()).unwrap();
        let reparsed = parse(&written, format, &options()).unwrap().document;
        assert_eq!(reparsed.frame_rate, document.frame_rate);
    }
}

/// Samples written back in their own format are unchanged
#[test]
fn test_write_withParsedSamples_shouldReproduceInput() {
    for (content, format) in [
        (common::ASS_SAMPLE, FormatKind::AdvSubStationAlpha),
        (common::SSA_SAMPLE, FormatKind::SubStationAlpha),
        (common::MPSUB_FRAME_SAMPLE, FormatKind::MPsub),
        (common::MICRODVD_SAMPLE, FormatKind::MicroDvd),
    ] {
        let document = parse(content, format, &options()).unwrap().document;
        assert_eq!(write(&document, format, &WriteOptions::default()).unwrap(), content);
    }
}

/// Unknown event fields are kept by name
#[test]
fn test_parse_ssaWithExtraField_shouldKeepItOpaquely() {
    let document = parse_auto(common::SSA_SAMPLE, &options()).unwrap().document;
    assert_eq!(document.events[0].extra("Marked"), Some("Marked=0"));
    assert_eq!(document.header.event_fields.as_ref().map(|f| f.len()), Some(10));
}

/// Frame documents must be converted before they can be written as SubRip
#[test]
fn test_write_frameDocumentToTimeOnlyFormat_shouldBeUnsupported() {
    let document = common::sample_frame_document();
    for format in [FormatKind::SubRip, FormatKind::SubStationAlpha, FormatKind::WebVtt] {
        assert!(matches!(
            write(&document, format, &WriteOptions::default()),
            Err(SubtitleError::Unsupported(_))
        ));
    }
    assert!(matches!(
        write(&common::sample_time_document(), FormatKind::MicroDvd, &WriteOptions::default()),
        Err(SubtitleError::Unsupported(_))
    ));
}

/// Events ending before they start are reported, never stored
#[test]
fn test_write_withBackwardsEvent_shouldFail() {
    let mut document = common::sample_time_document();
    document.events[1] = common::time_event(5000, 4000, "Backwards");
    let error = write(&document, FormatKind::SubRip, &WriteOptions::default()).unwrap_err();
    assert_eq!(error, SubtitleError::InvalidTimeRange { event_index: 1 });
}

/// Skipped events are reported as warnings with their line
#[test]
fn test_parse_withSkipPolicy_shouldReportEachDroppedEvent() {
    let content = "{10}{20}Ok\n{x}{20}Bad\n{30}{25}Backwards\n{40}{50}Also ok\n";
    let options = ParseOptions {
        malformed: MalformedPolicy::Skip,
        ..ParseOptions::default()
    };
    let parsed = parse(content, FormatKind::MicroDvd, &options).unwrap();
    assert_eq!(parsed.document.len(), 2);
    let lines: Vec<usize> = parsed.warnings.iter().map(|w| w.line).collect();
    assert_eq!(lines, vec![2, 3]);
    assert_eq!(parsed.warnings[1].error, SubtitleError::InvalidTimeRange { event_index: 2 });
}

/// The declared encoding is recorded in the header
#[test]
fn test_parse_withEncoding_shouldRecordItInHeader() {
    let options = ParseOptions {
        encoding: Some("latin-1".to_string()),
        ..ParseOptions::default()
    };
    let document = parse(common::SRT_SAMPLE, FormatKind::SubRip, &options).unwrap().document;
    assert_eq!(document.header.encoding.as_deref(), Some("latin-1"));
    assert_eq!(document.header.source_format, Some(FormatKind::SubRip));
}

/// Translations can be written in place of the main text
#[test]
fn test_write_withTranslationText_shouldUseSecondaryText() {
    let mut document = parse(common::SRT_SAMPLE, FormatKind::SubRip, &options()).unwrap().document;
    let mut translation = document.clone();
    translation.events[0].text = "Ceci est un sous-titre de test.".to_string();
    assert_eq!(document.merge_translation(&translation), 3);

    let written = write(
        &document,
        FormatKind::WebVtt,
        &WriteOptions {
            text: TextField::Translation,
            ..WriteOptions::default()
        },
    )
    .unwrap();
    assert!(written.contains("00:00:01.000 --> 00:00:04.000\nCeci est un sous-titre de test.\n"));
}

/// Converting between families keeps the common fields
#[test]
fn test_write_assAsSubRip_shouldDropAuxiliaryFields() {
    common::init_logger();
    let document = parse_auto(common::ASS_SAMPLE, &options()).unwrap().document;
    let written = write(&document, FormatKind::SubRip, &WriteOptions::default()).unwrap();
    let reparsed = parse_auto(&written, &options()).unwrap().document;
    assert_eq!(reparsed.events[1].text, "It contains\nmultiple entries.");
    assert_eq!(reparsed.events[1].start, Position::Time(Duration::from_secs(5)));
    assert!(reparsed.events[1].extra.is_empty());
}
