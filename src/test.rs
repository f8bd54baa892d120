use crate::{
    chunk::{Chunk, HeaderChunk, UnknownChunk},
    convert,
    event::{ChannelMessage, Event, EventKind, PitchBend},
    meta::{KeySignature, MetaEvent, SetTempo, TextKind, TimeSignature},
    num::{u14, u3, u4, u7},
    primitive::{vlq_len, Format, Fps, MidiReader, SmpteTime, Timing, VLQ_MAX_VALUE},
    registry::{self, BytesFormat, Codec},
    settings::*,
    smf::{parse_lazy, Smf},
    system::{MtcComponent, SysExEvent, SysExKind, SystemCommon, SystemRealTime},
    track::TrackChunk,
    ErrorKind, Result,
};
use pretty_assertions::assert_eq;

fn channel(message: ChannelMessage) -> EventKind {
    EventKind::channel(u4::new(0), message)
}

fn note_on(key: u8, vel: u8) -> ChannelMessage {
    ChannelMessage::NoteOn {
        key: u7::new(key),
        vel: u7::new(vel),
    }
}

fn note_off(key: u8, vel: u8) -> ChannelMessage {
    ChannelMessage::NoteOff {
        key: u7::new(key),
        vel: u7::new(vel),
    }
}

fn tempo(us: u32) -> EventKind {
    EventKind::Meta(MetaEvent::SetTempo(SetTempo::new(us).unwrap()))
}

/// Write the content of a track chunk, checking that the size pass agrees with the write pass.
fn write_track(events: Vec<Event>, settings: &WritingSettings) -> Vec<u8> {
    let track = TrackChunk::new(events);
    let mut out = Vec::new();
    track.write_content(&mut out, settings).unwrap();
    assert_eq!(out.len(), track.content_size(settings));
    out
}

fn read_track(content: &[u8], settings: &ReadingSettings) -> Result<TrackChunk> {
    TrackChunk::read(&mut MidiReader::new(content), content.len() as u32, settings)
}

/// Build a raw chunk with an arbitrary declared size.
fn chunk(id: &[u8; 4], declared: u32, content: &[u8]) -> Vec<u8> {
    let mut raw = id.to_vec();
    raw.extend_from_slice(&declared.to_be_bytes());
    raw.extend_from_slice(content);
    raw
}

fn header(format: u16, track_count: u16) -> Vec<u8> {
    let mut content = format.to_be_bytes().to_vec();
    content.extend_from_slice(&track_count.to_be_bytes());
    content.extend_from_slice(&96u16.to_be_bytes());
    chunk(b"MThd", 6, &content)
}

const SIMPLE_TRACK: &[u8] = &[
    0x00, 0x90, 0x3C, 0x40, 0x60, 0x80, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00,
];

fn simple_file(track_count: u16, tracks: usize) -> Vec<u8> {
    let mut raw = header(1, track_count);
    for _ in 0..tracks {
        raw.extend(chunk(b"MTrk", SIMPLE_TRACK.len() as u32, SIMPLE_TRACK));
    }
    raw
}

mod primitive {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::io::Write;

    fn encode(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_vlq(value).unwrap();
        out
    }

    #[test]
    fn vlq_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(0x40), vec![0x40]);
        assert_eq!(encode(0x7F), vec![0x7F]);
        assert_eq!(encode(0x80), vec![0x81, 0x00]);
        assert_eq!(encode(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encode(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encode(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn vlq_minimal_length() {
        for (value, len) in [
            (0, 1),
            (0x7F, 1),
            (0x80, 2),
            (0x3FFF, 2),
            (0x4000, 3),
            (0x1F_FFFF, 3),
            (0x20_0000, 4),
            (0x0FFF_FFFF, 4),
        ] {
            assert_eq!(vlq_len(value), len, "length of {:#X}", value);
            assert_eq!(encode(value).len(), len, "encoded length of {:#X}", value);
        }
    }

    #[test]
    fn vlq_decodes_what_it_encodes() {
        for value in (0..=VLQ_MAX_VALUE).step_by(4099).chain([VLQ_MAX_VALUE]) {
            let raw = encode(value as u64);
            let mut reader = MidiReader::new(&raw);
            assert_eq!(reader.read_vlq_number().unwrap(), value);
            assert!(reader.end_reached());
        }
    }

    #[test]
    fn vlq_too_long() {
        let raw = [0x81, 0x80, 0x80, 0x80, 0x00];
        let mut reader = MidiReader::new(&raw);
        let err = reader.read_vlq_number().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVlq);
        assert_eq!(err.position(), Some(0));
        // The whole quantity is consumed anyway
        assert_eq!(reader.position(), 5);

        let mut reader = MidiReader::new(&raw);
        assert_eq!(reader.read_vlq_long_number().unwrap(), 1 << 28);
    }

    #[test]
    fn fixed_width_reads() {
        let raw = [0x12, 0x34, 0x56, 0x78, 0xFF];
        let mut reader = MidiReader::new(&raw);
        assert_eq!(reader.read_word().unwrap(), 0x1234);
        assert_eq!(reader.read_3byte_dword().unwrap().as_int(), 0x56_78FF);
        assert_eq!(
            reader.read_byte().unwrap_err().kind(),
            ErrorKind::NotEnoughBytes {
                expected: 1,
                available: 0,
            }
        );

        let mut reader = MidiReader::new(&[0x01]);
        assert_eq!(
            reader.read_word().unwrap_err().kind(),
            ErrorKind::NotEnoughBytes {
                expected: 2,
                available: 1,
            }
        );
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_bytes(10), &[0x01]);
        assert!(reader.end_reached());
    }

    #[test]
    fn signed_reads() {
        let mut reader = MidiReader::new(&[0xFF, 0xFE, 0x7F, 0xFF, 0xFE]);
        assert_eq!(reader.read_int16().unwrap(), -2);
        assert_eq!(reader.read_int16().unwrap(), i16::MAX);
        assert_eq!(reader.read_sbyte().unwrap(), -2);
        assert!(reader.read_int16().is_err());
    }

    #[test]
    fn write_helpers() {
        let mut out = Vec::new();
        out.write_sbyte(-7).unwrap();
        out.write_3byte_dword(crate::num::u24::new(0x0A_BCDE)).unwrap();
        out.write_word(0x1234).unwrap();
        out.write_dword(0xDEAD_BEEF).unwrap();
        assert_eq!(
            out,
            vec![0xF9, 0x0A, 0xBC, 0xDE, 0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF]
        );
    }

    #[test]
    fn strings() {
        let raw = b"caf\xE9!";
        let mut reader = MidiReader::new(raw);
        assert_eq!(reader.read_string(4, TextEncoding::Latin1), "café");
        assert_eq!(&*TextEncoding::Latin1.encode("café"), &raw[..4]);
        assert_eq!(TextEncoding::Latin1.encoded_len("café"), 4);
        assert_eq!(TextEncoding::Utf8.encoded_len("café"), 5);
    }

    #[test]
    fn timing() {
        assert_eq!(Timing::from_raw(96).unwrap(), Timing::default());
        let timecode = Timing::from_raw(0xE728).unwrap();
        assert_eq!(timecode, Timing::Timecode(Fps::Fps25, 40));
        assert_eq!(timecode.as_raw(), 0xE728);
        assert_eq!(
            Timing::from_raw(0xE628).unwrap_err().kind(),
            ErrorKind::InvalidTimeDivision(0xE628)
        );
    }

    #[test]
    fn smpte_time_is_validated() {
        assert!(SmpteTime::new(23, 59, 59, 29, 99, Fps::Fps30).is_some());
        assert!(SmpteTime::new(24, 0, 0, 0, 0, Fps::Fps30).is_none());
        assert!(SmpteTime::new(0, 0, 0, 24, 0, Fps::Fps24).is_none());
    }

    #[test]
    fn restricted_ints() {
        assert_eq!(u7::new(0xFF).as_int(), 0x7F);
        assert_eq!(u7::from_int_saturating(0x90).as_int(), 0x7F);
        assert_eq!(u7::try_from(0x80), None);
        assert_eq!(u14::max_value().as_int(), 0x3FFF);
    }
}

mod registry_table {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_every_status_class() {
        for status in 0x00..0x80 {
            assert_eq!(registry::resolve(status, BytesFormat::File), None);
        }
        for status in 0x80..0xF0 {
            assert_eq!(registry::resolve(status, BytesFormat::File), Some(Codec::Channel));
        }
        assert_eq!(
            registry::resolve(0xF0, BytesFormat::File),
            Some(Codec::SysEx(SysExKind::Normal))
        );
        assert_eq!(
            registry::resolve(0xF7, BytesFormat::Device),
            Some(Codec::SysEx(SysExKind::Escape))
        );
        for status in [0xF1, 0xF2, 0xF3, 0xF6] {
            assert_eq!(registry::resolve(status, BytesFormat::File), Some(Codec::Common));
        }
        for status in [0xF4, 0xF5, 0xF9, 0xFD] {
            assert_eq!(registry::resolve(status, BytesFormat::File), None);
            assert_eq!(registry::resolve(status, BytesFormat::Device), None);
        }
        assert_eq!(registry::resolve(0xFF, BytesFormat::File), Some(Codec::Meta));
        assert_eq!(
            registry::resolve(0xFF, BytesFormat::Device),
            Some(Codec::RealTime(SystemRealTime::Reset))
        );
    }

    #[test]
    fn undefined_status_is_fatal() {
        let err = convert::decode(&[0xF4], &ReadingSettings::lenient(), BytesFormat::File)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownStatus(0xF4));
        assert_eq!(err.position(), Some(0));
    }
}

mod event {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(raw: &[u8]) -> Result<EventKind> {
        convert::decode(raw, &ReadingSettings::default(), BytesFormat::File)
    }

    fn round_trip(kind: EventKind) {
        let raw = convert::encode(&kind, &WritingSettings::default(), BytesFormat::File).unwrap();
        assert_eq!(
            raw.len(),
            1 + kind.content_size(TextEncoding::Latin1, BytesFormat::File)
        );
        assert_eq!(decode(&raw).unwrap(), kind, "bytes {:02X?}", raw);
    }

    #[test]
    fn every_variant_round_trips() {
        let smpte = SmpteTime::new(1, 2, 3, 4, 5, Fps::Fps29).unwrap();
        let kinds = vec![
            channel(note_off(60, 64)),
            channel(note_on(60, 100)),
            EventKind::channel(
                u4::new(9),
                ChannelMessage::Aftertouch {
                    key: u7::new(1),
                    vel: u7::new(2),
                },
            ),
            channel(ChannelMessage::Controller {
                controller: u7::new(7),
                value: u7::new(127),
            }),
            channel(ChannelMessage::ProgramChange { program: u7::new(5) }),
            channel(ChannelMessage::ChannelAftertouch { vel: u7::new(3) }),
            channel(ChannelMessage::PitchBend {
                bend: PitchBend::from_int(-0x2000),
            }),
            channel(ChannelMessage::PitchBend {
                bend: PitchBend::max_raw_value(),
            }),
            MetaEvent::SequenceNumber(Some(7)).into(),
            MetaEvent::SequenceNumber(None).into(),
            MetaEvent::text(TextKind::Text, "hello").into(),
            MetaEvent::text(TextKind::CopyrightNotice, "(c)").into(),
            MetaEvent::text(TextKind::SequenceTrackName, "piano").into(),
            MetaEvent::text(TextKind::InstrumentName, "").into(),
            MetaEvent::text(TextKind::Lyric, "là").into(),
            MetaEvent::text(TextKind::Marker, "A").into(),
            MetaEvent::text(TextKind::CuePoint, "B").into(),
            MetaEvent::text(TextKind::ProgramName, "C").into(),
            MetaEvent::text(TextKind::DeviceName, "D").into(),
            MetaEvent::ChannelPrefix(3).into(),
            MetaEvent::PortPrefix(1).into(),
            MetaEvent::EndOfTrack.into(),
            tempo(0),
            tempo(0xFF_FFFF),
            MetaEvent::SmpteOffset(smpte).into(),
            MetaEvent::TimeSignature(TimeSignature::new(6, 8, 36, 8).unwrap()).into(),
            MetaEvent::KeySignature(KeySignature::new(-3, 1).unwrap()).into(),
            MetaEvent::SequencerSpecific(Some(vec![0x00, 0x00, 0x41])).into(),
            MetaEvent::Unknown {
                status_byte: 0x60,
                data: Some(vec![1, 2, 3]),
            }
            .into(),
            SysExEvent::new(SysExKind::Normal, vec![0x43u8, 0x12, 0xF7]).into(),
            SysExEvent::new(SysExKind::Escape, vec![0xF8u8]).into(),
            SystemCommon::MidiTimeCode {
                component: MtcComponent::HoursHigh,
                value: u4::new(6),
            }
            .into(),
            SystemCommon::SongPositionPointer(u14::new(0x1234)).into(),
            SystemCommon::SongSelect(u7::new(9)).into(),
            SystemCommon::TuneRequest.into(),
            SystemRealTime::TimingClock.into(),
            SystemRealTime::ActiveSensing.into(),
        ];
        for kind in kinds {
            round_trip(kind);
        }
    }

    #[test]
    fn time_signature_bytes() {
        let sig = MetaEvent::TimeSignature(TimeSignature::new(3, 8, 24, 8).unwrap()).into();
        assert_eq!(
            convert::encode(&sig, &WritingSettings::default(), BytesFormat::File).unwrap(),
            vec![0xFF, 0x58, 0x04, 0x03, 0x03, 0x18, 0x08]
        );
    }

    #[test]
    fn tempo_bytes() {
        assert_eq!(
            convert::encode(&tempo(0xFF_FFFF), &WritingSettings::default(), BytesFormat::File)
                .unwrap(),
            vec![0xFF, 0x51, 0x03, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn short_meta_payloads() {
        let sig = decode(&[0xFF, 0x58, 0x02, 0x06, 0x03]).unwrap();
        assert_eq!(
            sig,
            MetaEvent::TimeSignature(TimeSignature::new(6, 8, 24, 8).unwrap()).into()
        );
        assert_eq!(
            decode(&[0xFF, 0x58, 0x01, 0x04]).unwrap(),
            MetaEvent::Unknown {
                status_byte: 0x58,
                data: Some(vec![0x04]),
            }
            .into()
        );
        assert_eq!(
            decode(&[0xFF, 0x00, 0x01, 0x04]).unwrap(),
            MetaEvent::Unknown {
                status_byte: 0x00,
                data: Some(vec![0x04]),
            }
            .into()
        );
        assert_eq!(
            decode(&[0xFF, 0x51, 0x02, 0x07, 0xA1]).unwrap(),
            MetaEvent::Unknown {
                status_byte: 0x51,
                data: Some(vec![0x07, 0xA1]),
            }
            .into()
        );
    }

    #[test]
    fn long_meta_payloads_are_skipped() {
        let raw = [0xFF, 0x51, 0x04, 0x07, 0xA1, 0x20, 0x99, 0x90, 0x3C, 0x40];
        let events =
            convert::decode_all(&raw, &ReadingSettings::default(), BytesFormat::File, false)
                .unwrap();
        assert_eq!(
            events,
            vec![
                Event::new(0, tempo(500_000)),
                Event::new(0, channel(note_on(60, 64))),
            ]
        );
    }

    #[test]
    fn meta_parameter_policy() {
        let raw = [0xFF, 0x58, 0x04, 0x04, 0x08, 0x18, 0x08];
        let err = decode(&raw).unwrap_err();
        assert_eq!(
            err.root_cause().kind(),
            ErrorKind::InvalidMetaEventParameterValue {
                meta_type: 0x58,
                parameter: "denominator",
                value: 8,
            }
        );
        let settings = ReadingSettings {
            invalid_meta_event_parameter_value_policy:
                InvalidMetaEventParameterValuePolicy::SnapToLimits,
            ..ReadingSettings::default()
        };
        let sig = convert::decode(&raw, &settings, BytesFormat::File).unwrap();
        assert_eq!(
            sig,
            MetaEvent::TimeSignature(TimeSignature::new(4, 128, 24, 8).unwrap()).into()
        );

        let raw = [0xFF, 0x59, 0x02, 0x09, 0x00];
        assert!(decode(&raw).is_err());
        assert_eq!(
            convert::decode(&raw, &settings, BytesFormat::File).unwrap(),
            MetaEvent::KeySignature(KeySignature::new(7, 0).unwrap()).into()
        );
    }

    #[test]
    fn zero_length_data_policy() {
        let raw = [0xFF, 0x01, 0x00];
        assert_eq!(
            decode(&raw).unwrap(),
            MetaEvent::Text {
                kind: TextKind::Text,
                text: Some(String::new()),
            }
            .into()
        );
        let settings = ReadingSettings {
            zero_length_data_policy: ZeroLengthDataPolicy::ReadAsNull,
            ..ReadingSettings::default()
        };
        assert_eq!(
            convert::decode(&raw, &settings, BytesFormat::File).unwrap(),
            MetaEvent::Text {
                kind: TextKind::Text,
                text: None,
            }
            .into()
        );
        assert_eq!(
            convert::decode(&[0xF0, 0x00], &settings, BytesFormat::File).unwrap(),
            SysExEvent {
                kind: SysExKind::Normal,
                data: None,
            }
            .into()
        );
    }

    #[test]
    fn truncated_payload() {
        let raw = [0xFF, 0x7F, 0x05, 0x01, 0x02];
        assert_eq!(
            decode(&raw).unwrap_err().kind(),
            ErrorKind::NotEnoughBytes {
                expected: 5,
                available: 2,
            }
        );
        let settings = ReadingSettings {
            not_enough_bytes_policy: NotEnoughBytesPolicy::ReadAvailable,
            ..ReadingSettings::default()
        };
        assert_eq!(
            convert::decode(&raw, &settings, BytesFormat::File).unwrap(),
            MetaEvent::SequencerSpecific(Some(vec![0x01, 0x02])).into()
        );
    }

    #[test]
    fn channel_parameter_policy() {
        let raw = [0x90, 0x3C, 0xC0];
        assert_eq!(
            decode(&raw).unwrap_err().kind(),
            ErrorKind::InvalidChannelEventParameterValue {
                status: 0x90,
                value: 0xC0,
            }
        );
        let read = |policy| {
            let settings = ReadingSettings {
                invalid_channel_event_parameter_value_policy: policy,
                ..ReadingSettings::default()
            };
            convert::decode(&raw, &settings, BytesFormat::File).unwrap()
        };
        assert_eq!(
            read(InvalidChannelEventParameterValuePolicy::ReadValid),
            channel(note_on(0x3C, 0x40))
        );
        assert_eq!(
            read(InvalidChannelEventParameterValuePolicy::SnapToLimits),
            channel(note_on(0x3C, 0x7F))
        );
    }

    #[test]
    fn system_common_parameter_policy() {
        let raw = [0xF3, 0x80];
        assert_eq!(
            decode(&raw).unwrap_err().kind(),
            ErrorKind::InvalidSystemCommonEventParameterValue {
                status: 0xF3,
                value: 0x80,
            }
        );
        let settings = ReadingSettings {
            invalid_system_common_event_parameter_value_policy:
                InvalidSystemCommonEventParameterValuePolicy::SnapToLimits,
            ..ReadingSettings::default()
        };
        assert_eq!(
            convert::decode(&raw, &settings, BytesFormat::File).unwrap(),
            SystemCommon::SongSelect(u7::new(0x7F)).into()
        );
    }

    #[test]
    fn silent_note_on_policy() {
        let raw = [0x95, 0x3C, 0x00];
        assert_eq!(
            decode(&raw).unwrap(),
            EventKind::channel(u4::new(5), note_on(0x3C, 0))
        );
        let settings = ReadingSettings {
            silent_note_on_policy: SilentNoteOnPolicy::NoteOff,
            ..ReadingSettings::default()
        };
        assert_eq!(
            convert::decode(&raw, &settings, BytesFormat::File).unwrap(),
            EventKind::channel(u4::new(5), note_off(0x3C, 0))
        );
    }

    #[test]
    fn pitch_bend_is_lsb_first() {
        let kind = decode(&[0xE0, 0x01, 0x40]).unwrap();
        match kind {
            EventKind::Channel {
                message: ChannelMessage::PitchBend { bend },
                ..
            } => {
                assert_eq!(bend.0.as_int(), 0x2001);
                assert_eq!(bend.as_int(), 1);
            }
            other => panic!("expected pitch bend, got {:?}", other),
        }
    }

    #[test]
    fn mtc_quarter_frame() {
        assert_eq!(
            decode(&[0xF1, 0x35]).unwrap(),
            SystemCommon::MidiTimeCode {
                component: MtcComponent::from_code(u3::new(3)),
                value: u4::new(5),
            }
            .into()
        );
    }

    #[test]
    fn value_validation() {
        assert_eq!(
            SetTempo::new(0x100_0000).unwrap_err().kind(),
            ErrorKind::InvalidValue {
                name: "microseconds per quarter note",
                value: 0x100_0000,
            }
        );
        assert!(TimeSignature::new(4, 3, 24, 8).is_err());
        assert!(TimeSignature::new(4, 0, 24, 8).is_err());
        assert!(KeySignature::new(8, 0).is_err());
        assert!(KeySignature::new(0, 2).is_err());
        assert!(KeySignature::new(-7, 1).is_ok());

        let mut sig = TimeSignature::default();
        assert!(sig.set_denominator(6).is_err());
        assert_eq!(sig.denominator(), 4);
        let mut tempo = SetTempo::default();
        assert!(tempo.set_microseconds_per_quarter_note(0x100_0000).is_err());
        assert!(tempo.is_default());
    }

    #[test]
    fn content_equality_ignores_delta() {
        let a = Event::new(0, channel(note_on(60, 1)));
        let b = Event::new(10, channel(note_on(60, 1)));
        assert!(a.content_eq(&b));
        assert!(a != b);
        assert_eq!(a.clone(), a);
    }
}

mod track_read {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn running_status() {
        let content = [0x00, 0x90, 0x3C, 0x40, 0x10, 0x3E, 0x40, 0x00, 0xFF, 0x2F, 0x00];
        let track = read_track(&content, &ReadingSettings::default()).unwrap();
        assert_eq!(
            track.events,
            vec![
                Event::new(0, channel(note_on(0x3C, 0x40))),
                Event::new(0x10, channel(note_on(0x3E, 0x40))),
            ]
        );
    }

    #[test]
    fn running_status_is_cleared_by_other_events() {
        let content = [0x00, 0x90, 0x3C, 0x40, 0x00, 0xF8, 0x00, 0x3E, 0x40];
        let err = read_track(&content, &ReadingSettings::default()).unwrap_err();
        assert_eq!(err.root_cause().kind(), ErrorKind::UnexpectedRunningStatus);
        assert_eq!(err.position(), Some(7));
    }

    #[test]
    fn end_of_track_storing_policy() {
        let settings = ReadingSettings {
            end_of_track_storing_policy: EndOfTrackStoringPolicy::Store,
            ..ReadingSettings::default()
        };
        let track = read_track(SIMPLE_TRACK, &settings).unwrap();
        assert_eq!(track.events.len(), 3);
        assert!(track.events[2].kind.is_end_of_track());
        let track = read_track(SIMPLE_TRACK, &ReadingSettings::default()).unwrap();
        assert_eq!(track.events.len(), 2);
    }

    #[test]
    fn missed_end_of_track_policy() {
        let content = [0x00, 0x90, 0x3C, 0x40];
        let track = read_track(&content, &ReadingSettings::default()).unwrap();
        assert_eq!(track.events.len(), 1);
        let settings = ReadingSettings {
            missed_end_of_track_policy: MissedEndOfTrackPolicy::Abort,
            ..ReadingSettings::default()
        };
        assert_eq!(
            read_track(&content, &settings).unwrap_err().kind(),
            ErrorKind::MissedEndOfTrack
        );
    }

    #[test]
    fn overlong_delta_time_snaps_to_zero() {
        let mut content = vec![0xFF; 9];
        content.push(0x7F);
        content.extend_from_slice(&[0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00]);
        let track = read_track(&content, &ReadingSettings::default()).unwrap();
        assert_eq!(track.events, vec![Event::new(0, channel(note_on(0x3C, 0x40)))]);
    }

    #[test]
    fn truncated_event() {
        let content = [0x00, 0x90, 0x3C, 0x40, 0x00, 0x90, 0x3C];
        let err = read_track(&content, &ReadingSettings::default()).unwrap_err();
        assert_eq!(
            err.root_cause().kind(),
            ErrorKind::NotEnoughBytes {
                expected: 1,
                available: 0,
            }
        );
        let settings = ReadingSettings {
            not_enough_bytes_policy: NotEnoughBytesPolicy::ReadAvailable,
            ..ReadingSettings::default()
        };
        let track = read_track(&content, &settings).unwrap();
        assert_eq!(track.events, vec![Event::new(0, channel(note_on(0x3C, 0x40)))]);
    }
}

mod track_write {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_track_gets_end_of_track() {
        assert_eq!(
            write_track(vec![], &WritingSettings::default()),
            vec![0x00, 0xFF, 0x2F, 0x00]
        );
    }

    #[test]
    fn running_status_compression() {
        let events = vec![
            Event::new(0, channel(note_on(0x3C, 0x40))),
            Event::new(0, channel(note_on(0x3E, 0x40))),
            Event::new(0, channel(note_on(0x40, 0x40))),
        ];
        let compressed = WritingSettings {
            use_running_status: true,
            ..WritingSettings::default()
        };
        assert_eq!(
            write_track(events.clone(), &compressed),
            vec![
                0x00, 0x90, 0x3C, 0x40, 0x00, 0x3E, 0x40, 0x00, 0x40, 0x40, 0x00, 0xFF, 0x2F, 0x00
            ]
        );
        assert_eq!(
            write_track(events, &WritingSettings::default()),
            vec![
                0x00, 0x90, 0x3C, 0x40, 0x00, 0x90, 0x3E, 0x40, 0x00, 0x90, 0x40, 0x40, 0x00,
                0xFF, 0x2F, 0x00
            ]
        );
    }

    #[test]
    fn running_status_is_reset_by_meta_events() {
        let events = vec![
            Event::new(0, channel(note_on(0x3C, 0x40))),
            Event::new(0, MetaEvent::text(TextKind::Marker, "x")),
            Event::new(0, channel(note_on(0x3E, 0x40))),
        ];
        let settings = WritingSettings {
            use_running_status: true,
            ..WritingSettings::default()
        };
        assert_eq!(
            write_track(events, &settings),
            vec![
                0x00, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x06, 0x01, b'x', 0x00, 0x90, 0x3E, 0x40,
                0x00, 0xFF, 0x2F, 0x00
            ]
        );
    }

    #[test]
    fn silent_note_on_shares_running_status() {
        let events = vec![
            Event::new(0, channel(note_on(0x3C, 0x40))),
            Event::new(0x10, channel(note_off(0x3C, 0x40))),
        ];
        assert_eq!(
            write_track(events, &WritingSettings::compact()),
            vec![0x00, 0x90, 0x3C, 0x40, 0x10, 0x3C, 0x00, 0x00, 0xFF, 0x2F, 0x00]
        );
    }

    #[test]
    fn end_of_track_is_moved_to_the_end() {
        let events = vec![
            Event::new(0, channel(note_on(0x3C, 0x40))),
            Event::new(10, MetaEvent::EndOfTrack),
            Event::new(5, channel(note_on(0x3E, 0x40))),
            Event::new(7, SystemRealTime::TimingClock),
            Event::new(9, MetaEvent::EndOfTrack),
        ];
        // The delta of the dropped clock event is lost, those of End Of Track events carry on
        assert_eq!(
            write_track(events, &WritingSettings::default()),
            vec![0x00, 0x90, 0x3C, 0x40, 0x0F, 0x90, 0x3E, 0x40, 0x09, 0xFF, 0x2F, 0x00]
        );
    }

    #[test]
    fn default_tempo_dedup() {
        let events = vec![
            Event::new(1, tempo(500_000)),
            Event::new(2, tempo(500_000)),
            Event::new(3, tempo(600_000)),
            Event::new(4, tempo(500_000)),
        ];
        let settings = WritingSettings {
            delete_default_set_tempo: true,
            ..WritingSettings::default()
        };
        assert_eq!(
            write_track(events, &settings),
            vec![
                0x03, 0xFF, 0x51, 0x03, 0x09, 0x27, 0xC0, 0x04, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
                0x00, 0xFF, 0x2F, 0x00
            ]
        );
    }

    #[test]
    fn default_signatures_dedup() {
        let events = vec![
            Event::new(0, MetaEvent::TimeSignature(TimeSignature::default())),
            Event::new(0, MetaEvent::KeySignature(KeySignature::default())),
            Event::new(2, channel(note_on(0x3C, 0x40))),
        ];
        assert_eq!(
            write_track(events.clone(), &WritingSettings::compact()),
            vec![0x02, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00]
        );
        assert_eq!(write_track(events, &WritingSettings::default()).len(), 22);
    }

    #[test]
    fn unknown_meta_events() {
        let events = vec![
            Event::new(
                3,
                MetaEvent::Unknown {
                    status_byte: 0x60,
                    data: Some(vec![0xAB]),
                },
            ),
            Event::new(1, channel(note_on(0x3C, 0x40))),
        ];
        assert_eq!(
            write_track(events.clone(), &WritingSettings::default()),
            vec![0x03, 0xFF, 0x60, 0x01, 0xAB, 0x01, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00]
        );
        let settings = WritingSettings {
            delete_unknown_meta_events: true,
            ..WritingSettings::default()
        };
        assert_eq!(
            write_track(events, &settings),
            vec![0x01, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00]
        );
    }

    #[test]
    fn read_back_what_was_written() {
        let events = vec![
            Event::new(0, MetaEvent::text(TextKind::SequenceTrackName, "lead")),
            Event::new(0, tempo(400_000)),
            Event::new(0, channel(note_on(60, 90))),
            Event::new(0x20_0000, channel(note_on(64, 90))),
            Event::new(48, channel(note_on(60, 0))),
            Event::new(0, SysExEvent::new(SysExKind::Normal, vec![0x7Eu8, 0x7F, 0xF7])),
            Event::new(48, channel(note_on(64, 0))),
        ];
        let content = write_track(events.clone(), &WritingSettings::compact());
        let track = read_track(&content, &ReadingSettings::default()).unwrap();
        assert_eq!(track.events, events);
    }
}

mod chunk {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn declared_size_too_large() {
        // Two bytes of garbage after the End Of Track event
        let mut content = SIMPLE_TRACK.to_vec();
        content.extend_from_slice(&[0xAA, 0xBB]);
        let mut raw = header(1, 2);
        raw.extend(chunk(b"MTrk", content.len() as u32, &content));
        raw.extend(chunk(b"MTrk", SIMPLE_TRACK.len() as u32, SIMPLE_TRACK));

        let err = Smf::parse(&raw).unwrap_err();
        assert_eq!(
            err.root_cause().kind(),
            ErrorKind::InvalidChunkSize {
                id: *b"MTrk",
                expected: 14,
                actual: 12,
            }
        );

        let settings = ReadingSettings {
            invalid_chunk_size_policy: InvalidChunkSizePolicy::Ignore,
            ..ReadingSettings::default()
        };
        let smf = Smf::parse_with(&raw, &settings).unwrap();
        assert_eq!(smf.tracks().count(), 2);
        assert_eq!(smf.tracks().next().unwrap().events.len(), 2);
    }

    #[test]
    fn declared_size_too_small() {
        let mut raw = header(1, 2);
        raw.extend(chunk(b"MTrk", SIMPLE_TRACK.len() as u32 - 2, SIMPLE_TRACK));
        raw.extend(chunk(b"MTrk", SIMPLE_TRACK.len() as u32, SIMPLE_TRACK));

        assert_eq!(
            Smf::parse(&raw).unwrap_err().root_cause().kind(),
            ErrorKind::InvalidChunkSize {
                id: *b"MTrk",
                expected: 10,
                actual: 12,
            }
        );
        let settings = ReadingSettings {
            invalid_chunk_size_policy: InvalidChunkSizePolicy::Ignore,
            ..ReadingSettings::default()
        };
        let smf = Smf::parse_with(&raw, &settings).unwrap();
        assert_eq!(smf.tracks().count(), 2);
    }

    #[test]
    fn declared_size_beyond_the_input() {
        let mut raw = header(0, 1);
        raw.extend(chunk(b"MTrk", 0x7FFF_FFFF, &[0x00, 0xFF, 0x2F, 0x00]));

        assert_eq!(
            Smf::parse(&raw).unwrap_err().root_cause().kind(),
            ErrorKind::InvalidChunkSize {
                id: *b"MTrk",
                expected: 0x7FFF_FFFF,
                actual: 4,
            }
        );
        let settings = ReadingSettings {
            not_enough_bytes_policy: NotEnoughBytesPolicy::ReadAvailable,
            ..ReadingSettings::default()
        };
        let smf = Smf::parse_with(&raw, &settings).unwrap();
        assert_eq!(smf.tracks().count(), 1);
        assert!(smf.tracks().next().unwrap().events.is_empty());

        let default = ReadingSettings::default();
        let (_, mut tracks) = parse_lazy(&raw, &default).unwrap();
        assert_eq!(
            tracks.next().unwrap().unwrap_err().kind(),
            ErrorKind::NotEnoughBytes {
                expected: 0x7FFF_FFFF,
                available: 4,
            }
        );
    }

    #[test]
    fn unknown_chunk_policy() {
        let mut raw = simple_file(1, 1);
        raw.extend(chunk(b"XFIH", 3, &[1, 2, 3]));

        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(
            smf.chunks[1],
            Chunk::Unknown(UnknownChunk::new(b"XFIH", vec![1u8, 2, 3]).unwrap())
        );
        assert_eq!(smf.to_bytes(&WritingSettings::default()).unwrap(), raw);

        let read = |policy| {
            let settings = ReadingSettings {
                unknown_chunk_id_policy: policy,
                ..ReadingSettings::default()
            };
            Smf::parse_with(&raw, &settings)
        };
        assert_eq!(read(UnknownChunkIdPolicy::Skip).unwrap().chunks.len(), 1);
        assert_eq!(
            read(UnknownChunkIdPolicy::Abort).unwrap_err().root_cause().kind(),
            ErrorKind::UnknownChunkId(*b"XFIH")
        );
    }

    #[test]
    fn chunk_ids_are_four_bytes() {
        assert_eq!(
            UnknownChunk::new(b"abc", Vec::<u8>::new()).unwrap_err().kind(),
            ErrorKind::InvalidChunkId(3)
        );
    }

    #[test]
    fn header_chunks_cannot_be_cloned() {
        let header = Chunk::Header(HeaderChunk::default());
        assert_eq!(
            header.try_clone().unwrap_err().kind(),
            ErrorKind::HeaderChunkClone
        );
        let track = Chunk::Track(TrackChunk::default());
        assert_eq!(track.try_clone().unwrap(), track);
    }

    #[test]
    fn unknown_file_format_policy() {
        let mut raw = header(5, 1);
        raw.extend(chunk(b"MTrk", SIMPLE_TRACK.len() as u32, SIMPLE_TRACK));
        assert_eq!(Smf::parse(&raw).unwrap().format, Format::Parallel);
        let settings = ReadingSettings {
            unknown_file_format_policy: UnknownFileFormatPolicy::Abort,
            ..ReadingSettings::default()
        };
        assert_eq!(
            Smf::parse_with(&raw, &settings).unwrap_err().root_cause().kind(),
            ErrorKind::UnknownFileFormat(5)
        );
    }

    #[test]
    fn fixed_buffers_run_out_of_space() {
        let track = Chunk::Track(TrackChunk::default());
        let mut buf = [0; 8];
        let mut cursor = crate::io::Cursor::new(&mut buf);
        assert_eq!(
            track.write(&mut cursor, &WritingSettings::default()),
            Err(crate::io::CursorError::OutOfSpace)
        );
    }
}

mod smf {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn no_header_chunk_policy() {
        let raw = chunk(b"MTrk", SIMPLE_TRACK.len() as u32, SIMPLE_TRACK);
        assert_eq!(
            Smf::parse(&raw).unwrap_err().kind(),
            ErrorKind::NoHeaderChunk
        );
        let settings = ReadingSettings {
            no_header_chunk_policy: NoHeaderChunkPolicy::Ignore,
            ..ReadingSettings::default()
        };
        let smf = Smf::parse_with(&raw, &settings).unwrap();
        assert_eq!(smf.format, Format::Parallel);
        assert_eq!(smf.timing, Timing::default());
        assert_eq!(smf.tracks().count(), 1);
    }

    #[test]
    fn duplicate_header_is_ignored() {
        let mut raw = simple_file(1, 1);
        let mut second = header(2, 7);
        second[13] = 24;
        raw.extend(second);
        let smf = Smf::parse(&raw).unwrap();
        assert_eq!(smf.format, Format::Parallel);
        assert_eq!(smf.timing, Timing::default());
        assert_eq!(smf.chunks.len(), 1);
    }

    #[test]
    fn extra_track_chunks() {
        let raw = simple_file(1, 2);
        assert_eq!(Smf::parse(&raw).unwrap().tracks().count(), 2);

        let settings = ReadingSettings {
            extra_track_chunk_policy: ExtraTrackChunkPolicy::Skip,
            ..ReadingSettings::default()
        };
        assert_eq!(Smf::parse_with(&raw, &settings).unwrap().tracks().count(), 1);

        let settings = ReadingSettings {
            unexpected_track_chunks_count_policy: UnexpectedTrackChunksCountPolicy::Abort,
            ..ReadingSettings::default()
        };
        assert_eq!(
            Smf::parse_with(&raw, &settings).unwrap_err().kind(),
            ErrorKind::UnexpectedTrackChunksCount {
                expected: 1,
                actual: 2,
            }
        );
    }

    #[test]
    fn trailing_bytes() {
        let mut raw = simple_file(1, 1);
        raw.extend_from_slice(b"MT");
        assert_eq!(
            Smf::parse(&raw).unwrap_err().root_cause().kind(),
            ErrorKind::NotEnoughBytes {
                expected: 4,
                available: 2,
            }
        );
        let settings = ReadingSettings {
            not_enough_bytes_policy: NotEnoughBytesPolicy::ReadAvailable,
            ..ReadingSettings::default()
        };
        assert_eq!(Smf::parse_with(&raw, &settings).unwrap().tracks().count(), 1);
    }

    #[test]
    fn truncated_track_chunk() {
        let mut raw = header(0, 1);
        raw.extend(chunk(b"MTrk", 40, &SIMPLE_TRACK[..6]));
        assert!(Smf::parse(&raw).is_err());
        let smf = Smf::parse_with(&raw, &ReadingSettings::lenient()).unwrap();
        assert_eq!(
            smf.tracks().next().unwrap().events,
            vec![Event::new(0, channel(note_on(0x3C, 0x40)))]
        );
    }

    #[test]
    fn rmid_files_are_unwrapped() {
        let smf = simple_file(1, 1);
        let mut data = b"data".to_vec();
        data.extend_from_slice(&(smf.len() as u32).to_le_bytes());
        data.extend_from_slice(&smf);
        if smf.len() % 2 == 1 {
            data.push(0);
        }
        let mut riff = b"RIFF".to_vec();
        riff.extend_from_slice(&(data.len() as u32 + 4).to_le_bytes());
        riff.extend_from_slice(b"RMID");
        riff.extend(data);

        assert_eq!(Smf::parse(&riff).unwrap(), Smf::parse(&smf).unwrap());
    }

    #[test]
    fn write_synthesizes_the_header() {
        let mut smf = Smf::new(Format::Sequential, Timing::Timecode(Fps::Fps30, 80));
        smf.chunks.push(Chunk::Header(HeaderChunk::default()));
        smf.chunks.push(TrackChunk::default().into());
        smf.chunks.push(UnknownChunk::new(b"XYZW", vec![9u8]).unwrap().into());
        smf.chunks.push(TrackChunk::default().into());

        let raw = smf.to_bytes(&WritingSettings::default()).unwrap();
        assert_eq!(&raw[..14], &[b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 2, 0, 2, 0xE2, 80]);
        assert_eq!(raw.len(), 14 + 12 + 9 + 12);

        let compact = smf.to_bytes(&WritingSettings::compact()).unwrap();
        assert_eq!(compact.len(), 14 + 12 + 12);

        let parsed = Smf::parse(&raw).unwrap();
        assert_eq!(parsed.format, Format::Sequential);
        assert_eq!(parsed.timing, Timing::Timecode(Fps::Fps30, 80));
        assert_eq!(parsed.chunks.len(), 3);
        assert!(smf.try_clone().is_err());
        assert_eq!(parsed.try_clone().unwrap(), parsed);
    }

    #[test]
    fn file_round_trip() {
        let mut smf = Smf::new(Format::Parallel, Timing::default());
        for key in 0..4 {
            smf.chunks.push(
                TrackChunk::new(vec![
                    Event::new(0, MetaEvent::text(TextKind::SequenceTrackName, "track")),
                    Event::new(0, channel(note_on(key, 100))),
                    Event::new(96, channel(note_on(key, 0))),
                ])
                .into(),
            );
        }
        for settings in [WritingSettings::default(), WritingSettings::compact()] {
            let raw = smf.to_bytes(&settings).unwrap();
            assert_eq!(Smf::parse(&raw).unwrap(), smf);
            let mut io_out = Vec::new();
            smf.write_std(&mut io_out, &settings).unwrap();
            assert_eq!(io_out, raw);
        }
    }

    #[test]
    fn lazy_parsing() {
        let mut raw = simple_file(2, 1);
        raw.extend(chunk(b"XFIH", 1, &[0]));
        raw.extend(chunk(b"MTrk", SIMPLE_TRACK.len() as u32, SIMPLE_TRACK));

        let settings = ReadingSettings::default();
        let (header, tracks) = parse_lazy(&raw, &settings).unwrap();
        assert_eq!(header.track_count, 2);
        assert_eq!(header.file_format, 1);
        let tracks = tracks.collect_tracks().unwrap();
        let eager = Smf::parse(&raw).unwrap();
        assert_eq!(tracks.iter().collect::<Vec<_>>(), eager.tracks().collect::<Vec<_>>());

        let (_, mut tracks) = parse_lazy(&raw, &settings).unwrap();
        let mut events = tracks.next().unwrap().unwrap();
        assert_eq!(
            events.next().unwrap().unwrap(),
            Event::new(0, channel(note_on(0x3C, 0x40)))
        );
        assert_eq!(events.running_status(), Some(0x90));
        assert_eq!(events.unread().len(), 8);
    }

    #[test]
    fn lazy_errors_are_yielded_once() {
        let mut raw = header(0, 1);
        raw.extend(chunk(b"MTrk", 4, &[0x00, 0xF4, 0x00, 0x00]));
        let settings = ReadingSettings::default();
        let (_, mut tracks) = parse_lazy(&raw, &settings).unwrap();
        let mut events = tracks.next().unwrap().unwrap();
        assert!(events.next().unwrap().is_err());
        assert!(events.next().is_none());
        assert!(tracks.next().is_none());
    }

    #[test]
    fn lazy_tracks_check_their_size() {
        let mut content = SIMPLE_TRACK.to_vec();
        content.extend_from_slice(&[0xAA, 0xBB]);
        let mut raw = header(0, 1);
        raw.extend(chunk(b"MTrk", content.len() as u32, &content));

        let settings = ReadingSettings::default();
        let (_, mut tracks) = parse_lazy(&raw, &settings).unwrap();
        let mut events = tracks.next().unwrap().unwrap();
        assert!(events.next().unwrap().is_ok());
        assert!(events.next().unwrap().is_ok());
        assert_eq!(
            events.next().unwrap().unwrap_err().kind(),
            ErrorKind::InvalidChunkSize {
                id: *b"MTrk",
                expected: 14,
                actual: 12,
            }
        );
        assert!(events.next().is_none());

        let settings = ReadingSettings {
            invalid_chunk_size_policy: InvalidChunkSizePolicy::Ignore,
            ..ReadingSettings::default()
        };
        let (_, tracks) = parse_lazy(&raw, &settings).unwrap();
        let tracks = tracks.collect_tracks().unwrap();
        assert_eq!(tracks[0].events.len(), 2);
    }

    #[test]
    fn errors_carry_context_and_position() {
        let mut raw = header(0, 1);
        raw.extend(chunk(b"MTrk", 2, &[0x00, 0xF4]));
        let err = Smf::parse(&raw).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Context(_)));
        assert_eq!(err.root_cause().kind(), ErrorKind::UnknownStatus(0xF4));
        assert_eq!(err.position(), Some(23));
        assert!(format!("{:?}", err).contains("caused by: unknown status byte 0xF4 (at byte 23)"));
    }
}

mod converter {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn device_sysex_framing() {
        let sysex: EventKind =
            SysExEvent::new(SysExKind::Normal, vec![0x7Eu8, 0x7F, 0x09, 0x01]).into();
        let device =
            convert::encode(&sysex, &WritingSettings::default(), BytesFormat::Device).unwrap();
        assert_eq!(device, vec![0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7]);
        assert_eq!(
            convert::decode(&device, &ReadingSettings::default(), BytesFormat::Device).unwrap(),
            SysExEvent::new(SysExKind::Normal, vec![0x7Eu8, 0x7F, 0x09, 0x01, 0xF7]).into()
        );
        let file = convert::encode(&sysex, &WritingSettings::default(), BytesFormat::File).unwrap();
        assert_eq!(file, vec![0xF0, 0x04, 0x7E, 0x7F, 0x09, 0x01]);

        let terminated: EventKind = SysExEvent::new(SysExKind::Normal, vec![0x01u8, 0xF7]).into();
        assert_eq!(
            convert::encode(&terminated, &WritingSettings::default(), BytesFormat::Device)
                .unwrap(),
            vec![0xF0, 0x01, 0xF7]
        );
    }

    #[test]
    fn reset_only_exists_on_devices() {
        assert_eq!(
            convert::decode(&[0xFF], &ReadingSettings::default(), BytesFormat::Device).unwrap(),
            SystemRealTime::Reset.into()
        );
        assert!(convert::decode(&[0xFF], &ReadingSettings::default(), BytesFormat::File).is_err());
        assert_eq!(
            convert::encode(
                &MetaEvent::EndOfTrack.into(),
                &WritingSettings::default(),
                BytesFormat::Device
            ),
            Err("meta events only exist in midi files")
        );
    }

    #[test]
    fn event_sequences() {
        let events = vec![
            Event::new(0, channel(note_on(0x3C, 0x40))),
            Event::new(0, channel(note_on(0x3E, 0x40))),
        ];
        let settings = WritingSettings {
            use_running_status: true,
            ..WritingSettings::default()
        };
        let raw = convert::encode_all(&events, &settings, BytesFormat::Device, false).unwrap();
        assert_eq!(raw, vec![0x90, 0x3C, 0x40, 0x3E, 0x40]);
        assert_eq!(
            convert::decode_all(&raw, &ReadingSettings::default(), BytesFormat::Device, false)
                .unwrap(),
            events
        );

        let timed = vec![
            Event::new(0x80, channel(note_on(0x3C, 0x40))),
            Event::new(1, channel(note_off(0x3C, 0x40))),
        ];
        let raw = convert::encode_all(&timed, &WritingSettings::default(), BytesFormat::File, true)
            .unwrap();
        assert_eq!(raw, vec![0x81, 0x00, 0x90, 0x3C, 0x40, 0x01, 0x80, 0x3C, 0x40]);
        assert_eq!(
            convert::decode_all(&raw, &ReadingSettings::default(), BytesFormat::File, true)
                .unwrap(),
            timed
        );
    }
}
