use std::fs::{self, File};

use codec::{ErrorKind, Session, SessionConfig, SessionState};
use tempfile::tempdir;

fn write_sample(session: &mut Session) {
    session.start_serializing().unwrap();
    session.add_unsigned_max(5, 7).unwrap();
    session.add_string_compressed("on disk").unwrap();
    session.add_signed_bits(-12, 8).unwrap();
}

fn read_sample(session: &mut Session) {
    assert_eq!(session.get_unsigned_max(7).unwrap(), 5);
    assert_eq!(session.get_string_compressed().unwrap(), "on disk");
    assert_eq!(session.get_signed_bits(8).unwrap(), -12);
    session.finish_deserializing().unwrap();
}

#[test]
fn file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sample.bits");

    let mut writer = Session::default();
    write_sample(&mut writer);
    let data = writer.finalize_serializing_to_file(&path).unwrap();
    assert_eq!(writer.state(), SessionState::DoneSerializing);
    assert_eq!(fs::read(&path).unwrap(), data.as_bytes());

    let mut reader = Session::default();
    reader.start_deserializing_from_file(&path).unwrap();
    read_sample(&mut reader);
}

#[test]
fn stream_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stream.bits");

    let mut writer = Session::new(SessionConfig::for_testing());
    write_sample(&mut writer);
    let mut file = File::create(&path).unwrap();
    writer.finalize_serializing_to(&mut file).unwrap();
    drop(file);

    let mut reader = Session::new(SessionConfig::for_testing());
    let mut file = File::open(&path).unwrap();
    reader.start_deserializing_from(&mut file).unwrap();
    read_sample(&mut reader);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let mut reader = Session::default();
    let err = reader
        .start_deserializing_from_file(dir.path().join("absent.bits"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("absent.bits"));
    assert_eq!(reader.state(), SessionState::Error);
}

#[test]
fn unwritable_path_is_io_error() {
    let dir = tempdir().unwrap();
    let mut writer = Session::default();
    write_sample(&mut writer);
    let err = writer
        .finalize_serializing_to_file(dir.path().join("missing").join("out.bits"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(writer.is_error());
}
