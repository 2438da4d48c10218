//! Packaging and assembling through one shared compression context

use proptest::prelude::*;
use std::io::Cursor;
use stowaway_proto::{Compressor, Decompressor, Frame, FrameCodec, ProtocolError};

async fn encode(units: &[(String, bool, String)]) -> Result<Vec<Frame>, ProtocolError> {
    let mut compressor = Compressor::new();
    let mut frames = Vec::new();
    for (name, is_package, source) in units {
        let body = compressor.compress_unit(source.as_bytes())?;
        frames.push(Frame::new(name.clone(), *is_package, body));
    }
    Ok(frames)
}

async fn wire(frames: &[Frame]) -> Result<Vec<u8>, ProtocolError> {
    let codec = FrameCodec::new();
    let mut out = Vec::new();
    for frame in frames {
        codec.write_frame(&mut out, frame).await?;
    }
    codec.write_sentinel(&mut out).await?;
    Ok(out)
}

async fn decode(bytes: Vec<u8>) -> Result<Vec<(String, bool, String)>, ProtocolError> {
    let mut reader = Cursor::new(bytes);
    let mut codec = FrameCodec::new();
    let mut decompressor = Decompressor::new();
    let mut units = Vec::new();
    while let Some(frame) = codec.read_frame(&mut reader).await? {
        let body = decompressor.decompress_unit(&frame.name, &frame.body)?;
        let source = String::from_utf8(body).expect("utf-8 source");
        units.push((frame.name, frame.is_package, source));
    }
    Ok(units)
}

fn sample_units() -> Vec<(String, bool, String)> {
    vec![
        ("stowaway".to_string(), true, "# package root\n".to_string()),
        ("stowaway.helpers".to_string(), false, "def log(msg):\n    pass\n".repeat(20)),
        ("stowaway.ssnet".to_string(), false, "def log(msg):\n    send(msg)\n".repeat(20)),
        ("stowaway.server".to_string(), false, "def main():\n    serve()\n".to_string()),
    ]
}

#[tokio::test]
async fn test_units_decode_in_order() {
    let units = sample_units();
    let frames = encode(&units).await.unwrap();
    let decoded = decode(wire(&frames).await.unwrap()).await.unwrap();
    assert_eq!(decoded, units);
}

#[tokio::test]
async fn test_reordered_frames_fail() {
    let units = sample_units();
    let mut frames = encode(&units).await.unwrap();
    frames.swap(0, 1);

    let result = decode(wire(&frames).await.unwrap()).await;
    assert!(matches!(result, Err(ProtocolError::CorruptBody { .. })));
}

#[tokio::test]
async fn test_context_cannot_be_reset_mid_sequence() {
    let units = sample_units();
    let frames = encode(&units).await.unwrap();

    let mut first = Decompressor::new();
    first.decompress_unit(&frames[0].name, &frames[0].body).unwrap();

    let mut restarted = Decompressor::new();
    let result = restarted.decompress_unit(&frames[1].name, &frames[1].body);
    assert!(matches!(result, Err(ProtocolError::CorruptBody { .. })));
}

#[tokio::test]
async fn test_truncated_body_is_detected() {
    let units = sample_units();
    let frames = encode(&units[..1]).await.unwrap();
    let mut bytes = wire(&frames).await.unwrap();
    // Drop the sentinel and the last body byte
    bytes.truncate(bytes.len() - 2);

    let result = decode(bytes).await;
    assert!(matches!(result, Err(ProtocolError::TruncatedStream(_))));
}

proptest! {
    #[test]
    fn test_package_assemble_roundtrip(
        units in prop::collection::vec(
            ("[a-z]{1,8}(\\.[a-z]{1,8}){0,2}", any::<bool>(), any::<String>()),
            1..6
        )
    ) {
        tokio_test::block_on(async {
            let frames = encode(&units).await?;
            let decoded = decode(wire(&frames).await?).await?;
            prop_assert_eq!(decoded, units);
            Ok(())
        })?;
    }
}
