//! Checks the exact bytes a session puts on the channel, using a transport
//! that records its arguments and input instead of reaching a remote host.

use proptest::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use stowaway::{Packager, SessionBuilder};
use stowaway_proto::{CodeUnit, Decompressor, FrameCodec, FsResolver, ServerOptions, OPTIONS_UNIT};

fn write_storage(root: &Path) {
    let package = root.join("stowaway");
    fs::create_dir_all(&package).unwrap();
    fs::write(package.join("mod.src"), "# stowaway\n").unwrap();
    for name in ["helpers", "ssnet", "hostwatch", "server"] {
        let source = format!("# {}\n", name).repeat(8);
        fs::write(package.join(format!("{}.src", name)), source).unwrap();
    }
}

#[tokio::test]
async fn test_remote_session_wire_format() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_storage(dir.path());
    let capture = dir.path().join("stream");

    // Records "$@" one per line, then the whole of stdin
    let transport = format!(
        "sh -c 'printf \"%s\\n\" \"$@\" > \"$0.argv\"; cat > \"$0\"' {}",
        capture.display()
    );
    let options = ServerOptions {
        latency_control: true,
        auto_hosts: false,
        to_nameserver: Some("10.0.0.1".to_string()),
    };
    let builder = SessionBuilder::new("alice@example.com:2222")
        .with_transport(transport)
        .with_storage(Arc::new(FsResolver::new(dir.path())))
        .with_options(options.clone())
        .with_verbosity(2);
    let script = builder.boot_script().to_string();

    let mut session = builder.start().await?;
    session.shutdown_write().await?;
    assert!(session.wait().await?.success());

    let argv = fs::read_to_string(dir.path().join("stream.argv"))?;
    let argv: Vec<&str> = argv.lines().collect();
    assert_eq!(&argv[..4], &["-p", "2222", "alice@example.com", "--"]);
    assert!(argv[4].starts_with("exec /bin/sh -c "));
    assert!(argv[4].contains(&format!("exec={}", script.len())));
    assert!(argv[4].contains("verbosity=2"));

    let stream = fs::read(&capture)?;
    assert!(stream.starts_with(script.as_bytes()));

    let mut reader = Cursor::new(stream[script.len()..].to_vec());
    let mut codec = FrameCodec::new();
    let mut decompressor = Decompressor::new();
    let mut decoded = Vec::new();
    while let Some(frame) = codec.read_frame(&mut reader).await? {
        let source = decompressor.decompress_unit(&frame.name, &frame.body)?;
        decoded.push((frame.name, frame.is_package, String::from_utf8(source)?));
    }

    assert_eq!(reader.position() as usize, stream.len() - script.len());
    assert_eq!(decoded.len(), 6);
    assert_eq!(decoded[0], (OPTIONS_UNIT.to_string(), false, options.to_source()?));
    assert_eq!(decoded[1], ("stowaway".to_string(), true, "# stowaway\n".to_string()));
    assert_eq!(decoded[5].0, "stowaway.server");
    assert_eq!(decoded[5].2, "# server\n".repeat(8));
    Ok(())
}

proptest! {
    #[test]
    fn prop_packaged_units_decode_in_order(
        sources in prop::collection::vec(("[a-z]{1,8}", any::<bool>(), ".{0,200}"), 1..8)
    ) {
        let mut packager = Packager::new();
        let frames: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, (name, is_package, source))| {
                let unit = CodeUnit::new(format!("{}{}", name, i), *is_package, source.as_str());
                packager.package(&unit).unwrap()
            })
            .collect();

        let mut decompressor = Decompressor::new();
        for (frame, (_, is_package, source)) in frames.iter().zip(&sources) {
            prop_assert_eq!(frame.is_package, *is_package);
            let decoded = decompressor.decompress_unit(&frame.name, &frame.body).unwrap();
            prop_assert_eq!(decoded, source.as_bytes().to_vec());
        }
    }
}
