//! Frame assembly from the inbound channel

use crate::store::CodeUnitStore;
use stowaway_proto::{CodeUnit, Decompressor, FrameCodec, ProtocolError};
use tokio::io::AsyncBufRead;
use tracing::{debug, info};

/// Lowest verbosity at which each unit is reported as it is assembled
pub const UNIT_DIAGNOSTICS: u8 = 2;

/// Reads frames until the sentinel, inflating them through one shared context
#[derive(Default)]
pub struct FrameAssembler {
    codec: FrameCodec,
    decompressor: Decompressor,
    verbosity: u8,
}

impl FrameAssembler {
    /// Assembler with a fresh decompression context
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler reporting units at the given stub verbosity
    pub fn with_verbosity(verbosity: u8) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    /// Read every frame up to the sentinel into a sealed store
    pub async fn assemble<R>(mut self, reader: &mut R) -> Result<CodeUnitStore, ProtocolError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut store = CodeUnitStore::new();

        while let Some(frame) = self.codec.read_frame(reader).await? {
            if self.verbosity >= UNIT_DIAGNOSTICS {
                debug!("assembling {} ({} bytes)", frame.name, frame.payload_size());
            }

            let body = self.decompressor.decompress_unit(&frame.name, &frame.body)?;
            let source = String::from_utf8(body).map_err(|_| {
                ProtocolError::MalformedFrame(format!(
                    "source of {} is not valid UTF-8",
                    frame.name
                ))
            })?;
            store.insert(CodeUnit::new(frame.name, frame.is_package, source))?;
        }

        store.seal();
        info!("Assembled {} code units", store.len());
        Ok(store)
    }
}
