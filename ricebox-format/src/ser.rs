use std::io::Write;
use std::time::SystemTime;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::{
    header::BoxHeader,
    path::ResourcePath,
    record::{RECORD_DIRECTORY, RECORD_FILE},
    EmbedKind, Record, ResourceBox, ResourceDir, ResourceFile,
};

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Serializing box failed. Box: '{1}'")]
    Io(#[source] std::io::Error, String),
}

pub(crate) trait Serialize {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;
}

/// Write a length-prefixed byte string.
fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    writer.write_u64::<LittleEndian>(bytes.len() as u64)?;
    writer.write_all(bytes)
}

impl<T: Serialize> Serialize for Vec<T> {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u64::<LittleEndian>(self.len() as u64)?;
        for item in self.iter() {
            item.write(writer)?;
        }
        Ok(())
    }
}

impl Serialize for str {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_bytes(writer, self.as_bytes())
    }
}

impl Serialize for String {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.as_str().write(writer)
    }
}

impl Serialize for ResourcePath {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.write(writer)
    }
}

impl Serialize for SystemTime {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        // Seconds are signed so timestamps before the epoch survive; nanos are always forward.
        let (secs, nanos) = match self.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => (d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                match d.subsec_nanos() {
                    0 => (-(d.as_secs() as i64), 0),
                    n => (-(d.as_secs() as i64) - 1, 1_000_000_000 - n),
                }
            }
        };
        writer.write_i64::<LittleEndian>(secs)?;
        writer.write_u32::<LittleEndian>(nanos)
    }
}

impl Serialize for EmbedKind {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(self.id())
    }
}

impl Serialize for ResourceFile {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(RECORD_FILE)?;

        self.path.write(writer)?;
        self.mod_time.write(writer)?;
        write_bytes(writer, &self.content)
    }
}

impl Serialize for ResourceDir {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(RECORD_DIRECTORY)?;

        self.path.write(writer)?;
        self.mod_time.write(writer)?;
        self.child_dirs.write(writer)
    }
}

impl Serialize for Record {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Record::File(file) => file.write(writer),
            Record::Directory(dir) => dir.write(writer),
        }
    }
}

impl Serialize for BoxHeader {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.magic_bytes)?;
        writer.write_u8(self.version)
    }
}

impl Serialize for ResourceBox {
    fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name.write(writer)?;
        self.created_at.write(writer)?;
        self.embed_kind.write(writer)?;

        writer.write_u64::<LittleEndian>((self.dirs.len() + self.files.len()) as u64)?;
        for dir in self.dirs.values() {
            dir.write(writer)?;
        }
        for file in self.files.values() {
            file.write(writer)?;
        }
        Ok(())
    }
}

/// Serialize a box into a self-describing blob.
///
/// The output depends only on the value of `rbox`: directories are written
/// before files and both are ordered by path.
pub fn encode(rbox: &ResourceBox) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(rbox.content_len() as usize + 1024);

    BoxHeader::new()
        .write(&mut buf)
        .and_then(|_| rbox.write(&mut buf))
        .map_err(|e| EncodeError::Io(e, rbox.name.clone()))?;

    tracing::debug!(
        name = %rbox.name,
        bytes = buf.len(),
        dirs = rbox.dirs.len(),
        files = rbox.files.len(),
        "encoded box"
    );

    Ok(buf)
}
