use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use std::time::{Duration, SystemTime};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{
    header::{BoxHeader, MAGIC_BYTES, VERSION},
    path::ResourcePath,
    record::{RECORD_DIRECTORY, RECORD_FILE},
    EmbedKind, Record, ResourceBox, ResourceDir, ResourceFile,
};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Could not read header. Is this a ricebox blob?")]
    MissingHeader(#[source] std::io::Error),

    #[error("Magic bytes invalid. Found: {0:02x?}")]
    InvalidMagic([u8; 4]),

    #[error("Unsupported blob version {0}.")]
    UnsupportedVersion(u8),

    #[error("Invalid box data (the records describing the tree are invalid).")]
    InvalidBody(#[source] std::io::Error),

    #[error("Unexpected data after the box at offset {0:#x}")]
    TrailingData(u64),
}

fn invalid_data<E>(error: E) -> std::io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    std::io::Error::new(std::io::ErrorKind::InvalidData, error)
}

pub(crate) trait DeserializeOwned {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self>
    where
        Self: Sized;
}

/// Read a length-prefixed byte string.
fn read_bytes<R: Read>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let len = reader.read_u64::<LittleEndian>()?;
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, buf.len()),
        ));
    }
    Ok(buf)
}

impl<T: DeserializeOwned> DeserializeOwned for Vec<T> {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let len = reader.read_u64::<LittleEndian>()?;
        // The count is untrusted; let the vector grow rather than preallocating it all.
        let mut buf = Vec::with_capacity(len.min(1024) as usize);
        for _ in 0..len {
            buf.push(T::deserialize_owned(reader)?);
        }
        Ok(buf)
    }
}

impl DeserializeOwned for String {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        String::from_utf8(read_bytes(reader)?).map_err(invalid_data)
    }
}

impl DeserializeOwned for ResourcePath {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let path = String::deserialize_owned(reader)?;
        ResourcePath::new(path).map_err(|e| e.as_io_error())
    }
}

impl DeserializeOwned for SystemTime {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let secs = reader.read_i64::<LittleEndian>()?;
        let nanos = reader.read_u32::<LittleEndian>()?;
        if nanos >= 1_000_000_000 {
            return Err(invalid_data(format!("invalid nanoseconds: {}", nanos)));
        }

        let time = if secs >= 0 {
            SystemTime::UNIX_EPOCH.checked_add(Duration::new(secs as u64, nanos))
        } else {
            SystemTime::UNIX_EPOCH
                .checked_sub(Duration::from_secs(secs.unsigned_abs()))
                .and_then(|x| x.checked_add(Duration::from_nanos(nanos as u64)))
        };

        time.ok_or_else(|| invalid_data(format!("timestamp out of range: {}s", secs)))
    }
}

impl DeserializeOwned for EmbedKind {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        Ok(EmbedKind::from_id(reader.read_u8()?))
    }
}

impl DeserializeOwned for ResourceFile {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let path = ResourcePath::deserialize_owned(reader)?;
        if path.is_root() {
            return Err(invalid_data("file record has an empty path"));
        }
        let mod_time = SystemTime::deserialize_owned(reader)?;
        let content = read_bytes(reader)?;

        Ok(ResourceFile {
            path,
            mod_time,
            content,
        })
    }
}

impl DeserializeOwned for ResourceDir {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let path = ResourcePath::deserialize_owned(reader)?;
        let mod_time = SystemTime::deserialize_owned(reader)?;
        let child_dirs = <Vec<ResourcePath>>::deserialize_owned(reader)?;

        Ok(ResourceDir {
            path,
            mod_time,
            child_dirs,
            child_files: vec![],
        })
    }
}

impl DeserializeOwned for Record {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let start = reader.stream_position()?;
        let ty = reader.read_u8()?;
        let record = match ty {
            RECORD_FILE => Record::File(ResourceFile::deserialize_owned(reader)?),
            RECORD_DIRECTORY => Record::Directory(ResourceDir::deserialize_owned(reader)?),
            _ => {
                return Err(invalid_data(format!(
                    "invalid or unsupported record type: {}",
                    ty
                )));
            }
        };
        let end = reader.stream_position()?;
        tracing::debug!(
            start = format_args!("{:#x}", start),
            end = format_args!("{:#x}", end),
            bytes = end - start,
            ty,
            path = %record.path(),
            "deserialized Record"
        );
        Ok(record)
    }
}

impl DeserializeOwned for BoxHeader {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let mut magic_bytes = [0u8; 4];
        reader.read_exact(&mut magic_bytes)?;
        let version = reader.read_u8()?;

        Ok(BoxHeader {
            magic_bytes,
            version,
        })
    }
}

impl DeserializeOwned for ResourceBox {
    fn deserialize_owned<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let name = String::deserialize_owned(reader)?;
        let created_at = SystemTime::deserialize_owned(reader)?;
        let embed_kind = EmbedKind::deserialize_owned(reader)?;
        let records = <Vec<Record>>::deserialize_owned(reader)?;

        let mut files = BTreeMap::new();
        let mut dirs = BTreeMap::new();
        for record in records {
            let path = record.path().clone();
            let existing = match record {
                Record::File(file) => files.insert(path.clone(), file).is_some(),
                Record::Directory(dir) => dirs.insert(path.clone(), dir).is_some(),
            };
            if existing {
                return Err(invalid_data(format!("duplicate record for path '{}'", path)));
            }
        }

        Ok(ResourceBox {
            name,
            created_at,
            embed_kind,
            files,
            dirs,
        })
    }
}

/// Decode a blob produced by [`encode`](crate::encode).
///
/// Trailing NUL bytes after the box are ignored, so the full span between the
/// begin and end symbols of an emitted object can be passed in unchanged. The
/// returned box is not linked yet.
pub fn decode(bytes: &[u8]) -> Result<ResourceBox, DecodeError> {
    let mut cursor = Cursor::new(bytes);

    let header = BoxHeader::deserialize_owned(&mut cursor).map_err(DecodeError::MissingHeader)?;
    if &header.magic_bytes != MAGIC_BYTES {
        return Err(DecodeError::InvalidMagic(header.magic_bytes));
    }
    if header.version != VERSION {
        return Err(DecodeError::UnsupportedVersion(header.version));
    }

    let rbox = ResourceBox::deserialize_owned(&mut cursor).map_err(DecodeError::InvalidBody)?;

    let end = cursor.position();
    if let Some(offset) = bytes[end as usize..].iter().position(|x| *x != 0) {
        return Err(DecodeError::TrailingData(end + offset as u64));
    }

    tracing::debug!(
        name = %rbox.name,
        bytes = end,
        padding = bytes.len() as u64 - end,
        "decoded box"
    );

    Ok(rbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode, ser::Serialize};

    fn sample_box() -> ResourceBox {
        let t = SystemTime::UNIX_EPOCH + Duration::new(1_600_000_000, 123_456_789);
        let mut rbox = ResourceBox::new("my.assets/v2", t);
        rbox.insert_dir(ResourceDir::new(ResourcePath::root(), t))
            .unwrap();
        rbox.insert_dir(ResourceDir::new(ResourcePath::new("a").unwrap(), t))
            .unwrap();
        rbox.insert_dir(ResourceDir::new(ResourcePath::new("a/b").unwrap(), t))
            .unwrap();
        rbox.insert_file(ResourceFile {
            path: ResourcePath::new("a/b/c.txt").unwrap(),
            mod_time: t,
            content: b"hello".to_vec(),
        })
        .unwrap();
        rbox.insert_file(ResourceFile {
            path: ResourcePath::new("empty").unwrap(),
            mod_time: SystemTime::UNIX_EPOCH - Duration::new(10, 5),
            content: vec![],
        })
        .unwrap();
        rbox
    }

    #[test]
    fn decode_restores_box() {
        let mut rbox = sample_box();
        let blob = encode(&rbox).unwrap();
        let mut decoded = decode(&blob).unwrap();

        decoded.link().unwrap();
        rbox.link().unwrap();
        assert_eq!(decoded, rbox);
        assert_eq!(decoded.embed_kind, EmbedKind::Syso);
        assert_eq!(
            decoded.root().unwrap().child_dirs,
            vec![ResourcePath::new("a").unwrap()]
        );
    }

    #[test]
    fn decode_tolerates_nul_tail() {
        let rbox = sample_box();
        let mut blob = encode(&rbox).unwrap();
        blob.extend_from_slice(&[0, 0]);
        assert_eq!(decode(&blob).unwrap().name, "my.assets/v2");
    }

    #[test]
    fn decode_rejects_trailing_garbage() {
        let rbox = sample_box();
        let mut blob = encode(&rbox).unwrap();
        let len = blob.len() as u64;
        blob.extend_from_slice(&[0, 7]);
        match decode(&blob) {
            Err(DecodeError::TrailingData(offset)) => assert_eq!(offset, len + 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let rbox = sample_box();
        let mut blob = encode(&rbox).unwrap();
        blob[1] = b'Z';
        assert!(matches!(decode(&blob), Err(DecodeError::InvalidMagic(_))));
    }

    #[test]
    fn decode_rejects_other_versions() {
        let rbox = sample_box();
        let mut blob = encode(&rbox).unwrap();
        blob[4] = 0xee;
        assert!(matches!(
            decode(&blob),
            Err(DecodeError::UnsupportedVersion(0xee))
        ));
    }

    #[test]
    fn decode_rejects_truncated_blob() {
        let rbox = sample_box();
        let blob = encode(&rbox).unwrap();
        assert!(matches!(
            decode(&blob[..blob.len() - 3]),
            Err(DecodeError::InvalidBody(_))
        ));
        assert!(matches!(
            decode(&blob[..2]),
            Err(DecodeError::MissingHeader(_))
        ));
    }

    #[test]
    fn unknown_record_type() {
        let mut buf = vec![];
        Record::File(ResourceFile {
            path: ResourcePath::new("x").unwrap(),
            mod_time: SystemTime::UNIX_EPOCH,
            content: vec![1, 2, 3],
        })
        .write(&mut buf)
        .unwrap();

        let record = Record::deserialize_owned(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(record.as_file().unwrap().content, vec![1, 2, 3]);

        buf[0] = 9;
        assert!(Record::deserialize_owned(&mut Cursor::new(&buf)).is_err());
    }
}
