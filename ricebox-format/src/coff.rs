//! Wrapping blobs in COFF objects, and finding them again.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use object::pe::{IMAGE_FILE_MACHINE_AMD64, IMAGE_FILE_MACHINE_I386};
use object::write::{self, Mangling, StandardSection, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, Object as _, ObjectSection as _, ObjectSymbol as _,
    SymbolFlags, SymbolKind, SymbolScope,
};

use crate::names::{begin_symbol, end_symbol, BEGIN_SYMBOL_PREFIX};

/// NUL bytes placed between the blob and the end symbol.
pub const PADDING: [u8; 2] = [0, 0];

/// Extension of the emitted object files, picked up by the Go toolchain.
pub const SYSO_EXTENSION: &str = "rice-box.syso";

/// A target architecture an object is emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    I386,
    Amd64,
}

impl Arch {
    /// Every architecture an object is emitted for, in emission order.
    pub const ALL: [Arch; 2] = [Arch::I386, Arch::Amd64];

    /// The Go architecture name, used in file names.
    pub fn tag(self) -> &'static str {
        match self {
            Arch::I386 => "386",
            Arch::Amd64 => "amd64",
        }
    }

    /// The COFF file header machine field for this architecture.
    pub fn machine(self) -> u16 {
        match self {
            Arch::I386 => IMAGE_FILE_MACHINE_I386,
            Arch::Amd64 => IMAGE_FILE_MACHINE_AMD64,
        }
    }

    fn architecture(self) -> Architecture {
        match self {
            Arch::I386 => Architecture::I386,
            Arch::Amd64 => Architecture::X86_64,
        }
    }

    fn from_architecture(architecture: Architecture) -> Option<Arch> {
        match architecture {
            Architecture::I386 => Some(Arch::I386),
            Architecture::X86_64 => Some(Arch::Amd64),
            _ => None,
        }
    }

    /// `<box_filename>_<tag>.rice-box.syso`
    pub fn syso_filename(self, box_filename: &str) -> String {
        format!("{}_{}.{}", box_filename, self.tag(), SYSO_EXTENSION)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported architecture: {0}")]
pub struct ParseArchError(String);

impl FromStr for Arch {
    type Err = ParseArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "386" => Ok(Arch::I386),
            "amd64" => Ok(Arch::Amd64),
            _ => Err(ParseArchError(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("Building {1} COFF object failed.")]
    Object(#[source] write::Error, Arch),

    #[error("Writing {2} COFF object failed. Path: '{}'", .1.display())]
    Write(#[source] std::io::Error, PathBuf, Arch),
}

/// A serialized COFF object holding one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoffObject {
    pub arch: Arch,
    pub begin_symbol: String,
    pub end_symbol: String,
    pub bytes: Vec<u8>,
}

impl CoffObject {
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EmitError> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes)
            .map_err(|e| EmitError::Write(e, path.to_path_buf(), self.arch))?;
        tracing::debug!(
            path = %path.display(),
            arch = %self.arch,
            bytes = self.bytes.len(),
            "wrote object"
        );
        Ok(())
    }
}

/// Build an object with a single read-only data section holding `blob` followed
/// by [`PADDING`].
///
/// `_bricebox_<stem>` marks the first byte of the blob and `_ericebox_<stem>`
/// the byte after the padding, so the distance between them is
/// `blob.len() + 2`.
pub fn emit(blob: &[u8], stem: &str, arch: Arch) -> Result<CoffObject, EmitError> {
    let mut obj = write::Object::new(BinaryFormat::Coff, arch.architecture(), Endianness::Little);
    // No leading underscore on 386; the symbol names already carry one.
    obj.set_mangling(Mangling::None);

    let section = obj.section_id(StandardSection::ReadOnlyData);
    let begin = obj.append_section_data(section, blob, 1);
    let end = obj.append_section_data(section, &PADDING, 1) + PADDING.len() as u64;

    let begin_name = begin_symbol(stem);
    let end_name = end_symbol(stem);

    obj.add_symbol(write::Symbol {
        name: begin_name.clone().into_bytes(),
        value: begin,
        size: blob.len() as u64,
        kind: SymbolKind::Data,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Section(section),
        flags: SymbolFlags::None,
    });
    obj.add_symbol(write::Symbol {
        name: end_name.clone().into_bytes(),
        value: end,
        size: 0,
        kind: SymbolKind::Data,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Section(section),
        flags: SymbolFlags::None,
    });

    let bytes = obj.write().map_err(|e| EmitError::Object(e, arch))?;

    tracing::debug!(
        arch = %arch,
        symbol = %begin_name,
        blob = blob.len(),
        bytes = bytes.len(),
        "emitted object"
    );

    Ok(CoffObject {
        arch,
        begin_symbol: begin_name,
        end_symbol: end_name,
        bytes,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not parse object file.")]
    Parse(#[source] object::read::Error),

    #[error("Object file is not COFF (found {0:?}).")]
    NotCoff(BinaryFormat),

    #[error("Symbol not found in object. Symbol: '{0}'")]
    MissingSymbol(String),

    #[error("Symbol is not defined in a section. Symbol: '{0}'")]
    MissingSection(String),

    #[error("Symbols '{0}' and '{1}' do not bracket a range of the same section")]
    InvalidRange(String, String),
}

/// The span between a begin/end symbol pair found in an object file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedBlob {
    /// Symbol stem, taken from the begin symbol's name.
    pub stem: String,

    /// The file header's machine field.
    pub machine: u16,

    pub arch: Option<Arch>,

    /// Offset of the begin symbol within its section.
    pub begin: u64,

    /// Offset of the end symbol within its section.
    pub end: u64,

    /// Every byte from the begin symbol up to the end symbol, padding included.
    pub data: Vec<u8>,
}

/// Locate the `_bricebox_*`/`_ericebox_*` pair in a COFF object and copy out the
/// bytes between them.
pub fn extract(bytes: &[u8]) -> Result<EmbeddedBlob, ExtractError> {
    let file = object::File::parse(bytes).map_err(ExtractError::Parse)?;
    if file.format() != BinaryFormat::Coff {
        return Err(ExtractError::NotCoff(file.format()));
    }

    let begin = file
        .symbols()
        .find(|x| {
            x.name()
                .map(|n| n.starts_with(BEGIN_SYMBOL_PREFIX))
                .unwrap_or(false)
        })
        .ok_or_else(|| ExtractError::MissingSymbol(format!("{}*", BEGIN_SYMBOL_PREFIX)))?;
    let begin_name = begin.name().map_err(ExtractError::Parse)?.to_string();
    let stem = begin_name[BEGIN_SYMBOL_PREFIX.len()..].to_string();

    let end_name = end_symbol(&stem);
    let end = file
        .symbols()
        .find(|x| x.name().map(|n| n == end_name).unwrap_or(false))
        .ok_or_else(|| ExtractError::MissingSymbol(end_name.clone()))?;

    let section_index = begin
        .section_index()
        .ok_or_else(|| ExtractError::MissingSection(begin_name.clone()))?;
    if end.section_index() != Some(section_index) {
        return Err(ExtractError::InvalidRange(begin_name, end_name));
    }

    let section = file
        .section_by_index(section_index)
        .map_err(ExtractError::Parse)?;
    let section_data = section.data().map_err(ExtractError::Parse)?;

    let begin_offset = begin.address().wrapping_sub(section.address());
    let end_offset = end.address().wrapping_sub(section.address());
    if begin_offset > end_offset || end_offset > section_data.len() as u64 {
        return Err(ExtractError::InvalidRange(begin_name, end_name));
    }

    let machine = u16::from_le_bytes([bytes[0], bytes[1]]);

    Ok(EmbeddedBlob {
        stem,
        machine,
        arch: Arch::from_architecture(file.architecture()),
        begin: begin_offset,
        end: end_offset,
        data: section_data[begin_offset as usize..end_offset as usize].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_tags() {
        assert_eq!("386".parse::<Arch>().unwrap(), Arch::I386);
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::Amd64);
        assert!("arm64".parse::<Arch>().is_err());
        assert_eq!(
            Arch::Amd64.syso_filename("my.assets-v2"),
            "my.assets-v2_amd64.rice-box.syso"
        );
        assert_eq!(Arch::I386.syso_filename("x"), "x_386.rice-box.syso");
    }

    #[test]
    fn machine_field() {
        let blob = b"blob";
        let i386 = emit(blob, "assets", Arch::I386).unwrap();
        let amd64 = emit(blob, "assets", Arch::Amd64).unwrap();

        assert_eq!(u16::from_le_bytes([amd64.bytes[0], amd64.bytes[1]]), 0x8664);
        assert_eq!(u16::from_le_bytes([i386.bytes[0], i386.bytes[1]]), 0x014c);
    }

    #[test]
    fn symbols_bracket_blob_and_padding() {
        let blob = b"\xffRBX some serialized box".to_vec();
        for arch in Arch::ALL {
            let obj = emit(&blob, "my_assets_v2", arch).unwrap();
            assert_eq!(obj.begin_symbol, "_bricebox_my_assets_v2");
            assert_eq!(obj.end_symbol, "_ericebox_my_assets_v2");

            let found = extract(&obj.bytes).unwrap();
            assert_eq!(found.stem, "my_assets_v2");
            assert_eq!(found.arch, Some(arch));
            assert_eq!(found.machine, arch.machine());
            assert_eq!(found.begin, 0);
            assert_eq!(found.end - found.begin, blob.len() as u64 + 2);

            let mut expected = blob.clone();
            expected.extend_from_slice(&PADDING);
            assert_eq!(found.data, expected);
        }
    }

    #[test]
    fn symbols_are_external() {
        let obj = emit(b"x", "assets", Arch::I386).unwrap();
        let file = object::File::parse(&*obj.bytes).unwrap();
        for name in ["_bricebox_assets", "_ericebox_assets"] {
            let symbol = file
                .symbols()
                .find(|x| x.name().map(|n| n == name).unwrap_or(false))
                .unwrap_or_else(|| panic!("missing {}", name));
            assert!(symbol.is_global());
            assert!(symbol.is_definition());
        }
    }

    #[test]
    fn empty_blob() {
        let obj = emit(&[], "empty", Arch::Amd64).unwrap();
        let found = extract(&obj.bytes).unwrap();
        assert_eq!(found.data, PADDING.to_vec());
        assert_eq!(found.end, 2);
    }

    #[test]
    fn output_is_deterministic() {
        let blob = vec![7u8; 4096];
        for arch in Arch::ALL {
            let a = emit(&blob, "assets", arch).unwrap();
            let b = emit(&blob, "assets", arch).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn write_file_reports_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let obj = emit(b"x", "assets", Arch::I386).unwrap();

        let path = temp_dir.path().join(Arch::I386.syso_filename("assets"));
        obj.write_file(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), obj.bytes);

        let bad = temp_dir.path().join("missing").join("x.syso");
        match obj.write_file(&bad) {
            Err(EmitError::Write(_, path, arch)) => {
                assert_eq!(path, bad);
                assert_eq!(arch, Arch::I386);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn extract_rejects_non_coff() {
        assert!(extract(b"definitely not an object file").is_err());
    }
}
