use std::path::PathBuf;

use miette::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum Error {
    #[error("Cannot read package directory `{}`", .path.display())]
    ReadPackageDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read source file `{}`", .path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No package clause found in `{}`", .path.display())]
    #[diagnostic(help("Pass --package-name to name the package explicitly."))]
    MissingPackageName { path: PathBuf },

    #[error("Invalid SOURCE_DATE_EPOCH `{value}`")]
    #[diagnostic(help("Set it to a whole number of seconds since the Unix epoch."))]
    SourceDateEpoch {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Cannot embed boxes for `{}`", .path.display())]
    #[diagnostic(help("Box names are directories relative to the package directory."))]
    Embed {
        path: PathBuf,
        #[source]
        source: ricebox_format::EmbedError,
    },

    #[error("Cannot remove generated file `{}`", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No embedded box found in `{}`", .path.display())]
    #[diagnostic(help("Is this a .rice-box.syso file written by `rice embed-syso`?"))]
    Extract {
        path: PathBuf,
        #[source]
        source: ricebox_format::coff::ExtractError,
    },

    #[error("Cannot decode box in `{}`", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: ricebox_format::DecodeError,
    },

    #[error("Box in `{}` is not a valid tree", .path.display())]
    Link {
        path: PathBuf,
        #[source]
        source: ricebox_format::LinkError,
    },

    #[error("Cannot write listing")]
    WriteOutput {
        #[source]
        source: std::io::Error,
    },
}
