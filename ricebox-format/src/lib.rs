//! Resource directories packed into blobs and wrapped in COFF objects, so the
//! system linker places them in the final binary.
//!
//! The build side walks a directory into a [`ResourceBox`], [`encode`]s it and
//! [`coff::emit`]s one object per architecture alongside a generated helper
//! source file. The runtime side [`decode`]s the bytes between the box symbols,
//! [links](ResourceBox::link) the tree and [`registry::register`]s it by name.

pub mod coff;
mod de;
pub mod embed;
pub mod fs;
mod header;
pub mod helper;
pub mod names;
pub mod path;
mod record;
pub mod registry;
mod resource;
mod ser;

pub use de::{decode, DecodeError};
pub use embed::{embed_package, EmbedError, Package};
pub use header::VERSION;
pub use path::ResourcePath;
pub use record::{EmbedKind, Record, ResourceDir, ResourceFile};
pub use resource::{LinkError, ResourceBox};
pub use ser::{encode, EncodeError};
