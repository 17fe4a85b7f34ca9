mod clean;
mod embed_syso;
mod list;

pub use clean::run as clean;
pub use embed_syso::run as embed_syso;
pub use list::run as list;
