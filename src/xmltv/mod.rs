//! XMLTV document assembly and serialization

pub mod builder;
pub mod document;
pub mod writer;

pub use builder::{ChannelSchedule, XmltvBuilder};
pub use document::{ChannelDeclaration, ProgrammeEntry, VideoQuality, XmltvDocument};
pub use writer::{render, write_document};
