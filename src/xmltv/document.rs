//! In-memory XMLTV document, assembled by the builder and rendered by the writer

/// Transmission quality of a programme entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoQuality {
    Sdtv,
    Hdtv,
}

impl VideoQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoQuality::Sdtv => "SDTV",
            VideoQuality::Hdtv => "HDTV",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmltvDocument {
    /// Generation time, `YYYY-MM-DD HH:MM:SS` in the output zone
    pub date: String,
    pub source_info_name: String,
    pub generator_info_name: String,
    pub generator_info_url: String,
    /// System identifier used in the DOCTYPE
    pub dtd: String,
    pub channels: Vec<ChannelDeclaration>,
    pub programmes: Vec<ProgrammeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDeclaration {
    pub id: String,
    pub display_name: String,
    pub lang: String,
    pub icon: Option<String>,
}

/// One `<programme>` element; times are already XMLTV formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammeEntry {
    pub start: String,
    pub stop: String,
    pub channel: String,
    pub title: String,
    pub desc: String,
    pub lang: String,
    pub quality: VideoQuality,
    pub rating_system: String,
    pub rating: String,
}

impl ProgrammeEntry {
    /// The same entry attributed to the HD simulcast
    pub fn hd_copy(&self, hd_channel: &str) -> Self {
        Self {
            channel: hd_channel.to_string(),
            quality: VideoQuality::Hdtv,
            ..self.clone()
        }
    }
}
