use quick_xml::escape::escape;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

use super::document::{ChannelDeclaration, ProgrammeEntry, XmltvDocument};
use crate::errors::AppResult;
use crate::utils::atomic_file::replace_file;

/// Whether `c` may appear in an XML 1.0 document
pub fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

/// Escape text or attribute content, dropping characters XML 1.0 cannot
/// represent at all (C0 controls, U+FFFE, U+FFFF)
fn xml_escape(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        return escape(value);
    }
    let cleaned: String = value.chars().filter(|c| is_xml_char(*c)).collect();
    warn!(
        "Dropped {} invalid XML characters from {:?}",
        value.chars().count() - cleaned.chars().count(),
        cleaned
    );
    Cow::Owned(escape(&cleaned).into_owned())
}

/// Serialize a document to XMLTV text
pub fn render(document: &XmltvDocument) -> String {
    let mut xml = String::with_capacity(256 + document.programmes.len() * 512);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<!DOCTYPE tv SYSTEM \"{}\">\n", xml_escape(&document.dtd)));
    xml.push_str(&format!(
        "<tv date=\"{}\" source-info-name=\"{}\" generator-info-name=\"{}\" generator-info-url=\"{}\">\n",
        xml_escape(&document.date),
        xml_escape(&document.source_info_name),
        xml_escape(&document.generator_info_name),
        xml_escape(&document.generator_info_url),
    ));

    for channel in &document.channels {
        push_channel(&mut xml, channel);
    }
    for programme in &document.programmes {
        push_programme(&mut xml, programme);
    }

    xml.push_str("</tv>\n");
    xml
}

fn push_channel(xml: &mut String, channel: &ChannelDeclaration) {
    xml.push_str(&format!("  <channel id=\"{}\">\n", xml_escape(&channel.id)));
    xml.push_str(&format!(
        "    <display-name lang=\"{}\">{}</display-name>\n",
        xml_escape(&channel.lang),
        xml_escape(&channel.display_name)
    ));
    if let Some(icon) = &channel.icon {
        xml.push_str(&format!("    <icon src=\"{}\"/>\n", xml_escape(icon)));
    }
    xml.push_str("  </channel>\n");
}

fn push_programme(xml: &mut String, programme: &ProgrammeEntry) {
    xml.push_str(&format!(
        "  <programme start=\"{}\" stop=\"{}\" channel=\"{}\">\n",
        xml_escape(&programme.start),
        xml_escape(&programme.stop),
        xml_escape(&programme.channel)
    ));
    let lang = xml_escape(&programme.lang);
    xml.push_str(&format!(
        "    <title lang=\"{}\">{}</title>\n",
        lang,
        xml_escape(&programme.title)
    ));
    xml.push_str(&format!(
        "    <desc lang=\"{}\">{}</desc>\n",
        lang,
        xml_escape(&programme.desc)
    ));

    xml.push_str("    <video>\n");
    xml.push_str("      <present>yes</present>\n");
    xml.push_str("      <colour>yes</colour>\n");
    xml.push_str("      <aspect>16:9</aspect>\n");
    xml.push_str(&format!(
        "      <quality>{}</quality>\n",
        programme.quality.as_str()
    ));
    xml.push_str("    </video>\n");

    xml.push_str("    <audio>\n");
    xml.push_str("      <present>yes</present>\n");
    xml.push_str("      <stereo>stereo</stereo>\n");
    xml.push_str("    </audio>\n");

    xml.push_str(&format!(
        "    <rating system=\"{}\">\n",
        xml_escape(&programme.rating_system)
    ));
    xml.push_str(&format!("      <value>{}</value>\n", xml_escape(&programme.rating)));
    xml.push_str("    </rating>\n");

    xml.push_str("  </programme>\n");
}

/// Render `document` and replace `path` with it atomically.
///
/// A failed run never leaves a truncated document behind. Returns the number
/// of bytes written.
pub fn write_document(document: &XmltvDocument, path: &Path) -> AppResult<u64> {
    let xml = render(document);
    replace_file(path, xml.as_bytes())?;

    debug!("Wrote {} bytes to {}", xml.len(), path.display());
    Ok(xml.len() as u64)
}
