use crate::{
    programme::{ChannelConfig, Programme},
    time::to_xmltv_time,
};
use anyhow::{Context, Result};
use log::info;
use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};
use xml::{
    common::XmlVersion,
    writer::{EmitterConfig, XmlEvent as XmlWriteEvent},
};

/// Text used for `<desc>` when the source has nothing to say.
pub(crate) const DESC_PLACEHOLDER: &str = "No description available.";

/// Renders one channel and its programmes as an indented XMLTV document.
pub(crate) fn to_xmltv(channel: &ChannelConfig, programmes: &[Programme]) -> Result<String> {
    let mut buf = BufWriter::new(Vec::new());
    let mut writer = EmitterConfig::new()
        .perform_indent(true)
        .indent_string("  ")
        .create_writer(&mut buf);
    writer.write(XmlWriteEvent::StartDocument {
        version: XmlVersion::Version10,
        encoding: Some("utf-8"),
        standalone: None,
    })?;
    writer.write(
        XmlWriteEvent::start_element("tv").attr("generator-info-name", env!("CARGO_PKG_NAME")),
    )?;

    writer.write(XmlWriteEvent::start_element("channel").attr("id", &channel.id))?;
    writer.write(XmlWriteEvent::start_element("display-name"))?;
    writer.write(XmlWriteEvent::characters(&channel.display_name))?;
    writer.write(XmlWriteEvent::end_element())?;
    writer.write(XmlWriteEvent::end_element())?;

    for p in programmes {
        let start = to_xmltv_time(&p.start);
        let stop = to_xmltv_time(&p.stop);
        writer.write(
            XmlWriteEvent::start_element("programme")
                .attr("start", &start)
                .attr("stop", &stop)
                .attr("channel", &channel.id),
        )?;

        writer.write(XmlWriteEvent::start_element("title"))?;
        writer.write(XmlWriteEvent::characters(&p.title))?;
        writer.write(XmlWriteEvent::end_element())?;

        writer.write(XmlWriteEvent::start_element("desc"))?;
        writer.write(XmlWriteEvent::characters(
            p.description.as_deref().unwrap_or(DESC_PLACEHOLDER),
        ))?;
        writer.write(XmlWriteEvent::end_element())?;

        if let Some(n) = p.episode_number {
            writer.write(XmlWriteEvent::start_element("episode-num").attr("system", "xmltv_ns"))?;
            writer.write(XmlWriteEvent::characters(&n.to_string()))?;
            writer.write(XmlWriteEvent::end_element())?;
        }
        if let Some(icon) = &p.icon_url {
            writer.write(XmlWriteEvent::start_element("icon").attr("src", icon))?;
            writer.write(XmlWriteEvent::end_element())?;
        }

        writer.write(XmlWriteEvent::end_element())?;
    }

    writer.write(XmlWriteEvent::end_element())?;
    let mut xml = String::from_utf8(buf.into_inner()?)?;
    xml.push('\n');
    Ok(xml)
}

/// Writes the guide to `output_dir/<output_file_name>`, replacing any old one.
pub(crate) fn write_channel_file(
    output_dir: &Path,
    channel: &ChannelConfig,
    programmes: &[Programme],
) -> Result<PathBuf> {
    let xml = to_xmltv(channel, programmes)?;
    let path = output_dir.join(&channel.output_file_name);
    fs::write(&path, xml).with_context(|| format!("writing {}", path.display()))?;
    info!("XMLTV file generated: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::{America::New_York, UTC};
    use std::io::Cursor;
    use xml::{reader::XmlEvent as XmlReadEvent, EventReader};

    fn channel() -> ChannelConfig {
        ChannelConfig {
            id: "toonami".to_string(),
            display_name: "Toonami".to_string(),
            output_file_name: "toonami.xml".to_string(),
        }
    }

    fn programme(title: &str) -> Programme {
        Programme::new(
            title,
            UTC.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap(),
            UTC.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap(),
        )
    }

    fn element_names(xml: &str) -> Vec<String> {
        EventReader::new(Cursor::new(xml))
            .into_iter()
            .map(|e| e.expect("well-formed XML"))
            .filter_map(|e| match e {
                XmlReadEvent::StartElement { name, .. } => Some(name.local_name),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn document_shape() {
        let mut full = programme("Cowboy Bebop");
        full.description = Some("Asteroid Blues".to_string());
        full.episode_number = Some(1);
        full.icon_url = Some("https://img.example.test/cb.png".to_string());

        let xml = to_xmltv(&channel(), &[full]).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert_eq!(
            element_names(&xml),
            ["tv", "channel", "display-name", "programme", "title", "desc", "episode-num", "icon"]
        );
        assert!(xml.contains(r#"<channel id="toonami">"#));
        assert!(xml.contains(
            r#"<programme start="20250101100000 +0000" stop="20250101103000 +0000" channel="toonami">"#
        ));
        assert!(xml.contains(r#"<episode-num system="xmltv_ns">1</episode-num>"#));
        assert!(xml.contains(r#"src="https://img.example.test/cb.png""#));
        assert!(xml.contains("\n  <channel"));
    }

    #[test]
    fn missing_metadata() {
        let xml = to_xmltv(&channel(), &[programme("Outlaw Star")]).unwrap();
        let names = element_names(&xml);
        assert!(!names.iter().any(|n| n == "episode-num"));
        assert!(!names.iter().any(|n| n == "icon"));
        assert!(xml.contains(&format!("<desc>{DESC_PLACEHOLDER}</desc>")));
    }

    #[test]
    fn title_is_escaped_once() {
        let xml = to_xmltv(&channel(), &[programme("Tom & Jerry <Live>")]).unwrap();
        assert!(xml.contains("<title>Tom &amp; Jerry &lt;Live&gt;</title>"));
        assert!(!xml.contains("&amp;amp;"));
    }

    #[test]
    fn empty_guide_keeps_channel_element() {
        let xml = to_xmltv(&channel(), &[]).unwrap();
        assert_eq!(element_names(&xml), ["tv", "channel", "display-name"]);
    }

    #[test]
    fn offsets_follow_programme_zone() {
        let start = New_York.with_ymd_and_hms(2025, 7, 4, 20, 0, 0).unwrap();
        let p = Programme::new("Fireworks", start, start + chrono::Duration::hours(1));
        let xml = to_xmltv(&channel(), &[p]).unwrap();
        assert!(xml.contains(r#"start="20250704200000 -0400" stop="20250704210000 -0400""#));
    }

    #[test]
    fn file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toonami.xml");
        fs::write(&path, "stale").unwrap();

        let written = write_channel_file(dir.path(), &channel(), &[programme("Naruto")]).unwrap();
        assert_eq!(written, path);
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<title>Naruto</title>"));
        assert!(!contents.contains("stale"));
    }
}
