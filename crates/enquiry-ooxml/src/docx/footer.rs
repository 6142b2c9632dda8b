/*
 * footer.rs
 * Copyright (c) 2025 Posit, PBC
 */

use enquiry_template::FooterStamp;

use crate::xml::{XmlDocument, XmlElement};

pub const WORDPROCESSING_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const RELATIONSHIP_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const FOOTER_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// An empty footer part.
pub fn empty_footer() -> XmlDocument {
    XmlDocument::new(
        XmlElement::new("w:ftr")
            .with_attr("xmlns:w", WORDPROCESSING_NAMESPACE)
            .with_attr("xmlns:r", RELATIONSHIP_NAMESPACE),
    )
}

/// The right-aligned stamp paragraph. Sizes are in half-points.
pub fn stamp_paragraph(stamp: &FooterStamp) -> XmlElement {
    let half_points = (stamp.size * 2).to_string();
    let mut run = XmlElement::new("w:r").with_child(
        XmlElement::new("w:rPr")
            .with_child(
                XmlElement::new("w:rFonts")
                    .with_attr("w:ascii", stamp.font.as_str())
                    .with_attr("w:hAnsi", stamp.font.as_str())
                    .with_attr("w:cs", stamp.font.as_str()),
            )
            .with_child(XmlElement::new("w:sz").with_attr("w:val", half_points.as_str()))
            .with_child(XmlElement::new("w:szCs").with_attr("w:val", half_points.as_str())),
    );
    for (i, line) in stamp.text().lines().enumerate() {
        if i > 0 {
            run = run.with_child(XmlElement::new("w:br"));
        }
        run = run.with_child(
            XmlElement::new("w:t")
                .with_attr("xml:space", "preserve")
                .with_text(line),
        );
    }

    XmlElement::new("w:p")
        .with_child(
            XmlElement::new("w:pPr")
                .with_child(XmlElement::new("w:spacing").with_attr("w:after", "0"))
                .with_child(XmlElement::new("w:jc").with_attr("w:val", "right")),
        )
        .with_child(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::paragraph::paragraph_text;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stamp_paragraph() {
        let stamp = FooterStamp::new("Справка сформирована", "03.04.2025 09:15:00");
        let paragraph = stamp_paragraph(&stamp);
        assert_eq!(
            paragraph_text(&paragraph),
            "Справка сформирована\n03.04.2025 09:15:00"
        );
        let size = paragraph
            .find("w:sz")
            .and_then(|sz| sz.attr("w:val"))
            .map(str::to_string);
        assert_eq!(size.as_deref(), Some("18"));
        assert_eq!(
            paragraph.find("w:jc").and_then(|jc| jc.attr("w:val")),
            Some("right")
        );
    }
}
