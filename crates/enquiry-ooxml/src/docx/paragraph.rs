/*
 * paragraph.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Reading and rewriting the text of `w:p` paragraphs.
//!
//! A paragraph's text is spread over runs, often split mid-word by the
//! editor. Rewriting puts the whole new text into the first text run, which
//! keeps its character formatting, and strips the text from the other runs.
//! Runs holding anything besides text, such as drawings, are kept.

use crate::xml::{XmlElement, XmlNode};

const TEXT_PARTS: &[&str] = &["w:t", "w:tab", "w:br", "w:cr"];

/// Plain text of a paragraph. Tabs and breaks become `\t` and `\n`.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    collect_text(paragraph, &mut text);
    text
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in element.elements() {
        match child.name.as_str() {
            "w:pPr" | "w:rPr" | "w:del" => {}
            "w:r" => {
                for part in child.elements() {
                    match part.name.as_str() {
                        "w:t" => out.push_str(&part.text()),
                        "w:tab" => out.push('\t'),
                        "w:br" | "w:cr" => out.push('\n'),
                        _ => {}
                    }
                }
            }
            _ => collect_text(child, out),
        }
    }
}

/// Replace the text of a paragraph, keeping its properties and the
/// formatting of its first text run.
pub fn set_paragraph_text(paragraph: &mut XmlElement, text: &str) {
    let mut placed = false;
    rewrite_runs(paragraph, text, &mut placed);
    if !placed {
        let mut run = XmlElement::new("w:r");
        let mark = paragraph
            .child("w:pPr")
            .and_then(|p| p.child("w:rPr"))
            .cloned();
        if let Some(mark) = mark {
            run.children.push(XmlNode::Element(mark));
        }
        append_text(&mut run, text);
        paragraph.children.push(XmlNode::Element(run));
    }
}

fn rewrite_runs(element: &mut XmlElement, text: &str, placed: &mut bool) {
    element.children.retain_mut(|node| {
        let XmlNode::Element(child) = node else {
            return true;
        };
        match child.name.as_str() {
            "w:pPr" | "w:rPr" | "w:del" => true,
            "w:r" => {
                if !is_text_run(child) {
                    return true;
                }
                child.children.retain(|n| !is_text_part(n));
                if !*placed {
                    *placed = true;
                    append_text(child, text);
                    return true;
                }
                child.elements().any(|e| e.name != "w:rPr")
            }
            _ => {
                rewrite_runs(child, text, placed);
                true
            }
        }
    });
}

fn is_text_part(node: &XmlNode) -> bool {
    matches!(node, XmlNode::Element(e) if TEXT_PARTS.contains(&e.name.as_str()))
}

fn is_text_run(run: &XmlElement) -> bool {
    run.children.iter().any(is_text_part)
}

/// Line feeds become `w:br`, tabs `w:tab`.
fn append_text(run: &mut XmlElement, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run.children.push(XmlNode::Element(XmlElement::new("w:br")));
        }
        for (j, segment) in line.split('\t').enumerate() {
            if j > 0 {
                run.children.push(XmlNode::Element(XmlElement::new("w:tab")));
            }
            if !segment.is_empty() {
                run.children.push(XmlNode::Element(
                    XmlElement::new("w:t")
                        .with_attr("xml:space", "preserve")
                        .with_text(segment),
                ));
            }
        }
    }
}

/// Properties of the first run, for copying formatting.
pub fn first_run_properties(paragraph: &XmlElement) -> Option<XmlElement> {
    first_run(paragraph).and_then(|r| r.child("w:rPr").cloned())
}

fn first_run(element: &XmlElement) -> Option<&XmlElement> {
    for child in element.elements() {
        match child.name.as_str() {
            "w:r" => return Some(child),
            "w:pPr" | "w:del" => {}
            _ => {
                if let Some(run) = first_run(child) {
                    return Some(run);
                }
            }
        }
    }
    None
}

/// Set (or clear) the properties of every run of a paragraph.
pub fn set_run_properties(element: &mut XmlElement, properties: Option<&XmlElement>) {
    for child in element.elements_mut() {
        match child.name.as_str() {
            "w:r" => set_leading_child(child, "w:rPr", properties),
            "w:pPr" | "w:del" => {}
            _ => set_run_properties(child, properties),
        }
    }
}

/// Replace the properties element that must come first in `element`.
pub fn set_leading_child(element: &mut XmlElement, name: &str, value: Option<&XmlElement>) {
    element.remove_children(name);
    if let Some(value) = value {
        element.children.insert(0, XmlNode::Element(value.clone()));
    }
}
