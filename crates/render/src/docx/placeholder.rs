use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::RenderError;

/// A `<w:t>` text node; group 1 is its raw (escaped) text.
static TEXT_NODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("text node regex is valid")
});

/// A `<w:p>` start tag, end tag (group 1) or empty paragraph (group 2).
/// `<w:pPr>` and other `w:p...` elements do not match.
static PARAGRAPH_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/)?w:p(?:\s[^>]*?)?(/)?>").expect("paragraph tag regex is valid")
});

struct TextNode {
    /// Byte range of the whole element in the part.
    span: std::ops::Range<usize>,
    /// Unescaped text.
    text: String,
}

/// Number each text node's paragraph: the innermost `<w:p>` still open at
/// the node. Paragraphs nested in text boxes get their own number and
/// their enclosing paragraph keeps its text on both sides of the box.
/// Numbers follow the order paragraphs open in; nodes outside any
/// paragraph each get a number of their own.
fn assign_paragraphs(xml: &str, node_starts: &[usize]) -> Vec<usize> {
    let mut tags = PARAGRAPH_TAG_RE.captures_iter(xml).peekable();
    let mut open: Vec<usize> = Vec::new();
    let mut next = 0;
    let mut assigned = Vec::with_capacity(node_starts.len());

    for &start in node_starts {
        while let Some(caps) = tags.next_if(|c| c.get(0).is_some_and(|m| m.start() < start)) {
            if caps.get(1).is_some() {
                open.pop();
            } else if caps.get(2).is_none() {
                open.push(next);
                next += 1;
            }
        }
        let paragraph = match open.last() {
            Some(&p) => p,
            None => {
                next += 1;
                next - 1
            }
        };
        assigned.push(paragraph);
    }
    assigned
}

fn text_nodes(xml: &str) -> Vec<TextNode> {
    TEXT_NODE_RE
        .captures_iter(xml)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let raw = caps.get(1)?;
            Some(TextNode {
                span: whole.range(),
                text: unescape(raw.as_str()),
            })
        })
        .collect()
}

/// Node indices per paragraph, paragraphs in opening order and nodes in
/// document order.
fn group_by_paragraph(xml: &str, nodes: &[TextNode]) -> BTreeMap<usize, Vec<usize>> {
    let starts: Vec<usize> = nodes.iter().map(|n| n.span.start).collect();
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, paragraph) in assign_paragraphs(xml, &starts).into_iter().enumerate() {
        groups.entry(paragraph).or_default().push(index);
    }
    groups
}

/// A `{key}` tag found in the concatenated text of one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    /// Byte offset of `{`.
    start: usize,
    /// Byte offset just past `}`.
    end: usize,
    key: String,
}

pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .map_or_else(
                    || entity.strip_prefix('#').and_then(|d| d.parse::<u32>().ok()),
                    |h| u32::from_str_radix(h, 16).ok(),
                )
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a text node. Newlines in `text` become `<w:br/>` breaks within
/// the run.
fn text_element(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("<w:t xml:space=\"preserve\">{}</w:t>", escape(line)))
        .collect::<Vec<_>>()
        .join("<w:br/>")
}

fn find_tags(text: &str) -> Result<Vec<Tag>, RenderError> {
    let mut tags = Vec::new();
    let mut open: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match c {
            '{' => {
                if open.is_some() {
                    return Err(RenderError::Template(format!(
                        "unclosed tag before offset {i} in {text:?}"
                    )));
                }
                open = Some(i);
            }
            '}' => {
                let Some(start) = open.take() else {
                    return Err(RenderError::Template(format!(
                        "unopened tag at offset {i} in {text:?}"
                    )));
                };
                let key = text[start + 1..i].trim();
                if key.starts_with(['#', '/', '^']) {
                    return Err(RenderError::Template(format!(
                        "unsupported section tag {{{key}}}"
                    )));
                }
                tags.push(Tag {
                    start,
                    end: i + 1,
                    key: key.to_owned(),
                });
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        return Err(RenderError::Template(format!(
            "unclosed tag at offset {start} in {text:?}"
        )));
    }
    Ok(tags)
}

/// Replace every `{key}` in one paragraph's nodes.
///
/// A tag may span several nodes. Its value goes into the node holding the
/// opening brace; the nodes it crosses lose only the tag's text.
fn substitute_paragraph(
    texts: &mut [String],
    values: &BTreeMap<&str, String>,
) -> Result<bool, RenderError> {
    let joined: String = texts.concat();
    let tags = find_tags(&joined)?;
    if tags.is_empty() {
        return Ok(false);
    }

    let mut starts = Vec::with_capacity(texts.len());
    let mut offset = 0;
    for text in texts.iter() {
        starts.push(offset);
        offset += text.len();
    }
    let locate = |pos: usize| {
        let node = starts.partition_point(|&s| s <= pos) - 1;
        (node, pos - starts[node])
    };

    // Last to first, so earlier offsets stay valid.
    for tag in tags.iter().rev() {
        let value = values.get(tag.key.as_str()).map_or("", String::as_str);
        let (first, first_at) = locate(tag.start);
        let (last, last_at) = locate(tag.end - 1);
        if first == last {
            texts[first].replace_range(first_at..=last_at, value);
        } else {
            texts[last].replace_range(..=last_at, "");
            for text in &mut texts[first + 1..last] {
                text.clear();
            }
            texts[first].replace_range(first_at.., value);
        }
    }
    Ok(true)
}

/// Fill `{key}` placeholders in one WordprocessingML part.
///
/// Returns `None` when the part has no placeholders.
pub(crate) fn substitute_part(
    xml: &str,
    values: &BTreeMap<&str, String>,
) -> Result<Option<String>, RenderError> {
    let nodes = text_nodes(xml);

    let mut replaced: Vec<Option<String>> = vec![None; nodes.len()];
    let mut changed = false;
    for indices in group_by_paragraph(xml, &nodes).into_values() {
        let mut texts: Vec<String> = indices.iter().map(|&k| nodes[k].text.clone()).collect();
        if substitute_paragraph(&mut texts, values)? {
            changed = true;
            for (&k, text) in indices.iter().zip(texts) {
                if text != nodes[k].text {
                    replaced[k] = Some(text);
                }
            }
        }
    }

    if !changed {
        return Ok(None);
    }

    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;
    for (node, text) in nodes.iter().zip(&replaced) {
        if let Some(text) = text {
            out.push_str(&xml[cursor..node.span.start]);
            out.push_str(&text_element(text));
            cursor = node.span.end;
        }
    }
    out.push_str(&xml[cursor..]);
    Ok(Some(out))
}

/// Concatenated, unescaped text of every paragraph in a part, one entry per
/// paragraph that has text.
pub fn paragraph_texts(xml: &str) -> Vec<String> {
    let nodes = text_nodes(xml);
    group_by_paragraph(xml, &nodes)
        .into_values()
        .map(|indices| indices.iter().map(|&k| nodes[k].text.as_str()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn values() -> BTreeMap<&'static str, String> {
        let mut v = BTreeMap::new();
        v.insert("name", "Zaid".to_owned());
        v.insert("أسم", "Zaid".to_owned());
        v.insert("title", "Usul & Fiqh".to_owned());
        v
    }

    fn paragraph(runs: &[&str]) -> String {
        let runs: String = runs
            .iter()
            .map(|t| format!("<w:r><w:rPr><w:b/></w:rPr><w:t>{t}</w:t></w:r>"))
            .collect();
        format!("<w:p>{runs}</w:p>")
    }

    #[test]
    fn unescape_entities() {
        assert_eq!(unescape("a &amp; b &lt;c&gt; &#1575;&#x627;"), "a & b <c> اا");
        assert_eq!(unescape("lone & amp"), "lone & amp");
        assert_eq!(unescape("&bogus;"), "&bogus;");
    }

    #[test]
    fn simple_substitution() {
        let xml = paragraph(&["Dear {name}, welcome"]);
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert_eq!(paragraph_texts(&out), vec!["Dear Zaid, welcome"]);
        // Run formatting survives.
        assert!(out.contains("<w:rPr><w:b/></w:rPr>"));
    }

    #[test]
    fn arabic_key() {
        let xml = paragraph(&["{أسم}"]);
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert_eq!(paragraph_texts(&out), vec!["Zaid"]);
    }

    #[test]
    fn values_are_escaped() {
        let xml = paragraph(&["{title}"]);
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert!(out.contains("Usul &amp; Fiqh"));
        assert_eq!(paragraph_texts(&out), vec!["Usul & Fiqh"]);
    }

    #[test]
    fn tag_split_across_runs() {
        let xml = paragraph(&["Dear {na", "m", "e}!"]);
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert_eq!(paragraph_texts(&out), vec!["Dear Zaid!"]);
        assert_eq!(out.matches("<w:r>").count(), 3);
        assert!(out.contains(">Dear Zaid</w:t>"));
    }

    #[test]
    fn unknown_key_is_empty() {
        let xml = paragraph(&["[{missing}]"]);
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert_eq!(paragraph_texts(&out), vec!["[]"]);
    }

    #[test]
    fn no_tags_is_unchanged() {
        let xml = paragraph(&["plain text"]);
        assert!(substitute_part(&xml, &values()).unwrap().is_none());
    }

    #[test]
    fn tags_do_not_span_paragraphs() {
        let xml = format!("{}{}", paragraph(&["{name"]), paragraph(&["}"]));
        assert!(matches!(
            substitute_part(&xml, &values()),
            Err(RenderError::Template(_))
        ));
    }

    #[test]
    fn malformed_tags_are_errors() {
        for bad in ["{name", "name}", "{{name}}", "{#items}{/items}", "{^none}"] {
            let xml = paragraph(&[bad]);
            assert!(
                matches!(substitute_part(&xml, &values()), Err(RenderError::Template(_))),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn newlines_become_breaks() {
        let mut v = values();
        v.insert("name", "Zaid\nibn Thabit".to_owned());
        let out = substitute_part(&paragraph(&["{name}"]), &v).unwrap().unwrap();
        assert!(out.contains("Zaid</w:t><w:br/><w:t xml:space=\"preserve\">ibn Thabit"));
    }

    #[test]
    fn self_closing_and_similar_elements_are_ignored() {
        let xml = "<w:p><w:r><w:tab/><w:t>{name}</w:t></w:r></w:p><w:tbl></w:tbl>";
        let out = substitute_part(xml, &values()).unwrap().unwrap();
        assert!(out.contains("<w:tab/>"));
        assert!(out.contains("<w:tbl></w:tbl>"));
    }

    /// A paragraph whose run holds a text box with `inner` paragraphs,
    /// between `before` and `after` runs.
    fn with_text_box(before: &str, inner: &[&str], after: &str) -> String {
        let inner: String = inner.iter().map(|t| paragraph(&[t])).collect();
        format!(
            "<w:p w:rsidR=\"00A1\"><w:pPr><w:jc w:val=\"center\"/></w:pPr>\
             <w:r><w:t>{before}</w:t></w:r>\
             <w:r><w:drawing><wps:txbx><w:txbxContent>{inner}</w:txbxContent></wps:txbx></w:drawing></w:r>\
             <w:r><w:t>{after}</w:t></w:r></w:p>"
        )
    }

    #[test]
    fn text_box_paragraphs_are_separate() {
        let xml = with_text_box("Dear {na", &["{title}", "by {name}"], "me}!");
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert_eq!(
            paragraph_texts(&out),
            vec!["Dear Zaid!", "Usul & Fiqh", "by Zaid"]
        );
        assert!(out.contains("<w:txbxContent>"));
    }

    #[test]
    fn tag_inside_text_box_does_not_reach_outside() {
        let xml = with_text_box("", &["{name"], "}");
        assert!(matches!(
            substitute_part(&xml, &values()),
            Err(RenderError::Template(_))
        ));
    }

    #[test]
    fn empty_paragraphs_do_not_shift_grouping() {
        let xml = format!(
            "<w:p/>{}<w:p />{}",
            paragraph(&["{na", "me}"]),
            paragraph(&["{title}"])
        );
        let out = substitute_part(&xml, &values()).unwrap().unwrap();
        assert_eq!(paragraph_texts(&out), vec!["Zaid", "Usul & Fiqh"]);
    }

    proptest! {
        #[test]
        fn any_split_point_gives_the_same_text(
            prefix in "[a-z ]{0,10}",
            suffix in "[a-z ]{0,10}",
            cut in 1usize..6,
        ) {
            let tag = "{name}";
            let (left, right) = tag.split_at(cut);
            let xml = paragraph(&[&format!("{prefix}{left}"), &format!("{right}{suffix}")]);
            let out = substitute_part(&xml, &values()).unwrap().unwrap();
            prop_assert_eq!(paragraph_texts(&out), vec![format!("{prefix}Zaid{suffix}")]);
        }
    }
}
