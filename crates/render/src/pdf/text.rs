use unicode_bidi::{BidiInfo, Level};

/// A directional run of a line, in left-to-right display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VisualRun<'a> {
    pub text: &'a str,
    pub rtl: bool,
}

/// Split `text` into directional runs in display order, treating it as a
/// right-to-left paragraph.
pub(crate) fn visual_runs(text: &str) -> Vec<VisualRun<'_>> {
    let info = BidiInfo::new(text, Some(Level::rtl()));
    let mut runs = Vec::new();
    for para in &info.paragraphs {
        let (levels, level_runs) = info.visual_runs(para, para.range.clone());
        for run in level_runs {
            runs.push(VisualRun {
                rtl: levels[run.start].is_rtl(),
                text: &text[run],
            });
        }
    }
    runs
}

/// Characters of `text` in display order. Right-to-left runs are reversed
/// character by character.
pub(crate) fn visual_string(text: &str) -> String {
    visual_runs(text)
        .into_iter()
        .map(|run| {
            if run.rtl {
                run.text.chars().rev().collect()
            } else {
                run.text.to_owned()
            }
        })
        .collect()
}
