// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// Half-open byte range of one markdown section within a body: from the start
/// of its heading line up to the next heading of equal-or-higher level (or end
/// of body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
    pub level: usize,
    /// First byte after the heading line.
    pub content_start: usize,
}

impl Section {
    pub fn content<'a>(&self, body: &'a str) -> &'a str {
        &body[self.content_start..self.end]
    }
}

/// Parse a heading line: 1-6 `#` characters followed by a space. Returns the
/// level and the heading text. `##` appearing as inline text mid-line is not
/// a heading; callers only pass whole lines, so inline occurrences never
/// reach here.
fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    rest.strip_prefix(' ').map(|text| (hashes, text.trim()))
}

/// Iterate `(byte_offset, line)` pairs over a body. Offsets index into `body`;
/// lines exclude their trailing newline.
fn lines_with_offsets(body: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    body.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.strip_suffix('\n').unwrap_or(raw))
    })
}

/// Locate the section whose heading text equals `name` (ASCII
/// case-insensitive). Returns `None` when no such heading exists at the start
/// of a line.
pub fn find(body: &str, name: &str) -> Option<Section> {
    let mut found: Option<Section> = None;

    for (offset, line) in lines_with_offsets(body) {
        let Some((level, text)) = heading(line) else {
            continue;
        };

        if let Some(section) = found.as_mut() {
            if level <= section.level {
                section.end = offset;
                return found;
            }
            continue;
        }

        if text.eq_ignore_ascii_case(name) {
            let content_start = (offset + line.len() + 1).min(body.len());
            found = Some(Section {
                start: offset,
                end: body.len(),
                level,
                content_start,
            });
        }
    }

    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "# Title\n\nIntro.\n\n## Requirements\n\n- fast\n\n## Slices\n\n### S1\n\n- [ ] T001: a\n\n## Release Notes\n\n- none\n";

    #[test]
    fn finds_section_range() {
        let sec = find(BODY, "Requirements").unwrap();
        assert_eq!(&BODY[sec.start..sec.end], "## Requirements\n\n- fast\n\n");
        assert_eq!(sec.level, 2);
        assert_eq!(sec.content(BODY), "\n- fast\n\n");
    }

    #[test]
    fn section_ends_at_equal_level_heading() {
        let sec = find(BODY, "Slices").unwrap();
        assert_eq!(
            &BODY[sec.start..sec.end],
            "## Slices\n\n### S1\n\n- [ ] T001: a\n\n"
        );
    }

    #[test]
    fn subheadings_stay_inside_their_section() {
        // The ### subheading must not terminate the ## section.
        let sec = find(BODY, "Slices").unwrap();
        assert!(BODY[sec.start..sec.end].contains("### S1"));
    }

    #[test]
    fn last_section_runs_to_end_of_body() {
        let sec = find(BODY, "Release Notes").unwrap();
        assert_eq!(&BODY[sec.start..sec.end], "## Release Notes\n\n- none\n");
    }

    #[test]
    fn top_level_heading_terminates_lower_sections() {
        let body = "## Slices\n\ntext\n\n# Appendix\n";
        let sec = find(body, "Slices").unwrap();
        assert_eq!(&body[sec.start..sec.end], "## Slices\n\ntext\n\n");
    }

    #[test]
    fn match_is_case_insensitive() {
        assert!(find(BODY, "slices").is_some());
        assert!(find(BODY, "SLICES").is_some());
    }

    #[test]
    fn inline_heading_text_does_not_match() {
        let body = "Some text mentioning ## Slices inline.\n\n## Other\n";
        assert!(find(body, "Slices").is_none());
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        let body = "##Slices\n";
        assert!(find(body, "Slices").is_none());
    }

    #[test]
    fn missing_section() {
        assert!(find(BODY, "Changelog").is_none());
    }

    #[test]
    fn heading_without_trailing_newline() {
        let body = "## Slices";
        let sec = find(body, "Slices").unwrap();
        assert_eq!(sec.start, 0);
        assert_eq!(sec.end, body.len());
        assert_eq!(sec.content(body), "");
    }
}
