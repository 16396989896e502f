//! Protected byte ranges of the working text.
//!
//! Code spans are rewritten first and recorded here; later passes only
//! tokenize what lies outside of them. The set is a plain value threaded
//! from one pass into the next.

use std::ops::Range;

/// Half-open byte range that later passes must not re-tokenize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub start: usize,
    pub end: usize,
}

impl ProtectedSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A replacement of one byte range of the working text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub range: Range<usize>,
    pub replacement: String,
}

/// A stretch of the working text, either protected or free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub range: Range<usize>,
    pub protected: bool,
}

/// Sorted, non-overlapping protected spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedSpans {
    spans: Vec<ProtectedSpan>,
}

impl ProtectedSpans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtectedSpan> {
        self.spans.iter()
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Whether `range` shares at least one byte with a protected span.
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.spans
            .iter()
            .any(|span| span.start < range.end && range.start < span.end)
    }

    /// Cut `0..len` into alternating free and protected segments.
    pub fn segments(&self, len: usize) -> Vec<Segment> {
        let mut segments = Vec::with_capacity(self.spans.len() * 2 + 1);
        let mut pos = 0;

        for span in &self.spans {
            if span.start > pos {
                segments.push(Segment {
                    range: pos..span.start,
                    protected: false,
                });
            }
            segments.push(Segment {
                range: span.range(),
                protected: true,
            });
            pos = span.end;
        }
        if pos < len {
            segments.push(Segment {
                range: pos..len,
                protected: false,
            });
        }

        segments
    }

    /// Apply `splices` to `text` by index and protect every replacement.
    ///
    /// Splices must be sorted, must not overlap each other, and must not
    /// touch an existing protected span. Existing spans are shifted to their
    /// new positions.
    pub fn splice(&self, text: &str, splices: Vec<Splice>) -> (String, ProtectedSpans) {
        let mut out = String::with_capacity(text.len());
        let mut spans = Vec::with_capacity(self.spans.len() + splices.len());
        let mut old = self.spans.iter().peekable();
        let mut cursor = 0;

        for splice in splices {
            debug_assert!(splice.range.start >= cursor, "splices must be sorted");
            debug_assert!(!self.overlaps(&splice.range), "splice touches a protected span");

            while let Some(span) = old.next_if(|s| s.end <= splice.range.start) {
                spans.push(shifted(span, out.len(), cursor));
            }
            out.push_str(&text[cursor..splice.range.start]);

            let start = out.len();
            out.push_str(&splice.replacement);
            spans.push(ProtectedSpan {
                start,
                end: out.len(),
            });
            cursor = splice.range.end;
        }

        for span in old {
            spans.push(shifted(span, out.len(), cursor));
        }
        out.push_str(&text[cursor..]);

        (out, ProtectedSpans { spans })
    }
}

/// Move `span` from source position `cursor` to output position `out_len`.
fn shifted(span: &ProtectedSpan, out_len: usize, cursor: usize) -> ProtectedSpan {
    ProtectedSpan {
        start: out_len + (span.start - cursor),
        end: out_len + (span.end - cursor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splice(range: Range<usize>, replacement: &str) -> Splice {
        Splice {
            range,
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn test_splice_records_spans() {
        let (text, spans) = ProtectedSpans::new().splice("a `x` b", vec![splice(2..5, "[X]")]);
        assert_eq!(text, "a [X] b");
        assert_eq!(spans.iter().next(), Some(&ProtectedSpan { start: 2, end: 5 }));
    }

    #[test]
    fn test_splice_is_index_based() {
        // The second occurrence is replaced, not the first
        let (text, _) = ProtectedSpans::new().splice("`a` `a`", vec![splice(4..7, "B")]);
        assert_eq!(text, "`a` B");
    }

    #[test]
    fn test_splice_shifts_existing_spans() {
        let (text, spans) = ProtectedSpans::new().splice("xx CODE yy", vec![splice(3..7, "C")]);
        assert_eq!(text, "xx C yy");

        let (text, spans) = spans.splice(&text, vec![splice(0..2, "LONGER")]);
        assert_eq!(text, "LONGER C yy");
        let ranges: Vec<_> = spans.iter().map(|s| s.range()).collect();
        assert_eq!(ranges, vec![0..6, 7..8]);
        assert_eq!(&text[7..8], "C");
    }

    #[test]
    fn test_segments_alternate() {
        let (text, spans) = ProtectedSpans::new().splice("ab cd ef", vec![splice(3..5, "CD")]);
        let segments = spans.segments(text.len());
        assert_eq!(
            segments,
            vec![
                Segment { range: 0..3, protected: false },
                Segment { range: 3..5, protected: true },
                Segment { range: 5..8, protected: false },
            ]
        );
    }

    #[test]
    fn test_protection_queries() {
        let (_, spans) = ProtectedSpans::new().splice("0123456789", vec![splice(2..6, "abcd")]);
        assert!(spans.overlaps(&(1..3)));
        assert!(!spans.overlaps(&(6..8)));
    }
}
