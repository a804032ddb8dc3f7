//! Patch committer: replays an edit set against the original text.
//!
//! The output is produced in a single forward pass over the original text.
//! Insertions are ordered by `(at, side)` with `Left` before `Right`; equal
//! keys keep the order they were recorded in. Text covered by a removal is
//! skipped, everything else is copied verbatim.
//!
//! Contract violations (out-of-range offsets, offsets inside a UTF-8
//! sequence, overlapping removals, insertions strictly inside a removal) fail
//! the whole commit before any output is produced.

use crate::edit::{Edit, EditError, Side};

struct Insertion<'e> {
    at: usize,
    side: Side,
    text: &'e str,
}

#[derive(Clone, Copy)]
struct Removal {
    from: usize,
    to: usize,
}

/// Apply `edits` to `original` and return the patched text.
pub fn commit(original: &str, edits: &[Edit]) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(original.to_string());
    }

    let (insertions, removals) = plan(original, edits)?;

    let inserted: usize = insertions.iter().map(|i| i.text.len()).sum();
    let removed: usize = removals.iter().map(|r| r.to - r.from).sum();
    let mut out = Output {
        original,
        buf: String::with_capacity(original.len() + inserted - removed.min(original.len())),
        cursor: 0,
        removals: removals.into_iter().peekable(),
    };

    for insertion in &insertions {
        out.advance_to(insertion.at);
        out.buf.push_str(insertion.text);
    }
    out.advance_to(original.len());

    Ok(out.buf)
}

/// Validate and sort the edits into insertion and removal lists.
fn plan<'e>(
    original: &str,
    edits: &'e [Edit],
) -> Result<(Vec<Insertion<'e>>, Vec<Removal>), EditError> {
    let mut insertions = Vec::new();
    let mut removals = Vec::new();

    for edit in edits {
        match edit {
            Edit::Insert { at, side, text } => {
                check_offset(original, *at)?;
                insertions.push(Insertion {
                    at: *at,
                    side: *side,
                    text: text.as_str(),
                });
            }
            Edit::Remove { from, to } => {
                if from > to {
                    return Err(EditError::InvertedRange {
                        from: *from,
                        to: *to,
                    });
                }
                check_offset(original, *from)?;
                check_offset(original, *to)?;
                // Zero-width removals delete nothing and constrain nothing.
                if from < to {
                    removals.push(Removal {
                        from: *from,
                        to: *to,
                    });
                }
            }
        }
    }

    // Stable sorts keep recording order among equal keys.
    insertions.sort_by_key(|i| (i.at, i.side));
    removals.sort_by_key(|r| (r.from, r.to));

    for pair in removals.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        if second.from < first.to {
            return Err(EditError::OverlappingRemoves {
                first_from: first.from,
                first_to: first.to,
                second_from: second.from,
                second_to: second.to,
            });
        }
    }

    // Both lists are sorted, so one merge pass finds interior anchors.
    let mut pending = removals.iter().peekable();
    for insertion in &insertions {
        while pending.next_if(|r| r.to <= insertion.at).is_some() {}
        if let Some(r) = pending.peek() {
            if r.from < insertion.at && insertion.at < r.to {
                return Err(EditError::InsertInsideRemoval {
                    at: insertion.at,
                    from: r.from,
                    to: r.to,
                });
            }
        }
    }

    Ok((insertions, removals))
}

fn check_offset(original: &str, offset: usize) -> Result<(), EditError> {
    if offset > original.len() {
        return Err(EditError::OutOfBounds {
            offset,
            len: original.len(),
        });
    }
    if !original.is_char_boundary(offset) {
        return Err(EditError::NotCharBoundary { offset });
    }
    Ok(())
}

struct Output<'a, I: Iterator<Item = Removal>> {
    original: &'a str,
    buf: String,
    cursor: usize,
    removals: std::iter::Peekable<I>,
}

impl<I: Iterator<Item = Removal>> Output<'_, I> {
    /// Copy kept original text up to `target`, skipping removed ranges.
    ///
    /// `target` never lies strictly inside a removal (checked by `plan`), so
    /// every removal starting before `target` also ends at or before it.
    fn advance_to(&mut self, target: usize) {
        while self.cursor < target {
            match self.removals.next_if(|r| r.from < target) {
                Some(removal) => {
                    self.buf.push_str(&self.original[self.cursor..removal.from]);
                    self.cursor = removal.to;
                }
                None => {
                    self.buf.push_str(&self.original[self.cursor..target]);
                    self.cursor = target;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditSet;

    fn apply(original: &str, build: impl FnOnce(&mut EditSet)) -> Result<String, EditError> {
        let mut set = EditSet::new("doc.ts", original);
        build(&mut set);
        set.commit()
    }

    #[test]
    fn empty_set_is_identity() {
        assert_eq!(apply("anything at all", |_| {}).unwrap(), "anything at all");
        assert_eq!(apply("", |_| {}).unwrap(), "");
    }

    #[test]
    fn left_renders_before_right_at_shared_anchor() {
        let out = apply("xxxxxYYYY", |s| {
            s.insert_left(5, "A").insert_right(5, "B");
        })
        .unwrap();
        assert_eq!(out, "xxxxxABYYYY");
    }

    #[test]
    fn side_order_is_independent_of_recording_order() {
        let out = apply("0123456789", |s| {
            s.insert_right(5, ">").insert_left(5, "<");
        })
        .unwrap();
        assert_eq!(out, "01234<>56789");
    }

    #[test]
    fn same_side_insertions_keep_recording_order() {
        let out = apply("ab", |s| {
            s.insert_right(1, "1")
                .insert_left(1, "x")
                .insert_right(1, "2")
                .insert_left(1, "y");
        })
        .unwrap();
        assert_eq!(out, "axy12b");
    }

    #[test]
    fn insertion_at_removal_start_survives() {
        let statement = "return platformBrowserDynamic().bootstrapModule(AppModule);";
        let out = apply(statement, |s| {
            s.remove(0, statement.len()).insert_right(0, "REPLACED");
        })
        .unwrap();
        assert_eq!(out, "REPLACED");
    }

    #[test]
    fn insertion_at_removal_end_survives() {
        let out = apply("keep[drop]keep", |s| {
            s.insert_left(10, "!").remove(4, 10);
        })
        .unwrap();
        assert_eq!(out, "keep!keep");
    }

    #[test]
    fn edits_may_be_recorded_out_of_order() {
        let out = apply("alpha beta gamma", |s| {
            s.insert_left(16, "!")
                .remove(6, 11)
                .insert_right(0, ">> ");
        })
        .unwrap();
        assert_eq!(out, ">> alpha gamma!");
    }

    #[test]
    fn adjacent_removals_are_allowed() {
        let out = apply("abcdef", |s| {
            s.remove(2, 4).remove(1, 2).remove(4, 4);
        })
        .unwrap();
        assert_eq!(out, "aef");
    }

    #[test]
    fn overlapping_removals_fail_fast() {
        let err = apply("abcdef", |s| {
            s.remove(1, 4).remove(3, 5);
        })
        .unwrap_err();
        assert!(matches!(err, EditError::OverlappingRemoves { .. }));
    }

    #[test]
    fn insertion_strictly_inside_removal_fails_fast() {
        let err = apply("abcdef", |s| {
            s.remove(1, 5).insert_right(3, "X");
        })
        .unwrap_err();
        assert_eq!(err, EditError::InsertInsideRemoval { at: 3, from: 1, to: 5 });
    }

    #[test]
    fn out_of_bounds_offsets_fail_fast() {
        let err = apply("abc", |s| {
            s.insert_left(4, "x");
        })
        .unwrap_err();
        assert_eq!(err, EditError::OutOfBounds { offset: 4, len: 3 });

        let err = apply("abc", |s| {
            s.remove(1, 9);
        })
        .unwrap_err();
        assert!(matches!(err, EditError::OutOfBounds { offset: 9, .. }));
    }

    #[test]
    fn inverted_range_fails_fast() {
        let err = apply("abc", |s| {
            s.remove(2, 1);
        })
        .unwrap_err();
        assert_eq!(err, EditError::InvertedRange { from: 2, to: 1 });
    }

    #[test]
    fn offsets_inside_multibyte_chars_are_rejected() {
        let err = apply("é", |s| {
            s.insert_left(1, "x");
        })
        .unwrap_err();
        assert_eq!(err, EditError::NotCharBoundary { offset: 1 });
    }

    #[test]
    fn insertion_at_end_of_text() {
        let out = apply("abc", |s| {
            s.insert_right(3, "d").insert_left(3, "c");
        })
        .unwrap();
        assert_eq!(out, "abccd");
    }
}
