//! `Range` header resolution

use crate::error::{MediaError, MediaResult};

const RANGE_UNIT: &str = "bytes";

/// Resolved byte window for one response
///
/// Computed per request from the file size on disk and discarded once the
/// response is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingPlan {
    /// First byte offset, inclusive
    pub start: u64,
    /// Last byte offset, inclusive
    pub end: u64,
    /// Size of the whole file
    pub total_size: u64,
    /// Number of bytes to send
    pub content_length: u64,
    /// Whether the response is partial content (206)
    pub partial: bool,
}

impl StreamingPlan {
    /// Plan covering the whole file
    #[must_use]
    pub const fn full(total_size: u64) -> Self {
        Self {
            start: 0,
            end: total_size.saturating_sub(1),
            total_size,
            content_length: total_size,
            partial: false,
        }
    }

    const fn partial(start: u64, end: u64, total_size: u64) -> Self {
        Self {
            start,
            end,
            total_size,
            content_length: end - start + 1,
            partial: true,
        }
    }

    /// `Content-Range` value, e.g. `bytes 200-499/1000`
    #[must_use]
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// Resolves an optional raw `Range` header against a file size
///
/// Accepts a single `bytes=<start>-<end?>` or `bytes=-<suffix>` range. The
/// unit is matched case-insensitively. An end past the last byte is clamped
/// to it.
///
/// # Errors
///
/// - [`MediaError::InvalidRange`] for malformed headers and multi-range lists
/// - [`MediaError::RangeNotSatisfiable`] when the start lies beyond the file,
///   the end precedes the start, or a suffix range is empty
pub fn resolve_request(file_size: u64, raw_range: Option<&str>) -> MediaResult<StreamingPlan> {
    let Some(raw) = raw_range.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(StreamingPlan::full(file_size));
    };

    let invalid = || MediaError::InvalidRange(raw.to_string());
    let unsatisfiable = || MediaError::RangeNotSatisfiable { size: file_size };

    let spec = strip_unit(raw).ok_or_else(invalid)?;
    if spec.contains(',') {
        return Err(invalid());
    }
    let (start_str, end_str) = spec.split_once('-').ok_or_else(invalid)?;
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        let suffix_len = parse_offset(end_str).ok_or_else(invalid)?;
        if suffix_len == 0 || file_size == 0 {
            return Err(unsatisfiable());
        }
        let start = file_size.saturating_sub(suffix_len);
        return Ok(StreamingPlan::partial(start, file_size - 1, file_size));
    }

    let start = parse_offset(start_str).ok_or_else(invalid)?;
    let end = if end_str.is_empty() {
        None
    } else {
        Some(parse_offset(end_str).ok_or_else(invalid)?)
    };

    if start >= file_size {
        return Err(unsatisfiable());
    }
    let last = file_size - 1;
    let end = end.map_or(last, |e| e.min(last));
    if end < start {
        return Err(unsatisfiable());
    }

    Ok(StreamingPlan::partial(start, end, file_size))
}

fn strip_unit(raw: &str) -> Option<&str> {
    let (unit, spec) = raw.split_once('=')?;
    unit.trim().eq_ignore_ascii_case(RANGE_UNIT).then_some(spec)
}

fn parse_offset(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan(size: u64, header: &str) -> MediaResult<StreamingPlan> {
        resolve_request(size, Some(header))
    }

    #[test]
    fn test_no_header_serves_full_file() {
        let plan = resolve_request(1000, None).unwrap();
        assert_eq!(
            (plan.start, plan.end, plan.total_size, plan.content_length),
            (0, 999, 1000, 1000)
        );
        assert!(!plan.partial);
    }

    #[test]
    fn test_blank_header_serves_full_file() {
        let plan = resolve_request(1000, Some("  ")).unwrap();
        assert!(!plan.partial);
        assert_eq!(plan.content_length, 1000);
    }

    #[test]
    fn test_empty_file_without_range() {
        let plan = resolve_request(0, None).unwrap();
        assert_eq!(plan.content_length, 0);
        assert!(!plan.partial);
    }

    #[test]
    fn test_explicit_range() {
        let plan = plan(1000, "bytes=200-499").unwrap();
        assert_eq!(
            (plan.start, plan.end, plan.total_size, plan.content_length),
            (200, 499, 1000, 300)
        );
        assert!(plan.partial);
        assert_eq!(plan.content_range(), "bytes 200-499/1000");
    }

    #[test]
    fn test_open_ended_range() {
        let plan = plan(1000, "bytes=900-").unwrap();
        assert_eq!(
            (plan.start, plan.end, plan.total_size, plan.content_length),
            (900, 999, 1000, 100)
        );
    }

    #[test]
    fn test_single_byte_ranges() {
        let first = plan(1000, "bytes=0-0").unwrap();
        assert_eq!((first.start, first.end, first.content_length), (0, 0, 1));

        let last = plan(1000, "bytes=999-999").unwrap();
        assert_eq!((last.start, last.end, last.content_length), (999, 999, 1));
    }

    #[test]
    fn test_suffix_range() {
        let plan = plan(1000, "bytes=-100").unwrap();
        assert_eq!((plan.start, plan.end, plan.content_length), (900, 999, 100));

        let larger = resolve_request(100, Some("bytes=-500")).unwrap();
        assert_eq!((larger.start, larger.end, larger.content_length), (0, 99, 100));
    }

    #[test]
    fn test_unit_is_case_insensitive() {
        let plan = plan(1000, "Bytes=0-9").unwrap();
        assert_eq!((plan.start, plan.end, plan.content_length), (0, 9, 10));

        let suffix = resolve_request(1000, Some("BYTES=-5")).unwrap();
        assert_eq!((suffix.start, suffix.end), (995, 999));
    }

    #[test]
    fn test_end_past_file_is_clamped() {
        let plan = plan(1000, "bytes=500-5000").unwrap();
        assert_eq!((plan.start, plan.end, plan.content_length), (500, 999, 500));
        assert_eq!(plan.content_range(), "bytes 500-999/1000");
    }

    #[test]
    fn test_unsatisfiable_ranges() {
        for header in ["bytes=1000-", "bytes=1500-2000", "bytes=500-100", "bytes=-0"] {
            assert!(
                matches!(
                    plan(1000, header),
                    Err(MediaError::RangeNotSatisfiable { size: 1000 })
                ),
                "{header} was satisfiable"
            );
        }
        assert!(matches!(
            resolve_request(0, Some("bytes=0-")),
            Err(MediaError::RangeNotSatisfiable { size: 0 })
        ));
    }

    #[test]
    fn test_malformed_ranges() {
        for header in [
            "0-499",
            "items=0-10",
            "bytes=500",
            "bytes=abc-def",
            "bytes=-",
            "bytes=+5-10",
            "bytes=0-10,20-30",
            "bytes=99999999999999999999-",
        ] {
            assert!(
                matches!(plan(1000, header), Err(MediaError::InvalidRange(_))),
                "{header} was accepted"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_resolved_plan_stays_inside_file(
            size in 1u64..1_000_000,
            start in 0u64..1_100_000,
            len in 0u64..1_100_000,
        ) {
            let header = format!("bytes={}-{}", start, start + len);
            match resolve_request(size, Some(&header)) {
                Ok(plan) => {
                    prop_assert!(plan.start <= plan.end);
                    prop_assert!(plan.end < size);
                    prop_assert_eq!(plan.content_length, plan.end - plan.start + 1);
                    prop_assert_eq!(plan.total_size, size);
                }
                Err(MediaError::RangeNotSatisfiable { size: reported }) => {
                    prop_assert!(start >= size);
                    prop_assert_eq!(reported, size);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }

        #[test]
        fn prop_suffix_never_exceeds_file(size in 1u64..1_000_000, suffix in 1u64..2_000_000) {
            let plan = resolve_request(size, Some(&format!("bytes=-{suffix}"))).unwrap();
            prop_assert_eq!(plan.end, size - 1);
            prop_assert_eq!(plan.content_length, suffix.min(size));
        }
    }
}
