//! Bounds Calculator - Activation ranges from document geometry
//!
//! Pure computation, no state:
//! - `compute_range` turns one section's geometry into its `[top, bottom]` range
//! - `compute_envelope` folds all ranges into the global `[min, max]`
//! - `measure_targets` reads geometry for discovered markers and builds targets
//!
//! The envelope is always recomputed from scratch so it cannot drift after
//! sections are added, removed or resized.

use crate::host::{GeometryProvider, SpyMarker};
use crate::types::{Envelope, Range, Target};

/// Offsets applied to every section (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offsets {
    pub top: u32,
    pub bottom: u32,
}

impl Default for Offsets {
    fn default() -> Self {
        Self { top: 0, bottom: 10 }
    }
}

/// Document-relative geometry of a single section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SectionGeometry {
    pub top: f64,
    pub height: f64,
}

/// Compute the scroll range in which a section's target is active.
///
/// `top = floor(S - t)`, `bottom = floor(S - t + H - b)`. A zero-height or
/// detached section yields a degenerate range, which is accepted.
pub fn compute_range(section: SectionGeometry, offsets: Offsets) -> Range {
    let start = section.top - f64::from(offsets.top);
    Range {
        top: start.floor() as i64,
        bottom: (start + section.height - f64::from(offsets.bottom)).floor() as i64,
    }
}

/// Compute the global envelope of a set of ranges.
///
/// Returns `None` for an empty set. When every range is degenerate
/// (`bottom < top`) the max is clamped up to the min so `min <= max` holds.
pub fn compute_envelope<'a>(ranges: impl IntoIterator<Item = &'a Range>) -> Option<Envelope> {
    let mut ranges = ranges.into_iter();
    let first = ranges.next()?;

    let (min, max) = ranges.fold((first.top, first.bottom), |(min, max), range| {
        (min.min(range.top), max.max(range.bottom))
    });

    Some(Envelope {
        min,
        max: max.max(min),
    })
}

/// Envelope of every target that has a range.
pub fn envelope_of(targets: &[Target]) -> Option<Envelope> {
    compute_envelope(targets.iter().filter_map(|target| target.range.as_ref()))
}

/// Resolve discovered markers into measured targets, keeping discovery order.
///
/// Markers whose section cannot be resolved (no reference, or the geometry
/// provider does not know it) are dropped with a warning.
pub fn measure_targets(
    markers: Vec<SpyMarker>,
    geometry: &dyn GeometryProvider,
    offsets: Offsets,
) -> Vec<Target> {
    markers
        .into_iter()
        .filter_map(|marker| {
            let Some(section) = marker.section else {
                tracing::warn!(target_id = %marker.id, "dropping spy marker without a section");
                return None;
            };
            let mut target = Target::new(marker.id, section);
            if !remeasure(&mut target, geometry, offsets) {
                return None;
            }
            Some(target)
        })
        .collect()
}

/// Recompute the range of an existing target in place.
///
/// Returns `false` (and leaves the range untouched) if the section no longer
/// resolves.
pub fn remeasure(target: &mut Target, geometry: &dyn GeometryProvider, offsets: Offsets) -> bool {
    match section_geometry(geometry, target) {
        Some(section) => {
            target.range = Some(compute_range(section, offsets));
            true
        }
        None => {
            tracing::warn!(
                target_id = %target.id,
                section = %target.section,
                "dropping spy marker whose section cannot be resolved"
            );
            false
        }
    }
}

fn section_geometry(geometry: &dyn GeometryProvider, target: &Target) -> Option<SectionGeometry> {
    Some(SectionGeometry {
        top: geometry.section_top(&target.section)?,
        height: geometry.section_height(&target.section)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SectionRef, TargetId};
    use std::collections::HashMap;

    struct FixedGeometry {
        sections: HashMap<String, SectionGeometry>,
    }

    impl FixedGeometry {
        fn new(sections: &[(&str, f64, f64)]) -> Self {
            Self {
                sections: sections
                    .iter()
                    .map(|&(id, top, height)| (id.to_string(), SectionGeometry { top, height }))
                    .collect(),
            }
        }
    }

    impl GeometryProvider for FixedGeometry {
        fn section_top(&self, section: &SectionRef) -> Option<f64> {
            self.sections.get(section.as_str()).map(|s| s.top)
        }
        fn section_height(&self, section: &SectionRef) -> Option<f64> {
            self.sections.get(section.as_str()).map(|s| s.height)
        }
        fn document_height(&self) -> f64 {
            1000.0
        }
        fn viewport_height(&self) -> f64 {
            500.0
        }
        fn scroll_position(&self) -> f64 {
            0.0
        }
    }

    fn marker(id: &str, section: Option<&str>) -> SpyMarker {
        SpyMarker {
            id: TargetId::new(id),
            section: section.map(SectionRef::new),
        }
    }

    #[test]
    fn test_compute_range_formula() {
        let offsets = Offsets { top: 20, bottom: 10 };
        let cases = [
            (0.0, 100.0),
            (350.0, 240.0),
            (120.7, 33.2),
            (15.0, 0.0),
            (4.4, 12.9),
        ];
        for (s, h) in cases {
            let range = compute_range(SectionGeometry { top: s, height: h }, offsets);
            assert_eq!(range.top, (s - 20.0).floor() as i64, "top for S={s} H={h}");
            assert_eq!(
                range.bottom,
                (s - 20.0 + h - 10.0).floor() as i64,
                "bottom for S={s} H={h}"
            );
        }
    }

    #[test]
    fn test_compute_range_defaults() {
        let range = compute_range(
            SectionGeometry {
                top: 300.0,
                height: 200.0,
            },
            Offsets::default(),
        );
        assert_eq!(range, Range::new(300, 490));
    }

    #[test]
    fn test_compute_range_zero_height_is_degenerate() {
        let range = compute_range(
            SectionGeometry {
                top: 50.0,
                height: 0.0,
            },
            Offsets::default(),
        );
        assert_eq!(range, Range::new(50, 40));
    }

    #[test]
    fn test_compute_envelope_empty() {
        assert_eq!(compute_envelope(&[] as &[Range]), None);
    }

    #[test]
    fn test_compute_envelope_min_max() {
        let ranges = [Range::new(200, 300), Range::new(0, 100), Range::new(100, 250)];
        let envelope = compute_envelope(&ranges).unwrap();
        assert_eq!(envelope, Envelope { min: 0, max: 300 });
    }

    #[test]
    fn test_compute_envelope_min_never_exceeds_max() {
        let sets: [&[Range]; 4] = [
            &[Range::new(5, 5)],
            &[Range::new(50, 40)],
            &[Range::new(50, 40), Range::new(70, 60)],
            &[Range::new(-30, 10), Range::new(400, 20)],
        ];
        for ranges in sets {
            let envelope = compute_envelope(ranges).unwrap();
            assert!(envelope.min <= envelope.max, "{ranges:?}");
        }
    }

    #[test]
    fn test_measure_targets_keeps_order_and_drops_unresolved() {
        let geometry = FixedGeometry::new(&[("#a", 0.0, 110.0), ("#c", 220.0, 110.0)]);
        let targets = measure_targets(
            vec![
                marker("link-c", Some("#c")),
                marker("link-missing", Some("#missing")),
                marker("link-none", None),
                marker("link-a", Some("#a")),
            ],
            &geometry,
            Offsets::default(),
        );

        let ids: Vec<&str> = targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["link-c", "link-a"]);
        assert_eq!(targets[0].range, Some(Range::new(220, 320)));
        assert_eq!(targets[1].range, Some(Range::new(0, 100)));
    }

    #[test]
    fn test_envelope_of_ignores_unmeasured_targets() {
        let targets = vec![
            Target::new("a", SectionRef::new("#a")).with_range(Range::new(10, 20)),
            Target::new("b", SectionRef::new("#b")),
        ];
        assert_eq!(envelope_of(&targets), Some(Envelope { min: 10, max: 20 }));
        assert_eq!(envelope_of(&targets[1..]), None);
    }
}
