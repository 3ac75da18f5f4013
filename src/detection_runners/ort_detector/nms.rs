use crate::common::BBox;
use crate::detection_runners::ort_detector::candidates::Candidate;

/// Upper bound on candidates entering NMS.
pub const MAX_NMS: usize = 30000;

/// Per-class coordinate offset. Must exceed any letterboxed coordinate so
/// boxes of different classes can never overlap.
pub const MAX_WH: f32 = 4096.;

pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
}

/// A candidate reduced to its best class, box in letterboxed coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionRow {
    pub bbox: BBox,
    pub score: f32,
    pub class_id: usize,
}

impl DetectionRow {
    /// Box shifted by `class_id * max_wh` on both axes.
    pub fn class_offset_box(&self, max_wh: f32) -> BBox {
        self.bbox.offset(self.class_id as f32 * max_wh)
    }
}

/// Geometry-only view NMS runs on.
#[derive(Debug, Clone, Copy)]
struct OffsetBox {
    bbox: BBox,
    score: f32,
}

impl Nms for OffsetBox {
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    fn confidence(&self) -> f32 {
        self.score
    }
}

/// Converts candidates to corner-form rows keeping only the best class of
/// each, then sorts by score (stable, descending) and keeps `max_candidates`.
///
/// A class qualifies when its score is strictly above `score_threshold`; on
/// equal scores the later class wins. Candidates without a qualifying class
/// are dropped.
pub fn build_detection_matrix<I>(
    candidates: I,
    score_threshold: f32,
    max_candidates: usize,
) -> Vec<DetectionRow>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut rows: Vec<DetectionRow> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let mut best: Option<(usize, f32)> = None;
            for (class_id, &score) in candidate.class_scores().iter().enumerate() {
                if score > score_threshold && best.map_or(true, |(_, s)| score >= s) {
                    best = Some((class_id, score));
                }
            }
            let (class_id, score) = best?;
            let (cx, cy, w, h) = candidate.cxcywh();
            Some(DetectionRow {
                bbox: BBox::from_cxcywh(cx, cy, w, h),
                score,
                class_id,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
    rows.truncate(max_candidates);
    rows
}

/// Greedy suppression over any scored items. Returns the indices of the kept
/// items in descending confidence order; ties keep the earlier index first.
pub fn nms_indices<T: Nms>(items: &[T], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].confidence().total_cmp(&items[a].confidence()));

    let mut keep: Vec<usize> = Vec::new();
    for index in order {
        let drop = keep
            .iter()
            .any(|&kept| items[kept].iou(&items[index]) > iou_threshold);
        if !drop {
            keep.push(index);
        }
    }
    keep
}

/// Class-aware NMS: each box is offset by `class_id * max_wh` so a single
/// geometric pass only suppresses boxes of the same class.
pub fn non_max_suppression(rows: &[DetectionRow], iou_threshold: f32, max_wh: f32) -> Vec<usize> {
    let shifted: Vec<OffsetBox> = rows
        .iter()
        .map(|row| OffsetBox {
            bbox: row.class_offset_box(max_wh),
            score: row.score,
        })
        .collect();
    nms_indices(&shifted, iou_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn row(x1: f32, y1: f32, x2: f32, y2: f32, score: f32, class_id: usize) -> DetectionRow {
        DetectionRow {
            bbox: BBox::new(x1, y1, x2, y2),
            score,
            class_id,
        }
    }

    fn candidate(cx: f32, cy: f32, w: f32, h: f32, objectness: f32, scores: &[f32]) -> Candidate {
        let mut v = vec![cx, cy, w, h, objectness];
        v.extend(scores.iter().map(|s| s * objectness));
        Candidate::new(v)
    }

    #[test]
    fn picks_best_class_and_converts_box() {
        let rows = build_detection_matrix(
            vec![candidate(100., 100., 50., 50., 0.9, &[0.1, 0.8])],
            0.4,
            MAX_NMS,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].class_id, 1);
        assert_eq!(rows[0].score, 0.8 * 0.9);
        assert_eq!(rows[0].bbox, BBox::new(75., 75., 125., 125.));
    }

    #[test]
    fn drops_candidates_without_qualifying_class() {
        let rows = build_detection_matrix(
            vec![candidate(10., 10., 4., 4., 0.6, &[0.5, 0.6])],
            0.4,
            MAX_NMS,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn equal_scores_prefer_later_class() {
        let rows = build_detection_matrix(
            vec![Candidate::new(vec![0., 0., 2., 2., 1., 0.7, 0.7, 0.1])],
            0.5,
            MAX_NMS,
        );
        assert_eq!(rows[0].class_id, 1);
    }

    #[test]
    fn sorted_stably_and_truncated() {
        let candidates: Vec<Candidate> = (0..50)
            .map(|i| {
                let score = if i % 2 == 0 { 0.9 } else { 0.5 + i as f32 / 1000. };
                Candidate::new(vec![i as f32, 0., 1., 1., 1., score])
            })
            .collect();

        let rows = build_detection_matrix(candidates, 0.1, 30);
        assert_eq!(rows.len(), 30);
        assert!(rows.windows(2).all(|w| w[0].score >= w[1].score));
        // the 25 ties at 0.9 keep their input order
        let tied: Vec<f32> = rows.iter().take(25).map(|r| r.bbox.cxcywh().0).collect();
        let expected: Vec<f32> = (0..50).step_by(2).map(|i| i as f32).collect();
        assert_eq!(tied, expected);
    }

    #[test]
    fn different_classes_never_suppress_each_other() {
        let rows = vec![
            row(10., 10., 60., 60., 0.9, 0),
            row(10., 10., 60., 60., 0.8, 1),
        ];
        assert_eq!(non_max_suppression(&rows, 0.45, MAX_WH), vec![0, 1]);
    }

    #[test]
    fn same_class_overlap_collapses_to_best() {
        let rows = vec![
            row(12., 10., 62., 60., 0.7, 3),
            row(10., 10., 60., 60., 0.9, 3),
            row(300., 300., 350., 350., 0.6, 3),
        ];
        assert_eq!(non_max_suppression(&rows, 0.45, MAX_WH), vec![1, 2]);
    }

    #[test]
    fn small_offset_lets_classes_collide() {
        let rows = vec![
            row(0., 0., 100., 100., 0.9, 0),
            row(0., 0., 100., 100., 0.8, 1),
        ];
        assert_eq!(non_max_suppression(&rows, 0.45, 10.), vec![0]);
    }

    #[test]
    fn suppression_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let rows: Vec<DetectionRow> = (0..300)
            .map(|_| {
                let (x, y) = (rng.gen_range(0.0..600.0), rng.gen_range(0.0..360.0));
                let (w, h) = (rng.gen_range(5.0..80.0), rng.gen_range(5.0..80.0));
                row(x, y, x + w, y + h, rng.gen_range(0.0..1.0), rng.gen_range(0..4))
            })
            .collect();

        let first = non_max_suppression(&rows, 0.4, MAX_WH);
        let kept: Vec<DetectionRow> = first.iter().map(|&i| rows[i]).collect();
        let second = non_max_suppression(&kept, 0.4, MAX_WH);
        assert_eq!(second, (0..kept.len()).collect::<Vec<_>>());
    }
}
