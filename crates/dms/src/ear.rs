//! Eye aspect ratio (EAR)
//!
//! EAR = mean eyelid opening / eye width, averaged over both eyes.
//! Open eyes sit around 0.25-0.35, closed eyes approach zero.

use crate::landmarks::{eye_indices, EyeLandmarks, LandmarkFrame, Point2};
use crate::DmsError;
use tracing::trace;

/// EAR reported for frames that cannot be measured. Reads as "eyes open".
pub const FALLBACK_EAR: f32 = 0.25;

/// Per-eye and combined EAR for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarReading {
    pub left: f32,
    pub right: f32,
    pub average: f32,
}

/// EAR for a frame, or [`FALLBACK_EAR`] if the frame is malformed.
///
/// Fails open: a frame with missing or degenerate eye landmarks is treated
/// as open eyes and never raises an error.
pub fn eye_aspect_ratio(frame: &LandmarkFrame) -> f32 {
    match try_eye_aspect_ratio(frame) {
        Ok(reading) => reading.average,
        Err(e) => {
            trace!("EAR fallback ({}): {}", FALLBACK_EAR, e);
            FALLBACK_EAR
        }
    }
}

/// EAR for a frame, reporting why it could not be computed
pub fn try_eye_aspect_ratio(frame: &LandmarkFrame) -> Result<EarReading, DmsError> {
    let highest = eye_indices::LEFT_EYE
        .max_index()
        .max(eye_indices::RIGHT_EYE.max_index());
    if frame.len() <= highest {
        return Err(DmsError::KeypointsMissing(highest));
    }

    let left = single_eye(frame, &eye_indices::LEFT_EYE)?;
    let right = single_eye(frame, &eye_indices::RIGHT_EYE)?;

    Ok(EarReading {
        left,
        right,
        average: (left + right) / 2.0,
    })
}

fn single_eye(frame: &LandmarkFrame, eye: &EyeLandmarks) -> Result<f32, DmsError> {
    let point = |index: usize| -> Result<Point2, DmsError> {
        let p = frame.get(index).ok_or(DmsError::KeypointsMissing(index))?;
        if p.is_finite() {
            Ok(p)
        } else {
            Err(DmsError::MalformedFrame(format!("landmark {} is not finite", index)))
        }
    };

    let v1 = point(eye.vertical_1.a)?.distance(&point(eye.vertical_1.b)?);
    let v2 = point(eye.vertical_2.a)?.distance(&point(eye.vertical_2.b)?);
    let width = point(eye.corners.a)?.distance(&point(eye.corners.b)?);

    if width <= f32::EPSILON {
        return Err(DmsError::MalformedFrame("zero eye width".into()));
    }

    Ok((v1 + v2) / 2.0 / width)
}

/// Builds a face-mesh sized frame whose eyes both measure `ear`
#[cfg(test)]
pub(crate) fn synthetic_frame(ear: f32) -> LandmarkFrame {
    let mut frame: LandmarkFrame = vec![Point2::new(0.5, 0.5); eye_indices::FACE_MESH_POINTS].into();
    place_eye(&mut frame, &eye_indices::LEFT_EYE, 0.35, ear);
    place_eye(&mut frame, &eye_indices::RIGHT_EYE, 0.65, ear);
    frame
}

#[cfg(test)]
fn place_eye(frame: &mut LandmarkFrame, eye: &EyeLandmarks, cx: f32, ear: f32) {
    let cy = 0.4;
    let half_width = 0.05;
    let half_open = ear * half_width;

    frame.set(eye.corners.a, Point2::new(cx - half_width, cy));
    frame.set(eye.corners.b, Point2::new(cx + half_width, cy));
    frame.set(eye.vertical_1.a, Point2::new(cx - 0.02, cy - half_open));
    frame.set(eye.vertical_1.b, Point2::new(cx - 0.02, cy + half_open));
    frame.set(eye.vertical_2.a, Point2::new(cx + 0.02, cy - half_open));
    frame.set(eye.vertical_2.b, Point2::new(cx + 0.02, cy + half_open));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_closed_eyes() {
        let open = eye_aspect_ratio(&synthetic_frame(0.30));
        let closed = eye_aspect_ratio(&synthetic_frame(0.05));

        assert!((open - 0.30).abs() < 1e-4, "open EAR was {}", open);
        assert!((closed - 0.05).abs() < 1e-4, "closed EAR was {}", closed);
    }

    #[test]
    fn test_average_of_both_eyes() {
        let mut frame = synthetic_frame(0.30);
        place_eye(&mut frame, &eye_indices::RIGHT_EYE, 0.65, 0.10);

        let reading = try_eye_aspect_ratio(&frame).unwrap();
        assert!((reading.left - 0.30).abs() < 1e-4);
        assert!((reading.right - 0.10).abs() < 1e-4);
        assert!((reading.average - 0.20).abs() < 1e-4);
    }

    #[test]
    fn test_missing_index_falls_back() {
        // Right eye reaches index 387
        let truncated: LandmarkFrame = synthetic_frame(0.05).points()[..300].iter().copied().collect();

        assert!(matches!(
            try_eye_aspect_ratio(&truncated),
            Err(DmsError::KeypointsMissing(387))
        ));
        assert_eq!(eye_aspect_ratio(&truncated), 0.25);
        assert_eq!(eye_aspect_ratio(&LandmarkFrame::default()), FALLBACK_EAR);
    }

    #[test]
    fn test_degenerate_geometry_falls_back() {
        let mut frame = synthetic_frame(0.05);
        let corner = frame.get(eye_indices::LEFT_EYE.corners.a).unwrap();
        frame.set(eye_indices::LEFT_EYE.corners.b, corner);
        assert_eq!(eye_aspect_ratio(&frame), FALLBACK_EAR);

        let mut frame = synthetic_frame(0.05);
        frame.set(eye_indices::RIGHT_EYE.vertical_2.a, Point2::new(f32::NAN, 0.4));
        assert_eq!(eye_aspect_ratio(&frame), FALLBACK_EAR);
    }
}
