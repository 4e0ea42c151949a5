//! Internal utility functions.
//!
//! Helpers for pixel-data copying, display rotation and timestamp
//! conversion shared by the thumbnail and transcode paths.

use std::time::Duration;

use ffmpeg_next::{Rational, format::stream::Stream, frame::Video as VideoFrame};
use ffmpeg_sys_next::{AVPacketSideDataType, av_packet_side_data_get};

use crate::variants::Size;

/// Copy pixel data from an FFmpeg RGB24 frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × 3).
/// The result can be passed directly to [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a [`Duration`] to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `Input::seek` (`avformat_seek_file` with `stream_index = -1`) expects
/// container-level timestamps in AV_TIME_BASE.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros().min(i64::MAX as u128) as i64
}

/// Frame rate of a stream as a float, falling back to `rate` when the
/// average frame rate is unknown.
pub(crate) fn frames_per_second(average: Rational, rate: Rational) -> f64 {
    if average.denominator() != 0 && average.numerator() != 0 {
        average.numerator() as f64 / average.denominator() as f64
    } else if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}

/// Clockwise rotation (0, 90, 180 or 270) needed to display `stream`
/// upright, read from its display matrix side data.
pub(crate) fn stream_rotation(stream: &Stream) -> u32 {
    let parameters = stream.parameters();
    // SAFETY: the parameters outlive this block and FFmpeg reports the
    // length of every coded side data entry it owns.
    let matrix = unsafe {
        let parameters = parameters.as_ptr();
        let side_data = av_packet_side_data_get(
            (*parameters).coded_side_data,
            (*parameters).nb_coded_side_data,
            AVPacketSideDataType::AV_PKT_DATA_DISPLAYMATRIX,
        );
        if side_data.is_null() || (*side_data).data.is_null() {
            return 0;
        }
        std::slice::from_raw_parts((*side_data).data, (*side_data).size as usize).to_vec()
    };
    display_rotation(&matrix).unwrap_or(0)
}

/// Decode a 3x3 display matrix (nine native-endian `i32`, 16.16 fixed
/// point) into a clockwise quarter-turn rotation.
///
/// Returns `None` when the buffer is too short or the matrix is degenerate.
/// Angles are snapped to the nearest multiple of 90.
pub(crate) fn display_rotation(matrix: &[u8]) -> Option<u32> {
    if matrix.len() < 36 {
        return None;
    }
    let entry = |index: usize| {
        let bytes: [u8; 4] = matrix[index * 4..index * 4 + 4].try_into().ok()?;
        Some(f64::from(i32::from_ne_bytes(bytes)) / 65536.0)
    };
    let (a, b, c, d) = (entry(0)?, entry(1)?, entry(3)?, entry(4)?);
    let scale_x = a.hypot(c);
    let scale_y = b.hypot(d);
    if scale_x == 0.0 || scale_y == 0.0 {
        return None;
    }

    let degrees = (b / scale_y).atan2(a / scale_x).to_degrees();
    let quarter_turns = (degrees / 90.0).round() as i64;
    Some((quarter_turns.rem_euclid(4) * 90) as u32)
}

/// Returns `true` when `rotation` swaps width and height.
pub(crate) fn is_quarter_turn(rotation: u32) -> bool {
    rotation % 180 == 90
}

/// Size a frame must be scaled to so that rotating it by `rotation`
/// yields `size`.
pub(crate) fn unrotated_size(size: Size, rotation: u32) -> Size {
    if is_quarter_turn(rotation) {
        size.transposed()
    } else {
        size
    }
}

/// Rotate an 8-bit planar frame (e.g. YUV420P) clockwise by `rotation`.
///
/// Plane dimensions must be exact (even luma sizes for 4:2:0).
pub(crate) fn rotate_planar_frame(source: &VideoFrame, rotation: u32) -> VideoFrame {
    let (width, height) = if is_quarter_turn(rotation) {
        (source.height(), source.width())
    } else {
        (source.width(), source.height())
    };
    let mut rotated = VideoFrame::new(source.format(), width, height);

    for plane in 0..source.planes() {
        let source_width = source.plane_width(plane) as usize;
        let source_height = source.plane_height(plane) as usize;
        let source_stride = source.stride(plane);
        let target_stride = rotated.stride(plane);
        let (target_width, target_height) = if is_quarter_turn(rotation) {
            (source_height, source_width)
        } else {
            (source_width, source_height)
        };

        let pixels = source.data(plane);
        let target = rotated.data_mut(plane);
        for y in 0..target_height {
            for x in 0..target_width {
                let (source_x, source_y) = match rotation {
                    90 => (y, source_height - 1 - x),
                    180 => (source_width - 1 - x, source_height - 1 - y),
                    270 => (source_width - 1 - y, x),
                    _ => (x, y),
                };
                target[y * target_stride + x] = pixels[source_y * source_stride + source_x];
            }
        }
    }

    rotated.set_pts(source.pts());
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(entries: [f64; 9]) -> Vec<u8> {
        entries
            .iter()
            .flat_map(|value| ((value * 65536.0) as i32).to_ne_bytes())
            .collect()
    }

    #[test]
    fn identity_matrix_has_no_rotation() {
        let identity = matrix([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.25]);
        assert_eq!(display_rotation(&identity), Some(0));
    }

    #[test]
    fn quarter_turn_matrices() {
        // Phone recordings held upright: frames need a clockwise turn.
        let clockwise = matrix([0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.25]);
        assert_eq!(display_rotation(&clockwise), Some(90));

        let counter_clockwise = matrix([0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.25]);
        assert_eq!(display_rotation(&counter_clockwise), Some(270));

        let upside_down = matrix([-1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.25]);
        assert_eq!(display_rotation(&upside_down), Some(180));
    }

    #[test]
    fn malformed_matrices_are_ignored() {
        assert_eq!(display_rotation(&[0u8; 12]), None);
        assert_eq!(display_rotation(&matrix([0.0; 9])), None);
    }

    #[test]
    fn unrotated_size_swaps_for_quarter_turns() {
        let size = Size::new(320, 240);
        assert_eq!(unrotated_size(size, 0), size);
        assert_eq!(unrotated_size(size, 90), Size::new(240, 320));
        assert_eq!(unrotated_size(size, 180), size);
        assert_eq!(unrotated_size(size, 270), Size::new(240, 320));
    }
}
