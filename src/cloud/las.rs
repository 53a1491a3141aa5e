use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use pasture_core::containers::{BorrowedBuffer, BorrowedMutBuffer, OwningBuffer, VectorBuffer};
use pasture_core::layout::{attributes::POSITION_3D, FieldAlignment, PointLayout};
use pasture_io::base::PointWriter;
use pasture_io::las::{las_point_format_from_point_layout, LASWriter};
use pasture_io::las_rs::{Builder, Header, Transform, Vector};

use super::{writer_error, CloudFormat};
use crate::dat::Point;
use crate::error::ExportError;
use crate::shared::math::Bounds;

/// Finest scale used for LAS integer coordinates (1 nm for data in mm).
const FINEST_SCALE_EXPONENT: i32 = -9;

/// Largest local integer coordinate we allow, half of `i32::MAX` to leave headroom
/// for rounding in `(v - offset) / scale`.
const MAX_LOCAL_COORDINATE: f64 = (i32::MAX / 2) as f64;

const FALLBACK_TRANSFORM: Transform = Transform {
    scale: 0.001,
    offset: 0.0,
};

/// Copy the points into a pasture buffer holding only `POSITION_3D` (`Vector3<f64>`).
pub(crate) fn to_position_buffer(points: &[Point]) -> Option<VectorBuffer> {
    let mut layout = PointLayout::default();
    layout.add_attribute(POSITION_3D, FieldAlignment::Default);

    let mut buffer = VectorBuffer::with_capacity(points.len(), layout);
    buffer.resize(points.len());

    let pos_attr = buffer
        .point_layout()
        .get_attribute(&POSITION_3D)?
        .attribute_definition()
        .clone();

    for (i, point) in points.iter().enumerate() {
        let position = point.to_array();
        // SAFETY: the layout holds POSITION_3D as three f64 and `i` is within the resized buffer.
        unsafe {
            buffer.set_attribute(&pos_attr, i, bytemuck::cast_slice(&position));
        }
    }

    Some(buffer)
}

/// Offset and scale for one axis spanning `min..=max`.
///
/// The offset sits at `min` so every local coordinate is non-negative, and the scale is the
/// finest power of ten that keeps the extent within the i32 range LAS stores.
fn axis_transform(min: f64, max: f64) -> Option<Transform> {
    let extent = max - min;
    if !min.is_finite() || !extent.is_finite() {
        return None;
    }
    let mut exponent = FINEST_SCALE_EXPONENT;
    while extent / 10f64.powi(exponent) > MAX_LOCAL_COORDINATE {
        exponent += 1;
    }
    Some(Transform {
        scale: 10f64.powi(exponent),
        offset: min,
    })
}

/// Per-axis transforms fitted to the points; `None` when a coordinate is not finite.
pub(crate) fn transforms_for(points: &[Point]) -> Option<Vector<Transform>> {
    if points
        .iter()
        .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
        return None;
    }
    let Some(bounds) = Bounds::of(points) else {
        return Some(Vector {
            x: FALLBACK_TRANSFORM,
            y: FALLBACK_TRANSFORM,
            z: FALLBACK_TRANSFORM,
        });
    };
    Some(Vector {
        x: axis_transform(bounds.min[0], bounds.max[0])?,
        y: axis_transform(bounds.min[1], bounds.max[1])?,
        z: axis_transform(bounds.min[2], bounds.max[2])?,
    })
}

fn las_header(layout: &PointLayout, transforms: Vector<Transform>) -> Result<Header, String> {
    let mut builder = Builder::from((1, 4));
    builder.point_format = las_point_format_from_point_layout(layout);
    builder.transforms = transforms;
    builder.generating_software = env!("CARGO_PKG_NAME").to_string();
    builder.into_header().map_err(|e| e.to_string())
}

pub(super) fn write_las(
    points: &[Point],
    path: &Path,
    format: CloudFormat,
) -> Result<(), ExportError> {
    let transforms = transforms_for(points).ok_or(ExportError::Unsupported {
        format,
        what: "non-finite coordinates",
    })?;
    let buffer = to_position_buffer(points)
        .ok_or_else(|| writer_error(path, format, "buffer layout lacks POSITION_3D"))?;
    let header = las_header(buffer.point_layout(), transforms)
        .map_err(|e| writer_error(path, format, e))?;

    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_error)?;
    let mut writer =
        LASWriter::from_writer_and_header(BufWriter::new(file), header, format == CloudFormat::Laz)
            .map_err(|e| writer_error(path, format, format!("{e:#}")))?;
    writer
        .write(&buffer)
        .map_err(|e| writer_error(path, format, format!("{e:#}")))?;
    let mut out = writer
        .into_inner()
        .map_err(|e| writer_error(path, format, format!("{e:#}")))?;
    out.flush().map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pasture_core::containers::BorrowedBufferExt;
    use pasture_core::nalgebra::Vector3;

    #[test]
    fn buffer_keeps_order_and_full_precision() {
        let points = [Point::new(0.1, 0.2, 0.3), Point::new(-1.0, 2.5, 1e-9)];
        let buffer = to_position_buffer(&points).unwrap();
        assert_eq!(buffer.len(), 2);

        let positions: Vec<Vector3<f64>> = buffer
            .view_attribute::<Vector3<f64>>(&POSITION_3D)
            .into_iter()
            .collect();
        assert_eq!(positions[0], Vector3::new(0.1, 0.2, 0.3));
        assert_eq!(positions[1], Vector3::new(-1.0, 2.5, 1e-9));
    }

    #[test]
    fn small_extents_get_the_finest_scale() {
        let t = axis_transform(0.0000089, 0.0004567).unwrap();
        assert_eq!(t.scale, 1e-9);
        assert_eq!(t.offset, 0.0000089);
    }

    #[test]
    fn large_extents_stay_within_i32() {
        let t = axis_transform(-5e6, 5e6).unwrap();
        assert!(1e7 / t.scale <= MAX_LOCAL_COORDINATE);
        assert!(1e7 / (t.scale / 10.0) > MAX_LOCAL_COORDINATE);
    }

    #[test]
    fn non_finite_coordinates_have_no_transform() {
        assert!(transforms_for(&[Point::new(f64::INFINITY, 0.0, 0.0)]).is_none());
        assert!(transforms_for(&[Point::new(1.0, 1.0, 1.0), Point::new(0.0, f64::NAN, 0.0)]).is_none());
        assert!(transforms_for(&[]).is_some());
    }
}
