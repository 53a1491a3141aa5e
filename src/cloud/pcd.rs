use std::path::Path;

use pcd_rs::{DataKind, PcdSerialize, Writer, WriterInit};

use super::{writer_error, CloudEncoding, CloudFormat, Precision};
use crate::dat::Point;
use crate::error::ExportError;

/// Written as `FIELDS x y z`, `SIZE 4 4 4`, `TYPE F F F`.
#[derive(PcdSerialize)]
struct PcdPointXyz {
    x: f32,
    y: f32,
    z: f32,
}

/// Written as `FIELDS x y z`, `SIZE 8 8 8`, `TYPE F F F`.
#[derive(PcdSerialize)]
struct PcdPointXyzF64 {
    x: f64,
    y: f64,
    z: f64,
}

impl From<&Point> for PcdPointXyz {
    fn from(p: &Point) -> Self {
        let [x, y, z] = p.to_f32();
        Self { x, y, z }
    }
}

impl From<&Point> for PcdPointXyzF64 {
    fn from(p: &Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

pub(super) fn write_pcd(
    points: &[Point],
    path: &Path,
    encoding: CloudEncoding,
    precision: Precision,
) -> Result<(), ExportError> {
    let data_kind = match encoding {
        CloudEncoding::Binary => DataKind::Binary,
        CloudEncoding::Ascii => DataKind::Ascii,
    };
    match precision {
        Precision::Single => write_records::<PcdPointXyz>(points, path, data_kind),
        Precision::Double => write_records::<PcdPointXyzF64>(points, path, data_kind),
    }
}

fn write_records<T>(points: &[Point], path: &Path, data_kind: DataKind) -> Result<(), ExportError>
where
    T: PcdSerialize + for<'a> From<&'a Point>,
{
    let fail = |e| writer_error(path, CloudFormat::Pcd, e);

    // Unorganized cloud: one row holding every point.
    let mut writer: Writer<T, _> = WriterInit {
        width: points.len() as u64,
        height: 1,
        viewpoint: Default::default(),
        data_kind,
        schema: None,
    }
    .create(path)
    .map_err(fail)?;

    for point in points {
        writer.push(&T::from(point)).map_err(fail)?;
    }
    writer.finish().map_err(fail)?;
    Ok(())
}
