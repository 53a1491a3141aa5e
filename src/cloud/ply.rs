use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;

use super::{writer_error, CloudEncoding, CloudFormat, Precision};
use crate::dat::Point;
use crate::error::ExportError;

const VERTEX: &str = "vertex";

fn coordinate_type(precision: Precision) -> PropertyType {
    match precision {
        Precision::Single => PropertyType::Scalar(ScalarType::Float),
        Precision::Double => PropertyType::Scalar(ScalarType::Double),
    }
}

fn coordinate(value: f64, precision: Precision) -> Property {
    match precision {
        Precision::Single => Property::Float(value as f32),
        Precision::Double => Property::Double(value),
    }
}

fn build_ply(
    points: &[Point],
    encoding: CloudEncoding,
    precision: Precision,
) -> Result<Ply<DefaultElement>, String> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = match encoding {
        CloudEncoding::Binary => Encoding::BinaryLittleEndian,
        CloudEncoding::Ascii => Encoding::Ascii,
    };
    ply.header
        .comments
        .push("converted from WLI measurement data".to_string());

    let mut vertex = ElementDef::new(VERTEX.to_string());
    for name in ["x", "y", "z"] {
        vertex
            .properties
            .add(PropertyDef::new(name.to_string(), coordinate_type(precision)));
    }
    ply.header.elements.add(vertex);

    let vertices = points
        .iter()
        .map(|p| {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), coordinate(p.x, precision));
            element.insert("y".to_string(), coordinate(p.y, precision));
            element.insert("z".to_string(), coordinate(p.z, precision));
            element
        })
        .collect();
    ply.payload.insert(VERTEX.to_string(), vertices);

    ply.make_consistent().map_err(|e| format!("{:?}", e))?;
    Ok(ply)
}

pub(super) fn write_ply(
    points: &[Point],
    path: &Path,
    encoding: CloudEncoding,
    precision: Precision,
) -> Result<(), ExportError> {
    let mut ply = build_ply(points, encoding, precision)
        .map_err(|e| writer_error(path, CloudFormat::Ply, e))?;

    let io_error = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_error)?);
    Writer::new()
        .write_ply(&mut out, &mut ply)
        .map_err(io_error)?;
    out.flush().map_err(io_error)?;
    Ok(())
}
