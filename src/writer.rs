//! The seam an external event sink plugs into, plus a reference CSV
//! backend.
//!
//! Full CSV/HDF5 writing is out of scope for this crate (spec.md §1);
//! what it owns is the [`EventWriter`] trait the tracing engine's
//! caller writes against, selectable per spec.md §6 by a [`RayAttrMask`]
//! bitmask, and [`CsvWriter`] as the simplest possible reference
//! implementation of it — an HDF5 writer is left entirely to an
//! external crate, since this trait is already its full seam.

use thiserror::Error;

use crate::shader::attr_mask::RayAttrMask;
use crate::shader::Ray;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("event writer I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "csv")]
    #[error("csv encode failure: {0}")]
    Csv(#[from] csv::Error),
}

/// A sink for traced ray events, selected by an attribute bitmask.
///
/// `write_batch` is called once per completed batch (spec.md §5); a
/// writer that wants per-ray granularity can simply call it with
/// one-ray slices.
pub trait EventWriter {
    fn write_batch(&mut self, rays: &[Ray], mask: RayAttrMask) -> Result<(), WriteError>;
}

/// Single-bit attribute columns, in the fixed order this module writes
/// them when asked for an attribute group rather than an explicit
/// column list — matches `Trace/RayAttrMask.h`'s field declaration
/// order, which is also the order `original_source`'s CSV exporter
/// emits a full (unmasked) row in.
const COLUMN_ORDER: &[RayAttrMask] = &[
    RayAttrMask::PATH_ID,
    RayAttrMask::PATH_EVENT_ID,
    RayAttrMask::POSITION_X,
    RayAttrMask::POSITION_Y,
    RayAttrMask::POSITION_Z,
    RayAttrMask::DIRECTION_X,
    RayAttrMask::DIRECTION_Y,
    RayAttrMask::DIRECTION_Z,
    RayAttrMask::ELECTRIC_FIELD_X,
    RayAttrMask::ELECTRIC_FIELD_Y,
    RayAttrMask::ELECTRIC_FIELD_Z,
    RayAttrMask::OPTICAL_PATH_LENGTH,
    RayAttrMask::ENERGY,
    RayAttrMask::ORDER,
    RayAttrMask::OBJECT_ID,
    RayAttrMask::SOURCE_ID,
    RayAttrMask::EVENT_TYPE,
    RayAttrMask::RAND_COUNTER,
];

fn column_name(bit: RayAttrMask) -> &'static str {
    match bit {
        RayAttrMask::PATH_ID => "ray_id",
        RayAttrMask::PATH_EVENT_ID => "event_id",
        RayAttrMask::POSITION_X => "position_x",
        RayAttrMask::POSITION_Y => "position_y",
        RayAttrMask::POSITION_Z => "position_z",
        RayAttrMask::DIRECTION_X => "direction_x",
        RayAttrMask::DIRECTION_Y => "direction_y",
        RayAttrMask::DIRECTION_Z => "direction_z",
        RayAttrMask::ELECTRIC_FIELD_X => "field_x_re,field_x_im",
        RayAttrMask::ELECTRIC_FIELD_Y => "field_y_re,field_y_im",
        RayAttrMask::ELECTRIC_FIELD_Z => "field_z_re,field_z_im",
        RayAttrMask::OPTICAL_PATH_LENGTH => "path_length",
        RayAttrMask::ENERGY => "energy",
        RayAttrMask::ORDER => "order",
        RayAttrMask::OBJECT_ID => "last_element",
        RayAttrMask::SOURCE_ID => "source_id",
        RayAttrMask::EVENT_TYPE => "event_type",
        RayAttrMask::RAND_COUNTER => "rand_counter",
        _ => "unknown",
    }
}

fn push_row_fields(row: &mut Vec<String>, ray: &Ray, bit: RayAttrMask) {
    match bit {
        RayAttrMask::PATH_ID => row.push(ray.path_id.to_string()),
        RayAttrMask::PATH_EVENT_ID => row.push(ray.path_event_id.to_string()),
        RayAttrMask::POSITION_X => row.push(ray.position.x.to_string()),
        RayAttrMask::POSITION_Y => row.push(ray.position.y.to_string()),
        RayAttrMask::POSITION_Z => row.push(ray.position.z.to_string()),
        RayAttrMask::DIRECTION_X => row.push(ray.direction.x.to_string()),
        RayAttrMask::DIRECTION_Y => row.push(ray.direction.y.to_string()),
        RayAttrMask::DIRECTION_Z => row.push(ray.direction.z.to_string()),
        RayAttrMask::ELECTRIC_FIELD_X => {
            row.push(ray.field[0].re.to_string());
            row.push(ray.field[0].im.to_string());
        }
        RayAttrMask::ELECTRIC_FIELD_Y => {
            row.push(ray.field[1].re.to_string());
            row.push(ray.field[1].im.to_string());
        }
        RayAttrMask::ELECTRIC_FIELD_Z => {
            row.push(ray.field[2].re.to_string());
            row.push(ray.field[2].im.to_string());
        }
        RayAttrMask::OPTICAL_PATH_LENGTH => row.push(ray.optical_path_length.to_string()),
        RayAttrMask::ENERGY => row.push(ray.energy.to_string()),
        RayAttrMask::ORDER => row.push(ray.order.to_string()),
        RayAttrMask::OBJECT_ID => row.push(ray.object_id.to_string()),
        RayAttrMask::SOURCE_ID => row.push(ray.source_id.to_string()),
        RayAttrMask::EVENT_TYPE => row.push((ray.event_type as u32).to_string()),
        RayAttrMask::RAND_COUNTER => row.push(ray.rand_counter.to_string()),
        _ => {}
    }
}

/// Writes one CSV row per ray event, columns limited to the bits set
/// in the mask passed to [`EventWriter::write_batch`], in
/// [`COLUMN_ORDER`]. The header is written once, from the first batch's
/// mask; mixing masks across calls on the same writer isn't supported,
/// matching spec.md §6's "attribute set is chosen once by the caller".
#[cfg(feature = "csv")]
pub struct CsvWriter<W: std::io::Write> {
    inner: csv::Writer<W>,
    header_written: bool,
}

#[cfg(feature = "csv")]
impl<W: std::io::Write> CsvWriter<W> {
    pub fn new(inner: W) -> Self {
        CsvWriter { inner: csv::Writer::from_writer(inner), header_written: false }
    }

    fn write_header(&mut self, mask: RayAttrMask) -> Result<(), WriteError> {
        let header: Vec<&str> = COLUMN_ORDER
            .iter()
            .filter(|&&bit| mask.contains(bit))
            .flat_map(|&bit| column_name(bit).split(','))
            .collect();
        self.inner.write_record(&header)?;
        self.header_written = true;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush().map_err(WriteError::from)
    }
}

#[cfg(feature = "csv")]
impl<W: std::io::Write> EventWriter for CsvWriter<W> {
    fn write_batch(&mut self, rays: &[Ray], mask: RayAttrMask) -> Result<(), WriteError> {
        if !self.header_written {
            self.write_header(mask)?;
        }
        for ray in rays {
            let mut row = Vec::new();
            for &bit in COLUMN_ORDER {
                if mask.contains(bit) {
                    push_row_fields(&mut row, ray, bit);
                }
            }
            self.inner.write_record(&row)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "csv"))]
mod tests {
    use super::*;
    use crate::shader::EventType;
    use num_complex::Complex64;

    fn sample_ray() -> Ray {
        Ray {
            path_id: 0,
            path_event_id: 0,
            position: crate::core::geometry::Vec3::new(1.0, 2.0, 3.0),
            direction: crate::core::geometry::Vec3::new(0.0, 0.0, 1.0),
            field: [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)],
            optical_path_length: 0.0,
            energy: 500.0,
            order: 0,
            object_id: -1,
            source_id: 0,
            event_type: EventType::Emitted,
            rand_counter: 0,
        }
    }

    #[test]
    fn writes_header_then_masked_columns() {
        let mut buf = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut buf);
            let mask = RayAttrMask::POSITION | RayAttrMask::ENERGY;
            writer.write_batch(&[sample_ray()], mask).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "position_x,position_y,position_z,energy");
        assert_eq!(lines.next().unwrap(), "1,2,3,500");
    }

    #[test]
    fn electric_field_expands_to_re_im_pair() {
        let mut buf = Vec::new();
        {
            let mut writer = CsvWriter::new(&mut buf);
            writer.write_batch(&[sample_ray()], RayAttrMask::ELECTRIC_FIELD_X).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "field_x_re,field_x_im");
        assert_eq!(lines.next().unwrap(), "1,0");
    }
}
