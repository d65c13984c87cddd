//! Legacy versioned binary format.
//!
//! A 32-byte header `LeoCAD <version> Project` is followed by the fields
//! listed in [`FILE_LAYOUT`](super::layout::FILE_LAYOUT) for that version.
//! Every read is bounds-checked. Running out of data fails the load with
//! [`Error::Truncated`]; strings longer than their field allows are skipped.

use glam::EulerRot;

use crate::core::error::Error;
use crate::core::types::{Mat4, Result, Step, Vec3, STEP_MAX};
use crate::model::{Camera, GroupId, Light, Model, Piece, PieceId, StepRange};

use super::colors::legacy_color;
use super::layout::{
    file_fields, piece_fields, Field, PieceField, OLD_RECORD_MAX_VERSION, PIECE_RECORD_VERSION,
    WRITE_VERSION, WRITE_VERSION_TEXT,
};
use super::reader::{ByteReader, ByteWriter};

pub const SIGNATURE: &[u8] = b"LeoCAD ";
const HEADER_SIZE: usize = 32;

/// `SceneFlags` bit: the gradient colors are in use.
const SCENE_GRADIENT: u32 = 1 << 0;

const GROUP_RECORD_VERSION: u8 = 1;
const GROUP_NAME_LEN: usize = 65;
const OLD_NAME_LEN: usize = 9;
const OLD_POSITION_SCALE: f32 = 25.0;

const NAME_MAX: usize = 256;
const TEXT_MAX: usize = 1024;
const COMMENTS_MAX: usize = u16::MAX as usize;

fn parse_decimal(text: &str) -> Option<f32> {
    text.parse::<f32>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Version number from the header. A decimal comma written by a
/// localized writer is accepted.
fn parse_version(data: &[u8]) -> Result<f32> {
    if !data.starts_with(SIGNATURE) {
        return Err(Error::UnrecognizedFormat("missing LeoCAD signature".to_string()));
    }

    let header = &data[SIGNATURE.len()..data.len().min(HEADER_SIZE)];
    let end = header.iter().position(|&b| b == 0).unwrap_or(header.len());
    let text = String::from_utf8_lossy(&header[..end]);
    let token = text.split_whitespace().next().unwrap_or("");

    let swapped: String = token
        .chars()
        .map(|c| match c {
            ',' => '.',
            '.' => ',',
            c => c,
        })
        .collect();
    let version = parse_decimal(token)
        .or_else(|| parse_decimal(&swapped))
        .ok_or_else(|| Error::UnrecognizedFormat(format!("bad version '{token}'")))?;

    if version > WRITE_VERSION {
        return Err(Error::UnrecognizedFormat(format!("unsupported version {version}")));
    }
    Ok(version)
}

fn step_from_u8(v: u8) -> Step {
    match v {
        0 => 1,
        255 => STEP_MAX,
        v => v as Step,
    }
}

fn hide_from_u8(v: u8) -> Step {
    match v {
        0 | 255 => STEP_MAX,
        v => v as Step,
    }
}

fn step_from_u32(v: u32) -> Step {
    v.max(1)
}

fn hide_from_u32(v: u32) -> Step {
    if v == 0 { STEP_MAX } else { v }
}

/// Placement from a position and Z∘Y∘X rotation in degrees.
fn placement(position: Vec3, rotation: Vec3) -> Mat4 {
    let rotation = Mat4::from_euler(
        EulerRot::ZYX,
        rotation.z.to_radians(),
        rotation.y.to_radians(),
        rotation.x.to_radians(),
    );
    Mat4::from_translation(position) * rotation
}

/// Old documents name parts without their file extension.
fn part_file_name(name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{name}.dat")
    }
}

struct Loader<'a> {
    model: &'a mut Model,
    version: f32,
    flags: u32,
    gradient: Option<(Vec3, Vec3)>,
    /// Group table index saved with each piece, in read order
    piece_groups: Vec<(PieceId, i32)>,
    /// Groups in table order with their saved parent index
    groups: Vec<(GroupId, i32)>,
}

impl Loader<'_> {
    fn count(&self, reader: &mut ByteReader, what: &str) -> Result<usize> {
        let offset = reader.position();
        let count = reader.i32()?;
        match usize::try_from(count) {
            Ok(count) => Ok(count),
            Err(_) => {
                log::warn!("Negative {} count {} at offset {}, reading none", what, count, offset);
                Ok(0)
            }
        }
    }

    fn read_field(&mut self, field: Field, reader: &mut ByteReader) -> Result<()> {
        let properties = &mut self.model.properties;
        match field {
            Field::FloatVersion => {
                let version = reader.f32()?;
                if (version - self.version).abs() > 1e-3 {
                    log::debug!("Header version {} but stored version {}", self.version, version);
                }
            }
            Field::Background => properties.background_color = reader.rgb()?,
            Field::LegacyView => reader.skip(6 * 8)?,
            Field::AngleSnap
            | Field::Snap
            | Field::LineWidth
            | Field::Detail
            | Field::CurrentGroup
            | Field::CurrentColor
            | Field::Action
            | Field::ViewportLegacy
            | Field::MoveSnap => reader.skip(4)?,
            Field::CurrentStep => {
                self.model.current_step = step_from_u32(reader.i32()?.max(1) as u32);
            }
            Field::SceneFlags => self.flags = reader.u32()?,
            Field::Pieces => {
                let count = self.count(reader, "piece")?;
                for _ in 0..count {
                    if self.version <= OLD_RECORD_MAX_VERSION {
                        self.read_old_piece(reader)?;
                    } else {
                        self.read_piece(reader)?;
                    }
                }
            }
            Field::Strings => {
                properties.author = reader.string(TEXT_MAX)?;
                properties.description = reader.string(TEXT_MAX)?;
                properties.comments = reader.string(COMMENTS_MAX)?;
            }
            Field::Groups => self.read_groups(reader)?,
            Field::Viewport => reader.skip(2)?,
            Field::Cameras => self.read_cameras(reader)?,
            Field::ViewportCameras => reader.skip(4 * 4)?,
            Field::FogColor => properties.fog_color = reader.rgb()?,
            Field::FogDensityLegacy => properties.fog_density = reader.u32()? as f32 / 100.0,
            Field::FogDensity => properties.fog_density = reader.f32()?,
            Field::BackgroundImageShort => properties.background_image = reader.string(TEXT_MAX)?,
            Field::BackgroundImage => properties.background_image = reader.long_string(TEXT_MAX)?,
            Field::HeaderFooter => {
                properties.header = reader.string(TEXT_MAX)?;
                properties.footer = reader.string(TEXT_MAX)?;
            }
            Field::Ambient => properties.ambient_color = reader.rgb()?,
            Field::AnimationLegacy => reader.skip(3 * 4 + 1)?,
            Field::Animation => reader.skip(2 * 2 + 1)?,
            Field::Gradient => {
                let top = reader.rgb()?;
                let bottom = reader.rgb()?;
                if self.flags & SCENE_GRADIENT != 0 {
                    self.gradient = Some((top, bottom));
                }
            }
            Field::Lights => self.read_lights(reader)?,
        }
        Ok(())
    }

    fn place(&mut self, name: &str, color: u32, transform: Mat4, steps: StepRange, group: i32) -> Result<()> {
        let Some(part) = self.model.resolve_part(&part_file_name(name))? else {
            log::warn!("Skipping piece '{}', the part cannot be placed", name);
            return Ok(());
        };
        let id = PieceId(self.model.alloc_id());
        self.model.pieces.push(Piece::new(id, part, color, transform, steps));
        self.piece_groups.push((id, group));
        Ok(())
    }

    /// Fixed 36-byte record of the oldest documents.
    fn read_old_piece(&mut self, reader: &mut ByteReader) -> Result<()> {
        let position = reader.vec3()? * OLD_POSITION_SCALE;
        let rotation = reader.vec3()?;
        let color = legacy_color(reader.u8()?, self.model.config.default_part_color);
        let name = reader.fixed_string(OLD_NAME_LEN)?;
        let show = step_from_u8(reader.u8()?);
        // Group byte, never used by these versions
        reader.skip(1)?;
        self.place(&name, color, placement(position, rotation), StepRange::new(show), -1)
    }

    fn read_piece(&mut self, reader: &mut ByteReader) -> Result<()> {
        let offset = reader.position();
        let version = reader.u8()?;
        if version == 0 || version > PIECE_RECORD_VERSION {
            return Err(Error::UnrecognizedFormat(format!(
                "piece record version {version} at offset {offset}"
            )));
        }

        let mut transform = Mat4::IDENTITY;
        let mut color = self.model.config.default_part_color;
        let (mut show, mut hide) = (1, STEP_MAX);
        let mut name = String::new();
        let mut group = -1;

        for field in piece_fields(version) {
            match field {
                PieceField::PositionRotation => {
                    let position = reader.vec3()?;
                    let rotation = reader.vec3()?;
                    transform = placement(position, rotation);
                }
                PieceField::Matrix => {
                    let mut cols = [0.0f32; 16];
                    for value in &mut cols {
                        *value = reader.f32()?;
                    }
                    transform = Mat4::from_cols_array(&cols);
                }
                PieceField::ColorIndex => {
                    color = legacy_color(reader.u8()?, self.model.config.default_part_color);
                }
                PieceField::ColorCode => color = reader.u32()?,
                PieceField::ShowByte => show = step_from_u8(reader.u8()?),
                PieceField::HideByte => hide = hide_from_u8(reader.u8()?),
                PieceField::Show => show = step_from_u32(reader.u32()?),
                PieceField::Hide => hide = hide_from_u32(reader.u32()?),
                PieceField::FixedName => name = reader.fixed_string(OLD_NAME_LEN)?,
                PieceField::Name => name = reader.string(NAME_MAX)?,
                PieceField::Group => group = reader.i32()?,
            }
        }

        self.place(&name, color, transform, StepRange { show, hide }, group)
    }

    fn read_groups(&mut self, reader: &mut ByteReader) -> Result<()> {
        let count = self.count(reader, "group")?;
        for _ in 0..count {
            let version = reader.u8()?;
            if version != GROUP_RECORD_VERSION {
                log::debug!("Group record version {}", version);
            }
            let name = reader.fixed_string(GROUP_NAME_LEN)?;
            let center = reader.vec3()?;
            let parent = reader.i32()?;

            let id = self.model.add_group(&name, None);
            if let Some(group) = self.model.groups.last_mut() {
                group.center = center;
            }
            self.groups.push((id, parent));
        }
        Ok(())
    }

    fn read_cameras(&mut self, reader: &mut ByteReader) -> Result<()> {
        let count = self.count(reader, "camera")?;
        for _ in 0..count {
            let name = reader.string(NAME_MAX)?;
            let position = reader.vec3()?;
            let target = reader.vec3()?;
            let up = reader.vec3()?;
            let mut camera = Camera::new(name, position, target, up);
            camera.fov = reader.f32()?;
            camera.near = reader.f32()?;
            camera.far = reader.f32()?;
            let show = step_from_u32(reader.u32()?);
            camera.steps = StepRange::with_hide(show, hide_from_u32(reader.u32()?));
            self.model.add_camera(camera);
        }
        Ok(())
    }

    fn read_lights(&mut self, reader: &mut ByteReader) -> Result<()> {
        let count = self.count(reader, "light")?;
        for _ in 0..count {
            let name = reader.string(NAME_MAX)?;
            let position = reader.vec3()?;
            let target = reader.vec3()?;
            let mut light = Light::new(name, position, target);
            light.attenuation = reader.vec3()?;
            let show = step_from_u32(reader.u32()?);
            light.steps = StepRange::with_hide(show, hide_from_u32(reader.u32()?));
            self.model.add_light(light);
        }
        Ok(())
    }

    /// Turn saved table indices into group handles. An index of -1 or past
    /// the end of the table means no group.
    fn resolve_groups(&mut self) {
        let table: Vec<GroupId> = self.groups.iter().map(|(id, _)| *id).collect();
        let lookup = |index: i32| usize::try_from(index).ok().and_then(|i| table.get(i)).copied();

        for (id, parent) in &self.groups {
            let parent = lookup(*parent).filter(|p| p != id);
            if let Some(group) = self.model.groups.iter_mut().find(|g| g.id == *id) {
                group.parent = parent;
            }
        }

        for (piece, (id, index)) in self.model.pieces.iter_mut().zip(&self.piece_groups) {
            if piece.id == *id {
                piece.group = lookup(*index);
            }
        }

        self.model.break_group_cycles();
    }
}

/// Read a binary document into an empty `model`.
pub fn read(model: &mut Model, data: &[u8]) -> Result<()> {
    let version = parse_version(data)?;
    let mut reader = ByteReader::new(data);
    reader.skip(HEADER_SIZE)?;

    let mut loader = Loader {
        model,
        version,
        flags: 0,
        gradient: None,
        piece_groups: Vec::new(),
        groups: Vec::new(),
    };
    for field in file_fields(version) {
        loader.read_field(field, &mut reader)?;
    }
    loader.resolve_groups();
    if reader.remaining() > 0 {
        log::debug!("Ignoring {} trailing bytes", reader.remaining());
    }

    let gradient = loader.gradient;
    let model = loader.model;
    model.properties.background_gradient = gradient;
    model.sort_pieces();
    let pruned = model.remove_empty_groups();
    model.update_part_children();

    log::debug!(
        "Read binary version {}: {} pieces, {} groups ({} pruned)",
        version,
        model.pieces.len(),
        model.groups.len(),
        pruned
    );
    Ok(())
}

fn clip(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

struct Writer<'a> {
    model: &'a Model,
    out: ByteWriter,
    groups: Vec<GroupId>,
}

impl Writer<'_> {
    fn group_index(&self, group: Option<GroupId>) -> i32 {
        group
            .and_then(|id| self.groups.iter().position(|g| *g == id))
            .map_or(-1, |index| index as i32)
    }

    fn write_field(&mut self, field: Field) {
        let properties = &self.model.properties;
        let out = &mut self.out;
        match field {
            Field::FloatVersion => out.f32(WRITE_VERSION),
            Field::Background => out.rgb(properties.background_color),
            Field::AngleSnap => out.i32(30),
            Field::Snap => out.u32(0),
            Field::LineWidth => out.f32(1.0),
            Field::Detail => out.u32(0),
            Field::CurrentGroup => out.i32(-1),
            Field::CurrentColor | Field::Action => out.i32(0),
            Field::CurrentStep => out.i32(i32::try_from(self.model.current_step).unwrap_or(i32::MAX)),
            Field::SceneFlags => {
                let flags = if properties.background_gradient.is_some() { SCENE_GRADIENT } else { 0 };
                out.u32(flags);
            }
            Field::Pieces => self.write_pieces(),
            Field::Strings => {
                out.string(clip(&properties.author, TEXT_MAX));
                out.string(clip(&properties.description, TEXT_MAX));
                out.string(clip(&properties.comments, COMMENTS_MAX));
            }
            Field::Groups => self.write_groups(),
            Field::Viewport => out.bytes(&[0, 0]),
            Field::Cameras => self.write_cameras(),
            Field::ViewportCameras => {
                for _ in 0..4 {
                    out.i32(-1);
                }
            }
            Field::FogColor => out.rgb(properties.fog_color),
            Field::FogDensity => out.f32(properties.fog_density),
            Field::BackgroundImage => out.long_string(clip(&properties.background_image, TEXT_MAX)),
            Field::HeaderFooter => {
                out.string(clip(&properties.header, TEXT_MAX));
                out.string(clip(&properties.footer, TEXT_MAX));
            }
            Field::Ambient => out.rgb(properties.ambient_color),
            Field::Animation => out.bytes(&[0; 5]),
            Field::MoveSnap => out.f32(0.0),
            Field::Gradient => {
                let (top, bottom) = properties
                    .background_gradient
                    .unwrap_or((properties.background_color, properties.background_color));
                out.rgb(top);
                out.rgb(bottom);
            }
            Field::Lights => self.write_lights(),
            // Absent from the written version
            Field::LegacyView
            | Field::ViewportLegacy
            | Field::FogDensityLegacy
            | Field::BackgroundImageShort
            | Field::AnimationLegacy => {}
        }
    }

    fn write_pieces(&mut self) {
        self.out.i32(self.model.pieces.len() as i32);
        for piece in &self.model.pieces {
            let group = self.group_index(piece.group);
            let out = &mut self.out;
            out.u8(PIECE_RECORD_VERSION);
            for field in piece_fields(PIECE_RECORD_VERSION) {
                match field {
                    PieceField::Matrix => {
                        for value in piece.transform.to_cols_array() {
                            out.f32(value);
                        }
                    }
                    PieceField::ColorCode => out.u32(piece.color),
                    PieceField::Show => out.u32(piece.steps.show),
                    PieceField::Hide => out.u32(piece.steps.hide),
                    PieceField::Name => out.string(clip(piece.part.name(), NAME_MAX)),
                    PieceField::Group => out.i32(group),
                    PieceField::PositionRotation
                    | PieceField::ColorIndex
                    | PieceField::ShowByte
                    | PieceField::HideByte
                    | PieceField::FixedName => {}
                }
            }
        }
    }

    fn write_groups(&mut self) {
        self.out.i32(self.model.groups.len() as i32);
        for group in &self.model.groups {
            let parent = self.group_index(group.parent);
            self.out.u8(GROUP_RECORD_VERSION);
            self.out.fixed_string(&group.name, GROUP_NAME_LEN);
            self.out.vec3(group.center);
            self.out.i32(parent);
        }
    }

    fn write_cameras(&mut self) {
        let cameras: Vec<&Camera> = self.model.cameras.iter().filter(|c| !c.is_simple()).collect();
        self.out.i32(cameras.len() as i32);
        for camera in cameras {
            self.out.string(clip(&camera.name, NAME_MAX));
            self.out.vec3(camera.position);
            self.out.vec3(camera.target);
            self.out.vec3(camera.up);
            self.out.f32(camera.fov);
            self.out.f32(camera.near);
            self.out.f32(camera.far);
            self.out.u32(camera.steps.show);
            self.out.u32(camera.steps.hide);
        }
    }

    fn write_lights(&mut self) {
        self.out.i32(self.model.lights.len() as i32);
        for light in &self.model.lights {
            self.out.string(clip(&light.name, NAME_MAX));
            self.out.vec3(light.position);
            self.out.vec3(light.target);
            self.out.vec3(light.attenuation);
            self.out.u32(light.steps.show);
            self.out.u32(light.steps.hide);
        }
    }
}

/// Serialize `model` as a binary document of the newest version.
pub fn write(model: &Model) -> Vec<u8> {
    let mut header = format!("LeoCAD {WRITE_VERSION_TEXT} Project").into_bytes();
    header.resize(HEADER_SIZE, 0);

    let mut writer = Writer {
        model,
        out: ByteWriter::new(),
        groups: model.groups.iter().map(|g| g.id).collect(),
    };
    writer.out.bytes(&header);
    for field in file_fields(WRITE_VERSION) {
        writer.write_field(field);
    }

    log::debug!("Wrote binary version {}: {} bytes", WRITE_VERSION, writer.out.len());
    writer.out.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{add_brick, test_model};
    use crate::model::ModelProperties;

    fn header(version: &str) -> ByteWriter {
        let mut out = ByteWriter::new();
        let mut bytes = format!("LeoCAD {version} Project").into_bytes();
        bytes.resize(HEADER_SIZE, 0);
        out.bytes(&bytes);
        out
    }

    /// Angle snap through current step.
    fn settings(out: &mut ByteWriter, current_step: i32) {
        out.i32(30);
        out.u32(0);
        out.f32(1.0);
        out.u32(0);
        out.i32(-1);
        out.i32(0);
        out.i32(0);
        out.i32(current_step);
    }

    /// A version 0.3 document with five old fixed-size piece records.
    fn old_document(version: &str) -> Vec<u8> {
        let mut out = header(version);
        out.u32(0x00FF_FFFF);
        for _ in 0..6 {
            out.f64(0.0);
        }
        settings(&mut out, 2);

        let steps = [1u8, 1, 2, 2, 3];
        out.i32(5);
        for (i, step) in steps.iter().enumerate() {
            let start = out.len();
            out.vec3(Vec3::new(i as f32, 0.0, 0.0));
            let rotation = if i == 0 { Vec3::new(0.0, 0.0, 90.0) } else { Vec3::ZERO };
            out.vec3(rotation);
            out.u8(i as u8);
            out.fixed_string("3001", OLD_NAME_LEN);
            out.u8(*step);
            out.u8(0);
            assert_eq!(out.len() - start, 36);
        }
        out.into_inner()
    }

    #[test]
    fn test_old_fixed_records() {
        let mut model = test_model();
        model.load(&old_document("0.3")).unwrap();

        let pieces = model.pieces();
        assert_eq!(pieces.len(), 5);
        assert_eq!(model.current_step(), 2);
        assert_eq!(model.properties().background_color, Vec3::ONE);

        let colors: Vec<u32> = pieces.iter().map(|p| p.color()).collect();
        assert_eq!(colors, vec![4, 12, 2, 10, 1]);
        let shows: Vec<Step> = pieces.iter().map(|p| p.steps().show).collect();
        assert_eq!(shows, vec![1, 1, 2, 2, 3]);

        assert_eq!(pieces[4].position(), Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(pieces[4].part().name(), "3001.dat");

        let rotated = pieces[0].transform().transform_vector3(Vec3::X);
        assert!((rotated - Vec3::Y).length() < 1e-5);
        assert!(pieces.iter().all(|p| p.group().is_none()));
    }

    #[test]
    fn test_localized_decimal_comma() {
        let mut model = test_model();
        model.load(&old_document("0,3")).unwrap();
        assert_eq!(model.pieces().len(), 5);
    }

    #[test]
    fn test_bad_headers() {
        let mut model = test_model();
        assert!(matches!(read(&mut model, b"LDraw 0.3"), Err(Error::UnrecognizedFormat(_))));
        assert!(matches!(read(&mut model, &header("0.0").into_inner()), Err(Error::UnrecognizedFormat(_))));
        assert!(matches!(read(&mut model, &header("2.0").into_inner()), Err(Error::UnrecognizedFormat(_))));
    }

    fn versioned_piece(out: &mut ByteWriter, position: Vec3, color: u8, hide: u8, group: i32) {
        out.u8(2);
        out.vec3(position);
        out.vec3(Vec3::ZERO);
        out.u8(color);
        out.u8(1);
        out.u8(hide);
        out.fixed_string("3003", OLD_NAME_LEN);
        out.i32(group);
    }

    #[test]
    fn test_versioned_records_and_group_table() {
        let mut out = header("0.5");
        out.f32(0.5);
        out.u32(0x0000_00FF);
        for _ in 0..6 {
            out.f64(0.0);
        }
        settings(&mut out, 1);

        out.i32(5);
        versioned_piece(&mut out, Vec3::new(1.0, 2.0, 3.0), 0, 3, 0);
        versioned_piece(&mut out, Vec3::ZERO, 1, 0, 0);
        versioned_piece(&mut out, Vec3::ZERO, 2, 0, 1);
        versioned_piece(&mut out, Vec3::ZERO, 3, 0, 1);
        versioned_piece(&mut out, Vec3::ZERO, 200, 0, 5);

        out.string("Someone");
        out.string(&"d".repeat(2000));
        out.string("Notes");

        out.i32(2);
        out.u8(GROUP_RECORD_VERSION);
        out.fixed_string("Wall", GROUP_NAME_LEN);
        out.vec3(Vec3::new(1.0, 2.0, 3.0));
        out.i32(-1);
        out.u8(GROUP_RECORD_VERSION);
        out.fixed_string("Roof", GROUP_NAME_LEN);
        out.vec3(Vec3::ZERO);
        out.i32(0);

        let mut model = test_model();
        model.load(&out.into_inner()).unwrap();

        let properties = model.properties();
        assert_eq!(properties.background_color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(properties.author, "Someone");
        assert_eq!(properties.description, "");
        assert_eq!(properties.comments, "Notes");

        let pieces = model.pieces();
        assert_eq!(pieces.len(), 5);
        assert_eq!(pieces[0].position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pieces[0].steps().hide, 3);
        assert_eq!(pieces[1].steps().hide, STEP_MAX);
        assert_eq!(pieces[4].color(), model.config().default_part_color);

        let wall = model.group_by_name("Wall").unwrap();
        let roof = model.group_by_name("Roof").unwrap();
        assert_eq!(wall.center, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(roof.parent(), Some(wall.id()));
        assert_eq!(pieces[0].group(), Some(wall.id()));
        assert_eq!(pieces[2].group(), Some(roof.id()));
        assert_eq!(pieces[4].group(), None);
    }

    #[test]
    fn test_round_trip() {
        let mut model = test_model();
        let a = add_brick(&mut model, 0.0, 1);
        let b = add_brick(&mut model, 40.0, 2);
        let c = add_brick(&mut model, 80.0, 2);
        model
            .add_piece_by_name("3003.dat", 1, Mat4::from_rotation_z(1.0), StepRange::with_hide(2, 4))
            .unwrap();

        let outer = model.add_group("Outer", None);
        let inner = model.add_group("Inner", Some(outer));
        for (piece, group) in [(a, outer), (b, inner), (c, inner)] {
            let index = model.piece_index(piece).unwrap();
            model.pieces[index].group = Some(group);
        }

        let mut camera = Camera::new("Overview", Vec3::new(10.0, -500.0, 200.0), Vec3::ZERO, Vec3::Z);
        camera.fov = 45.0;
        model.add_camera(camera);
        let mut light = Light::new("Sun", Vec3::new(0.0, 0.0, 1000.0), Vec3::ZERO);
        light.attenuation = Vec3::new(1.0, 0.5, 0.0);
        model.add_light(light);

        model.properties = ModelProperties {
            author: "Someone".to_string(),
            comments: "line one\nline two".to_string(),
            background_gradient: Some((Vec3::new(0.0, 0.0, 1.0), Vec3::ONE)),
            background_image: "sky.png".to_string(),
            fog_density: 0.25,
            header: "Page &P".to_string(),
            ..ModelProperties::default()
        };
        model.set_current_step(2);

        let mut loaded = test_model();
        loaded.load(&write(&model)).unwrap();

        assert_eq!(loaded.properties(), model.properties());
        assert_eq!(loaded.current_step(), 2);
        assert_eq!(loaded.pieces().len(), 4);
        for (read, written) in loaded.pieces().iter().zip(model.pieces()) {
            assert_eq!(read.part().name(), written.part().name());
            assert_eq!(read.color(), written.color());
            assert_eq!(read.transform(), written.transform());
            assert_eq!(read.steps(), written.steps());
        }

        let outer = loaded.group_by_name("Outer").unwrap().id();
        let inner = loaded.group_by_name("Inner").unwrap();
        assert_eq!(inner.parent(), Some(outer));
        assert_eq!(loaded.pieces()[0].group(), Some(outer));
        assert_eq!(loaded.pieces()[1].group(), Some(inner.id()));

        assert_eq!(loaded.cameras().iter().filter(|c| c.is_simple()).count(), 7);
        let overview = loaded.get_camera_by_name("Overview").unwrap();
        assert_eq!(overview.fov, 45.0);
        assert_eq!(overview.position, Vec3::new(10.0, -500.0, 200.0));
        assert_eq!(loaded.lights().len(), 1);
        assert_eq!(loaded.lights()[0].attenuation, Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_truncated_document_fails_whole_load() {
        let mut model = test_model();
        add_brick(&mut model, 0.0, 1);
        add_brick(&mut model, 40.0, 1);
        let data = write(&model);

        let mut target = test_model();
        add_brick(&mut target, 0.0, 1);
        let result = target.load(&data[..data.len() - 3]);
        assert!(matches!(result, Err(Error::Truncated { .. })));
        assert_eq!(target.pieces().len(), 1);
    }
}
