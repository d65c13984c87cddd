//! Version tables of the binary format.
//!
//! Which fields a binary document contains, and in which order, depends on
//! the file version written in its header. Piece records carry a second,
//! per-record version. Both are described here as tables of
//! `(field, version range)` that the reader and writer walk in order.

/// Newest file version, the one written.
pub const WRITE_VERSION: f32 = 1.5;
pub const WRITE_VERSION_TEXT: &str = "1.5";

/// Newest piece record version, the one written.
pub const PIECE_RECORD_VERSION: u8 = 5;

/// Files up to this version use the fixed 36-byte piece record.
pub const OLD_RECORD_MAX_VERSION: f32 = 0.4;

/// File versions a field is present in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VersionRange {
    min: f32,
    min_inclusive: bool,
    /// Exclusive
    max: f32,
}

impl VersionRange {
    pub const ALL: VersionRange = VersionRange {
        min: f32::NEG_INFINITY,
        min_inclusive: true,
        max: f32::INFINITY,
    };

    /// Versions strictly newer than `version`.
    pub const fn above(version: f32) -> Self {
        Self {
            min: version,
            min_inclusive: false,
            max: f32::INFINITY,
        }
    }

    /// `version` and newer.
    pub const fn from(version: f32) -> Self {
        Self {
            min: version,
            min_inclusive: true,
            max: f32::INFINITY,
        }
    }

    /// Versions strictly older than `version`.
    pub const fn below(version: f32) -> Self {
        Self {
            min: f32::NEG_INFINITY,
            min_inclusive: true,
            max: version,
        }
    }

    /// `from` up to but excluding `until`.
    pub const fn span(from: f32, until: f32) -> Self {
        Self {
            min: from,
            min_inclusive: true,
            max: until,
        }
    }

    /// Same lower bound, ending before `version`.
    pub const fn until(self, version: f32) -> Self {
        Self { max: version, ..self }
    }

    pub fn contains(&self, version: f32) -> bool {
        let lower = if self.min_inclusive {
            version >= self.min
        } else {
            version > self.min
        };
        lower && version < self.max
    }
}

/// Document-level fields, in file order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// f32 copy of the header version
    FloatVersion,
    /// u32 packed RGB
    Background,
    /// 6 × f64 view of very old files, skipped
    LegacyView,
    AngleSnap,
    Snap,
    LineWidth,
    Detail,
    CurrentGroup,
    CurrentColor,
    Action,
    CurrentStep,
    /// u32 bit flags, see `SCENE_*` in the binary module
    SceneFlags,
    /// i32 count and piece records
    Pieces,
    /// Author, description and comments
    Strings,
    /// i32 count and group records
    Groups,
    /// i32 viewport layout
    ViewportLegacy,
    /// u8 layout, u8 active viewport
    Viewport,
    /// i32 count and camera records
    Cameras,
    /// 4 × i32 camera index per viewport
    ViewportCameras,
    FogColor,
    /// u32 density × 100
    FogDensityLegacy,
    /// f32 density
    FogDensity,
    /// Path with a u8 (0xFF-escaped) length
    BackgroundImageShort,
    /// Path with a u16 length
    BackgroundImage,
    HeaderFooter,
    Ambient,
    /// 3 × i32 and u8 animation state, skipped
    AnimationLegacy,
    /// 2 × u16 and u8 animation state, skipped
    Animation,
    /// f32 move snap, skipped
    MoveSnap,
    /// Top and bottom u32 packed RGB
    Gradient,
    /// i32 count and light records
    Lights,
}

pub const FILE_LAYOUT: &[(Field, VersionRange)] = &[
    (Field::FloatVersion, VersionRange::above(0.4)),
    (Field::Background, VersionRange::ALL),
    (Field::LegacyView, VersionRange::below(0.6)),
    (Field::AngleSnap, VersionRange::ALL),
    (Field::Snap, VersionRange::ALL),
    (Field::LineWidth, VersionRange::ALL),
    (Field::Detail, VersionRange::ALL),
    (Field::CurrentGroup, VersionRange::ALL),
    (Field::CurrentColor, VersionRange::ALL),
    (Field::Action, VersionRange::ALL),
    (Field::CurrentStep, VersionRange::ALL),
    (Field::SceneFlags, VersionRange::above(0.8)),
    (Field::Pieces, VersionRange::ALL),
    (Field::Strings, VersionRange::from(0.4)),
    (Field::Groups, VersionRange::from(0.5)),
    (Field::ViewportLegacy, VersionRange::span(0.6, 1.0)),
    (Field::Viewport, VersionRange::from(1.0)),
    (Field::Cameras, VersionRange::from(0.6)),
    (Field::ViewportCameras, VersionRange::from(0.7)),
    (Field::FogColor, VersionRange::from(0.7)),
    (Field::FogDensityLegacy, VersionRange::span(0.7, 1.0)),
    (Field::FogDensity, VersionRange::from(1.0)),
    (Field::BackgroundImageShort, VersionRange::span(0.7, 1.3)),
    (Field::BackgroundImage, VersionRange::from(1.3)),
    (Field::HeaderFooter, VersionRange::from(0.8)),
    (Field::Ambient, VersionRange::above(0.9)),
    (Field::AnimationLegacy, VersionRange::above(0.9).until(1.3)),
    (Field::Animation, VersionRange::from(1.3)),
    (Field::MoveSnap, VersionRange::from(1.4)),
    (Field::Gradient, VersionRange::above(1.0)),
    (Field::Lights, VersionRange::from(1.2)),
];

/// Fields present in a file of `version`, in order.
pub fn file_fields(version: f32) -> impl Iterator<Item = Field> {
    FILE_LAYOUT
        .iter()
        .filter(move |(_, range)| range.contains(version))
        .map(|(field, _)| *field)
}

/// Piece record versions a field is present in, `min..max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordRange {
    pub min: u8,
    pub max: u8,
}

impl RecordRange {
    pub const ALL: RecordRange = RecordRange { min: 0, max: u8::MAX };

    pub const fn from(version: u8) -> Self {
        Self { min: version, max: u8::MAX }
    }

    pub const fn below(version: u8) -> Self {
        Self { min: 0, max: version }
    }

    pub const fn span(from: u8, until: u8) -> Self {
        Self { min: from, max: until }
    }

    pub fn contains(&self, version: u8) -> bool {
        version >= self.min && version < self.max
    }
}

/// Fields of a versioned piece record, in record order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PieceField {
    /// Position f32 × 3 and rotation f32 × 3 in degrees
    PositionRotation,
    /// 16 × f32, column major
    Matrix,
    /// u8 legacy palette index
    ColorIndex,
    /// u32 LDraw color code
    ColorCode,
    /// u8 show step, 255 is `STEP_MAX`
    ShowByte,
    HideByte,
    /// u32 show step
    Show,
    Hide,
    /// [u8; 9] NUL padded
    FixedName,
    /// Length-prefixed string
    Name,
    /// i32 index into the group table, -1 for none
    Group,
}

pub const PIECE_LAYOUT: &[(PieceField, RecordRange)] = &[
    (PieceField::PositionRotation, RecordRange::below(3)),
    (PieceField::Matrix, RecordRange::from(3)),
    (PieceField::ColorIndex, RecordRange::below(4)),
    (PieceField::ColorCode, RecordRange::from(4)),
    (PieceField::ShowByte, RecordRange::below(4)),
    (PieceField::HideByte, RecordRange::span(2, 4)),
    (PieceField::Show, RecordRange::from(4)),
    (PieceField::Hide, RecordRange::from(4)),
    (PieceField::FixedName, RecordRange::below(5)),
    (PieceField::Name, RecordRange::from(5)),
    (PieceField::Group, RecordRange::ALL),
];

/// Fields present in a piece record of `version`, in order.
pub fn piece_fields(version: u8) -> impl Iterator<Item = PieceField> {
    PIECE_LAYOUT
        .iter()
        .filter(move |(_, range)| range.contains(version))
        .map(|(field, _)| *field)
}
