//! Line-based text format.
//!
//! A document is a sequence of LDraw lines with `0 !LEOCAD` meta commands:
//!
//! ```text
//! 0 !LEOCAD MODEL AUTHOR someone
//! 0 !LEOCAD GROUP BEGIN Wall
//! 0 !LEOCAD GROUP CENTER 40 0 -12
//! 1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat
//! 0 !LEOCAD GROUP END
//! 0 STEP
//! 0 !LEOCAD PIECE STEP_HIDE 4
//! 1 1 0 -24 0 1 0 0 0 1 0 0 0 1 3003.dat
//! 0 !LEOCAD CAMERA FOV 30 ZNEAR 25 ZFAR 50000 POSITION 0 -100 0 TARGET_POSITION 0 0 0 UP_VECTOR 0 0 1 NAME Camera 1
//! ```
//!
//! Placement matrices are in LDraw axes (-Y up) and converted to the
//! model's Z-up axes on read. Lines this engine does not model are kept and
//! written back at their position within their step.

use std::fmt::Write as _;

use crate::core::types::{Mat4, Result, Step, Vec3, STEP_MAX};
use crate::model::{Camera, ForeignLine, GroupId, Light, Model, Piece, PieceId, StepRange};

const EOL: &str = "\r\n";

/// LDraw axis feeding each model axis, and its sign.
const AXIS: [usize; 3] = [0, 2, 1];
const SIGN: [f32; 3] = [1.0, -1.0, 1.0];

/// Convert `x y z a b c d e f g h i` to a model transform.
pub(crate) fn ldraw_to_model(n: &[f32; 12]) -> Mat4 {
    let mut cols = [[0.0f32; 4]; 4];
    for i in 0..3 {
        for j in 0..3 {
            cols[j][i] = SIGN[i] * SIGN[j] * n[3 + AXIS[i] * 3 + AXIS[j]];
        }
        cols[3][i] = SIGN[i] * n[AXIS[i]];
    }
    cols[3][3] = 1.0;
    Mat4::from_cols_array_2d(&cols)
}

/// Inverse of [`ldraw_to_model`].
pub(crate) fn model_to_ldraw(m: &Mat4) -> [f32; 12] {
    let cols = m.to_cols_array_2d();
    let mut n = [0.0f32; 12];
    for i in 0..3 {
        for j in 0..3 {
            n[3 + AXIS[i] * 3 + AXIS[j]] = SIGN[i] * SIGN[j] * cols[j][i];
        }
        n[AXIS[i]] = SIGN[i] * cols[3][i];
    }
    n
}

/// Shortest round-trip float text, without negative zero.
fn num(v: f32) -> f32 {
    v + 0.0
}

fn vec3(v: Vec3) -> String {
    format!("{} {} {}", num(v.x), num(v.y), num(v.z))
}

/// Remainder of `line` after skipping `count` whitespace-separated tokens.
fn rest_after(line: &str, count: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..count {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest.trim_end()
}

fn parse_vec3(tokens: &[&str]) -> Option<Vec3> {
    match tokens {
        [x, y, z, ..] => Some(Vec3::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?)),
        _ => None,
    }
}

fn parse_placement(line: &str) -> Option<(u32, Mat4, &str)> {
    let mut tokens = line.split_whitespace();
    tokens.next()?;
    let color: u32 = tokens.next()?.parse().ok()?;
    let mut numbers = [0.0f32; 12];
    for n in &mut numbers {
        *n = tokens.next()?.parse().ok()?;
    }
    let name = rest_after(line, 14);
    if name.is_empty() {
        return None;
    }
    Some((color, ldraw_to_model(&numbers), name))
}

/// Parse state carried from meta lines to the next placement.
struct Reader<'a> {
    model: &'a mut Model,
    step: Step,
    groups: Vec<GroupId>,
    hidden: bool,
    hide_step: Option<Step>,
}

impl Reader<'_> {
    fn foreign(&mut self, line_no: usize, raw: &str) {
        self.model.foreign_lines.push(ForeignLine {
            step: self.step,
            line: line_no,
            text: raw.to_string(),
        });
    }

    fn read_line(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["0", "STEP", ..] => {
                self.step = self.step.saturating_add(1).min(STEP_MAX - 1);
            }
            ["0", "!LEOCAD", "MODEL", key, ..] => {
                if !self.read_property(key, rest_after(raw, 4)) {
                    self.foreign(line_no, raw);
                }
            }
            ["0", "!LEOCAD", "PIECE", "HIDDEN", ..] => self.hidden = true,
            ["0", "!LEOCAD", "PIECE", "STEP_HIDE", step, ..] => match step.parse::<Step>() {
                Ok(step) => self.hide_step = Some(step.max(1)),
                Err(_) => {
                    log::warn!("Line {}: bad hide step '{}'", line_no + 1, step);
                }
            },
            ["0", "!LEOCAD", "GROUP", "BEGIN", ..] => {
                let parent = self.groups.last().copied();
                let group = self.model.get_group(rest_after(raw, 4), parent, true)?;
                self.groups.push(group);
            }
            ["0", "!LEOCAD", "GROUP", "CENTER", values @ ..] => {
                let center = parse_vec3(values);
                let group = self.groups.last().copied();
                match (center, group) {
                    (Some(center), Some(id)) => {
                        if let Some(group) = self.model.groups.iter_mut().find(|g| g.id == id) {
                            group.center = center;
                        }
                    }
                    _ => self.foreign(line_no, raw),
                }
            }
            ["0", "!LEOCAD", "GROUP", "END", ..] => {
                self.groups.pop();
            }
            ["0", "!LEOCAD", "CAMERA", ..] => {
                let camera = read_camera(raw);
                self.model.add_camera(camera);
            }
            ["0", "!LEOCAD", "LIGHT", ..] => {
                let light = read_light(raw);
                self.model.add_light(light);
            }
            ["1", ..] => self.read_placement(line_no, raw)?,
            _ => self.foreign(line_no, raw),
        }
        Ok(())
    }

    fn read_property(&mut self, key: &str, value: &str) -> bool {
        let properties = &mut self.model.properties;
        let values: Vec<&str> = value.split_whitespace().collect();
        match key {
            // The document name belongs to its part definition.
            "NAME" => {}
            "AUTHOR" => properties.author = value.to_string(),
            "DESCRIPTION" => properties.description = value.to_string(),
            "COMMENT" => {
                if !properties.comments.is_empty() {
                    properties.comments.push('\n');
                }
                properties.comments.push_str(value);
            }
            "BACKGROUND_COLOR" => match parse_vec3(&values) {
                Some(color) => properties.background_color = color,
                None => return false,
            },
            "BACKGROUND_GRADIENT" => match (parse_vec3(&values), values.get(3..).and_then(parse_vec3)) {
                (Some(top), Some(bottom)) => properties.background_gradient = Some((top, bottom)),
                _ => return false,
            },
            "BACKGROUND_IMAGE" => properties.background_image = value.to_string(),
            "FOG_COLOR" => match parse_vec3(&values) {
                Some(color) => properties.fog_color = color,
                None => return false,
            },
            "FOG_DENSITY" => match value.parse() {
                Ok(density) => properties.fog_density = density,
                Err(_) => return false,
            },
            "AMBIENT_COLOR" => match parse_vec3(&values) {
                Some(color) => properties.ambient_color = color,
                None => return false,
            },
            "HEADER" => properties.header = value.to_string(),
            "FOOTER" => properties.footer = value.to_string(),
            _ => return false,
        }
        true
    }

    fn read_placement(&mut self, line_no: usize, raw: &str) -> Result<()> {
        let hidden = std::mem::take(&mut self.hidden);
        let hide_step = self.hide_step.take();

        let Some((color, transform, name)) = parse_placement(raw) else {
            log::warn!("Line {}: malformed placement kept as is", line_no + 1);
            self.foreign(line_no, raw);
            return Ok(());
        };
        let Some(part) = self.model.resolve_part(name)? else {
            self.foreign(line_no, raw);
            return Ok(());
        };

        let steps = match (hidden, hide_step) {
            (true, hide) => StepRange {
                show: STEP_MAX,
                hide: hide.unwrap_or(STEP_MAX),
            },
            (false, Some(hide)) => StepRange::with_hide(self.step, hide),
            (false, None) => StepRange::new(self.step),
        };

        let id = PieceId(self.model.alloc_id());
        let mut piece = Piece::new(id, part, color, transform, steps);
        piece.group = self.groups.last().copied();
        piece.source_line = Some(line_no);
        self.model.pieces.push(piece);
        Ok(())
    }
}

fn read_steps(tokens: &[&str], show: &mut Step, hide: &mut Step) {
    for pair in tokens.windows(2) {
        match pair {
            ["STEP_SHOW", value] => *show = value.parse().unwrap_or(*show),
            ["STEP_HIDE", value] => *hide = value.parse().unwrap_or(*hide),
            _ => {}
        }
    }
}

/// Tokens after the command word, and the name after `NAME` if present.
fn split_name(line: &str) -> (Vec<&str>, Option<&str>) {
    let body = rest_after(line, 3);
    let tokens: Vec<&str> = body.split_whitespace().collect();
    match tokens.iter().position(|t| *t == "NAME") {
        Some(index) => (tokens[..index].to_vec(), Some(rest_after(body, index + 1))),
        None => (tokens, None),
    }
}

fn read_camera(line: &str) -> Camera {
    let (tokens, name) = split_name(line);
    let mut camera = Camera::new(name.unwrap_or(""), Vec3::new(0.0, -1250.0, 0.0), Vec3::ZERO, Vec3::Z);
    for (index, key) in tokens.iter().enumerate() {
        let values = &tokens[index + 1..];
        match *key {
            "FOV" => camera.fov = values.first().and_then(|v| v.parse().ok()).unwrap_or(camera.fov),
            "ZNEAR" => camera.near = values.first().and_then(|v| v.parse().ok()).unwrap_or(camera.near),
            "ZFAR" => camera.far = values.first().and_then(|v| v.parse().ok()).unwrap_or(camera.far),
            "POSITION" => camera.position = parse_vec3(values).unwrap_or(camera.position),
            "TARGET_POSITION" => camera.target = parse_vec3(values).unwrap_or(camera.target),
            "UP_VECTOR" => camera.up = parse_vec3(values).unwrap_or(camera.up),
            _ => {}
        }
    }
    let (mut show, mut hide) = (1, STEP_MAX);
    read_steps(&tokens, &mut show, &mut hide);
    camera.steps = StepRange::with_hide(show, hide);
    camera
}

fn read_light(line: &str) -> Light {
    let (tokens, name) = split_name(line);
    let mut light = Light::new(name.unwrap_or("Light"), Vec3::ZERO, Vec3::ZERO);
    for (index, key) in tokens.iter().enumerate() {
        let values = &tokens[index + 1..];
        match *key {
            "POSITION" => light.position = parse_vec3(values).unwrap_or(light.position),
            "TARGET_POSITION" => light.target = parse_vec3(values).unwrap_or(light.target),
            "ATTENUATION" => light.attenuation = parse_vec3(values).unwrap_or(light.attenuation),
            _ => {}
        }
    }
    let (mut show, mut hide) = (1, STEP_MAX);
    read_steps(&tokens, &mut show, &mut hide);
    light.steps = StepRange::with_hide(show, hide);
    light
}

/// Read a text document into an empty `model`.
///
/// Malformed lines are kept as foreign lines. Only a placement that would
/// make the document contain itself fails the load.
pub fn read(model: &mut Model, data: &str) -> Result<()> {
    let mut reader = Reader {
        model,
        step: 1,
        groups: Vec::new(),
        hidden: false,
        hide_step: None,
    };

    for (line_no, raw) in data.lines().enumerate() {
        reader.read_line(line_no, raw)?;
    }

    let model = reader.model;
    model.sort_pieces();
    model.remove_empty_groups();
    model.update_part_children();
    model.current_step = model.last_step();

    log::debug!(
        "Read {} pieces, {} groups, {} foreign lines",
        model.pieces.len(),
        model.groups.len(),
        model.foreign_lines.len()
    );
    Ok(())
}

fn write_properties(model: &Model, out: &mut String) {
    let properties = &model.properties;
    let defaults = crate::model::ModelProperties::default();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push_str(EOL);
    };

    if !model.name().is_empty() {
        line(format!("0 !LEOCAD MODEL NAME {}", model.name()));
    }
    if !properties.author.is_empty() {
        line(format!("0 !LEOCAD MODEL AUTHOR {}", properties.author));
    }
    if !properties.description.is_empty() {
        line(format!("0 !LEOCAD MODEL DESCRIPTION {}", properties.description));
    }
    for comment in properties.comments.lines() {
        line(format!("0 !LEOCAD MODEL COMMENT {comment}"));
    }
    if properties.background_color != defaults.background_color {
        line(format!("0 !LEOCAD MODEL BACKGROUND_COLOR {}", vec3(properties.background_color)));
    }
    if let Some((top, bottom)) = properties.background_gradient {
        line(format!("0 !LEOCAD MODEL BACKGROUND_GRADIENT {} {}", vec3(top), vec3(bottom)));
    }
    if !properties.background_image.is_empty() {
        line(format!("0 !LEOCAD MODEL BACKGROUND_IMAGE {}", properties.background_image));
    }
    if properties.fog_color != defaults.fog_color {
        line(format!("0 !LEOCAD MODEL FOG_COLOR {}", vec3(properties.fog_color)));
    }
    if properties.fog_density != defaults.fog_density {
        line(format!("0 !LEOCAD MODEL FOG_DENSITY {}", num(properties.fog_density)));
    }
    if properties.ambient_color != defaults.ambient_color {
        line(format!("0 !LEOCAD MODEL AMBIENT_COLOR {}", vec3(properties.ambient_color)));
    }
    if !properties.header.is_empty() {
        line(format!("0 !LEOCAD MODEL HEADER {}", properties.header));
    }
    if !properties.footer.is_empty() {
        line(format!("0 !LEOCAD MODEL FOOTER {}", properties.footer));
    }
}

/// Group chain of `group`, top group first.
fn group_chain(model: &Model, group: Option<GroupId>) -> Vec<GroupId> {
    let mut chain = Vec::new();
    let mut current = group;
    while let Some(id) = current {
        if chain.contains(&id) || chain.len() > model.groups.len() {
            break;
        }
        chain.push(id);
        current = model.group(id).and_then(|g| g.parent);
    }
    chain.reverse();
    chain
}

/// Emits pieces with `0 STEP` and group scopes derived from the live
/// objects, interleaved with the kept foreign lines.
struct Writer<'a> {
    model: &'a Model,
    out: String,
    step: Step,
    open: Vec<GroupId>,
    foreign: std::iter::Peekable<std::vec::IntoIter<&'a ForeignLine>>,
}

impl<'a> Writer<'a> {
    fn new(model: &'a Model, keep_foreign: bool) -> Self {
        let mut foreign: Vec<&ForeignLine> = if keep_foreign {
            model.foreign_lines.iter().collect()
        } else {
            Vec::new()
        };
        foreign.sort_by_key(|l| (l.step, l.line));
        Self {
            model,
            out: String::new(),
            step: 1,
            open: Vec::new(),
            foreign: foreign.into_iter().peekable(),
        }
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push_str(EOL);
    }

    /// Foreign lines of earlier steps, and of this step up to `before`.
    fn flush_foreign(&mut self, before: usize) {
        let step = self.step;
        while let Some(line) = self
            .foreign
            .next_if(|l| l.step < step || (l.step == step && l.line < before))
        {
            self.out.push_str(&line.text);
            self.out.push_str(EOL);
        }
    }

    fn advance_to(&mut self, step: Step) {
        while self.step < step {
            self.flush_foreign(usize::MAX);
            self.line("0 STEP");
            self.step += 1;
        }
    }

    fn enter_groups(&mut self, group: Option<GroupId>) {
        let chain = group_chain(self.model, group);
        let common = self
            .open
            .iter()
            .zip(&chain)
            .take_while(|(open, wanted)| open == wanted)
            .count();

        while self.open.len() > common {
            self.open.pop();
            self.line("0 !LEOCAD GROUP END");
        }
        for &id in &chain[common..] {
            let (name, center) = self
                .model
                .group(id)
                .map(|g| (g.name.clone(), g.center))
                .unwrap_or_default();
            self.line(&format!("0 !LEOCAD GROUP BEGIN {name}"));
            if center != Vec3::ZERO {
                self.line(&format!("0 !LEOCAD GROUP CENTER {}", vec3(center)));
            }
            self.open.push(id);
        }
    }

    fn piece(&mut self, piece: &Piece) {
        if !piece.steps.is_hidden() {
            self.advance_to(piece.steps.show);
        }
        self.flush_foreign(piece.source_line.unwrap_or(usize::MAX));
        self.enter_groups(piece.group);

        if piece.steps.is_hidden() {
            self.line("0 !LEOCAD PIECE HIDDEN");
        }
        if piece.steps.hide != STEP_MAX {
            self.line(&format!("0 !LEOCAD PIECE STEP_HIDE {}", piece.steps.hide));
        }

        let n = model_to_ldraw(&piece.transform);
        let mut text = format!("1 {}", piece.color);
        for v in n {
            let _ = write!(text, " {}", num(v));
        }
        let _ = write!(text, " {}", piece.part.name());
        self.line(&text);
    }

    fn finish_body(&mut self) {
        self.enter_groups(None);
        while let Some(step) = self.foreign.peek().map(|l| l.step) {
            self.advance_to(step);
            self.flush_foreign(usize::MAX);
        }
    }
}

fn steps_tokens(steps: StepRange) -> String {
    let mut text = String::new();
    if steps.show != 1 {
        let _ = write!(text, " STEP_SHOW {}", steps.show);
    }
    if steps.hide != STEP_MAX {
        let _ = write!(text, " STEP_HIDE {}", steps.hide);
    }
    text
}

fn write_camera(camera: &Camera) -> String {
    format!(
        "0 !LEOCAD CAMERA FOV {} ZNEAR {} ZFAR {} POSITION {} TARGET_POSITION {} UP_VECTOR {}{} NAME {}",
        num(camera.fov),
        num(camera.near),
        num(camera.far),
        vec3(camera.position),
        vec3(camera.target),
        vec3(camera.up),
        steps_tokens(camera.steps),
        camera.name
    )
}

fn write_light(light: &Light) -> String {
    format!(
        "0 !LEOCAD LIGHT POSITION {} TARGET_POSITION {} ATTENUATION {}{} NAME {}",
        vec3(light.position),
        vec3(light.target),
        vec3(light.attenuation),
        steps_tokens(light.steps),
        light.name
    )
}

/// Serialize the whole document.
pub fn write(model: &Model) -> String {
    let mut writer = Writer::new(model, true);
    write_properties(model, &mut writer.out);

    for piece in &model.pieces {
        writer.piece(piece);
    }
    writer.finish_body();

    for camera in model.cameras.iter().filter(|c| !c.is_simple()) {
        writer.line(&write_camera(camera));
    }
    for light in &model.lights {
        writer.line(&write_light(light));
    }
    writer.out
}

/// Serialize only the selected pieces and the groups they belong to.
pub fn write_selected(model: &Model) -> String {
    let mut writer = Writer::new(model, false);
    for piece in model.pieces.iter().filter(|p| p.selected) {
        writer.piece(piece);
    }
    writer.finish_body();
    writer.out
}
