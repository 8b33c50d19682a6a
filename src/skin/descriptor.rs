//! # Skin Descriptor Parser
//!
//! Hand-rolled, line-oriented parser for the `skin.xml` dialect.
//!
//! The dialect is intentionally minimal: one logical element per one or more
//! physical lines, closed by a `/>` terminator, wrapped in a single `<skin>`
//! element. Attributes are extracted by substring search rather than a
//! general markup library.
//!
//! Parsing runs in one of two modes:
//! - **load**: full parse for one controller family, every control name
//!   resolved against the family's mapping table
//! - **probe**: catalog classification, declaration and backgrounds only

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PadViewError, Result};
use crate::mapping::{ControllerFamily, FIELD_BYTES};

use super::{
    AnalogDirection, AnalogPlacement, BackgroundPlacement, ButtonPlacement, Geometry,
    StickPlacement,
};

/// Descriptor file name inside each skin directory
pub const DESCRIPTOR_FILE: &str = "skin.xml";

/// A fully parsed and validated skin, resolved for one controller family.
///
/// Either every structural requirement held (declaration found, background
/// present, closing element seen) and the value exists, or loading failed as
/// a whole; no partially-usable skin is ever returned. Individual malformed
/// placements are skipped during parsing and simply absent from the lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinDescriptor {
    skin_path: PathBuf,
    families: Vec<ControllerFamily>,
    name: String,
    author: String,
    backgrounds: Vec<BackgroundPlacement>,
    buttons: Vec<ButtonPlacement>,
    sticks: Vec<StickPlacement>,
    analogs: Vec<AnalogPlacement>,
}

/// Catalog-mode view of a skin: declaration data and backgrounds only
#[derive(Debug, Clone, PartialEq)]
pub struct SkinSummary {
    pub families: Vec<ControllerFamily>,
    pub name: String,
    pub author: String,
    pub backgrounds: Vec<BackgroundPlacement>,
}

/// Declaration data carried by the top-level `<skin>` element
struct Declaration {
    families: Vec<ControllerFamily>,
    name: String,
    author: String,
}

impl SkinDescriptor {
    /// Load and validate the descriptor in `skin_dir`, resolving every
    /// control name against `family`'s mapping table.
    ///
    /// # Arguments
    ///
    /// * `skin_dir` - Skin directory containing a `skin.xml`
    /// * `family` - Controller family to resolve control names for
    ///
    /// # Errors
    ///
    /// Returns `DescriptorInvalid` if the descriptor is missing or
    /// structurally broken: no `<skin>` declaration, content before it, no
    /// background element, no closing `</skin>`, or `family` not among the
    /// declared families. Malformed individual placements are logged and
    /// skipped, not errors.
    pub fn load(skin_dir: &Path, family: ControllerFamily) -> Result<Self> {
        let text = read_descriptor(skin_dir)?;
        let mut lines = text.lines();

        let declaration = parse_declaration(&mut lines)?;
        if !declaration.families.contains(&family) {
            return Err(PadViewError::DescriptorInvalid(format!(
                "skin '{}' does not declare family {}",
                declaration.name, family
            )));
        }

        let mut descriptor = Self {
            skin_path: skin_dir.to_path_buf(),
            families: declaration.families,
            name: declaration.name,
            author: declaration.author,
            backgrounds: Vec::new(),
            buttons: Vec::new(),
            sticks: Vec::new(),
            analogs: Vec::new(),
        };

        let mut closed = false;
        for_each_element(&mut lines, |element| {
            if element.contains("</skin>") {
                closed = true;
                return false;
            }
            descriptor.classify_element(element, family);
            true
        });

        if !closed {
            return Err(PadViewError::DescriptorInvalid(
                "descriptor ended without </skin>".to_string(),
            ));
        }
        if descriptor.backgrounds.is_empty() {
            return Err(PadViewError::DescriptorInvalid(
                "descriptor has no background element".to_string(),
            ));
        }

        debug!(
            skin = %descriptor.name,
            buttons = descriptor.buttons.len(),
            sticks = descriptor.sticks.len(),
            analogs = descriptor.analogs.len(),
            "skin loaded"
        );
        Ok(descriptor)
    }

    /// Classify a skin directory for the catalog without resolving control
    /// placements.
    ///
    /// Reads the declaration and background entries only; button and stick
    /// detail is not required to list a skin.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorInvalid` if the descriptor is missing, has no
    /// usable declaration, or has no background element.
    pub fn probe(skin_dir: &Path) -> Result<SkinSummary> {
        let text = read_descriptor(skin_dir)?;
        let mut lines = text.lines();

        let declaration = parse_declaration(&mut lines)?;
        let mut backgrounds = Vec::new();

        for_each_element(&mut lines, |element| {
            if element.contains("</skin>") {
                return false;
            }
            if leading_tag_is(element, "background") {
                match create_background(element) {
                    Ok(background) => backgrounds.push(background),
                    Err(e) => warn!("skipping background element: {e}"),
                }
            }
            true
        });

        if backgrounds.is_empty() {
            return Err(PadViewError::DescriptorInvalid(
                "descriptor has no background element".to_string(),
            ));
        }

        Ok(SkinSummary {
            families: declaration.families,
            name: declaration.name,
            author: declaration.author,
            backgrounds,
        })
    }

    /// Directory this skin was loaded from
    pub fn skin_path(&self) -> &Path {
        &self.skin_path
    }

    /// Families the declaration names, in declaration order
    pub fn families(&self) -> &[ControllerFamily] {
        &self.families
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn backgrounds(&self) -> &[BackgroundPlacement] {
        &self.backgrounds
    }

    pub fn buttons(&self) -> &[ButtonPlacement] {
        &self.buttons
    }

    pub fn sticks(&self) -> &[StickPlacement] {
        &self.sticks
    }

    pub fn analogs(&self) -> &[AnalogPlacement] {
        &self.analogs
    }

    /// Dispatch one complete element to its placement constructor.
    ///
    /// A malformed or unresolved element invalidates only itself: the
    /// failure is logged and parsing continues. Unknown tags are ignored.
    fn classify_element(&mut self, element: &str, family: ControllerFamily) {
        if leading_tag_is(element, "background") {
            match create_background(element) {
                Ok(background) => self.backgrounds.push(background),
                Err(e) => warn!("skipping background element: {e}"),
            }
        } else if leading_tag_is(element, "button") {
            match create_button(element, family) {
                Ok(button) => self.buttons.push(button),
                Err(e) => warn!("skipping button element: {e}"),
            }
        } else if leading_tag_is(element, "stick") {
            match create_stick(element, family) {
                Ok(stick) => self.sticks.push(stick),
                Err(e) => warn!("skipping stick element: {e}"),
            }
        } else if leading_tag_is(element, "analog") {
            match create_analog(element, family) {
                Ok(analog) => self.analogs.push(analog),
                Err(e) => warn!("skipping analog element: {e}"),
            }
        } else {
            debug!("ignoring unknown element: {element}");
        }
    }
}

/// Read a skin directory's descriptor file into memory
fn read_descriptor(skin_dir: &Path) -> Result<String> {
    let path = skin_dir.join(DESCRIPTOR_FILE);
    fs::read_to_string(&path).map_err(|e| {
        PadViewError::DescriptorInvalid(format!("cannot read {}: {e}", path.display()))
    })
}

/// Find the top-level `<skin>` element and extract its declaration
/// attributes.
///
/// Blank lines and a leading `<?xml` header are skipped; any other content
/// before the declaration, or end of input, invalidates the descriptor.
fn parse_declaration<'a, I>(lines: &mut I) -> Result<Declaration>
where
    I: Iterator<Item = &'a str>,
{
    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.contains("<?xml") {
            continue;
        }
        if !line.contains("<skin") {
            return Err(PadViewError::DescriptorInvalid(format!(
                "expected <skin> declaration, found: {line}"
            )));
        }

        let type_list = attribute_value(line, "type").map_err(|_| {
            PadViewError::DescriptorInvalid("declaration has no type attribute".to_string())
        })?;
        let families = ControllerFamily::parse_list(type_list);
        if families.is_empty() {
            return Err(PadViewError::DescriptorInvalid(format!(
                "declaration names no supported family: {type_list}"
            )));
        }

        let name = attribute_value(line, "name")
            .map_err(|_| {
                PadViewError::DescriptorInvalid("declaration has no name attribute".to_string())
            })?
            .to_string();
        // Author is informational only
        let author = attribute_value(line, "author").unwrap_or("").to_string();

        return Ok(Declaration {
            families,
            name,
            author,
        });
    }

    Err(PadViewError::DescriptorInvalid(
        "no <skin> declaration found".to_string(),
    ))
}

/// Stream logical elements to `handle`, accumulating physical lines until a
/// `/>` terminator completes each element.
///
/// Blank lines are tolerated anywhere. `handle` returns `false` to stop
/// streaming (the closing `</skin>` line is passed through as an element so
/// callers can detect it).
fn for_each_element<'a, I, F>(lines: &mut I, mut handle: F)
where
    I: Iterator<Item = &'a str>,
    F: FnMut(&str) -> bool,
{
    let mut element = String::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains("</skin>") {
            handle(line);
            return;
        }

        if line.contains('<') {
            // New element starts; anything unterminated before it is lost
            element.clear();
            element.push_str(line);
        } else {
            element.push(' ');
            element.push_str(line);
        }

        if !element.contains("/>") {
            continue;
        }
        if !handle(&element) {
            return;
        }
        element.clear();
    }
}

/// True when `element` opens with the given tag name
fn leading_tag_is(element: &str, tag: &str) -> bool {
    match element.strip_prefix('<') {
        Some(rest) => {
            rest.starts_with(tag)
                && rest[tag.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_whitespace() || c == '/')
        }
        None => false,
    }
}

/// Extract the value of `name="value"` from an element by substring search.
///
/// The value is whatever sits between the first and second double-quote
/// following `name=`; missing quotes are a structural failure for this
/// attribute only.
fn attribute_value<'a>(element: &'a str, name: &str) -> Result<&'a str> {
    let key = format!("{name}=");
    let position = element.find(&key).ok_or_else(|| {
        PadViewError::ElementInvalid(format!("element {element} has no attribute {name}"))
    })?;

    let rest = &element[position + key.len()..];
    let open = rest.find('"').ok_or_else(|| {
        PadViewError::ElementInvalid(format!("attribute {name} is badly quoted in {element}"))
    })?;
    let value = &rest[open + 1..];
    let close = value.find('"').ok_or_else(|| {
        PadViewError::ElementInvalid(format!("attribute {name} is badly quoted in {element}"))
    })?;

    Ok(&value[..close])
}

/// Extract a numeric attribute
fn numeric_attribute(element: &str, name: &str) -> Result<i32> {
    let raw = attribute_value(element, name)?;
    raw.parse().map_err(|_| {
        PadViewError::ElementInvalid(format!("attribute {name}=\"{raw}\" is not a number"))
    })
}

/// Extract the shared geometry attributes.
///
/// Width and height are stored as the declared value plus one; the legacy
/// format treats both bounds as inclusive.
fn parse_geometry(element: &str) -> Result<Geometry> {
    let width = numeric_attribute(element, "width")? + 1;
    let height = numeric_attribute(element, "height")? + 1;
    let width = u32::try_from(width).map_err(|_| {
        PadViewError::ElementInvalid(format!("negative width in {element}"))
    })?;
    let height = u32::try_from(height).map_err(|_| {
        PadViewError::ElementInvalid(format!("negative height in {element}"))
    })?;

    Ok(Geometry {
        x: numeric_attribute(element, "x")?,
        y: numeric_attribute(element, "y")?,
        width,
        height,
    })
}

/// Resolve a control name against the family table, requiring room for an
/// 8-byte bit-per-byte field when `field` is set
fn resolve_index(name: &str, family: ControllerFamily, field: bool) -> Result<usize> {
    let index = family.lookup(name).ok_or_else(|| {
        PadViewError::ElementInvalid(format!("unmapped {family} control name: {name}"))
    })?;
    if field && index + FIELD_BYTES > family.frame_length() {
        return Err(PadViewError::ElementInvalid(format!(
            "field {name} at offset {index} overruns the {family} frame"
        )));
    }
    Ok(index)
}

fn create_background(element: &str) -> Result<BackgroundPlacement> {
    Ok(BackgroundPlacement {
        name: attribute_value(element, "name")?.to_string(),
        image: attribute_value(element, "image")?.to_string(),
    })
}

fn create_button(element: &str, family: ControllerFamily) -> Result<ButtonPlacement> {
    let geometry = parse_geometry(element)?;
    let image = attribute_value(element, "image")?.to_string();
    let control_index = resolve_index(attribute_value(element, "name")?, family, false)?;

    Ok(ButtonPlacement {
        geometry,
        image,
        control_index,
    })
}

fn create_stick(element: &str, family: ControllerFamily) -> Result<StickPlacement> {
    let geometry = parse_geometry(element)?;
    let image = attribute_value(element, "image")?.to_string();
    let x_index = resolve_index(attribute_value(element, "xname")?, family, true)?;
    let y_index = resolve_index(attribute_value(element, "yname")?, family, true)?;

    Ok(StickPlacement {
        geometry,
        image,
        x_index,
        y_index,
        x_range: numeric_attribute(element, "xrange")?,
        y_range: numeric_attribute(element, "yrange")?,
    })
}

fn create_analog(element: &str, family: ControllerFamily) -> Result<AnalogPlacement> {
    let geometry = parse_geometry(element)?;
    let image = attribute_value(element, "image")?.to_string();
    let control_index = resolve_index(attribute_value(element, "name")?, family, true)?;

    let direction_raw = attribute_value(element, "direction")?;
    let direction = AnalogDirection::from_attribute(direction_raw).ok_or_else(|| {
        PadViewError::ElementInvalid(format!("unknown direction: {direction_raw}"))
    })?;

    let reversed = match attribute_value(element, "reverse")? {
        "true" | "1" => true,
        "false" | "0" => false,
        other => {
            return Err(PadViewError::ElementInvalid(format!(
                "reverse must be true/false, got: {other}"
            )))
        }
    };

    Ok(AnalogPlacement {
        geometry,
        image,
        control_index,
        direction,
        reversed,
    })
}
