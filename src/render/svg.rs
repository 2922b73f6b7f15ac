//! SVG drawing of a laid-out molecule

use std::fmt::{self, Write};

use crate::config::DrawSettings;
use crate::error::RenderError;
use crate::model::{Bond, BondOrder, Molecule};

use super::colors::AtomPalette;
use super::geometry::{centroid, Bounds, Point};
use super::layout::Layout;

/// Room kept around the outermost atoms for their labels, in bond lengths
const LABEL_MARGIN: f64 = 0.5;

/// Distance between a bond end and a label center, as a fraction of font size
const LABEL_CLEARANCE: f64 = 0.5;

/// Inner ring lines are shortened by this fraction at each end
const INNER_LINE_TRIM: f64 = 0.15;

/// Approximate glyph advance as a fraction of font size
const GLYPH_WIDTH: f64 = 0.6;

/// Subscript and superscript size relative to the label font
const SCRIPT_SCALE: f64 = 0.7;

/// Text of one atom label
#[derive(Debug, Clone, PartialEq)]
struct AtomLabel {
    symbol: &'static str,
    isotope: Option<u16>,
    hydrogens: u8,
    charge: i8,
    /// Write `HO` instead of `OH` when the bonds leave to the right
    hydrogens_first: bool,
}

impl AtomLabel {
    fn for_atom(mol: &Molecule, layout: &Layout, index: usize) -> Option<Self> {
        let atom = mol.atom(index);
        let degree = mol.degree(index);
        let needs_label =
            !atom.is_carbon() || atom.charge != 0 || atom.isotope.is_some() || degree == 0;
        if !needs_label {
            return None;
        }

        let here = layout.positions[index];
        let lean: f64 = mol
            .neighbors(index)
            .iter()
            .map(|&(n, _)| layout.positions[n].x - here.x)
            .sum();
        Some(Self {
            symbol: atom.symbol(),
            isotope: atom.isotope,
            hydrogens: mol.total_hydrogens(index),
            charge: atom.charge,
            hydrogens_first: degree > 0 && lean > 1e-6,
        })
    }

    fn charge_text(&self) -> Option<String> {
        let sign = if self.charge > 0 { '+' } else { '-' };
        match self.charge.unsigned_abs() {
            0 => None,
            1 => Some(sign.to_string()),
            n => Some(format!("{}{}", n, sign)),
        }
    }
}

/// Canvas mapping: layout units (y up) to pixels (y down).
#[derive(Debug, Clone, Copy)]
struct Transform {
    scale: f64,
    layout_center: Point,
    canvas_center: Point,
}

impl Transform {
    fn fit(bounds: Option<Bounds>, settings: &DrawSettings) -> Self {
        let width = settings.width as f64;
        let height = settings.height as f64;
        let canvas_center = Point::new(width / 2.0, height / 2.0);
        let Some(bounds) = bounds else {
            return Self {
                scale: settings.max_bond_length,
                layout_center: Point::ORIGIN,
                canvas_center,
            };
        };
        let usable_w = width * (1.0 - 2.0 * settings.padding);
        let usable_h = height * (1.0 - 2.0 * settings.padding);
        let span_w = bounds.width() + 2.0 * LABEL_MARGIN;
        let span_h = bounds.height() + 2.0 * LABEL_MARGIN;
        let scale = (usable_w / span_w)
            .min(usable_h / span_h)
            .min(settings.max_bond_length)
            .max(0.0);
        Self {
            scale,
            layout_center: bounds.center(),
            canvas_center,
        }
    }

    fn apply(&self, p: Point) -> Point {
        Point::new(
            self.canvas_center.x + (p.x - self.layout_center.x) * self.scale,
            self.canvas_center.y - (p.y - self.layout_center.y) * self.scale,
        )
    }
}

/// Draws one molecule into an SVG document
pub struct SvgDrawer<'a> {
    mol: &'a Molecule,
    layout: &'a Layout,
    settings: &'a DrawSettings,
    palette: AtomPalette,
    points: Vec<Point>,
    labels: Vec<Option<AtomLabel>>,
    bond_length: f64,
    font_size: f64,
}

impl<'a> SvgDrawer<'a> {
    pub fn new(mol: &'a Molecule, layout: &'a Layout, settings: &'a DrawSettings) -> Self {
        let transform = Transform::fit(layout.bounds(), settings);
        let points = layout.positions.iter().map(|&p| transform.apply(p)).collect();
        let labels = (0..mol.atom_count())
            .map(|i| AtomLabel::for_atom(mol, layout, i))
            .collect();
        Self {
            mol,
            layout,
            settings,
            palette: AtomPalette::default(),
            points,
            labels,
            bond_length: transform.scale,
            font_size: settings.font_size(transform.scale),
        }
    }

    pub fn with_palette(mut self, palette: AtomPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn draw(&self) -> Result<String, RenderError> {
        let mut out = String::new();
        self.write_header(&mut out)?;
        for (index, bond) in self.mol.bonds().iter().enumerate() {
            self.write_bond(&mut out, index, bond)?;
        }
        for (index, label) in self.labels.iter().enumerate() {
            if let Some(label) = label {
                self.write_label(&mut out, index, label)?;
            }
        }
        out.push_str("</svg>\n");
        Ok(out)
    }

    fn write_header(&self, out: &mut String) -> fmt::Result {
        let (w, h) = (self.settings.width, self.settings.height);
        writeln!(out, "<?xml version='1.0' encoding='iso-8859-1'?>")?;
        writeln!(
            out,
            "<svg version='1.1' baseProfile='full' xmlns='http://www.w3.org/2000/svg' \
             xmlns:xlink='http://www.w3.org/1999/xlink' xml:space='preserve' \
             width='{w}px' height='{h}px' viewBox='0 0 {w} {h}'>"
        )?;
        writeln!(
            out,
            "<rect style='opacity:1.0;fill:{};stroke:none' width='{:.1}' height='{:.1}' x='0.0' y='0.0'> </rect>",
            self.settings.background, w as f64, h as f64
        )
    }

    fn write_bond(&self, out: &mut String, index: usize, bond: &Bond) -> fmt::Result {
        let (a, b) = (bond.begin, bond.end);
        let Some((pa, pb)) = self.trimmed_ends(a, b) else {
            return Ok(());
        };
        let offset = self.bond_length * self.settings.multiple_bond_offset;
        let ring_center = self.ring_center(a, b);

        match (bond.order, ring_center) {
            (BondOrder::Double, Some(center)) => {
                self.write_split_line(out, index, a, b, pa, pb, None)?;
                let (ia, ib) = inner_line(pa, pb, center, offset);
                self.write_split_line(out, index, a, b, ia, ib, None)
            }
            (BondOrder::Aromatic, Some(center)) => {
                self.write_split_line(out, index, a, b, pa, pb, None)?;
                let (ia, ib) = inner_line(pa, pb, center, offset);
                let dash = (self.bond_length * 0.1).max(1.0);
                self.write_split_line(out, index, a, b, ia, ib, Some(dash))
            }
            (BondOrder::Double, None) => {
                for shift in [-0.5, 0.5] {
                    let (sa, sb) = shifted(pa, pb, offset * shift);
                    self.write_split_line(out, index, a, b, sa, sb, None)?;
                }
                Ok(())
            }
            (BondOrder::Triple, _) => {
                for shift in [-1.0, 0.0, 1.0] {
                    let (sa, sb) = shifted(pa, pb, offset * shift);
                    self.write_split_line(out, index, a, b, sa, sb, None)?;
                }
                Ok(())
            }
            (BondOrder::Quadruple, _) => {
                for shift in [-1.5, -0.5, 0.5, 1.5] {
                    let (sa, sb) = shifted(pa, pb, offset * shift);
                    self.write_split_line(out, index, a, b, sa, sb, None)?;
                }
                Ok(())
            }
            // Aromatic bonds between two rings are drawn plain
            (BondOrder::Single, _) | (BondOrder::Aromatic, None) => {
                self.write_split_line(out, index, a, b, pa, pb, None)
            }
        }
    }

    /// Bond end points pulled back from labelled atoms.
    fn trimmed_ends(&self, a: usize, b: usize) -> Option<(Point, Point)> {
        let (mut pa, mut pb) = (self.points[a], self.points[b]);
        let dir = (pb - pa).normalized()?;
        let clearance = self.font_size * LABEL_CLEARANCE;
        let mut length = pa.distance(pb);
        if self.labels[a].is_some() {
            pa = pa + dir * clearance;
            length -= clearance;
        }
        if self.labels[b].is_some() {
            pb = pb - dir * clearance;
            length -= clearance;
        }
        (length > 1.0).then_some((pa, pb))
    }

    fn ring_center(&self, a: usize, b: usize) -> Option<Point> {
        self.layout
            .ring_of_bond(a, b)
            .map(|ring| centroid(ring.iter().map(|&i| self.points[i])))
    }

    /// One bond line, coloured half by half after its two atoms.
    #[allow(clippy::too_many_arguments)]
    fn write_split_line(
        &self,
        out: &mut String,
        index: usize,
        a: usize,
        b: usize,
        pa: Point,
        pb: Point,
        dash: Option<f64>,
    ) -> fmt::Result {
        let color_a = self.palette.for_element(self.mol.atom(a).element);
        let color_b = self.palette.for_element(self.mol.atom(b).element);
        if color_a == color_b {
            return self.write_path(out, &format!("bond-{index} atom-{a} atom-{b}"), pa, pb, color_a, dash);
        }
        let mid = pa.midpoint(pb);
        self.write_path(out, &format!("bond-{index} atom-{a}"), pa, mid, color_a, dash)?;
        self.write_path(out, &format!("bond-{index} atom-{b}"), mid, pb, color_b, dash)
    }

    fn write_path(
        &self,
        out: &mut String,
        class: &str,
        from: Point,
        to: Point,
        color: &str,
        dash: Option<f64>,
    ) -> fmt::Result {
        write!(
            out,
            "<path class='{}' d='M {:.1},{:.1} L {:.1},{:.1}' style='fill:none;fill-rule:evenodd;stroke:{};stroke-width:{:.1}px;stroke-linecap:butt;stroke-linejoin:miter;stroke-opacity:1",
            class, from.x, from.y, to.x, to.y, color, self.settings.bond_line_width
        )?;
        if let Some(dash) = dash {
            write!(out, ";stroke-dasharray:{:.1},{:.1}", dash, dash)?;
        }
        writeln!(out, "' />")
    }

    fn write_label(&self, out: &mut String, index: usize, label: &AtomLabel) -> fmt::Result {
        let atom = self.mol.atom(index);
        let color = self.palette.for_element(atom.element);
        let at = self.points[index];
        let half_symbol = label.symbol.len() as f64 * GLYPH_WIDTH * self.font_size / 2.0;

        // Keep the element symbol centred on the atom when hydrogens are attached.
        let (x, anchor) = match (label.hydrogens, label.hydrogens_first) {
            (0, _) => (at.x, "middle"),
            (_, false) => (at.x - half_symbol, "start"),
            (_, true) => (at.x + half_symbol, "end"),
        };

        write!(
            out,
            "<text x='{:.1}' y='{:.1}' class='atom-{}' style='font-size:{:.0}px;font-style:normal;font-weight:normal;fill-opacity:1;stroke:none;font-family:{};text-anchor:{};fill:{}' dominant-baseline='central'>",
            x, at.y, index, self.font_size, self.settings.font_family, anchor, color
        )?;
        if label.hydrogens_first {
            self.write_hydrogens(out, label.hydrogens)?;
        }
        if let Some(isotope) = label.isotope {
            self.write_script(out, "super", &isotope.to_string())?;
        }
        out.push_str(label.symbol);
        if !label.hydrogens_first {
            self.write_hydrogens(out, label.hydrogens)?;
        }
        if let Some(charge) = label.charge_text() {
            self.write_script(out, "super", &charge)?;
        }
        writeln!(out, "</text>")
    }

    fn write_hydrogens(&self, out: &mut String, count: u8) -> fmt::Result {
        if count == 0 {
            return Ok(());
        }
        out.push('H');
        if count > 1 {
            self.write_script(out, "sub", &count.to_string())?;
        }
        Ok(())
    }

    fn write_script(&self, out: &mut String, shift: &str, text: &str) -> fmt::Result {
        write!(
            out,
            "<tspan style='baseline-shift:{};font-size:{:.0}px;'>{}</tspan>",
            shift,
            self.font_size * SCRIPT_SCALE,
            text
        )
    }
}

/// Parallel copy of a line moved sideways by `distance`.
fn shifted(pa: Point, pb: Point, distance: f64) -> (Point, Point) {
    let normal = (pb - pa).perpendicular().normalized().unwrap_or_default();
    (pa + normal * distance, pb + normal * distance)
}

/// Second line of a ring bond, moved towards the ring center and shortened.
fn inner_line(pa: Point, pb: Point, center: Point, distance: f64) -> (Point, Point) {
    let mut normal = (pb - pa).perpendicular().normalized().unwrap_or_default();
    if normal.dot(center - pa.midpoint(pb)) < 0.0 {
        normal = normal * -1.0;
    }
    let (sa, sb) = (pa + normal * distance, pb + normal * distance);
    (sa.lerp(sb, INNER_LINE_TRIM), sa.lerp(sb, 1.0 - INNER_LINE_TRIM))
}

/// Draw a laid-out molecule with the default palette.
pub fn draw_svg(
    mol: &Molecule,
    layout: &Layout,
    settings: &DrawSettings,
) -> Result<String, RenderError> {
    if settings.width == 0 || settings.height == 0 {
        return Err(RenderError::InvalidSize {
            width: settings.width,
            height: settings.height,
        });
    }
    SvgDrawer::new(mol, layout, settings).draw()
}
