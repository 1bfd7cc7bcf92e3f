use crate::blocks::LayoutBlock;
use crate::error::Error;

pub const LINE_HEIGHT: f32 = 14.0;
pub const HEADING_HEIGHT: f32 = 20.0;
/// Gap between a heading and the image below it.
pub const HEADING_GAP: f32 = 6.0;
/// Trailing gap after an image; wider than the heading gap so photos read
/// as separate from the following text.
pub const IMAGE_GAP: f32 = 14.0;
/// Trailing padding after a text block's last wrapped line.
pub const TEXT_PADDING: f32 = 4.0;
/// Extra space between consecutive steps.
pub const STEP_GAP: f32 = 10.0;
/// Reserved below a heading when its step has no image: one body line.
const HEADING_FALLBACK_RESERVE: f32 = LINE_HEIGHT + TEXT_PADDING;

pub const BODY_FONT_SIZE: f32 = 11.0;
pub const HEADING_FONT_SIZE: f32 = 13.0;
pub const FOOTER_FONT_SIZE: f32 = 9.0;

/// Fixed page dimensions governing layout. All lengths in PDF units (pt).
#[derive(Clone, Copy, Debug)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub max_image_width: f32,
    pub max_image_height: f32,
}

impl PageGeometry {
    /// A4 portrait with the default reproduction-card image box.
    pub fn a4() -> PageGeometry {
        PageGeometry {
            page_width: 595.0,
            page_height: 842.0,
            margin: 40.0,
            max_image_width: 280.0,
            max_image_height: 210.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Rejected geometries are fatal and reported before any drawing begins.
    pub fn validate(&self) -> Result<(), Error> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(Error::Geometry(format!(
                "page size {}x{} must be positive",
                self.page_width, self.page_height
            )));
        }
        if self.margin < 0.0
            || self.margin * 2.0 >= self.page_width
            || self.margin * 2.0 >= self.page_height
        {
            return Err(Error::Geometry(format!(
                "margin {} leaves no content area on a {}x{} page",
                self.margin, self.page_width, self.page_height
            )));
        }
        if self.max_image_width <= 0.0 || self.max_image_height <= 0.0 {
            return Err(Error::Geometry(format!(
                "image box {}x{} must be positive",
                self.max_image_width, self.max_image_height
            )));
        }
        Ok(())
    }
}

/// Text-measurement collaborator: wrap a string into lines that fit a width.
pub trait TextMeasure {
    fn wrap(&self, text: &str, max_width: f32) -> Vec<String>;
}

/// Greedy word wrap against approximate Helvetica advances at the body size.
/// A single word wider than the line gets its own overflowing line; words
/// are never hard-broken.
pub struct BodyTextMeasure {
    widths_1000: Vec<f32>,
    font_size: f32,
}

impl BodyTextMeasure {
    pub fn new() -> BodyTextMeasure {
        BodyTextMeasure {
            widths_1000: crate::fonts::helvetica_widths(),
            font_size: BODY_FONT_SIZE,
        }
    }

    fn word_width(&self, word: &str) -> f32 {
        crate::fonts::to_winansi_bytes(word)
            .iter()
            .filter(|&&b| b >= 32)
            .map(|&b| self.widths_1000[(b - 32) as usize] * self.font_size / 1000.0)
            .sum()
    }
}

impl Default for BodyTextMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for BodyTextMeasure {
    fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let space_w = self.word_width(" ");
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in text.split_whitespace() {
            let ww = self.word_width(word);
            let proposed = if current.is_empty() {
                ww
            } else {
                current_w + space_w + ww
            };
            if !current.is_empty() && proposed > max_width {
                lines.push(std::mem::take(&mut current));
                current_w = ww;
            } else {
                current_w = proposed;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

/// Shrink-to-fit scaling: images are never upscaled, only shrunk so both
/// dimensions fit the box while the aspect ratio is preserved.
pub fn scale_to_box(pixel_width: u32, pixel_height: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    let w = pixel_width.max(1) as f32;
    let h = pixel_height.max(1) as f32;
    let scale = (max_w / w).min(max_h / h).min(1.0);
    (w * scale, h * scale)
}

#[derive(Debug)]
pub enum Placement {
    Heading,
    Image { width: f32, height: f32 },
    Text { lines: Vec<String> },
}

/// Where one block landed: page index (0-based), y offset from the page top,
/// and the resolved size or wrapped lines needed to draw it.
#[derive(Debug)]
pub struct PageAssignment {
    pub block: usize,
    pub page: usize,
    pub y: f32,
    pub placement: Placement,
}

#[derive(Debug)]
pub struct Pagination {
    pub assignments: Vec<PageAssignment>,
    pub page_count: usize,
}

/// Scaled height of the image directly after a heading, for the heading's
/// look-ahead reserve. `None` when the step opens with text instead.
fn next_image_height(blocks: &[LayoutBlock], after: usize, geom: &PageGeometry) -> Option<f32> {
    match blocks.get(after + 1)? {
        LayoutBlock::Image {
            pixel_width,
            pixel_height,
            ..
        } => {
            let (_, h) = scale_to_box(
                *pixel_width,
                *pixel_height,
                geom.max_image_width,
                geom.max_image_height,
            );
            Some(h)
        }
        _ => None,
    }
}

/// Place blocks onto fixed-height pages, single sequential pass.
///
/// Invariants: blocks keep their input order; an image or a text block's
/// wrapped-line group is never split across a page boundary. The one
/// documented exception is an image taller than the usable page, which is
/// placed at the top of a fresh page and allowed to overflow.
pub fn paginate(
    blocks: &[LayoutBlock],
    geom: &PageGeometry,
    measure: &dyn TextMeasure,
) -> Result<Pagination, Error> {
    geom.validate()?;

    let content_width = geom.content_width();
    let mut assignments = Vec::with_capacity(blocks.len());
    let mut page: usize = 0;
    let mut y = geom.margin;

    let space_left = |y: f32| geom.page_height - geom.margin - y;
    let at_page_top = |y: f32| (y - geom.margin).abs() < 1.0;

    for (idx, block) in blocks.iter().enumerate() {
        match block {
            LayoutBlock::Heading { .. } => {
                // Inter-step gap; dissolves if the heading opens a new page.
                if !assignments.is_empty() {
                    y += STEP_GAP;
                }

                // Look ahead so a heading is never orphaned at a page bottom:
                // it must fit together with the start of its step's content.
                let reserve = HEADING_HEIGHT
                    + match next_image_height(blocks, idx, geom) {
                        Some(img_h) => HEADING_GAP + img_h,
                        None => HEADING_FALLBACK_RESERVE,
                    };
                if space_left(y) < reserve && !at_page_top(y) {
                    page += 1;
                    y = geom.margin;
                }

                assignments.push(PageAssignment {
                    block: idx,
                    page,
                    y,
                    placement: Placement::Heading,
                });
                y += HEADING_HEIGHT;
            }

            LayoutBlock::Image {
                pixel_width,
                pixel_height,
                ..
            } => {
                let (w, h) = scale_to_box(
                    *pixel_width,
                    *pixel_height,
                    geom.max_image_width,
                    geom.max_image_height,
                );
                if space_left(y) < h && !at_page_top(y) {
                    page += 1;
                    y = geom.margin;
                }

                assignments.push(PageAssignment {
                    block: idx,
                    page,
                    y,
                    placement: Placement::Image {
                        width: w,
                        height: h,
                    },
                });
                y += h + IMAGE_GAP;
            }

            LayoutBlock::Text { label, content, .. } => {
                let lines = measure.wrap(&format!("{label}{content}"), content_width);
                let height = lines.len() as f32 * LINE_HEIGHT + TEXT_PADDING;
                if space_left(y) < height && !at_page_top(y) {
                    page += 1;
                    y = geom.margin;
                }

                assignments.push(PageAssignment {
                    block: idx,
                    page,
                    y,
                    placement: Placement::Text { lines },
                });
                y += height;
            }
        }
    }

    Ok(Pagination {
        assignments,
        page_count: page + 1,
    })
}
