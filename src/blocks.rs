use std::path::PathBuf;

use crate::error::Error;
use crate::model::ProcessRecord;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
}

/// Supplies raw image bytes for a photo reference. The recorder stores
/// references only; where the bytes live (disk, archive, test fixture) is
/// this collaborator's business.
pub trait PhotoSource {
    fn load(&self, reference: &str) -> Result<Vec<u8>, Error>;
}

/// Reads photo references as filesystem paths, optionally relative to a root.
pub struct FsPhotoSource {
    root: Option<PathBuf>,
}

impl FsPhotoSource {
    pub fn new() -> FsPhotoSource {
        FsPhotoSource { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> FsPhotoSource {
        FsPhotoSource {
            root: Some(root.into()),
        }
    }
}

impl Default for FsPhotoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PhotoSource for FsPhotoSource {
    fn load(&self, reference: &str) -> Result<Vec<u8>, Error> {
        let path = match &self.root {
            Some(root) => root.join(reference),
            None => PathBuf::from(reference),
        };
        Ok(std::fs::read(path)?)
    }
}

/// One unit of content for the pager. Within a step the order is fixed:
/// heading, then images, then texts, each in original array order.
pub enum LayoutBlock {
    Heading {
        text: String,
        step_index: u32,
    },
    Image {
        data: Vec<u8>,
        format: PhotoFormat,
        pixel_width: u32,
        pixel_height: u32,
    },
    Text {
        label: String,
        content: String,
        important: bool,
    },
}

fn probe_photo(reference: &str, source: &dyn PhotoSource) -> Result<LayoutBlock, Error> {
    let data = source.load(reference)?;

    let format = match image::guess_format(&data) {
        Ok(image::ImageFormat::Jpeg) => PhotoFormat::Jpeg,
        Ok(image::ImageFormat::Png) => PhotoFormat::Png,
        Ok(other) => {
            return Err(Error::ImageDecode {
                reference: reference.to_string(),
                reason: format!("unsupported format {other:?}"),
            })
        }
        Err(e) => {
            return Err(Error::ImageDecode {
                reference: reference.to_string(),
                reason: e.to_string(),
            })
        }
    };

    let cursor = std::io::Cursor::new(&data);
    let (pixel_width, pixel_height) = image::ImageReader::with_format(
        std::io::BufReader::new(cursor),
        match format {
            PhotoFormat::Jpeg => image::ImageFormat::Jpeg,
            PhotoFormat::Png => image::ImageFormat::Png,
        },
    )
    .into_dimensions()
    .map_err(|e| Error::ImageDecode {
        reference: reference.to_string(),
        reason: e.to_string(),
    })?;

    Ok(LayoutBlock::Image {
        data,
        format,
        pixel_width,
        pixel_height,
    })
}

/// Flatten a record into the ordered block sequence the pager consumes.
///
/// Draft steps (no photos, no texts) are skipped entirely. An unreadable or
/// undecodable photo drops only its own block: the step's remaining content
/// still renders, matching the recover-locally rule for image failures.
pub fn build_blocks(record: &ProcessRecord, source: &dyn PhotoSource) -> Vec<LayoutBlock> {
    let mut blocks = Vec::new();

    for step in &record.steps {
        if !step.has_content() {
            continue;
        }

        blocks.push(LayoutBlock::Heading {
            text: format!("Step {}", step.index),
            step_index: step.index,
        });

        for reference in &step.photos {
            match probe_photo(reference, source) {
                Ok(block) => blocks.push(block),
                Err(e) => {
                    log::warn!("skipping photo in step {}: {e}", step.index);
                }
            }
        }

        for (i, item) in step.texts.iter().enumerate() {
            blocks.push(LayoutBlock::Text {
                label: format!("{}.{} ", step.index, i + 1),
                content: item.content.clone(),
                important: item.important,
            });
        }
    }

    blocks
}
