#![allow(dead_code)]

use std::collections::HashMap;

use stepdoc::blocks::PhotoSource;
use stepdoc::model::{ProcessRecord, StepRecord, TextItem};
use stepdoc::Error;

/// In-memory photo store keyed by reference string.
pub struct MapSource(pub HashMap<String, Vec<u8>>);

impl MapSource {
    pub fn new() -> MapSource {
        MapSource(HashMap::new())
    }

    pub fn insert(&mut self, reference: &str, bytes: Vec<u8>) {
        self.0.insert(reference.to_string(), bytes);
    }
}

impl PhotoSource for MapSource {
    fn load(&self, reference: &str) -> Result<Vec<u8>, Error> {
        self.0.get(reference).cloned().ok_or(Error::ImageDecode {
            reference: reference.to_string(),
            reason: "not in test store".to_string(),
        })
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 144, 96]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 60, 160]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    buf.into_inner()
}

pub fn text_item(content: &str, important: bool) -> TextItem {
    TextItem::new(content, important)
}

pub fn step(index: u32, photos: &[&str], texts: Vec<TextItem>) -> StepRecord {
    StepRecord {
        index,
        photos: photos.iter().map(|s| s.to_string()).collect(),
        texts,
        done: false,
    }
}

pub fn record_with_steps(name: &str, steps: Vec<StepRecord>) -> ProcessRecord {
    let mut record = ProcessRecord::new(name);
    record.steps = steps;
    record.renumber_steps();
    record
}

pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle)
}
