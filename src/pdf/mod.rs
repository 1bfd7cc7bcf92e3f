pub mod layout;

use std::collections::HashMap;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::blocks::{build_blocks, LayoutBlock, PhotoFormat, PhotoSource};
use crate::error::Error;
use crate::fonts::{register_base_font, to_winansi_bytes, FontEntry};
use crate::model::ProcessRecord;

use layout::{
    paginate, BodyTextMeasure, PageGeometry, Placement, BODY_FONT_SIZE, FOOTER_FONT_SIZE,
    HEADING_FONT_SIZE, LINE_HEIGHT,
};

/// Emphasis color for important text lines (dark red).
const IMPORTANT_RGB: [f32; 3] = [0.70, 0.12, 0.12];
/// Footer baseline, measured up from the page bottom edge.
const FOOTER_BASELINE: f32 = 22.0;
/// Approximate Helvetica ascender, used to place baselines from top offsets.
const ASCENT_RATIO: f32 = 0.75;

fn embed_image(
    pdf: &mut Pdf,
    alloc: &mut dyn FnMut() -> Ref,
    image_xobjects: &mut Vec<(String, Ref)>,
    data: &[u8],
    format: PhotoFormat,
    pixel_width: u32,
    pixel_height: u32,
) -> String {
    let xobj_ref = alloc();
    let pdf_name = format!("Im{}", image_xobjects.len() + 1);

    match format {
        PhotoFormat::Jpeg => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(pixel_width as i32);
            xobj.height(pixel_height as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
        }
        PhotoFormat::Png => {
            let cursor = std::io::Cursor::new(data);
            let reader = image::ImageReader::with_format(
                std::io::BufReader::new(cursor),
                image::ImageFormat::Png,
            );
            if let Ok(decoded) = reader.decode() {
                let rgba: image::RgbaImage = decoded.to_rgba8();
                let (w, h) = (rgba.width(), rgba.height());
                let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

                let rgb_data: Vec<u8> = rgba
                    .pixels()
                    .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                    .collect();
                let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

                let smask_ref = if has_alpha {
                    let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                    let compressed_alpha =
                        miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                    let mask_ref = alloc();
                    let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                    mask.filter(Filter::FlateDecode);
                    mask.width(w as i32);
                    mask.height(h as i32);
                    mask.color_space().device_gray();
                    mask.bits_per_component(8);
                    Some(mask_ref)
                } else {
                    None
                };

                let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
                xobj.filter(Filter::FlateDecode);
                xobj.width(w as i32);
                xobj.height(h as i32);
                xobj.color_space().device_rgb();
                xobj.bits_per_component(8);
                if let Some(mask_ref) = smask_ref {
                    xobj.s_mask(mask_ref);
                }
            }
        }
    }

    image_xobjects.push((pdf_name.clone(), xobj_ref));
    pdf_name
}

fn show_line(content: &mut Content, font: &FontEntry, size: f32, x: f32, baseline: f32, text: &str) {
    content
        .begin_text()
        .set_font(Name(font.pdf_name.as_bytes()), size)
        .next_line(x, baseline)
        .show(Str(&to_winansi_bytes(text)))
        .end_text();
}

/// Render a record into finished PDF bytes.
///
/// Phases mirror the layout design: block building, pagination, drawing into
/// an append-only page arena, then a footer pass once the total page count
/// is sealed, and finally object assembly.
pub fn render(
    record: &ProcessRecord,
    source: &dyn PhotoSource,
    geom: &PageGeometry,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    geom.validate()?;

    let blocks = build_blocks(record, source);
    let t_blocks = t0.elapsed();

    let measure = BodyTextMeasure::new();
    let pagination = paginate(&blocks, geom, &measure)?;
    let t_layout = t0.elapsed();

    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let regular_ref = alloc();
    let bold_ref = alloc();
    let regular = register_base_font(&mut pdf, "Helvetica", "F1".to_string(), regular_ref);
    let bold = register_base_font(&mut pdf, "Helvetica-Bold", "F2".to_string(), bold_ref);

    // Image XObjects, keyed by block index.
    let mut image_names: HashMap<usize, String> = HashMap::new();
    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    for (idx, block) in blocks.iter().enumerate() {
        if let LayoutBlock::Image {
            data,
            format,
            pixel_width,
            pixel_height,
        } = block
        {
            let name = embed_image(
                &mut pdf,
                &mut alloc,
                &mut image_xobjects,
                data,
                *format,
                *pixel_width,
                *pixel_height,
            );
            image_names.insert(idx, name);
        }
    }
    let t_images = t0.elapsed();

    // Page arena: one content stream per page, appended to as blocks land.
    let mut contents: Vec<Content> = (0..pagination.page_count).map(|_| Content::new()).collect();

    for assignment in &pagination.assignments {
        let content = &mut contents[assignment.page];
        let x = geom.margin;

        match (&assignment.placement, &blocks[assignment.block]) {
            (Placement::Heading, LayoutBlock::Heading { text, .. }) => {
                let baseline =
                    geom.page_height - assignment.y - HEADING_FONT_SIZE * ASCENT_RATIO - 2.0;
                show_line(content, &bold, HEADING_FONT_SIZE, x, baseline, text);
            }

            (Placement::Image { width, height }, LayoutBlock::Image { .. }) => {
                if let Some(name) = image_names.get(&assignment.block) {
                    let bottom = geom.page_height - assignment.y - height;
                    content.save_state();
                    content.transform([*width, 0.0, 0.0, *height, x, bottom]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
            }

            (Placement::Text { lines }, LayoutBlock::Text { important, .. }) => {
                let font = if *important { &bold } else { &regular };
                if *important {
                    content.set_fill_rgb(IMPORTANT_RGB[0], IMPORTANT_RGB[1], IMPORTANT_RGB[2]);
                }
                for (i, line) in lines.iter().enumerate() {
                    let line_top = assignment.y + i as f32 * LINE_HEIGHT;
                    let baseline =
                        geom.page_height - line_top - BODY_FONT_SIZE * ASCENT_RATIO - 2.0;
                    show_line(content, font, BODY_FONT_SIZE, x, baseline, line);
                }
                if *important {
                    content.set_fill_gray(0.0);
                }
            }

            // Pager output always matches its input block; nothing to draw otherwise.
            _ => {}
        }
    }
    let t_draw = t0.elapsed();

    // Footer pass: only possible now that the total page count is known.
    let total = pagination.page_count;
    let created = record.created_at.format("%Y-%m-%d %H:%M").to_string();
    let version = format!("v{}", record.version);
    for (page_idx, content) in contents.iter_mut().enumerate() {
        let page_label = format!("Page {} of {}", page_idx + 1, total);

        show_line(
            content,
            &regular,
            FOOTER_FONT_SIZE,
            geom.margin,
            FOOTER_BASELINE,
            &created,
        );

        let version_w = regular.text_width(&version, FOOTER_FONT_SIZE);
        show_line(
            content,
            &regular,
            FOOTER_FONT_SIZE,
            (geom.page_width - version_w) / 2.0,
            FOOTER_BASELINE,
            &version,
        );

        let label_w = regular.text_width(&page_label, FOOTER_FONT_SIZE);
        show_line(
            content,
            &regular,
            FOOTER_FONT_SIZE,
            geom.page_width - geom.margin - label_w,
            FOOTER_BASELINE,
            &page_label,
        );
    }
    let t_footers = t0.elapsed();

    // Assembly: page and content objects now that the count is sealed.
    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geom.page_width, geom.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            fonts.pair(Name(regular.pdf_name.as_bytes()), regular.font_ref);
            fonts.pair(Name(bold.pdf_name.as_bytes()), bold.font_ref);
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    let t_assembly = t0.elapsed();
    log::info!(
        "Render phases: blocks={:.1}ms, layout={:.1}ms, images={:.1}ms, draw={:.1}ms, footers={:.1}ms, assembly={:.1}ms ({} pages)",
        t_blocks.as_secs_f64() * 1000.0,
        (t_layout - t_blocks).as_secs_f64() * 1000.0,
        (t_images - t_layout).as_secs_f64() * 1000.0,
        (t_draw - t_images).as_secs_f64() * 1000.0,
        (t_footers - t_draw).as_secs_f64() * 1000.0,
        (t_assembly - t_footers).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}
