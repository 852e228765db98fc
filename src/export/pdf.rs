use chrono::Utc;
use log::debug;

use crate::charts::RasterImage;
use crate::error::Result;
use crate::export::{raster, ChartImage, DocumentAssembler};

/// Writes a plain PDF 1.4 document: the narrative as wrapped Helvetica text,
/// then one page per chart image. Content streams are left uncompressed.
#[derive(Debug, Clone)]
pub struct PdfAssembler {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub font_size: f64,
    pub leading: f64,
    pub wrap_columns: usize,
    pub title: String,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 72.0,
            font_size: 11.0,
            leading: 14.0,
            wrap_columns: 85,
            title: "Market Insights".to_string(),
        }
    }
}

impl DocumentAssembler for PdfAssembler {
    fn assemble(&self, narrative: &str, images: &[ChartImage]) -> Result<Vec<u8>> {
        let mut writer = PdfWriter::default();
        let catalog = writer.reserve();
        let pages = writer.reserve();
        let font = writer.add(
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_vec(),
        );

        let mut kids = Vec::new();

        let lines = wrap_text(narrative, self.wrap_columns);
        let per_page = self.lines_per_page();
        let text_pages: Vec<&[String]> = if lines.is_empty() {
            vec![lines.as_slice()]
        } else {
            lines.chunks(per_page).collect()
        };

        for chunk in text_pages {
            let content = self.text_content(chunk);
            let contents = writer.add(stream_object("", &content));
            let page = writer.add(self.page_object(pages, font, contents, None).into_bytes());
            kids.push(page);
        }

        for image in images {
            let bitmap = raster::read_png(&image.path)?;
            let xobject = writer.add(image_object(&bitmap));
            let content = self.image_content(&image.title, &bitmap);
            let contents = writer.add(stream_object("", &content));
            let page = writer.add(
                self.page_object(pages, font, contents, Some(xobject))
                    .into_bytes(),
            );
            kids.push(page);
        }

        let kid_refs: Vec<String> = kids.iter().map(|id| format!("{} 0 R", id)).collect();
        writer.set(
            pages,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kid_refs.join(" "),
                kids.len()
            )
            .into_bytes(),
        );
        writer.set(
            catalog,
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages).into_bytes(),
        );

        let mut info = b"<< /Title ".to_vec();
        info.extend(literal(&self.title));
        info.extend(b" /Producer (market-insights) /CreationDate ");
        info.extend(literal(&Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()));
        info.extend(b" >>");
        let info = writer.add(info);

        debug!(
            "Assembled PDF with {} text lines, {} chart images, {} pages",
            lines.len(),
            images.len(),
            kids.len()
        );
        Ok(writer.finish(catalog, info))
    }
}

impl PdfAssembler {
    fn lines_per_page(&self) -> usize {
        let usable = self.page_height - 2.0 * self.margin;
        ((usable / self.leading).floor() as usize).max(1)
    }

    fn page_object(
        &self,
        parent: usize,
        font: usize,
        contents: usize,
        image: Option<usize>,
    ) -> String {
        let xobject = image
            .map(|id| format!(" /XObject << /Im1 {} 0 R >>", id))
            .unwrap_or_default();
        format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 {} 0 R >>{} >> /Contents {} 0 R >>",
            parent,
            number(self.page_width),
            number(self.page_height),
            font,
            xobject,
            contents
        )
    }

    fn text_content(&self, lines: &[String]) -> Vec<u8> {
        let top = self.page_height - self.margin - self.font_size;
        let mut out = format!(
            "BT\n/F1 {} Tf\n{} TL\n{} {} Td\n",
            number(self.font_size),
            number(self.leading),
            number(self.margin),
            number(top)
        )
        .into_bytes();
        for line in lines {
            out.extend(literal(line));
            out.extend(b" Tj\nT*\n");
        }
        out.extend(b"ET");
        out
    }

    fn image_content(&self, title: &str, image: &RasterImage) -> Vec<u8> {
        let heading = self.page_height - self.margin - self.font_size;
        let max_width = self.page_width - 2.0 * self.margin;
        let max_height = heading - self.margin - 2.0 * self.leading;
        let scale = (max_width / image.width as f64).min(max_height / image.height as f64);
        let width = image.width as f64 * scale;
        let height = image.height as f64 * scale;
        let y = heading - 2.0 * self.leading - height;

        let mut out = format!(
            "BT\n/F1 {} Tf\n{} {} Td\n",
            number(self.font_size),
            number(self.margin),
            number(heading)
        )
        .into_bytes();
        out.extend(literal(title));
        out.extend(b" Tj\nET\n");
        out.extend(
            format!(
                "q\n{} 0 0 {} {} {} cm\n/Im1 Do\nQ",
                number(width),
                number(height),
                number(self.margin),
                number(y)
            )
            .into_bytes(),
        );
        out
    }
}

#[derive(Default)]
struct PdfWriter {
    objects: Vec<Vec<u8>>,
}

impl PdfWriter {
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn add(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: Vec<u8>) {
        self.objects[id - 1] = body;
    }

    fn finish(self, root: usize, info: usize) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets = Vec::with_capacity(self.objects.len());

        for (index, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend(format!("{} 0 obj\n", index + 1).into_bytes());
            out.extend(body);
            out.extend(b"\nendobj\n");
        }

        let xref = out.len();
        out.extend(
            format!(
                "xref\n0 {}\n0000000000 65535 f \n",
                self.objects.len() + 1
            )
            .into_bytes(),
        );
        for offset in offsets {
            out.extend(format!("{:010} 00000 n \n", offset).into_bytes());
        }
        out.extend(
            format!(
                "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
                self.objects.len() + 1,
                root,
                info,
                xref
            )
            .into_bytes(),
        );
        out
    }
}

fn stream_object(dictionary: &str, data: &[u8]) -> Vec<u8> {
    let mut out = format!("<< {}/Length {} >>\nstream\n", dictionary, data.len()).into_bytes();
    out.extend_from_slice(data);
    out.extend(b"\nendstream");
    out
}

fn image_object(image: &RasterImage) -> Vec<u8> {
    stream_object(
        &format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 ",
            image.width, image.height
        ),
        &image.pixels,
    )
}

fn number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

/// PDF literal string in WinAnsi encoding. Common typographic characters are
/// folded to ASCII; anything else outside Latin-1 becomes `?`.
pub(crate) fn literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        let folded: &[u8] = match c {
            '\u{2018}' | '\u{2019}' => b"'",
            '\u{201C}' | '\u{201D}' => b"\"",
            '\u{2013}' | '\u{2014}' => b"-",
            '\u{2022}' => b"*",
            '\u{2026}' => b"...",
            '\t' => b" ",
            _ => &[],
        };
        if !folded.is_empty() {
            out.extend_from_slice(folded);
            continue;
        }
        match c as u32 {
            0x28 | 0x29 | 0x5C => {
                out.push(b'\\');
                out.push(c as u8);
            }
            0x20..=0x7E | 0xA0..=0xFF => out.push(c as u32 as u8),
            0x00..=0x1F | 0x7F => {}
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

/// Greedy word wrap. Blank lines are kept; words longer than a line are split.
pub(crate) fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();

            if chars.len() > columns {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = chars.chunks(columns).peekable();
                while let Some(piece) = pieces.next() {
                    let piece: String = piece.iter().collect();
                    if pieces.peek().is_some() {
                        lines.push(piece);
                    } else {
                        current_len = piece.chars().count();
                        current = piece;
                    }
                }
                continue;
            }

            if current_len == 0 {
                current.push_str(word);
                current_len = chars.len();
            } else if current_len + 1 + chars.len() <= columns {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + chars.len();
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_len = chars.len();
            }
        }

        lines.push(current);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
