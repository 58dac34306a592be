// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Chart items as PNG images: the item is drawn onto an off-screen buffer
//! and every cell becomes a block of pixels.

use anyhow::{Context, Result};
use chatrecap_app::ChartItem;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::style::Color;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SNAPSHOT_COLUMNS: u16 = 100;
const SNAPSHOT_ROWS: u16 = 32;
const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 16;
const DEFAULT_BACKGROUND: [u8; 3] = [15, 17, 22];
const DEFAULT_FOREGROUND: [u8; 3] = [230, 232, 238];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Clipboard,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Copied,
    Saved(PathBuf),
    /// The clipboard refused the image, so it was written to disk.
    SavedInstead { path: PathBuf, reason: String },
}

pub fn export_item(
    item: &ChartItem,
    grid_cursor: usize,
    target: ExportTarget,
    export_dir: &Path,
) -> Result<ExportOutcome> {
    let snapshot = Snapshot::capture(item, grid_cursor)?;
    match target {
        ExportTarget::File => save_png(&snapshot, item, export_dir).map(ExportOutcome::Saved),
        ExportTarget::Clipboard => match copy_to_clipboard(&snapshot) {
            Ok(()) => Ok(ExportOutcome::Copied),
            Err(reason) => {
                warn!(error = %reason, item = item.id(), "clipboard copy failed, saving file");
                let path = save_png(&snapshot, item, export_dir)?;
                Ok(ExportOutcome::SavedInstead { path, reason })
            }
        },
    }
}

pub(crate) fn export_file_name(item: &ChartItem) -> String {
    let stem = item
        .id()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>();
    let stem = if stem.is_empty() { "chart".to_owned() } else { stem };
    format!("{stem}.png")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Snapshot {
    pub(crate) fn capture(item: &ChartItem, grid_cursor: usize) -> Result<Self> {
        let mut terminal = Terminal::new(TestBackend::new(SNAPSHOT_COLUMNS, SNAPSHOT_ROWS))
            .context("create off-screen terminal")?;
        terminal
            .draw(|frame| super::render_item(frame, frame.area(), item, grid_cursor))
            .context("draw item off-screen")?;
        Ok(rasterize(terminal.backend().buffer()))
    }
}

fn rasterize(buffer: &Buffer) -> Snapshot {
    let columns = u32::from(buffer.area.width);
    let rows = u32::from(buffer.area.height);
    let width = columns * CELL_WIDTH;
    let height = rows * CELL_HEIGHT;
    let mut rgba = vec![0u8; (width * height * 4) as usize];

    for (index, cell) in buffer.content().iter().enumerate() {
        let column = index as u32 % columns;
        let row = index as u32 / columns;
        let background = color_rgb(cell.bg, DEFAULT_BACKGROUND);
        let foreground = color_rgb(cell.fg, DEFAULT_FOREGROUND);
        let mark = glyph_mark(cell.symbol());

        for y in 0..CELL_HEIGHT {
            for x in 0..CELL_WIDTH {
                let lit = mark.is_some_and(|(left, top, right, bottom)| {
                    x >= left && x < right && y >= top && y < bottom
                });
                let [r, g, b] = if lit { foreground } else { background };
                let px = column * CELL_WIDTH + x;
                let py = row * CELL_HEIGHT + y;
                let offset = ((py * width + px) * 4) as usize;
                rgba[offset..offset + 4].copy_from_slice(&[r, g, b, 255]);
            }
        }
    }

    Snapshot {
        width,
        height,
        rgba,
    }
}

/// Pixel box `(left, top, right, bottom)` lit for a cell symbol, or `None`
/// for blank cells. Block elements fill proportionally; anything else gets
/// a glyph-sized mark.
fn glyph_mark(symbol: &str) -> Option<(u32, u32, u32, u32)> {
    let ch = symbol.chars().next()?;
    let eighths = match ch {
        ' ' => return None,
        '█' => 8,
        '▇' => 7,
        '▆' => 6,
        '▅' => 5,
        '▄' => 4,
        '▃' => 3,
        '▂' => 2,
        '▁' => 1,
        '─' | '━' => return Some((0, 7, CELL_WIDTH, 9)),
        '│' | '┃' => return Some((3, 0, 5, CELL_HEIGHT)),
        '┌' | '┐' | '└' | '┘' | '├' | '┤' | '┬' | '┴' | '┼' => {
            return Some((3, 7, 5, 9));
        }
        _ => return Some((1, 4, CELL_WIDTH - 1, CELL_HEIGHT - 3)),
    };
    Some((0, CELL_HEIGHT - CELL_HEIGHT * eighths / 8, CELL_WIDTH, CELL_HEIGHT))
}

fn color_rgb(color: Color, default: [u8; 3]) -> [u8; 3] {
    match color {
        Color::Reset => default,
        Color::Black => [0, 0, 0],
        Color::Red => [205, 49, 49],
        Color::Green => [13, 188, 121],
        Color::Yellow => [229, 229, 16],
        Color::Blue => [36, 114, 200],
        Color::Magenta => [188, 63, 188],
        Color::Cyan => [17, 168, 205],
        Color::Gray => [204, 204, 204],
        Color::DarkGray => [118, 118, 118],
        Color::LightRed => [241, 76, 76],
        Color::LightGreen => [35, 209, 139],
        Color::LightYellow => [245, 245, 67],
        Color::LightBlue => [59, 142, 234],
        Color::LightMagenta => [214, 112, 214],
        Color::LightCyan => [41, 184, 219],
        Color::White => [242, 242, 242],
        Color::Rgb(r, g, b) => [r, g, b],
        Color::Indexed(index) => indexed_rgb(index),
    }
}

/// xterm 256-colour palette: 16 system colours, a 6x6x6 cube, then greys.
fn indexed_rgb(index: u8) -> [u8; 3] {
    const SYSTEM: [Color; 16] = [
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Magenta,
        Color::Cyan,
        Color::Gray,
        Color::DarkGray,
        Color::LightRed,
        Color::LightGreen,
        Color::LightYellow,
        Color::LightBlue,
        Color::LightMagenta,
        Color::LightCyan,
        Color::White,
    ];
    match index {
        0..=15 => color_rgb(SYSTEM[usize::from(index)], DEFAULT_FOREGROUND),
        16..=231 => {
            let cube = index - 16;
            let level = |value: u8| if value == 0 { 0 } else { 55 + value * 40 };
            [level(cube / 36), level((cube / 6) % 6), level(cube % 6)]
        }
        _ => {
            let grey = 8 + (index - 232) * 10;
            [grey, grey, grey]
        }
    }
}

fn encode_png(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buffer, snapshot.width, snapshot.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder
            .write_header()
            .context("write png header")?
            .write_image_data(&snapshot.rgba)
            .context("write png data")?;
    }
    Ok(buffer)
}

fn save_png(snapshot: &Snapshot, item: &ChartItem, export_dir: &Path) -> Result<PathBuf> {
    let bytes = encode_png(snapshot)?;
    fs::create_dir_all(export_dir)
        .with_context(|| format!("create export dir {}", export_dir.display()))?;
    let path = export_dir.join(export_file_name(item));
    fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "chart exported");
    Ok(path)
}

fn copy_to_clipboard(snapshot: &Snapshot) -> std::result::Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|err| err.to_string())?;
    clipboard
        .set_image(arboard::ImageData {
            width: snapshot.width as usize,
            height: snapshot.height as usize,
            bytes: Cow::Borrowed(&snapshot.rgba),
        })
        .map_err(|err| err.to_string())
}
