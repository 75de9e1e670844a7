// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A renderer over [`BlockFont`] with helpers for baking into caller-owned storage.

use std::path::PathBuf;

use lcd_atlas::{
    BakeError, GlyphAtlas, GlyphBitmapInfo, RenderOptions, Renderer, RowViewMut,
    bake_font_bitmap,
};
use lcd_atlas_dev::BlockFont;

/// Atlas storage together with the records of one bake.
pub(crate) struct Baked {
    pub(crate) data: Vec<u8>,
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) glyphs: Vec<GlyphBitmapInfo>,
    pub(crate) result: Result<(), BakeError>,
}

pub(crate) struct TestEnv {
    pub(crate) renderer: Renderer<BlockFont>,
}

impl TestEnv {
    pub(crate) fn new(options: RenderOptions) -> Self {
        let mut renderer = Renderer::new(options);
        renderer.set_font(BlockFont::new());
        Self { renderer }
    }

    pub(crate) fn subpixel() -> Self {
        Self::new(RenderOptions::default())
    }

    pub(crate) fn grayscale() -> Self {
        Self::new(RenderOptions {
            subpixel: false,
            ..RenderOptions::default()
        })
    }

    pub(crate) fn s(&self) -> usize {
        self.renderer.subpixel_scale() as usize
    }

    /// Bakes `count` codepoints from `first` into a fresh `width` x `height` pixel atlas.
    pub(crate) fn bake(
        &mut self,
        pixel_height: u32,
        width: usize,
        height: usize,
        first: u32,
        count: usize,
    ) -> Baked {
        let s = self.s();
        let mut data = vec![0_u8; width * s * height];
        let mut glyphs = vec![GlyphBitmapInfo::default(); count];
        let mut view = RowViewMut::packed(&mut data, width * s, height).unwrap();
        let result = bake_font_bitmap(
            &mut self.renderer,
            pixel_height,
            &mut view,
            first,
            &mut glyphs,
            s as u32,
        );
        Baked {
            data,
            width,
            height,
            glyphs,
            result,
        }
    }

    /// Writes `atlas` to `current/<name>.png` when `LCD_ATLAS_DUMP` is set.
    pub(crate) fn dump(atlas: &GlyphAtlas, name: &str) {
        if std::env::var_os("LCD_ATLAS_DUMP").is_none() {
            return;
        }
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("current")
            .join(format!("{name}.png"));
        atlas.save_png(&path).unwrap();
    }
}
