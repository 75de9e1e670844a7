// Copyright 2025 the LCD Atlas Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for compositing baked glyphs onto color surfaces.

use lcd_atlas::{ChannelOrder, Color, GammaLut, GlyphAtlas, IntRect, RenderOptions, RowViewMut};

use crate::util::{TestEnv, touched_columns};

const WIDTH: usize = 80;
const HEIGHT: usize = 60;
const BLACK: [u8; 4] = [0, 0, 0, 255];

struct Scene {
    atlas: GlyphAtlas,
    gamma: GammaLut,
}

impl Scene {
    fn new(gamma: f64) -> Self {
        let mut env = TestEnv::new(RenderOptions {
            gamma,
            ..RenderOptions::default()
        });
        let atlas = GlyphAtlas::bake(&mut env.renderer, 40, 'A'.into(), 26).unwrap();
        Self {
            atlas,
            gamma: GammaLut::new(gamma),
        }
    }

    fn draw(&self, pen_x: i32, clip: IntRect, order: ChannelOrder) -> Vec<u8> {
        let mut data = BLACK.repeat(WIDTH * HEIGHT);
        let mut dst = RowViewMut::packed(&mut data, WIDTH * 4, HEIGHT).unwrap();
        let advance = self.atlas.draw_glyph(
            &self.gamma,
            &mut dst,
            clip,
            pen_x,
            50,
            'A'.into(),
            Color::rgb(255, 255, 255),
            order,
        );
        assert_eq!(advance, Some(24.));
        data
    }
}

fn full() -> IntRect {
    IntRect::from_size(WIDTH, HEIGHT)
}

fn color_sum(data: &[u8]) -> u64 {
    data.chunks_exact(4)
        .flat_map(|px| &px[..3])
        .map(|&c| u64::from(c))
        .sum()
}

#[test]
fn blend_glyph_whole_pixel_pen_shifts_the_image() {
    let scene = Scene::new(1.8);
    let a = scene.draw(30, full(), ChannelOrder::Rgba);
    let b = scene.draw(33, full(), ChannelOrder::Rgba);
    for y in 0..HEIGHT {
        let row = |data: &[u8], x: usize| data[(y * WIDTH + x) * 4..][..4].to_vec();
        assert_eq!(row(&b, 0), BLACK.to_vec());
        for x in 1..WIDTH {
            assert_eq!(row(&b, x), row(&a, x - 1), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn blend_glyph_subpixel_phase_conserves_coverage() {
    // Without gamma every coverage byte lands in exactly one channel at every phase.
    let scene = Scene::new(1.0);
    let reference = scene.draw(30, full(), ChannelOrder::Rgba);
    let (x0, x1) = touched_columns(&reference, WIDTH, BLACK).unwrap();
    assert!(color_sum(&reference) > 0, "nothing drawn");

    for pen_x in [31, 32] {
        let shifted = scene.draw(pen_x, full(), ChannelOrder::Rgba);
        assert_eq!(
            color_sum(&shifted),
            color_sum(&reference),
            "coverage lost at pen {pen_x}"
        );
        let (sx0, sx1) = touched_columns(&shifted, WIDTH, BLACK).unwrap();
        assert!(
            sx0 >= x0 && sx1 <= x1 + 1,
            "phase {pen_x} drew {sx0}..{sx1}, reference {x0}..{x1}"
        );
    }
}

#[test]
fn blend_glyph_respects_the_clip() {
    let scene = Scene::new(1.8);
    let unclipped = scene.draw(30, full(), ChannelOrder::Bgra);
    let (x0, x1) = touched_columns(&unclipped, WIDTH, BLACK).unwrap();
    let mid = (x0 + x1) / 2;

    let clip = IntRect::new(0, 0, mid as i32, HEIGHT as i32);
    let clipped = scene.draw(30, clip, ChannelOrder::Bgra);
    assert_eq!(touched_columns(&clipped, WIDTH, BLACK), Some((x0, mid)));
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let i = (y * WIDTH + x) * 4;
            let expected = if x < mid { &unclipped[i..i + 4] } else { &BLACK[..] };
            assert_eq!(&clipped[i..i + 4], expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn blend_glyph_channel_order_swaps_red_and_blue() {
    let scene = Scene::new(1.8);
    let rgba = scene.draw(31, full(), ChannelOrder::Rgba);
    let bgra = scene.draw(31, full(), ChannelOrder::Bgra);
    for (i, (p, q)) in rgba.chunks_exact(4).zip(bgra.chunks_exact(4)).enumerate() {
        assert_eq!([p[0], p[1], p[2], p[3]], [q[2], q[1], q[0], q[3]], "pixel {i}");
    }
}

#[test]
fn blend_glyph_offscreen_is_a_no_op() {
    let scene = Scene::new(1.8);
    for pen_x in [-300, 3 * WIDTH as i32 + 30] {
        let data = scene.draw(pen_x, full(), ChannelOrder::Rgba);
        assert_eq!(touched_columns(&data, WIDTH, BLACK), None, "pen {pen_x}");
    }
}
