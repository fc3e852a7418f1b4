// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Rendering contracts and the back-to-front render pass.
//!
//! The simulation core never draws pixels itself: everything goes through the
//! [`DrawContext`] trait implemented by the host's 2D backend, and images are
//! opaque handles resolved through an [`AssetStore`]. Rendering reads the
//! scene and mutates nothing.

use crate::{
    core::{algebra::Vector2, color::Color, math::aabb::AxisAlignedBoundingBox, pool::Handle},
    scene::{
        entity::{Appearance, Entity},
        Scene,
    },
};

/// Horizontal text alignment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text baseline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextBaseline {
    #[default]
    Top,
    Middle,
    Alphabetic,
    Bottom,
}

/// An opaque, loaded image. Obtained from the [`AssetStore`]; the simulation
/// core never inspects pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageHandle {
    pub id: u64,
    /// Natural size in pixels, used as the default source region.
    pub size: Vector2<f32>,
}

/// Blocking image lookup. Loading and decoding are the host's concern.
pub trait AssetStore {
    fn get_image(&self, key: &str) -> Option<ImageHandle>;
}

/// An asset store with no assets; useful for headless simulation.
pub struct EmptyAssetStore;

impl AssetStore for EmptyAssetStore {
    fn get_image(&self, _key: &str) -> Option<ImageHandle> {
        None
    }
}

/// Stateful 2D drawing backend with save/restore stack semantics. All
/// coordinates are in the current local space; the render pass composes entity
/// transforms through `translate`/`rotate`/`scale`.
pub trait DrawContext {
    /// Pushes the current transform, alpha and clip state.
    fn save(&mut self);
    /// Pops to the most recently saved state.
    fn restore(&mut self);

    fn translate(&mut self, offset: Vector2<f32>);
    fn rotate(&mut self, angle: f32);
    fn scale(&mut self, factor: Vector2<f32>);
    /// Multiplies the global alpha; nested entities compound their opacity.
    fn multiply_alpha(&mut self, factor: f32);

    fn fill_rect(&mut self, bounds: AxisAlignedBoundingBox, color: Color);
    fn fill_rounded_rect(&mut self, bounds: AxisAlignedBoundingBox, radius: f32, color: Color);
    fn fill_circle(&mut self, center: Vector2<f32>, radius: f32, color: Color);
    /// Clips subsequent drawing to a rounded rectangle until `restore`.
    fn clip_rounded_rect(&mut self, bounds: AxisAlignedBoundingBox, radius: f32);

    /// Draws the `source` region of the image into the `dest` rectangle.
    fn draw_image(
        &mut self,
        image: ImageHandle,
        source: AxisAlignedBoundingBox,
        dest: AxisAlignedBoundingBox,
    );

    /// Width of the text in the given font, in pixels.
    fn measure_text(&mut self, text: &str, font: &str) -> f32;
    fn draw_text(
        &mut self,
        text: &str,
        font: &str,
        color: Color,
        position: Vector2<f32>,
        align: TextAlign,
        baseline: TextBaseline,
    );
}

/// Draws every visible entity back-to-front: scene roots in their sorted
/// order, children on top of their parent.
pub fn render_scene(scene: &Scene, ctx: &mut dyn DrawContext, assets: &dyn AssetStore) {
    for &root in scene.roots() {
        draw_entity(scene, root, ctx, assets);
    }
}

fn draw_entity(
    scene: &Scene,
    handle: Handle<Entity>,
    ctx: &mut dyn DrawContext,
    assets: &dyn AssetStore,
) {
    let Some(entity) = scene.try_get(handle) else {
        return;
    };
    if !entity.is_visible() {
        return;
    }

    ctx.save();
    ctx.translate(entity.position());
    ctx.rotate(entity.rotation());
    ctx.scale(entity.scale());
    ctx.multiply_alpha(entity.alpha());

    draw_appearance(entity, ctx, assets);

    for &child in entity.children() {
        draw_entity(scene, child, ctx, assets);
    }

    ctx.restore();
}

fn draw_appearance(entity: &Entity, ctx: &mut dyn DrawContext, assets: &dyn AssetStore) {
    let origin = entity.origin_offset();
    let size = entity.size();
    let bounds = AxisAlignedBoundingBox::from_min_max(origin, origin + size);

    match entity.appearance() {
        Appearance::None => {}
        Appearance::Rect {
            color,
            corner_radius,
        } => {
            if *corner_radius > 0.0 {
                ctx.fill_rounded_rect(bounds, clamp_corner_radius(*corner_radius, size), *color);
            } else {
                ctx.fill_rect(bounds, *color);
            }
        }
        Appearance::Circle { color } => {
            ctx.fill_circle(entity.local_center(), entity.radius(), *color);
        }
        Appearance::Image {
            key,
            source,
            corner_radius,
        } => {
            // A missing image is not an error: the entity stays valid and
            // simply draws nothing this frame.
            let Some(image) = assets.get_image(key) else {
                return;
            };

            let source = entity
                .current_animation()
                .and_then(|animation| animation.current_frame_rect().copied())
                .or(*source)
                .unwrap_or(AxisAlignedBoundingBox::from_min_max(
                    Vector2::new(0.0, 0.0),
                    image.size,
                ));

            if *corner_radius > 0.0 {
                ctx.save();
                ctx.clip_rounded_rect(bounds, clamp_corner_radius(*corner_radius, size));
                ctx.draw_image(image, source, bounds);
                ctx.restore();
            } else {
                ctx.draw_image(image, source, bounds);
            }
        }
        Appearance::Text {
            content,
            font,
            color,
            align,
            baseline,
        } => {
            ctx.draw_text(content, font, *color, origin, *align, *baseline);
        }
    }
}

fn clamp_corner_radius(radius: f32, size: Vector2<f32>) -> f32 {
    radius.clamp(0.0, size.x.min(size.y) * 0.5)
}
