//! Markup control: a block of text rendered through the tree's text services.

use crate::core::buffer::CharacterBuffer;
use crate::core::geometry::{to_i32, LayoutConstraints, LayoutRect, LayoutSize};
use crate::core::style::{Color, ColorPair};
use crate::error::Result;
use crate::runtime::control::Control;
use crate::runtime::tree::{ControlId, ControlTree, InvalidationReason};

struct RenderCache {
    text: String,
    width: usize,
    background: Color,
    lines: Vec<String>,
}

pub struct MarkupControl {
    text: String,
    padding_x: usize,
    padding_y: usize,
    cache: Option<RenderCache>,
}

impl MarkupControl {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_padding(text, 0, 0)
    }

    pub fn with_padding(text: impl Into<String>, padding_x: usize, padding_y: usize) -> Self {
        Self {
            text: text.into(),
            padding_x,
            padding_y,
            cache: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(tree: &mut ControlTree, id: ControlId, text: impl Into<String>) -> Result<()> {
        let control = tree.get_mut::<Self>(id)?;
        control.text = text.into();
        control.cache = None;
        tree.invalidate(id, InvalidationReason::Content);
        Ok(())
    }

    pub fn set_padding(
        tree: &mut ControlTree,
        id: ControlId,
        padding_x: usize,
        padding_y: usize,
    ) -> Result<()> {
        let control = tree.get_mut::<Self>(id)?;
        control.padding_x = padding_x;
        control.padding_y = padding_y;
        control.cache = None;
        tree.invalidate(id, InvalidationReason::Layout);
        Ok(())
    }

    /// Wrapped lines for `width` content columns, cached per text/width/background.
    fn lines(&mut self, tree: &ControlTree, width: usize, background: Color) -> &[String] {
        let fresh = self.cache.as_ref().is_some_and(|cache| {
            cache.text == self.text && cache.width == width && cache.background == background
        });
        if !fresh {
            let lines = if self.text.is_empty() {
                Vec::new()
            } else {
                let normalized = self.text.replace('\t', "   ");
                tree.renderer().render(&normalized, width.max(1), None, background)
            };
            self.cache = Some(RenderCache {
                text: self.text.clone(),
                width,
                background,
                lines,
            });
        }
        self.cache.as_ref().map(|cache| cache.lines.as_slice()).unwrap_or(&[])
    }
}

impl Control for MarkupControl {
    fn measure(
        &mut self,
        tree: &mut ControlTree,
        _id: ControlId,
        constraints: LayoutConstraints,
    ) -> LayoutSize {
        let renderer_width = if constraints.has_bounded_width() {
            constraints.max_width.saturating_sub(self.padding_x * 2)
        } else {
            self.text
                .split('\n')
                .map(|line| tree.renderer().visible_length(line))
                .max()
                .unwrap_or(0)
        };
        let padding_x = self.padding_x;
        let padding_y = self.padding_y;
        let lines = self.lines(tree, renderer_width, Color::Default);
        let text_width = lines
            .iter()
            .map(|line| tree.renderer().visible_length(line))
            .max()
            .unwrap_or(0);
        LayoutSize::new(text_width + padding_x * 2, lines.len() + padding_y * 2)
    }

    fn paint(
        &mut self,
        tree: &mut ControlTree,
        _id: ControlId,
        buffer: &mut CharacterBuffer,
        bounds: LayoutRect,
        clip: LayoutRect,
        colors: ColorPair,
    ) {
        let content_width = bounds.size().width.saturating_sub(self.padding_x * 2);
        if content_width == 0 {
            return;
        }
        let x = bounds.x + to_i32(self.padding_x);
        let top = bounds.y + to_i32(self.padding_y);
        let lines = self.lines(tree, content_width, colors.bg).to_vec();
        for (row, line) in lines.iter().enumerate() {
            let y = top + to_i32(row);
            if y >= bounds.bottom() {
                break;
            }
            let cells = tree.renderer().parse(line, colors.fg, colors.bg);
            buffer.write_cells_clipped(x, y, &cells, &clip);
        }
    }
}
