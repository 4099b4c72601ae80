use super::{Affinity, DocumentSurface};
use crate::format::FormatKind;
use crate::surface::{NodePath, Position};

impl DocumentSurface {
    /// Path the selection start resolves to, for block-level queries.
    fn anchor_path(&self) -> Option<NodePath> {
        let (start, _) = self.selection_units()?;
        Some(self.position_at_unit(start, Affinity::Forward).path)
    }

    /// Nearest `text-align` on `path` or its ancestors, the root included.
    pub fn alignment_at(&self, path: &NodePath) -> Option<String> {
        self.root
            .element_ancestors(path)
            .iter()
            .filter_map(|ancestor| self.root.element_at(ancestor.indices()))
            .find_map(|element| element.style("text-align"))
            .or_else(|| self.root.style("text-align"))
            .map(str::to_string)
    }

    pub(crate) fn alignment_active(&self, kind: FormatKind) -> bool {
        let Some(path) = self.anchor_path() else {
            return false;
        };
        let current = self.alignment_at(&path);
        current.is_some() && current.as_deref() == kind.alignment_value()
    }

    pub(crate) fn list_ancestor(&self, path: &NodePath) -> Option<NodePath> {
        self.root.element_ancestors(path).into_iter().find(|ancestor| {
            self.root
                .element_at(ancestor.indices())
                .is_some_and(|element| element.is_list())
        })
    }

    pub(crate) fn list_active(&self, kind: FormatKind) -> bool {
        let tag = match kind {
            FormatKind::BulletList => "ul",
            FormatKind::NumberList => "ol",
            _ => return false,
        };
        self.anchor_path()
            .and_then(|path| self.list_ancestor(&path))
            .and_then(|list| self.root.element_at(list.indices()))
            .is_some_and(|list| list.tag == tag)
    }

    /// Font family in effect at `position`: the nearest annotated ancestor,
    /// else the root's.
    pub fn font_at(&self, position: &Position) -> Option<String> {
        self.root
            .element_ancestors(&position.path)
            .iter()
            .filter_map(|ancestor| self.root.element_at(ancestor.indices()))
            .find_map(|element| element.font_family())
            .or_else(|| self.root.font_family())
            .map(str::to_string)
    }

    /// Font of the character right after caret stop `unit`.
    pub fn font_at_unit(&self, unit: usize) -> Option<String> {
        self.font_at(&self.position_at_unit(unit, Affinity::Forward))
    }

    /// Font the next typed character will get.
    pub fn effective_font(&self) -> Option<String> {
        if let Some(font) = &self.typing.font {
            return Some(font.clone());
        }
        let unit = self.cursor_unit()?;
        self.font_at(&self.position_at_unit(unit, Affinity::Backward))
    }

    /// Every distinct font used by the text covered by the selection.
    pub fn fonts_in_selection(&self) -> Vec<Option<String>> {
        let Some((start, end)) = self.selection_units() else {
            return Vec::new();
        };
        let mut fonts = Vec::new();
        for slice in self.text_slices(start, end) {
            let font = self.font_at(&Position::new(slice.path, slice.from));
            if !fonts.contains(&font) {
                fonts.push(font);
            }
        }
        fonts
    }
}
