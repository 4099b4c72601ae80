//! Forwards toolbar actions to the command executor.

use tracing::debug;

use super::{FormatKind, FormatTracker};
use crate::error::SurfaceError;
use crate::surface::{Command, CommandExecutor, ContainerSpec, EditableSurface, NodePath};

const FONT_PROPERTY: &str = "font-family";

/// Where a font change left its durable annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontAnnotation {
    /// Selected content moved into a new inline container at this path.
    Wrapped(NodePath),
    /// The element enclosing the cursor carries the font.
    Element(NodePath),
    /// All root content moved into a new block carrying the font.
    RootWrapped,
    /// Empty document: the surface root's own default font.
    RootDefault,
    /// Only the generic font command was issued.
    CommandOnly,
}

#[derive(Debug)]
pub struct CommandDispatcher {
    selected_font: String,
}

impl CommandDispatcher {
    pub fn new(default_font: &str) -> Self {
        Self {
            selected_font: default_font.to_string(),
        }
    }

    pub fn selected_font(&self) -> &str {
        &self.selected_font
    }

    /// Applies `kind`. Alignment members are mutually exclusive: every
    /// other active one is switched off first, one at a time. The format
    /// state is re-read on the tracker's next deferred run.
    pub fn apply<S>(
        &mut self,
        surface: &mut S,
        tracker: &mut FormatTracker,
        kind: FormatKind,
        value: Option<&str>,
    ) -> bool
    where
        S: EditableSurface + CommandExecutor + ?Sized,
    {
        if kind.is_alignment() {
            for other in FormatKind::ALIGNMENTS {
                if other != kind && surface.is_active(other) {
                    debug!(?other, requested = ?kind, "deactivating competing alignment");
                    surface.deactivate(other);
                }
            }
        }
        let applied = surface.apply(Command::Format(kind), value);
        if !applied {
            debug!(command = kind.command_name(), "executor rejected command");
        }
        surface.focus();
        tracker.schedule_refresh();
        applied
    }

    /// Issues the generic font command, then pins the font with a durable
    /// annotation. Failure to annotate leaves the generic command in effect.
    pub fn apply_font<S>(
        &mut self,
        surface: &mut S,
        tracker: &mut FormatTracker,
        family: &str,
    ) -> FontAnnotation
    where
        S: EditableSurface + CommandExecutor + ?Sized,
    {
        surface.apply(Command::FontName, Some(family));
        let annotation = match annotate_font(surface, family) {
            Ok(annotation) => annotation,
            Err(err) => {
                debug!(%err, family, "font annotation failed; keeping generic command");
                FontAnnotation::CommandOnly
            }
        };
        self.selected_font = family.to_string();
        surface.focus();
        tracker.schedule_refresh();
        annotation
    }
}

fn annotate_font<S>(surface: &mut S, family: &str) -> Result<FontAnnotation, SurfaceError>
where
    S: EditableSurface + ?Sized,
{
    let Some(selection) = surface.selection() else {
        return Ok(FontAnnotation::CommandOnly);
    };

    if !selection.is_collapsed() {
        let wrapped = surface.wrap_range(
            &selection,
            ContainerSpec::styled("span", FONT_PROPERTY, family),
        )?;
        let wrapper = wrapped.start.path.clone();
        surface.clear_nested_style(&wrapper, FONT_PROPERTY);
        surface.set_cursor(wrapped.end);
        return Ok(FontAnnotation::Wrapped(wrapper));
    }

    if let Some(path) = surface.enclosing_element(&selection.start) {
        surface.set_element_style(&path, FONT_PROPERTY, family)?;
        return Ok(FontAnnotation::Element(path));
    }

    if surface.text_content().trim().is_empty() {
        surface.set_root_style(FONT_PROPERTY, family);
        Ok(FontAnnotation::RootDefault)
    } else {
        surface.wrap_root_content(ContainerSpec::styled("div", FONT_PROPERTY, family))?;
        Ok(FontAnnotation::RootWrapped)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod dispatcher_tests;
