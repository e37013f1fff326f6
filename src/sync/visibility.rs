/// Per-source render state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceState {
    /// The user is editing the source's content: live vector shown, no renders.
    EditingContent,
    /// A pointer gesture is manipulating the source: live vector shown, renders deferred.
    Interacting,
    /// The raster is missing or stale: live vector shown until a render lands.
    RenderPending,
    /// The proxy carries a raster for the current signature and is shown instead of the source.
    RasterReady,
}

/// Inputs the state is derived from on each pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateInputs {
    pub editing: bool,
    pub interacting: bool,
    /// A raster for the current signature is on the proxy.
    pub raster_current: bool,
}

impl SourceState {
    /// Editing beats interaction, which beats any raster.
    pub fn resolve(inputs: StateInputs) -> Self {
        if inputs.editing {
            Self::EditingContent
        } else if inputs.interacting {
            Self::Interacting
        } else if inputs.raster_current {
            Self::RasterReady
        } else {
            Self::RenderPending
        }
    }

    /// Renders may be issued in this state.
    pub fn accepts_renders(self) -> bool {
        matches!(self, Self::RenderPending)
    }

    /// Leaving this state for a non-suspended one re-arms a render.
    pub fn is_suspended(self) -> bool {
        matches!(self, Self::EditingContent | Self::Interacting)
    }
}

/// Desired `hidden` flags for a source and its proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visibility {
    pub source_hidden: bool,
    pub proxy_hidden: bool,
}

impl Visibility {
    /// Exactly one of source and proxy is visible. A covered source always shows its live
    /// content (the ancestor's raster includes it) and never its own proxy.
    pub fn for_state(state: SourceState, covered: bool) -> Self {
        let proxy_shown = state == SourceState::RasterReady && !covered;
        Self {
            source_hidden: proxy_shown,
            proxy_hidden: !proxy_shown,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/visibility.rs"]
mod tests;
