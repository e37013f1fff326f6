use crate::effects::config::EffectStackConfig;
use crate::foundation::core::{Affine, Rgba8, ShapeId, Vec2};
use crate::pixels::codec::ImageHandle;

/// A node of the document tree.
///
/// `x`, `y` and `rotation` (degrees, about the top-left corner) are relative to the parent; the
/// parent's own transform applies on top. `z_index` orders siblings, lowest first.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,
    #[serde(default)]
    pub parent: Option<ShapeId>,
    #[serde(default)]
    pub z_index: f64,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    pub kind: ShapeKind,
    #[serde(default)]
    pub meta: ShapeMeta,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeKind {
    Leaf(LeafShape),
    Group,
    Proxy(ProxyShape),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafShape {
    pub width: f64,
    pub height: f64,
    pub geometry: Geometry,
    #[serde(default)]
    pub style: ShapeStyle,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Geometry {
    #[serde(rename_all = "camelCase")]
    Rect {
        #[serde(default)]
        corner_radius: f64,
    },
    Ellipse,
    /// SVG path data in the shape's local `width x height` box.
    Path { d: String },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    #[serde(default)]
    pub fill: Option<Rgba8>,
    #[serde(default)]
    pub stroke: Option<Rgba8>,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default = "one")]
    pub opacity: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(Rgba8::BLACK),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
        }
    }
}

/// Generated placeholder holding the rasterized appearance of `source`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyShape {
    pub source: ShapeId,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub image: Option<ImageHandle>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeMeta {
    #[serde(default)]
    pub effect_stack: Option<EffectStackConfig>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub edit_mode: bool,
    #[serde(default)]
    pub proxy_ready: bool,
}

impl Shape {
    pub fn leaf(id: impl Into<ShapeId>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            parent: None,
            z_index: 0.0,
            x,
            y,
            rotation: 0.0,
            kind: ShapeKind::Leaf(LeafShape {
                width,
                height,
                geometry: Geometry::Rect { corner_radius: 0.0 },
                style: ShapeStyle::default(),
            }),
            meta: ShapeMeta::default(),
        }
    }

    pub fn group(id: impl Into<ShapeId>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            z_index: 0.0,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            kind: ShapeKind::Group,
            meta: ShapeMeta::default(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<ShapeId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_z(mut self, z_index: f64) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        if let ShapeKind::Leaf(leaf) = &mut self.kind {
            leaf.geometry = geometry;
        }
        self
    }

    pub fn with_fill(mut self, fill: Rgba8) -> Self {
        if let ShapeKind::Leaf(leaf) = &mut self.kind {
            leaf.style.fill = Some(fill);
        }
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        if let ShapeKind::Leaf(leaf) = &mut self.kind {
            leaf.style.opacity = opacity;
        }
        self
    }

    pub fn with_effects(mut self, stack: EffectStackConfig) -> Self {
        self.meta.effect_stack = Some(stack);
        self
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, ShapeKind::Proxy(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group)
    }

    /// Source id declared by a proxy shape.
    pub fn proxy_source(&self) -> Option<&ShapeId> {
        match &self.kind {
            ShapeKind::Proxy(p) => Some(&p.source),
            _ => None,
        }
    }

    /// Transform from this shape's local space into its parent's space.
    pub fn local_transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y)) * Affine::rotate(self.rotation.to_radians())
    }

    /// Local-space size for shapes that have one; groups are sized by their children.
    pub fn local_size(&self) -> Option<(f64, f64)> {
        match &self.kind {
            ShapeKind::Leaf(l) => Some((l.width, l.height)),
            ShapeKind::Proxy(p) => Some((p.width, p.height)),
            ShapeKind::Group => None,
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub z_index: Option<f64>,
    /// Replaces the kind payload wholesale (e.g. new proxy size or image).
    pub kind: Option<ShapeKind>,
    pub effect_stack: Option<Option<EffectStackConfig>>,
    pub hidden: Option<bool>,
    pub edit_mode: Option<bool>,
    pub proxy_ready: Option<bool>,
}

impl ShapeUpdate {
    pub fn hidden(hidden: bool) -> Self {
        Self {
            hidden: Some(hidden),
            ..Self::default()
        }
    }

    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn effect_stack(stack: Option<EffectStackConfig>) -> Self {
        Self {
            effect_stack: Some(stack),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto `shape`, returning whether anything changed.
    pub fn apply_to(&self, shape: &mut Shape) -> bool {
        let before = shape.clone();
        if let Some(v) = self.x {
            shape.x = v;
        }
        if let Some(v) = self.y {
            shape.y = v;
        }
        if let Some(v) = self.rotation {
            shape.rotation = v;
        }
        if let Some(v) = self.z_index {
            shape.z_index = v;
        }
        if let Some(kind) = &self.kind {
            shape.kind = kind.clone();
        }
        if let Some(stack) = &self.effect_stack {
            shape.meta.effect_stack = stack.clone();
        }
        if let Some(v) = self.hidden {
            shape.meta.hidden = v;
        }
        if let Some(v) = self.edit_mode {
            shape.meta.edit_mode = v;
        }
        if let Some(v) = self.proxy_ready {
            shape.meta.proxy_ready = v;
        }
        *shape != before
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/shape.rs"]
mod tests;
