use anyhow::{ensure, Result};
use slotmap::Key;

/// Maximum number of vertex buffer slots in a [`Bindings`] record.
pub const MAX_VERTEX_BUFFERS: usize = 4;

/// Maximum number of vertex attributes in a [`VertexLayout`].
pub const MAX_VERTEX_ATTRIBUTES: usize = 16;

// ── handles ───────────────────────────────────────────────────────────────

slotmap::new_key_type! {
    /// Compiled shader program owned by a backend.
    pub struct ShaderHandle;
    /// GPU buffer owned by a backend.
    pub struct BufferHandle;
    /// Render pipeline owned by a backend.
    pub struct PipelineHandle;
}

macro_rules! handle_id {
    ($($name:ident),*) => {$(
        impl $name {
            /// Opaque id for logging; unique per key, including its version.
            #[inline]
            pub fn id(self) -> u64 {
                self.data().as_ffi()
            }

            /// False only for the null handle, which backends never issue.
            #[inline]
            pub fn is_valid(self) -> bool {
                !self.is_null()
            }
        }
    )*};
}

handle_id!(ShaderHandle, BufferHandle, PipelineHandle);

/// GPU API a backend is running on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Backend {
    Vulkan,
    Metal,
    Dx12,
    Gl,
    WebGpu,
    /// No GPU: commands are recorded in memory.
    Headless,
}

// ── color / pass action ───────────────────────────────────────────────────

/// Straight-alpha linear RGBA color.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// What happens to the color target when a pass begins.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadAction {
    Clear,
    Load,
    DontCare,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorAction {
    pub load: LoadAction,
    /// Only used with [`LoadAction::Clear`].
    pub clear_value: Color,
}

/// How the render target is initialized at the start of a pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PassAction {
    pub color: ColorAction,
}

impl PassAction {
    /// Clears the color target to `color`.
    pub const fn clear(color: Color) -> Self {
        Self {
            color: ColorAction {
                load: LoadAction::Clear,
                clear_value: color,
            },
        }
    }
}

impl Default for PassAction {
    fn default() -> Self {
        Self::clear(Color::BLACK)
    }
}

/// Current swapchain target, in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Swapchain {
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
}

/// A render pass targeting the swapchain.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pass {
    pub action: PassAction,
    pub swapchain: Swapchain,
}

// ── resource descriptions ─────────────────────────────────────────────────

/// WGSL shader module with its two entry points.
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    pub label: Option<&'a str>,
    pub source: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BufferUsage {
    Vertex,
    Index,
}

/// Immutable buffer initialized from `data`.
#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: Option<&'a str>,
    pub usage: BufferUsage,
    pub data: &'a [u8],
}

impl BufferDesc<'_> {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.data.is_empty(),
            "buffer {:?} has no initial data",
            self.label.unwrap_or("<unnamed>")
        );
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VertexFormat {
    Float,
    Float2,
    Float3,
    Float4,
}

impl VertexFormat {
    /// Size in bytes.
    pub const fn size(self) -> u64 {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }
}

/// One attribute with its resolved byte offset.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttr {
    pub location: u32,
    pub format: VertexFormat,
    pub offset: u64,
}

/// Interleaved layout of vertex buffer slot 0.
///
/// Attributes are packed tightly in shader-location order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexLayout {
    attrs: Vec<(u32, VertexFormat)>,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the attribute bound to shader `location`.
    pub fn attr(mut self, location: u32, format: VertexFormat) -> Self {
        self.attrs.push((location, format));
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.attrs.is_empty(), "vertex layout has no attributes");
        ensure!(
            self.attrs.len() <= MAX_VERTEX_ATTRIBUTES,
            "vertex layout has {} attributes (max {MAX_VERTEX_ATTRIBUTES})",
            self.attrs.len()
        );
        for (i, (loc, _)) in self.attrs.iter().enumerate() {
            ensure!(
                !self.attrs[..i].iter().any(|(l, _)| l == loc),
                "vertex attribute location {loc} declared twice"
            );
        }
        Ok(())
    }

    /// Attributes sorted by location, with packed offsets.
    pub fn attributes(&self) -> Vec<VertexAttr> {
        let mut sorted = self.attrs.clone();
        sorted.sort_by_key(|(loc, _)| *loc);

        let mut offset = 0;
        sorted
            .into_iter()
            .map(|(location, format)| {
                let attr = VertexAttr { location, format, offset };
                offset += format.size();
                attr
            })
            .collect()
    }

    /// Byte distance between consecutive vertices.
    pub fn stride(&self) -> u64 {
        self.attrs.iter().map(|(_, f)| f.size()).sum()
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PrimitiveType {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
}

#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: Option<&'a str>,
    pub shader: ShaderHandle,
    pub layout: VertexLayout,
    pub primitive: PrimitiveType,
}

/// Buffers attached to the current pipeline for a draw.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Bindings {
    pub vertex_buffers: [Option<BufferHandle>; MAX_VERTEX_BUFFERS],
}

impl Bindings {
    /// Bindings with a single vertex buffer in slot 0.
    pub fn with_vertex_buffer(buffer: BufferHandle) -> Self {
        let mut b = Self::default();
        b.vertex_buffers[0] = Some(buffer);
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position_color() -> VertexLayout {
        VertexLayout::new()
            .attr(0, VertexFormat::Float3)
            .attr(1, VertexFormat::Float4)
    }

    // ── vertex layout ─────────────────────────────────────────────────────

    #[test]
    fn stride_is_sum_of_formats() {
        assert_eq!(position_color().stride(), 28);
    }

    #[test]
    fn offsets_follow_location_order() {
        let layout = VertexLayout::new()
            .attr(1, VertexFormat::Float4)
            .attr(0, VertexFormat::Float3);
        let attrs = layout.attributes();
        assert_eq!(attrs[0], VertexAttr { location: 0, format: VertexFormat::Float3, offset: 0 });
        assert_eq!(attrs[1], VertexAttr { location: 1, format: VertexFormat::Float4, offset: 12 });
    }

    #[test]
    fn duplicate_location_is_rejected() {
        let layout = VertexLayout::new()
            .attr(0, VertexFormat::Float3)
            .attr(0, VertexFormat::Float2);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn empty_layout_is_rejected() {
        assert!(VertexLayout::new().validate().is_err());
        assert!(position_color().validate().is_ok());
    }

    // ── buffers / bindings ────────────────────────────────────────────────

    #[test]
    fn empty_buffer_is_rejected() {
        let desc = BufferDesc { label: Some("empty"), usage: BufferUsage::Vertex, data: &[] };
        assert!(desc.validate().is_err());
    }

    #[test]
    fn issued_handles_are_not_null() {
        let mut pool: slotmap::SlotMap<BufferHandle, ()> = slotmap::SlotMap::with_key();
        let h = pool.insert(());
        assert!(h.is_valid());
        assert!(!BufferHandle::null().is_valid());
        assert_ne!(h.id(), BufferHandle::null().id());
    }

    #[test]
    fn bindings_fill_slot_zero_only() {
        let mut pool: slotmap::SlotMap<BufferHandle, ()> = slotmap::SlotMap::with_key();
        let h = pool.insert(());
        let b = Bindings::with_vertex_buffer(h);
        assert_eq!(b.vertex_buffers[0], Some(h));
        assert!(b.vertex_buffers[1..].iter().all(Option::is_none));
    }

    // ── pass action ───────────────────────────────────────────────────────

    #[test]
    fn clear_action_keeps_color() {
        let c = Color::rgba(0.2, 0.3, 0.3, 1.0);
        let a = PassAction::clear(c);
        assert_eq!(a.color.load, LoadAction::Clear);
        assert_eq!(a.color.clear_value, c);
    }
}
