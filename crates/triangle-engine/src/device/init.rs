use super::surface;

/// Initialization parameters for the GPU layer.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Backends wgpu may pick from.
    ///
    /// Defaults to all of them; `with_env_backends` narrows the set from
    /// `WGPU_BACKEND` (e.g. `vulkan`, `metal`, `dx12`, `gl`).
    pub backends: wgpu::Backends,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Swap behavior. FIFO is vsynced and supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Requested alpha mode; replaced by a supported one if unavailable.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Hint only; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl GpuInit {
    /// Surface format this configuration selects from `formats`.
    pub fn surface_format(&self, formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
        surface::choose_surface_format(formats, self.prefer_srgb)
    }

    /// Applies the `WGPU_BACKEND` override, if set and parseable.
    pub fn with_env_backends(mut self) -> Self {
        if let Some(backends) = wgpu::Backends::from_env() {
            log::info!("backend override from environment: {backends:?}");
            self.backends = backends;
        }
        self
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
