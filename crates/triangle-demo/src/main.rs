mod renderer;
mod vertex;

use anyhow::Result;

use triangle_engine::device::GpuInit;
use triangle_engine::logging::{init_logging, LoggingConfig};
use triangle_engine::window::{Runtime, RuntimeConfig};

use renderer::TriangleRenderer;

/// Linear swapchain, so the clear and vertex colors land in the framebuffer unchanged.
fn gpu_init() -> GpuInit {
    GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    }
    .with_env_backends()
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Triangle".to_string(),
        width: 800,
        height: 600,
        high_dpi: true,
    };

    Runtime::run(config, gpu_init(), TriangleRenderer::new())
}
