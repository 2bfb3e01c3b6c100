use winit::dpi::PhysicalSize;

use super::frame::SurfaceErrorAction;

pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let first = formats.first().copied()?;

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| formats.contains(f)) {
            return Some(f);
        }
        log::warn!("no sRGB surface format available; using {first:?}");
    }

    Some(first)
}

/// Opaque when available; the viewer never composites with the desktop.
pub(crate) fn choose_alpha_mode(supported: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    if supported.contains(&wgpu::CompositeAlphaMode::Opaque) {
        return wgpu::CompositeAlphaMode::Opaque;
    }
    supported.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Largest supported sample count not above `requested`, falling back to 1.
pub(crate) fn pick_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    [16, 8, 4, 2]
        .into_iter()
        .filter(|&n| n <= requested)
        .find(|&n| supported(n))
        .unwrap_or(1)
}

/// Returns `true` when the surface was reconfigured.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) -> bool {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        // Minimized; keep the previous configuration until a real size arrives.
        return false;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
    true
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            log::warn!("surface {err:?}; reconfiguring");
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => {
            log::error!("surface out of memory");
            SurfaceErrorAction::Fatal
        }
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => {
            log::warn!("surface {err:?}; skipping frame");
            SurfaceErrorAction::SkipFrame
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn prefers_srgb_formats() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgba8UnormSrgb));
        assert_eq!(choose_surface_format(&formats, false), Some(F::Bgra8Unorm));
        assert_eq!(choose_surface_format(&[], true), None);
    }

    #[test]
    fn opaque_alpha_preferred() {
        use wgpu::CompositeAlphaMode as A;
        assert_eq!(choose_alpha_mode(&[A::PreMultiplied, A::Opaque]), A::Opaque);
        assert_eq!(choose_alpha_mode(&[A::PreMultiplied]), A::PreMultiplied);
        assert_eq!(choose_alpha_mode(&[]), A::Auto);
    }

    #[test]
    fn sample_count_falls_back() {
        assert_eq!(pick_sample_count(4, |n| n == 4 || n == 2), 4);
        assert_eq!(pick_sample_count(8, |n| n == 4), 4);
        assert_eq!(pick_sample_count(4, |_| false), 1);
        assert_eq!(pick_sample_count(1, |_| true), 1);
    }
}
