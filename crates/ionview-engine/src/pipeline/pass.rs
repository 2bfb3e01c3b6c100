use crate::render::RenderTexture;

/// Per-frame data handed to every pass.
pub struct PassCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Host timestamp of the frame being rendered, in milliseconds.
    pub timestamp_ms: f64,
}

/// Post-processing stage: reads one HDR target and writes the next.
///
/// Passes own their intermediate resources and must recreate them after
/// [`PostPass::set_size`].
pub trait PostPass {
    fn name(&self) -> &str;

    /// Records the new chain resolution (physical pixels).
    fn set_size(&mut self, width: u32, height: u32);

    /// Records GPU work reading `input` and writing every texel of `output`.
    fn render(
        &mut self,
        ctx: &PassCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        input: &RenderTexture,
        output: &RenderTexture,
    );

    /// Drops GPU resources. The pass may be rendered again afterwards.
    fn release(&mut self) {}
}

/// Ping-pong slot indices `(input, output)` for each post pass.
///
/// The scene pass always writes slot 0. Returns the per-pass steps and the
/// slot holding the final image.
pub fn plan_chain(post_passes: usize) -> (Vec<(usize, usize)>, usize) {
    let steps: Vec<(usize, usize)> = (0..post_passes).map(|i| (i % 2, (i + 1) % 2)).collect();
    let last = steps.last().map_or(0, |&(_, out)| out);
    (steps, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_post_passes_present_scene_slot() {
        assert_eq!(plan_chain(0), (vec![], 0));
    }

    #[test]
    fn each_pass_reads_previous_output() {
        let (steps, last) = plan_chain(3);
        assert_eq!(steps, vec![(0, 1), (1, 0), (0, 1)]);
        assert_eq!(last, 1);
        for pair in steps.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }
}
