//! Blend kernels
//!
//! The compositor funnels every scanline write through a [`BlendKernel`]. Two
//! implementations exist:
//!
//! - [`ScalarKernel`]: one pixel at a time. This is the reference.
//! - [`WideKernel`]: splits each span into an unaligned head, a run of aligned
//!   128-bit words (four pixels per load/store) and a tail.
//!
//! Both must produce byte-identical buffers for every input.

use std::fmt;

/// Blend `top` over `bottom` (both `0xAARRGGBB`) with integer fixed-point math.
///
/// Alpha is `ta + ba * (256 - ta) / 256`; each colour channel moves from the
/// bottom value towards the top value by `ta / 256`. All arithmetic wraps in
/// 32 bits, which keeps the red/blue pair packed in a single word. A fully
/// opaque top replaces the pixel outright.
#[inline]
pub fn blend(bottom: u32, top: u32) -> u32 {
    let ta = top >> 24;
    if ta == 0xFF {
        return top;
    }
    let ba = bottom >> 24;

    let mut rb = bottom & 0x00FF_00FF;
    let mut g = bottom & 0x0000_FF00;
    let a = (ta + ((ba * (0x100 - ta)) >> 8)) & 0xFF;
    rb = rb.wrapping_add((top & 0x00FF_00FF).wrapping_sub(rb).wrapping_mul(ta) >> 8);
    g = g.wrapping_add((top & 0x0000_FF00).wrapping_sub(g).wrapping_mul(ta) >> 8);

    (rb & 0x00FF_00FF) | (g & 0x0000_FF00) | (a << 24)
}

/// Replace the alpha of `pixel` with the low byte of `mask`
#[inline]
pub fn mask_alpha(pixel: u32, mask: u32) -> u32 {
    (pixel & 0x00FF_FFFF) | ((mask & 0xFF) << 24)
}

/// Scanline operations used by the pixel buffer
pub trait BlendKernel: fmt::Debug + Send + Sync {
    /// Overwrite every pixel of `span` with `value`
    fn fill(&self, span: &mut [u32], value: u32);

    /// Blend a single color over every pixel of `span`
    fn blend_solid(&self, span: &mut [u32], value: u32);

    /// Blend `values[i]` over `span[i]`; extra elements on either side are ignored
    fn blend_span(&self, span: &mut [u32], values: &[u32]);

    /// Replace the alpha of `span[i]` with the low byte of `mask[i]`
    fn replace_alpha(&self, span: &mut [u32], mask: &[u32]);
}

/// Which kernel a buffer dispatches to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelKind {
    Scalar,
    Wide,
}

impl KernelKind {
    /// Wide words on 64-bit targets, scalar elsewhere
    pub fn detect() -> Self {
        if cfg!(target_pointer_width = "64") {
            KernelKind::Wide
        } else {
            KernelKind::Scalar
        }
    }

    pub fn kernel(self) -> &'static dyn BlendKernel {
        match self {
            KernelKind::Scalar => &ScalarKernel,
            KernelKind::Wide => &WideKernel,
        }
    }
}

impl Default for KernelKind {
    fn default() -> Self {
        Self::detect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scalar
// ─────────────────────────────────────────────────────────────────────────────

/// One pixel per step
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarKernel;

impl BlendKernel for ScalarKernel {
    fn fill(&self, span: &mut [u32], value: u32) {
        for px in span {
            *px = value;
        }
    }

    fn blend_solid(&self, span: &mut [u32], value: u32) {
        for px in span {
            *px = blend(*px, value);
        }
    }

    fn blend_span(&self, span: &mut [u32], values: &[u32]) {
        for (px, &v) in span.iter_mut().zip(values) {
            *px = blend(*px, v);
        }
    }

    fn replace_alpha(&self, span: &mut [u32], mask: &[u32]) {
        for (px, &m) in span.iter_mut().zip(mask) {
            *px = mask_alpha(*px, m);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wide
// ─────────────────────────────────────────────────────────────────────────────

const LANES: usize = 4;

/// Four pixels per aligned 128-bit word
#[derive(Clone, Copy, Debug, Default)]
pub struct WideKernel;

#[inline]
fn splat(value: u32) -> u128 {
    bytemuck::cast([value; LANES])
}

#[inline]
fn blend_word(bottom: u128, top: u128) -> u128 {
    let b: [u32; LANES] = bytemuck::cast(bottom);
    let t: [u32; LANES] = bytemuck::cast(top);
    // An opaque word is a plain store
    if t.iter().all(|&v| v >> 24 == 0xFF) {
        return top;
    }
    bytemuck::cast([
        blend(b[0], t[0]),
        blend(b[1], t[1]),
        blend(b[2], t[2]),
        blend(b[3], t[3]),
    ])
}

#[inline]
fn mask_word(pixels: u128, mask: [u32; LANES]) -> u128 {
    let p: [u32; LANES] = bytemuck::cast(pixels);
    bytemuck::cast([
        mask_alpha(p[0], mask[0]),
        mask_alpha(p[1], mask[1]),
        mask_alpha(p[2], mask[2]),
        mask_alpha(p[3], mask[3]),
    ])
}

#[inline]
fn lanes(values: &[u32]) -> [u32; LANES] {
    [values[0], values[1], values[2], values[3]]
}

impl BlendKernel for WideKernel {
    fn fill(&self, span: &mut [u32], value: u32) {
        let (head, body, tail) = bytemuck::pod_align_to_mut::<u32, u128>(span);
        head.fill(value);
        body.fill(splat(value));
        tail.fill(value);
    }

    fn blend_solid(&self, span: &mut [u32], value: u32) {
        let (head, body, tail) = bytemuck::pod_align_to_mut::<u32, u128>(span);
        ScalarKernel.blend_solid(head, value);
        let top = splat(value);
        for word in body {
            *word = blend_word(*word, top);
        }
        ScalarKernel.blend_solid(tail, value);
    }

    fn blend_span(&self, span: &mut [u32], values: &[u32]) {
        let len = span.len().min(values.len());
        let (head, body, tail) = bytemuck::pod_align_to_mut::<u32, u128>(&mut span[..len]);
        let (head_values, rest) = values[..len].split_at(head.len());
        let (body_values, tail_values) = rest.split_at(body.len() * LANES);

        ScalarKernel.blend_span(head, head_values);
        for (word, chunk) in body.iter_mut().zip(body_values.chunks_exact(LANES)) {
            *word = blend_word(*word, bytemuck::cast(lanes(chunk)));
        }
        ScalarKernel.blend_span(tail, tail_values);
    }

    fn replace_alpha(&self, span: &mut [u32], mask: &[u32]) {
        let len = span.len().min(mask.len());
        let (head, body, tail) = bytemuck::pod_align_to_mut::<u32, u128>(&mut span[..len]);
        let (head_mask, rest) = mask[..len].split_at(head.len());
        let (body_mask, tail_mask) = rest.split_at(body.len() * LANES);

        ScalarKernel.replace_alpha(head, head_mask);
        for (word, chunk) in body.iter_mut().zip(body_mask.chunks_exact(LANES)) {
            *word = mask_word(*word, lanes(chunk));
        }
        ScalarKernel.replace_alpha(tail, tail_mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small deterministic generator so the equivalence checks cover many
    /// colors without pulling in a RNG crate
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 32) as u32
        }

        fn fill(&mut self, n: usize) -> Vec<u32> {
            (0..n).map(|_| self.next()).collect()
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Blend formula
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn opaque_top_replaces_pixel() {
        let mut rng = Lcg(1);
        for _ in 0..1000 {
            let bottom = rng.next();
            let top = rng.next() | 0xFF00_0000;
            assert_eq!(blend(bottom, top), top);
        }
    }

    #[test]
    fn transparent_top_leaves_pixel() {
        let mut rng = Lcg(2);
        for _ in 0..1000 {
            let bottom = rng.next();
            let top = rng.next() & 0x00FF_FFFF;
            assert_eq!(blend(bottom, top), bottom);
        }
    }

    #[test]
    fn half_blue_over_opaque_red() {
        // Worked through the fixed-point formula by hand
        assert_eq!(blend(0xFFFF_0000, 0x8000_00FF), 0xFF7F_007F);
        assert_eq!(blend(0x0000_0000, 0x8000_00FF), 0x8000_007F);
    }

    #[test]
    fn mask_alpha_uses_low_byte() {
        assert_eq!(mask_alpha(0xFF12_3456, 0x0000_0080), 0x8012_3456);
        assert_eq!(mask_alpha(0x0012_3456, 0xABCD_EFFF), 0xFF12_3456);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scalar / wide equivalence
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn wide_matches_scalar_for_every_offset_and_length() {
        let mut rng = Lcg(3);
        let base = rng.fill(64);
        let colors = rng.fill(64);

        for start in 0..8 {
            for len in 0..(64 - start) {
                let end = start + len;
                let solid = colors[len];

                let mut a = base.clone();
                let mut b = base.clone();
                ScalarKernel.blend_solid(&mut a[start..end], solid);
                WideKernel.blend_solid(&mut b[start..end], solid);
                assert_eq!(a, b, "blend_solid start={start} len={len}");

                let mut a = base.clone();
                let mut b = base.clone();
                ScalarKernel.blend_span(&mut a[start..end], &colors[..len]);
                WideKernel.blend_span(&mut b[start..end], &colors[..len]);
                assert_eq!(a, b, "blend_span start={start} len={len}");

                let mut a = base.clone();
                let mut b = base.clone();
                ScalarKernel.fill(&mut a[start..end], solid);
                WideKernel.fill(&mut b[start..end], solid);
                assert_eq!(a, b, "fill start={start} len={len}");

                let mut a = base.clone();
                let mut b = base.clone();
                ScalarKernel.replace_alpha(&mut a[start..end], &colors[..len]);
                WideKernel.replace_alpha(&mut b[start..end], &colors[..len]);
                assert_eq!(a, b, "replace_alpha start={start} len={len}");
            }
        }
    }

    #[test]
    fn mismatched_span_lengths_use_the_shorter() {
        let mut a = vec![0u32; 8];
        let mut b = vec![0u32; 8];
        let values = [0xFF00_FF00u32; 5];
        ScalarKernel.blend_span(&mut a, &values);
        WideKernel.blend_span(&mut b, &values);
        assert_eq!(a, b);
        assert_eq!(&a[..5], &values);
        assert!(a[5..].iter().all(|&p| p == 0));
    }

    #[test]
    fn detect_picks_a_kernel() {
        let kind = KernelKind::detect();
        assert_eq!(KernelKind::default(), kind);
        let _ = kind.kernel();
    }
}
