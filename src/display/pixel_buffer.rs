// ============================================================================
// Utility Functions
// ============================================================================

/// Write ABGR pixel with custom alpha (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel_rgba(dest: &mut [u8], r: u8, g: u8, b: u8, a: u8) {
    dest[0] = a; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

/// Source-over with straight (non-premultiplied) alpha on both sides.
/// The destination may itself be translucent, as in off-screen sprite surfaces.
#[inline]
fn blend_over(dest: &mut [u8], r: u8, g: u8, b: u8, a: u8) {
    if a == 0 {
        return;
    }
    let da = dest[0] as u32;
    if a == 255 || da == 0 {
        write_pixel_rgba(dest, r, g, b, a);
        return;
    }

    let sa = a as u32;
    // Destination contribution, scaled to 0..=255*255
    let dw = da * (255 - sa);
    let out_a = sa * 255 + dw;
    let mix = |s: u8, d: u8| -> u8 {
        let num = s as u32 * sa * 255 + d as u32 * dw;
        ((num + out_a / 2) / out_a) as u8
    };

    let out_r = mix(r, dest[3]);
    let out_g = mix(g, dest[2]);
    let out_b = mix(b, dest[1]);
    write_pixel_rgba(dest, out_r, out_g, out_b, ((out_a + 127) / 255) as u8);
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 pixel buffer with straight alpha for software rendering.
/// Both the visible surface and every off-screen cache are one of these.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a new fully transparent pixel buffer with custom resolution
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocate for a new size; contents are cleared to transparent
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize((width * height * 4) as usize, 0);
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Clear to a solid color with custom alpha
    pub fn clear_rgba(&mut self, r: u8, g: u8, b: u8, a: u8) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            write_pixel_rgba(chunk, r, g, b, a);
        }
    }

    /// Clear to fully transparent (canvas `clearRect` over the whole surface)
    pub fn clear_transparent(&mut self) {
        self.pixels.fill(0);
    }

    /// Set a single pixel with custom alpha (bounds checked)
    #[inline]
    pub fn set_pixel_rgba(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            write_pixel_rgba(&mut self.pixels[idx..idx + 4], r, g, b, a);
        }
    }

    /// Read all 4 channels of a pixel (bounds checked)
    /// Returns (r, g, b, a) or None if out of bounds
    #[inline]
    pub fn get_pixel_rgba(&self, x: i32, y: i32) -> Option<(u8, u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
                self.pixels[idx],     // A
            ))
        } else {
            None
        }
    }

    /// Source-over blend a pixel (bounds checked)
    #[inline]
    pub fn blend_pixel_rgba(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            blend_over(&mut self.pixels[idx..idx + 4], r, g, b, a);
        }
    }

    /// Bilinear sample at continuous pixel coordinates (pixel centers at +0.5).
    /// Interpolates in premultiplied space so transparent texels don't bleed
    /// black into edges. Outside the buffer counts as transparent.
    /// Returns straight-alpha (r, g, b, a) in 0..=255 floats.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> (f32, f32, f32, f32) {
        let fx = x - 0.5;
        let fy = y - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let mut acc = [0.0f32; 4];
        for (dx, dy, w) in [
            (0, 0, (1.0 - tx) * (1.0 - ty)),
            (1, 0, tx * (1.0 - ty)),
            (0, 1, (1.0 - tx) * ty),
            (1, 1, tx * ty),
        ] {
            if w <= 0.0 {
                continue;
            }
            if let Some((r, g, b, a)) = self.get_pixel_rgba(x0 + dx, y0 + dy) {
                let pa = a as f32 * w;
                acc[0] += r as f32 * pa;
                acc[1] += g as f32 * pa;
                acc[2] += b as f32 * pa;
                acc[3] += pa;
            }
        }

        if acc[3] <= 0.0 {
            return (0.0, 0.0, 0.0, 0.0);
        }
        (acc[0] / acc[3], acc[1] / acc[3], acc[2] / acc[3], acc[3])
    }

    // ========================================================================
    // Buffer Operations
    // ========================================================================

    /// Composite a source buffer onto this one at (dst_x, dst_y) using
    /// per-pixel source alpha (source-over).
    /// Skips fully transparent pixels; fast-copies fully opaque ones.
    pub fn composite(&mut self, src: &PixelBuffer, dst_x: i32, dst_y: i32) {
        let src_w = src.width() as i32;
        let src_h = src.height() as i32;
        let dst_w = self.width as i32;
        let dst_h = self.height as i32;

        for sy in 0..src_h {
            let dy = dst_y + sy;
            if dy < 0 || dy >= dst_h {
                continue;
            }

            for sx in 0..src_w {
                let dx = dst_x + sx;
                if dx < 0 || dx >= dst_w {
                    continue;
                }

                let si = src.pixel_index(sx as u32, sy as u32);
                let sa = src.pixels[si]; // alpha channel (ABGR[0])
                if sa == 0 {
                    continue;
                }

                let di = self.pixel_index(dx as u32, dy as u32);
                blend_over(
                    &mut self.pixels[di..di + 4],
                    src.pixels[si + 3],
                    src.pixels[si + 2],
                    src.pixels[si + 1],
                    sa,
                );
            }
        }
    }

    /// Number of pixels with non-zero alpha
    pub fn coverage(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|p| p[0] != 0).count()
    }

    /// Get raw pixel data for texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
