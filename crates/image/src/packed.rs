use base::Vec2;

/// Pack ARGB bytes into `0xAARRGGBB` words, the layout preview windows draw.
pub fn argb_to_u32(size: Vec2<usize>, data: &[u8]) -> Vec<u32> {
    let mut buf = Vec::with_capacity(size.area());
    for chunk in data.chunks_exact(4).take(size.area()) {
        buf.push(
            (chunk[0] as u32) << 24
                | (chunk[1] as u32) << 16
                | (chunk[2] as u32) << 8
                | chunk[3] as u32,
        );
    }
    buf
}

