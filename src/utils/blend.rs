//! Non-separable and separable blend modes from the W3C compositing spec,
//! on 8-bit RGB channels.

/// W3C luminosity of an RGB color in [0, 1]
fn lum(c: [f64; 3]) -> f64 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f64; 3]) -> [f64; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for v in &mut out {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut out {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: [f64; 3], l: f64) -> [f64; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f64; 3]) -> f64 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f64; 3], s: f64) -> [f64; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    if max <= min {
        return [0.0; 3];
    }
    c.map(|v| {
        if v == max {
            s
        } else if v == min {
            0.0
        } else {
            (v - min) * s / (max - min)
        }
    })
}

fn to_unit(c: [u8; 3]) -> [f64; 3] {
    c.map(|v| v as f64 / 255.0)
}

fn to_byte(c: [f64; 3]) -> [u8; 3] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// "saturation" blend: hue and luminosity of the backdrop, saturation of the
/// source
pub fn saturation(backdrop: [u8; 3], source: [u8; 3]) -> [u8; 3] {
    let cb = to_unit(backdrop);
    let cs = to_unit(source);
    to_byte(set_lum(set_sat(cb, sat(cs)), lum(cb)))
}

/// "screen" blend, per channel `b + s - b*s`
pub fn screen(backdrop: [u8; 3], source: [u8; 3]) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let (b, s) = (backdrop[i] as u32, source[i] as u32);
        out[i] = (b + s - (b * s + 127) / 255) as u8;
    }
    out
}

/// Source-over a translucent color onto an opaque backdrop
pub fn over(backdrop: [u8; 3], source: [u8; 3], alpha: f64) -> [u8; 3] {
    let alpha = alpha.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for i in 0..3 {
        let v = source[i] as f64 * alpha + backdrop[i] as f64 * (1.0 - alpha);
        out[i] = v.round() as u8;
    }
    out
}
