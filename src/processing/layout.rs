/// Largest size with the source aspect ratio that fits inside the canvas.
///
/// Upscaling is allowed so small photos fill the frame; dimensions are truncated
/// and never drop below one pixel.
pub fn fit_within(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let iw = f64::from(src_w.max(1));
    let ih = f64::from(src_h.max(1));
    let cw = f64::from(canvas_w.max(1));
    let ch = f64::from(canvas_h.max(1));
    let scale = (cw / iw).min(ch / ih);
    let scale = if scale.is_finite() { scale } else { 1.0 };
    let w = (iw * scale).floor().max(1.0);
    let h = (ih * scale).floor().max(1.0);
    (w as u32, h as u32)
}
