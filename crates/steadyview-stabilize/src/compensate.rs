//! Re-alignment of a frame by the global motion vector.

use crate::motion::MotionVector;
use steadyview_core::{GrayFrame, Result};

/// Write `dest(x, y) = source(x - dx, y - dy)` wherever the source pixel
/// exists. Pixels of `dest` outside the overlap are left untouched, so the
/// caller decides the background by pre-filling it.
pub fn compensate_into(source: &GrayFrame, vector: MotionVector, dest: &mut GrayFrame) -> Result<()> {
    dest.ensure_size(source.size())?;

    let w = source.width() as i64;
    let h = source.height() as i64;
    let (dx, dy) = (vector.dx as i64, vector.dy as i64);

    let x_start = dx.max(0);
    let x_end = (w + dx).min(w);
    let y_start = dy.max(0);
    let y_end = (h + dy).min(h);
    if x_start >= x_end || y_start >= y_end {
        return Ok(());
    }

    let (src_x0, src_x1) = ((x_start - dx) as usize, (x_end - dx) as usize);
    for y in y_start..y_end {
        let src = source.row((y - dy) as u32);
        let dst = dest.row_mut(y as u32);
        dst[x_start as usize..x_end as usize].copy_from_slice(&src[src_x0..src_x1]);
    }
    Ok(())
}
