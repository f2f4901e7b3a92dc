//! 8-connected component labeling on binary masks.

use boardsight_core::BoardRegion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Component {
    pub bbox: BoardRegion,
    /// Number of mask pixels in the component.
    pub area: usize,
}

/// Label map (`0` = background, `k` = component `k - 1`) plus components in
/// raster order of their first pixel.
pub(crate) fn label_components(
    mask: &[bool],
    width: usize,
    height: usize,
) -> (Vec<u32>, Vec<Component>) {
    debug_assert_eq!(mask.len(), width * height);
    let mut labels = vec![0u32; mask.len()];
    let mut components = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || labels[start] != 0 {
            continue;
        }
        let label = components.len() as u32 + 1;
        labels[start] = label;
        stack.push(start);

        let (mut x0, mut y0) = (usize::MAX, usize::MAX);
        let (mut x1, mut y1) = (0usize, 0usize);
        let mut area = 0usize;

        while let Some(idx) = stack.pop() {
            let x = idx % width;
            let y = idx / width;
            area += 1;
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);

            let ny0 = y.saturating_sub(1);
            let ny1 = (y + 1).min(height - 1);
            let nx0 = x.saturating_sub(1);
            let nx1 = (x + 1).min(width - 1);
            for ny in ny0..=ny1 {
                for nx in nx0..=nx1 {
                    let n = ny * width + nx;
                    if mask[n] && labels[n] == 0 {
                        labels[n] = label;
                        stack.push(n);
                    }
                }
            }
        }

        components.push(Component {
            bbox: BoardRegion::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1),
            area,
        });
    }

    (labels, components)
}

pub(crate) fn connected_components(mask: &[bool], width: usize, height: usize) -> Vec<Component> {
    label_components(mask, width, height).1
}
