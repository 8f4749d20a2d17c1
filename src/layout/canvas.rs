use crate::config::LayoutConfig;

use super::types::ApplicationLayout;

/// Greedy row packing: tallest Applications first, rows bounded by the
/// configured maximum width, members vertically centered against the row's
/// tallest occupant. Deterministic over optimal.
pub(super) fn pack_canvas(apps: &mut [ApplicationLayout], config: &LayoutConfig) -> (f32, f32) {
    if apps.is_empty() {
        return (0.0, 0.0);
    }

    apps.sort_by(|a, b| {
        b.height
            .partial_cmp(&a.height)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    let margin = config.app_gap;
    let mut scene_width = 0.0f32;
    let mut row_y = margin;
    let mut idx = 0;

    while idx < apps.len() {
        let row_start = idx;
        let mut x_cursor = margin;
        let mut row_height = 0.0f32;

        // Fill one row; an Application wider than the bound still gets
        // placed, alone.
        while idx < apps.len() {
            let width = apps[idx].width;
            if idx > row_start && x_cursor + width > config.max_row_width {
                break;
            }
            apps[idx].x = x_cursor;
            x_cursor += width + config.app_gap;
            row_height = row_height.max(apps[idx].height);
            idx += 1;
        }

        for app in &mut apps[row_start..idx] {
            app.y = row_y + (row_height - app.height) / 2.0;
        }
        scene_width = scene_width.max(x_cursor - config.app_gap + margin);
        row_y += row_height + config.app_gap;
    }

    (scene_width, row_y)
}
