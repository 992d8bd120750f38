use fogmap_common::{
    models::Phase,
    protocol::{CellView, MarkerView, PendingDelete, SessionView},
};

use crate::{geometry::cell_rect, session::SessionState};

/// Projects the session into what a front end draws. Pure: the same session
/// always produces the same view, and nothing is ever read back from a view.
///
/// Grid cells and markers only appear once the image has been decoded, since
/// their placement depends on the rendered image size.
pub fn render(session: &SessionState) -> SessionView {
    let dims = session.dims();
    let active = session.phase() == Phase::Active;

    let cells = if active {
        dims.cells()
            .map(|pos| CellView {
                pos,
                rect: cell_rect(pos.i, pos.j, dims.cols(), dims.rows()),
                visible: session.is_visible(&pos),
            })
            .collect()
    } else {
        Vec::new()
    };

    let markers = if active {
        session
            .markers()
            .list()
            .iter()
            .enumerate()
            .map(|(index, marker)| MarkerView {
                index: index + 1,
                marker: marker.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let pending_delete = session.pending_delete().and_then(|id| {
        Some(PendingDelete {
            id,
            index: session.markers().index_of(id)?,
            name: session.markers().get(id)?.name.clone(),
        })
    });

    SessionView {
        phase: session.phase(),
        image_ref: session.image_ref().map(str::to_string),
        cols: dims.cols(),
        rows: dims.rows(),
        mode: session.mode(),
        radius: session.radius(),
        view_all: session.fog().view_all(),
        revealed_count: session.fog().revealed().len(),
        cells,
        markers,
        pending_marker: session.pending_marker(),
        pending_delete,
    }
}
