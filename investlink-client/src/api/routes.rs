//! Endpoint paths relative to the API prefix
//!
//! Every path is built from [`Role`] so the investor → company and
//! company → investor directions stay identical.

use investlink_common::{EntityId, Role, Viewer};

pub fn recommendations(viewer: Viewer) -> String {
    format!("/recommendations/{}/{}", viewer.role.path_segment(), viewer.id)
}

pub fn swipe(viewer: Viewer, target: EntityId) -> String {
    format!(
        "/swipe/{}/{}/{}/{}",
        viewer.role.path_segment(),
        viewer.id,
        viewer.target_role().path_segment(),
        target
    )
}

pub fn interactions(viewer: Viewer) -> String {
    format!("/interactions/{}/{}", viewer.role.path_segment(), viewer.id)
}

pub fn interaction(viewer: Viewer, target: EntityId) -> String {
    format!(
        "/interactions/{}/{}/{}/{}",
        viewer.role.path_segment(),
        viewer.id,
        viewer.target_role().path_segment(),
        target
    )
}

pub fn search(kind: Role) -> String {
    format!("/search/{}", kind.search_kind())
}

pub fn profile(role: Role, id: EntityId) -> String {
    format!("/{}/{}", role.path_segment(), id)
}

pub fn count(role: Role) -> &'static str {
    match role {
        Role::Investor => "/users/count",
        Role::Company => "/companies/count",
    }
}
