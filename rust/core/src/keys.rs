// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier types shared by the store and the selection engine.
//!
//! Faces are addressed by their global triangle index, which is only stable
//! for the lifetime of one loaded mesh. Marked features live in a slot map and
//! are addressed by generational keys, so deleting one marker never
//! invalidates the handle of another that happens to share its label.

use rustc_hash::FxHashSet;
use slotmap::new_key_type;

/// Global triangle index: cumulative triangle count of the preceding
/// sub-meshes plus the local triangle offset.
pub type FaceIndex = u32;

/// Unordered set of face indices.
pub type FaceSet = FxHashSet<FaceIndex>;

new_key_type! {
    /// Key for a marked feature (a labeled point on the mesh).
    pub struct MarkerKey;
}
