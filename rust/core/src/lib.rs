// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Facemark Core
//!
//! Durable state behind mesh face labeling: which faces belong to which label,
//! which point markers exist, and the free-form annotation record attached to
//! each label key.
//!
//! The [`LabelStore`] owns three structures that must agree at all times:
//!
//! - the ordered list of [`LabelEntry`] values (the source of truth),
//! - the derived `face -> label` index, rebuilt incrementally on every edit,
//! - the [`AnnotationTable`], keyed by label and outliving face membership.
//!
//! Everything the operator is *looking at* (toggled labels, the transient and
//! finalized selections, pending persistence work) lives in a separate
//! [`SelectionSession`] that is passed explicitly into every operation that
//! needs it.

pub mod annotation;
pub mod error;
pub mod highlight;
pub mod keys;
pub mod markers;
pub mod persistence;
pub mod serialization;
pub mod session;
pub mod store;

pub use annotation::{Annotation, AnnotationTable, Condition, HighlightColor};
pub use error::{Error, ErrorCategory, Result};
pub use highlight::{LabelListItem, MarkerStyle, MarkerView};
pub use keys::{FaceIndex, FaceSet, MarkerKey};
pub use markers::{MarkedFeature, DEFAULT_FEATURE_NAME};
pub use persistence::{
    annotations_from_json, annotations_to_json, base_name_from, LabelFile, LabelRecord,
    MarkedFeatureRecord, PersistenceQueue, PersistenceRequest, Position, RequestId,
    DEFAULT_BASE_NAME,
};
pub use serialization::LoadSummary;
pub use session::{Notice, NoticeLevel, SelectionSession};
pub use store::{AssignOutcome, LabelEntry, LabelStore, ASSIGN_BATCH_SIZE};
