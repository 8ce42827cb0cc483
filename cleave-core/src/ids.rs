//! Identifier newtypes shared by every cleave stage.
//!
//! Supervoxel, body and label identifiers are all plain integers in the
//! segmentation store. Wrapping them keeps a seed label from being passed
//! where a supervoxel is expected.

use std::{fmt, sync::Arc};

macro_rules! define_integer_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
        pub struct $name($inner);

        impl $name {
            #[doc = concat!("Wraps a raw value as a [`", stringify!($name), "`].")]
            #[rustfmt::skip]
            #[must_use]
            pub const fn new(id: $inner) -> Self { Self(id) }

            /// Returns the underlying numeric identifier.
            #[rustfmt::skip]
            #[must_use]
            pub const fn get(self) -> $inner { self.0 }
        }

        impl From<$inner> for $name {
            fn from(id: $inner) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_integer_id! {
    /// Identifier of an atomic supervoxel, unique within a dataset.
    ///
    /// # Examples
    /// ```
    /// use cleave_core::SupervoxelId;
    ///
    /// let id = SupervoxelId::new(1_234_567);
    /// assert_eq!(id.get(), 1_234_567);
    /// ```
    SupervoxelId(u64)
}

define_integer_id! {
    /// Identifier of a body: the label a set of supervoxels is agglomerated under.
    BodyId(u64)
}

define_integer_id! {
    /// Operator-chosen seed label. Labels need not be contiguous.
    SeedLabel(u64)
}

define_integer_id! {
    /// Dense output group identifier.
    ///
    /// Seeded groups occupy `0..k` in ascending seed-label order; detached and
    /// unassigned groups follow.
    GroupId(u32)
}

impl GroupId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Version (node) of the segmentation store a body graph was read at.
///
/// # Examples
/// ```
/// use cleave_core::StoreVersion;
///
/// let version = StoreVersion::new("a1b2c3");
/// assert_eq!(version.as_str(), "a1b2c3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct StoreVersion(Arc<str>);

impl StoreVersion {
    /// Creates a version from its textual form.
    #[must_use]
    pub fn new(version: impl Into<Arc<str>>) -> Self {
        Self(version.into())
    }

    /// Returns the textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
