use crate::error::{CaptureError, CaptureResult};
use crate::settings::Page;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// A viewport size in pixels.
///
/// The distinguished [`Size::DEFAULT`] value `(0, 0)` stands for "no explicit
/// size requested" and always takes part in a run. Ordering is by width then
/// height, which puts the default size first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const DEFAULT: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// Human readable form used for directory names and logging:
    /// `"Default"` for the sentinel, `"WxH"` otherwise.
    pub fn label(&self) -> String {
        if self.is_default() {
            "Default".to_string()
        } else {
            format!("{}x{}", self.width, self.height)
        }
    }

    /// Parse one raw size entry from a page descriptor. Anything that is not
    /// exactly a two-element array of non-negative integers is rejected.
    pub fn from_value(value: &Value) -> CaptureResult<Self> {
        let invalid = || CaptureError::InvalidPageSize(value.to_string());

        let items = value.as_array().ok_or_else(invalid)?;
        if items.len() != 2 {
            return Err(invalid());
        }

        let width = items[0].as_u64().ok_or_else(invalid)?;
        let height = items[1].as_u64().ok_or_else(invalid)?;

        Ok(Size {
            width: u32::try_from(width).map_err(|_| invalid())?,
            height: u32::try_from(height).map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for Size {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.width, self.height).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (width, height) = <(u32, u32)>::deserialize(deserializer)?;
        Ok(Size { width, height })
    }
}

/// Walk every page and collect the distinct sizes they require, in ascending
/// order. The default size is always present, whether requested or not.
pub fn available_sizes(pages: &[Page]) -> CaptureResult<Vec<Size>> {
    let mut sizes = BTreeSet::new();
    sizes.insert(Size::DEFAULT);

    for page in pages {
        for item in page.sizes.iter().flatten() {
            sizes.insert(Size::from_value(item)?);
        }
    }

    Ok(sizes.into_iter().collect())
}

/// The sizes one page must be captured at. A page with no `sizes` entry, or
/// an empty one, is captured exactly once at the default size.
pub fn page_sizes(page: &Page) -> CaptureResult<Vec<Size>> {
    match page.sizes.as_deref() {
        None | Some([]) => Ok(vec![Size::DEFAULT]),
        Some(items) => items.iter().map(Size::from_value).collect(),
    }
}
