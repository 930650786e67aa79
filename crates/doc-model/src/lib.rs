use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Radix the upstream converter uses for the declared page-number attribute.
pub const DEFAULT_PAGE_NUMBER_RADIX: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("page number radix {0} is outside 2..=36")]
    InvalidRadix(u32),
    #[error("invalid page number {raw:?} (radix {radix})")]
    InvalidPageNumber { raw: String, radix: u32 },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DestinationError {
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("destination must be a JSON array")]
    NotAnArray,
    #[error("destination page must be a non-negative integer")]
    InvalidPage,
    #[error("destination mode must be a string")]
    InvalidMode,
    #[error("destination coordinate {position} must be a number or null")]
    InvalidCoordinate { position: usize },
}

/// Opaque reference to a host element (placeholder or content box).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, ratio: f64) -> Self {
        Self { width: self.width * ratio, height: self.height * ratio }
    }
}

/// One page as declared by the upstream converter, before the page number is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFeedEntry {
    pub page_no: String,
    pub placeholder: ElementId,
    pub content: ElementId,
    pub ctm: [f64; 6],
    pub placeholder_size: Size,
    pub content_size: Size,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageFeed {
    pub pages: Vec<PageFeedEntry>,
}

impl PageFeed {
    pub fn from_json(json: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes every page number, keeping feed order.
    pub fn into_sources(self, radix: u32) -> Result<Vec<PageSource>, FeedError> {
        self.pages.into_iter().map(|entry| PageSource::from_entry(entry, radix)).collect()
    }
}

/// A page ready to be handed to the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSource {
    pub index: u32,
    pub placeholder: ElementId,
    pub content: ElementId,
    pub matrix: [f64; 6],
    pub placeholder_size: Size,
    pub content_size: Size,
}

impl PageSource {
    pub fn from_entry(entry: PageFeedEntry, radix: u32) -> Result<Self, FeedError> {
        Ok(Self {
            index: parse_page_number(&entry.page_no, radix)?,
            placeholder: entry.placeholder,
            content: entry.content,
            matrix: entry.ctm,
            placeholder_size: entry.placeholder_size,
            content_size: entry.content_size,
        })
    }
}

pub fn parse_page_number(raw: &str, radix: u32) -> Result<u32, FeedError> {
    if !(2..=36).contains(&radix) {
        return Err(FeedError::InvalidRadix(radix));
    }

    let trimmed = raw.trim();
    let digits = if radix == 16 {
        trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed)
    } else {
        trimmed
    };

    u32::from_str_radix(digits, radix)
        .map_err(|_| FeedError::InvalidPageNumber { raw: raw.to_owned(), radix })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationMode {
    ExactPosition,
    FitPage,
    FitPageBounded,
    FitWidth,
    FitWidthBounded,
    FitHeight,
    FitHeightBounded,
    FitRect,
    Unrecognized(String),
}

impl DestinationMode {
    /// Maps the PDF destination keyword (`XYZ`, `Fit`, `FitBH`, ...) to a mode.
    pub fn from_name(name: &str) -> Self {
        match name {
            "XYZ" => Self::ExactPosition,
            "Fit" => Self::FitPage,
            "FitB" => Self::FitPageBounded,
            "FitH" => Self::FitWidth,
            "FitBH" => Self::FitWidthBounded,
            "FitV" => Self::FitHeight,
            "FitBV" => Self::FitHeightBounded,
            "FitR" => Self::FitRect,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::ExactPosition => "XYZ",
            Self::FitPage => "Fit",
            Self::FitPageBounded => "FitB",
            Self::FitWidth => "FitH",
            Self::FitWidthBounded => "FitBH",
            Self::FitHeight => "FitV",
            Self::FitHeightBounded => "FitBV",
            Self::FitRect => "FitR",
            Self::Unrecognized(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationSpec {
    pub page: u32,
    pub mode: DestinationMode,
    /// Missing components inherit the current position's coordinate.
    pub coords: Vec<Option<f64>>,
}

impl DestinationSpec {
    pub fn new(page: u32, mode: DestinationMode) -> Self {
        Self { page, mode, coords: Vec::new() }
    }

    pub fn with_coords(mut self, coords: impl IntoIterator<Item = Option<f64>>) -> Self {
        self.coords = coords.into_iter().collect();
        self
    }

    pub fn coord(&self, position: usize) -> Option<f64> {
        self.coords.get(position).copied().flatten()
    }
}

/// Decodes the `[page, "Mode", c0, c1, ...]` payload attached to links and outline entries.
/// Integral, non-negative page numbers, whether encoded as `3` or `3.0`
fn page_index(value: &Value) -> Option<u32> {
    if let Some(page) = value.as_u64() {
        return u32::try_from(page).ok();
    }

    let page = value.as_f64()?;
    if page >= 0.0 && page.fract() == 0.0 && page <= f64::from(u32::MAX) {
        Some(page as u32)
    } else {
        None
    }
}

pub fn decode_destination(raw: &str) -> Result<DestinationSpec, DestinationError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(DestinationError::NotAnArray);
    };

    let mut items = items.into_iter();

    let page = items.next().as_ref().and_then(page_index).ok_or(DestinationError::InvalidPage)?;

    let mode = match items.next() {
        Some(Value::String(name)) => DestinationMode::from_name(&name),
        _ => return Err(DestinationError::InvalidMode),
    };

    let coords = items
        .enumerate()
        .map(|(position, item)| match item {
            Value::Null => Ok(None),
            Value::Number(number) => Ok(number.as_f64()),
            _ => Err(DestinationError::InvalidCoordinate { position }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DestinationSpec { page, mode, coords })
}
