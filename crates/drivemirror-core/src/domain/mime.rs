//! Semantic item types and their local representation
//!
//! Google Drive tags every item with a MIME type. Most are ordinary binary
//! files that are fetched byte for byte; the `application/vnd.google-apps.*`
//! namespace covers folders, shortcuts and "workspace" documents that have no
//! binary content of their own and must be exported to a portable format.
//!
//! ## Design Notes
//!
//! - The mapping is a closed enum. Unknown binary types fall into
//!   [`MimeKind::Other`], unknown workspace types into [`MimeKind::OtherVirtual`].
//! - Folder and shortcut are sentinels: they are never fetched or exported.

use std::fmt::{self, Display, Formatter};

const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

const FOLDER: &str = "application/vnd.google-apps.folder";
const SHORTCUT: &str = "application/vnd.google-apps.shortcut";
const DOCUMENT: &str = "application/vnd.google-apps.document";
const SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
const PRESENTATION: &str = "application/vnd.google-apps.presentation";
const DRAWING: &str = "application/vnd.google-apps.drawing";
const SCRIPT: &str = "application/vnd.google-apps.script";

const EXPORT_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const EXPORT_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const EXPORT_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
const EXPORT_PNG: &str = "image/png";
const EXPORT_SCRIPT: &str = "application/vnd.google-apps.script+json";
const EXPORT_PDF: &str = "application/pdf";

/// Semantic type of a remote item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeKind {
    Folder,
    Shortcut,
    Document,
    Spreadsheet,
    Presentation,
    Drawing,
    Script,
    /// Any other workspace type (forms, sites, maps, ...); exported as PDF
    OtherVirtual(String),
    MsWord,
    MsExcel,
    MsPowerPoint,
    QuickTime,
    Pdf,
    PlainText,
    Jpeg,
    Png,
    Zip,
    Mpeg,
    Mp4,
    /// Binary type with no known extension (`application/octet-stream` and friends)
    Other(String),
}

/// What the transfer step should do with an item of a given kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPlan {
    /// Create the local directory and descend into it
    Recurse,
    /// Skip entirely: no file, no ledger record, no report entry
    Ignore,
    /// Download the raw bytes
    Fetch,
    /// Export to the given MIME type
    Export(&'static str),
}

impl MimeKind {
    /// Classify a MIME type string as reported by the remote listing
    pub fn parse(mime: &str) -> Self {
        match mime {
            FOLDER => Self::Folder,
            SHORTCUT => Self::Shortcut,
            DOCUMENT => Self::Document,
            SPREADSHEET => Self::Spreadsheet,
            PRESENTATION => Self::Presentation,
            DRAWING => Self::Drawing,
            SCRIPT => Self::Script,
            "application/msword" => Self::MsWord,
            "application/vnd.ms-excel" => Self::MsExcel,
            "application/vnd.ms-powerpoint" => Self::MsPowerPoint,
            "video/quicktime" => Self::QuickTime,
            "application/pdf" => Self::Pdf,
            "text/plain" => Self::PlainText,
            "image/jpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "application/zip" => Self::Zip,
            "audio/mpeg" => Self::Mpeg,
            "video/mp4" => Self::Mp4,
            other if other.starts_with(GOOGLE_APPS_PREFIX) => {
                Self::OtherVirtual(other.to_string())
            }
            other => Self::Other(other.to_string()),
        }
    }

    /// The MIME type string this kind was parsed from
    pub fn as_mime(&self) -> &str {
        match self {
            Self::Folder => FOLDER,
            Self::Shortcut => SHORTCUT,
            Self::Document => DOCUMENT,
            Self::Spreadsheet => SPREADSHEET,
            Self::Presentation => PRESENTATION,
            Self::Drawing => DRAWING,
            Self::Script => SCRIPT,
            Self::MsWord => "application/msword",
            Self::MsExcel => "application/vnd.ms-excel",
            Self::MsPowerPoint => "application/vnd.ms-powerpoint",
            Self::QuickTime => "video/quicktime",
            Self::Pdf => "application/pdf",
            Self::PlainText => "text/plain",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Zip => "application/zip",
            Self::Mpeg => "audio/mpeg",
            Self::Mp4 => "video/mp4",
            Self::OtherVirtual(mime) | Self::Other(mime) => mime,
        }
    }

    /// Local file extension, including the leading dot, or `""` when none applies
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Document => ".docx",
            Self::Spreadsheet => ".xlsx",
            Self::Presentation => ".pptx",
            Self::Drawing => ".png",
            Self::Script => ".json",
            Self::OtherVirtual(_) => ".pdf",
            Self::MsWord => ".doc",
            Self::MsExcel => ".xls",
            Self::MsPowerPoint => ".ppt",
            Self::QuickTime => ".mov",
            Self::Pdf => ".pdf",
            Self::PlainText => ".txt",
            Self::Jpeg => ".jpg",
            Self::Png => ".png",
            Self::Zip => ".zip",
            Self::Mpeg => ".mp3",
            Self::Mp4 => ".mp4",
            Self::Folder | Self::Shortcut | Self::Other(_) => "",
        }
    }

    /// True for workspace documents that must be exported rather than fetched
    pub fn is_virtual(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Spreadsheet
                | Self::Presentation
                | Self::Drawing
                | Self::Script
                | Self::OtherVirtual(_)
        )
    }

    /// Export format for virtual kinds, `None` for everything else
    pub fn export_target(&self) -> Option<&'static str> {
        match self {
            Self::Document => Some(EXPORT_DOCX),
            Self::Spreadsheet => Some(EXPORT_XLSX),
            Self::Presentation => Some(EXPORT_PPTX),
            Self::Drawing => Some(EXPORT_PNG),
            Self::Script => Some(EXPORT_SCRIPT),
            Self::OtherVirtual(_) => Some(EXPORT_PDF),
            _ => None,
        }
    }

    pub fn plan(&self) -> TransferPlan {
        match self {
            Self::Folder => TransferPlan::Recurse,
            Self::Shortcut => TransferPlan::Ignore,
            kind => match kind.export_target() {
                Some(format) => TransferPlan::Export(format),
                None => TransferPlan::Fetch,
            },
        }
    }
}

impl Display for MimeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Make sure `name` carries the extension `ext` exactly once
///
/// # Arguments
///
/// * `name` - Sanitized item name
/// * `ext` - Expected extension with its leading dot, or empty
///
/// # Returns
///
/// The name unchanged when `ext` is empty or already present (compared
/// case-insensitively); the name with a dotless trailing suffix such as
/// `reportdocx` rewritten to `report.docx`; otherwise the name with `ext`
/// appended.
pub fn normalize_extension(name: &str, ext: &str) -> String {
    if ext.is_empty() {
        return name.to_string();
    }

    let lower = name.to_lowercase();
    let ext_lower = ext.to_lowercase();
    if lower.ends_with(&ext_lower) {
        return name.to_string();
    }

    let bare = ext_lower.strip_prefix('.').unwrap_or(&ext_lower);
    if !bare.is_empty() && lower.ends_with(bare) && lower.len() > bare.len() {
        // Lowercasing can change byte lengths for non-ASCII names, so cut by
        // char count on the original.
        let keep = name.chars().count() - bare.chars().count();
        let stem: String = name.chars().take(keep).collect();
        return format!("{stem}{ext}");
    }

    format!("{name}{ext}")
}
