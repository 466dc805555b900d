//! Upload payloads and the `@path;filename=...;type=...` file reference.
//!
//! An `UploadPayload` describes files already received on local disk (field
//! name to one or more entries). Before sending, each entry is rewritten into
//! a `files[i]` form field carrying a [`FileRef`]; the transport's multipart
//! encoder resolves the reference and streams the file contents.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{RestError, Result};

const DEFAULT_MIME: &str = "application/octet-stream";

/// Status reported for an uploaded file, using the conventional numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadError {
    #[default]
    Ok,
    IniSize,
    FormSize,
    Partial,
    NoFile,
    NoTmpDir,
    CantWrite,
    Extension,
}

impl UploadError {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => UploadError::Ok,
            1 => UploadError::IniSize,
            2 => UploadError::FormSize,
            3 => UploadError::Partial,
            4 => UploadError::NoFile,
            6 => UploadError::NoTmpDir,
            7 => UploadError::CantWrite,
            8 => UploadError::Extension,
            _ => return None,
        })
    }
}

/// One received file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-side file name.
    pub name: String,
    /// Where the file currently lives on local disk.
    pub tmp_path: PathBuf,
    pub mime_type: String,
    pub size: u64,
    pub error: UploadError,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, tmp_path: impl Into<PathBuf>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            tmp_path: tmp_path.into(),
            mime_type: mime_type.into(),
            size,
            error: UploadError::Ok,
        }
    }

    pub fn with_error(mut self, error: UploadError) -> Self {
        self.error = error;
        self
    }

    /// Sanity check on the upload metadata. File contents are not inspected.
    /// Control characters in the name or mime type would end up inside part
    /// headers, so they fail the check.
    pub fn is_valid(&self) -> bool {
        self.error == UploadError::Ok
            && !self.name.is_empty()
            && !self.tmp_path.as_os_str().is_empty()
            && !has_control(&self.name)
            && !has_control(&self.mime_type)
    }

    pub fn file_ref(&self) -> FileRef {
        let mime_type = if self.mime_type.is_empty() {
            DEFAULT_MIME.to_string()
        } else {
            self.mime_type.clone()
        };
        FileRef {
            path: self.tmp_path.clone(),
            filename: self.name.clone(),
            mime_type,
        }
    }
}

/// Files grouped by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPayload {
    fields: BTreeMap<String, Vec<UploadedFile>>,
}

impl UploadPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, file: UploadedFile) -> &mut Self {
        self.fields.entry(field.into()).or_default().push(file);
        self
    }

    pub fn field(&self, name: &str) -> Option<&[UploadedFile]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }

    /// The entries to send: one field when `lookup` names it, otherwise every
    /// field in name order. An empty `lookup` counts as no lookup.
    pub fn files(&self, lookup: Option<&str>) -> Result<Vec<&UploadedFile>> {
        if self.is_empty() {
            return Err(RestError::NoFiles);
        }
        let files: Vec<&UploadedFile> = match lookup.filter(|name| !name.is_empty()) {
            Some(name) => self.field(name).unwrap_or_default().iter().collect(),
            None => self.fields.values().flatten().collect(),
        };
        if files.is_empty() {
            return Err(RestError::NoFiles);
        }
        Ok(files)
    }

    /// Check every selected entry and rewrite it into `files[i]` fields.
    pub fn to_form(&self, lookup: Option<&str>) -> Result<Vec<FormField>> {
        let files = self.files(lookup)?;
        if let Some(bad) = files.iter().find(|file| !file.is_valid()) {
            tracing::warn!(file = %bad.name, error = ?bad.error, "upload failed validation");
            return Err(RestError::Validation("upload did not pass validation".to_string()));
        }
        Ok(files
            .into_iter()
            .enumerate()
            .map(|(i, file)| FormField::file(format!("files[{i}]"), file.file_ref()))
            .collect())
    }
}

pub(crate) fn has_control(value: &str) -> bool {
    value.chars().any(char::is_control)
}

/// A local file to embed in a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub path: PathBuf,
    pub filename: String,
    pub mime_type: String,
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{};filename={};type={}",
            self.path.display(),
            self.filename,
            self.mime_type
        )
    }
}

impl FromStr for FileRef {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix('@')
            .ok_or_else(|| RestError::Validation(format!("not a file reference: {s}")))?;
        let mut parts = rest.split(';');
        let path = parts.next().unwrap_or_default();
        if path.is_empty() {
            return Err(RestError::Validation(format!("file reference without a path: {s}")));
        }

        let mut file = FileRef {
            path: PathBuf::from(path),
            filename: String::new(),
            mime_type: DEFAULT_MIME.to_string(),
        };
        for part in parts {
            match part.split_once('=') {
                Some(("filename", value)) => file.filename = value.to_string(),
                Some(("type", value)) => file.mime_type = value.to_string(),
                _ => {}
            }
        }
        if file.filename.is_empty() {
            file.filename = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileRef),
}

/// One named part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file: FileRef) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File(file),
        }
    }
}
