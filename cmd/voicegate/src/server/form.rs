use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::upload::Upload;

/// A fully read multipart form: file parts and text fields by name.
#[derive(Debug, Default)]
pub struct Form {
    files: HashMap<String, (String, Vec<u8>)>,
    fields: HashMap<String, String>,
}

impl Form {
    /// Reads every part. Parts carrying a filename are files; a file larger
    /// than `max_file_bytes` fails the request.
    pub async fn read(mut multipart: Multipart, max_file_bytes: usize) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            match field.file_name().map(str::to_owned) {
                Some(filename) => {
                    let data = field.bytes().await?;
                    if data.len() > max_file_bytes {
                        return Err(ApiError::PayloadTooLarge(max_file_bytes));
                    }
                    form.files.insert(name, (filename, data.to_vec()));
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Removes and validates the named file part.
    pub fn take_upload(&mut self, name: &'static str) -> Result<Upload, ApiError> {
        let (filename, data) = self.files.remove(name).ok_or(ApiError::MissingFile(name))?;
        Upload::new(&filename, data)
    }

    /// Returns a trimmed text field; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn parse<T>(&self, name: &str) -> Result<Option<T>, ApiError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.text(name)
            .map(|s| {
                s.parse::<T>()
                    .map_err(|e| ApiError::BadRequest(format!("invalid {name} {s:?}: {e}")))
            })
            .transpose()
    }

    /// Parses a boolean field. Absent means false.
    pub fn flag(&self, name: &str) -> Result<bool, ApiError> {
        match self.text(name).map(str::to_ascii_lowercase).as_deref() {
            None | Some("false" | "0" | "no" | "off") => Ok(false),
            Some("true" | "1" | "yes" | "on") => Ok(true),
            Some(other) => Err(ApiError::BadRequest(format!(
                "invalid {name} {other:?}: expected true or false"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> Form {
        Form {
            files: HashMap::new(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn parse_fields() {
        let f = form(&[("threshold", " 0.4 "), ("top_n", ""), ("bad", "abc")]);
        assert_eq!(f.parse::<f32>("threshold").unwrap(), Some(0.4));
        assert_eq!(f.parse::<usize>("top_n").unwrap(), None);
        assert_eq!(f.parse::<usize>("missing").unwrap(), None);
        assert!(matches!(f.parse::<f32>("bad"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn flags() {
        let f = form(&[("a", "TRUE"), ("b", "0"), ("c", "maybe")]);
        assert!(f.flag("a").unwrap());
        assert!(!f.flag("b").unwrap());
        assert!(!f.flag("missing").unwrap());
        assert!(f.flag("c").is_err());
    }

    #[test]
    fn missing_upload() {
        let mut f = form(&[]);
        assert!(matches!(f.take_upload("audio"), Err(ApiError::MissingFile("audio"))));
    }
}
