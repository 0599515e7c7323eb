//! Typed decode of merged sources.

use super::codec::{CodecOptions, unflatten_with};
use super::merge::merge_sources;
use crate::error::{OptionError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a compiled document into `T`, reporting the dotted path of the
/// first field that fails.
pub fn decode_document<T: DeserializeOwned>(document: Value) -> Result<T> {
    serde_path_to_error::deserialize(document).map_err(|err| OptionError::Decode {
        path: err.path().to_string(),
        message: err.inner().to_string(),
    })
}

/// Merge sources, unflatten the result and decode it into `T`.
///
/// # Example
/// ```
/// use optionset::source::{assignment_source, compile_sources};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Options {
///     port: u16,
/// }
///
/// let cli = assignment_source(["port=8080"]).unwrap();
/// let options: Options = compile_sources([cli]).unwrap();
/// assert_eq!(options.port, 8080);
/// ```
pub fn compile_sources<T, I, S>(sources: I) -> Result<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = (String, Option<String>)>,
{
    compile_sources_with(sources, &CodecOptions::default())
}

/// [`compile_sources`] with explicit codec options.
pub fn compile_sources_with<T, I, S>(sources: I, options: &CodecOptions) -> Result<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = (String, Option<String>)>,
{
    let merged = merge_sources(sources);
    let document = unflatten_with(&merged, options)?;
    decode_document(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceMap, decode_json_source, to_source};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Nested {
        amount: i32,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Options {
        #[serde(default)]
        enable: bool,
        opt: i32,
        nested: Nested,
    }

    #[test]
    fn test_compile_from_mixed_sources() {
        let json = to_source(decode_json_source(r#"{"opt": 1}"#).unwrap());
        let flags: SourceMap = [
            ("nested.amount".to_string(), Some("2".to_string())),
            ("enable".to_string(), None),
        ]
        .into_iter()
        .collect();

        let options: Options = compile_sources([json, flags]).unwrap();
        assert_eq!(
            options,
            Options {
                enable: false,
                opt: 1,
                nested: Nested { amount: 2 },
            }
        );
    }

    #[test]
    fn test_decode_error_reports_path() {
        let source: SourceMap = [
            ("opt".to_string(), Some("1".to_string())),
            ("nested.amount".to_string(), Some("lots".to_string())),
        ]
        .into_iter()
        .collect();

        let err = compile_sources::<Options, _, _>([source]).unwrap_err();
        match err {
            OptionError::Decode { path, .. } => assert_eq!(path, "nested.amount"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
