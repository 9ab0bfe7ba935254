// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Free-form annotation records attached to label keys.
//!
//! The on-disk field names (`FindCode`, `Photo_done`, `DimL`, ...) are the
//! ones the annotation form has always written, so existing annotation files
//! load unchanged. Fields this type does not know about are carried through
//! `extra` and written back verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Annotation records keyed by label.
pub type AnnotationTable = BTreeMap<String, Annotation>;

/// Condition of an annotated feature. Drives the highlight color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    #[default]
    Unset,
    InPhase,
    NotInPhase,
    Other(String),
}

impl Condition {
    /// The string stored in the annotation file.
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Unset => "",
            Condition::InPhase => "In Phase",
            Condition::NotInPhase => "Not in Phase",
            Condition::Other(value) => value,
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => Condition::Unset,
            "In Phase" => Condition::InPhase,
            "Not in Phase" => Condition::NotInPhase,
            _ => Condition::Other(value),
        }
    }
}

impl From<&str> for Condition {
    fn from(value: &str) -> Self {
        Condition::from(value.to_string())
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

/// Highlight color handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightColor {
    Green,
    Red,
}

impl HighlightColor {
    /// Linear RGB components in `[0, 1]`.
    pub fn rgb(self) -> [f32; 3] {
        match self {
            HighlightColor::Green => [0.0, 1.0, 0.0],
            HighlightColor::Red => [1.0, 0.0, 0.0],
        }
    }

    /// Face color policy: `In Phase` is green, everything else red.
    pub fn for_condition(condition: Option<&Condition>) -> Self {
        match condition {
            Some(Condition::InPhase) => HighlightColor::Green,
            _ => HighlightColor::Red,
        }
    }
}

/// Descriptive record for one label key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "FindCode", default)]
    pub find_code: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Condition", default)]
    pub condition: Condition,
    #[serde(rename = "Remarks", default)]
    pub remarks: String,
    #[serde(rename = "Dating", default)]
    pub dating: String,
    #[serde(rename = "Supervisor", default)]
    pub supervisor: String,
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Photo_done", default)]
    pub photo_done: String,
    #[serde(rename = "SiteName", default)]
    pub site_name: String,
    #[serde(rename = "Phase", default)]
    pub phase: String,
    #[serde(rename = "CoordX", default)]
    pub coord_x: String,
    #[serde(rename = "CoordY", default)]
    pub coord_y: String,
    #[serde(rename = "CoordZ", default)]
    pub coord_z: String,
    #[serde(rename = "DimL", default)]
    pub dim_length: String,
    #[serde(rename = "DimW", default)]
    pub dim_width: String,
    #[serde(rename = "DimH", default)]
    pub dim_height: String,
    /// Reference webpages, in the order the operator entered them.
    #[serde(
        rename = "WebpageAddress",
        default,
        deserialize_with = "string_or_list"
    )]
    pub webpage_addresses: Vec<String>,
    /// Uploaded images, in upload order.
    #[serde(rename = "ImageUrls", default)]
    pub image_urls: Vec<String>,
    /// Single-image field written by older annotation forms.
    #[serde(rename = "ImageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Annotation {
    /// Record created when a feature marker is placed.
    pub fn for_marked_feature() -> Self {
        Self {
            condition: Condition::InPhase,
            photo_done: "yes".to_string(),
            ..Self::default()
        }
    }

    /// Stored filenames of every attached image (last URL path segment).
    pub fn attached_image_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for url in self.image_url.iter().chain(self.image_urls.iter()) {
            let name = url.rsplit('/').next().unwrap_or(url.as_str());
            if !name.is_empty() && !files.iter().any(|f| f == name) {
                files.push(name.to_string());
            }
        }
        files
    }
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Missing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(url) if url.trim().is_empty() => Vec::new(),
        OneOrMany::One(url) => vec![url],
        OneOrMany::Many(urls) => urls,
        OneOrMany::Missing(()) => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_round_trips_through_strings() {
        assert_eq!(Condition::from("In Phase"), Condition::InPhase);
        assert_eq!(Condition::from("Not in Phase"), Condition::NotInPhase);
        assert_eq!(Condition::from(""), Condition::Unset);
        assert_eq!(
            Condition::from("Unclear"),
            Condition::Other("Unclear".to_string())
        );
        assert_eq!(String::from(Condition::NotInPhase), "Not in Phase");
    }

    #[test]
    fn color_policy() {
        assert_eq!(
            HighlightColor::for_condition(Some(&Condition::InPhase)),
            HighlightColor::Green
        );
        assert_eq!(
            HighlightColor::for_condition(Some(&Condition::NotInPhase)),
            HighlightColor::Red
        );
        assert_eq!(
            HighlightColor::for_condition(Some(&Condition::Other("x".into()))),
            HighlightColor::Red
        );
        assert_eq!(HighlightColor::for_condition(None), HighlightColor::Red);
    }

    #[test]
    fn parses_form_record_and_keeps_unknown_fields() {
        let json = r#"{
            "FindCode": "F-12",
            "Condition": "In Phase",
            "Photo_done": "no",
            "DimL": "1.2",
            "WebpageAddress": ["https://a.example", "https://b.example"],
            "ImageUrls": ["/static/uploads/annotations/1_a.png"],
            "Excavator": "J. Doe"
        }"#;
        let annotation: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(annotation.find_code, "F-12");
        assert_eq!(annotation.condition, Condition::InPhase);
        assert_eq!(annotation.dim_length, "1.2");
        assert_eq!(annotation.webpage_addresses.len(), 2);
        assert_eq!(
            annotation.extra.get("Excavator"),
            Some(&serde_json::Value::String("J. Doe".into()))
        );

        let written = serde_json::to_value(&annotation).unwrap();
        assert_eq!(written["Condition"], "In Phase");
        assert_eq!(written["Excavator"], "J. Doe");
        assert!(written.get("ImageUrl").is_none());
    }

    #[test]
    fn single_webpage_string_is_accepted() {
        let annotation: Annotation =
            serde_json::from_str(r#"{"WebpageAddress": "https://a.example"}"#).unwrap();
        assert_eq!(annotation.webpage_addresses, vec!["https://a.example"]);

        let empty: Annotation = serde_json::from_str(r#"{"WebpageAddress": ""}"#).unwrap();
        assert!(empty.webpage_addresses.is_empty());
    }

    #[test]
    fn attached_files_cover_legacy_and_list_fields() {
        let annotation = Annotation {
            image_url: Some("/static/uploads/annotations/10_old.jpg".into()),
            image_urls: vec![
                "/static/uploads/annotations/11_new.png".into(),
                "/static/uploads/annotations/10_old.jpg".into(),
            ],
            ..Annotation::default()
        };
        assert_eq!(
            annotation.attached_image_files(),
            vec!["10_old.jpg".to_string(), "11_new.png".to_string()]
        );
    }
}
